//! 将 `%s` 模板与参数渲染为最终 SQL 文本。
//!
//! MySQL 按驱动 mogrify 的规则编码字面量(字符串转义并加单引号)；
//! 达梦模板的槽位自带引号(`'%s'`)，参数只做纯文本替换。

use crate::dialect::Dialect;
use crate::value::{DATETIME_FORMAT, SqlValue};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum InterpolateError {
    #[error("builder not enough args when interpolating")]
    MissingArgs,
}

/// MySQL 字符串字面量转义(驱动同款规则)。
pub fn escape_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\0' => out.push_str("\\0"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\x1a' => out.push_str("\\Z"),
            '\'' => out.push_str("\\'"),
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            _ => out.push(c),
        }
    }
    out
}

fn mysql_literal(out: &mut String, v: &SqlValue) {
    match v {
        SqlValue::Null => out.push_str("NULL"),
        SqlValue::Bool(true) => out.push('1'),
        SqlValue::Bool(false) => out.push('0'),
        SqlValue::I64(n) => out.push_str(&n.to_string()),
        SqlValue::U64(n) => out.push_str(&n.to_string()),
        SqlValue::F64(n) => out.push_str(&n.to_string()),
        SqlValue::Decimal(n) => out.push_str(&n.to_string()),
        SqlValue::String(s) => {
            out.push('\'');
            out.push_str(&escape_string(s));
            out.push('\'');
        }
        SqlValue::DateTime(dt) => {
            out.push('\'');
            match dt.format(DATETIME_FORMAT) {
                Ok(s) => out.push_str(&s),
                Err(_) => out.push_str(&dt.to_string()),
            }
            out.push('\'');
        }
    }
}

fn dameng_literal(out: &mut String, v: &SqlValue) {
    out.push_str(&v.plain_text());
}

/// 将模板中的每个 `%s` 依次替换为参数字面量。参数不足时报错，
/// 多余的参数忽略。
pub fn interpolate(
    dialect: Dialect,
    sql: &str,
    params: &[SqlValue],
) -> Result<String, InterpolateError> {
    let mut out = String::with_capacity(sql.len() + params.len() * 8);
    let mut args = params.iter();
    let mut rest = sql;
    while let Some(pos) = rest.find("%s") {
        out.push_str(&rest[..pos]);
        let v = args.next().ok_or(InterpolateError::MissingArgs)?;
        match dialect {
            Dialect::MySql => mysql_literal(&mut out, v),
            Dialect::Dameng => dameng_literal(&mut out, v),
        }
        rest = &rest[pos + 2..];
    }
    out.push_str(rest);
    Ok(out)
}
