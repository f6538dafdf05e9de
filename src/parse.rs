//! 字段名加工与 where 条件解析。

use std::sync::OnceLock;

use regex::Regex;

use crate::dialect::Dialect;
use crate::error::{Error, Result};
use crate::value::SqlValue;

fn as_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\s+as\s+").expect("as regex"))
}

fn table_split_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"[,'"()\[\]\s]"#).expect("table split regex"))
}

fn strict_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[\w.*]+$").expect("strict regex"))
}

fn no_quote_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"[,'"`*$().\[\]\s]"#).expect("no quote regex"))
}

/// 加工字段名：处理别名、JSON 字段、表限定与严格模式检查。
///
/// - `a as b` 递归加工两侧并以 ` AS ` 连接；
/// - `a->b` 按 JSON 路径展开为 `"a"."b"`(引号随方言)；
/// - `t.col` 在不含特殊字符时拆出表名单独加引号；
/// - `*` 与含逗号、引号、括号、空白等的表达式原样放行；
/// - 其余裸标识符按方言加引号。
pub fn parse_key(dialect: Dialect, key: &str, strict: bool) -> Result<String> {
    let key = key.trim();

    if let Some(m) = as_re().find(key) {
        let field = &key[..m.start()];
        let alias = &key[m.end()..];
        return Ok(format!(
            "{} AS {}",
            parse_key(dialect, field, false)?,
            parse_key(dialect, alias, false)?
        ));
    }

    let mut table = String::new();
    let mut key = if key.contains("->") && !key.contains('(') {
        match key.split_once("->") {
            Some((field, name)) => {
                format!("{}.{}", dialect.quote(field), dialect.quote(name))
            }
            None => key.to_string(),
        }
    } else if key.contains('.') && !table_split_re().is_match(key) {
        match key.split_once('.') {
            Some((t, rest)) => {
                table = t.to_string();
                rest.to_string()
            }
            None => key.to_string(),
        }
    } else {
        key.to_string()
    };

    if strict && !strict_re().is_match(&key) {
        return Err(Error::validation(format!("not support data:{key}")));
    }

    if key != "*" && !no_quote_re().is_match(&key) {
        key = dialect.quote(&key);
    }
    if !table.is_empty() {
        key = format!("{}.{}", dialect.quote(&table), key);
    }
    Ok(key)
}

/// 达梦字面量预处理：字符串中的 `'` 翻倍，`Null` 降级为空串，
/// 其余值原样返回。反斜杠不做处理。
pub fn parse_value(value: &SqlValue) -> SqlValue {
    match value {
        SqlValue::String(s) => SqlValue::from(s.replace('\'', "''")),
        SqlValue::Null => SqlValue::from(String::new()),
        other => other.clone(),
    }
}

/// where 条件的值：空、单值或列表。
#[derive(Debug, Clone, PartialEq, Default)]
pub enum WhereValue {
    #[default]
    None,
    Single(SqlValue),
    List(Vec<SqlValue>),
}

impl<T: Into<SqlValue>> From<T> for WhereValue {
    fn from(v: T) -> Self {
        Self::Single(v.into())
    }
}

impl<T: Into<SqlValue>> From<Vec<T>> for WhereValue {
    fn from(v: Vec<T>) -> Self {
        Self::List(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<SqlValue>, const N: usize> From<[T; N]> for WhereValue {
    fn from(v: [T; N]) -> Self {
        Self::List(v.into_iter().map(Into::into).collect())
    }
}

fn contains_and(s: &str) -> bool {
    s.to_lowercase().contains(" and ")
}

fn csv_split(s: &str) -> Vec<SqlValue> {
    s.split(',').map(|p| SqlValue::from(p.to_string())).collect()
}

/// 解析单个 where 条件，返回以 `" AND "` 开头的条件片段与绑定参数。
///
/// 操作符别名大小写不敏感；`in`/`between`/`like` 等文字操作符
/// 按小写渲染。MySQL 字段名原样拼接，达梦字段名经 [`parse_key`]
/// 加引号，值经 [`parse_value`] 预处理后填入 `'%s'` 字面量槽位。
pub fn parse_where(
    dialect: Dialect,
    field: &str,
    symbol: &str,
    value: WhereValue,
) -> Result<(String, Vec<SqlValue>)> {
    let dm = dialect == Dialect::Dameng;
    let mut check_value = true;
    let mut key_parsed = dm;
    let mut field = field.to_string();
    let mut value = value;

    let lowered = symbol.trim().to_lowercase();
    let symbol: String = match lowered.as_str() {
        "eq" | "=" => "=".to_string(),
        "neq" | "!=" | "<>" => "<>".to_string(),
        "gt" | ">" => ">".to_string(),
        "egt" | ">=" => ">=".to_string(),
        "lt" | "<" => "<".to_string(),
        "elt" | "<=" => "<=".to_string(),
        "in" | "not in" => {
            if let WhereValue::Single(SqlValue::String(s)) = &value {
                if dm {
                    let trimmed = s.trim();
                    if trimmed.starts_with('(') && trimmed.ends_with(')') {
                        value = WhereValue::List(csv_split(&trimmed[1..trimmed.len() - 1]));
                    } else {
                        value = WhereValue::List(csv_split(s));
                    }
                } else if s.starts_with('(') && s.ends_with(')') {
                    // MySQL 保留括号串作为单个绑定参数
                } else {
                    value = WhereValue::List(csv_split(s));
                }
            }
            if dm && !matches!(value, WhereValue::List(_)) {
                return Err(Error::validation("in optional value must be a list or tuple"));
            }
            lowered.clone()
        }
        "between" | "not between" => {
            if let WhereValue::Single(SqlValue::String(s)) = &value {
                if !contains_and(s) {
                    value = WhereValue::List(csv_split(s));
                }
            }
            if dm {
                let text = match std::mem::take(&mut value) {
                    WhereValue::List(items) => {
                        if items.len() != 2 {
                            return Err(Error::validation(
                                "between optional value must 2 arguments",
                            ));
                        }
                        format!(
                            "'{}' AND '{}'",
                            parse_value(&items[0]).plain_text(),
                            parse_value(&items[1]).plain_text()
                        )
                    }
                    WhereValue::Single(SqlValue::String(s)) if contains_and(&s) => s.to_string(),
                    _ => return Err(Error::validation("between optional value error")),
                };
                check_value = false;
                format!(" {lowered} {text}")
            } else {
                value = match value {
                    WhereValue::List(items) => {
                        if items.len() != 2 {
                            return Err(Error::validation(
                                "`between` optional `value` must 2 arguments",
                            ));
                        }
                        WhereValue::Single(SqlValue::from(format!(
                            "{} AND {}",
                            items[0].plain_text(),
                            items[1].plain_text()
                        )))
                    }
                    other => other,
                };
                match &value {
                    WhereValue::Single(SqlValue::String(s)) if contains_and(s) => {}
                    _ => return Err(Error::validation("`between` optional `value` error")),
                }
                lowered.clone()
            }
        }
        "like" | "not like" => {
            let ok = match &value {
                WhereValue::Single(SqlValue::String(s)) => {
                    if !s.contains('%') && !s.contains('_') {
                        return Err(Error::validation(if dm {
                            "like optional value should contain % or _"
                        } else {
                            "`like` optional `value` should contain `%` or `_`"
                        }));
                    }
                    true
                }
                _ => false,
            };
            if !ok {
                return Err(Error::validation(if dm {
                    "like optional value must be a string"
                } else {
                    "`like` optional `value` must be a string"
                }));
            }
            lowered.clone()
        }
        "is" => "is".to_string(),
        "null" | "is null" => {
            check_value = false;
            " is null".to_string()
        }
        "not null" | "is not null" => {
            check_value = false;
            " is not null".to_string()
        }
        "exists" | "not exists" => {
            field = format!("{lowered}({field})");
            check_value = false;
            String::new()
        }
        "exp" => {
            let expr = match &value {
                WhereValue::Single(SqlValue::String(s)) => s.to_string(),
                _ => {
                    return Err(Error::validation(if dm {
                        "exp optional value should be a string"
                    } else {
                        "`exp` optional `value` should be a string"
                    }));
                }
            };
            field = if dm {
                format!("\"{field}\" {expr}")
            } else {
                format!("{field} {expr}")
            };
            check_value = false;
            String::new()
        }
        "" if value == WhereValue::None => {
            // field 原生 sql
            check_value = false;
            key_parsed = false;
            String::new()
        }
        _ => {
            if value == WhereValue::None {
                value = WhereValue::Single(SqlValue::from(lowered.clone()));
                "=".to_string()
            } else {
                return Err(Error::validation("symbol is error"));
            }
        }
    };

    if key_parsed {
        field = parse_key(dialect, &field, false)?;
    }

    let mut condition_str = String::new();
    let mut condition_val: Vec<SqlValue> = Vec::new();

    if check_value {
        match value {
            WhereValue::None => return Err(Error::validation("value could not be none")),
            WhereValue::List(items) => {
                condition_str.push_str(&format!(" AND {field} {symbol}"));
                let slots = vec![dialect.placeholder(); items.len()].join(",");
                condition_str.push_str(&format!(" ({slots})"));
                for v in &items {
                    condition_val.push(if dm { parse_value(v) } else { v.clone() });
                }
            }
            WhereValue::Single(v) => {
                condition_str.push_str(&format!(" AND {field} {symbol}"));
                condition_str.push_str(&format!(" {}", dialect.placeholder()));
                condition_val.push(if dm { parse_value(&v) } else { v });
            }
        }
    } else {
        condition_str.push_str(&format!(" AND {field}{symbol}"));
    }

    Ok((condition_str, condition_val))
}
