//! SQL 参数值类型与数值提升。

use std::borrow::Cow;
use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use rust_decimal::Decimal;
use time::format_description::FormatItem;
use time::macros::format_description;

use crate::error::{Error, Result};

/// `DATETIME` 字面量格式：`2024-01-01 08:30:00`。
pub(crate) const DATETIME_FORMAT: &[FormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");

/// SQL 参数值。
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Bool(bool),
    I64(i64),
    U64(u64),
    F64(f64),
    Decimal(Decimal),
    String(Cow<'static, str>),
    DateTime(time::OffsetDateTime),
}

impl SqlValue {
    /// 将 `Option<T>` 映射为 `SqlValue`：`None => Null`，`Some(v) => v.into()`。
    pub fn from_option<T: Into<SqlValue>>(v: Option<T>) -> Self {
        match v {
            Some(v) => v.into(),
            None => Self::Null,
        }
    }

    /// 不带引号的纯文本形式，用于达梦字面量替换与简写条件的降级。
    /// `Null` 渲染为 `None`，布尔渲染为 `True`/`False`。
    pub fn plain_text(&self) -> String {
        match self {
            Self::Null => "None".to_string(),
            Self::Bool(true) => "True".to_string(),
            Self::Bool(false) => "False".to_string(),
            Self::I64(v) => v.to_string(),
            Self::U64(v) => v.to_string(),
            Self::F64(v) => v.to_string(),
            Self::Decimal(v) => v.to_string(),
            Self::String(v) => v.to_string(),
            Self::DateTime(v) => v
                .format(DATETIME_FORMAT)
                .unwrap_or_else(|_| v.to_string()),
        }
    }
}

impl From<()> for SqlValue {
    fn from(_: ()) -> Self {
        Self::Null
    }
}

impl From<bool> for SqlValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i8> for SqlValue {
    fn from(v: i8) -> Self {
        Self::I64(v as i64)
    }
}

impl From<i16> for SqlValue {
    fn from(v: i16) -> Self {
        Self::I64(v as i64)
    }
}

impl From<i32> for SqlValue {
    fn from(v: i32) -> Self {
        Self::I64(v as i64)
    }
}

impl From<i64> for SqlValue {
    fn from(v: i64) -> Self {
        Self::I64(v)
    }
}

impl From<u8> for SqlValue {
    fn from(v: u8) -> Self {
        Self::U64(v as u64)
    }
}

impl From<u16> for SqlValue {
    fn from(v: u16) -> Self {
        Self::U64(v as u64)
    }
}

impl From<u32> for SqlValue {
    fn from(v: u32) -> Self {
        Self::U64(v as u64)
    }
}

impl From<u64> for SqlValue {
    fn from(v: u64) -> Self {
        Self::U64(v)
    }
}

impl From<f32> for SqlValue {
    fn from(v: f32) -> Self {
        Self::F64(v as f64)
    }
}

impl From<f64> for SqlValue {
    fn from(v: f64) -> Self {
        Self::F64(v)
    }
}

impl From<Decimal> for SqlValue {
    fn from(v: Decimal) -> Self {
        Self::Decimal(v)
    }
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        Self::String(Cow::Owned(v))
    }
}

impl From<&'static str> for SqlValue {
    fn from(v: &'static str) -> Self {
        Self::String(Cow::Borrowed(v))
    }
}

impl From<time::OffsetDateTime> for SqlValue {
    fn from(v: time::OffsetDateTime) -> Self {
        Self::DateTime(v)
    }
}

/// 聚合结果、步长等场景下的数值。
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Int(i64),
    Float(f64),
    Decimal(Decimal),
}

impl Number {
    pub fn is_positive(&self) -> bool {
        match self {
            Self::Int(v) => *v > 0,
            Self::Float(v) => *v > 0.0,
            Self::Decimal(v) => v.is_sign_positive() && !v.is_zero(),
        }
    }

    pub fn neg(&self) -> Self {
        match self {
            Self::Int(v) => Self::Int(-v),
            Self::Float(v) => Self::Float(-v),
            Self::Decimal(v) => Self::Decimal(-*v),
        }
    }

    pub fn as_i64(&self) -> i64 {
        match self {
            Self::Int(v) => *v,
            Self::Float(v) => *v as i64,
            Self::Decimal(v) => v.trunc().try_into().unwrap_or(0),
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Decimal(v) => write!(f, "{v}"),
        }
    }
}

fn int_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^-?\d+$").expect("int regex"))
}

/// 把值提升为数值。字符串先按整数匹配，再按十进制小数解析；
/// 失败时以 `key` 报错。
pub fn to_number(v: &SqlValue, key: &str) -> Result<Number> {
    match v {
        SqlValue::I64(n) => Ok(Number::Int(*n)),
        SqlValue::U64(n) => Ok(Number::Int(*n as i64)),
        SqlValue::F64(n) => Ok(Number::Float(*n)),
        SqlValue::Decimal(n) => Ok(Number::Decimal(*n)),
        SqlValue::Null => Ok(Number::Int(0)),
        SqlValue::String(s) => {
            let s = s.trim();
            if int_re().is_match(s) {
                s.parse::<i64>()
                    .map(Number::Int)
                    .map_err(|_| Error::validation(format!("`{key}` must number")))
            } else if let Ok(d) = s.parse::<Decimal>() {
                Ok(Number::Decimal(d))
            } else {
                Err(Error::validation(format!("`{key}` must number")))
            }
        }
        _ => Err(Error::validation(format!("`{key}` must number"))),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal::Decimal;

    use super::{Number, SqlValue, to_number};

    #[test]
    fn from_option_some() {
        assert_eq!(SqlValue::from_option(Some(123_i64)), SqlValue::I64(123));
    }

    #[test]
    fn from_option_none() {
        assert_eq!(SqlValue::from_option::<i64>(None), SqlValue::Null);
    }

    #[test]
    fn plain_text_shapes() {
        assert_eq!(SqlValue::I64(1).plain_text(), "1");
        assert_eq!(SqlValue::Bool(true).plain_text(), "True");
        assert_eq!(SqlValue::Null.plain_text(), "None");
        assert_eq!(SqlValue::from("abc").plain_text(), "abc");
    }

    #[test]
    fn to_number_int_string() {
        assert_eq!(to_number(&SqlValue::from("12"), "step").unwrap(), Number::Int(12));
    }

    #[test]
    fn to_number_decimal_string() {
        let n = to_number(&SqlValue::from("1.2"), "step").unwrap();
        assert_eq!(n, Number::Decimal(Decimal::new(12, 1)));
        assert_eq!(n.to_string(), "1.2");
    }

    #[test]
    fn to_number_rejects_text() {
        let err = to_number(&SqlValue::from("abc"), "step").unwrap_err();
        assert_eq!(err.to_string(), "`step` must number");
    }

    #[test]
    fn number_sign_helpers() {
        assert!(Number::Int(1).is_positive());
        assert!(!Number::Int(0).is_positive());
        assert_eq!(Number::Decimal(Decimal::new(12, 1)).neg().to_string(), "-1.2");
    }
}
