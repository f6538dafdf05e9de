//! 错误类型：校验错误与执行错误两类。

/// crate 级 Result 别名。
pub type Result<T> = std::result::Result<T, Error>;

/// 调用错误分两类：
///
/// - `Validation`：参数、条件、配置不合法，在发出任何 SQL 之前触发，
///   调用方修正后可重试；
/// - `Execution`：数据库网关返回的执行失败。
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum Error {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Execution(String),
}

impl Error {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn execution(msg: impl Into<String>) -> Self {
        Self::Execution(msg.into())
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

impl From<crate::interpolate::InterpolateError> for Error {
    fn from(e: crate::interpolate::InterpolateError) -> Self {
        Self::Validation(e.to_string())
    }
}
