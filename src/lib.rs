//! chainsql：链式 SQL 构建与轻量 ORM，支持 MySQL 与达梦双方言。
//!
//! `Table` 在一个借用的网关连接上做链式查询：where/order/limit 等
//! 方法累积状态，select/insert/update 等终结方法组装 SQL 并执行，
//! 之后状态自动重置。`fetch_sql` 模式下终结方法只渲染 SQL 不执行。

pub mod cache;
pub mod config;
pub mod dialect;
pub mod error;
pub mod gateway;
pub mod interpolate;
pub mod macros;
pub mod parse;
#[cfg(test)]
mod parse_tests;
pub mod table;
#[cfg(test)]
mod test_support;
pub mod value;

pub use crate::cache::{CacheStorage, MemoryCache};
pub use crate::config::{DbConfig, DbType};
pub use crate::dialect::Dialect;
pub use crate::error::{Error, Result};
pub use crate::gateway::{Connection, Cursor, Record, escape_percent};
pub use crate::interpolate::{InterpolateError, escape_string, interpolate};
pub use crate::parse::{WhereValue, parse_key, parse_value, parse_where};
pub use crate::table::{
    ColumnData, ColumnInfo, Fetch, FieldArg, InsertData, InsertFields, Table, WhereArg,
};
pub use crate::value::{Number, SqlValue, to_number};
