//! 数据库网关契约：连接、游标与行类型。
//!
//! 本 crate 不内置任何驱动，执行侧由调用方实现 [`Connection`]。
//! 读写的错误策略在 [`Table`](crate::table::Table) 层区分：
//! 读失败记日志并返回空结果，写失败原样上抛。

use indexmap::IndexMap;

use crate::error::Result;
use crate::value::SqlValue;

/// 一行查询结果，保持列的出现顺序。
pub type Record = IndexMap<String, SqlValue>;

/// 数据库连接契约。
pub trait Connection {
    /// 执行查询，返回全部结果行。
    fn query(&mut self, sql: &str, params: &[SqlValue]) -> Result<Vec<Record>>;

    /// 执行写语句，返回受影响行数。
    fn execute(&mut self, sql: &str, params: &[SqlValue]) -> Result<u64>;

    /// 提交当前事务(批量更新按批提交)。
    fn commit(&mut self) -> Result<()>;

    /// 流式游标，适合大结果集逐行消费。
    fn cursor(&mut self, sql: &str, params: &[SqlValue]) -> Result<Box<dyn Cursor>>;

    /// 当前库名(达梦下同时作为 schema 名)。
    fn database(&self) -> &str;

    /// 连接是否可用(ping)。
    fn check_connected(&mut self) -> bool {
        true
    }
}

/// 流式结果游标。
pub trait Cursor {
    fn next_row(&mut self) -> Option<Record>;

    fn rowcount(&self) -> i64 {
        -1
    }
}

/// 驱动侧的 `%` 转义：
///
/// - 无绑定参数时所有 `%` 翻倍；
/// - 有参数时仅翻倍不构成 `%s`/`%%`/`%(` 起始的孤立 `%`。
pub fn escape_percent(sql: &str, has_params: bool) -> String {
    if !has_params {
        return sql.replace('%', "%%");
    }
    let chars: Vec<char> = sql.chars().collect();
    let mut out = String::with_capacity(sql.len());
    for (i, &c) in chars.iter().enumerate() {
        if c == '%' {
            let prev_is_percent = i > 0 && chars[i - 1] == '%';
            let next = chars.get(i + 1).copied();
            let starts_slot = matches!(next, Some('%') | Some('s') | Some('('));
            if !prev_is_percent && !starts_slot {
                out.push_str("%%");
                continue;
            }
        }
        out.push(c);
    }
    out
}
