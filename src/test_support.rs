//! 测试用内存网关：记录收到的 SQL 与参数，按脚本返回结果。

use std::collections::VecDeque;

use crate::error::{Error, Result};
use crate::gateway::{Connection, Cursor, Record};
use crate::value::SqlValue;

pub struct MockConn {
    pub database: String,
    pub query_results: VecDeque<Vec<Record>>,
    pub execute_results: VecDeque<u64>,
    pub queried: Vec<(String, Vec<SqlValue>)>,
    pub executed: Vec<(String, Vec<SqlValue>)>,
    pub commits: usize,
    pub fail_query: bool,
    pub fail_execute: bool,
}

impl MockConn {
    pub fn new(database: &str) -> Self {
        Self {
            database: database.to_string(),
            query_results: VecDeque::new(),
            execute_results: VecDeque::new(),
            queried: Vec::new(),
            executed: Vec::new(),
            commits: 0,
            fail_query: false,
            fail_execute: false,
        }
    }

    pub fn push_rows(&mut self, rows: Vec<Record>) -> &mut Self {
        self.query_results.push_back(rows);
        self
    }

    pub fn last_query(&self) -> &(String, Vec<SqlValue>) {
        self.queried.last().expect("no query recorded")
    }

    pub fn last_executed(&self) -> &(String, Vec<SqlValue>) {
        self.executed.last().expect("no execute recorded")
    }
}

impl Connection for MockConn {
    fn query(&mut self, sql: &str, params: &[SqlValue]) -> Result<Vec<Record>> {
        self.queried.push((sql.to_string(), params.to_vec()));
        if self.fail_query {
            return Err(Error::execution("mock query failure"));
        }
        Ok(self.query_results.pop_front().unwrap_or_default())
    }

    fn execute(&mut self, sql: &str, params: &[SqlValue]) -> Result<u64> {
        self.executed.push((sql.to_string(), params.to_vec()));
        if self.fail_execute {
            return Err(Error::execution("mock execute failure"));
        }
        Ok(self.execute_results.pop_front().unwrap_or(1))
    }

    fn commit(&mut self) -> Result<()> {
        self.commits += 1;
        Ok(())
    }

    fn cursor(&mut self, sql: &str, params: &[SqlValue]) -> Result<Box<dyn Cursor>> {
        self.queried.push((sql.to_string(), params.to_vec()));
        if self.fail_query {
            return Err(Error::execution("mock query failure"));
        }
        let rows = self.query_results.pop_front().unwrap_or_default();
        let total = rows.len() as i64;
        Ok(Box::new(MockCursor {
            rows: rows.into(),
            total,
        }))
    }

    fn database(&self) -> &str {
        &self.database
    }
}

pub struct MockCursor {
    rows: VecDeque<Record>,
    total: i64,
}

impl Cursor for MockCursor {
    fn next_row(&mut self) -> Option<Record> {
        self.rows.pop_front()
    }

    fn rowcount(&self) -> i64 {
        self.total
    }
}
