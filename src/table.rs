//! 链式查询构造器。
//!
//! `Table` 持有一个查询状态 [`QueryState`]，链式方法只累积状态，
//! 终结方法(select/insert/update/...)组装 SQL 并经网关执行。
//! 终结方法无论成功、失败还是校验拦截都会重置状态，链不可复用。
//!
//! 读写错误策略不同：读失败记日志并返回空结果，写失败上抛
//! [`Error::Execution`]。

use std::collections::HashSet;
use std::mem;

use indexmap::IndexMap;

use crate::cache::{CacheStorage, MemoryCache};
use crate::dialect::Dialect;
use crate::error::{Error, Result};
use crate::gateway::{Connection, Cursor, Record};
use crate::interpolate::interpolate;
use crate::parse::{WhereValue, parse_key, parse_value, parse_where};
use crate::value::{Number, SqlValue, to_number};

/// 终结方法的返回：正常数据，或 fetch_sql 模式下渲染好的 SQL 文本。
#[derive(Debug, Clone, PartialEq)]
pub enum Fetch<T> {
    Data(T),
    Sql(String),
}

impl<T> Fetch<T> {
    pub fn data(self) -> Option<T> {
        match self {
            Self::Data(v) => Some(v),
            Self::Sql(_) => None,
        }
    }

    pub fn sql(self) -> Option<String> {
        match self {
            Self::Sql(s) => Some(s),
            Self::Data(_) => None,
        }
    }
}

/// 表字段元信息，惰性读取后在 `Table` 实例内缓存。
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnInfo {
    pub name: String,
    pub type_name: String,
    pub notnull: bool,
    pub default: Option<String>,
    pub primary: bool,
    pub autoinc: bool,
}

impl ColumnInfo {
    fn from_row(dialect: Dialect, row: &Record) -> Self {
        let text = |k: &str| -> String {
            match row.get(k) {
                None | Some(SqlValue::Null) => String::new(),
                Some(v) => v.plain_text(),
            }
        };
        let opt = |k: &str| -> Option<String> {
            match row.get(k) {
                None | Some(SqlValue::Null) => None,
                Some(v) => Some(v.plain_text()),
            }
        };
        let flag = |k: &str| -> bool {
            matches!(row.get(k), Some(SqlValue::I64(n)) if *n != 0)
                || matches!(row.get(k), Some(SqlValue::U64(n)) if *n != 0)
        };
        match dialect {
            Dialect::MySql => Self {
                name: text("Field"),
                type_name: text("Type"),
                notnull: text("Null") == "YES",
                default: opt("Default"),
                primary: text("Key") == "PRI",
                autoinc: text("Extra") == "auto_increment",
            },
            Dialect::Dameng => Self {
                name: text("column_name"),
                type_name: text("data_type"),
                notnull: flag("notnull"),
                default: opt("data_default"),
                primary: flag("pk"),
                autoinc: flag("autoinc"),
            },
        }
    }
}

/// `column` 的返回形态，取决于字段数与键名参数。
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    Values(Vec<SqlValue>),
    Rows(Vec<Record>),
    KeyedValues(IndexMap<String, SqlValue>),
    KeyedRows(IndexMap<String, Record>),
}

/// `where_`/`where_or` 的入参形态。
///
/// - 裸字符串：原生 SQL 片段；
/// - `(字段, 值)`：简写形式，值会被降级为文本(trim + 小写)再绑定；
/// - `(字段, 操作符, 值)`：完整三元组；
/// - 三元组列表；
/// - 有序映射：每项按简写形式处理。
#[derive(Debug, Clone)]
pub enum WhereArg {
    Raw(String),
    Pair(String, SqlValue),
    Triple(String, String, WhereValue),
    List(Vec<(String, String, WhereValue)>),
    Map(Vec<(String, SqlValue)>),
}

impl From<&str> for WhereArg {
    fn from(v: &str) -> Self {
        Self::Raw(v.to_string())
    }
}

impl From<String> for WhereArg {
    fn from(v: String) -> Self {
        Self::Raw(v)
    }
}

impl<F: Into<String>, V: Into<SqlValue>> From<(F, V)> for WhereArg {
    fn from((field, value): (F, V)) -> Self {
        Self::Pair(field.into(), value.into())
    }
}

impl<F: Into<String>, S: Into<String>, V: Into<WhereValue>> From<(F, S, V)> for WhereArg {
    fn from((field, symbol, value): (F, S, V)) -> Self {
        Self::Triple(field.into(), symbol.into(), value.into())
    }
}

impl<F: Into<String>, S: Into<String>, V: Into<WhereValue>> From<Vec<(F, S, V)>> for WhereArg {
    fn from(items: Vec<(F, S, V)>) -> Self {
        Self::List(
            items
                .into_iter()
                .map(|(f, s, v)| (f.into(), s.into(), v.into()))
                .collect(),
        )
    }
}

impl<V: Into<SqlValue>> From<IndexMap<String, V>> for WhereArg {
    fn from(map: IndexMap<String, V>) -> Self {
        Self::Map(map.into_iter().map(|(k, v)| (k, v.into())).collect())
    }
}

/// `field` 的入参形态。布尔入参只有 `true`(展开全字段)合法。
#[derive(Debug, Clone)]
pub enum FieldArg {
    All,
    Csv(String),
    List(Vec<String>),
    Invalid,
}

impl From<bool> for FieldArg {
    fn from(v: bool) -> Self {
        if v { Self::All } else { Self::Invalid }
    }
}

impl From<&str> for FieldArg {
    fn from(v: &str) -> Self {
        if v == "*" {
            Self::All
        } else {
            Self::Csv(v.to_string())
        }
    }
}

impl From<String> for FieldArg {
    fn from(v: String) -> Self {
        Self::from(v.as_str())
    }
}

impl From<Vec<String>> for FieldArg {
    fn from(v: Vec<String>) -> Self {
        Self::List(v)
    }
}

impl From<Vec<&str>> for FieldArg {
    fn from(v: Vec<&str>) -> Self {
        Self::List(v.into_iter().map(str::to_string).collect())
    }
}

/// `insert` 的入参：单行或多行。
#[derive(Debug, Clone)]
pub enum InsertData {
    One(Record),
    Many(Vec<Record>),
}

impl From<Record> for InsertData {
    fn from(v: Record) -> Self {
        Self::One(v)
    }
}

impl From<Vec<Record>> for InsertData {
    fn from(v: Vec<Record>) -> Self {
        Self::Many(v)
    }
}

/// `insert_to` 的列清单。
#[derive(Debug, Clone)]
pub enum InsertFields {
    None,
    Raw(String),
    List(Vec<String>),
}

impl From<()> for InsertFields {
    fn from(_: ()) -> Self {
        Self::None
    }
}

impl From<&str> for InsertFields {
    fn from(v: &str) -> Self {
        if v.starts_with('(') {
            Self::Raw(v.to_string())
        } else {
            Self::List(v.split(',').map(str::to_string).collect())
        }
    }
}

impl From<Vec<String>> for InsertFields {
    fn from(v: Vec<String>) -> Self {
        Self::List(v)
    }
}

impl From<Vec<&str>> for InsertFields {
    fn from(v: Vec<&str>) -> Self {
        Self::List(v.into_iter().map(str::to_string).collect())
    }
}

/// 一次链式查询累积的全部状态。终结方法取走并重置。
#[derive(Debug, Clone)]
struct QueryState {
    condition_str: String,
    condition_val: Vec<SqlValue>,
    limit_sql: String,
    limit_params: Vec<SqlValue>,
    order_by: String,
    group_by: String,
    distinct_by: String,
    select_fields: Vec<String>,
    join_list: Vec<String>,
    fetch_sql: bool,
    use_cache: bool,
    cache_key: Option<String>,
    cache_expire: i64,
}

impl Default for QueryState {
    fn default() -> Self {
        Self {
            condition_str: "1=1".to_string(),
            condition_val: Vec::new(),
            limit_sql: String::new(),
            limit_params: Vec::new(),
            order_by: String::new(),
            group_by: String::new(),
            distinct_by: String::new(),
            select_fields: vec!["*".to_string()],
            join_list: Vec::new(),
            fetch_sql: false,
            use_cache: false,
            cache_key: None,
            cache_expire: 3600,
        }
    }
}

/// 去掉条件串里的 `1=1` 哨兵前缀。
fn condition_fix(condition_str: &str) -> String {
    condition_str.replace("1=1 AND ", "").replace("1=1 OR ", "")
}

/// 数据表对象，借用一个网关连接做链式查询。
pub struct Table<'a> {
    conn: &'a mut dyn Connection,
    dialect: Dialect,
    table_name: String,
    schema: String,
    columns: IndexMap<String, ColumnInfo>,
    pk: Option<ColumnInfo>,
    debug: bool,
    cache_storage: Box<dyn CacheStorage>,
    state: QueryState,
}

impl<'a> Table<'a> {
    pub fn new(conn: &'a mut dyn Connection, table_name: impl Into<String>, dialect: Dialect) -> Self {
        let schema = match dialect {
            Dialect::Dameng => conn.database().to_uppercase(),
            Dialect::MySql => String::new(),
        };
        if !conn.check_connected() {
            tracing::warn!("database connection is not alive");
        }
        Self {
            conn,
            dialect,
            table_name: table_name.into(),
            schema,
            columns: IndexMap::new(),
            pk: None,
            debug: false,
            cache_storage: Box::new(MemoryCache::new()),
            state: QueryState::default(),
        }
    }

    /// 重置查询状态。终结方法内部总会调用，链式使用时无需手动。
    pub fn init(&mut self) -> &mut Self {
        self.state = QueryState::default();
        self
    }

    fn take_state(&mut self) -> QueryState {
        mem::take(&mut self.state)
    }

    /// 表字段名列表(惰性读取表结构，之后实例内缓存)。
    pub fn get_fields(&mut self) -> Result<Vec<String>> {
        self.load_columns()?;
        Ok(self.columns.keys().cloned().collect())
    }

    /// 主键字段元信息(如果有)。
    pub fn primary_key(&mut self) -> Result<Option<ColumnInfo>> {
        self.load_columns()?;
        Ok(self.pk.clone())
    }

    fn load_columns(&mut self) -> Result<()> {
        if !self.columns.is_empty() {
            return Ok(());
        }
        let sql = self.dialect.columns_sql(&self.schema, &self.table_name);
        let rows = self.conn.query(&sql, &[])?;
        for row in rows {
            let info = ColumnInfo::from_row(self.dialect, &row);
            if info.primary {
                self.pk = Some(info.clone());
            }
            self.columns.insert(info.name.clone(), info);
        }
        Ok(())
    }

    /// FROM 子句的表引用：达梦带 schema 前缀并加引号。
    fn table_ref(&self) -> Result<String> {
        match self.dialect {
            Dialect::MySql => Ok(self.table_name.clone()),
            Dialect::Dameng => Ok(format!(
                "{}.{}",
                self.schema,
                parse_key(self.dialect, &self.table_name, false)?
            )),
        }
    }

    fn select_fields_str(&self, st: &QueryState) -> Result<String> {
        match self.dialect {
            Dialect::MySql => Ok(st.select_fields.join(",")),
            Dialect::Dameng => {
                let parts = st
                    .select_fields
                    .iter()
                    .map(|f| parse_key(self.dialect, f, false))
                    .collect::<Result<Vec<_>>>()?;
                Ok(parts.join(","))
            }
        }
    }

    // ------------------------------------------------------------------
    // 链式方法
    // ------------------------------------------------------------------

    /// AND 条件，参见 [`WhereArg`] 支持的形态。
    pub fn where_(&mut self, arg: impl Into<WhereArg>) -> Result<&mut Self> {
        match arg.into() {
            WhereArg::Raw(s) => self.push_condition(&s, "", WhereValue::None)?,
            WhereArg::Pair(field, value) => {
                self.push_condition(&field, &value.plain_text(), WhereValue::None)?
            }
            WhereArg::Triple(field, symbol, value) => {
                self.push_condition(&field, &symbol, value)?
            }
            WhereArg::List(items) => {
                for (field, symbol, value) in items {
                    self.push_condition(&field, &symbol, value)?;
                }
            }
            WhereArg::Map(entries) => {
                for (field, value) in entries {
                    self.push_condition(&field, &value.plain_text(), WhereValue::None)?;
                }
            }
        }
        Ok(self)
    }

    fn push_condition(&mut self, field: &str, symbol: &str, value: WhereValue) -> Result<()> {
        let (condition_str, condition_val) = parse_where(self.dialect, field, symbol, value)?;
        self.state.condition_str.push_str(&condition_str);
        self.state.condition_val.extend(condition_val);
        Ok(())
    }

    /// OR 条件组：整组条件去掉 `" AND "` 前缀后包进 `OR (...)`。
    pub fn where_or(&mut self, arg: impl Into<WhereArg>) -> Result<&mut Self> {
        let (fragment, params) = match arg.into() {
            WhereArg::Raw(s) => parse_where(self.dialect, &s, "", WhereValue::None)?,
            WhereArg::Pair(field, value) => {
                parse_where(self.dialect, &field, &value.plain_text(), WhereValue::None)?
            }
            WhereArg::Triple(field, symbol, value) => {
                parse_where(self.dialect, &field, &symbol, value)?
            }
            WhereArg::List(items) => {
                let mut fragment = String::new();
                let mut params = Vec::new();
                for (field, symbol, value) in items {
                    let (cs, cv) = parse_where(self.dialect, &field, &symbol, value)?;
                    fragment.push_str(&cs);
                    params.extend(cv);
                }
                (fragment, params)
            }
            WhereArg::Map(_) => return Err(Error::validation("conditions error")),
        };
        let inner = fragment.get(5..).unwrap_or("");
        self.state.condition_str.push_str(&format!(" OR ({inner})"));
        self.state.condition_val.extend(params);
        Ok(self)
    }

    /// 取前 `count` 条。
    pub fn limit(&mut self, count: i64) -> &mut Self {
        self.state.limit_sql = " LIMIT %s".to_string();
        self.state.limit_params = vec![SqlValue::I64(count)];
        self
    }

    /// 从 `start` 行起取 `step` 条。
    pub fn limit_offset(&mut self, start: i64, step: i64) -> &mut Self {
        self.state.limit_sql = " LIMIT %s,%s".to_string();
        self.state.limit_params = vec![SqlValue::I64(start), SqlValue::I64(step)];
        self
    }

    /// 分页：页码从 1 起。
    pub fn page(&mut self, index: i64, size: i64) -> &mut Self {
        self.limit_offset(size * (index - 1), size)
    }

    /// 排序，`sort` 只接受 ASC/DESC(大小写不敏感)。
    pub fn order(&mut self, field: &str, sort: &str) -> Result<&mut Self> {
        let sort = sort.trim().to_uppercase();
        if sort != "ASC" && sort != "DESC" {
            return Err(Error::validation("sort must be ASC or DESC"));
        }
        let field = parse_key(self.dialect, field, false)?;
        if self.state.order_by.is_empty() {
            self.state.order_by = format!(" ORDER BY {field} {sort}");
        } else {
            self.state.order_by.push_str(&format!(",{field} {sort}"));
        }
        Ok(self)
    }

    /// 分组，`field` 支持逗号分隔多字段。
    pub fn group(&mut self, field: &str) -> Result<&mut Self> {
        let parts = field
            .split(',')
            .map(|x| match self.dialect {
                Dialect::MySql => Ok(self.dialect.quote(x)),
                Dialect::Dameng => parse_key(self.dialect, x, false),
            })
            .collect::<Result<Vec<_>>>()?;
        let fields = parts.join(",");
        if self.state.group_by.is_empty() {
            self.state.group_by = format!(" GROUP BY {fields}");
        } else {
            self.state.group_by.push_str(&format!(",{fields}"));
        }
        Ok(self)
    }

    /// 去重。设置后覆盖 select 字段清单。
    pub fn distinct(&mut self, field: &str) -> Result<&mut Self> {
        let fields = match self.dialect {
            Dialect::MySql => field.to_string(),
            Dialect::Dameng => {
                let parts = field
                    .split(',')
                    .map(|x| parse_key(self.dialect, x, false))
                    .collect::<Result<Vec<_>>>()?;
                parts.join(",")
            }
        };
        self.state.distinct_by = format!("DISTINCT {fields}");
        Ok(self)
    }

    /// 限定查询字段。`exclude` 为真时按排除处理(先展开为全字段)。
    pub fn field(&mut self, fields: impl Into<FieldArg>, exclude: bool) -> Result<&mut Self> {
        let mut list: Vec<String> = match fields.into() {
            FieldArg::All => self.get_fields()?,
            FieldArg::Csv(s) => s.split(',').map(|x| x.trim().to_string()).collect(),
            FieldArg::List(v) => v,
            FieldArg::Invalid => return Err(Error::validation("fields is error")),
        };
        if exclude {
            if self.state.select_fields.is_empty() || self.state.select_fields == ["*"] {
                self.state.select_fields = self.get_fields()?;
            }
            let excluded: HashSet<String> = list.into_iter().collect();
            list = self
                .state
                .select_fields
                .iter()
                .filter(|f| !excluded.contains(*f))
                .cloned()
                .collect();
        }
        self.state.select_fields = list;
        Ok(self)
    }

    /// 表别名。注意别名会一直保留到实例销毁，不随状态重置。
    pub fn alias(&mut self, short_name: &str) -> &mut Self {
        self.table_name = format!("{} AS {short_name}", self.table_name);
        self
    }

    /// 连表。`table_name` 含 `join` 子串时视为完整连表 SQL 原样放行；
    /// 与主表同名时必须给 `as_name`。
    pub fn join(
        &mut self,
        table_name: &str,
        as_name: &str,
        on: &str,
        kind: &str,
        and_str: &str,
    ) -> Result<&mut Self> {
        let as_name = if as_name.is_empty() {
            if table_name == self.table_name {
                return Err(Error::validation("table name should set `as_name`"));
            }
            table_name
        } else {
            as_name
        };

        let kind = kind.to_uppercase();
        if !matches!(kind.as_str(), "INNER" | "LEFT" | "RIGHT" | "FULL OUTER") {
            return Err(Error::validation(
                "`join` type must in ('INNER','LEFT','RIGHT','FULL OUTER')",
            ));
        }

        let join_str = if table_name.contains("join") {
            table_name.to_string()
        } else {
            match self.dialect {
                Dialect::MySql => {
                    let mut s = format!("{kind} JOIN {table_name} AS {as_name} ON {on}");
                    if !and_str.is_empty() {
                        s.push_str(&format!(" AND {and_str}"));
                    }
                    s
                }
                Dialect::Dameng => {
                    let qualified = if table_name.contains('.') {
                        table_name.to_string()
                    } else {
                        format!("{}.{}", self.schema, table_name)
                    };
                    let table = parse_key(self.dialect, &qualified, false)?;
                    let as_name = parse_key(self.dialect, as_name, false)?;
                    let (left, right) = on
                        .split_once('=')
                        .ok_or_else(|| Error::validation("join `on` must be `left=right`"))?;
                    let on = format!(
                        "{} = {}",
                        parse_key(self.dialect, left, false)?,
                        parse_key(self.dialect, right, false)?
                    );
                    let mut s = format!("{kind} JOIN {table} AS {as_name} ON {on}");
                    if !and_str.is_empty() {
                        s.push_str(&format!(" AND {and_str}"));
                    }
                    s
                }
            }
        };
        self.state.join_list.push(join_str);
        Ok(self)
    }

    /// UNION 两段查询，整体作为派生表 `t` 替换当前表引用。
    pub fn union(&mut self, sql1: &str, sql2: &str, union_all: bool) -> &mut Self {
        let symbol = if union_all { "UNION ALL" } else { "UNION" };
        self.table_name = format!("({sql1} {symbol} {sql2}) AS t");
        self
    }

    /// 设置后终结方法返回渲染好的 SQL 文本而不执行。
    pub fn fetch_sql(&mut self, flag: bool) -> &mut Self {
        self.state.fetch_sql = flag;
        self
    }

    /// 启用结果缓存。`key` 为空时用 `表名:md5(渲染SQL)` 作为键。
    /// 写操作不会使缓存失效，缓存期内可能读到旧数据。
    pub fn cache(&mut self, key: Option<&str>, expire: i64) -> &mut Self {
        self.state.use_cache = true;
        self.state.cache_key = key.map(str::to_string);
        self.state.cache_expire = expire;
        self
    }

    /// 替换缓存存储实现。
    pub fn set_cache_storage(&mut self, storage: Box<dyn CacheStorage>) -> &mut Self {
        self.cache_storage = storage;
        self
    }

    /// 打开后执行的 SQL 会记入日志。
    pub fn debug(&mut self, flag: bool) -> &mut Self {
        self.debug = flag;
        self
    }

    // ------------------------------------------------------------------
    // 执行通道
    // ------------------------------------------------------------------

    fn run_query(
        &mut self,
        st: QueryState,
        sql: String,
        params: Vec<SqlValue>,
    ) -> Result<Fetch<Vec<Record>>> {
        let rendered = interpolate(self.dialect, &sql, &params)?;
        if st.fetch_sql {
            return Ok(Fetch::Sql(rendered));
        }

        let cache_key = if st.use_cache {
            Some(st.cache_key.clone().unwrap_or_else(|| {
                format!("{}:{:x}", self.table_name, md5::compute(rendered.as_bytes()))
            }))
        } else {
            None
        };
        if let Some(key) = &cache_key {
            if let Some(rows) = self.cache_storage.get(key) {
                // 空结果视为未命中
                if !rows.is_empty() {
                    return Ok(Fetch::Data(rows));
                }
            }
        }

        let result = match self.dialect {
            Dialect::MySql => self.conn.query(&sql, &params),
            Dialect::Dameng => self.conn.query(&rendered, &[]),
        };
        match result {
            Ok(rows) => {
                if let Some(key) = &cache_key {
                    self.cache_storage.set(key, rows.clone(), st.cache_expire);
                }
                self.log_sql(&rendered);
                Ok(Fetch::Data(rows))
            }
            Err(e) => {
                tracing::error!(sql = %rendered, error = %e, "query failed");
                Ok(Fetch::Data(Vec::new()))
            }
        }
    }

    fn run_execute(
        &mut self,
        st: QueryState,
        sql: String,
        params: Vec<SqlValue>,
    ) -> Result<Fetch<u64>> {
        let rendered = interpolate(self.dialect, &sql, &params)?;
        if st.fetch_sql {
            return Ok(Fetch::Sql(rendered));
        }
        let result = match self.dialect {
            Dialect::MySql => self.conn.execute(&sql, &params),
            Dialect::Dameng => self.conn.execute(&rendered, &[]),
        };
        match result {
            Ok(affected) => {
                self.log_sql(&rendered);
                Ok(Fetch::Data(affected))
            }
            Err(e) => {
                tracing::error!(sql = %rendered, error = %e, "execute failed");
                Err(e)
            }
        }
    }

    fn log_sql(&self, rendered: &str) {
        if self.debug {
            tracing::debug!("[sql]({}) {}", self.conn.database(), rendered);
        }
    }

    // ------------------------------------------------------------------
    // 读终结方法
    // ------------------------------------------------------------------

    fn assemble_select(&self, st: &QueryState) -> Result<(String, Vec<SqlValue>)> {
        let mut fields = self.select_fields_str(st)?;
        if !st.distinct_by.is_empty() {
            fields = st.distinct_by.clone();
        }
        let join = st.join_list.join(" ");
        let where_str = condition_fix(&st.condition_str);
        let sql = format!(
            "SELECT {} FROM {} {} WHERE {}{}{}{}",
            fields,
            self.table_ref()?,
            join,
            where_str,
            st.group_by,
            st.order_by,
            st.limit_sql
        );
        let mut params = st.condition_val.clone();
        params.extend(st.limit_params.clone());
        Ok((sql, params))
    }

    /// 查询全部结果行。
    pub fn select(&mut self) -> Result<Fetch<Vec<Record>>> {
        let st = self.take_state();
        let (sql, params) = self.assemble_select(&st)?;
        self.run_query(st, sql, params)
    }

    /// 渲染当前查询为带括号的子查询文本，供 union 等场景使用。
    pub fn select_sql(&mut self) -> Result<String> {
        let st = self.take_state();
        let (sql, params) = self.assemble_select(&st)?;
        let rendered = interpolate(self.dialect, &sql, &params)?;
        Ok(format!("({rendered})"))
    }

    /// 查询单行，无结果时返回空行。
    pub fn find(&mut self) -> Result<Fetch<Record>> {
        self.limit(1);
        Ok(match self.select()? {
            Fetch::Sql(s) => Fetch::Sql(s),
            Fetch::Data(rows) => Fetch::Data(rows.into_iter().next().unwrap_or_default()),
        })
    }

    /// 取单行单字段值，无结果时返回空字符串。
    pub fn value(&mut self, field: &str) -> Result<Fetch<SqlValue>> {
        self.state.select_fields = vec![field.to_string()];
        Ok(match self.find()? {
            Fetch::Sql(s) => Fetch::Sql(s),
            Fetch::Data(row) => Fetch::Data(
                row.get(field)
                    .cloned()
                    .unwrap_or_else(|| SqlValue::from("")),
            ),
        })
    }

    /// 按列取数据。单字段返回值列表；指定 `key` 时返回以该字段值
    /// (文本化)为键的映射。
    pub fn column(&mut self, fields: &str, key: &str) -> Result<Fetch<ColumnData>> {
        let field_list: Vec<String> = fields.split(',').map(str::to_string).collect();
        self.state.select_fields = field_list.clone();
        if !key.is_empty() && !field_list.iter().any(|f| f == key) {
            self.state.select_fields.push(key.to_string());
        }
        let rows = match self.select()? {
            Fetch::Sql(s) => return Ok(Fetch::Sql(s)),
            Fetch::Data(rows) => rows,
        };
        let data = if key.is_empty() {
            if field_list.len() == 1 {
                ColumnData::Values(
                    rows.into_iter()
                        .map(|r| r.get(&field_list[0]).cloned().unwrap_or(SqlValue::Null))
                        .collect(),
                )
            } else {
                ColumnData::Rows(rows)
            }
        } else if field_list.len() == 1 {
            let mut map = IndexMap::new();
            for row in rows {
                let k = row.get(key).map(|v| v.plain_text()).unwrap_or_default();
                let v = row.get(&field_list[0]).cloned().unwrap_or(SqlValue::Null);
                map.insert(k, v);
            }
            ColumnData::KeyedValues(map)
        } else {
            let mut map = IndexMap::new();
            for row in rows {
                let k = row.get(key).map(|v| v.plain_text()).unwrap_or_default();
                map.insert(k, row);
            }
            ColumnData::KeyedRows(map)
        };
        Ok(Fetch::Data(data))
    }

    /// 返回网关流式游标(忽略 distinct 设置)。
    pub fn cursor(&mut self) -> Result<Box<dyn Cursor>> {
        let st = self.take_state();
        let fields = self.select_fields_str(&st)?;
        let join = st.join_list.join(" ");
        let where_str = condition_fix(&st.condition_str);
        let sql = format!(
            "SELECT {} FROM {} {} WHERE {}{}{}{}",
            fields,
            self.table_ref()?,
            join,
            where_str,
            st.group_by,
            st.order_by,
            st.limit_sql
        );
        let mut params = st.condition_val;
        params.extend(st.limit_params);
        match self.dialect {
            Dialect::MySql => self.conn.cursor(&sql, &params),
            Dialect::Dameng => {
                let rendered = interpolate(self.dialect, &sql, &params)?;
                self.conn.cursor(&rendered, &[])
            }
        }
    }

    /// 当前条件下是否存在数据。fetch_sql 模式下恒为真。
    pub fn exists(&mut self) -> Result<bool> {
        let st = self.take_state();
        let join = st.join_list.join(" ");
        let where_str = condition_fix(&st.condition_str);
        let sql = format!(
            "SELECT 1 FROM {} {} WHERE {} LIMIT 1",
            self.table_ref()?,
            join,
            where_str
        );
        let params = st.condition_val.clone();
        match self.run_query(st, sql, params)? {
            Fetch::Sql(_) => Ok(true),
            Fetch::Data(rows) => Ok(!rows.is_empty()),
        }
    }

    // ------------------------------------------------------------------
    // 聚合
    // ------------------------------------------------------------------

    fn aggregate(&mut self, func: &str, expr: String) -> Result<Fetch<SqlValue>> {
        let st = self.take_state();
        let alias = self.dialect.aggregate_alias(func);
        let where_str = condition_fix(&st.condition_str);
        let table = match self.dialect {
            Dialect::MySql => format!("`{}`", self.table_name),
            Dialect::Dameng => self.table_ref()?,
        };
        let sql = format!("SELECT {func}({expr}) AS {alias} FROM {table} WHERE {where_str} LIMIT 1");
        let params = st.condition_val.clone();
        match self.run_query(st, sql, params)? {
            Fetch::Sql(s) => Ok(Fetch::Sql(s)),
            Fetch::Data(rows) => Ok(Fetch::Data(
                rows.first()
                    .and_then(|r| r.get(&alias))
                    .cloned()
                    .unwrap_or(SqlValue::Null),
            )),
        }
    }

    fn numeric_aggregate(&mut self, func: &str, expr: String) -> Result<Fetch<Number>> {
        match self.aggregate(func, expr)? {
            Fetch::Sql(s) => Ok(Fetch::Sql(s)),
            Fetch::Data(SqlValue::Null) => Ok(Fetch::Data(Number::Int(0))),
            Fetch::Data(v) => Ok(Fetch::Data(to_number(&v, &func.to_lowercase())?)),
        }
    }

    fn bare_field(&self, field: &str) -> Result<String> {
        match self.dialect {
            Dialect::MySql => Ok(field.to_string()),
            Dialect::Dameng => parse_key(self.dialect, field, false),
        }
    }

    fn quoted_field(&self, field: &str) -> Result<String> {
        match self.dialect {
            Dialect::MySql => Ok(format!("`{field}`")),
            Dialect::Dameng => parse_key(self.dialect, field, false),
        }
    }

    /// 最大值，空结果或 NULL 时为 0。
    pub fn max(&mut self, field: &str) -> Result<Fetch<Number>> {
        let expr = self.bare_field(field)?;
        self.numeric_aggregate("MAX", expr)
    }

    /// 最小值，空结果或 NULL 时为 0。
    pub fn min(&mut self, field: &str) -> Result<Fetch<Number>> {
        let expr = self.bare_field(field)?;
        self.numeric_aggregate("MIN", expr)
    }

    /// 合计值，空结果或 NULL 时为 0。
    pub fn sum(&mut self, field: &str) -> Result<Fetch<Number>> {
        let expr = self.quoted_field(field)?;
        self.numeric_aggregate("SUM", expr)
    }

    /// 平均值，空结果或 NULL 时为 0。
    pub fn avg(&mut self, field: &str) -> Result<Fetch<Number>> {
        let expr = self.quoted_field(field)?;
        self.numeric_aggregate("AVG", expr)
    }

    /// 行数，`field` 为空时按常量 1 计数。
    pub fn count(&mut self, field: &str) -> Result<Fetch<i64>> {
        let expr = if field.is_empty() {
            "1".to_string()
        } else {
            self.bare_field(field)?
        };
        match self.aggregate("COUNT", expr)? {
            Fetch::Sql(s) => Ok(Fetch::Sql(s)),
            Fetch::Data(SqlValue::Null) => Ok(Fetch::Data(0)),
            Fetch::Data(v) => Ok(Fetch::Data(to_number(&v, "count")?.as_i64())),
        }
    }

    // ------------------------------------------------------------------
    // 写终结方法
    // ------------------------------------------------------------------

    fn build_insert_parts(
        &self,
        data: &InsertData,
    ) -> Result<(String, String, Vec<SqlValue>)> {
        let dm = self.dialect == Dialect::Dameng;
        let rows: Vec<&Record> = match data {
            InsertData::One(row) => vec![row],
            InsertData::Many(rows) => rows.iter().collect(),
        };
        if rows.is_empty() || rows.iter().any(|r| r.is_empty()) {
            return Err(Error::validation("insert data could not be empty"));
        }

        let first_keys: Vec<&String> = rows[0].keys().collect();
        let mut key_parts = Vec::with_capacity(first_keys.len());
        for key in &first_keys {
            key_parts.push(if dm {
                parse_key(self.dialect, key, false)?
            } else {
                (*key).clone()
            });
        }

        let slot = self.dialect.placeholder();
        let mut input_parts = Vec::with_capacity(rows.len());
        let mut params = Vec::new();
        for row in &rows {
            if row.keys().collect::<Vec<_>>() != first_keys {
                return Err(Error::validation("insert records must have the same keys"));
            }
            input_parts.push(format!("({})", vec![slot; row.len()].join(",")));
            for value in row.values() {
                params.push(if dm { parse_value(value) } else { value.clone() });
            }
        }
        Ok((key_parts.join(","), input_parts.join(","), params))
    }

    /// 插入单行或多行。`replace` 在 MySQL 下走 REPLACE 语句；
    /// 达梦没有 REPLACE，按主键存在与否改走 update，自增主键
    /// 显式赋值时先打开 IDENTITY_INSERT。
    pub fn insert(&mut self, data: impl Into<InsertData>, replace: bool) -> Result<Fetch<u64>> {
        let data = data.into();
        let st = self.take_state();
        let (keys, inputs, params) = self.build_insert_parts(&data)?;

        if self.dialect == Dialect::Dameng && !st.fetch_sql {
            if let InsertData::One(row) = &data {
                self.load_columns()?;
                if let Some(pk) = self.pk.clone() {
                    if let Some(pk_value) = row.get(&pk.name).cloned() {
                        if pk.autoinc {
                            let identity =
                                format!("SET IDENTITY_INSERT {} ON;", self.table_ref()?);
                            self.conn.execute(&identity, &[])?;
                        }
                        if replace {
                            self.init();
                            self.where_((pk.name.clone(), pk_value.clone()))?;
                            if self.exists()? {
                                self.init();
                                self.where_((pk.name.clone(), pk_value))?;
                                return self.update(row.clone(), false);
                            }
                        }
                    }
                }
            }
        }

        let action = if replace && self.dialect == Dialect::MySql {
            "REPLACE"
        } else {
            "INSERT"
        };
        let sql = format!("{action} INTO {} ({keys}) VALUES {inputs};", self.table_ref()?);
        self.run_execute(st, sql, params)
    }

    /// 更新当前条件命中的行。未设置条件且 `all_record` 为假时拒绝。
    pub fn update(&mut self, data: Record, all_record: bool) -> Result<Fetch<u64>> {
        let st = self.take_state();
        if !all_record && st.condition_str == "1=1" {
            return Err(Error::validation("please set `where` conditions!"));
        }
        let dm = self.dialect == Dialect::Dameng;
        let mut inputs = Vec::with_capacity(data.len());
        let mut params = Vec::with_capacity(data.len() + st.condition_val.len());
        for (key, value) in &data {
            if dm {
                inputs.push(format!("{}='%s'", parse_key(self.dialect, key, false)?));
                params.push(parse_value(value));
            } else {
                inputs.push(format!("{key}=%s"));
                params.push(value.clone());
            }
        }
        params.extend(st.condition_val.clone());
        let sql = format!(
            "UPDATE {} SET {} WHERE {};",
            self.table_ref()?,
            inputs.join(","),
            condition_fix(&st.condition_str)
        );
        self.run_execute(st, sql, params)
    }

    /// 删除当前条件命中的行。未设置条件且 `all_record` 为假时拒绝。
    pub fn delete(&mut self, all_record: bool) -> Result<Fetch<u64>> {
        let st = self.take_state();
        if !all_record && st.condition_str == "1=1" {
            return Err(Error::validation("please set `where` conditions!"));
        }
        let sql = format!(
            "DELETE FROM {} WHERE {};",
            self.table_ref()?,
            condition_fix(&st.condition_str)
        );
        let params = st.condition_val.clone();
        self.run_execute(st, sql, params)
    }

    fn apply_step(&mut self, field: &str, step: Number) -> Result<Fetch<u64>> {
        let st = self.take_state();
        if st.condition_str == "1=1" {
            return Err(Error::validation("please set `where` conditions!"));
        }
        let symbol = if step.is_positive() { "+" } else { "" };
        let field = self.quoted_field(field)?;
        let sql = format!(
            "UPDATE {} SET {field} = {field}{symbol}{step} WHERE {}",
            self.table_ref()?,
            condition_fix(&st.condition_str)
        );
        let params = st.condition_val.clone();
        self.run_execute(st, sql, params)
    }

    /// 字段递增。步长必须是数值，必须先设置条件。
    pub fn inc(&mut self, field: &str, step: impl Into<SqlValue>) -> Result<Fetch<u64>> {
        let step = to_number(&step.into(), "step")?;
        self.apply_step(field, step)
    }

    /// 字段递减，等价于负步长的 [`inc`](Self::inc)。
    pub fn dec(&mut self, field: &str, step: impl Into<SqlValue>) -> Result<Fetch<u64>> {
        let step = to_number(&step.into(), "step")?;
        self.apply_step(field, step.neg())
    }

    /// SELECT INTO 复制表。`create_blank_table` 为真时只建结构。
    pub fn copy_to(
        &mut self,
        new_table: Option<&str>,
        create_blank_table: bool,
    ) -> Result<Fetch<u64>> {
        let st = self.take_state();
        let new_table = match new_table {
            Some(name) => name.to_string(),
            None => format!("{}_copy", self.table_name),
        };
        let fields = st.select_fields.join(", ");
        let mut sql = format!("SELECT {fields} INTO {new_table} FROM {}", self.table_ref()?);
        if create_blank_table {
            sql.push_str(" WHERE 1=0");
        } else {
            sql.push_str(&format!(" WHERE {}", condition_fix(&st.condition_str)));
        }
        let params = st.condition_val.clone();
        self.run_execute(st, sql, params)
    }

    /// INSERT INTO ... SELECT 复制数据到另一张表。
    /// 给出字段列表时与 select 字段数量必须一致。
    pub fn insert_to(
        &mut self,
        new_table: &str,
        fields: impl Into<InsertFields>,
    ) -> Result<Fetch<u64>> {
        let fields = fields.into();
        let st = self.take_state();
        let dm = self.dialect == Dialect::Dameng;
        let new_table = if dm {
            parse_key(self.dialect, new_table, false)?
        } else {
            new_table.to_string()
        };
        let mut sql = format!("INSERT INTO {new_table}");
        let mut front_params: Vec<SqlValue> = Vec::new();
        match &fields {
            InsertFields::None => {}
            InsertFields::Raw(raw) => {
                sql.push_str(&format!(" {raw} "));
            }
            InsertFields::List(list) => {
                let list: Vec<String> = if dm {
                    list.iter()
                        .map(|f| parse_key(self.dialect, f, false))
                        .collect::<Result<Vec<_>>>()?
                } else {
                    list.clone()
                };
                if st.select_fields.len() != list.len() {
                    return Err(Error::validation(
                        "fields count not match select_fields count",
                    ));
                }
                let slots = vec!["%s"; list.len()].join(",");
                sql.push_str(&format!(" ({slots})"));
                front_params = list.into_iter().map(SqlValue::from).collect();
            }
        }

        let select_fields = self.select_fields_str(&st)?;
        let join = st.join_list.join(" ");
        let where_str = condition_fix(&st.condition_str);
        sql.push_str(&format!(
            " SELECT {} FROM {} {} WHERE {}{}{}{}",
            select_fields,
            self.table_ref()?,
            join,
            where_str,
            st.group_by,
            st.order_by,
            st.limit_sql
        ));

        let mut params = front_params;
        params.extend(st.condition_val.clone());
        params.extend(st.limit_params.clone());
        self.run_execute(st, sql, params)
    }

    /// 批量按键更新：先为每条记录渲染 UPDATE 语句，再按每批 100 条
    /// 执行并提交，返回累计影响行数。任一记录缺少 `key` 时整批拒绝。
    pub fn batch_update(&mut self, data: &[Record], key: &str) -> Result<u64> {
        let mut statements = Vec::with_capacity(data.len());
        for row in data {
            let Some(key_value) = row.get(key) else {
                return Err(Error::validation(format!("key:{key} not in data item")));
            };
            self.init();
            self.where_((key.to_string(), key_value.clone()))?;
            self.fetch_sql(true);
            if let Fetch::Sql(sql) = self.update(row.clone(), false)? {
                statements.push(sql);
            }
        }
        let mut affected = 0;
        for chunk in statements.chunks(100) {
            for sql in chunk {
                affected += self.conn.execute(sql, &[])?;
            }
            self.conn.commit()?;
        }
        Ok(affected)
    }
}
