//! SQL 方言：控制标识符引号、占位符、聚合别名与目录查询等差异。

use std::fmt;

/// 支持的方言。MySQL 走驱动占位符绑定，达梦(DM)走字面量插值。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Dialect {
    #[default]
    MySql,
    Dameng,
}

impl Dialect {
    /// 标识符加引号：MySQL 反引号，达梦双引号。
    pub fn quote(self, name: &str) -> String {
        match self {
            Self::MySql => format!("`{name}`"),
            Self::Dameng => format!("\"{name}\""),
        }
    }

    /// 条件片段中的值占位符。达梦的占位符自带单引号，
    /// 渲染阶段直接以字面量文本替换。
    pub fn placeholder(self) -> &'static str {
        match self {
            Self::MySql => "%s",
            Self::Dameng => "'%s'",
        }
    }

    /// 聚合结果列的别名：达梦加下划线前缀避开保留字。
    pub fn aggregate_alias(self, func: &str) -> String {
        match self {
            Self::MySql => func.to_lowercase(),
            Self::Dameng => format!("_{}", func.to_lowercase()),
        }
    }

    /// 查询表结构(列名、类型、主键、自增)的目录 SQL。
    pub fn columns_sql(self, schema: &str, table: &str) -> String {
        match self {
            Self::MySql => format!("desc `{table}`;"),
            Self::Dameng => format!(
                "SELECT \
                 c.column_name AS column_name, \
                 c.data_type AS data_type, \
                 DECODE(c.nullable, 'Y', 0, 1) AS notnull, \
                 c.data_default AS data_default, \
                 DECODE(p.column_name, NULL, 0, 1) AS pk, \
                 DECODE(c.data_default, NULL, 0, 1) AS autoinc \
                 FROM all_tab_columns c \
                 LEFT JOIN ( \
                 SELECT cu.column_name \
                 FROM all_cons_columns cu \
                 JOIN all_constraints au \
                 ON cu.constraint_name = au.constraint_name \
                 AND cu.owner = au.owner \
                 WHERE au.constraint_type = 'P' \
                 AND au.owner = '{schema}' \
                 AND au.table_name = '{table}' \
                 ) p ON c.column_name = p.column_name \
                 WHERE c.owner = '{schema}' AND c.table_name = '{table}'"
            ),
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::MySql => "MySQL",
            Self::Dameng => "Dameng",
        };
        f.write_str(s)
    }
}
