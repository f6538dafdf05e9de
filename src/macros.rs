//! 便捷宏。

/// 按书写顺序构造一行 [`Record`](crate::gateway::Record)：
///
/// ```
/// use chainsql::record;
///
/// let row = record! {"id" => 1, "name" => "china"};
/// assert_eq!(row.len(), 2);
/// ```
#[macro_export]
macro_rules! record {
    () => {
        $crate::gateway::Record::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut row = $crate::gateway::Record::new();
        $(
            row.insert(($key).to_string(), $crate::value::SqlValue::from($value));
        )+
        row
    }};
}
