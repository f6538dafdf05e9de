#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::dialect::Dialect;
    use crate::parse::{WhereValue, parse_key, parse_value, parse_where};
    use crate::value::SqlValue;

    fn pw(
        dialect: Dialect,
        field: &str,
        symbol: &str,
        value: impl Into<WhereValue>,
    ) -> (String, Vec<SqlValue>) {
        parse_where(dialect, field, symbol, value.into()).unwrap()
    }

    // ------------------------------------------------------------------
    // parse_key
    // ------------------------------------------------------------------

    #[test]
    fn key_plain_identifier() {
        assert_eq!(parse_key(Dialect::MySql, "id", false).unwrap(), "`id`");
        assert_eq!(parse_key(Dialect::Dameng, "id", false).unwrap(), "\"id\"");
    }

    #[test]
    fn key_star_passthrough() {
        assert_eq!(parse_key(Dialect::MySql, "*", false).unwrap(), "*");
        assert_eq!(parse_key(Dialect::Dameng, "*", false).unwrap(), "*");
    }

    #[test]
    fn key_alias_recurses_both_sides() {
        assert_eq!(
            parse_key(Dialect::Dameng, "user_name as name", false).unwrap(),
            "\"user_name\" AS \"name\""
        );
        assert_eq!(
            parse_key(Dialect::Dameng, "count(1) AS total", false).unwrap(),
            "count(1) AS \"total\""
        );
    }

    #[test]
    fn key_table_prefix_is_split() {
        assert_eq!(
            parse_key(Dialect::Dameng, "a.role_id", false).unwrap(),
            "\"a\".\"role_id\""
        );
        assert_eq!(
            parse_key(Dialect::MySql, "t.id", false).unwrap(),
            "`t`.`id`"
        );
    }

    #[test]
    fn key_json_path() {
        assert_eq!(
            parse_key(Dialect::Dameng, "info->age", false).unwrap(),
            "\"info\".\"age\""
        );
    }

    #[test]
    fn key_expression_passthrough() {
        assert_eq!(
            parse_key(Dialect::Dameng, "count(1)", false).unwrap(),
            "count(1)"
        );
        assert_eq!(
            parse_key(Dialect::Dameng, "a, b", false).unwrap(),
            "a, b"
        );
    }

    #[test]
    fn key_strict_rejects_expression() {
        let err = parse_key(Dialect::Dameng, "count(1)", true).unwrap_err();
        assert_eq!(err.to_string(), "not support data:count(1)");
    }

    // ------------------------------------------------------------------
    // parse_value
    // ------------------------------------------------------------------

    #[test]
    fn value_doubles_single_quote() {
        assert_eq!(
            parse_value(&SqlValue::from("o'neil")),
            SqlValue::from("o''neil".to_string())
        );
    }

    #[test]
    fn value_null_becomes_empty() {
        assert_eq!(parse_value(&SqlValue::Null), SqlValue::from(String::new()));
    }

    // ------------------------------------------------------------------
    // parse_where：比较操作符
    // ------------------------------------------------------------------

    #[test]
    fn where_eq_mysql() {
        let (sql, params) = pw(Dialect::MySql, "id", "=", 1);
        assert_eq!(sql, " AND id = %s");
        assert_eq!(params, vec![SqlValue::I64(1)]);
    }

    #[test]
    fn where_eq_dameng_quotes_field() {
        let (sql, params) = pw(Dialect::Dameng, "id", "=", 1);
        assert_eq!(sql, " AND \"id\" = '%s'");
        assert_eq!(params, vec![SqlValue::I64(1)]);
    }

    #[test]
    fn where_symbol_aliases() {
        assert_eq!(pw(Dialect::MySql, "id", "neq", 1).0, " AND id <> %s");
        assert_eq!(pw(Dialect::MySql, "id", "EGT", 1).0, " AND id >= %s");
        assert_eq!(pw(Dialect::MySql, "id", " lt ", 1).0, " AND id < %s");
    }

    #[test]
    fn where_comparison_aliases_match_canonical_symbol() {
        // 每个别名与规范写法产出完全一致的 (片段, 参数)
        let groups: &[(&str, &[&str])] = &[
            ("=", &["eq", "EQ", " = "]),
            ("<>", &["neq", "!=", "NEQ", " <> "]),
            (">", &["gt", "GT"]),
            (">=", &["egt", "EGT"]),
            ("<", &["lt", " LT "]),
            ("<=", &["elt", "ELT"]),
        ];
        for dialect in [Dialect::MySql, Dialect::Dameng] {
            for (canonical, aliases) in groups {
                let expected = pw(dialect, "id", canonical, 1);
                for alias in *aliases {
                    assert_eq!(pw(dialect, "id", alias, 1), expected, "alias {alias:?}");
                }
            }
        }
    }

    #[test]
    fn where_word_symbols_case_insensitive() {
        for dialect in [Dialect::MySql, Dialect::Dameng] {
            assert_eq!(
                pw(dialect, "id", "IN", vec![1, 2]),
                pw(dialect, "id", "in", vec![1, 2])
            );
            assert_eq!(
                pw(dialect, "id", "Not In", vec![1, 2]),
                pw(dialect, "id", "not in", vec![1, 2])
            );
            assert_eq!(
                pw(dialect, "id", "BETWEEN", [1, 2]),
                pw(dialect, "id", "between", [1, 2])
            );
            assert_eq!(
                pw(dialect, "name", "LIKE", "a%"),
                pw(dialect, "name", "like", "a%")
            );
            assert_eq!(
                pw(dialect, "id", "IS NULL", WhereValue::None),
                pw(dialect, "id", "null", WhereValue::None)
            );
            assert_eq!(
                pw(dialect, "id", "Not Null", WhereValue::None),
                pw(dialect, "id", "is not null", WhereValue::None)
            );
        }
    }

    #[test]
    fn where_unknown_symbol_with_value_is_error() {
        let err = parse_where(Dialect::MySql, "id", "~~", WhereValue::from(1)).unwrap_err();
        assert_eq!(err.to_string(), "symbol is error");
    }

    #[test]
    fn where_shorthand_binds_symbol_as_value() {
        // 二参数简写：值被降级成文本后落在 symbol 位
        let (sql, params) = pw(Dialect::MySql, "id", "1", WhereValue::None);
        assert_eq!(sql, " AND id = %s");
        assert_eq!(params, vec![SqlValue::from("1".to_string())]);
    }

    #[test]
    fn where_missing_value_is_error() {
        let err = parse_where(Dialect::MySql, "id", "=", WhereValue::None).unwrap_err();
        assert_eq!(err.to_string(), "value could not be none");
    }

    // ------------------------------------------------------------------
    // in / not in
    // ------------------------------------------------------------------

    #[test]
    fn where_in_list() {
        let (sql, params) = pw(Dialect::MySql, "id", "in", vec![1, 2, 3]);
        assert_eq!(sql, " AND id in (%s,%s,%s)");
        assert_eq!(
            params,
            vec![SqlValue::I64(1), SqlValue::I64(2), SqlValue::I64(3)]
        );
    }

    #[test]
    fn where_in_csv_string_explodes() {
        let (sql, params) = pw(Dialect::MySql, "id", "not in", "1,2");
        assert_eq!(sql, " AND id not in (%s,%s)");
        assert_eq!(
            params,
            vec![
                SqlValue::from("1".to_string()),
                SqlValue::from("2".to_string())
            ]
        );
    }

    #[test]
    fn where_in_parenthesized_string_mysql_single_token() {
        let (sql, params) = pw(Dialect::MySql, "id", "in", "(1,2,3)");
        assert_eq!(sql, " AND id in %s");
        assert_eq!(params, vec![SqlValue::from("(1,2,3)")]);
    }

    #[test]
    fn where_in_padded_parenthesized_string_explodes() {
        // MySQL 只认首尾紧贴的括号串；带空白时按 CSV 原样切分
        let (sql, params) = pw(Dialect::MySql, "id", "in", " (1,2,3) ");
        assert_eq!(sql, " AND id in (%s,%s,%s)");
        assert_eq!(
            params,
            vec![
                SqlValue::from(" (1".to_string()),
                SqlValue::from("2".to_string()),
                SqlValue::from("3) ".to_string())
            ]
        );
        // 达梦先 trim 再剥括号
        let (sql, params) = pw(Dialect::Dameng, "id", "in", " (1,2,3) ");
        assert_eq!(sql, " AND \"id\" in ('%s','%s','%s')");
        assert_eq!(
            params,
            vec![
                SqlValue::from("1".to_string()),
                SqlValue::from("2".to_string()),
                SqlValue::from("3".to_string())
            ]
        );
    }

    #[test]
    fn where_in_parenthesized_string_dameng_explodes() {
        let (sql, params) = pw(Dialect::Dameng, "id", "in", "(1,2,3)");
        assert_eq!(sql, " AND \"id\" in ('%s','%s','%s')");
        assert_eq!(
            params,
            vec![
                SqlValue::from("1".to_string()),
                SqlValue::from("2".to_string()),
                SqlValue::from("3".to_string())
            ]
        );
    }

    #[test]
    fn where_in_dameng_requires_list() {
        let err = parse_where(Dialect::Dameng, "id", "in", WhereValue::from(1)).unwrap_err();
        assert_eq!(err.to_string(), "in optional value must be a list or tuple");
    }

    // ------------------------------------------------------------------
    // between / not between
    // ------------------------------------------------------------------

    #[test]
    fn where_between_mysql_binds_joined_pair() {
        let (sql, params) = pw(Dialect::MySql, "id", "between", [1, 100]);
        assert_eq!(sql, " AND id between %s");
        assert_eq!(params, vec![SqlValue::from("1 AND 100".to_string())]);
    }

    #[test]
    fn where_between_mysql_accepts_and_string() {
        let (sql, params) = pw(Dialect::MySql, "id", "between", "1 AND 100");
        assert_eq!(sql, " AND id between %s");
        assert_eq!(params, vec![SqlValue::from("1 AND 100")]);
    }

    #[test]
    fn where_between_mysql_arity_error() {
        let err = parse_where(Dialect::MySql, "id", "between", WhereValue::from(vec![1]))
            .unwrap_err();
        assert_eq!(err.to_string(), "`between` optional `value` must 2 arguments");
    }

    #[test]
    fn where_between_dameng_inlines_literals() {
        let (sql, params) = pw(Dialect::Dameng, "id", "between", [1, 100]);
        assert_eq!(sql, " AND \"id\" between '1' AND '100'");
        assert_eq!(params, Vec::<SqlValue>::new());
    }

    #[test]
    fn where_between_dameng_csv_string() {
        let (sql, _) = pw(Dialect::Dameng, "id", "not between", "1,100");
        assert_eq!(sql, " AND \"id\" not between '1' AND '100'");
    }

    #[test]
    fn where_between_dameng_arity_error() {
        let err = parse_where(
            Dialect::Dameng,
            "id",
            "between",
            WhereValue::from(vec![1, 2, 3]),
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "between optional value must 2 arguments");
    }

    // ------------------------------------------------------------------
    // like
    // ------------------------------------------------------------------

    #[test]
    fn where_like() {
        let (sql, params) = pw(Dialect::MySql, "name", "like", "a%");
        assert_eq!(sql, " AND name like %s");
        assert_eq!(params, vec![SqlValue::from("a%")]);
    }

    #[test]
    fn where_like_requires_wildcard() {
        let err = parse_where(Dialect::MySql, "name", "like", WhereValue::from("abc"))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "`like` optional `value` should contain `%` or `_`"
        );
        let err = parse_where(Dialect::Dameng, "name", "like", WhereValue::from("abc"))
            .unwrap_err();
        assert_eq!(err.to_string(), "like optional value should contain % or _");
    }

    #[test]
    fn where_like_requires_string() {
        let err = parse_where(Dialect::MySql, "name", "like", WhereValue::from(1)).unwrap_err();
        assert_eq!(err.to_string(), "`like` optional `value` must be a string");
    }

    // ------------------------------------------------------------------
    // null / exists / exp / 原生片段
    // ------------------------------------------------------------------

    #[test]
    fn where_null_variants() {
        assert_eq!(
            pw(Dialect::MySql, "id", "null", WhereValue::None).0,
            " AND id is null"
        );
        assert_eq!(
            pw(Dialect::MySql, "id", "IS NOT NULL", WhereValue::None).0,
            " AND id is not null"
        );
        assert_eq!(
            pw(Dialect::Dameng, "id", "null", WhereValue::None).0,
            " AND \"id\" is null"
        );
    }

    #[test]
    fn where_exists_wraps_field() {
        let (sql, params) = pw(
            Dialect::MySql,
            "select 1 from t2",
            "exists",
            WhereValue::None,
        );
        assert_eq!(sql, " AND exists(select 1 from t2)");
        assert_eq!(params, Vec::<SqlValue>::new());
    }

    #[test]
    fn where_exp_appends_expression() {
        assert_eq!(
            pw(Dialect::MySql, "id", "exp", ">= 1").0,
            " AND id >= 1"
        );
        assert_eq!(
            pw(Dialect::Dameng, "id", "exp", ">= 1").0,
            " AND \"id\" >= 1"
        );
    }

    #[test]
    fn where_exp_requires_string() {
        let err = parse_where(Dialect::MySql, "id", "exp", WhereValue::from(1)).unwrap_err();
        assert_eq!(err.to_string(), "`exp` optional `value` should be a string");
    }

    #[test]
    fn where_raw_fragment_passthrough() {
        let (sql, params) = pw(Dialect::Dameng, "id = 1 or id = 2", "", WhereValue::None);
        assert_eq!(sql, " AND id = 1 or id = 2");
        assert_eq!(params, Vec::<SqlValue>::new());
    }

    #[test]
    fn where_dameng_string_value_doubles_quotes() {
        let (_, params) = pw(Dialect::Dameng, "name", "=", "o'neil");
        assert_eq!(params, vec![SqlValue::from("o''neil".to_string())]);
    }
}
