//! SQL condition processor
//!
//! Field names are interpolated only after validation; every value is a
//! bound parameter.

use serde_json::Value;

use super::{Dialect, SqlDialect, SqlQuery};
use crate::backend::fragment::{Fragment, QueryParam};
use crate::filter::field::FieldRef;
use crate::filter::processor::{Case, Comparison, Processor};
use crate::utils::sql::escape_like_pattern;
use crate::utils::string::infer_scalar;

/// Compiles conditions into SQL fragments for one dialect
#[derive(Debug, Clone, Copy)]
pub struct SqlProcessor {
    dialect: Dialect,
}

impl SqlProcessor {
    pub fn new(dialect: Dialect) -> Self {
        Self { dialect }
    }

    fn sql(&self) -> &'static dyn SqlDialect {
        self.dialect.dialect()
    }

    /// SQL expression for a field reference
    fn expr(&self, field: &FieldRef) -> Option<String> {
        match field {
            FieldRef::Plain(column) => Some(column.clone()),
            FieldRef::JsonPath { container, .. } => {
                Some(self.sql().json_extract(container, &field.key_segments()))
            }
            FieldRef::DatePart { part, field } => {
                let inner = self.expr(field)?;
                let inner = match field.as_ref() {
                    FieldRef::JsonPath { .. } => self.sql().json_timestamp(&inner),
                    _ => inner,
                };
                self.sql().date_part(*part, &inner)
            }
        }
    }

    /// Bind a scalar; numeric date parts compare against numbers
    fn scalar(&self, field: &FieldRef, value: &str) -> QueryParam {
        match field {
            FieldRef::DatePart { part, .. } if part.is_numeric() => {
                QueryParam::from_json(&infer_scalar(value))
            }
            _ => QueryParam::text(value),
        }
    }

    fn binary(&self, field: &FieldRef, op: &str, value: &str) -> Option<Fragment> {
        let expr = self.expr(field)?;
        Some(Fragment::text(format!("{} {} ", expr, op)).param(self.scalar(field, value)))
    }

    fn set(&self, field: &FieldRef, keyword: &str, values: &[Value]) -> Option<Fragment> {
        let expr = self.expr(field)?;
        Some(
            Fragment::text(format!("{} {} (", expr, keyword))
                .param_list(values.iter().map(QueryParam::from_json), ", ")
                .push(")"),
        )
    }

    /// LIKE against a pattern built from escaped input
    fn pattern(&self, field: &FieldRef, pattern: String, case: Case) -> Option<Fragment> {
        let expr = self.expr(field)?;
        let escape = self.sql().like_escape();
        let fragment = if !case.is_insensitive() {
            Fragment::text(format!("{} LIKE ", expr)).param(QueryParam::Text(pattern))
        } else if self.sql().supports_ilike() {
            Fragment::text(format!("{} ILIKE ", expr)).param(QueryParam::Text(pattern))
        } else {
            Fragment::text(format!("LOWER({}) LIKE LOWER(", expr))
                .param(QueryParam::Text(pattern))
                .push(")")
        };
        Some(fragment.push(escape))
    }

    fn plain_column<'a>(&self, field: &'a FieldRef) -> Option<&'a str> {
        match field {
            FieldRef::Plain(column) => Some(column),
            _ => None,
        }
    }
}

impl Processor for SqlProcessor {
    type Fragment = Fragment;
    type Builder = SqlQuery;

    fn name(&self) -> &'static str {
        self.sql().name()
    }

    fn equal(&self, field: &FieldRef, value: &str) -> Option<Fragment> {
        self.binary(field, "=", value)
    }

    fn not_equal(&self, field: &FieldRef, value: &str) -> Option<Fragment> {
        self.binary(field, "<>", value)
    }

    fn compare(&self, field: &FieldRef, cmp: Comparison, value: &str) -> Option<Fragment> {
        self.binary(field, cmp.symbol(), value)
    }

    fn in_set(&self, field: &FieldRef, values: &[Value]) -> Option<Fragment> {
        self.set(field, "IN", values)
    }

    fn not_in_set(&self, field: &FieldRef, values: &[Value]) -> Option<Fragment> {
        self.set(field, "NOT IN", values)
    }

    fn range(&self, field: &FieldRef, low: &Value, high: &Value) -> Option<Fragment> {
        let expr = self.expr(field)?;
        Some(
            Fragment::text(format!("({} >= ", expr))
                .param(QueryParam::from_json(low))
                .push(&format!(" AND {} <= ", expr))
                .param(QueryParam::from_json(high))
                .push(")"),
        )
    }

    fn is_null(&self, field: &FieldRef) -> Option<Fragment> {
        Some(Fragment::text(format!("{} IS NULL", self.expr(field)?)))
    }

    fn is_not_null(&self, field: &FieldRef) -> Option<Fragment> {
        Some(Fragment::text(format!("{} IS NOT NULL", self.expr(field)?)))
    }

    fn like(&self, field: &FieldRef, pattern: &str, case: Case, negate: bool) -> Option<Fragment> {
        let expr = self.expr(field)?;
        let not = if negate { "NOT " } else { "" };
        let fragment = if !case.is_insensitive() {
            Fragment::text(format!("{} {}LIKE ", expr, not)).param(QueryParam::text(pattern))
        } else if self.sql().supports_ilike() {
            Fragment::text(format!("{} {}ILIKE ", expr, not)).param(QueryParam::text(pattern))
        } else {
            Fragment::text(format!("LOWER({}) {}LIKE LOWER(", expr, not))
                .param(QueryParam::text(pattern))
                .push(")")
        };
        Some(fragment)
    }

    fn contains(&self, field: &FieldRef, value: &str, case: Case) -> Option<Fragment> {
        self.pattern(field, format!("%{}%", escape_like_pattern(value)), case)
    }

    fn starts_with(&self, field: &FieldRef, value: &str, case: Case) -> Option<Fragment> {
        self.pattern(field, format!("{}%", escape_like_pattern(value)), case)
    }

    fn ends_with(&self, field: &FieldRef, value: &str, case: Case) -> Option<Fragment> {
        self.pattern(field, format!("%{}", escape_like_pattern(value)), case)
    }

    fn exact(&self, field: &FieldRef, value: &str, case: Case) -> Option<Fragment> {
        if !case.is_insensitive() {
            return self.equal(field, value);
        }
        let expr = self.expr(field)?;
        Some(
            Fragment::text(format!("LOWER({}) = LOWER(", expr))
                .param(QueryParam::text(value))
                .push(")"),
        )
    }

    fn regex(&self, field: &FieldRef, pattern: &str, case: Case) -> Option<Fragment> {
        let expr = self.expr(field)?;
        self.sql().regex_match(&expr, pattern, case)
    }

    fn search(&self, field: &FieldRef, value: &str) -> Option<Fragment> {
        let expr = self.expr(field)?;
        self.sql()
            .full_text_search(&expr, value)
            .or_else(|| self.contains(field, value, Case::Sensitive))
    }

    fn json_contains(&self, field: &FieldRef, document: &Value) -> Option<Fragment> {
        let column = self.plain_column(field)?;
        self.sql().json_contains(column, document)
    }

    fn array_contains(&self, field: &FieldRef, value: &str) -> Option<Fragment> {
        let column = self.plain_column(field)?;
        self.sql()
            .array_contains(column, QueryParam::from_json(&infer_scalar(value)))
    }

    fn exists(&self, field: &FieldRef) -> Option<Fragment> {
        match field {
            FieldRef::DatePart { .. } => None,
            _ => self.is_not_null(field),
        }
    }

    fn and(&self, parts: Vec<Fragment>) -> Option<Fragment> {
        Fragment::and(parts)
    }

    fn or(&self, parts: Vec<Fragment>) -> Option<Fragment> {
        Fragment::or(parts)
    }

    fn not(&self, part: Fragment) -> Option<Fragment> {
        Some(Fragment::negate(part))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Operator;

    fn pg() -> SqlProcessor {
        SqlProcessor::new(Dialect::Postgres)
    }

    fn render(p: &SqlProcessor, f: &Fragment) -> (String, Vec<QueryParam>) {
        let dialect = p.sql();
        f.render(&|i| dialect.placeholder(i))
    }

    fn compile(p: &SqlProcessor, op: Operator, field: &str, value: &str) -> Option<String> {
        p.condition(op, field, value, &[]).map(|f| render(p, &f).0)
    }

    #[test]
    fn test_scalar_operators() {
        let p = pg();
        assert_eq!(compile(&p, Operator::Eq, "name", "alice").unwrap(), "name = $1");
        assert_eq!(compile(&p, Operator::Neq, "name", "a").unwrap(), "name <> $1");
        assert_eq!(compile(&p, Operator::Gte, "age", "18").unwrap(), "age >= $1");
        assert_eq!(compile(&p, Operator::Lt, "age", "65").unwrap(), "age < $1");
    }

    #[test]
    fn test_blank_scalar_is_noop() {
        let p = pg();
        assert!(compile(&p, Operator::Eq, "name", "").is_none());
        assert!(compile(&p, Operator::Contains, "name", "   ").is_none());
    }

    #[test]
    fn test_in_and_not_in() {
        let p = pg();
        let f = p
            .condition(Operator::In, "role", "", &["a".into(), "b".into()])
            .unwrap();
        let (sql, params) = render(&p, &f);
        assert_eq!(sql, "role IN ($1, $2)");
        assert_eq!(params, vec![QueryParam::text("a"), QueryParam::text("b")]);

        let f = p.condition(Operator::Nin, "id", "[1, 2, 3]", &[]).unwrap();
        let (sql, params) = render(&p, &f);
        assert_eq!(sql, "id NOT IN ($1, $2, $3)");
        assert_eq!(params[0], QueryParam::Int(1));
    }

    #[test]
    fn test_in_malformed_is_noop() {
        let p = pg();
        assert!(p.condition(Operator::In, "x", "not-json", &[]).is_none());
        assert!(p.condition(Operator::In, "x", "[]", &[]).is_none());
    }

    #[test]
    fn test_between_inclusive() {
        let p = pg();
        let f = p
            .condition(
                Operator::Between,
                "created_at",
                "",
                &["2020-01-01".into(), "2021-01-01".into()],
            )
            .unwrap();
        let (sql, params) = render(&p, &f);
        assert_eq!(sql, "(created_at >= $1 AND created_at <= $2)");
        assert_eq!(params.len(), 2);
        assert!(
            p.condition(Operator::Between, "x", "[1, 2, 3]", &[])
                .is_none()
        );
        assert!(p.condition(Operator::Between, "x", "", &["1".into()]).is_none());
    }

    #[test]
    fn test_null_checks_ignore_value() {
        let p = pg();
        assert_eq!(
            compile(&p, Operator::IsNull, "deleted_at", "").unwrap(),
            "deleted_at IS NULL"
        );
        assert_eq!(
            compile(&p, Operator::IsNotNull, "deleted_at", "x").unwrap(),
            "deleted_at IS NOT NULL"
        );
    }

    #[test]
    fn test_contains_escapes_and_binds() {
        let p = pg();
        let f = p.condition(Operator::Contains, "name", "50%_off", &[]).unwrap();
        let (sql, params) = render(&p, &f);
        assert_eq!(sql, "name LIKE $1 ESCAPE '\\'");
        assert_eq!(params, vec![QueryParam::text("%50\\%\\_off%")]);
    }

    #[test]
    fn test_case_insensitive_native_vs_lower() {
        let f = pg().condition(Operator::Icontains, "name", "al", &[]).unwrap();
        assert_eq!(render(&pg(), &f).0, "name ILIKE $1 ESCAPE '\\'");

        let mysql = SqlProcessor::new(Dialect::Mysql);
        let f = mysql.condition(Operator::IstartsWith, "name", "al", &[]).unwrap();
        let (sql, params) = render(&mysql, &f);
        assert_eq!(sql, "LOWER(name) LIKE LOWER(?)");
        assert_eq!(params, vec![QueryParam::text("al%")]);

        let f = mysql.condition(Operator::Iexact, "name", "Al", &[]).unwrap();
        assert_eq!(render(&mysql, &f).0, "LOWER(name) = LOWER(?)");
    }

    #[test]
    fn test_like_family() {
        let p = pg();
        assert_eq!(compile(&p, Operator::Like, "n", "a%").unwrap(), "n LIKE $1");
        assert_eq!(compile(&p, Operator::Ilike, "n", "a%").unwrap(), "n ILIKE $1");
        assert_eq!(
            compile(&p, Operator::NotLike, "n", "a%").unwrap(),
            "n NOT LIKE $1"
        );
        let sqlite = SqlProcessor::new(Dialect::Sqlite);
        assert_eq!(
            compile(&sqlite, Operator::Ilike, "n", "a%").unwrap(),
            "LOWER(n) LIKE LOWER(?)"
        );
    }

    #[test]
    fn test_regex_and_search() {
        let p = pg();
        assert_eq!(compile(&p, Operator::Regexp, "n", "^a").unwrap(), "n ~ $1");
        assert_eq!(compile(&p, Operator::Iregexp, "n", "^a").unwrap(), "n ~* $1");
        assert_eq!(
            compile(&p, Operator::Search, "body", "rust").unwrap(),
            "to_tsvector(body) @@ plainto_tsquery($1)"
        );
        let sqlite = SqlProcessor::new(Dialect::Sqlite);
        assert_eq!(
            compile(&sqlite, Operator::Search, "body", "rust").unwrap(),
            "body LIKE ? ESCAPE '\\'"
        );
    }

    #[test]
    fn test_json_path_field() {
        let p = pg();
        let f = p
            .condition(Operator::Eq, "preferences.daily_email", "true", &[])
            .unwrap();
        let (sql, params) = render(&p, &f);
        assert_eq!(sql, "preferences ->> 'daily_email' = $1");
        assert_eq!(params, vec![QueryParam::text("true")]);
    }

    #[test]
    fn test_json_key_injection_dropped() {
        let p = pg();
        assert!(p.condition(Operator::Eq, "prefs.a;b", "x", &[]).is_none());
        assert!(p.condition(Operator::Eq, "prefs.a'b", "x", &[]).is_none());
        assert!(p.condition(Operator::Eq, "name OR 1=1", "x", &[]).is_none());
    }

    #[test]
    fn test_date_part_comparison_binds_number() {
        let p = pg();
        let field = FieldRef::parse("created_at")
            .unwrap()
            .with_date_part(crate::types::DatePart::Year)
            .unwrap();
        let f = p.compare(&field, Comparison::Gt, "2020").unwrap();
        let (sql, params) = render(&p, &f);
        assert_eq!(sql, "EXTRACT(YEAR FROM created_at) > $1");
        assert_eq!(params, vec![QueryParam::Int(2020)]);
    }

    #[test]
    fn test_date_part_on_json_key_casts_text() {
        let field = FieldRef::parse("meta.seen_at")
            .unwrap()
            .with_date_part(crate::types::DatePart::Year)
            .unwrap();
        let cases = [
            (Dialect::Postgres, "EXTRACT(YEAR FROM (meta ->> 'seen_at')::timestamp) = $1"),
            (
                Dialect::Mysql,
                "YEAR(CAST(JSON_UNQUOTE(JSON_EXTRACT(meta, '$.seen_at')) AS DATETIME(6))) = ?",
            ),
            (
                Dialect::Sqlite,
                "CAST(strftime('%Y', json_extract(meta, '$.seen_at')) AS INTEGER) = ?",
            ),
            (
                Dialect::Duckdb,
                "year(CAST(json_extract_string(meta, '$.seen_at') AS TIMESTAMP)) = ?",
            ),
            (
                Dialect::Clickhouse,
                "toYear(parseDateTime64BestEffort(JSONExtractString(meta, 'seen_at'), 6)) = ?",
            ),
        ];
        for (dialect, expected) in cases {
            let p = SqlProcessor::new(dialect);
            let (sql, params) = render(&p, &p.equal(&field, "2024").unwrap());
            assert_eq!(sql, expected, "{:?}", dialect);
            assert_eq!(params, vec![QueryParam::Int(2024)]);
        }
    }

    #[test]
    fn test_json_and_array_containment() {
        let p = pg();
        let f = p
            .condition(Operator::JsonContains, "attrs", r#"{"a": 1}"#, &[])
            .unwrap();
        assert_eq!(render(&p, &f).0, "attrs @> $1::jsonb");
        assert!(
            p.condition(Operator::JsonContains, "attrs", "{bad", &[])
                .is_none()
        );
        let f = p.condition(Operator::ArrayContains, "tags", "7", &[]).unwrap();
        let (sql, params) = render(&p, &f);
        assert_eq!(sql, "$1 = ANY(tags)");
        assert_eq!(params, vec![QueryParam::Int(7)]);
        let sqlite = SqlProcessor::new(Dialect::Sqlite);
        assert!(
            sqlite
                .condition(Operator::JsonContains, "attrs", "{}", &[])
                .is_none()
        );
    }

    #[test]
    fn test_exists_on_json_key() {
        let p = SqlProcessor::new(Dialect::Mysql);
        assert_eq!(
            compile(&p, Operator::Exists, "meta.source", "").unwrap(),
            "JSON_UNQUOTE(JSON_EXTRACT(meta, '$.source')) IS NOT NULL"
        );
    }

    #[test]
    fn test_unspecified_is_noop() {
        assert!(compile(&pg(), Operator::Unspecified, "name", "x").is_none());
    }

    #[test]
    fn test_process_and_date_part_on_builder() {
        let p = pg();
        let mut q = SqlQuery::new(Dialect::Postgres, "users");
        p.process(&mut q, Operator::Eq, "name", "alice", &[]);
        p.process(&mut q, Operator::In, "x", "not-json", &[]);
        p.date_part(&mut q, "year", "created_at");
        p.date_part(&mut q, "fortnight", "created_at");
        assert_eq!(
            q.where_clause().0,
            "name = $1 AND EXTRACT(YEAR FROM created_at) IS NOT NULL"
        );
    }
}
