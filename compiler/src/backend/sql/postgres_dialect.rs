//! PostgreSQL SQL dialect implementation

use serde_json::Value;

use super::SqlDialect;
use super::dialect::extract_keyword;
use crate::backend::fragment::{Fragment, QueryParam};
use crate::filter::processor::Case;
use crate::types::DatePart;

/// PostgreSQL SQL dialect
pub struct PostgresDialect;

impl SqlDialect for PostgresDialect {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn placeholder(&self, index: usize) -> String {
        format!("${}", index)
    }

    fn json_extract(&self, column: &str, path: &[&str]) -> String {
        match path {
            [key] => format!("{} ->> '{}'", column, key),
            _ => format!("{} #>> '{{{}}}'", column, path.join(",")),
        }
    }

    fn date_part(&self, part: DatePart, expr: &str) -> Option<String> {
        match part {
            DatePart::Date => Some(format!("({})::date", expr)),
            DatePart::Time => Some(format!("({})::time", expr)),
            _ => extract_keyword(part).map(|kw| format!("EXTRACT({} FROM {})", kw, expr)),
        }
    }

    fn json_timestamp(&self, expr: &str) -> String {
        format!("({})::timestamp", expr)
    }

    fn supports_ilike(&self) -> bool {
        true
    }

    fn regex_match(&self, expr: &str, pattern: &str, case: Case) -> Option<Fragment> {
        let op = if case.is_insensitive() { "~*" } else { "~" };
        Some(Fragment::text(format!("{} {} ", expr, op)).param(QueryParam::text(pattern)))
    }

    fn full_text_search(&self, expr: &str, value: &str) -> Option<Fragment> {
        Some(
            Fragment::text(format!("to_tsvector({}) @@ plainto_tsquery(", expr))
                .param(QueryParam::text(value))
                .push(")"),
        )
    }

    fn json_contains(&self, column: &str, document: &Value) -> Option<Fragment> {
        Some(
            Fragment::text(format!("{} @> ", column))
                .param(QueryParam::text(document.to_string()))
                .push("::jsonb"),
        )
    }

    fn array_contains(&self, array_col: &str, value: QueryParam) -> Option<Fragment> {
        Some(
            Fragment::default()
                .param(value)
                .push(&format!(" = ANY({})", array_col)),
        )
    }
}
