//! SQLite SQL dialect implementation

use super::SqlDialect;
use super::dialect::json_path_literal;
use crate::backend::fragment::{Fragment, QueryParam};
use crate::filter::processor::Case;
use crate::types::DatePart;
use crate::utils::string::with_inline_case_flag;

/// SQLite SQL dialect
///
/// REGEXP requires the application to register a `regexp` function on the
/// connection.
pub struct SqliteDialect;

fn strftime_int(format: &str, expr: &str) -> String {
    format!("CAST(strftime('{}', {}) AS INTEGER)", format, expr)
}

impl SqlDialect for SqliteDialect {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn json_extract(&self, column: &str, path: &[&str]) -> String {
        format!("json_extract({}, {})", column, json_path_literal(path))
    }

    fn json_timestamp(&self, expr: &str) -> String {
        expr.to_string()
    }

    fn date_part(&self, part: DatePart, expr: &str) -> Option<String> {
        let sql = match part {
            DatePart::Date => format!("date({})", expr),
            DatePart::Time => format!("time({})", expr),
            DatePart::Year => strftime_int("%Y", expr),
            DatePart::Quarter => format!("(({} + 2) / 3)", strftime_int("%m", expr)),
            DatePart::Month => strftime_int("%m", expr),
            DatePart::Week => strftime_int("%W", expr),
            DatePart::WeekDay => strftime_int("%w", expr),
            DatePart::IsoWeekDay => format!("(({} + 6) % 7 + 1)", strftime_int("%w", expr)),
            DatePart::Day => strftime_int("%d", expr),
            DatePart::Hour => strftime_int("%H", expr),
            DatePart::Minute => strftime_int("%M", expr),
            DatePart::Second => strftime_int("%S", expr),
            DatePart::Microsecond => format!(
                "(CAST(strftime('%f', {}) * 1000000 AS INTEGER) % 1000000)",
                expr
            ),
            DatePart::IsoYear | DatePart::Unspecified => return None,
        };
        Some(sql)
    }

    fn regex_match(&self, expr: &str, pattern: &str, case: Case) -> Option<Fragment> {
        let pattern = if case.is_insensitive() {
            with_inline_case_flag(pattern)
        } else {
            pattern.to_string()
        };
        Some(Fragment::text(format!("{} REGEXP ", expr)).param(QueryParam::Text(pattern)))
    }

    fn array_contains(&self, array_col: &str, value: QueryParam) -> Option<Fragment> {
        Some(
            Fragment::text(format!(
                "EXISTS (SELECT 1 FROM json_each({}) WHERE json_each.value = ",
                array_col
            ))
            .param(value)
            .push(")"),
        )
    }

    fn limit_offset(&self, limit: Option<u64>, offset: Option<u64>) -> String {
        match (limit, offset) {
            (Some(l), Some(o)) if o > 0 => format!("LIMIT {} OFFSET {}", l, o),
            (Some(l), _) => format!("LIMIT {}", l),
            (None, Some(o)) if o > 0 => format!("LIMIT -1 OFFSET {}", o),
            (None, _) => String::new(),
        }
    }
}
