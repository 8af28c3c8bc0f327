//! MySQL SQL dialect implementation

use serde_json::Value;

use super::SqlDialect;
use super::dialect::json_path_literal;
use crate::backend::fragment::{Fragment, QueryParam};
use crate::filter::processor::Case;
use crate::types::DatePart;

/// MySQL SQL dialect
pub struct MysqlDialect;

impl SqlDialect for MysqlDialect {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn json_extract(&self, column: &str, path: &[&str]) -> String {
        format!(
            "JSON_UNQUOTE(JSON_EXTRACT({}, {}))",
            column,
            json_path_literal(path)
        )
    }

    fn json_timestamp(&self, expr: &str) -> String {
        format!("CAST({} AS DATETIME(6))", expr)
    }

    fn date_part(&self, part: DatePart, expr: &str) -> Option<String> {
        let sql = match part {
            DatePart::Date => format!("DATE({})", expr),
            DatePart::Year => format!("YEAR({})", expr),
            DatePart::IsoYear => format!("(YEARWEEK({}, 3) DIV 100)", expr),
            DatePart::Quarter => format!("QUARTER({})", expr),
            DatePart::Month => format!("MONTH({})", expr),
            DatePart::Week => format!("WEEK({}, 3)", expr),
            DatePart::WeekDay => format!("(DAYOFWEEK({}) - 1)", expr),
            DatePart::IsoWeekDay => format!("(WEEKDAY({}) + 1)", expr),
            DatePart::Day => format!("DAY({})", expr),
            DatePart::Time => format!("TIME({})", expr),
            DatePart::Hour => format!("HOUR({})", expr),
            DatePart::Minute => format!("MINUTE({})", expr),
            DatePart::Second => format!("SECOND({})", expr),
            DatePart::Microsecond => format!("MICROSECOND({})", expr),
            DatePart::Unspecified => return None,
        };
        Some(sql)
    }

    fn like_escape(&self) -> &'static str {
        ""
    }

    fn regex_match(&self, expr: &str, pattern: &str, case: Case) -> Option<Fragment> {
        let match_type = if case.is_insensitive() { "i" } else { "c" };
        Some(
            Fragment::text(format!("REGEXP_LIKE({}, ", expr))
                .param(QueryParam::text(pattern))
                .push(&format!(", '{}')", match_type)),
        )
    }

    fn full_text_search(&self, expr: &str, value: &str) -> Option<Fragment> {
        Some(
            Fragment::text(format!("MATCH({}) AGAINST(", expr))
                .param(QueryParam::text(value))
                .push(" IN NATURAL LANGUAGE MODE)"),
        )
    }

    fn json_contains(&self, column: &str, document: &Value) -> Option<Fragment> {
        Some(
            Fragment::text(format!("JSON_CONTAINS({}, ", column))
                .param(QueryParam::text(document.to_string()))
                .push(")"),
        )
    }

    fn array_contains(&self, array_col: &str, value: QueryParam) -> Option<Fragment> {
        let element = QueryParam::text(value.to_json().to_string());
        Some(
            Fragment::text(format!("JSON_CONTAINS({}, ", array_col))
                .param(element)
                .push(")"),
        )
    }

    fn limit_offset(&self, limit: Option<u64>, offset: Option<u64>) -> String {
        match (limit, offset) {
            (Some(l), Some(o)) if o > 0 => format!("LIMIT {} OFFSET {}", l, o),
            (Some(l), _) => format!("LIMIT {}", l),
            (None, Some(o)) if o > 0 => format!("LIMIT {} OFFSET {}", u64::MAX, o),
            (None, _) => String::new(),
        }
    }
}
