//! DuckDB SQL dialect implementation

use serde_json::Value;

use super::SqlDialect;
use super::dialect::json_path_literal;
use crate::backend::fragment::{Fragment, QueryParam};
use crate::filter::processor::Case;
use crate::types::DatePart;

/// DuckDB SQL dialect
pub struct DuckdbDialect;

impl SqlDialect for DuckdbDialect {
    fn name(&self) -> &'static str {
        "duckdb"
    }

    fn json_extract(&self, column: &str, path: &[&str]) -> String {
        format!("json_extract_string({}, {})", column, json_path_literal(path))
    }

    fn date_part(&self, part: DatePart, expr: &str) -> Option<String> {
        let func = match part {
            DatePart::Date => return Some(format!("CAST({} AS DATE)", expr)),
            DatePart::Time => return Some(format!("CAST({} AS TIME)", expr)),
            DatePart::Year => "year",
            DatePart::IsoYear => "isoyear",
            DatePart::Quarter => "quarter",
            DatePart::Month => "month",
            DatePart::Week => "week",
            DatePart::WeekDay => "dayofweek",
            DatePart::IsoWeekDay => "isodow",
            DatePart::Day => "day",
            DatePart::Hour => "hour",
            DatePart::Minute => "minute",
            DatePart::Second => "second",
            DatePart::Microsecond => "microsecond",
            DatePart::Unspecified => return None,
        };
        Some(format!("{}({})", func, expr))
    }

    fn supports_ilike(&self) -> bool {
        true
    }

    fn regex_match(&self, expr: &str, pattern: &str, case: Case) -> Option<Fragment> {
        let fragment =
            Fragment::text(format!("regexp_matches({}, ", expr)).param(QueryParam::text(pattern));
        Some(if case.is_insensitive() {
            fragment.push(", 'i')")
        } else {
            fragment.push(")")
        })
    }

    fn json_contains(&self, column: &str, document: &Value) -> Option<Fragment> {
        Some(
            Fragment::text(format!("json_contains({}, ", column))
                .param(QueryParam::text(document.to_string()))
                .push(")"),
        )
    }

    fn array_contains(&self, array_col: &str, value: QueryParam) -> Option<Fragment> {
        Some(
            Fragment::text(format!("array_contains({}, ", array_col))
                .param(value)
                .push(")"),
        )
    }
}
