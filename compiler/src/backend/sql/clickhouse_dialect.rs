//! ClickHouse SQL dialect implementation

use super::SqlDialect;
use crate::backend::fragment::{Fragment, QueryParam};
use crate::filter::processor::Case;
use crate::types::DatePart;
use crate::utils::string::with_inline_case_flag;

/// ClickHouse SQL dialect
pub struct ClickhouseDialect;

impl SqlDialect for ClickhouseDialect {
    fn name(&self) -> &'static str {
        "clickhouse"
    }

    fn json_extract(&self, column: &str, path: &[&str]) -> String {
        let keys: Vec<String> = path.iter().map(|k| format!("'{}'", k)).collect();
        format!("JSONExtractString({}, {})", column, keys.join(", "))
    }

    fn json_timestamp(&self, expr: &str) -> String {
        format!("parseDateTime64BestEffort({}, 6)", expr)
    }

    fn date_part(&self, part: DatePart, expr: &str) -> Option<String> {
        let sql = match part {
            DatePart::Date => format!("toDate({})", expr),
            DatePart::Year => format!("toYear({})", expr),
            DatePart::IsoYear => format!("toISOYear({})", expr),
            DatePart::Quarter => format!("toQuarter({})", expr),
            DatePart::Month => format!("toMonth({})", expr),
            DatePart::Week => format!("toISOWeek({})", expr),
            DatePart::WeekDay => format!("(toDayOfWeek({}) % 7)", expr),
            DatePart::IsoWeekDay => format!("toDayOfWeek({})", expr),
            DatePart::Day => format!("toDayOfMonth({})", expr),
            DatePart::Time => format!("formatDateTime({}, '%H:%i:%S')", expr),
            DatePart::Hour => format!("toHour({})", expr),
            DatePart::Minute => format!("toMinute({})", expr),
            DatePart::Second => format!("toSecond({})", expr),
            DatePart::Microsecond => format!("(toUnixTimestamp64Micro({}) % 1000000)", expr),
            DatePart::Unspecified => return None,
        };
        Some(sql)
    }

    fn supports_ilike(&self) -> bool {
        true
    }

    fn like_escape(&self) -> &'static str {
        ""
    }

    fn regex_match(&self, expr: &str, pattern: &str, case: Case) -> Option<Fragment> {
        let pattern = if case.is_insensitive() {
            with_inline_case_flag(pattern)
        } else {
            pattern.to_string()
        };
        Some(
            Fragment::text(format!("match({}, ", expr))
                .param(QueryParam::Text(pattern))
                .push(")"),
        )
    }

    fn full_text_search(&self, expr: &str, value: &str) -> Option<Fragment> {
        Some(
            Fragment::text(format!("hasToken({}, ", expr))
                .param(QueryParam::text(value))
                .push(")"),
        )
    }

    fn array_contains(&self, array_col: &str, value: QueryParam) -> Option<Fragment> {
        Some(
            Fragment::text(format!("has({}, ", array_col))
                .param(value)
                .push(")"),
        )
    }
}
