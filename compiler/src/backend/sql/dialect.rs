//! SQL dialect trait for multi-database support
//!
//! This trait defines the interface for generating database-specific SQL
//! syntax. Every method receives identifiers that were already validated;
//! user values only ever travel as bound parameters.

use serde_json::Value;

use crate::backend::fragment::{Fragment, QueryParam};
use crate::filter::processor::Case;
use crate::types::DatePart;

/// SQL dialect trait for generating database-specific SQL
///
/// Different databases have different syntax for:
/// - Parameter placeholders (? vs $1)
/// - JSON sub-key extraction
/// - Date part extraction
/// - Case-insensitive and regular-expression matching
/// - Array and JSON containment
pub trait SqlDialect: Send + Sync {
    /// Get the dialect name
    fn name(&self) -> &'static str;

    /// Generate a parameter placeholder for the given index (1-based)
    ///
    /// - PostgreSQL: Returns "$1", "$2", etc.
    /// - Everything else: Always returns "?"
    fn placeholder(&self, _index: usize) -> String {
        "?".to_string()
    }

    /// Extract a JSON sub-key as text
    ///
    /// - PostgreSQL: `col ->> 'key'`, `col #>> '{a,b}'`
    /// - MySQL: `JSON_UNQUOTE(JSON_EXTRACT(col, '$.a.b'))`
    /// - SQLite: `json_extract(col, '$.a.b')`
    /// - DuckDB: `json_extract_string(col, '$.a.b')`
    /// - ClickHouse: `JSONExtractString(col, 'a', 'b')`
    fn json_extract(&self, column: &str, path: &[&str]) -> String;

    /// Extract a date part from a temporal expression, `None` if unsupported
    fn date_part(&self, part: DatePart, expr: &str) -> Option<String>;

    /// Parse text extracted from JSON as a timestamp
    ///
    /// - PostgreSQL: `(expr)::timestamp`
    /// - MySQL: `CAST(expr AS DATETIME(6))`
    /// - SQLite: unchanged, date functions read ISO-8601 text
    /// - DuckDB: `CAST(expr AS TIMESTAMP)`
    /// - ClickHouse: `parseDateTime64BestEffort(expr, 6)`
    fn json_timestamp(&self, expr: &str) -> String {
        format!("CAST({} AS TIMESTAMP)", expr)
    }

    /// Whether the database has a native `ILIKE`
    fn supports_ilike(&self) -> bool {
        false
    }

    /// ESCAPE clause appended to LIKE patterns built from escaped input
    ///
    /// MySQL and ClickHouse already treat backslash as the LIKE escape.
    fn like_escape(&self) -> &'static str {
        " ESCAPE '\\'"
    }

    /// Regular-expression match, `None` if unsupported
    fn regex_match(&self, expr: &str, pattern: &str, case: Case) -> Option<Fragment>;

    /// Full-text search, `None` to fall back to a substring match
    fn full_text_search(&self, _expr: &str, _value: &str) -> Option<Fragment> {
        None
    }

    /// JSON document containment on a JSON column
    fn json_contains(&self, _column: &str, _document: &Value) -> Option<Fragment> {
        None
    }

    /// Array column contains a value
    ///
    /// - PostgreSQL: `? = ANY(col)`
    /// - DuckDB: `array_contains(col, ?)`
    /// - ClickHouse: `has(col, ?)`
    fn array_contains(&self, array_col: &str, value: QueryParam) -> Option<Fragment>;

    /// Generate LIMIT/OFFSET clause
    ///
    /// Most databases use `LIMIT x OFFSET y`, but syntax may vary.
    fn limit_offset(&self, limit: Option<u64>, offset: Option<u64>) -> String {
        match (limit, offset) {
            (Some(l), Some(o)) if o > 0 => format!("LIMIT {} OFFSET {}", l, o),
            (Some(l), _) => format!("LIMIT {}", l),
            (None, Some(o)) if o > 0 => format!("OFFSET {}", o),
            (None, _) => String::new(),
        }
    }
}

/// `'$.a.b'` path literal used by MySQL, SQLite and DuckDB
pub(crate) fn json_path_literal(path: &[&str]) -> String {
    format!("'$.{}'", path.join("."))
}

/// EXTRACT keyword shared by PostgreSQL-style dialects
pub(crate) fn extract_keyword(part: DatePart) -> Option<&'static str> {
    match part {
        DatePart::Year => Some("YEAR"),
        DatePart::IsoYear => Some("ISOYEAR"),
        DatePart::Quarter => Some("QUARTER"),
        DatePart::Month => Some("MONTH"),
        DatePart::Week => Some("WEEK"),
        DatePart::WeekDay => Some("DOW"),
        DatePart::IsoWeekDay => Some("ISODOW"),
        DatePart::Day => Some("DAY"),
        DatePart::Hour => Some("HOUR"),
        DatePart::Minute => Some("MINUTE"),
        DatePart::Second => Some("SECOND"),
        DatePart::Microsecond => Some("MICROSECONDS"),
        DatePart::Unspecified | DatePart::Date | DatePart::Time => None,
    }
}
