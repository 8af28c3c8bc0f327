//! Operator and date-part vocabularies
//!
//! Callers spell operators many ways (`EQ`, `equals`, `greaterThan`,
//! `not-in`). Every spelling is snake_cased and looked up in a synonym
//! table; anything unknown maps to `Unspecified`, which the compilers skip.

use std::fmt;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::utils::string::to_snake_case;

/// Canonical filter operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Operator {
    #[default]
    Unspecified,
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
    Like,
    Ilike,
    NotLike,
    In,
    Nin,
    IsNull,
    IsNotNull,
    Between,
    Regexp,
    Iregexp,
    Contains,
    Icontains,
    StartsWith,
    IstartsWith,
    EndsWith,
    IendsWith,
    JsonContains,
    ArrayContains,
    Exists,
    Search,
    Exact,
    Iexact,
}

impl Operator {
    /// Every canonical operator, in wire order
    pub const ALL: [Operator; 29] = [
        Operator::Unspecified,
        Operator::Eq,
        Operator::Neq,
        Operator::Gt,
        Operator::Gte,
        Operator::Lt,
        Operator::Lte,
        Operator::Like,
        Operator::Ilike,
        Operator::NotLike,
        Operator::In,
        Operator::Nin,
        Operator::IsNull,
        Operator::IsNotNull,
        Operator::Between,
        Operator::Regexp,
        Operator::Iregexp,
        Operator::Contains,
        Operator::Icontains,
        Operator::StartsWith,
        Operator::IstartsWith,
        Operator::EndsWith,
        Operator::IendsWith,
        Operator::JsonContains,
        Operator::ArrayContains,
        Operator::Exists,
        Operator::Search,
        Operator::Exact,
        Operator::Iexact,
    ];

    /// Normalize any accepted spelling to a canonical operator.
    ///
    /// Unknown or empty input yields `Unspecified`.
    pub fn normalize(s: &str) -> Self {
        match to_snake_case(s).as_str() {
            "eq" | "equal" | "equals" => Self::Eq,
            "ne" | "neq" | "not" | "not_equal" | "not_equals" => Self::Neq,
            "gt" | "greater_than" => Self::Gt,
            "gte" | "greater_than_or_equal" | "greater_equals" | "greater_or_equal" => Self::Gte,
            "lt" | "less_than" => Self::Lt,
            "lte" | "less_than_or_equal" | "less_equals" | "less_or_equal" => Self::Lte,
            "like" => Self::Like,
            "ilike" | "i_like" => Self::Ilike,
            "not_like" | "notlike" => Self::NotLike,
            "in" => Self::In,
            "nin" | "not_in" | "notin" => Self::Nin,
            "is_null" | "isnull" => Self::IsNull,
            "is_not_null" | "isnot_null" | "isnotnull" | "not_isnull" | "not_null" => {
                Self::IsNotNull
            }
            "between" | "range" => Self::Between,
            "regexp" | "regex" => Self::Regexp,
            "iregexp" | "i_regexp" | "iregex" | "i_regex" => Self::Iregexp,
            "contains" => Self::Contains,
            "icontains" | "i_contains" => Self::Icontains,
            "starts_with" | "startswith" => Self::StartsWith,
            "istarts_with" | "i_starts_with" | "istartswith" => Self::IstartsWith,
            "ends_with" | "endswith" => Self::EndsWith,
            "iends_with" | "i_ends_with" | "iendswith" => Self::IendsWith,
            "json_contains" | "jsoncontains" => Self::JsonContains,
            "array_contains" | "arraycontains" => Self::ArrayContains,
            "exists" => Self::Exists,
            "search" => Self::Search,
            "exact" => Self::Exact,
            "iexact" | "i_exact" => Self::Iexact,
            _ => Self::Unspecified,
        }
    }

    /// Whether the input names a real operator
    pub fn is_valid(s: &str) -> bool {
        Self::normalize(s) != Self::Unspecified
    }

    /// Canonical upper-case name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Unspecified => "UNSPECIFIED",
            Self::Eq => "EQ",
            Self::Neq => "NEQ",
            Self::Gt => "GT",
            Self::Gte => "GTE",
            Self::Lt => "LT",
            Self::Lte => "LTE",
            Self::Like => "LIKE",
            Self::Ilike => "ILIKE",
            Self::NotLike => "NOT_LIKE",
            Self::In => "IN",
            Self::Nin => "NIN",
            Self::IsNull => "IS_NULL",
            Self::IsNotNull => "IS_NOT_NULL",
            Self::Between => "BETWEEN",
            Self::Regexp => "REGEXP",
            Self::Iregexp => "IREGEXP",
            Self::Contains => "CONTAINS",
            Self::Icontains => "ICONTAINS",
            Self::StartsWith => "STARTS_WITH",
            Self::IstartsWith => "ISTARTS_WITH",
            Self::EndsWith => "ENDS_WITH",
            Self::IendsWith => "IENDS_WITH",
            Self::JsonContains => "JSON_CONTAINS",
            Self::ArrayContains => "ARRAY_CONTAINS",
            Self::Exists => "EXISTS",
            Self::Search => "SEARCH",
            Self::Exact => "EXACT",
            Self::Iexact => "IEXACT",
        }
    }

    /// Wire number used by integer-encoded requests
    pub fn number(&self) -> i32 {
        Self::ALL.iter().position(|op| op == self).unwrap_or(0) as i32
    }

    /// Operator for a wire number, `Unspecified` when out of range
    pub fn from_number(n: i64) -> Self {
        usize::try_from(n)
            .ok()
            .and_then(|i| Self::ALL.get(i).copied())
            .unwrap_or(Self::Unspecified)
    }

    /// Operator with the opposite truth value for non-null operands.
    ///
    /// Used to fold a `__not` suffix into the operator when the backend has
    /// no general negation.
    pub fn negated(&self) -> Option<Self> {
        match self {
            Self::Eq => Some(Self::Neq),
            Self::Neq => Some(Self::Eq),
            Self::Gt => Some(Self::Lte),
            Self::Gte => Some(Self::Lt),
            Self::Lt => Some(Self::Gte),
            Self::Lte => Some(Self::Gt),
            Self::In => Some(Self::Nin),
            Self::Nin => Some(Self::In),
            Self::Like => Some(Self::NotLike),
            Self::NotLike => Some(Self::Like),
            Self::IsNull => Some(Self::IsNotNull),
            Self::IsNotNull => Some(Self::IsNull),
            _ => None,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for Operator {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for Operator {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(EnumVisitor::new(
            "operator",
            Self::normalize,
            Self::from_number,
        ))
    }
}

/// Calendar or clock component extracted from a temporal field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DatePart {
    #[default]
    Unspecified,
    Date,
    Year,
    IsoYear,
    Quarter,
    Month,
    Week,
    WeekDay,
    IsoWeekDay,
    Day,
    Time,
    Hour,
    Minute,
    Second,
    Microsecond,
}

impl DatePart {
    /// Every canonical date part, in wire order
    pub const ALL: [DatePart; 15] = [
        DatePart::Unspecified,
        DatePart::Date,
        DatePart::Year,
        DatePart::IsoYear,
        DatePart::Quarter,
        DatePart::Month,
        DatePart::Week,
        DatePart::WeekDay,
        DatePart::IsoWeekDay,
        DatePart::Day,
        DatePart::Time,
        DatePart::Hour,
        DatePart::Minute,
        DatePart::Second,
        DatePart::Microsecond,
    ];

    /// Normalize any accepted spelling to a canonical date part
    pub fn normalize(s: &str) -> Self {
        match to_snake_case(s).as_str() {
            "date" => Self::Date,
            "year" | "yr" => Self::Year,
            "iso_year" | "isoyear" => Self::IsoYear,
            "quarter" | "qtr" => Self::Quarter,
            "month" | "mon" => Self::Month,
            "week" | "wk" => Self::Week,
            "week_day" | "weekday" | "dow" => Self::WeekDay,
            "iso_week_day" | "isoweekday" | "iso_weekday" | "isodow" => Self::IsoWeekDay,
            "day" => Self::Day,
            "time" => Self::Time,
            "hour" | "hr" => Self::Hour,
            "minute" | "min" => Self::Minute,
            "second" | "sec" => Self::Second,
            "microsecond" | "microseconds" | "usec" => Self::Microsecond,
            _ => Self::Unspecified,
        }
    }

    /// Whether the input names a real date part
    pub fn is_valid(s: &str) -> bool {
        Self::normalize(s) != Self::Unspecified
    }

    /// Canonical upper-case name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Unspecified => "UNSPECIFIED",
            Self::Date => "DATE",
            Self::Year => "YEAR",
            Self::IsoYear => "ISO_YEAR",
            Self::Quarter => "QUARTER",
            Self::Month => "MONTH",
            Self::Week => "WEEK",
            Self::WeekDay => "WEEK_DAY",
            Self::IsoWeekDay => "ISO_WEEK_DAY",
            Self::Day => "DAY",
            Self::Time => "TIME",
            Self::Hour => "HOUR",
            Self::Minute => "MINUTE",
            Self::Second => "SECOND",
            Self::Microsecond => "MICROSECOND",
        }
    }

    /// Date part for a wire number, `Unspecified` when out of range
    pub fn from_number(n: i64) -> Self {
        usize::try_from(n)
            .ok()
            .and_then(|i| Self::ALL.get(i).copied())
            .unwrap_or(Self::Unspecified)
    }

    /// Whether the part yields a number rather than a date or time value
    pub fn is_numeric(&self) -> bool {
        !matches!(self, Self::Unspecified | Self::Date | Self::Time)
    }
}

impl fmt::Display for DatePart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for DatePart {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for DatePart {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(EnumVisitor::new(
            "date part",
            Self::normalize,
            Self::from_number,
        ))
    }
}

/// Accepts either a name or a wire number; never fails on unknown names
pub(crate) struct EnumVisitor<T> {
    expecting: &'static str,
    from_name: fn(&str) -> T,
    from_number: fn(i64) -> T,
}

impl<T> EnumVisitor<T> {
    pub(crate) fn new(
        expecting: &'static str,
        from_name: fn(&str) -> T,
        from_number: fn(i64) -> T,
    ) -> Self {
        Self {
            expecting,
            from_name,
            from_number,
        }
    }
}

impl<T> Visitor<'_> for EnumVisitor<T> {
    type Value = T;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        write!(formatter, "a {} name or number", self.expecting)
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<T, E> {
        Ok((self.from_name)(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<T, E> {
        Ok((self.from_number)(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<T, E> {
        Ok((self.from_number)(i64::try_from(v).unwrap_or(-1)))
    }

    fn visit_unit<E: de::Error>(self) -> Result<T, E> {
        Ok((self.from_number)(0))
    }
}
