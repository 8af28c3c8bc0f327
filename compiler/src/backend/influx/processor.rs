//! InfluxQL condition processor
//!
//! InfluxQL has no NOT, no null test and no date-part functions in WHERE;
//! those conditions compile to no-ops. Regular expressions cannot be bound
//! as parameters, so patterns are checked to compile and written as
//! escaped `/.../` literals.

use regex::Regex;
use serde_json::Value;

use super::{InfluxQuery, quote_ident};
use crate::backend::fragment::{Fragment, QueryParam};
use crate::filter::field::FieldRef;
use crate::filter::processor::{Case, Comparison, Processor};
use crate::utils::sql::like_to_regex;
use crate::utils::string::{infer_scalar, with_inline_case_flag};

/// Compiles conditions into InfluxQL fragments
#[derive(Debug, Clone, Copy, Default)]
pub struct InfluxProcessor;

impl InfluxProcessor {
    pub fn new() -> Self {
        Self
    }

    /// Quoted field key; date-part extraction is not expressible
    fn key(&self, field: &FieldRef) -> Option<String> {
        match field {
            FieldRef::DatePart { .. } => None,
            _ => Some(quote_ident(&field.dotted())),
        }
    }

    fn binary(&self, field: &FieldRef, op: &str, value: &Value) -> Option<Fragment> {
        let key = self.key(field)?;
        Some(Fragment::text(format!("{} {} ", key, op)).param(QueryParam::from_json(value)))
    }

    /// `key =~ /pattern/`, dropped when the pattern does not compile
    fn regex_match(&self, field: &FieldRef, pattern: &str, case: Case, negate: bool) -> Option<Fragment> {
        let key = self.key(field)?;
        let pattern = if case.is_insensitive() {
            with_inline_case_flag(pattern)
        } else {
            pattern.to_string()
        };
        if pattern.contains('\n') || Regex::new(&pattern).is_err() {
            tracing::warn!(field = %field, "Dropping condition: invalid regular expression");
            return None;
        }
        let op = if negate { "!~" } else { "=~" };
        Some(Fragment::text(format!("{} {} {}", key, op, regex_literal(&pattern))))
    }

    fn joined(&self, field: &FieldRef, op: &str, values: &[Value], sep: &str) -> Option<Fragment> {
        let parts: Option<Vec<Fragment>> = values
            .iter()
            .map(|v| self.binary(field, op, &typed(v)))
            .collect();
        Fragment::join(parts?, sep)
    }
}

/// `/pattern/` literal with unescaped slashes escaped
fn regex_literal(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len() + 2);
    out.push('/');
    let mut escaped = false;
    for c in pattern.chars() {
        if c == '/' && !escaped {
            out.push('\\');
        }
        escaped = c == '\\' && !escaped;
        out.push(c);
    }
    out.push('/');
    out
}

fn typed(value: &Value) -> Value {
    match value {
        Value::String(s) => infer_scalar(s),
        other => other.clone(),
    }
}

impl Processor for InfluxProcessor {
    type Fragment = Fragment;
    type Builder = InfluxQuery;

    fn name(&self) -> &'static str {
        "influx"
    }

    fn equal(&self, field: &FieldRef, value: &str) -> Option<Fragment> {
        self.binary(field, "=", &infer_scalar(value))
    }

    fn not_equal(&self, field: &FieldRef, value: &str) -> Option<Fragment> {
        self.binary(field, "!=", &infer_scalar(value))
    }

    fn compare(&self, field: &FieldRef, cmp: Comparison, value: &str) -> Option<Fragment> {
        self.binary(field, cmp.symbol(), &infer_scalar(value))
    }

    fn in_set(&self, field: &FieldRef, values: &[Value]) -> Option<Fragment> {
        self.joined(field, "=", values, " OR ")
    }

    fn not_in_set(&self, field: &FieldRef, values: &[Value]) -> Option<Fragment> {
        self.joined(field, "!=", values, " AND ")
    }

    fn range(&self, field: &FieldRef, low: &Value, high: &Value) -> Option<Fragment> {
        Fragment::and(vec![
            self.binary(field, ">=", &typed(low))?,
            self.binary(field, "<=", &typed(high))?,
        ])
    }

    fn is_null(&self, _field: &FieldRef) -> Option<Fragment> {
        None
    }

    fn is_not_null(&self, _field: &FieldRef) -> Option<Fragment> {
        None
    }

    fn like(&self, field: &FieldRef, pattern: &str, case: Case, negate: bool) -> Option<Fragment> {
        self.regex_match(field, &like_to_regex(pattern), case, negate)
    }

    fn contains(&self, field: &FieldRef, value: &str, case: Case) -> Option<Fragment> {
        self.regex_match(field, &regex::escape(value), case, false)
    }

    fn starts_with(&self, field: &FieldRef, value: &str, case: Case) -> Option<Fragment> {
        self.regex_match(field, &format!("^{}", regex::escape(value)), case, false)
    }

    fn ends_with(&self, field: &FieldRef, value: &str, case: Case) -> Option<Fragment> {
        self.regex_match(field, &format!("{}$", regex::escape(value)), case, false)
    }

    fn exact(&self, field: &FieldRef, value: &str, case: Case) -> Option<Fragment> {
        if !case.is_insensitive() {
            return self.binary(field, "=", &Value::String(value.to_string()));
        }
        self.regex_match(field, &format!("^{}$", regex::escape(value)), case, false)
    }

    fn regex(&self, field: &FieldRef, pattern: &str, case: Case) -> Option<Fragment> {
        self.regex_match(field, pattern, case, false)
    }

    fn and(&self, parts: Vec<Fragment>) -> Option<Fragment> {
        Fragment::and(parts)
    }

    fn or(&self, parts: Vec<Fragment>) -> Option<Fragment> {
        Fragment::or(parts)
    }

    fn not(&self, _part: Fragment) -> Option<Fragment> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::processor::build_negated;
    use crate::types::Operator;

    fn compile(op: Operator, field: &str, value: &str) -> Option<String> {
        InfluxProcessor::new()
            .condition(op, field, value, &[])
            .map(|f| f.to_string())
    }

    #[test]
    fn test_scalar_operators() {
        assert_eq!(compile(Operator::Eq, "host", "a").unwrap(), "\"host\" = ?");
        assert_eq!(compile(Operator::Neq, "host", "a").unwrap(), "\"host\" != ?");
        assert_eq!(compile(Operator::Gt, "usage", "0.5").unwrap(), "\"usage\" > ?");
    }

    #[test]
    fn test_set_operators_expand() {
        assert_eq!(
            compile(Operator::In, "host", r#"["a","b"]"#).unwrap(),
            "(\"host\" = ? OR \"host\" = ?)"
        );
        assert_eq!(
            compile(Operator::Nin, "host", r#"["a","b"]"#).unwrap(),
            "(\"host\" != ? AND \"host\" != ?)"
        );
        assert_eq!(
            compile(Operator::Between, "usage", "[1, 5]").unwrap(),
            "(\"usage\" >= ? AND \"usage\" <= ?)"
        );
    }

    #[test]
    fn test_regex_literals() {
        assert_eq!(
            compile(Operator::Contains, "host", "web.1").unwrap(),
            "\"host\" =~ /web\\.1/"
        );
        assert_eq!(
            compile(Operator::IstartsWith, "host", "Web").unwrap(),
            "\"host\" =~ /(?i)^Web/"
        );
        assert_eq!(
            compile(Operator::Iregexp, "path", "(?i)a/b").unwrap(),
            "\"path\" =~ /(?i)a\\/b/"
        );
        assert_eq!(
            compile(Operator::NotLike, "host", "web%").unwrap(),
            "\"host\" !~ /^web.*$/"
        );
    }

    #[test]
    fn test_invalid_regex_dropped() {
        assert_eq!(compile(Operator::Regexp, "host", "(unclosed"), None);
    }

    #[test]
    fn test_unsupported_are_noops() {
        assert_eq!(compile(Operator::IsNull, "host", ""), None);
        assert_eq!(compile(Operator::Exists, "host", ""), None);
        assert_eq!(compile(Operator::JsonContains, "host", "{}"), None);
        let field = FieldRef::parse("time")
            .unwrap()
            .with_date_part(crate::types::DatePart::Year)
            .unwrap();
        assert_eq!(InfluxProcessor::new().equal(&field, "2020"), None);
    }

    #[test]
    fn test_negation_folds_to_complement() {
        let p = InfluxProcessor::new();
        let field = FieldRef::parse("host").unwrap();
        let f = build_negated(&p, Operator::Eq, &field, "a", &[]).unwrap();
        assert_eq!(f.to_string(), "\"host\" != ?");
        assert!(build_negated(&p, Operator::Contains, &field, "a", &[]).is_none());
    }

    #[test]
    fn test_regex_literal_escaping() {
        assert_eq!(regex_literal("a/b"), "/a\\/b/");
        assert_eq!(regex_literal("a\\/b"), "/a\\/b/");
    }
}
