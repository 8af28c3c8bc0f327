//! Elasticsearch condition processor
//!
//! Negative operators pair `must_not` with an `exists` filter so documents
//! missing the field never match. Date-part extraction needs scripting and
//! is not supported.

use serde_json::{Map, Value, json};

use super::{EsQuery, bool_query};
use crate::backend::doc;
use crate::filter::field::FieldRef;
use crate::filter::processor::{Case, Comparison, Processor};
use crate::utils::string::{infer_scalar, strip_inline_case_flag};

/// Compiles conditions into query DSL clauses
#[derive(Debug, Clone, Copy, Default)]
pub struct EsProcessor;

impl EsProcessor {
    pub fn new() -> Self {
        Self
    }

    fn path(&self, field: &FieldRef) -> Option<String> {
        match field {
            FieldRef::DatePart { .. } => None,
            _ => Some(field.dotted()),
        }
    }

    fn term(path: &str, value: Value) -> Value {
        doc("term", doc(path, value))
    }

    fn exists_clause(path: &str) -> Value {
        json!({ "exists": { "field": path } })
    }

    /// Present and not matching `clause`
    fn present_not(path: &str, clause: Value) -> Value {
        json!({ "bool": {
            "filter": [Self::exists_clause(path)],
            "must_not": [clause]
        } })
    }

    /// `{kind: {path: {"value": v, "case_insensitive": true?}}}`
    fn text_query(kind: &str, path: &str, value: String, case: Case) -> Value {
        let mut inner = Map::new();
        inner.insert("value".into(), Value::String(value));
        if case.is_insensitive() {
            inner.insert("case_insensitive".into(), Value::Bool(true));
        }
        doc(kind, doc(path, Value::Object(inner)))
    }

    fn wildcard(&self, field: &FieldRef, pattern: String, case: Case) -> Option<Value> {
        Some(Self::text_query("wildcard", &self.path(field)?, pattern, case))
    }
}

/// Escape wildcard metacharacters in a literal value
fn escape_wildcard(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '*' | '?' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Translate a LIKE pattern (`%`, `_`, backslash escapes) into wildcard syntax
fn like_to_wildcard(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len());
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        match c {
            '%' => out.push('*'),
            '_' => out.push('?'),
            '\\' => match chars.next() {
                Some(next) => out.push_str(&escape_wildcard(&next.to_string())),
                None => out.push_str("\\\\"),
            },
            other => out.push_str(&escape_wildcard(&other.to_string())),
        }
    }
    out
}

fn typed(value: &Value) -> Value {
    match value {
        Value::String(s) => infer_scalar(s),
        other => other.clone(),
    }
}

/// Flatten a JSON document into `term` clauses on dotted paths
fn flatten_terms(prefix: &str, value: &Value, out: &mut Vec<Value>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                flatten_terms(&format!("{}.{}", prefix, key), child, out);
            }
        }
        Value::Array(items) => {
            for item in items {
                flatten_terms(prefix, item, out);
            }
        }
        Value::Null => {}
        scalar => out.push(EsProcessor::term(prefix, scalar.clone())),
    }
}

impl Processor for EsProcessor {
    type Fragment = Value;
    type Builder = EsQuery;

    fn name(&self) -> &'static str {
        "elastic"
    }

    fn equal(&self, field: &FieldRef, value: &str) -> Option<Value> {
        Some(Self::term(&self.path(field)?, infer_scalar(value)))
    }

    fn not_equal(&self, field: &FieldRef, value: &str) -> Option<Value> {
        let path = self.path(field)?;
        let term = Self::term(&path, infer_scalar(value));
        Some(Self::present_not(&path, term))
    }

    fn compare(&self, field: &FieldRef, cmp: Comparison, value: &str) -> Option<Value> {
        let path = self.path(field)?;
        Some(doc("range", doc(path, doc(cmp.keyword(), infer_scalar(value)))))
    }

    fn in_set(&self, field: &FieldRef, values: &[Value]) -> Option<Value> {
        let path = self.path(field)?;
        let values: Vec<Value> = values.iter().map(typed).collect();
        Some(doc("terms", doc(path, Value::Array(values))))
    }

    fn not_in_set(&self, field: &FieldRef, values: &[Value]) -> Option<Value> {
        let terms = self.in_set(field, values)?;
        Some(Self::present_not(&self.path(field)?, terms))
    }

    fn range(&self, field: &FieldRef, low: &Value, high: &Value) -> Option<Value> {
        let path = self.path(field)?;
        Some(doc(
            "range",
            doc(path, json!({ "gte": typed(low), "lte": typed(high) })),
        ))
    }

    fn is_null(&self, field: &FieldRef) -> Option<Value> {
        Some(bool_query(
            "must_not",
            vec![Self::exists_clause(&self.path(field)?)],
        ))
    }

    fn is_not_null(&self, field: &FieldRef) -> Option<Value> {
        Some(Self::exists_clause(&self.path(field)?))
    }

    fn like(&self, field: &FieldRef, pattern: &str, case: Case, negate: bool) -> Option<Value> {
        let clause = self.wildcard(field, like_to_wildcard(pattern), case)?;
        if negate {
            Some(Self::present_not(&self.path(field)?, clause))
        } else {
            Some(clause)
        }
    }

    fn contains(&self, field: &FieldRef, value: &str, case: Case) -> Option<Value> {
        self.wildcard(field, format!("*{}*", escape_wildcard(value)), case)
    }

    fn starts_with(&self, field: &FieldRef, value: &str, case: Case) -> Option<Value> {
        Some(Self::text_query("prefix", &self.path(field)?, value.to_string(), case))
    }

    fn ends_with(&self, field: &FieldRef, value: &str, case: Case) -> Option<Value> {
        self.wildcard(field, format!("*{}", escape_wildcard(value)), case)
    }

    fn exact(&self, field: &FieldRef, value: &str, case: Case) -> Option<Value> {
        Some(Self::text_query("term", &self.path(field)?, value.to_string(), case))
    }

    fn regex(&self, field: &FieldRef, pattern: &str, case: Case) -> Option<Value> {
        let stripped = strip_inline_case_flag(pattern);
        let case = if stripped.len() != pattern.len() {
            Case::Insensitive
        } else {
            case
        };
        Some(Self::text_query("regexp", &self.path(field)?, stripped.to_string(), case))
    }

    fn search(&self, field: &FieldRef, value: &str) -> Option<Value> {
        Some(doc("match", doc(self.path(field)?, Value::String(value.to_string()))))
    }

    fn json_contains(&self, field: &FieldRef, document: &Value) -> Option<Value> {
        let path = self.path(field)?;
        let mut terms = Vec::new();
        flatten_terms(&path, document, &mut terms);
        match terms.len() {
            0 => None,
            1 => terms.pop(),
            _ => Some(bool_query("filter", terms)),
        }
    }

    fn array_contains(&self, field: &FieldRef, value: &str) -> Option<Value> {
        Some(Self::term(&self.path(field)?, infer_scalar(value)))
    }

    fn exists(&self, field: &FieldRef) -> Option<Value> {
        self.is_not_null(field)
    }

    fn and(&self, mut parts: Vec<Value>) -> Option<Value> {
        match parts.len() {
            0 => None,
            1 => parts.pop(),
            _ => Some(bool_query("filter", parts)),
        }
    }

    fn or(&self, mut parts: Vec<Value>) -> Option<Value> {
        match parts.len() {
            0 => None,
            1 => parts.pop(),
            _ => Some(json!({ "bool": { "should": parts, "minimum_should_match": 1 } })),
        }
    }

    fn not(&self, part: Value) -> Option<Value> {
        Some(bool_query("must_not", vec![part]))
    }

    fn not_field(&self, field: &FieldRef, part: Value) -> Option<Value> {
        Some(Self::present_not(&field.dotted(), part))
    }
}
