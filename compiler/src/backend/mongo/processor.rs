//! MongoDB condition processor
//!
//! Scalar text is typed with `infer_scalar` because MongoDB compares by BSON
//! type. Negative operators also exclude null and missing fields so that
//! they match the SQL backends.

use serde_json::{Value, json};

use super::MongoQuery;
use crate::backend::doc;
use crate::filter::field::{FieldRef, PATH_SEPARATOR, is_valid_json_key};
use crate::filter::processor::{Case, Comparison, Processor};
use crate::types::DatePart;
use crate::utils::sql::like_to_regex;
use crate::utils::string::infer_scalar;

/// Compiles conditions into MongoDB filter documents
#[derive(Debug, Clone, Copy, Default)]
pub struct MongoProcessor;

/// Where a condition applies: a document path or a computed expression
enum Target {
    Path(String),
    Expr { expr: Value, numeric: bool },
}

impl MongoProcessor {
    pub fn new() -> Self {
        Self
    }

    fn target(&self, field: &FieldRef) -> Option<Target> {
        match field {
            FieldRef::DatePart { part, field } => {
                let path = format!("${}", field.dotted());
                Some(Target::Expr {
                    expr: date_expr(*part, &path)?,
                    numeric: part.is_numeric(),
                })
            }
            _ => Some(Target::Path(field.dotted())),
        }
    }

    /// Document path for operators that only work on stored fields
    fn path(&self, field: &FieldRef) -> Option<String> {
        match field {
            FieldRef::DatePart { .. } => None,
            _ => Some(field.dotted()),
        }
    }

    /// Comparison against a computed expression inside `$expr`
    fn expr_compare(op: &str, expr: &Value, value: Value) -> Value {
        json!({ "$expr": doc(op, json!([expr, value])) })
    }

    fn expr_value(numeric: bool, value: &str) -> Value {
        if numeric {
            infer_scalar(value)
        } else {
            Value::String(value.to_string())
        }
    }

    fn regex_doc(path: String, pattern: String, case: Case) -> Value {
        let mut cond = json!({ "$regex": pattern });
        if case.is_insensitive() {
            cond["$options"] = json!("i");
        }
        doc(path, cond)
    }

    fn text_pattern(&self, field: &FieldRef, pattern: String, case: Case) -> Option<Value> {
        Some(Self::regex_doc(self.path(field)?, pattern, case))
    }
}

/// Aggregation expression extracting a date part from `path`
fn date_expr(part: DatePart, path: &str) -> Option<Value> {
    let expr = match part {
        DatePart::Date => json!({ "$dateToString": { "format": "%Y-%m-%d", "date": path } }),
        DatePart::Time => json!({ "$dateToString": { "format": "%H:%M:%S", "date": path } }),
        DatePart::Year => json!({ "$year": path }),
        DatePart::IsoYear => json!({ "$isoWeekYear": path }),
        DatePart::Quarter => json!({ "$ceil": { "$divide": [{ "$month": path }, 3] } }),
        DatePart::Month => json!({ "$month": path }),
        DatePart::Week => json!({ "$isoWeek": path }),
        DatePart::WeekDay => json!({ "$subtract": [{ "$dayOfWeek": path }, 1] }),
        DatePart::IsoWeekDay => json!({ "$isoDayOfWeek": path }),
        DatePart::Day => json!({ "$dayOfMonth": path }),
        DatePart::Hour => json!({ "$hour": path }),
        DatePart::Minute => json!({ "$minute": path }),
        DatePart::Second => json!({ "$second": path }),
        DatePart::Microsecond => json!({ "$multiply": [{ "$millisecond": path }, 1000] }),
        DatePart::Unspecified => return None,
    };
    Some(expr)
}

impl Processor for MongoProcessor {
    type Fragment = Value;
    type Builder = MongoQuery;

    fn name(&self) -> &'static str {
        "mongo"
    }

    fn equal(&self, field: &FieldRef, value: &str) -> Option<Value> {
        Some(match self.target(field)? {
            Target::Path(path) => doc(path, infer_scalar(value)),
            Target::Expr { expr, numeric } => {
                Self::expr_compare("$eq", &expr, Self::expr_value(numeric, value))
            }
        })
    }

    fn not_equal(&self, field: &FieldRef, value: &str) -> Option<Value> {
        Some(match self.target(field)? {
            Target::Path(path) => doc(path, json!({ "$nin": [infer_scalar(value), null] })),
            Target::Expr { expr, numeric } => json!({ "$and": [
                Self::expr_compare("$ne", &expr, Self::expr_value(numeric, value)),
                Self::expr_compare("$ne", &expr, Value::Null),
            ]}),
        })
    }

    fn compare(&self, field: &FieldRef, cmp: Comparison, value: &str) -> Option<Value> {
        let op = format!("${}", cmp.keyword());
        Some(match self.target(field)? {
            Target::Path(path) => doc(path, doc(op, infer_scalar(value))),
            Target::Expr { expr, numeric } => {
                Self::expr_compare(&op, &expr, Self::expr_value(numeric, value))
            }
        })
    }

    fn in_set(&self, field: &FieldRef, values: &[Value]) -> Option<Value> {
        let values = typed(values);
        Some(match self.target(field)? {
            Target::Path(path) => doc(path, json!({ "$in": values })),
            Target::Expr { expr, .. } => Self::expr_compare("$in", &expr, Value::Array(values)),
        })
    }

    fn not_in_set(&self, field: &FieldRef, values: &[Value]) -> Option<Value> {
        let mut values = typed(values);
        Some(match self.target(field)? {
            Target::Path(path) => {
                values.push(Value::Null);
                doc(path, json!({ "$nin": values }))
            }
            Target::Expr { expr, .. } => json!({ "$and": [
                json!({ "$expr": { "$not": [{ "$in": [expr, values] }] } }),
                Self::expr_compare("$ne", &expr, Value::Null),
            ]}),
        })
    }

    fn range(&self, field: &FieldRef, low: &Value, high: &Value) -> Option<Value> {
        let (low, high) = (typed_one(low), typed_one(high));
        Some(match self.target(field)? {
            Target::Path(path) => doc(path, json!({ "$gte": low, "$lte": high })),
            Target::Expr { expr, .. } => json!({ "$and": [
                Self::expr_compare("$gte", &expr, low),
                Self::expr_compare("$lte", &expr, high),
            ]}),
        })
    }

    fn is_null(&self, field: &FieldRef) -> Option<Value> {
        Some(match self.target(field)? {
            Target::Path(path) => doc(path, Value::Null),
            Target::Expr { expr, .. } => Self::expr_compare("$eq", &expr, Value::Null),
        })
    }

    fn is_not_null(&self, field: &FieldRef) -> Option<Value> {
        Some(match self.target(field)? {
            Target::Path(path) => doc(path, json!({ "$ne": null })),
            Target::Expr { expr, .. } => Self::expr_compare("$ne", &expr, Value::Null),
        })
    }

    fn like(&self, field: &FieldRef, pattern: &str, case: Case, negate: bool) -> Option<Value> {
        let path = self.path(field)?;
        let regex = like_to_regex(pattern);
        if !negate {
            return Some(Self::regex_doc(path, regex, case));
        }
        let mut inner = json!({ "$regex": regex });
        if case.is_insensitive() {
            inner["$options"] = json!("i");
        }
        Some(doc(path, json!({ "$ne": null, "$not": inner })))
    }

    fn contains(&self, field: &FieldRef, value: &str, case: Case) -> Option<Value> {
        self.text_pattern(field, regex::escape(value), case)
    }

    fn starts_with(&self, field: &FieldRef, value: &str, case: Case) -> Option<Value> {
        self.text_pattern(field, format!("^{}", regex::escape(value)), case)
    }

    fn ends_with(&self, field: &FieldRef, value: &str, case: Case) -> Option<Value> {
        self.text_pattern(field, format!("{}$", regex::escape(value)), case)
    }

    fn exact(&self, field: &FieldRef, value: &str, case: Case) -> Option<Value> {
        if !case.is_insensitive() {
            return Some(doc(self.path(field)?, Value::String(value.to_string())));
        }
        self.text_pattern(field, format!("^{}$", regex::escape(value)), case)
    }

    fn regex(&self, field: &FieldRef, pattern: &str, case: Case) -> Option<Value> {
        self.text_pattern(field, pattern.to_string(), case)
    }

    fn search(&self, _field: &FieldRef, value: &str) -> Option<Value> {
        Some(json!({ "$text": { "$search": value } }))
    }

    fn json_contains(&self, field: &FieldRef, document: &Value) -> Option<Value> {
        let path = self.path(field)?;
        let mut parts = Vec::new();
        flatten_containment(&path, document, &mut parts)?;
        self.and(parts)
    }

    fn array_contains(&self, field: &FieldRef, value: &str) -> Option<Value> {
        let path = self.path(field)?;
        Some(doc(path, json!({ "$elemMatch": { "$eq": infer_scalar(value) } })))
    }

    fn exists(&self, field: &FieldRef) -> Option<Value> {
        Some(doc(self.path(field)?, json!({ "$exists": true })))
    }

    fn and(&self, mut parts: Vec<Value>) -> Option<Value> {
        match parts.len() {
            0 => None,
            1 => parts.pop(),
            _ => Some(json!({ "$and": parts })),
        }
    }

    fn or(&self, mut parts: Vec<Value>) -> Option<Value> {
        match parts.len() {
            0 => None,
            1 => parts.pop(),
            _ => Some(json!({ "$or": parts })),
        }
    }

    fn not(&self, part: Value) -> Option<Value> {
        Some(json!({ "$nor": [part] }))
    }

    fn not_field(&self, field: &FieldRef, part: Value) -> Option<Value> {
        let negated = self.not(part)?;
        self.and(vec![negated, doc(field.dotted(), json!({ "$ne": null }))])
    }
}

/// Flatten a containment document into equality clauses on dotted paths
///
/// Returns `None` when any key is not a plain JSON key, so operator keys
/// such as `$ne` never reach the filter.
fn flatten_containment(prefix: &str, value: &Value, out: &mut Vec<Value>) -> Option<()> {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                if key.contains(PATH_SEPARATOR) || !is_valid_json_key(key) {
                    tracing::debug!(key = %key, "Rejected containment key");
                    return None;
                }
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{}.{}", prefix, key)
                };
                flatten_containment(&path, child, out)?;
            }
        }
        Value::Array(items) => {
            let mut members = Vec::with_capacity(items.len());
            for item in items {
                match item {
                    Value::Array(_) => return None,
                    Value::Object(_) => {
                        let mut inner = Vec::new();
                        flatten_containment("", item, &mut inner)?;
                        let matcher = match inner.len() {
                            0 => continue,
                            1 => inner.remove(0),
                            _ => json!({ "$and": inner }),
                        };
                        members.push(json!({ "$elemMatch": matcher }));
                    }
                    scalar => members.push(scalar.clone()),
                }
            }
            if !members.is_empty() {
                out.push(doc(prefix, json!({ "$all": members })));
            }
        }
        Value::Null => out.push(doc(prefix, json!({ "$type": "null" }))),
        scalar => out.push(doc(prefix, scalar.clone())),
    }
    Some(())
}

/// Type string members of a value set
fn typed(values: &[Value]) -> Vec<Value> {
    values.iter().map(typed_one).collect()
}

fn typed_one(value: &Value) -> Value {
    match value {
        Value::String(s) => infer_scalar(s),
        other => other.clone(),
    }
}
