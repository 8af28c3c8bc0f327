//! Query-string filter compiler
//!
//! Compiles flat JSON filters such as `{"age__gte": 18, "name__icontains": "al"}`.
//! Keys follow `field[__op[__part]]`; the key is resolved once into a
//! `ParsedKey` and then handed to the processor like any other condition.
//! Keys or values that cannot be resolved drop only their own condition.

use serde_json::{Map, Value};

use super::field::FieldRef;
use super::processor::{Processor, build_fragment, build_negated};
use crate::backend::QueryBuilder;
use crate::error::{CompileError, Result};
use crate::types::{DatePart, Operator};

/// Separator between key segments
pub const KEY_DELIMITER: &str = "__";

/// Trailing segment that negates the operator before it
pub const NEGATION_SUFFIX: &str = "not";

const MAX_KEY_SEGMENTS: usize = 3;

/// Resolved query-string key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedKey {
    pub field: FieldRef,
    pub op: Operator,
    pub negate: bool,
}

impl ParsedKey {
    fn new(field: FieldRef, op: Operator) -> Self {
        Self {
            field,
            op,
            negate: false,
        }
    }
}

fn operator(segment: &str) -> Option<Operator> {
    let op = Operator::normalize(segment);
    (op != Operator::Unspecified).then_some(op)
}

fn date_part(segment: &str) -> Option<DatePart> {
    let part = DatePart::normalize(segment);
    (part != DatePart::Unspecified).then_some(part)
}

/// Resolve `field`, `field__op`, `field__part__op`, `field__op__not` or
/// `field__key__op` into a field reference and operator
pub fn parse_key(key: &str) -> Option<ParsedKey> {
    let segments: Vec<&str> = key.trim().split(KEY_DELIMITER).collect();
    if segments.len() > MAX_KEY_SEGMENTS || segments.iter().any(|s| s.trim().is_empty()) {
        return None;
    }
    let field = FieldRef::parse(segments[0])?;

    match segments[1..] {
        [] => Some(ParsedKey::new(field, Operator::Eq)),
        [second] => {
            if let Some(op) = operator(second) {
                Some(ParsedKey::new(field, op))
            } else if let Some(part) = date_part(second) {
                Some(ParsedKey::new(field.with_date_part(part)?, Operator::Eq))
            } else {
                Some(ParsedKey::new(field.child(second)?, Operator::Eq))
            }
        }
        [second, third] => {
            if let Some(part) = date_part(second) {
                let op = operator(third)?;
                return Some(ParsedKey::new(field.with_date_part(part)?, op));
            }
            if third.trim().eq_ignore_ascii_case(NEGATION_SUFFIX)
                && let Some(op) = operator(second)
            {
                return Some(ParsedKey {
                    field,
                    op,
                    negate: true,
                });
            }
            let child = field.child(second)?;
            if let Some(op) = operator(third) {
                Some(ParsedKey::new(child, op))
            } else {
                let part = date_part(third)?;
                Some(ParsedKey::new(child.with_date_part(part)?, Operator::Eq))
            }
        }
        _ => None,
    }
}

/// Condition text for a JSON value; arrays and objects stay JSON-encoded
fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Compiles AND / OR query-string filters with size guards
#[derive(Debug, Clone, Copy)]
pub struct QueryStringFilter {
    max_json_size: usize,
    max_conditions: usize,
}

impl QueryStringFilter {
    pub fn new(max_json_size: usize, max_conditions: usize) -> Self {
        Self {
            max_json_size,
            max_conditions,
        }
    }

    /// Decode a filter string into `(key, value)` entries in document order.
    ///
    /// Blank input yields no entries.
    pub fn parse(&self, json: &str) -> Result<Vec<(String, Value)>> {
        if json.trim().is_empty() {
            return Ok(Vec::new());
        }
        if json.len() > self.max_json_size {
            return Err(CompileError::filter_too_large(json.len(), self.max_json_size));
        }

        let value: Value =
            serde_json::from_str(json).map_err(|e| CompileError::invalid_filter_json(e.to_string()))?;
        let maps: Vec<Map<String, Value>> = match value {
            Value::Object(map) => vec![map],
            Value::Array(items) => items
                .into_iter()
                .map(|item| match item {
                    Value::Object(map) => Ok(map),
                    _ => Err(CompileError::invalid_filter_json(
                        "array elements must be objects",
                    )),
                })
                .collect::<Result<_>>()?,
            _ => {
                return Err(CompileError::invalid_filter_json(
                    "expected an object or an array of objects",
                ));
            }
        };

        let entries: Vec<(String, Value)> = maps.into_iter().flatten().collect();
        if entries.len() > self.max_conditions {
            return Err(CompileError::too_many_conditions(
                entries.len(),
                self.max_conditions,
            ));
        }
        Ok(entries)
    }

    /// Compile one filter string, conjoining (`is_or = false`) or disjoining
    /// its conditions
    pub fn compile<P: Processor + ?Sized>(
        &self,
        processor: &P,
        json: &str,
        is_or: bool,
    ) -> Result<Option<P::Fragment>> {
        let parts: Vec<P::Fragment> = self
            .parse(json)?
            .iter()
            .filter_map(|(key, value)| compile_entry(processor, key, value))
            .collect();
        tracing::debug!(conditions = parts.len(), is_or, "Compiled query-string filter");
        Ok(if is_or {
            processor.or(parts)
        } else {
            processor.and(parts)
        })
    }

    /// Compile the AND and OR strings and conjoin the two results
    pub fn compile_pair<P: Processor + ?Sized>(
        &self,
        processor: &P,
        and_json: Option<&str>,
        or_json: Option<&str>,
    ) -> Result<Option<P::Fragment>> {
        let mut parts = Vec::with_capacity(2);
        if let Some(json) = and_json
            && let Some(fragment) = self.compile(processor, json, false)?
        {
            parts.push(fragment);
        }
        if let Some(json) = or_json
            && let Some(fragment) = self.compile(processor, json, true)?
        {
            parts.push(fragment);
        }
        Ok(processor.and(parts))
    }

    /// Compile both strings onto the builder; returns whether a filter was added
    pub fn apply<P: Processor + ?Sized>(
        &self,
        processor: &P,
        builder: &mut P::Builder,
        and_json: Option<&str>,
        or_json: Option<&str>,
    ) -> Result<bool> {
        match self.compile_pair(processor, and_json, or_json)? {
            Some(fragment) => {
                builder.push_filter(fragment);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

/// Compile a single `key: value` entry; `None` drops it
pub fn compile_entry<P: Processor + ?Sized>(
    processor: &P,
    key: &str,
    value: &Value,
) -> Option<P::Fragment> {
    let Some(parsed) = parse_key(key) else {
        tracing::warn!(key, "Dropping query-string condition: unresolvable key");
        return None;
    };
    let text = value_text(value);
    if parsed.negate {
        build_negated(processor, parsed.op, &parsed.field, &text, &[])
    } else {
        build_fragment(processor, parsed.op, &parsed.field, &text, &[])
    }
}
