//! Backend capability interface and the shared operator dispatcher
//!
//! A `Processor` knows how to express each operator in one backend's native
//! form. It never sees raw field names or decides arity; `build_fragment`
//! resolves the field, parses value sets, drops blank input and maps the
//! operator onto the matching capability. Capabilities a backend lacks
//! return `None` and the condition is skipped.

use serde_json::Value;

use super::field::FieldRef;
use crate::backend::QueryBuilder;
use crate::types::{DatePart, Operator};
use crate::utils::string::parse_value_array;

/// Ordered comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Gt,
    Gte,
    Lt,
    Lte,
}

impl Comparison {
    /// SQL-style symbol
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Gt => ">",
            Self::Gte => ">=",
            Self::Lt => "<",
            Self::Lte => "<=",
        }
    }

    /// Operator keyword used by document stores (`gt`, `gte`, ...)
    pub fn keyword(&self) -> &'static str {
        match self {
            Self::Gt => "gt",
            Self::Gte => "gte",
            Self::Lt => "lt",
            Self::Lte => "lte",
        }
    }
}

/// Whether a text match folds case
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Case {
    Sensitive,
    Insensitive,
}

impl Case {
    pub fn is_insensitive(&self) -> bool {
        matches!(self, Self::Insensitive)
    }
}

/// Backend capability interface.
///
/// Each method receives an already validated field and non-blank input.
pub trait Processor {
    /// Native fragment produced for one condition or sub-tree
    type Fragment;
    /// Builder handle the fragments are applied to
    type Builder: QueryBuilder<Fragment = Self::Fragment>;

    fn name(&self) -> &'static str;

    fn equal(&self, field: &FieldRef, value: &str) -> Option<Self::Fragment>;

    fn not_equal(&self, field: &FieldRef, value: &str) -> Option<Self::Fragment>;

    fn compare(&self, field: &FieldRef, cmp: Comparison, value: &str) -> Option<Self::Fragment>;

    fn in_set(&self, field: &FieldRef, values: &[Value]) -> Option<Self::Fragment>;

    fn not_in_set(&self, field: &FieldRef, values: &[Value]) -> Option<Self::Fragment>;

    /// Inclusive range
    fn range(&self, field: &FieldRef, low: &Value, high: &Value) -> Option<Self::Fragment>;

    fn is_null(&self, field: &FieldRef) -> Option<Self::Fragment>;

    fn is_not_null(&self, field: &FieldRef) -> Option<Self::Fragment>;

    /// Caller-supplied LIKE pattern (`%` and `_` wildcards)
    fn like(&self, field: &FieldRef, pattern: &str, case: Case, negate: bool)
    -> Option<Self::Fragment>;

    fn contains(&self, field: &FieldRef, value: &str, case: Case) -> Option<Self::Fragment>;

    fn starts_with(&self, field: &FieldRef, value: &str, case: Case) -> Option<Self::Fragment>;

    fn ends_with(&self, field: &FieldRef, value: &str, case: Case) -> Option<Self::Fragment>;

    fn exact(&self, field: &FieldRef, value: &str, case: Case) -> Option<Self::Fragment>;

    fn regex(&self, field: &FieldRef, pattern: &str, case: Case) -> Option<Self::Fragment>;

    /// Full-text search; backends without one fall back to a substring match
    fn search(&self, field: &FieldRef, value: &str) -> Option<Self::Fragment> {
        self.contains(field, value, Case::Sensitive)
    }

    fn json_contains(&self, _field: &FieldRef, _document: &Value) -> Option<Self::Fragment> {
        None
    }

    fn array_contains(&self, _field: &FieldRef, _value: &str) -> Option<Self::Fragment> {
        None
    }

    fn exists(&self, _field: &FieldRef) -> Option<Self::Fragment> {
        None
    }

    /// Conjunction; `None` when there is nothing to combine
    fn and(&self, parts: Vec<Self::Fragment>) -> Option<Self::Fragment>;

    /// Disjunction; `None` when there is nothing to combine
    fn or(&self, parts: Vec<Self::Fragment>) -> Option<Self::Fragment>;

    /// Logical negation; `None` when the backend has no general NOT
    fn not(&self, part: Self::Fragment) -> Option<Self::Fragment>;

    /// Negation of a condition on `field`; a null or missing `field` must
    /// not satisfy the result
    fn not_field(&self, _field: &FieldRef, part: Self::Fragment) -> Option<Self::Fragment> {
        self.not(part)
    }

    /// Compile one condition into a fragment
    fn condition(
        &self,
        op: Operator,
        field: &str,
        value: &str,
        values: &[String],
    ) -> Option<Self::Fragment> {
        let Some(field_ref) = FieldRef::parse(field) else {
            tracing::warn!(field, op = %op, "Dropping condition: invalid field name");
            return None;
        };
        build_fragment(self, op, &field_ref, value, values)
    }

    /// Apply one condition to the builder; unchanged on a no-op
    fn process<'b>(
        &self,
        builder: &'b mut Self::Builder,
        op: Operator,
        field: &str,
        value: &str,
        values: &[String],
    ) -> &'b mut Self::Builder {
        if let Some(fragment) = self.condition(op, field, value, values) {
            builder.push_filter(fragment);
        }
        builder
    }

    /// Require that a date part of `field` can be extracted
    fn date_part<'b>(
        &self,
        builder: &'b mut Self::Builder,
        date_part: &str,
        field: &str,
    ) -> &'b mut Self::Builder {
        let part = DatePart::normalize(date_part);
        let fragment = FieldRef::parse(field)
            .and_then(|f| f.with_date_part(part))
            .and_then(|f| self.is_not_null(&f));
        match fragment {
            Some(fragment) => builder.push_filter(fragment),
            None => tracing::warn!(field, date_part, "Dropping date part: invalid part or field"),
        }
        builder
    }
}

/// Map an operator onto the processor's capabilities
pub fn build_fragment<P: Processor + ?Sized>(
    processor: &P,
    op: Operator,
    field: &FieldRef,
    value: &str,
    values: &[String],
) -> Option<P::Fragment> {
    let scalar = (!value.trim().is_empty()).then_some(value);
    let fragment = match op {
        Operator::Unspecified => {
            tracing::warn!(field = %field, "Dropping condition: unknown operator");
            return None;
        }
        Operator::Eq => scalar.and_then(|v| processor.equal(field, v)),
        Operator::Neq => scalar.and_then(|v| processor.not_equal(field, v)),
        Operator::Gt => scalar.and_then(|v| processor.compare(field, Comparison::Gt, v)),
        Operator::Gte => scalar.and_then(|v| processor.compare(field, Comparison::Gte, v)),
        Operator::Lt => scalar.and_then(|v| processor.compare(field, Comparison::Lt, v)),
        Operator::Lte => scalar.and_then(|v| processor.compare(field, Comparison::Lte, v)),
        Operator::In => value_set(value, values).and_then(|set| processor.in_set(field, &set)),
        Operator::Nin => value_set(value, values).and_then(|set| processor.not_in_set(field, &set)),
        Operator::Between => match value_set(value, values).as_deref() {
            Some([low, high]) => processor.range(field, low, high),
            _ => {
                tracing::warn!(field = %field, "Dropping BETWEEN: expected exactly 2 values");
                return None;
            }
        },
        Operator::IsNull => processor.is_null(field),
        Operator::IsNotNull => processor.is_not_null(field),
        Operator::Like => scalar.and_then(|v| processor.like(field, v, Case::Sensitive, false)),
        Operator::Ilike => scalar.and_then(|v| processor.like(field, v, Case::Insensitive, false)),
        Operator::NotLike => scalar.and_then(|v| processor.like(field, v, Case::Sensitive, true)),
        Operator::Contains => scalar.and_then(|v| processor.contains(field, v, Case::Sensitive)),
        Operator::Icontains => {
            scalar.and_then(|v| processor.contains(field, v, Case::Insensitive))
        }
        Operator::StartsWith => {
            scalar.and_then(|v| processor.starts_with(field, v, Case::Sensitive))
        }
        Operator::IstartsWith => {
            scalar.and_then(|v| processor.starts_with(field, v, Case::Insensitive))
        }
        Operator::EndsWith => scalar.and_then(|v| processor.ends_with(field, v, Case::Sensitive)),
        Operator::IendsWith => {
            scalar.and_then(|v| processor.ends_with(field, v, Case::Insensitive))
        }
        Operator::Exact => scalar.and_then(|v| processor.exact(field, v, Case::Sensitive)),
        Operator::Iexact => scalar.and_then(|v| processor.exact(field, v, Case::Insensitive)),
        Operator::Regexp => scalar.and_then(|v| processor.regex(field, v, Case::Sensitive)),
        Operator::Iregexp => scalar.and_then(|v| processor.regex(field, v, Case::Insensitive)),
        Operator::Search => scalar.and_then(|v| processor.search(field, v)),
        Operator::JsonContains => scalar
            .and_then(|v| serde_json::from_str::<Value>(v).ok())
            .and_then(|doc| processor.json_contains(field, &doc)),
        Operator::ArrayContains => scalar.and_then(|v| processor.array_contains(field, v)),
        Operator::Exists => processor.exists(field),
    };

    if fragment.is_none() {
        tracing::debug!(
            backend = processor.name(),
            field = %field,
            op = %op,
            "Condition compiled to no-op"
        );
    }
    fragment
}

/// Compile a condition and negate it.
///
/// Uses the backend's NOT when it has one, otherwise the operator's
/// complement. Null tests skip the presence guard of `not_field`.
pub fn build_negated<P: Processor + ?Sized>(
    processor: &P,
    op: Operator,
    field: &FieldRef,
    value: &str,
    values: &[String],
) -> Option<P::Fragment> {
    let tests_presence = matches!(op, Operator::IsNull | Operator::IsNotNull | Operator::Exists);
    let negate = |fragment| {
        if tests_presence {
            processor.not(fragment)
        } else {
            processor.not_field(field, fragment)
        }
    };
    if let Some(negated) = build_fragment(processor, op, field, value, values).and_then(negate) {
        return Some(negated);
    }
    let complement = op.negated()?;
    build_fragment(processor, complement, field, value, values)
}

/// Value set for IN/NIN/BETWEEN: `values` when given, else a JSON array in `value`
pub fn value_set(value: &str, values: &[String]) -> Option<Vec<Value>> {
    let set: Vec<Value> = if values.is_empty() {
        parse_value_array(value)?
    } else {
        values.iter().map(|v| Value::String(v.clone())).collect()
    };
    (!set.is_empty()).then_some(set)
}
