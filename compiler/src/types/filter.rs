//! Filter type definitions
//!
//! Defines the structured filter tree carried by paging requests. The JSON
//! shape follows the protobuf-JSON mapping: enums may arrive as names or
//! numbers, repeated fields may be omitted.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use super::operator::{EnumVisitor, Operator};
use crate::utils::string::value_to_text;

/// Boolean combinator of a filter node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExprType {
    #[default]
    Unspecified,
    And,
    Or,
}

impl ExprType {
    /// Normalize a combinator name; unknown names are `Unspecified`
    pub fn normalize(s: &str) -> Self {
        match s.trim().to_ascii_uppercase().as_str() {
            "AND" => Self::And,
            "OR" => Self::Or,
            _ => Self::Unspecified,
        }
    }

    pub fn from_number(n: i64) -> Self {
        match n {
            1 => Self::And,
            2 => Self::Or,
            _ => Self::Unspecified,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Unspecified => "EXPR_TYPE_UNSPECIFIED",
            Self::And => "AND",
            Self::Or => "OR",
        }
    }
}

impl fmt::Display for ExprType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for ExprType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for ExprType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(EnumVisitor::new(
            "expression type",
            Self::normalize,
            Self::from_number,
        ))
    }
}

/// Leaf predicate: one field, one operator, one value or value list
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Condition {
    pub field: String,
    pub op: Operator,
    #[serde(
        deserialize_with = "deserialize_scalar_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub value: Option<String>,
    #[serde(
        deserialize_with = "deserialize_text_list",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub values: Vec<String>,
}

impl Condition {
    pub fn new(field: impl Into<String>, op: Operator, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            op,
            value: Some(value.into()),
            values: Vec::new(),
        }
    }

    pub fn with_values<I, S>(field: impl Into<String>, op: Operator, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            field: field.into(),
            op,
            value: None,
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// Scalar value, empty when absent
    pub fn value_str(&self) -> &str {
        self.value.as_deref().unwrap_or("")
    }
}

/// Filter tree node combining its own conditions with nested groups
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterExpr {
    #[serde(rename = "type")]
    pub expr_type: ExprType,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<FilterExpr>,
}

impl FilterExpr {
    pub fn and(conditions: Vec<Condition>) -> Self {
        Self {
            expr_type: ExprType::And,
            conditions,
            groups: Vec::new(),
        }
    }

    pub fn or(conditions: Vec<Condition>) -> Self {
        Self {
            expr_type: ExprType::Or,
            conditions,
            groups: Vec::new(),
        }
    }

    pub fn with_group(mut self, group: FilterExpr) -> Self {
        self.groups.push(group);
        self
    }

    /// Nesting depth, 1 for a node without groups
    pub fn depth(&self) -> usize {
        1 + self.groups.iter().map(|g| g.depth()).max().unwrap_or(0)
    }

    /// Total number of leaf conditions in the tree
    pub fn condition_count(&self) -> usize {
        self.conditions.len()
            + self
                .groups
                .iter()
                .map(|g| g.condition_count())
                .sum::<usize>()
    }
}

/// Accept strings, numbers and booleans as condition text
fn deserialize_scalar_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(value_to_text))
}

fn deserialize_text_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let values = Option::<Vec<Value>>::deserialize(deserializer)?;
    Ok(values
        .unwrap_or_default()
        .iter()
        .filter_map(value_to_text)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_nested_expr() {
        let json = r#"{
            "type": "AND",
            "conditions": [{"field": "age", "op": "GTE", "value": "18"}],
            "groups": [{
                "type": "OR",
                "conditions": [
                    {"field": "status", "op": "eq", "value": "active"},
                    {"field": "role", "op": "in", "values": ["admin", "owner"]}
                ]
            }]
        }"#;
        let expr: FilterExpr = serde_json::from_str(json).unwrap();
        assert_eq!(expr.expr_type, ExprType::And);
        assert_eq!(expr.conditions[0].op, Operator::Gte);
        assert_eq!(expr.groups[0].expr_type, ExprType::Or);
        assert_eq!(expr.groups[0].conditions[1].values, vec!["admin", "owner"]);
        assert_eq!(expr.depth(), 2);
        assert_eq!(expr.condition_count(), 3);
    }

    #[test]
    fn test_deserialize_numeric_enums_and_scalars() {
        let json = r#"{"type": 2, "conditions": [{"field": "n", "op": 3, "value": 5}]}"#;
        let expr: FilterExpr = serde_json::from_str(json).unwrap();
        assert_eq!(expr.expr_type, ExprType::Or);
        assert_eq!(expr.conditions[0].op, Operator::Gt);
        assert_eq!(expr.conditions[0].value.as_deref(), Some("5"));
    }

    #[test]
    fn test_deserialize_unknown_type_is_unspecified() {
        let expr: FilterExpr = serde_json::from_str(r#"{"type": "XOR"}"#).unwrap();
        assert_eq!(expr.expr_type, ExprType::Unspecified);
        let expr: FilterExpr = serde_json::from_str("{}").unwrap();
        assert_eq!(expr.expr_type, ExprType::Unspecified);
    }

    #[test]
    fn test_null_value_is_absent() {
        let cond: Condition =
            serde_json::from_str(r#"{"field": "x", "op": "IS_NULL", "value": null}"#).unwrap();
        assert_eq!(cond.value, None);
        assert_eq!(cond.value_str(), "");
    }

    #[test]
    fn test_serialize_skips_empty() {
        let expr = FilterExpr::and(vec![Condition::new("a", Operator::Eq, "1")]);
        let json = serde_json::to_string(&expr).unwrap();
        assert_eq!(
            json,
            r#"{"type":"AND","conditions":[{"field":"a","op":"EQ","value":"1"}]}"#
        );
    }
}
