//! Paging request envelope
//!
//! One request carries filters (structured or query-string), projection,
//! sorting and at most one pagination mode.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::filter::FilterExpr;
use crate::error::{CompileError, Result};

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    /// Parse a direction keyword (`asc`, `DESC`, ...)
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Some(Self::Asc),
            "desc" | "descending" => Some(Self::Desc),
            _ => None,
        }
    }

    pub fn is_desc(&self) -> bool {
        matches!(self, Self::Desc)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

impl Serialize for SortOrder {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for SortOrder {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(match value {
            Value::String(s) => Self::parse(&s).unwrap_or_default(),
            Value::Number(n) if n.as_i64() == Some(1) => Self::Desc,
            _ => Self::Asc,
        })
    }
}

/// Structured sort entry
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Sorting {
    pub field: String,
    pub order: SortOrder,
}

impl Sorting {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            order: SortOrder::Asc,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            order: SortOrder::Desc,
        }
    }
}

/// Paging request as received from a client
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PagingRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    pub no_paging: bool,

    /// Query-string AND group
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    /// Query-string OR group
    #[serde(skip_serializing_if = "Option::is_none")]
    pub or_query: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter_expr: Option<FilterExpr>,

    /// Flat sort list (`-field` for descending)
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub order_by: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sorting: Vec<Sorting>,

    #[serde(
        deserialize_with = "deserialize_field_mask",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub field_mask: Vec<String>,
}

impl PagingRequest {
    /// Decode a request from JSON text
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| CompileError::InvalidRequest(e.to_string()))
    }

    /// Whether a query-string filter is present
    pub fn has_query_string(&self) -> bool {
        let present = |s: &Option<String>| s.as_deref().is_some_and(|s| !s.trim().is_empty());
        present(&self.query) || present(&self.or_query)
    }
}

/// Accept a protobuf-JSON field mask (`"a,b"`) or a plain list
fn deserialize_field_mask<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    let paths = match value {
        Some(Value::String(s)) => s.split(',').map(|p| p.trim().to_string()).collect(),
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|v| v.as_str().map(|s| s.trim().to_string()))
            .collect(),
        Some(Value::Object(mut map)) => match map.remove("paths") {
            Some(Value::Array(items)) => items
                .into_iter()
                .filter_map(|v| v.as_str().map(|s| s.trim().to_string()))
                .collect(),
            _ => Vec::new(),
        },
        _ => Vec::new(),
    };
    Ok(paths.into_iter().filter(|p: &String| !p.is_empty()).collect())
}
