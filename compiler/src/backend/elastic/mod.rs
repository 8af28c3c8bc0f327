//! Elasticsearch query DSL
//!
//! Fragments are query clauses (`serde_json::Value`); the builder wraps them
//! in a `bool` filter and adds sort, paging and `_source` selection.

mod builder;
mod processor;

pub use builder::EsQuery;
pub use processor::EsProcessor;

use serde_json::Value;

use crate::backend::doc;

/// `{"bool": {occur: [clauses]}}`
pub(crate) fn bool_query(occur: &str, clauses: Vec<Value>) -> Value {
    doc("bool", doc(occur, Value::Array(clauses)))
}
