//! Search request body builder

use serde_json::{Map, Value, json};

use super::bool_query;
use crate::backend::{QueryBuilder, doc};
use crate::sorting::SortKey;

/// Elasticsearch search body under construction
#[derive(Debug, Clone, Default)]
pub struct EsQuery {
    index: String,
    filters: Vec<Value>,
    sort: Vec<Value>,
    source: Vec<String>,
    from: Option<u64>,
    size: Option<u64>,
}

impl EsQuery {
    pub fn new(index: impl Into<String>) -> Self {
        Self {
            index: index.into(),
            ..Default::default()
        }
    }

    pub fn index(&self) -> &str {
        &self.index
    }

    /// Query clause, `match_all` when unfiltered
    pub fn query(&self) -> Value {
        if self.filters.is_empty() {
            json!({ "match_all": {} })
        } else {
            bool_query("filter", self.filters.clone())
        }
    }

    /// `_search` request body
    pub fn build(&self) -> Value {
        let mut body = Map::new();
        body.insert("query".into(), self.query());
        if !self.sort.is_empty() {
            body.insert("sort".into(), Value::Array(self.sort.clone()));
        }
        if let Some(from) = self.from.filter(|f| *f > 0) {
            body.insert("from".into(), json!(from));
        }
        if let Some(size) = self.size {
            body.insert("size".into(), json!(size));
        }
        if !self.source.is_empty() {
            body.insert("_source".into(), json!(self.source));
        }
        Value::Object(body)
    }

    /// `_count` request body over the same query
    pub fn build_count(&self) -> Value {
        json!({ "query": self.query() })
    }
}

impl QueryBuilder for EsQuery {
    type Fragment = Value;

    fn push_filter(&mut self, fragment: Value) {
        if fragment.as_object().is_some_and(|o| !o.is_empty()) {
            self.filters.push(fragment);
        }
    }

    fn push_sort(&mut self, key: &SortKey) -> bool {
        let order = if key.is_desc() { "desc" } else { "asc" };
        self.sort.push(doc(key.field.clone(), json!({ "order": order })));
        true
    }

    fn set_limit(&mut self, limit: u64) {
        self.size = Some(limit);
    }

    fn set_offset(&mut self, offset: u64) {
        self.from = Some(offset);
    }

    fn set_cursor(&mut self, field: &str, last_id: i64) {
        self.filters
            .push(json!({ "range": doc(field, json!({ "gt": last_id })) }));
    }

    fn select(&mut self, fields: &[String]) {
        self.source = fields.to_vec();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SortOrder;

    #[test]
    fn test_empty_is_match_all() {
        let q = EsQuery::new("logs");
        assert_eq!(q.index(), "logs");
        assert_eq!(q.build(), json!({ "query": { "match_all": {} } }));
    }

    #[test]
    fn test_build_full_body() {
        let mut q = EsQuery::new("logs");
        q.push_filter(json!({ "term": { "level": "error" } }));
        q.push_filter(json!({}));
        q.push_sort(&SortKey::new("ts", SortOrder::Desc).unwrap());
        q.set_limit(20);
        q.set_offset(40);
        q.select(&["ts".to_string(), "msg".to_string()]);
        assert_eq!(
            q.build(),
            json!({
                "query": { "bool": { "filter": [{ "term": { "level": "error" } }] } },
                "sort": [{ "ts": { "order": "desc" } }],
                "from": 40,
                "size": 20,
                "_source": ["ts", "msg"]
            })
        );
    }

    #[test]
    fn test_cursor_and_count() {
        let mut q = EsQuery::new("logs");
        q.set_cursor("id", 99);
        assert_eq!(
            q.build_count(),
            json!({ "query": { "bool": { "filter": [{ "range": { "id": { "gt": 99 } } }] } } })
        );
    }
}
