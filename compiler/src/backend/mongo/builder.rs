//! `find` options builder

use serde_json::{Map, Value, json};

use crate::backend::{QueryBuilder, doc};
use crate::sorting::SortKey;

/// MongoDB find request under construction
#[derive(Debug, Clone, Default)]
pub struct MongoQuery {
    collection: String,
    filters: Vec<Value>,
    projection: Map<String, Value>,
    sort: Map<String, Value>,
    skip: Option<u64>,
    limit: Option<u64>,
}

impl MongoQuery {
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            ..Default::default()
        }
    }

    /// Combined filter document, `{}` when unfiltered
    pub fn filter(&self) -> Value {
        match self.filters.as_slice() {
            [] => json!({}),
            [single] => single.clone(),
            many => json!({ "$and": many }),
        }
    }

    /// `find` command document
    pub fn build(&self) -> Value {
        let mut doc = Map::new();
        doc.insert("find".into(), Value::String(self.collection.clone()));
        doc.insert("filter".into(), self.filter());
        if !self.projection.is_empty() {
            doc.insert("projection".into(), Value::Object(self.projection.clone()));
        }
        if !self.sort.is_empty() {
            doc.insert("sort".into(), Value::Object(self.sort.clone()));
        }
        if let Some(skip) = self.skip.filter(|s| *s > 0) {
            doc.insert("skip".into(), json!(skip));
        }
        if let Some(limit) = self.limit {
            doc.insert("limit".into(), json!(limit));
        }
        Value::Object(doc)
    }

    /// `count` command document over the same filter
    pub fn build_count(&self) -> Value {
        json!({ "count": self.collection, "query": self.filter() })
    }
}

impl QueryBuilder for MongoQuery {
    type Fragment = Value;

    fn push_filter(&mut self, fragment: Value) {
        if fragment.as_object().is_some_and(|o| !o.is_empty()) {
            self.filters.push(fragment);
        }
    }

    fn push_sort(&mut self, key: &SortKey) -> bool {
        let direction = if key.is_desc() { -1 } else { 1 };
        self.sort.insert(key.field.clone(), json!(direction));
        true
    }

    fn set_limit(&mut self, limit: u64) {
        self.limit = Some(limit);
    }

    fn set_offset(&mut self, offset: u64) {
        self.skip = Some(offset);
    }

    fn set_cursor(&mut self, field: &str, last_id: i64) {
        self.filters.push(doc(field, json!({ "$gt": last_id })));
    }

    fn select(&mut self, fields: &[String]) {
        self.projection = fields.iter().map(|f| (f.clone(), json!(1))).collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SortOrder;

    #[test]
    fn test_filter_combination() {
        let mut q = MongoQuery::new("users");
        assert_eq!(q.filter(), json!({}));
        q.push_filter(json!({"a": 1}));
        assert_eq!(q.filter(), json!({"a": 1}));
        q.push_filter(json!({}));
        q.push_filter(json!({"b": 2}));
        assert_eq!(q.filter(), json!({"$and": [{"a": 1}, {"b": 2}]}));
    }

    #[test]
    fn test_build_find_document() {
        let mut q = MongoQuery::new("users");
        q.push_filter(json!({"status": "active"}));
        q.select(&["name".to_string(), "email".to_string()]);
        q.push_sort(&SortKey::new("created_at", SortOrder::Desc).unwrap());
        q.push_sort(&SortKey::new("name", SortOrder::Asc).unwrap());
        q.set_offset(20);
        q.set_limit(10);
        assert_eq!(
            q.build(),
            json!({
                "find": "users",
                "filter": {"status": "active"},
                "projection": {"name": 1, "email": 1},
                "sort": {"created_at": -1, "name": 1},
                "skip": 20,
                "limit": 10
            })
        );
        let built = q.build();
        let sort_keys: Vec<&String> = built["sort"].as_object().unwrap().keys().collect();
        assert_eq!(sort_keys, vec!["created_at", "name"]);
    }

    #[test]
    fn test_cursor_and_count() {
        let mut q = MongoQuery::new("events");
        q.set_cursor("id", 42);
        q.set_limit(10);
        assert_eq!(q.filter(), json!({"id": {"$gt": 42}}));
        assert_eq!(
            q.build_count(),
            json!({"count": "events", "query": {"id": {"$gt": 42}}})
        );
    }
}
