//! InfluxQL SELECT builder

use serde_json::{Map, Value};

use super::quote_ident;
use crate::backend::QueryBuilder;
use crate::backend::fragment::{Fragment, QueryParam};
use crate::sorting::SortKey;

/// Only column InfluxQL can order by
pub const TIME_COLUMN: &str = "time";

/// InfluxQL query under construction
#[derive(Debug, Clone)]
pub struct InfluxQuery {
    measurement: String,
    fields: Vec<String>,
    conditions: Vec<Fragment>,
    order_by: Vec<String>,
    limit: Option<u64>,
    offset: Option<u64>,
}

impl InfluxQuery {
    pub fn new(measurement: impl Into<String>) -> Self {
        Self {
            measurement: measurement.into(),
            fields: Vec::new(),
            conditions: Vec::new(),
            order_by: Vec::new(),
            limit: None,
            offset: None,
        }
    }

    pub fn conditions(&self) -> &[Fragment] {
        &self.conditions
    }

    fn placeholder(index: usize) -> String {
        format!("$p{}", index)
    }

    /// Statement text and the bind parameter map (`{"p1": ...}`)
    pub fn build(&self) -> (String, Map<String, Value>) {
        let fields = if self.fields.is_empty() {
            "*".to_string()
        } else {
            self.fields.join(", ")
        };
        let mut sql = format!("SELECT {} FROM {}", fields, quote_ident(&self.measurement));
        let mut params: Vec<QueryParam> = Vec::new();
        self.append_where(&mut sql, &mut params);

        if !self.order_by.is_empty() {
            sql.push_str(" ORDER BY ");
            sql.push_str(&self.order_by.join(", "));
        }
        if let Some(limit) = self.limit {
            sql.push_str(&format!(" LIMIT {}", limit));
        }
        if let Some(offset) = self.offset.filter(|o| *o > 0) {
            sql.push_str(&format!(" OFFSET {}", offset));
        }

        (sql, Self::param_map(&params))
    }

    /// COUNT statement over the same conditions
    pub fn build_count(&self) -> (String, Map<String, Value>) {
        let mut sql = format!("SELECT COUNT(*) FROM {}", quote_ident(&self.measurement));
        let mut params = Vec::new();
        self.append_where(&mut sql, &mut params);
        (sql, Self::param_map(&params))
    }

    fn append_where(&self, sql: &mut String, params: &mut Vec<QueryParam>) {
        if self.conditions.is_empty() {
            return;
        }
        sql.push_str(" WHERE ");
        for (i, condition) in self.conditions.iter().enumerate() {
            if i > 0 {
                sql.push_str(" AND ");
            }
            condition.render_into(sql, params, &Self::placeholder);
        }
    }

    fn param_map(params: &[QueryParam]) -> Map<String, Value> {
        params
            .iter()
            .enumerate()
            .map(|(i, p)| (format!("p{}", i + 1), p.to_json()))
            .collect()
    }
}

impl QueryBuilder for InfluxQuery {
    type Fragment = Fragment;

    fn push_filter(&mut self, fragment: Fragment) {
        if !fragment.is_empty() {
            self.conditions.push(fragment);
        }
    }

    fn push_sort(&mut self, key: &SortKey) -> bool {
        if key.field != TIME_COLUMN {
            tracing::warn!(field = %key.field, "Dropping sort key: InfluxQL only orders by time");
            return false;
        }
        self.order_by
            .push(format!("{} {}", TIME_COLUMN, key.direction.as_str()));
        true
    }

    fn set_limit(&mut self, limit: u64) {
        self.limit = Some(limit);
    }

    fn set_offset(&mut self, offset: u64) {
        self.offset = Some(offset);
    }

    fn set_cursor(&mut self, field: &str, last_id: i64) {
        self.conditions.push(
            Fragment::text(format!("{} > ", quote_ident(field))).param(QueryParam::Int(last_id)),
        );
    }

    fn select(&mut self, fields: &[String]) {
        self.fields = fields.iter().map(|f| quote_ident(f)).collect();
    }
}
