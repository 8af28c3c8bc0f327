//! SELECT statement builder
//!
//! Collects filter fragments, projection, sort and paging and renders them
//! as one parameterized statement with dialect placeholders.

use super::Dialect;
use crate::backend::QueryBuilder;
use crate::backend::fragment::{Fragment, QueryParam};
use crate::sorting::SortKey;

/// SQL query under construction
#[derive(Debug, Clone)]
pub struct SqlQuery {
    dialect: Dialect,
    table: String,
    columns: Vec<String>,
    conditions: Vec<Fragment>,
    order_by: Vec<String>,
    limit: Option<u64>,
    offset: Option<u64>,
}

impl SqlQuery {
    /// Start a query against `table`.
    ///
    /// The table name is written into the statement as given; it must come
    /// from trusted configuration, not from the request.
    pub fn new(dialect: Dialect, table: impl Into<String>) -> Self {
        Self {
            dialect,
            table: table.into(),
            columns: Vec::new(),
            conditions: Vec::new(),
            order_by: Vec::new(),
            limit: None,
            offset: None,
        }
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn conditions(&self) -> &[Fragment] {
        &self.conditions
    }

    pub fn order_by(&self) -> &[String] {
        &self.order_by
    }

    pub fn limit(&self) -> Option<u64> {
        self.limit
    }

    pub fn offset(&self) -> Option<u64> {
        self.offset
    }

    /// Conditions joined with AND, without the WHERE keyword
    pub fn where_clause(&self) -> (String, Vec<QueryParam>) {
        let mut sql = String::new();
        let mut params = Vec::new();
        self.render_where(&mut sql, &mut params);
        (sql, params)
    }

    /// Full SELECT statement with bound parameters
    pub fn build(&self) -> (String, Vec<QueryParam>) {
        let columns = if self.columns.is_empty() {
            "*".to_string()
        } else {
            self.columns.join(", ")
        };
        let mut sql = format!("SELECT {} FROM {}", columns, self.table);
        let mut params = Vec::new();
        self.append_where(&mut sql, &mut params);

        if !self.order_by.is_empty() {
            sql.push_str(" ORDER BY ");
            sql.push_str(&self.order_by.join(", "));
        }

        let paging = self.dialect.dialect().limit_offset(self.limit, self.offset);
        if !paging.is_empty() {
            sql.push(' ');
            sql.push_str(&paging);
        }
        (sql, params)
    }

    /// COUNT statement over the same filters, ignoring sort and paging
    pub fn build_count(&self) -> (String, Vec<QueryParam>) {
        let mut sql = format!("SELECT COUNT(*) FROM {}", self.table);
        let mut params = Vec::new();
        self.append_where(&mut sql, &mut params);
        (sql, params)
    }

    fn append_where(&self, sql: &mut String, params: &mut Vec<QueryParam>) {
        if !self.conditions.is_empty() {
            sql.push_str(" WHERE ");
            self.render_where(sql, params);
        }
    }

    fn render_where(&self, sql: &mut String, params: &mut Vec<QueryParam>) {
        let dialect = self.dialect.dialect();
        let placeholder = |i: usize| dialect.placeholder(i);
        for (i, condition) in self.conditions.iter().enumerate() {
            if i > 0 {
                sql.push_str(" AND ");
            }
            condition.render_into(sql, params, &placeholder);
        }
    }
}

impl QueryBuilder for SqlQuery {
    type Fragment = Fragment;

    fn push_filter(&mut self, fragment: Fragment) {
        if !fragment.is_empty() {
            self.conditions.push(fragment);
        }
    }

    fn push_sort(&mut self, key: &SortKey) -> bool {
        let column = match key.field.split_once('.') {
            Some((container, path)) => {
                let path: Vec<&str> = path.split('.').collect();
                self.dialect.dialect().json_extract(container, &path)
            }
            None => key.field.clone(),
        };
        self.order_by
            .push(format!("{} {}", column, key.direction.as_str()));
        true
    }

    fn set_limit(&mut self, limit: u64) {
        self.limit = Some(limit);
    }

    fn set_offset(&mut self, offset: u64) {
        self.offset = Some(offset);
    }

    fn set_cursor(&mut self, field: &str, last_id: i64) {
        self.conditions
            .push(Fragment::text(format!("{} > ", field)).param(QueryParam::Int(last_id)));
    }

    fn select(&mut self, fields: &[String]) {
        let dialect = self.dialect.dialect();
        self.columns = fields
            .iter()
            .map(|f| match f.split_once('.') {
                Some((container, path)) => {
                    let segments: Vec<&str> = path.split('.').collect();
                    format!(
                        "{} AS {}",
                        dialect.json_extract(container, &segments),
                        f.replace('.', "_")
                    )
                }
                None => f.clone(),
            })
            .collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SortOrder;

    fn eq(col: &str, v: &str) -> Fragment {
        Fragment::text(format!("{} = ", col)).param(QueryParam::text(v))
    }

    #[test]
    fn test_build_empty() {
        let q = SqlQuery::new(Dialect::Postgres, "users");
        assert_eq!(q.build(), ("SELECT * FROM users".to_string(), vec![]));
    }

    #[test]
    fn test_build_postgres_numbers_placeholders() {
        let mut q = SqlQuery::new(Dialect::Postgres, "users");
        q.push_filter(eq("name", "alice"));
        q.push_filter(eq("role", "admin"));
        q.set_cursor("id", 42);
        q.push_sort(&SortKey::new("created_at", SortOrder::Desc).unwrap());
        q.set_limit(10);
        let (sql, params) = q.build();
        assert_eq!(
            sql,
            "SELECT * FROM users WHERE name = $1 AND role = $2 AND id > $3 \
             ORDER BY created_at DESC LIMIT 10"
        );
        assert_eq!(
            params,
            vec![
                QueryParam::text("alice"),
                QueryParam::text("admin"),
                QueryParam::Int(42)
            ]
        );
    }

    #[test]
    fn test_build_mysql_with_offset_and_select() {
        let mut q = SqlQuery::new(Dialect::Mysql, "users");
        q.select(&["id".to_string(), "prefs.theme".to_string()]);
        q.push_filter(eq("name", "bob"));
        q.set_limit(20);
        q.set_offset(40);
        let (sql, _) = q.build();
        assert_eq!(
            sql,
            "SELECT id, JSON_UNQUOTE(JSON_EXTRACT(prefs, '$.theme')) AS prefs_theme \
             FROM users WHERE name = ? LIMIT 20 OFFSET 40"
        );
    }

    #[test]
    fn test_build_count_ignores_paging() {
        let mut q = SqlQuery::new(Dialect::Sqlite, "events");
        q.push_filter(eq("kind", "click"));
        q.set_limit(5);
        q.push_sort(&SortKey::new("id", SortOrder::Asc).unwrap());
        let (sql, params) = q.build_count();
        assert_eq!(sql, "SELECT COUNT(*) FROM events WHERE kind = ?");
        assert_eq!(params.len(), 1);
    }

    #[test]
    fn test_sort_on_json_path() {
        let mut q = SqlQuery::new(Dialect::Postgres, "t");
        q.push_sort(&SortKey::new("meta.rank", SortOrder::Asc).unwrap());
        assert_eq!(q.order_by(), &["meta ->> 'rank' ASC".to_string()]);
    }

    #[test]
    fn test_where_clause() {
        let mut q = SqlQuery::new(Dialect::Postgres, "t");
        assert_eq!(q.where_clause().0, "");
        q.push_filter(eq("a", "1"));
        q.push_filter(Fragment::text("  "));
        assert_eq!(q.where_clause().0, "a = $1");
        assert_eq!(q.conditions().len(), 1);
    }
}
