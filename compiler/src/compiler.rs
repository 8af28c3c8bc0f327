//! Request compiler
//!
//! Applies every part of a `PagingRequest` to one builder handle: filter,
//! projection, sort, then paging. Nothing is executed; the caller runs the
//! resulting query and may feed the total back into the returned paginator.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::backend::elastic::{EsProcessor, EsQuery};
use crate::backend::influx::{InfluxProcessor, InfluxQuery};
use crate::backend::mongo::{MongoProcessor, MongoQuery};
use crate::backend::sql::{Dialect, SqlProcessor, SqlQuery};
use crate::backend::{BackendKind, QueryBuilder, QueryParam};
use crate::core::config::CompilerConfig;
use crate::error::Result;
use crate::filter::field::normalize_path;
use crate::filter::processor::Processor;
use crate::filter::query_string::QueryStringFilter;
use crate::filter::structured::StructuredFilter;
use crate::pagination::{
    OffsetPaginator, PageInfo, PagePaginator, Pagination, Paginator, TokenPaginator,
};
use crate::sorting::{SortKey, apply_sort, build_sort, build_sort_with_default, build_structured_sort};
use crate::types::PagingRequest;

/// Compiles paging requests with a fixed configuration
#[derive(Debug, Clone, Default)]
pub struct QueryCompiler {
    config: CompilerConfig,
}

impl QueryCompiler {
    pub fn new(config: CompilerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    /// Apply the whole request to `builder`; returns the paginator used,
    /// `None` when paging is off or not requested
    pub fn compile<P: Processor + ?Sized>(
        &self,
        processor: &P,
        request: &PagingRequest,
        builder: &mut P::Builder,
    ) -> Result<Option<Pagination>> {
        tracing::debug!(backend = processor.name(), "Compiling request");

        self.apply_filter(processor, request, builder)?;

        let fields = self.projection(&request.field_mask);
        if !fields.is_empty() {
            builder.select(&fields);
        }

        let keys = self.sort_keys(request);
        let applied = apply_sort(builder, &keys);
        if applied < keys.len() {
            tracing::debug!(
                requested = keys.len(),
                applied,
                backend = processor.name(),
                "Backend rejected some sort keys"
            );
        }

        let pagination = self.pagination(request);
        if let Some(pagination) = &pagination {
            pagination.apply(builder, &self.config.cursor_field);
            tracing::trace!(mode = %pagination.mode(), limit = pagination.limit(), "Applied paging");
        }
        Ok(pagination)
    }

    /// Query-string filters take precedence over `filter_expr`
    pub fn apply_filter<P: Processor + ?Sized>(
        &self,
        processor: &P,
        request: &PagingRequest,
        builder: &mut P::Builder,
    ) -> Result<bool> {
        if request.has_query_string() {
            if request.filter_expr.is_some() {
                tracing::debug!("Ignoring filter_expr: query-string filter present");
            }
            return QueryStringFilter::new(
                self.config.max_filter_json_size,
                self.config.max_conditions,
            )
            .apply(
                processor,
                builder,
                request.query.as_deref(),
                request.or_query.as_deref(),
            );
        }
        StructuredFilter::new(self.config.max_filter_depth, self.config.max_conditions).apply(
            processor,
            builder,
            request.filter_expr.as_ref(),
        )
    }

    /// Validated, snake_cased projection paths
    pub fn projection(&self, field_mask: &[String]) -> Vec<String> {
        field_mask
            .iter()
            .filter_map(|path| {
                let normalized = normalize_path(path);
                if normalized.is_none() {
                    tracing::warn!(path = %path, "Dropping projection path: invalid field");
                }
                normalized
            })
            .collect()
    }

    /// `sorting` over `order_by`, then the configured default
    pub fn sort_keys(&self, request: &PagingRequest) -> Vec<SortKey> {
        let keys = if !request.sorting.is_empty() {
            build_structured_sort(&request.sorting)
        } else {
            build_sort(&request.order_by)
        };
        build_sort_with_default(
            keys,
            self.config.default_sort_field.as_deref(),
            self.config.default_sort_desc,
        )
    }

    /// Select the paginator for a request.
    ///
    /// `page` selects page mode, a non-blank `token` token mode, a bare
    /// `page_size` page mode, and `offset`/`limit` offset mode.
    pub fn pagination(&self, request: &PagingRequest) -> Option<Pagination> {
        if request.no_paging {
            return None;
        }
        let size = self.page_size(request.page_size);
        let has_token = request.token.as_deref().is_some_and(|t| !t.trim().is_empty());

        if request.page.is_some() || (request.page_size.is_some() && !has_token) {
            let page = request.page.unwrap_or(self.config.default_page as i64);
            return Some(Pagination::Page(PagePaginator::new(page, size)));
        }
        if has_token {
            return Some(Pagination::Token(TokenPaginator::new(
                request.token.as_deref(),
                size,
            )));
        }
        if request.offset.is_some() || request.limit.is_some() {
            let offset = request.offset.unwrap_or(self.config.default_offset as i64);
            let limit = self.page_size(request.limit);
            return Some(Pagination::Offset(OffsetPaginator::new(offset, limit)));
        }
        None
    }

    fn page_size(&self, requested: Option<i64>) -> i64 {
        let size = requested
            .filter(|s| *s > 0)
            .map(|s| s as u64)
            .unwrap_or(self.config.default_page_size);
        self.config.clamp_page_size(size) as i64
    }

    /// Compile a request for a backend and render the native query
    pub fn compile_for(
        &self,
        backend: BackendKind,
        table: &str,
        request: &PagingRequest,
    ) -> Result<CompiledQuery> {
        let (query, pagination) = match backend {
            BackendKind::Mongo => {
                let mut builder = MongoQuery::new(table);
                let pagination = self.compile(&MongoProcessor::new(), request, &mut builder)?;
                let query = NativeQuery::Mongo {
                    find: builder.build(),
                    count: builder.build_count(),
                };
                (query, pagination)
            }
            BackendKind::Influx => {
                let mut builder = InfluxQuery::new(table);
                let pagination = self.compile(&InfluxProcessor::new(), request, &mut builder)?;
                let (query, params) = builder.build();
                let (count_query, count_params) = builder.build_count();
                let query = NativeQuery::Influx {
                    query,
                    params,
                    count_query,
                    count_params,
                };
                (query, pagination)
            }
            BackendKind::Elastic => {
                let mut builder = EsQuery::new(table);
                let pagination = self.compile(&EsProcessor::new(), request, &mut builder)?;
                let query = NativeQuery::Elastic {
                    index: builder.index().to_string(),
                    body: builder.build(),
                    count: builder.build_count(),
                };
                (query, pagination)
            }
            sql => {
                let dialect = sql.sql_dialect().unwrap_or(Dialect::Postgres);
                let mut builder = SqlQuery::new(dialect, table);
                let pagination = self.compile(&SqlProcessor::new(dialect), request, &mut builder)?;
                let (sql, params) = builder.build();
                let (count_sql, count_params) = builder.build_count();
                let query = NativeQuery::Sql {
                    dialect: dialect.name(),
                    sql,
                    params,
                    count_sql,
                    count_params,
                };
                (query, pagination)
            }
        };
        Ok(CompiledQuery {
            backend,
            query,
            page: pagination.map(|p| p.info()),
        })
    }
}

/// Rendered native query
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum NativeQuery {
    Sql {
        dialect: &'static str,
        sql: String,
        params: Vec<QueryParam>,
        count_sql: String,
        count_params: Vec<QueryParam>,
    },
    Mongo {
        find: Value,
        count: Value,
    },
    Influx {
        query: String,
        params: Map<String, Value>,
        count_query: String,
        count_params: Map<String, Value>,
    },
    Elastic {
        index: String,
        body: Value,
        count: Value,
    },
}

/// Result of `QueryCompiler::compile_for`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompiledQuery {
    pub backend: BackendKind,
    pub query: NativeQuery,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<PageInfo>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pagination::PaginationMode;
    use crate::types::{Condition, FilterExpr, Operator, Sorting};

    fn request(json: &str) -> PagingRequest {
        PagingRequest::from_json(json).unwrap()
    }

    #[test]
    fn test_pagination_selection() {
        let c = QueryCompiler::default();
        let mode = |json: &str| c.pagination(&request(json)).map(|p| p.mode());
        assert_eq!(mode(r#"{"page": 2, "page_size": 5}"#), Some(PaginationMode::Page));
        assert_eq!(mode(r#"{"page_size": 5}"#), Some(PaginationMode::Page));
        assert_eq!(mode(r#"{"offset": 5}"#), Some(PaginationMode::Offset));
        assert_eq!(mode(r#"{"token": "abc", "page_size": 5}"#), Some(PaginationMode::Token));
        assert_eq!(mode(r#"{"token": " "}"#), None);
        assert_eq!(mode(r#"{"page": 1, "no_paging": true}"#), None);
        assert_eq!(mode("{}"), None);
    }

    #[test]
    fn test_page_size_defaults_and_clamp() {
        let config = CompilerConfig {
            max_page_size: 50,
            ..Default::default()
        };
        let c = QueryCompiler::new(config);
        let p = c.pagination(&request(r#"{"page": 1}"#)).unwrap();
        assert_eq!(p.limit(), 10);
        let p = c.pagination(&request(r#"{"page": 1, "page_size": 500}"#)).unwrap();
        assert_eq!(p.limit(), 50);
        let p = c.pagination(&request(r#"{"offset": 20, "limit": -1}"#)).unwrap();
        assert_eq!((p.offset(), p.limit()), (20, 10));
    }

    #[test]
    fn test_query_string_takes_precedence() {
        let c = QueryCompiler::default();
        let mut req = PagingRequest {
            query: Some(r#"{"name": "alice"}"#.to_string()),
            filter_expr: Some(FilterExpr::and(vec![Condition::new("age", Operator::Gt, "1")])),
            ..Default::default()
        };
        let mut q = SqlQuery::new(Dialect::Sqlite, "users");
        c.compile(&SqlProcessor::new(Dialect::Sqlite), &req, &mut q).unwrap();
        assert_eq!(q.build().0, "SELECT * FROM users WHERE name = ?");

        req.query = None;
        let mut q = SqlQuery::new(Dialect::Sqlite, "users");
        c.compile(&SqlProcessor::new(Dialect::Sqlite), &req, &mut q).unwrap();
        assert_eq!(q.build().0, "SELECT * FROM users WHERE age > ?");
    }

    #[test]
    fn test_sorting_precedence_and_default() {
        let config = CompilerConfig {
            default_sort_field: Some("created_at".to_string()),
            default_sort_desc: true,
            ..Default::default()
        };
        let c = QueryCompiler::new(config);
        let req = PagingRequest {
            sorting: vec![Sorting::asc("name")],
            order_by: vec!["-age".to_string()],
            ..Default::default()
        };
        let keys: Vec<String> = c.sort_keys(&req).iter().map(|k| k.to_sql()).collect();
        assert_eq!(keys, vec!["name ASC"]);

        let keys: Vec<String> = c
            .sort_keys(&PagingRequest::default())
            .iter()
            .map(|k| k.to_sql())
            .collect();
        assert_eq!(keys, vec!["created_at DESC"]);
    }

    #[test]
    fn test_projection_drops_invalid() {
        let c = QueryCompiler::default();
        let fields = c.projection(&["userName".into(), "meta.title".into(), "x;y".into()]);
        assert_eq!(fields, vec!["user_name", "meta.title"]);
    }

    #[test]
    fn test_compile_for_sql() {
        let c = QueryCompiler::default();
        let req = request(
            r#"{"query": "{\"age__gte\": 18}", "order_by": ["-id"], "page": 2, "page_size": 20}"#,
        );
        let compiled = c.compile_for(BackendKind::Postgres, "users", &req).unwrap();
        match &compiled.query {
            NativeQuery::Sql {
                sql,
                params,
                count_sql,
                ..
            } => {
                assert_eq!(
                    sql,
                    "SELECT * FROM users WHERE age >= $1 ORDER BY id DESC LIMIT 20 OFFSET 20"
                );
                assert_eq!(params, &vec![QueryParam::text("18")]);
                assert_eq!(count_sql, "SELECT COUNT(*) FROM users WHERE age >= $1");
            }
            other => panic!("unexpected query: {:?}", other),
        }
        let page = compiled.page.unwrap();
        assert_eq!(page.page, 2);
        assert_eq!(page.size, 20);
    }

    #[test]
    fn test_structural_error_propagates() {
        let c = QueryCompiler::default();
        let req = request(r#"{"query": "[1]"}"#);
        assert!(c.compile_for(BackendKind::Mongo, "users", &req).is_err());
    }
}
