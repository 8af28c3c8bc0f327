use serde_json::{Value, json};

use crud_query::backend::QueryParam;
use crud_query::core::CompilerConfig;
use crud_query::pagination::TokenPaginator;
use crud_query::{BackendKind, NativeQuery, PaginationMode, PagingRequest, QueryCompiler};

fn compile(backend: BackendKind, table: &str, json: &str) -> crud_query::CompiledQuery {
    let request = PagingRequest::from_json(json).unwrap();
    QueryCompiler::default()
        .compile_for(backend, table, &request)
        .unwrap()
}

#[test]
fn test_postgres_date_part_and_page() {
    let compiled = compile(
        BackendKind::Postgres,
        "orders",
        r#"{
            "query": "{\"created_at__year__gt\": 2020, \"status__in\": [\"paid\", \"shipped\"]}",
            "sorting": [{"field": "createdAt", "order": "DESC"}],
            "field_mask": "id,total",
            "page": 3,
            "page_size": 25
        }"#,
    );
    let NativeQuery::Sql { sql, params, .. } = compiled.query else {
        panic!("expected sql");
    };
    assert_eq!(
        sql,
        "SELECT id, total FROM orders \
         WHERE (EXTRACT(YEAR FROM created_at) > $1 AND status IN ($2, $3)) \
         ORDER BY created_at DESC LIMIT 25 OFFSET 50"
    );
    assert_eq!(
        params,
        vec![
            QueryParam::Int(2020),
            QueryParam::text("paid"),
            QueryParam::text("shipped")
        ]
    );
    let page = compiled.page.unwrap();
    assert_eq!(page.mode, PaginationMode::Page);
    assert_eq!(page.offset, 50);
}

#[test]
fn test_sqlite_and_or_groups() {
    let compiled = compile(
        BackendKind::Sqlite,
        "users",
        r#"{
            "query": "{\"active\": true}",
            "or_query": "{\"role\": \"admin\", \"role__eq\": \"owner\"}"
        }"#,
    );
    let NativeQuery::Sql {
        sql,
        count_sql,
        count_params,
        ..
    } = compiled.query
    else {
        panic!("expected sql");
    };
    assert_eq!(
        sql,
        "SELECT * FROM users WHERE (active = ? AND (role = ? OR role = ?))"
    );
    assert_eq!(
        count_sql,
        "SELECT COUNT(*) FROM users WHERE (active = ? AND (role = ? OR role = ?))"
    );
    assert_eq!(count_params.len(), 3);
    assert!(compiled.page.is_none());
}

#[test]
fn test_mongo_find_and_count() {
    let compiled = compile(
        BackendKind::Mongo,
        "users",
        r#"{"query": "{\"age__gte\": 18}", "order_by": ["-created_at"], "page": 1, "page_size": 5}"#,
    );
    let NativeQuery::Mongo { find, count } = compiled.query else {
        panic!("expected mongo");
    };
    assert_eq!(
        find,
        json!({
            "find": "users",
            "filter": {"age": {"$gte": 18}},
            "sort": {"created_at": -1},
            "limit": 5
        })
    );
    assert_eq!(count, json!({"count": "users", "query": {"age": {"$gte": 18}}}));
}

#[test]
fn test_elastic_token_cursor() {
    let token = TokenPaginator::encode(42);
    let json = format!(
        r#"{{
            "filter_expr": {{"type": "AND", "conditions": [
                {{"field": "status", "op": "EQ", "value": "active"}}
            ]}},
            "token": "{}",
            "page_size": 20
        }}"#,
        token
    );
    let compiled = compile(BackendKind::Elastic, "logs", &json);
    let NativeQuery::Elastic { index, body, count } = compiled.query else {
        panic!("expected elastic");
    };
    assert_eq!(index, "logs");
    assert_eq!(
        body,
        json!({
            "query": {"bool": {"filter": [
                {"term": {"status": "active"}},
                {"range": {"id": {"gt": 42}}}
            ]}},
            "size": 20
        })
    );
    assert_eq!(count["query"], body["query"]);
    assert_eq!(compiled.page.unwrap().mode, PaginationMode::Token);
}

#[test]
fn test_influx_only_time_sort() {
    let compiled = compile(
        BackendKind::Influx,
        "cpu",
        r#"{"query": "{\"host\": \"web1\"}", "order_by": ["-time", "usage"], "offset": 20, "limit": 10}"#,
    );
    let NativeQuery::Influx { query, params, .. } = compiled.query else {
        panic!("expected influx");
    };
    assert_eq!(
        query,
        "SELECT * FROM \"cpu\" WHERE \"host\" = $p1 ORDER BY time DESC LIMIT 10 OFFSET 20"
    );
    assert_eq!(params.get("p1"), Some(&Value::from("web1")));
}

#[test]
fn test_config_limits_apply() {
    let config = CompilerConfig {
        max_conditions: 1,
        ..Default::default()
    };
    let request =
        PagingRequest::from_json(r#"{"query": "{\"a\": 1, \"b\": 2}"}"#).unwrap();
    let result = QueryCompiler::new(config).compile_for(BackendKind::Mysql, "t", &request);
    assert!(result.is_err());
}

#[test]
fn test_invalid_conditions_are_skipped() {
    let compiled = compile(
        BackendKind::Mysql,
        "users",
        r#"{"query": "{\"name;drop\": \"x\", \"age__year__bogus\": 3, \"email__isnull\": true}"}"#,
    );
    let NativeQuery::Sql { sql, params, .. } = compiled.query else {
        panic!("expected sql");
    };
    assert_eq!(sql, "SELECT * FROM users WHERE email IS NULL");
    assert!(params.is_empty());
}
