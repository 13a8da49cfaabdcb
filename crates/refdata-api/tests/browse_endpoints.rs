//! Integration tests for the catalog and table browsing endpoints.

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use serde_json::{Value, json};
use tempfile::TempDir;
use tower::ServiceExt;

use refdata_api::config::Config;
use refdata_api::server::Server;

fn test_router(root: &TempDir) -> Router {
    let config = Config {
        root: root.path().to_path_buf(),
        ..Config::default()
    };
    Server::new(config).test_router()
}

async fn api_request(
    router: &Router,
    method: Method,
    uri: &str,
) -> Result<(StatusCode, Value), String> {
    let req = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .map_err(|err| format!("build request: {err}"))?;

    let response = router
        .clone()
        .oneshot(req)
        .await
        .map_err(|err| format!("route request: {err}"))?;
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .map_err(|err| format!("read response body: {err}"))?;

    let parsed = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).map_err(|err| format!("parse response body: {err}"))?
    };
    Ok((status, parsed))
}

fn row_count(root: &TempDir, table: &str) -> i64 {
    let path = root.path().join("2024/01/15/refdata/refdata.db");
    let conn = rusqlite::Connection::open(path).expect("open data file");
    conn.query_row(&format!("SELECT COUNT(*) FROM \"{table}\""), [], |row| {
        row.get(0)
    })
    .expect("count rows")
}

#[tokio::test]
async fn health_and_ready() -> Result<(), String> {
    let root = TempDir::new().map_err(|err| err.to_string())?;
    let router = test_router(&root);

    let (status, body) = api_request(&router, Method::GET, "/health").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ok"}));

    let (status, body) = api_request(&router, Method::GET, "/ready").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ready"], json!(true));
    Ok(())
}

#[tokio::test]
async fn catalog_is_empty_on_fresh_root() -> Result<(), String> {
    let root = TempDir::new().map_err(|err| err.to_string())?;
    let router = test_router(&root);

    let (status, body) = api_request(&router, Method::GET, "/").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"dates": []}));
    Ok(())
}

#[tokio::test]
async fn tables_auto_provisions_exactly_once() -> Result<(), String> {
    let root = TempDir::new().map_err(|err| err.to_string())?;
    let router = test_router(&root);

    let (status, body) = api_request(&router, Method::GET, "/tables/2024/01/15").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"tables": ["users", "orders"]}));

    let users = row_count(&root, "users");
    let orders = row_count(&root, "orders");
    assert!(users > 0);

    // A second identical request returns the same list without reseeding.
    let (status, body) = api_request(&router, Method::GET, "/tables/2024/01/15").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"tables": ["users", "orders"]}));
    assert_eq!(row_count(&root, "users"), users);
    assert_eq!(row_count(&root, "orders"), orders);
    Ok(())
}

#[tokio::test]
async fn catalog_lists_provisioned_dates_in_calendar_order() -> Result<(), String> {
    let root = TempDir::new().map_err(|err| err.to_string())?;
    let router = test_router(&root);

    // Provision out of calendar order.
    api_request(&router, Method::GET, "/tables/2024/10/01").await?;
    api_request(&router, Method::GET, "/tables/2024/02/09").await?;

    let (status, body) = api_request(&router, Method::GET, "/").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"dates": ["2024/02/09", "2024/10/01"]}));
    Ok(())
}

#[tokio::test]
async fn invalid_dates_are_rejected() -> Result<(), String> {
    let root = TempDir::new().map_err(|err| err.to_string())?;
    let router = test_router(&root);

    let (status, body) = api_request(&router, Method::GET, "/tables/2024/13/01").await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], json!("BAD_REQUEST"));

    let (status, _) = api_request(&router, Method::GET, "/tables/2024/abc/01").await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn table_read_is_paginated() -> Result<(), String> {
    let root = TempDir::new().map_err(|err| err.to_string())?;
    let router = test_router(&root);

    let (status, first) =
        api_request(&router, Method::GET, "/table/users/2024/01/15?page=1&per_page=10").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["page"], json!(1));
    assert_eq!(first["per_page"], json!(10));
    assert_eq!(first["total"], json!(25));
    assert_eq!(first["results"].as_array().unwrap().len(), 10);
    assert!(first["columns"]
        .as_array()
        .unwrap()
        .contains(&json!("email")));
    assert!(first["formatted_sql"].as_str().unwrap().contains("SELECT"));

    let (status, second) =
        api_request(&router, Method::GET, "/table/users/2024/01/15?page=2&per_page=10").await?;
    assert_eq!(status, StatusCode::OK);
    let first_rows = first["results"].as_array().unwrap();
    for row in second["results"].as_array().unwrap() {
        assert!(!first_rows.contains(row), "pages must be disjoint: {row}");
    }

    let (status, last) =
        api_request(&router, Method::GET, "/table/users/2024/01/15?page=3&per_page=10").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(last["results"].as_array().unwrap().len(), 5);
    Ok(())
}

#[tokio::test]
async fn table_read_defaults_to_ten_rows() -> Result<(), String> {
    let root = TempDir::new().map_err(|err| err.to_string())?;
    let router = test_router(&root);

    let (status, body) = api_request(&router, Method::GET, "/table/users/2024/01/15").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["per_page"], json!(10));
    assert_eq!(body["results"].as_array().unwrap().len(), 10);
    Ok(())
}

#[tokio::test]
async fn unknown_table_is_not_found() -> Result<(), String> {
    let root = TempDir::new().map_err(|err| err.to_string())?;
    let router = test_router(&root);

    let (status, body) =
        api_request(&router, Method::GET, "/table/no_such_table/2024/01/15").await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], json!("NOT_FOUND"));
    Ok(())
}

#[tokio::test]
async fn bad_paging_parameters_are_rejected() -> Result<(), String> {
    let root = TempDir::new().map_err(|err| err.to_string())?;
    let router = test_router(&root);

    let (status, _) =
        api_request(&router, Method::GET, "/table/users/2024/01/15?page=0").await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) =
        api_request(&router, Method::GET, "/table/users/2024/01/15?per_page=100000").await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn request_id_is_echoed() -> Result<(), String> {
    let root = TempDir::new().map_err(|err| err.to_string())?;
    let router = test_router(&root);

    let req = Request::builder()
        .method(Method::GET)
        .uri("/")
        .header("X-Request-Id", "01JREQUESTID")
        .body(Body::empty())
        .map_err(|err| format!("build request: {err}"))?;
    let response = router
        .clone()
        .oneshot(req)
        .await
        .map_err(|err| format!("route request: {err}"))?;

    assert_eq!(
        response
            .headers()
            .get("x-request-id")
            .and_then(|value| value.to_str().ok()),
        Some("01JREQUESTID")
    );
    Ok(())
}
