//! Table listing and paginated table read routes.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::context::RequestContext;
use crate::error::ApiResult;
use crate::server::AppState;

/// Response payload for the table listing.
#[derive(Debug, Serialize)]
#[cfg_attr(test, derive(serde::Deserialize))]
pub struct TablesResponse {
    /// Table names in creation order.
    pub tables: Vec<String>,
}

/// Query parameters for paginated table reads.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct TablePageQuery {
    page: Option<u32>,
    per_page: Option<u32>,
}

/// Response payload for one page of a table.
#[derive(Debug, Serialize)]
#[cfg_attr(test, derive(serde::Deserialize))]
pub struct TablePageResponse {
    /// Column names in table order.
    pub columns: Vec<String>,
    /// Row values for this page.
    pub results: Vec<Vec<Value>>,
    /// Total row count of the table.
    pub total: u64,
    /// The 1-based page that was read.
    pub page: u32,
    /// The page size that was applied.
    pub per_page: u32,
    /// Display-formatted SELECT used for this page.
    pub formatted_sql: String,
}

/// Lists the tables in a date's data file, provisioning it on first access.
///
/// GET /tables/{year}/{month}/{day}
///
/// # Errors
///
/// 400 for an invalid date; 404 when resolution/provisioning yields no
/// file; 500 for storage failures (safe to retry; provisioning is
/// idempotent).
pub(crate) async fn list_tables(
    ctx: RequestContext,
    State(state): State<Arc<AppState>>,
    Path((year, month, day)): Path<(String, String, String)>,
) -> ApiResult<Json<TablesResponse>> {
    let date = super::parse_date(&ctx, &year, &month, &day)?;

    tracing::debug!(request_id = %ctx.request_id, date = %date, "Listing tables");

    let provisioner = state.provisioner();
    let gateway = state.gateway();
    let tables = state
        .run_blocking(move || {
            let path = provisioner.ensure(&date)?;
            gateway.list_tables(&path)
        })
        .await
        .map_err(|err| err.with_request_id(ctx.request_id.clone()))?;

    Ok(Json(TablesResponse { tables }))
}

/// Reads one page of a named table, provisioning the date's file on first
/// access.
///
/// GET /table/{table_name}/{year}/{month}/{day}?page=&per_page=
///
/// # Errors
///
/// 400 for an invalid date or paging parameters; 404 for an unknown table
/// name (checked against the file's own catalog, never interpolated
/// unchecked); 500 for storage failures.
pub(crate) async fn read_table(
    ctx: RequestContext,
    State(state): State<Arc<AppState>>,
    Path((table_name, year, month, day)): Path<(String, String, String, String)>,
    Query(query): Query<TablePageQuery>,
) -> ApiResult<Json<TablePageResponse>> {
    let date = super::parse_date(&ctx, &year, &month, &day)?;

    tracing::debug!(
        request_id = %ctx.request_id,
        date = %date,
        table = %table_name,
        "Reading table page"
    );

    let provisioner = state.provisioner();
    let gateway = state.gateway();
    let page = state
        .run_blocking(move || {
            let path = provisioner.ensure(&date)?;
            gateway.read_table(&path, &table_name, query.page, query.per_page)
        })
        .await
        .map_err(|err| err.with_request_id(ctx.request_id.clone()))?;

    Ok(Json(TablePageResponse {
        columns: page.columns,
        results: page.rows,
        total: page.total,
        page: page.page,
        per_page: page.page_size,
        formatted_sql: page.formatted_sql,
    }))
}
