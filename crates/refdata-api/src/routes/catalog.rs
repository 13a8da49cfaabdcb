//! Catalog listing route.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use serde::Serialize;

use crate::context::RequestContext;
use crate::error::ApiResult;
use crate::server::AppState;

/// Response payload for the catalog listing.
#[derive(Debug, Serialize)]
#[cfg_attr(test, derive(serde::Deserialize))]
pub struct CatalogResponse {
    /// Dates with a data file on disk, ascending, as `YYYY/MM/DD`.
    pub dates: Vec<String>,
}

/// Lists the dates for which a data file exists.
///
/// GET /
///
/// # Errors
///
/// Never fails for an absent or empty root; that is an empty catalog.
pub(crate) async fn list_dates(
    ctx: RequestContext,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<CatalogResponse>> {
    tracing::debug!(request_id = %ctx.request_id, "Scanning catalog");

    let layout = state.layout().clone();
    let dates = state
        .run_blocking(move || Ok(layout.scan_catalog()))
        .await?;

    Ok(Json(CatalogResponse {
        dates: dates.iter().map(ToString::to_string).collect(),
    }))
}
