//! SQL execution route.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::time::timeout;

use refdata_core::{QueryResult, format_for_display};

use crate::context::RequestContext;
use crate::error::{ApiError, ApiResult};
use crate::server::AppState;

/// Request payload for SQL execution.
///
/// The date fields accept integers or numeric strings; anything else is
/// a 400.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ExecuteRequest {
    /// Partition year.
    pub year: Option<Value>,
    /// Partition month.
    pub month: Option<Value>,
    /// Partition day.
    pub day: Option<Value>,
    /// SQL text to execute, as-is.
    pub sql: Option<String>,
}

/// Response payload for a read statement.
#[derive(Debug, Serialize)]
#[cfg_attr(test, derive(serde::Deserialize))]
pub struct ExecuteRowsResponse {
    /// Column names in result order.
    pub columns: Vec<String>,
    /// Row values.
    pub results: Vec<Vec<Value>>,
    /// Display-formatted copy of the submitted SQL.
    pub formatted_sql: String,
}

/// Response payload for a committed write or DDL statement.
#[derive(Debug, Serialize)]
#[cfg_attr(test, derive(serde::Deserialize))]
pub struct ExecuteAckResponse {
    /// Acknowledgement message.
    pub message: String,
    /// Display-formatted copy of the submitted SQL.
    pub formatted_sql: String,
}

/// Response payload for `/execute`.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ExecuteResponse {
    /// Tabular results for a read statement.
    Rows(ExecuteRowsResponse),
    /// Acknowledgement for a write/DDL statement.
    Ack(ExecuteAckResponse),
}

/// Executes caller-supplied SQL against a date's data file.
///
/// POST /execute with body `{year, month, day, sql}`.
///
/// The original SQL text is what the engine runs; the `formatted_sql`
/// echoed in the response is a display-only copy. Execution is bounded by
/// the configured query timeout since the statement is arbitrary caller
/// input.
///
/// # Errors
///
/// 400 for missing/non-numeric date fields, missing SQL, or an
/// engine-reported execution failure (the transaction is rolled back);
/// 404 when resolution/provisioning yields no file; 408 when the time
/// bound is exceeded; 500 for storage failures.
pub(crate) async fn execute(
    ctx: RequestContext,
    State(state): State<Arc<AppState>>,
    Json(req): Json<ExecuteRequest>,
) -> ApiResult<Json<ExecuteResponse>> {
    let year = numeric_field(&ctx, req.year.as_ref(), "year")?;
    let month = numeric_field(&ctx, req.month.as_ref(), "month")?;
    let day = numeric_field(&ctx, req.day.as_ref(), "day")?;
    let date = super::parse_date(&ctx, &year, &month, &day)?;

    let sql = req
        .sql
        .as_deref()
        .map(str::trim)
        .filter(|sql| !sql.is_empty())
        .ok_or_else(|| {
            ApiError::bad_request("missing required field: sql")
                .with_request_id(ctx.request_id.clone())
        })?
        .to_string();

    tracing::info!(
        request_id = %ctx.request_id,
        date = %date,
        sql_len = sql.len(),
        "Executing SQL"
    );

    let provisioner = state.provisioner();
    let gateway = state.gateway();
    let executed_sql = sql.clone();
    let outcome = timeout(
        state.config.query_timeout,
        state.run_blocking(move || {
            let path = provisioner.ensure(&date)?;
            gateway.execute(&path, &executed_sql)
        }),
    )
    .await
    .map_err(|_| {
        ApiError::request_timeout("query timed out").with_request_id(ctx.request_id.clone())
    })?
    .map_err(|err| err.with_request_id(ctx.request_id.clone()))?;

    let formatted_sql = format_for_display(&sql);
    match outcome {
        QueryResult::Rows { columns, rows } => Ok(Json(ExecuteResponse::Rows(
            ExecuteRowsResponse {
                columns,
                results: rows,
                formatted_sql,
            },
        ))),
        QueryResult::Ack { message } => Ok(Json(ExecuteResponse::Ack(ExecuteAckResponse {
            message,
            formatted_sql,
        }))),
        QueryResult::Failure { message } => {
            Err(ApiError::execution_failed(message).with_request_id(ctx.request_id.clone()))
        }
    }
}

/// Extracts a date field that may arrive as a JSON number or a numeric
/// string, normalizing to the string form the date parser accepts.
fn numeric_field(
    ctx: &RequestContext,
    value: Option<&Value>,
    name: &str,
) -> Result<String, ApiError> {
    let reject = |message: String| {
        ApiError::bad_request(message).with_request_id(ctx.request_id.clone())
    };
    match value {
        None | Some(Value::Null) => Err(reject(format!("missing required field: {name}"))),
        Some(Value::Number(number)) => number
            .as_u64()
            .map(|n| n.to_string())
            .ok_or_else(|| reject(format!("{name} must be a non-negative integer"))),
        Some(Value::String(raw)) => {
            let trimmed = raw.trim();
            if !trimmed.is_empty() && trimmed.bytes().all(|b| b.is_ascii_digit()) {
                Ok(trimmed.to_string())
            } else {
                Err(reject(format!("{name} must be numeric, got {raw:?}")))
            }
        }
        Some(other) => Err(reject(format!(
            "{name} must be a number or numeric string, got {other}"
        ))),
    }
}
