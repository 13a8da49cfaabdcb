//! API server implementation.
//!
//! Provides health, ready, and browse/execute endpoints for the
//! date-partitioned store.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::middleware;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use tower_http::trace::TraceLayer;

use refdata_core::{Provisioner, QueryGateway, Result, StoreLayout};

use crate::config::Config;
use crate::error::ApiError;

/// Health check response.
#[derive(Debug, Serialize)]
#[cfg_attr(test, derive(serde::Deserialize))]
pub struct HealthResponse {
    /// Service status.
    pub status: String,
}

/// Readiness check response.
#[derive(Debug, Serialize)]
#[cfg_attr(test, derive(serde::Deserialize))]
pub struct ReadyResponse {
    /// Service readiness status.
    pub ready: bool,
    /// Optional message about readiness state.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Shared application state for all request handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: Config,
    /// Canonical layout of the store root.
    layout: StoreLayout,
    /// Lazy file provisioner (shared so per-path locks are global).
    provisioner: Arc<Provisioner>,
    /// Engine facade.
    gateway: QueryGateway,
}

impl AppState {
    /// Creates application state over the configured store root.
    #[must_use]
    pub fn new(config: Config) -> Self {
        let layout = StoreLayout::new(&config.root);
        let provisioner = Arc::new(Provisioner::new(layout.clone()));
        Self {
            config,
            layout,
            provisioner,
            gateway: QueryGateway::new(),
        }
    }

    /// Returns the store layout.
    #[must_use]
    pub fn layout(&self) -> &StoreLayout {
        &self.layout
    }

    /// Returns the shared provisioner.
    #[must_use]
    pub fn provisioner(&self) -> Arc<Provisioner> {
        Arc::clone(&self.provisioner)
    }

    /// Returns the engine gateway.
    #[must_use]
    pub fn gateway(&self) -> QueryGateway {
        self.gateway
    }

    /// Runs a blocking core operation on the blocking pool.
    ///
    /// The engine is synchronous; handlers bridge into it here so the
    /// async workers are never blocked on file I/O.
    ///
    /// # Errors
    ///
    /// Returns an internal [`ApiError`] if the blocking task is cancelled,
    /// or the operation's own error mapped through `From<CoreError>`.
    pub async fn run_blocking<T, F>(&self, operation: F) -> std::result::Result<T, ApiError>
    where
        T: Send + 'static,
        F: FnOnce() -> Result<T> + Send + 'static,
    {
        tokio::task::spawn_blocking(operation)
            .await
            .map_err(|err| ApiError::internal(format!("blocking task failed: {err}")))?
            .map_err(ApiError::from)
    }
}

/// Health check endpoint handler.
///
/// Returns 200 OK if the service is alive. This is a shallow check
/// that doesn't verify dependencies.
async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// Readiness check endpoint handler.
///
/// Returns 200 OK once the store root is a readable directory.
async fn ready(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    if state.layout.root().is_dir() {
        (
            StatusCode::OK,
            Json(ReadyResponse {
                ready: true,
                message: None,
            }),
        )
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ReadyResponse {
                ready: false,
                message: Some(format!(
                    "store root unavailable: {}",
                    state.layout.root().display()
                )),
            }),
        )
    }
}

/// The refdata API server.
#[derive(Debug)]
pub struct Server {
    config: Config,
}

impl Server {
    /// Creates a new server with the given configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Returns the server configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Creates the router with all routes and middleware.
    fn create_router(&self) -> Router {
        let state = Arc::new(AppState::new(self.config.clone()));

        Router::new()
            // Health and ready endpoints
            .route("/health", get(health))
            .route("/ready", get(ready))
            // Browse/execute surface
            .route("/", get(crate::routes::catalog::list_dates))
            .route(
                "/tables/{year}/{month}/{day}",
                get(crate::routes::tables::list_tables),
            )
            .route(
                "/table/{table_name}/{year}/{month}/{day}",
                get(crate::routes::tables::read_table),
            )
            .route("/execute", post(crate::routes::execute::execute))
            .layer(middleware::from_fn(crate::context::request_id_middleware))
            .layer(TraceLayer::new_for_http())
            .with_state(state)
    }

    /// Starts serving HTTP requests.
    ///
    /// # Errors
    ///
    /// Returns an error when the store root is unusable, the port cannot
    /// be bound, or the server fails while running.
    pub async fn serve(&self) -> Result<()> {
        self.config.prepare_root()?;

        let addr = SocketAddr::from(([0, 0, 0, 0], self.config.http_port));
        let router = self.create_router();

        tracing::info!(
            http_port = self.config.http_port,
            root = %self.config.root.display(),
            "Starting refdata API server"
        );

        let listener = tokio::net::TcpListener::bind(addr).await.map_err(|e| {
            refdata_core::Error::Internal {
                message: format!("failed to bind to {addr}: {e}"),
            }
        })?;

        axum::serve(listener, router)
            .await
            .map_err(|e| refdata_core::Error::Internal {
                message: format!("server error: {e}"),
            })?;

        Ok(())
    }

    /// Creates a test router for the server.
    ///
    /// This is useful for integration tests where you want to test
    /// the routes without actually binding to a port.
    #[doc(hidden)]
    #[must_use]
    pub fn test_router(&self) -> Router {
        self.create_router()
    }
}
