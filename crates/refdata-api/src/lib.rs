//! # refdata-api
//!
//! HTTP composition layer for the refdata browser service.
//!
//! This crate is a **thin composition layer** with no domain policy: all
//! path resolution, provisioning, and query logic lives in `refdata-core`.
//! It handles:
//!
//! - **Routing**: the browse/execute HTTP surface
//! - **Configuration**: environment-driven server settings
//! - **Observability**: request IDs, tracing, and health checks
//!
//! ## Endpoints
//!
//! ```text
//! GET  /health                                  - Health check
//! GET  /ready                                   - Readiness check
//! GET  /                                        - Catalog of available dates
//! GET  /tables/{year}/{month}/{day}             - Tables in a date's file
//! GET  /table/{table}/{year}/{month}/{day}      - Paginated table contents
//! POST /execute                                 - Execute SQL against a date's file
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rust_2018_idioms)]
#![warn(clippy::pedantic)]
#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod config;
pub mod context;
pub mod error;
pub mod routes;
pub mod server;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::error::{ApiError, ApiResult};
    pub use crate::server::Server;
}
