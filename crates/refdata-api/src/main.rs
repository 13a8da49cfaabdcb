//! `refdata-api` binary entrypoint.
//!
//! Loads configuration from environment variables and starts the HTTP server.

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]

use anyhow::Result;

use refdata_api::config::Config;
use refdata_api::server::Server;
use refdata_core::observability::{LogFormat, init_logging};

fn choose_log_format(config: &Config) -> LogFormat {
    if config.debug {
        LogFormat::Pretty
    } else {
        LogFormat::Json
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    init_logging(choose_log_format(&config));

    // An unusable store root is fatal; the process must not start serving.
    config.prepare_root()?;
    tracing::info!(root = %config.root.display(), "Using store root");

    let server = Server::new(config);
    server.serve().await?;
    Ok(())
}
