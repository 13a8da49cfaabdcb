//! Server configuration.
//!
//! All settings come from `REFDATA_*` environment variables; the store
//! root is passed into the core types explicitly rather than read as
//! ambient process state.

use std::path::PathBuf;
use std::time::Duration;

use refdata_core::{Error, Result};

/// Default listen port.
pub const DEFAULT_HTTP_PORT: u16 = 8080;

/// Default bound on `/execute` wall time.
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(10);

/// Server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Root directory of the date-partitioned store.
    pub root: PathBuf,
    /// HTTP listen port.
    pub http_port: u16,
    /// Pretty logs and relaxed diagnostics when true.
    pub debug: bool,
    /// Wall-clock bound applied to `/execute` requests.
    pub query_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root: PathBuf::from("./data"),
            http_port: DEFAULT_HTTP_PORT,
            debug: false,
            query_timeout: DEFAULT_QUERY_TIMEOUT,
        }
    }
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `REFDATA_ROOT`: store root directory (default `./data`)
    /// - `REFDATA_HTTP_PORT`: listen port (default 8080)
    /// - `REFDATA_DEBUG`: `true`/`false` (default false)
    /// - `REFDATA_QUERY_TIMEOUT_SECS`: `/execute` timeout, must be > 0
    ///
    /// # Errors
    ///
    /// Returns an error when a variable is present but unparseable.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Some(root) = env_string("REFDATA_ROOT") {
            config.root = PathBuf::from(root);
        }
        if let Some(port) = env_u16("REFDATA_HTTP_PORT")? {
            config.http_port = port;
        }
        if let Some(debug) = env_bool("REFDATA_DEBUG")? {
            config.debug = debug;
        }
        if let Some(secs) = env_u64("REFDATA_QUERY_TIMEOUT_SECS")? {
            if secs == 0 {
                return Err(Error::InvalidInput(
                    "REFDATA_QUERY_TIMEOUT_SECS must be greater than 0".to_string(),
                ));
            }
            config.query_timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }

    /// Ensures the store root exists and is a usable directory.
    ///
    /// Called once at startup; failure here is fatal and the process must
    /// not start serving.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Storage`] when the root cannot be created or is
    /// not a directory.
    pub fn prepare_root(&self) -> Result<()> {
        std::fs::create_dir_all(&self.root).map_err(|err| {
            Error::storage_with_source(
                format!("failed to create store root {}", self.root.display()),
                err,
            )
        })?;
        if !self.root.is_dir() {
            return Err(Error::storage(format!(
                "store root is not a directory: {}",
                self.root.display()
            )));
        }
        Ok(())
    }
}

fn env_string(name: &str) -> Option<String> {
    std::env::var(name).ok().and_then(|v| {
        let trimmed = v.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

fn env_u16(name: &str) -> Result<Option<u16>> {
    let Some(v) = env_string(name) else {
        return Ok(None);
    };
    v.parse::<u16>()
        .map(Some)
        .map_err(|e| Error::InvalidInput(format!("{name} must be a u16: {e}")))
}

fn env_u64(name: &str) -> Result<Option<u64>> {
    let Some(v) = env_string(name) else {
        return Ok(None);
    };
    v.parse::<u64>()
        .map(Some)
        .map_err(|e| Error::InvalidInput(format!("{name} must be a u64: {e}")))
}

fn env_bool(name: &str) -> Result<Option<bool>> {
    let Some(v) = env_string(name) else {
        return Ok(None);
    };
    match v.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(Some(true)),
        "0" | "false" | "no" => Ok(Some(false)),
        _ => Err(Error::InvalidInput(format!(
            "{name} must be a boolean, got {v:?}"
        ))),
    }
}
