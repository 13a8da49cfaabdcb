//! Error types and result aliases shared across the refdata crates.
//!
//! Errors are structured for programmatic handling at the HTTP boundary:
//! each variant maps to exactly one failure class (bad date, missing file
//! or table, storage fault, engine-reported execution failure).

/// The result type used throughout refdata.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in refdata operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A date component was outside its accepted bounds.
    #[error("invalid date: {message}")]
    InvalidDate {
        /// Description of what made the date invalid.
        message: String,
    },

    /// The requested file or table was not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// A filesystem or engine write failed during provisioning.
    #[error("storage error: {message}")]
    Storage {
        /// Description of the storage failure.
        message: String,
        /// The underlying cause, if any.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The engine reported an error while executing caller-supplied SQL.
    ///
    /// The message is SQLite's own, carried verbatim.
    #[error("execution failed: {message}")]
    Execution {
        /// The engine's error message.
        message: String,
    },

    /// Invalid input was provided.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// An internal error occurred that should not happen in normal operation.
    #[error("internal error: {message}")]
    Internal {
        /// Description of the internal error.
        message: String,
    },
}

impl Error {
    /// Creates a new storage error with the given message.
    #[must_use]
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a new storage error with a source cause.
    #[must_use]
    pub fn storage_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Storage {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Creates a new execution error carrying the engine's message.
    #[must_use]
    pub fn execution(message: impl Into<String>) -> Self {
        Self::Execution {
            message: message.into(),
        }
    }
}
