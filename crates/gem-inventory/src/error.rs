use std::path::PathBuf;

/// Errors raised by catalog, order and report operations.
#[derive(Debug, thiserror::Error)]
pub enum InventoryError {
    #[error("data file not found: {}", path.display())]
    DataUnavailable { path: PathBuf },

    #[error("{} is missing required columns: {}", path.display(), missing.join(", "))]
    Schema { path: PathBuf, missing: Vec<String> },

    #[error("{}:{line}: {reason}", path.display())]
    InvalidRecord {
        path: PathBuf,
        line: u64,
        reason: String,
    },

    #[error("only {available} stones available for the selected criteria, {requested} requested")]
    InsufficientStock { requested: usize, available: usize },

    #[error("invalid input: {0}")]
    Validation(String),

    #[error("authentication failed for '{username}'")]
    AuthenticationFailed { username: String },

    #[error("failed to parse CSV {}: {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to lock {}: {source}", path.display())]
    Lock {
        path: PathBuf,
        #[source]
        source: fslock::Error,
    },
}

impl InventoryError {
    /// Whether the caller can reasonably retry with different input.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, InventoryError::InsufficientStock { .. })
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        InventoryError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn csv(path: impl Into<PathBuf>, source: csv::Error) -> Self {
        InventoryError::Csv {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T, E = InventoryError> = std::result::Result<T, E>;
