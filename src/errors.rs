use thiserror::Error;

/// Errors surfaced by `InventoryStore` operations.
#[derive(Error, Debug)]
pub enum InventoryError {
    #[error("Item {0} not found")]
    NotFound(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors surfaced by storage adapters.
#[derive(Error, Debug)]
pub enum StorageError {
    /// The backing store is missing from the current environment.
    #[error("{0} not available")]
    Unavailable(&'static str),

    /// Remote API answered with a non-success status other than 404.
    #[error("API {operation} failed: {status}")]
    Remote {
        operation: &'static str,
        status: u16,
    },

    /// Base URL cannot carry `/inventory/{key}` path segments.
    #[error("invalid base url: {0}")]
    InvalidUrl(String),

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = InventoryError> = std::result::Result<T, E>;

/// Errors raised while reading `config.json`.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Read(#[from] std::io::Error),

    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),
}
