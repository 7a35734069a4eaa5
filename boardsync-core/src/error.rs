//! Error types for boardsync configuration

use thiserror::Error;

/// Result type alias for configuration operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for configuration operations
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}
