//! Error types for GitHub operations

use thiserror::Error;

/// Result type for GitHub operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during GitHub operations
#[derive(Error, Debug)]
pub enum Error {
    /// GitHub REST API error
    #[error("GitHub API error: {0}")]
    Api(#[from] octocrab::Error),

    /// Network failure or non-2xx response
    #[error("GraphQL request failed: {0}")]
    Http(String),

    /// The response carried an `errors` array
    #[error("GraphQL errors: {}", .0.join(", "))]
    GraphQL(Vec<String>),

    /// Expected part of the response is missing
    #[error("GraphQL response missing {0}")]
    MissingData(String),

    /// Authentication error
    #[error("GitHub authentication error: {0}")]
    Auth(String),

    /// No release board matched
    #[error("project board not found for release {release}")]
    ProjectNotFound { release: String },

    /// Issue is not on the searched board
    #[error("issue #{number} not found in {scope}")]
    IssueNotFound { number: u64, scope: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] boardsync_core::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Http(err.to_string())
    }
}
