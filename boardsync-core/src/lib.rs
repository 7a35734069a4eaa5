//! Boardsync Core - configuration and credentials for release board sync
//!
//! This crate holds the run parameters and the bearer credential that the
//! GitHub integration needs. Everything here is resolved once, before any
//! network call, and handed to the orchestrator as an immutable value.

pub mod config;
pub mod error;
pub mod secrets;

pub use config::{Config, ConfigOverrides, FieldNames, GitHubConfig, SyncConfig};
pub use error::{Error, Result};
pub use secrets::{GitHubSecrets, Secrets};
