//! Configuration management for boardsync
//!
//! Configuration is loaded with the following priority (highest to lowest):
//! 1. CLI flags
//! 2. Action inputs (INPUT_RELEASE, INPUT_ISSUE) and environment variables (BOARDSYNC_*)
//! 3. Config file (~/.config/boardsync/config.toml)
//! 4. Default values

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{Error, Result};

/// Default GraphQL endpoint
pub const DEFAULT_ENDPOINT: &str = "https://api.github.com/graphql";

/// Where the boards live
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct GitHubConfig {
    /// Organization that owns the release boards
    pub org: String,

    /// Repository (owner/repo) that owns the source board
    pub repo: String,

    /// Number of the repository-level board the issue is tracked on
    pub source_project: u64,

    /// GraphQL endpoint
    pub endpoint: String,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            org: "solo-io".to_string(),
            repo: "solo-io/solo-projects".to_string(),
            source_project: 1,
            endpoint: DEFAULT_ENDPOINT.to_string(),
        }
    }
}

/// Names of the custom fields copied between boards
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct FieldNames {
    pub customer: String,
    pub notes: String,
    pub priority: String,
}

impl Default for FieldNames {
    fn default() -> Self {
        Self {
            customer: "Customer".to_string(),
            notes: "Notes".to_string(),
            priority: "Priority".to_string(),
        }
    }
}

/// What to synchronize on this run
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Release label used to find the destination board (e.g. "2.4")
    pub release: String,

    /// Public number of the issue to copy
    pub issue: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            release: "2.4".to_string(),
            issue: 9198,
        }
    }
}

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub github: GitHubConfig,
    pub fields: FieldNames,
    pub sync: SyncConfig,
}

/// Values supplied on the command line
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub release: Option<String>,
    pub issue: Option<u64>,
    pub org: Option<String>,
    pub repo: Option<String>,
    pub source_project: Option<u64>,
    pub endpoint: Option<String>,
}

impl Config {
    /// Load configuration from the default config file location
    ///
    /// Returns default config if file doesn't exist
    pub fn load() -> Result<Self> {
        if let Some(path) = Self::default_config_path() {
            if path.exists() {
                return Self::load_from_file(&path);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        debug!(path = %path.display(), "Loading config file");
        let contents = std::fs::read_to_string(path).map_err(Error::Io)?;
        toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))
    }

    /// Get the default config file path
    ///
    /// Returns `~/.config/boardsync/config.toml` on Unix
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("boardsync").join("config.toml"))
    }

    /// Apply environment variable overrides
    ///
    /// Supported variables:
    /// - INPUT_RELEASE / INPUT_ISSUE: action inputs
    /// - BOARDSYNC_ORG, BOARDSYNC_REPO, BOARDSYNC_SOURCE_PROJECT, BOARDSYNC_ENDPOINT
    pub fn with_env_overrides(self) -> Result<Self> {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable lookup
    ///
    /// Empty values are treated as unset, since action runners export
    /// `INPUT_*` as an empty string for inputs without a default.
    pub fn with_overrides_from<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        if let Some(release) = get("INPUT_RELEASE") {
            self.sync.release = release;
        }
        if let Some(issue) = get("INPUT_ISSUE") {
            self.sync.issue = parse_number("INPUT_ISSUE", &issue)?;
        }
        if let Some(org) = get("BOARDSYNC_ORG") {
            self.github.org = org;
        }
        if let Some(repo) = get("BOARDSYNC_REPO") {
            self.github.repo = repo;
        }
        if let Some(project) = get("BOARDSYNC_SOURCE_PROJECT") {
            self.github.source_project = parse_number("BOARDSYNC_SOURCE_PROJECT", &project)?;
        }
        if let Some(endpoint) = get("BOARDSYNC_ENDPOINT") {
            self.github.endpoint = endpoint;
        }

        Ok(self)
    }

    /// Apply CLI flag overrides
    pub fn with_cli_overrides(mut self, overrides: ConfigOverrides) -> Self {
        if let Some(release) = overrides.release {
            self.sync.release = release;
        }
        if let Some(issue) = overrides.issue {
            self.sync.issue = issue;
        }
        if let Some(org) = overrides.org {
            self.github.org = org;
        }
        if let Some(repo) = overrides.repo {
            self.github.repo = repo;
        }
        if let Some(project) = overrides.source_project {
            self.github.source_project = project;
        }
        if let Some(endpoint) = overrides.endpoint {
            self.github.endpoint = endpoint;
        }

        self
    }

    /// Load configuration with all overrides applied
    ///
    /// Priority: CLI > env > config file > defaults
    pub fn load_with_overrides(overrides: ConfigOverrides) -> Result<Self> {
        Ok(Self::load()?
            .with_env_overrides()?
            .with_cli_overrides(overrides))
    }
}

fn parse_number(key: &str, value: &str) -> Result<u64> {
    value
        .parse::<u64>()
        .map_err(|_| Error::Config(format!("{} must be a positive number, got '{}'", key, value)))
}
