//! Credentials for the GitHub API
//!
//! The token is kept out of `config.toml` so the config can be shared or
//! committed. The secrets file is located at `~/.config/boardsync/secrets.toml`
//! and must have restrictive permissions (0600 on Unix).
//!
//! Loading priority:
//! 1. GITHUB_TOKEN environment variable
//! 2. INPUT_TOKEN (the `token` action input)
//! 3. Secrets file (~/.config/boardsync/secrets.toml)

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{Error, Result};

/// Environment variables checked for a token, in order
const TOKEN_VARS: [&str; 2] = ["GITHUB_TOKEN", "INPUT_TOKEN"];

/// Secrets structure
#[derive(Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Secrets {
    /// GitHub configuration
    pub github: GitHubSecrets,
}

/// GitHub-related secrets
#[derive(Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct GitHubSecrets {
    /// GitHub token with `project` and `repo` scopes
    pub token: Option<String>,
}

impl std::fmt::Debug for Secrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Secrets")
            .field("github", &self.github)
            .finish()
    }
}

impl std::fmt::Debug for GitHubSecrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubSecrets")
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl Secrets {
    /// Load secrets from the default location
    ///
    /// Returns default (empty) secrets if file doesn't exist
    pub fn load() -> Result<Self> {
        if let Some(path) = Self::default_secrets_path() {
            if path.exists() {
                return Self::load_from_file(&path);
            }
        }

        Ok(Self::default())
    }

    /// Load secrets from a specific file with permission checking
    pub fn load_from_file(path: &Path) -> Result<Self> {
        // Check file permissions on Unix
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;

            let metadata = std::fs::metadata(path).map_err(Error::Io)?;
            let mode = metadata.permissions().mode();

            // Check if file is readable by group or others (mode & 0o077)
            if mode & 0o077 != 0 {
                return Err(Error::Config(format!(
                    "Secrets file {} has insecure permissions {:o}. \
                     Please run: chmod 600 {}",
                    path.display(),
                    mode & 0o777,
                    path.display()
                )));
            }

            debug!(path = %path.display(), mode = format!("{:o}", mode & 0o777), "Secrets file permissions OK");
        }

        let contents = std::fs::read_to_string(path).map_err(Error::Io)?;
        let mut secrets: Secrets = toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("Failed to parse secrets: {}", e)))?;

        // Trim whitespace from token
        if let Some(ref mut token) = secrets.github.token {
            *token = token.trim().to_string();
        }

        Ok(secrets)
    }

    /// Get the default secrets file path
    ///
    /// Returns `~/.config/boardsync/secrets.toml` on Unix
    pub fn default_secrets_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("boardsync").join("secrets.toml"))
    }

    /// Get GitHub token with environment variable override
    pub fn github_token(&self) -> Option<String> {
        self.github_token_from(|key| std::env::var(key).ok())
    }

    /// Resolve the token against an arbitrary variable lookup
    pub fn github_token_from<F>(&self, lookup: F) -> Option<String>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Check environment variables first
        for var in TOKEN_VARS {
            if let Some(token) = lookup(var) {
                let token = token.trim().to_string();
                if !token.is_empty() {
                    debug!(var, "Using GitHub token from environment");
                    return Some(token);
                }
            }
        }

        // Fall back to secrets file
        match self.github.token.as_deref() {
            Some(token) if !token.is_empty() => {
                debug!("Using GitHub token from secrets file");
                Some(token.to_string())
            }
            _ => None,
        }
    }

    /// Create a template secrets file at the default location
    ///
    /// Creates parent directories if needed and sets secure permissions
    pub fn create_template() -> Result<PathBuf> {
        let path = Self::default_secrets_path()
            .ok_or_else(|| Error::Config("Could not determine secrets path".to_string()))?;
        Self::create_template_at(&path)?;
        Ok(path)
    }

    /// Create a template secrets file at `path`
    pub fn create_template_at(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(Error::Io)?;
        }

        // Don't overwrite existing file
        if path.exists() {
            return Err(Error::Config(format!(
                "Secrets file already exists at {}",
                path.display()
            )));
        }

        let template = r#"# boardsync secrets
# This file contains sensitive credentials - do not share or commit to version control
#
# IMPORTANT: This file must have restrictive permissions (chmod 600)

[github]
# GitHub token; needs read/write access to organization projects
# Create at: https://github.com/settings/tokens (scopes: repo, project)
token = ""
"#;

        std::fs::write(path, template).map_err(Error::Io)?;

        // Set restrictive permissions on Unix
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o600);
            std::fs::set_permissions(path, perms).map_err(Error::Io)?;
        }

        warn!(path = %path.display(), "Created secrets template - please edit and add your token");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn with_file_token(token: &str) -> Secrets {
        Secrets {
            github: GitHubSecrets {
                token: Some(token.to_string()),
            },
        }
    }

    #[test]
    fn test_parse_secrets() {
        let toml = r#"
[github]
token = "ghp_xxxxxxxxxxxx"
"#;
        let secrets: Secrets = toml::from_str(toml).unwrap();
        assert_eq!(secrets.github.token, Some("ghp_xxxxxxxxxxxx".to_string()));
    }

    #[test]
    fn test_env_token_wins_over_file() {
        let secrets = with_file_token("from_file");
        let token = secrets.github_token_from(|k| (k == "GITHUB_TOKEN").then(|| " env ".into()));
        assert_eq!(token.as_deref(), Some("env"));
    }

    #[test]
    fn test_action_input_token() {
        let secrets = Secrets::default();
        let token = secrets.github_token_from(|k| match k {
            "GITHUB_TOKEN" => Some(String::new()),
            "INPUT_TOKEN" => Some("input".into()),
            _ => None,
        });
        assert_eq!(token.as_deref(), Some("input"));
    }

    #[test]
    fn test_file_token_fallback() {
        let secrets = with_file_token("from_file");
        assert_eq!(secrets.github_token_from(|_| None).as_deref(), Some("from_file"));
        assert!(with_file_token("").github_token_from(|_| None).is_none());
    }

    #[test]
    fn test_debug_redacts_token() {
        let rendered = format!("{:?}", with_file_token("ghp_secret"));
        assert!(!rendered.contains("ghp_secret"));
        assert!(rendered.contains("redacted"));
    }

    #[cfg(unix)]
    #[test]
    fn test_insecure_permissions_rejected() {
        use std::os::unix::fs::PermissionsExt;

        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[github]\ntoken = \"test\"").unwrap();

        let perms = std::fs::Permissions::from_mode(0o644);
        std::fs::set_permissions(file.path(), perms).unwrap();

        let result = Secrets::load_from_file(file.path());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("insecure permissions"));
    }

    #[cfg(unix)]
    #[test]
    fn test_secure_permissions_accepted() {
        use std::os::unix::fs::PermissionsExt;

        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[github]\ntoken = \"  ghp_test \"").unwrap();

        let perms = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(file.path(), perms).unwrap();

        let secrets = Secrets::load_from_file(file.path()).unwrap();
        assert_eq!(secrets.github.token, Some("ghp_test".to_string()));
    }

    #[test]
    fn test_create_template_refuses_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("secrets.toml");

        Secrets::create_template_at(&path).unwrap();
        assert!(path.exists());
        // Template token is empty, so it does not count as a credential
        let secrets: Secrets = toml::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert!(secrets.github_token_from(|_| None).is_none());

        let err = Secrets::create_template_at(&path).unwrap_err();
        assert!(err.to_string().contains("already exists"));
    }
}
