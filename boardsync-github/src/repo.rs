//! Repository addressing and REST access checks

use octocrab::Octocrab;
use tracing::{debug, info};

use crate::{Error, Result};

/// Result of a successful access check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryAccess {
    pub full_name: String,
    pub private: bool,
}

/// Verify the token can read the source repository
///
/// Uses the REST API, so a bad token or missing repository is reported
/// before any board is touched.
pub async fn check_repository_access(
    token: &str,
    owner: &str,
    repo: &str,
) -> Result<RepositoryAccess> {
    debug!(owner, repo, "Testing GitHub connection");

    let client = Octocrab::builder()
        .personal_token(token.to_string())
        .build()
        .map_err(|e| Error::Auth(format!("Failed to create GitHub client: {}", e)))?;

    // Fetch the repository; 404 and 401 get readable messages
    let repository = client
        .repos(owner, repo)
        .get()
        .await
        .map_err(|e| match e {
            octocrab::Error::GitHub { source, .. } => {
                if source.message.contains("Not Found") {
                    Error::Other(format!(
                        "Repository {}/{} not found or not accessible",
                        owner, repo
                    ))
                } else if source.message.contains("Bad credentials") {
                    Error::Auth("Invalid GitHub token".to_string())
                } else {
                    Error::Api(octocrab::Error::GitHub {
                        source,
                        backtrace: std::backtrace::Backtrace::capture(),
                    })
                }
            }
            other => Error::Api(other),
        })?;

    let access = RepositoryAccess {
        full_name: repository
            .full_name
            .unwrap_or_else(|| format!("{}/{}", owner, repo)),
        private: repository.private.unwrap_or(false),
    };

    info!(repository = %access.full_name, "GitHub connection successful");
    Ok(access)
}

/// Parse a GitHub repository reference into owner and repo
///
/// Supports formats:
/// - owner/repo
/// - https://github.com/owner/repo
/// - git@github.com:owner/repo.git
pub fn parse_github_url(url: &str) -> Result<(String, String)> {
    // Handle shorthand: owner/repo
    if !url.contains(':') && !url.contains('/') {
        return Err(Error::Parse(format!(
            "Invalid repository format: {}. Expected owner/repo",
            url
        )));
    }

    if !url.contains("://") && !url.contains('@') {
        // Simple owner/repo format
        let parts: Vec<&str> = url.split('/').collect();
        if parts.len() == 2 && !parts[0].is_empty() && !parts[1].is_empty() {
            return Ok((
                parts[0].to_string(),
                parts[1].trim_end_matches(".git").to_string(),
            ));
        }
        return Err(Error::Parse(format!(
            "Invalid repository format: {}. Expected owner/repo",
            url
        )));
    }

    // Handle HTTPS URL: https://github.com/owner/repo
    if url.starts_with("https://") || url.starts_with("http://") {
        let url = url::Url::parse(url).map_err(|e| Error::Parse(e.to_string()))?;
        let path = url.path().trim_start_matches('/').trim_end_matches(".git");
        let parts: Vec<&str> = path.split('/').collect();
        if parts.len() >= 2 {
            return Ok((parts[0].to_string(), parts[1].to_string()));
        }
        return Err(Error::Parse(format!("Invalid GitHub URL path: {}", path)));
    }

    // Handle SSH URL: git@github.com:owner/repo.git
    if url.starts_with("git@") {
        if let Some(path) = url.split(':').nth(1) {
            let path = path.trim_end_matches(".git");
            let parts: Vec<&str> = path.split('/').collect();
            if parts.len() >= 2 {
                return Ok((parts[0].to_string(), parts[1].to_string()));
            }
        }
        return Err(Error::Parse(format!("Invalid SSH URL: {}", url)));
    }

    Err(Error::Parse(format!("Unrecognized URL format: {}", url)))
}
