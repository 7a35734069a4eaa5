//! GitHub GraphQL client bound to one organization and source repository

use std::sync::Arc;

use boardsync_core::{Config, FieldNames};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::info;

use crate::graphql::{GraphQLTransport, HttpTransport};
use crate::items::ItemScope;
use crate::repo::parse_github_url;
use crate::{Error, Result};

/// GitHub API client for release board operations
#[derive(Clone)]
pub struct GitHubClient {
    transport: Arc<dyn GraphQLTransport>,
    org: String,
    owner: String,
    repo: String,
    fields: FieldNames,
}

impl GitHubClient {
    /// Create a client over an existing transport
    pub fn new(transport: Arc<dyn GraphQLTransport>, config: &Config) -> Result<Self> {
        let (owner, repo) = parse_github_url(&config.github.repo)?;

        Ok(Self {
            transport,
            org: config.github.org.clone(),
            owner,
            repo,
            fields: config.fields.clone(),
        })
    }

    /// Create a client talking HTTPS to the configured endpoint
    ///
    /// Token is loaded from (in priority order):
    /// 1. GITHUB_TOKEN environment variable
    /// 2. INPUT_TOKEN action input
    /// 3. ~/.config/boardsync/secrets.toml
    pub fn from_config(config: &Config) -> Result<Self> {
        let transport = HttpTransport::from_secrets(&config.github.endpoint)?;
        let client = Self::new(Arc::new(transport), config)?;

        info!(
            org = %client.org,
            owner = %client.owner,
            repo = %client.repo,
            endpoint = %config.github.endpoint,
            "Created GitHub client"
        );

        Ok(client)
    }

    /// Organization that owns the release boards
    pub fn org(&self) -> &str {
        &self.org
    }

    /// Get the repository owner
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Get the repository name
    pub fn repo(&self) -> &str {
        &self.repo
    }

    /// Names of the synchronized fields
    pub fn fields(&self) -> &FieldNames {
        &self.fields
    }

    /// Scope of the organization-level release boards
    pub fn org_scope(&self) -> ItemScope {
        ItemScope::Organization {
            login: self.org.clone(),
        }
    }

    /// Scope of the repository-level source board
    pub fn repo_scope(&self) -> ItemScope {
        ItemScope::Repository {
            owner: self.owner.clone(),
            name: self.repo.clone(),
        }
    }

    /// Execute a GraphQL document and decode its `data` into `T`
    pub(crate) async fn graphql_query<T: DeserializeOwned>(
        &self,
        query: &str,
        variables: &Value,
    ) -> Result<T> {
        let data = self.transport.execute(query, variables).await?.into_data()?;

        serde_json::from_value(data)
            .map_err(|e| Error::Parse(format!("Failed to decode GraphQL data: {}", e)))
    }

    /// Like [`Self::graphql_query`], but partial `data` next to `errors` is
    /// decoded and returned with the error messages
    pub(crate) async fn graphql_query_partial<T: DeserializeOwned>(
        &self,
        query: &str,
        variables: &Value,
    ) -> Result<(T, Vec<String>)> {
        let (data, errors) = self.transport.execute(query, variables).await?.into_partial()?;

        let data = serde_json::from_value(data)
            .map_err(|e| Error::Parse(format!("Failed to decode GraphQL data: {}", e)))?;

        Ok((data, errors))
    }
}

impl std::fmt::Debug for GitHubClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubClient")
            .field("org", &self.org)
            .field("owner", &self.owner)
            .field("repo", &self.repo)
            .finish_non_exhaustive()
    }
}
