//! GraphQL transport for the GitHub API

use async_trait::async_trait;
use boardsync_core::Secrets;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::{Error, Result};

/// GraphQL response envelope
#[derive(Debug, Deserialize)]
pub struct GraphQLResponse<T> {
    pub data: Option<T>,
    #[serde(default)]
    pub errors: Option<Vec<GraphQLError>>,
}

/// GraphQL error
#[derive(Debug, Clone, Deserialize)]
pub struct GraphQLError {
    pub message: String,
}

impl<T> GraphQLResponse<T> {
    /// Unwrap the payload, turning an `errors` array into [`Error::GraphQL`]
    pub fn into_data(self) -> Result<T> {
        if let Some(errors) = self.errors.filter(|e| !e.is_empty()) {
            return Err(Error::GraphQL(
                errors.into_iter().map(|e| e.message).collect(),
            ));
        }

        self.data
            .ok_or_else(|| Error::MissingData("data".to_string()))
    }

    /// Keep partial `data` that arrives next to `errors`
    ///
    /// Returns the payload with the error messages. Fails only when there
    /// is no payload at all.
    pub fn into_partial(self) -> Result<(T, Vec<String>)> {
        let messages: Vec<String> = self
            .errors
            .unwrap_or_default()
            .into_iter()
            .map(|e| e.message)
            .collect();

        match self.data {
            Some(data) => Ok((data, messages)),
            None if !messages.is_empty() => Err(Error::GraphQL(messages)),
            None => Err(Error::MissingData("data".to_string())),
        }
    }
}

/// Sends one GraphQL document and returns the undecoded envelope
#[async_trait]
pub trait GraphQLTransport: Send + Sync {
    async fn execute(&self, query: &str, variables: &Value) -> Result<GraphQLResponse<Value>>;
}

/// [`GraphQLTransport`] over HTTPS with a bearer token
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: String,
    token: String,
}

impl HttpTransport {
    pub fn new(endpoint: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            token: token.into(),
        }
    }

    /// Create a transport using the token from the environment or secrets file
    pub fn from_secrets(endpoint: impl Into<String>) -> Result<Self> {
        let secrets = Secrets::load()?;
        let token = secrets.github_token().ok_or_else(|| {
            Error::Auth(
                "GitHub token not found. Set GITHUB_TOKEN environment variable, \
                 pass the `token` action input, or add token to ~/.config/boardsync/secrets.toml"
                    .to_string(),
            )
        })?;

        Ok(Self::new(endpoint, token))
    }
}

#[async_trait]
impl GraphQLTransport for HttpTransport {
    async fn execute(&self, query: &str, variables: &Value) -> Result<GraphQLResponse<Value>> {
        debug!(endpoint = %self.endpoint, "Sending GraphQL request");

        let request_body = json!({
            "query": query,
            "variables": variables,
        });

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.token)
            .header("User-Agent", "boardsync")
            .json(&request_body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read response".to_string());
            return Err(Error::Http(format!("status {}: {}", status, text)));
        }

        response
            .json()
            .await
            .map_err(|e| Error::Parse(format!("Failed to parse GraphQL response: {}", e)))
    }
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}
