//! Scripted in-memory transport for unit tests

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use boardsync_core::Config;
use serde_json::{json, Value};

use crate::graphql::{GraphQLResponse, GraphQLTransport};
use crate::{Error, GitHubClient, Result};

/// A request seen by [`FakeTransport`]
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub query: String,
    pub variables: Value,
}

/// Replays queued responses in order and records every request
#[derive(Default)]
pub struct FakeTransport {
    responses: Mutex<VecDeque<Result<Value>>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a raw response envelope
    pub fn push_envelope(&self, envelope: Value) {
        self.responses.lock().unwrap().push_back(Ok(envelope));
    }

    /// Queue a successful response carrying `data`
    pub fn push_data(&self, data: Value) {
        self.push_envelope(json!({ "data": data }));
    }

    /// Queue a response carrying GraphQL errors
    pub fn push_errors(&self, messages: &[&str]) {
        let errors: Vec<Value> = messages.iter().map(|m| json!({ "message": m })).collect();
        self.push_envelope(json!({ "data": null, "errors": errors }));
    }

    /// Queue a transport failure
    pub fn push_failure(&self, message: &str) {
        self.responses
            .lock()
            .unwrap()
            .push_back(Err(Error::Http(message.to_string())));
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn remaining(&self) -> usize {
        self.responses.lock().unwrap().len()
    }
}

#[async_trait]
impl GraphQLTransport for FakeTransport {
    async fn execute(&self, query: &str, variables: &Value) -> Result<GraphQLResponse<Value>> {
        self.requests.lock().unwrap().push(RecordedRequest {
            query: query.to_string(),
            variables: variables.clone(),
        });

        let next = self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(Error::Http("no scripted response".to_string())));

        next.and_then(|envelope| {
            serde_json::from_value(envelope).map_err(|e| Error::Parse(e.to_string()))
        })
    }
}

/// Client over a fresh fake, using the default configuration
pub fn fake_client() -> (Arc<FakeTransport>, GitHubClient) {
    let fake = Arc::new(FakeTransport::new());
    let client = GitHubClient::new(fake.clone(), &Config::default()).unwrap();
    (fake, client)
}

/// One item node as returned by the item listing queries
pub fn item_node(item_id: &str, content_id: &str, number: u64) -> Value {
    json!({
        "id": item_id,
        "customer": { "text": format!("customer of #{}", number) },
        "notes": { "text": format!("notes for #{}", number) },
        "priority": { "name": "High" },
        "content": { "id": content_id, "number": number }
    })
}

/// An items connection with the given nodes and page info
pub fn item_connection(nodes: Vec<Value>, has_next_page: bool, end_cursor: Option<&str>) -> Value {
    json!({
        "pageInfo": { "hasNextPage": has_next_page, "endCursor": end_cursor },
        "nodes": nodes
    })
}

/// Wrap an items connection in an organization-project response
pub fn org_items_data(connection: Value) -> Value {
    json!({ "organization": { "projectV2": { "items": connection } } })
}

/// Wrap an items connection in a repository-project response
pub fn repo_items_data(connection: Value) -> Value {
    json!({ "repository": { "projectV2": { "items": connection } } })
}

/// Project listing response for the release locator
pub fn projects_data(projects: Vec<Value>) -> Value {
    let edges: Vec<Value> = projects.into_iter().map(|p| json!({ "node": p })).collect();
    json!({ "organization": { "projectsV2": { "edges": edges } } })
}

/// A release board node with customer, notes and priority fields
pub fn release_project(id: &str, title: &str, number: u64) -> Value {
    json!({
        "id": id,
        "title": title,
        "number": number,
        "fields": { "nodes": [
            { "id": "F_title", "name": "Title" },
            { "id": "F_customer", "name": "Customer" },
            { "id": "F_notes", "name": "Notes" },
            { "id": "F_priority", "name": "Priority", "options": [
                { "id": "OPT_high", "name": "High" },
                { "id": "OPT_low", "name": "Low" }
            ]}
        ]}
    })
}
