//! Paginated search for an issue on a project board

use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::{Error, GitHubClient, Result};

/// Items requested per page
pub const PAGE_SIZE: u32 = 100;

macro_rules! item_page_fragment {
    () => {
        r#"
fragment ItemPage on ProjectV2ItemConnection {
  pageInfo {
    hasNextPage
    endCursor
  }
  nodes {
    id
    customer: fieldValueByName(name: $customerField) {
      ... on ProjectV2ItemFieldTextValue {
        text
      }
    }
    notes: fieldValueByName(name: $notesField) {
      ... on ProjectV2ItemFieldTextValue {
        text
      }
    }
    priority: fieldValueByName(name: $priorityField) {
      ... on ProjectV2ItemFieldSingleSelectValue {
        name
      }
    }
    content {
      ... on Issue {
        id
        number
      }
      ... on PullRequest {
        id
        number
      }
    }
  }
}
"#
    };
}

const ORG_ITEMS_QUERY: &str = concat!(
    r#"
query OrgProjectItems($login: String!, $number: Int!, $first: Int!, $after: String,
                      $customerField: String!, $notesField: String!, $priorityField: String!) {
  organization(login: $login) {
    projectV2(number: $number) {
      items(first: $first, after: $after, orderBy: {field: POSITION, direction: DESC}) {
        ...ItemPage
      }
    }
  }
}
"#,
    item_page_fragment!()
);

const REPO_ITEMS_QUERY: &str = concat!(
    r#"
query RepoProjectItems($owner: String!, $name: String!, $number: Int!, $first: Int!, $after: String,
                       $customerField: String!, $notesField: String!, $priorityField: String!) {
  repository(owner: $owner, name: $name) {
    projectV2(number: $number) {
      items(first: $first, after: $after, orderBy: {field: POSITION, direction: DESC}) {
        ...ItemPage
      }
    }
  }
}
"#,
    item_page_fragment!()
);

/// Which kind of board a project number refers to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemScope {
    /// Board owned by an organization
    Organization { login: String },
    /// Board owned by a repository
    Repository { owner: String, name: String },
}

impl std::fmt::Display for ItemScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ItemScope::Organization { login } => write!(f, "{}", login),
            ItemScope::Repository { owner, name } => write!(f, "{}/{}", owner, name),
        }
    }
}

/// Issue (or pull request) an item points at
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkedIssue {
    /// Opaque node id, used for mutations
    pub id: String,
    /// Public issue number, used for matching
    pub number: u64,
}

/// Item on a project board
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectItem {
    /// Item id within the project (not the issue's id)
    pub id: String,
    pub content: Option<LinkedIssue>,
    pub customer: Option<String>,
    pub notes: Option<String>,
    /// Name of the selected priority option
    pub priority: Option<String>,
}

impl ProjectItem {
    /// Public number of the linked issue, if any
    pub fn issue_number(&self) -> Option<u64> {
        self.content.as_ref().map(|c| c.number)
    }
}

#[derive(Debug, Deserialize)]
struct ItemsData {
    organization: Option<ProjectOwner>,
    repository: Option<ProjectOwner>,
}

#[derive(Debug, Deserialize)]
struct ProjectOwner {
    #[serde(rename = "projectV2")]
    project: Option<ProjectItems>,
}

#[derive(Debug, Deserialize)]
struct ProjectItems {
    items: Option<ItemConnection>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ItemConnection {
    page_info: Option<PageInfo>,
    nodes: Option<Vec<Option<ItemNode>>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageInfo {
    has_next_page: bool,
    end_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ItemNode {
    id: String,
    customer: Option<TextValue>,
    notes: Option<TextValue>,
    priority: Option<SingleSelectValue>,
    content: Option<ContentNode>,
}

#[derive(Debug, Deserialize)]
struct TextValue {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SingleSelectValue {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ContentNode {
    id: Option<String>,
    number: Option<u64>,
}

impl From<ItemNode> for ProjectItem {
    fn from(node: ItemNode) -> Self {
        // Draft issues resolve to an empty content object
        let content = node.content.and_then(|c| match (c.id, c.number) {
            (Some(id), Some(number)) => Some(LinkedIssue { id, number }),
            _ => None,
        });

        ProjectItem {
            id: node.id,
            content,
            customer: node.customer.and_then(|v| v.text),
            notes: node.notes.and_then(|v| v.text),
            priority: node.priority.and_then(|v| v.name),
        }
    }
}

impl GitHubClient {
    /// Find the item linked to `issue_number` on a board
    ///
    /// Errors end the search and are logged; the caller only sees `None`.
    pub async fn find_project_item(
        &self,
        scope: &ItemScope,
        project_number: u64,
        issue_number: u64,
    ) -> Option<ProjectItem> {
        match self
            .search_project_items(scope, project_number, issue_number)
            .await
        {
            Ok(found) => found,
            Err(e) => {
                warn!(
                    %scope,
                    project_number,
                    issue_number,
                    error = %e,
                    "Project item search stopped"
                );
                None
            }
        }
    }

    /// Walk the board page by page until the issue is found or pages run out
    ///
    /// Items are ordered by position, descending, so recently added items
    /// come first.
    pub async fn search_project_items(
        &self,
        scope: &ItemScope,
        project_number: u64,
        issue_number: u64,
    ) -> Result<Option<ProjectItem>> {
        let mut cursor = String::new();
        let mut page = 0u32;

        loop {
            page += 1;
            debug!(%scope, project_number, page, cursor = %cursor, "Fetching project items");

            let connection = self.fetch_item_page(scope, project_number, &cursor).await?;

            let nodes = connection
                .nodes
                .ok_or_else(|| Error::MissingData("project items".to_string()))?;

            if let Some(item) = nodes
                .into_iter()
                .flatten()
                .map(ProjectItem::from)
                .find(|item| item.issue_number() == Some(issue_number))
            {
                info!(%scope, project_number, issue_number, item_id = %item.id, page, "Found project item");
                return Ok(Some(item));
            }

            let page_info = connection
                .page_info
                .ok_or_else(|| Error::MissingData("pageInfo".to_string()))?;

            if !page_info.has_next_page {
                info!(%scope, project_number, issue_number, pages = page, "Issue not on project");
                return Ok(None);
            }

            cursor = page_info
                .end_cursor
                .ok_or_else(|| Error::MissingData("endCursor".to_string()))?;
        }
    }

    async fn fetch_item_page(
        &self,
        scope: &ItemScope,
        project_number: u64,
        cursor: &str,
    ) -> Result<ItemConnection> {
        let fields = self.fields();
        let mut variables = json!({
            "number": project_number,
            "first": PAGE_SIZE,
            "after": cursor,
            "customerField": fields.customer,
            "notesField": fields.notes,
            "priorityField": fields.priority,
        });

        let query = match scope {
            ItemScope::Organization { login } => {
                variables["login"] = Value::from(login.as_str());
                ORG_ITEMS_QUERY
            }
            ItemScope::Repository { owner, name } => {
                variables["owner"] = Value::from(owner.as_str());
                variables["name"] = Value::from(name.as_str());
                REPO_ITEMS_QUERY
            }
        };

        let data: ItemsData = self.graphql_query(query, &variables).await?;

        let owner = match scope {
            ItemScope::Organization { .. } => data.organization,
            ItemScope::Repository { .. } => data.repository,
        };

        owner
            .and_then(|o| o.project)
            .and_then(|p| p.items)
            .ok_or_else(|| Error::MissingData(format!("project #{} in {}", project_number, scope)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{
        fake_client, item_connection, item_node, org_items_data, repo_items_data,
    };

    fn org() -> ItemScope {
        ItemScope::Organization {
            login: "solo-io".to_string(),
        }
    }

    fn repo() -> ItemScope {
        ItemScope::Repository {
            owner: "solo-io".to_string(),
            name: "solo-projects".to_string(),
        }
    }

    #[tokio::test]
    async fn test_found_on_first_page() {
        let (fake, client) = fake_client();
        fake.push_data(org_items_data(item_connection(
            vec![item_node("PVTI_1", "I_1", 9000), item_node("PVTI_2", "I_2", 9198)],
            true,
            Some("c1"),
        )));

        let item = client.find_project_item(&org(), 5, 9198).await.unwrap();
        assert_eq!(item.id, "PVTI_2");
        assert_eq!(
            item.content,
            Some(LinkedIssue {
                id: "I_2".to_string(),
                number: 9198
            })
        );
        assert_eq!(item.priority.as_deref(), Some("High"));
        assert_eq!(fake.request_count(), 1);
    }

    #[tokio::test]
    async fn test_found_on_second_of_three_pages() {
        let (fake, client) = fake_client();
        fake.push_data(org_items_data(item_connection(
            vec![item_node("PVTI_1", "I_1", 1)],
            true,
            Some("cursor-1"),
        )));
        fake.push_data(org_items_data(item_connection(
            vec![item_node("PVTI_2", "I_2", 2), item_node("PVTI_9198", "I_9198", 9198)],
            true,
            Some("cursor-2"),
        )));
        fake.push_data(org_items_data(item_connection(
            vec![item_node("PVTI_3", "I_3", 3)],
            false,
            None,
        )));

        let item = client.find_project_item(&org(), 5, 9198).await.unwrap();
        assert_eq!(item.id, "PVTI_9198");

        let requests = fake.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].variables["after"], "");
        assert_eq!(requests[1].variables["after"], "cursor-1");
        assert_eq!(requests[0].variables["first"], 100);
        assert_eq!(fake.remaining(), 1);
    }

    #[tokio::test]
    async fn test_not_found_after_last_page() {
        let (fake, client) = fake_client();
        for (page, has_next) in [(1, true), (2, true), (3, false)] {
            let cursor = format!("cursor-{}", page);
            fake.push_data(repo_items_data(item_connection(
                vec![item_node(&format!("PVTI_{}", page), "I", page)],
                has_next,
                has_next.then_some(cursor.as_str()),
            )));
        }

        assert!(client.find_project_item(&repo(), 1, 9198).await.is_none());
        assert_eq!(fake.request_count(), 3);
    }

    #[tokio::test]
    async fn test_repository_scope_variables() {
        let (fake, client) = fake_client();
        fake.push_data(repo_items_data(item_connection(
            vec![item_node("PVTI_1", "I_1", 9198)],
            false,
            None,
        )));

        client.find_project_item(&repo(), 3, 9198).await.unwrap();

        let request = &fake.requests()[0];
        assert!(request.query.contains("repository(owner: $owner, name: $name)"));
        assert!(request.query.contains("fragment ItemPage"));
        assert_eq!(request.variables["owner"], "solo-io");
        assert_eq!(request.variables["name"], "solo-projects");
        assert_eq!(request.variables["number"], 3);
        assert_eq!(request.variables["priorityField"], "Priority");
    }

    #[tokio::test]
    async fn test_graphql_errors_stop_search() {
        let (fake, client) = fake_client();
        fake.push_errors(&["Could not resolve to a ProjectV2 with the number 5."]);
        fake.push_data(org_items_data(item_connection(
            vec![item_node("PVTI_1", "I_1", 9198)],
            false,
            None,
        )));

        let result = client.search_project_items(&org(), 5, 9198).await;
        assert!(matches!(result, Err(Error::GraphQL(_))));
        assert_eq!(fake.request_count(), 1);
    }

    #[tokio::test]
    async fn test_transport_failure_yields_none() {
        let (fake, client) = fake_client();
        fake.push_failure("connection reset");

        assert!(client.find_project_item(&org(), 5, 9198).await.is_none());
        assert_eq!(fake.request_count(), 1);
    }

    #[tokio::test]
    async fn test_missing_page_info_stops_search() {
        let (fake, client) = fake_client();
        fake.push_data(org_items_data(serde_json::json!({
            "nodes": [item_node("PVTI_1", "I_1", 1)]
        })));

        let result = client.search_project_items(&org(), 5, 9198).await;
        assert!(matches!(result, Err(Error::MissingData(_))));
        assert_eq!(fake.request_count(), 1);
    }

    #[tokio::test]
    async fn test_missing_project_stops_search() {
        let (fake, client) = fake_client();
        fake.push_data(serde_json::json!({ "organization": { "projectV2": null } }));

        let result = client.search_project_items(&org(), 5, 9198).await;
        assert!(matches!(result, Err(Error::MissingData(_))));
    }

    #[tokio::test]
    async fn test_draft_items_are_skipped() {
        let (fake, client) = fake_client();
        fake.push_data(org_items_data(item_connection(
            vec![
                serde_json::json!({ "id": "PVTI_draft", "content": {} }),
                serde_json::Value::Null,
                item_node("PVTI_1", "I_1", 9198),
            ],
            false,
            None,
        )));

        let item = client.find_project_item(&org(), 5, 9198).await.unwrap();
        assert_eq!(item.id, "PVTI_1");
    }

    #[test]
    fn test_item_without_field_values() {
        let node: ItemNode = serde_json::from_value(serde_json::json!({
            "id": "PVTI_1",
            "customer": null,
            "notes": {},
            "priority": null,
            "content": { "id": "I_1", "number": 7 }
        }))
        .unwrap();

        let item = ProjectItem::from(node);
        assert_eq!(item.issue_number(), Some(7));
        assert!(item.customer.is_none());
        assert!(item.notes.is_none());
        assert!(item.priority.is_none());
    }
}
