//! Release board lookup

use boardsync_core::FieldNames;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

use crate::{Error, GitHubClient, Result};

const RELEASE_PROJECTS_QUERY: &str = r#"
query ReleaseProjects($org: String!, $search: String!) {
  organization(login: $org) {
    projectsV2(first: 20, query: $search) {
      edges {
        node {
          id
          title
          number
          fields(first: 50) {
            nodes {
              ... on ProjectV2FieldCommon {
                id
                name
              }
              ... on ProjectV2SingleSelectField {
                options {
                  id
                  name
                }
              }
            }
          }
        }
      }
    }
  }
}
"#;

/// Option of a single-select field
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FieldOption {
    pub id: String,
    pub name: String,
}

/// Custom field on a project board
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectField {
    pub id: String,
    pub name: String,
    /// Options, for single-select fields; empty otherwise
    pub options: Vec<FieldOption>,
}

/// Organization-level project board with its field metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    pub id: String,
    pub title: String,
    pub number: u64,
    pub fields: Vec<ProjectField>,
}

/// Field ids needed to write the synchronized values
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseFields {
    pub customer: String,
    pub notes: String,
    pub priority: String,
    pub priority_options: Vec<FieldOption>,
}

impl Project {
    /// Find a field by name, ignoring case
    pub fn field(&self, name: &str) -> Option<&ProjectField> {
        let name = name.to_lowercase();
        self.fields.iter().find(|f| f.name.to_lowercase() == name)
    }

    /// Resolve the customer, notes and priority fields
    pub fn release_fields(&self, names: &FieldNames) -> Result<ReleaseFields> {
        let lookup = |name: &str| {
            self.field(name).ok_or_else(|| {
                Error::MissingData(format!("field '{}' on project '{}'", name, self.title))
            })
        };

        let priority = lookup(&names.priority)?;

        Ok(ReleaseFields {
            customer: lookup(&names.customer)?.id.clone(),
            notes: lookup(&names.notes)?.id.clone(),
            priority: priority.id.clone(),
            priority_options: priority.options.clone(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct ReleaseProjectsData {
    organization: Option<OrganizationProjects>,
}

#[derive(Debug, Deserialize)]
struct OrganizationProjects {
    #[serde(rename = "projectsV2")]
    projects: Option<ProjectConnection>,
}

#[derive(Debug, Deserialize)]
struct ProjectConnection {
    #[serde(default)]
    edges: Vec<Option<ProjectEdge>>,
}

#[derive(Debug, Deserialize)]
struct ProjectEdge {
    node: Option<ProjectNode>,
}

#[derive(Debug, Deserialize)]
struct ProjectNode {
    id: String,
    title: String,
    number: u64,
    fields: Option<FieldConnection>,
}

#[derive(Debug, Deserialize)]
struct FieldConnection {
    #[serde(default)]
    nodes: Vec<Option<FieldNode>>,
}

#[derive(Debug, Deserialize)]
struct FieldNode {
    id: Option<String>,
    name: Option<String>,
    #[serde(default)]
    options: Vec<FieldOption>,
}

impl From<ProjectNode> for Project {
    fn from(node: ProjectNode) -> Self {
        let fields = node
            .fields
            .map(|c| c.nodes)
            .unwrap_or_default()
            .into_iter()
            .flatten()
            .filter_map(|f| match (f.id, f.name) {
                (Some(id), Some(name)) => Some(ProjectField {
                    id,
                    name,
                    options: f.options,
                }),
                _ => None,
            })
            .collect();

        Project {
            id: node.id,
            title: node.title,
            number: node.number,
            fields,
        }
    }
}

/// Pick the release board out of the search results
///
/// Returns the first project whose title does NOT contain
/// `"<release> gloo platform"` (case-insensitive). The negation is the
/// established selection rule for the release boards and is kept as-is.
pub fn select_release_project<'a>(release: &str, projects: &'a [Project]) -> Option<&'a Project> {
    let excluded = format!("{} gloo platform", release).to_lowercase();

    projects
        .iter()
        .find(|p| !p.title.to_lowercase().contains(&excluded))
}

impl GitHubClient {
    /// List organization boards matching a release label
    pub async fn search_release_projects(&self, release: &str) -> Result<Vec<Project>> {
        debug!(org = %self.org(), release, "Searching release projects");

        let variables = json!({
            "org": self.org(),
            "search": release,
        });

        let data: ReleaseProjectsData = self
            .graphql_query(RELEASE_PROJECTS_QUERY, &variables)
            .await?;

        let projects: Vec<Project> = data
            .organization
            .and_then(|o| o.projects)
            .map(|c| c.edges)
            .unwrap_or_default()
            .into_iter()
            .flatten()
            .filter_map(|edge| edge.node)
            .map(Project::from)
            .collect();

        for project in &projects {
            debug!(number = project.number, title = %project.title, "Candidate project");
        }

        Ok(projects)
    }

    /// Locate the release board for `release`
    ///
    /// Returns `None` when the search comes back empty or no candidate passes
    /// [`select_release_project`].
    pub async fn find_release_project(&self, release: &str) -> Result<Option<Project>> {
        let projects = self.search_release_projects(release).await?;
        let selected = select_release_project(release, &projects).cloned();

        match &selected {
            Some(project) => info!(
                number = project.number,
                title = %project.title,
                id = %project.id,
                "Found release project"
            ),
            None => info!(release, candidates = projects.len(), "No release project selected"),
        }

        Ok(selected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{fake_client, projects_data, release_project};

    fn project(title: &str, number: u64) -> Project {
        Project {
            id: format!("PVT_{}", number),
            title: title.to_string(),
            number,
            fields: vec![],
        }
    }

    #[test]
    fn test_selection_skips_gloo_platform_title() {
        let projects = vec![
            project("2.4 Gloo Platform", 1),
            project("2.4 Gloo Edge", 2),
            project("2.4 Release", 3),
        ];

        let selected = select_release_project("2.4", &projects).unwrap();
        assert_eq!(selected.number, 2);
    }

    #[test]
    fn test_selection_never_picks_matching_title() {
        // Only the board that looks like the release board is returned, and
        // the selection rule still rejects it.
        let projects = vec![project("2.4 gloo platform", 1)];
        assert!(select_release_project("2.4", &projects).is_none());
    }

    #[test]
    fn test_selection_empty() {
        assert!(select_release_project("2.4", &[]).is_none());
    }

    #[test]
    fn test_selection_other_release_title_is_eligible() {
        let projects = vec![project("2.5 Gloo Platform", 7)];
        assert_eq!(select_release_project("2.4", &projects).unwrap().number, 7);
    }

    #[test]
    fn test_release_fields() {
        let node: ProjectNode =
            serde_json::from_value(release_project("PVT_1", "2.4 Release", 1)).unwrap();
        let project = Project::from(node);

        let fields = project.release_fields(&FieldNames::default()).unwrap();
        assert_eq!(fields.customer, "F_customer");
        assert_eq!(fields.notes, "F_notes");
        assert_eq!(fields.priority, "F_priority");
        assert_eq!(fields.priority_options.len(), 2);
    }

    #[test]
    fn test_field_lookup_ignores_case() {
        let mut board = project("2.4 Release", 1);
        board.fields.push(ProjectField {
            id: "F_prio".to_string(),
            name: "Priorität".to_string(),
            options: vec![],
        });

        assert_eq!(board.field("PRIORITÄT").unwrap().id, "F_prio");
        assert!(board.field("Priority").is_none());
    }

    #[test]
    fn test_release_fields_missing() {
        let err = project("2.4 Release", 1)
            .release_fields(&FieldNames::default())
            .unwrap_err();
        assert!(err.to_string().contains("Priority"));
    }

    #[test]
    fn test_field_nodes_without_common_fields_are_skipped() {
        let node: ProjectNode = serde_json::from_value(serde_json::json!({
            "id": "PVT_1",
            "title": "2.4",
            "number": 1,
            "fields": { "nodes": [ {}, null, { "id": "F1", "name": "Notes" } ] }
        }))
        .unwrap();

        let project = Project::from(node);
        assert_eq!(project.fields.len(), 1);
        assert!(project.field("notes").is_some());
    }

    #[tokio::test]
    async fn test_find_release_project() {
        let (fake, client) = fake_client();
        fake.push_data(projects_data(vec![
            release_project("PVT_gp", "2.4 Gloo Platform", 10),
            release_project("PVT_rel", "2.4 Release Board", 11),
        ]));

        let project = client.find_release_project("2.4").await.unwrap().unwrap();
        assert_eq!(project.id, "PVT_rel");
        assert_eq!(project.number, 11);

        let requests = fake.requests();
        assert_eq!(requests[0].variables["search"], "2.4");
        assert_eq!(requests[0].variables["org"], "solo-io");
    }

    #[tokio::test]
    async fn test_find_release_project_none() {
        let (fake, client) = fake_client();
        fake.push_data(projects_data(vec![]));

        assert!(client.find_release_project("2.4").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_find_release_project_unknown_org() {
        let (fake, client) = fake_client();
        fake.push_data(serde_json::json!({ "organization": null }));

        assert!(client.find_release_project("2.4").await.unwrap().is_none());
    }
}
