//! Project item mutations

use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info, warn};

use crate::projects::ReleaseFields;
use crate::{GitHubClient, Result};

const ADD_ITEM_MUTATION: &str = r#"
mutation AddProjectItem($projectId: ID!, $contentId: ID!) {
  addProjectV2ItemById(input: {projectId: $projectId, contentId: $contentId}) {
    item {
      id
    }
  }
}
"#;

const UPDATE_FIELDS_MUTATION: &str = r#"
mutation UpdateReleaseFields($projectId: ID!, $itemId: ID!,
                             $customerField: ID!, $customer: String!,
                             $notesField: ID!, $notes: String!,
                             $priorityField: ID!, $priority: String!) {
  customer: updateProjectV2ItemFieldValue(input: {
    projectId: $projectId, itemId: $itemId, fieldId: $customerField, value: {text: $customer}
  }) {
    projectV2Item {
      id
    }
  }
  notes: updateProjectV2ItemFieldValue(input: {
    projectId: $projectId, itemId: $itemId, fieldId: $notesField, value: {text: $notes}
  }) {
    projectV2Item {
      id
    }
  }
  priority: updateProjectV2ItemFieldValue(input: {
    projectId: $projectId, itemId: $itemId, fieldId: $priorityField, value: {singleSelectOptionId: $priority}
  }) {
    projectV2Item {
      id
    }
  }
}
"#;

/// Values written to a destination item in one mutation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldUpdate {
    pub project_id: String,
    pub item_id: String,
    pub fields: ReleaseFields,
    pub customer: String,
    pub notes: String,
    /// Option id; empty clears the priority
    pub priority_option: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddItemData {
    add_project_v2_item_by_id: Option<AddItemPayload>,
}

#[derive(Debug, Deserialize)]
struct AddItemPayload {
    item: Option<ItemRef>,
}

#[derive(Debug, Deserialize)]
struct ItemRef {
    id: String,
}

#[derive(Debug, Deserialize)]
struct UpdateFieldsData {
    customer: Option<UpdatePayload>,
    notes: Option<UpdatePayload>,
    priority: Option<UpdatePayload>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdatePayload {
    project_v2_item: Option<ItemRef>,
}

fn confirmed(payload: &Option<UpdatePayload>) -> bool {
    payload
        .as_ref()
        .and_then(|p| p.project_v2_item.as_ref())
        .is_some()
}

impl GitHubClient {
    /// Add an issue to a project by its content id
    ///
    /// Returns the item id, or `None` when the response carries no item.
    /// Adding an issue that is already on the board returns the existing item.
    pub async fn add_item_to_project(
        &self,
        project_id: &str,
        content_id: &str,
    ) -> Result<Option<String>> {
        debug!(project_id, content_id, "Adding item to project");

        let variables = json!({
            "projectId": project_id,
            "contentId": content_id,
        });

        let data: AddItemData = self.graphql_query(ADD_ITEM_MUTATION, &variables).await?;

        let item_id = data
            .add_project_v2_item_by_id
            .and_then(|p| p.item)
            .map(|i| i.id);

        match &item_id {
            Some(id) => info!(project_id, item_id = %id, "Added item to project"),
            None => warn!(project_id, content_id, "Add item response had no item"),
        }

        Ok(item_id)
    }

    /// Set customer, notes and priority on an item in a single mutation
    ///
    /// Returns the names of the fields whose update was not confirmed. A
    /// rejected alias comes back as an error next to partial data; that is
    /// logged and reported as unconfirmed rather than failing.
    pub async fn update_item_fields(&self, update: &FieldUpdate) -> Result<Vec<&'static str>> {
        debug!(
            project_id = %update.project_id,
            item_id = %update.item_id,
            priority_option = %update.priority_option,
            "Updating item fields"
        );

        let variables = json!({
            "projectId": update.project_id,
            "itemId": update.item_id,
            "customerField": update.fields.customer,
            "customer": update.customer,
            "notesField": update.fields.notes,
            "notes": update.notes,
            "priorityField": update.fields.priority,
            "priority": update.priority_option,
        });

        let (data, errors): (UpdateFieldsData, _) = self
            .graphql_query_partial(UPDATE_FIELDS_MUTATION, &variables)
            .await?;

        for message in &errors {
            warn!(item_id = %update.item_id, error = %message, "Field update error");
        }

        let unconfirmed: Vec<&'static str> = [
            ("customer", &data.customer),
            ("notes", &data.notes),
            ("priority", &data.priority),
        ]
        .into_iter()
        .filter(|(_, payload)| !confirmed(payload))
        .map(|(name, _)| name)
        .collect();

        if unconfirmed.is_empty() {
            info!(item_id = %update.item_id, "Updated item fields");
        } else {
            warn!(item_id = %update.item_id, ?unconfirmed, "Field update not confirmed");
        }

        Ok(unconfirmed)
    }
}
