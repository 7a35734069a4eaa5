//! Copy an issue onto its release board and synchronize its fields

use boardsync_core::Config;
use tracing::{debug, info, warn};

use crate::mutations::FieldUpdate;
use crate::projects::{FieldOption, Project};
use crate::{Error, GitHubClient, ProjectItem, Result};

/// Steps of a sync run, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStage {
    LocateProject,
    FindSourceIssue,
    AddToProject,
    FindDestinationItem,
    ResolvePriorityOption,
    UpdateFields,
    Done,
}

/// Parameters of one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOptions {
    pub release: String,
    pub issue: u64,
    /// Repository-level board the issue is tracked on
    pub source_project: u64,
    /// Locate and search only, write nothing
    pub dry_run: bool,
}

impl SyncOptions {
    pub fn from_config(config: &Config, dry_run: bool) -> Self {
        Self {
            release: config.sync.release.clone(),
            issue: config.sync.issue,
            source_project: config.github.source_project,
            dry_run,
        }
    }
}

/// What a run found and wrote
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOutcome {
    pub project: Project,
    pub source_item: ProjectItem,
    /// Item on the release board; `None` only in a dry run before the issue was added
    pub destination_item: Option<ProjectItem>,
    pub customer: String,
    pub notes: String,
    /// Resolved priority option id; empty clears the priority
    pub priority_option: String,
    /// Field updates the API did not confirm
    pub unconfirmed: Vec<&'static str>,
    pub dry_run: bool,
}

/// Resolve the destination option matching a source priority name
///
/// Names compare case-insensitively. No match resolves to `None`.
pub fn resolve_priority_option(options: &[FieldOption], priority: Option<&str>) -> Option<String> {
    let priority = priority?.to_lowercase();

    options
        .iter()
        .find(|o| o.name.to_lowercase() == priority)
        .map(|o| o.id.clone())
}

fn enter(stage: SyncStage) {
    debug!(?stage, "Sync stage");
}

/// Run the sync: locate the release board, copy the issue, write the fields
///
/// A missing project or item fails the run. A failed add is only logged;
/// the destination search that follows decides whether the issue is there.
pub async fn run_sync(client: &GitHubClient, options: &SyncOptions) -> Result<SyncOutcome> {
    info!(
        release = %options.release,
        issue = options.issue,
        dry_run = options.dry_run,
        "Starting release board sync"
    );

    enter(SyncStage::LocateProject);
    let project = client
        .find_release_project(&options.release)
        .await?
        .ok_or_else(|| Error::ProjectNotFound {
            release: options.release.clone(),
        })?;

    enter(SyncStage::FindSourceIssue);
    let source_scope = client.repo_scope();
    let source_item = client
        .find_project_item(&source_scope, options.source_project, options.issue)
        .await
        .ok_or_else(|| Error::IssueNotFound {
            number: options.issue,
            scope: format!("{} project #{}", source_scope, options.source_project),
        })?;
    let content = source_item.content.clone().ok_or_else(|| {
        Error::MissingData(format!("linked issue on item {}", source_item.id))
    })?;
    info!(
        item_id = %source_item.id,
        content_id = %content.id,
        customer = ?source_item.customer,
        priority = ?source_item.priority,
        "Found source issue"
    );

    enter(SyncStage::AddToProject);
    if options.dry_run {
        info!(project = %project.title, "Dry run: skipping add to project");
    } else {
        match client.add_item_to_project(&project.id, &content.id).await {
            Ok(Some(_)) => {}
            Ok(None) => warn!(project = %project.title, "Add to project was not confirmed"),
            Err(e) => warn!(project = %project.title, error = %e, "Add to project failed"),
        }
    }

    enter(SyncStage::FindDestinationItem);
    let dest_scope = client.org_scope();
    let destination_item = client
        .find_project_item(&dest_scope, project.number, options.issue)
        .await;
    if destination_item.is_none() && !options.dry_run {
        return Err(Error::IssueNotFound {
            number: options.issue,
            scope: format!("{} project #{}", dest_scope, project.number),
        });
    }

    enter(SyncStage::ResolvePriorityOption);
    let fields = project.release_fields(client.fields())?;
    let priority_option =
        resolve_priority_option(&fields.priority_options, source_item.priority.as_deref())
            .unwrap_or_default();
    if priority_option.is_empty() {
        info!(priority = ?source_item.priority, "No matching priority option, clearing priority");
    }

    let customer = source_item.customer.clone().unwrap_or_default();
    let notes = source_item.notes.clone().unwrap_or_default();

    let mut unconfirmed = Vec::new();
    if let (Some(dest), false) = (&destination_item, options.dry_run) {
        enter(SyncStage::UpdateFields);
        let update = FieldUpdate {
            project_id: project.id.clone(),
            item_id: dest.id.clone(),
            fields,
            customer: customer.clone(),
            notes: notes.clone(),
            priority_option: priority_option.clone(),
        };
        unconfirmed = client.update_item_fields(&update).await?;
    }

    enter(SyncStage::Done);
    info!(
        project = %project.title,
        issue = options.issue,
        dry_run = options.dry_run,
        "Release board sync finished"
    );

    Ok(SyncOutcome {
        project,
        source_item,
        destination_item,
        customer,
        notes,
        priority_option,
        unconfirmed,
        dry_run: options.dry_run,
    })
}
