//! Boardsync GitHub - GitHub Projects integration for release boards
//!
//! This crate locates an organization-level release board, finds an issue on
//! a repository-level board, copies it across and synchronizes the customer,
//! notes and priority fields between the two items.

mod client;
mod error;
mod graphql;
mod items;
mod mutations;
mod projects;
mod repo;
mod sync;

#[cfg(test)]
mod testing;

pub use client::GitHubClient;
pub use error::{Error, Result};
pub use graphql::{GraphQLError, GraphQLResponse, GraphQLTransport, HttpTransport};
pub use items::{ItemScope, LinkedIssue, ProjectItem, PAGE_SIZE};
pub use mutations::FieldUpdate;
pub use projects::{select_release_project, FieldOption, Project, ProjectField, ReleaseFields};
pub use repo::{check_repository_access, parse_github_url, RepositoryAccess};
pub use sync::{resolve_priority_option, run_sync, SyncOptions, SyncOutcome, SyncStage};
