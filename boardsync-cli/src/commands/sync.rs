//! Sync command - copy the issue and synchronize its fields

use boardsync_core::Config;
use boardsync_github::{run_sync, GitHubClient, SyncOptions, SyncOutcome};
use clap::Args;

/// Arguments for the sync command
#[derive(Args, Debug, Default)]
pub struct SyncArgs {
    /// Locate the board and items, but do not add or update anything
    #[arg(long)]
    pub dry_run: bool,
}

impl SyncArgs {
    /// Execute the sync command
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let client = GitHubClient::from_config(config)?;
        let options = SyncOptions::from_config(config, self.dry_run);

        let outcome = run_sync(&client, &options).await?;
        print_outcome(&outcome, config);

        Ok(())
    }
}

fn print_outcome(outcome: &SyncOutcome, config: &Config) {
    let value_or_none = |v: &str| if v.is_empty() { "(none)".to_string() } else { v.to_string() };

    if outcome.dry_run {
        println!("[Dry run] Nothing was written");
    }
    println!(
        "Issue #{} -> {} (project #{})",
        config.sync.issue, outcome.project.title, outcome.project.number
    );
    println!("  source item: {}", outcome.source_item.id);
    match &outcome.destination_item {
        Some(item) => println!("  release item: {}", item.id),
        None => println!("  release item: (not on board yet)"),
    }
    println!("  {}: {}", config.fields.customer, value_or_none(&outcome.customer));
    println!("  {}: {}", config.fields.notes, value_or_none(&outcome.notes));
    println!(
        "  {}: {} -> {}",
        config.fields.priority,
        outcome.source_item.priority.as_deref().unwrap_or("(none)"),
        value_or_none(&outcome.priority_option)
    );
    if !outcome.unconfirmed.is_empty() {
        println!("  unconfirmed: {}", outcome.unconfirmed.join(", "));
    }
}
