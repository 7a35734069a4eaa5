//! Check command - verify credentials and board visibility

use boardsync_core::{Config, Secrets};
use boardsync_github::{check_repository_access, parse_github_url, GitHubClient};
use clap::Args;

/// Arguments for the check command
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Skip looking up the release board
    #[arg(long)]
    pub repo_only: bool,
}

impl CheckArgs {
    /// Execute the check command
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let token = Secrets::load()?.github_token().ok_or_else(|| {
            anyhow::anyhow!(
                "GitHub token not found. Set GITHUB_TOKEN or run `boardsync init`"
            )
        })?;

        let (owner, repo) = parse_github_url(&config.github.repo)?;
        let access = check_repository_access(&token, &owner, &repo).await?;
        println!(
            "Repository: {} ({})",
            access.full_name,
            if access.private { "private" } else { "public" }
        );

        if self.repo_only {
            return Ok(());
        }

        let client = GitHubClient::from_config(config)?;
        match client.find_release_project(&config.sync.release).await? {
            Some(project) => {
                println!("Release board: {} (#{})", project.title, project.number);
                let fields = project.release_fields(client.fields())?;
                println!("  priority options: {}", fields.priority_options.len());
            }
            None => println!("Release board: none for release {}", config.sync.release),
        }

        Ok(())
    }
}
