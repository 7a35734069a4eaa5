//! Boardsync CLI - copy an issue onto its release board
//!
//! Runs as a workflow action step or from a terminal. With no subcommand it
//! performs a sync using action inputs (INPUT_RELEASE, INPUT_ISSUE,
//! INPUT_TOKEN) or their config/CLI equivalents.

mod commands;

use std::process::ExitCode;

use boardsync_core::{Config, ConfigOverrides, Secrets};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use commands::{CheckArgs, SyncArgs};

/// Copy an issue onto its release project board and sync its fields
#[derive(Parser, Debug)]
#[command(name = "boardsync")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(flatten)]
    overrides: OverrideArgs,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Run parameters that override config file and environment
#[derive(Args, Debug, Default)]
struct OverrideArgs {
    /// Release label used to find the release board (e.g. 2.4)
    #[arg(long, global = true)]
    release: Option<String>,

    /// Issue number to copy
    #[arg(long, global = true)]
    issue: Option<u64>,

    /// Organization owning the release boards
    #[arg(long, global = true)]
    org: Option<String>,

    /// Repository owning the source board (owner/repo or URL)
    #[arg(long, global = true)]
    repo: Option<String>,

    /// Number of the repository-level source board
    #[arg(long, global = true)]
    source_project: Option<u64>,

    /// GraphQL endpoint
    #[arg(long, global = true)]
    endpoint: Option<String>,
}

impl From<OverrideArgs> for ConfigOverrides {
    fn from(args: OverrideArgs) -> Self {
        ConfigOverrides {
            release: args.release,
            issue: args.issue,
            org: args.org,
            repo: args.repo,
            source_project: args.source_project,
            endpoint: args.endpoint,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Copy the issue to the release board and sync fields (default)
    Sync(SyncArgs),

    /// Verify the token and source repository access
    Check(CheckArgs),

    /// Create a secrets file template
    Init,

    /// Show current configuration
    Config,

    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let message = format!("{:#}", e);
            tracing::error!(error = %message, "boardsync failed");
            println!("::error::{}", escape_annotation(&message));
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::load_with_overrides(cli.overrides.into())?;

    if cli.verbose {
        tracing::info!(
            release = %config.sync.release,
            issue = config.sync.issue,
            org = %config.github.org,
            repo = %config.github.repo,
            "Configuration loaded"
        );
    }

    match cli.command {
        None => SyncArgs::default().execute(&config).await,
        Some(Commands::Sync(args)) => args.execute(&config).await,
        Some(Commands::Check(args)) => args.execute(&config).await,
        Some(Commands::Init) => {
            let path = Secrets::create_template()?;
            println!("Created {}", path.display());
            println!("Add your GitHub token there, or set GITHUB_TOKEN.");
            Ok(())
        }
        Some(Commands::Config) => {
            print_config(&config);
            Ok(())
        }
        Some(Commands::Version) => {
            println!("boardsync {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn print_config(config: &Config) {
    println!("Boardsync Configuration");
    println!("=======================");
    println!();
    println!("Sync:");
    println!("  release: {}", config.sync.release);
    println!("  issue: {}", config.sync.issue);
    println!();
    println!("GitHub:");
    println!("  org: {}", config.github.org);
    println!("  repo: {}", config.github.repo);
    println!("  source_project: {}", config.github.source_project);
    println!("  endpoint: {}", config.github.endpoint);
    println!();
    println!("Fields:");
    println!("  customer: {}", config.fields.customer);
    println!("  notes: {}", config.fields.notes);
    println!("  priority: {}", config.fields.priority);
    println!();
    if let Some(path) = Config::default_config_path() {
        println!("Config file: {}", path.display());
        if path.exists() {
            println!("  (exists)");
        } else {
            println!("  (not found - using defaults)");
        }
    }
}

/// Escape a message for a workflow `::error::` annotation
fn escape_annotation(message: &str) -> String {
    message
        .replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}
