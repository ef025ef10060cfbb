//! taskflow-remote CLI
//!
//! Synchronize the local task collection with a GitHub Gist.
//!
//! # Commands
//!
//! - `gist-init` - Create a gist and remember its id
//! - `gist-status` - Show what a sync would do
//! - `gist-pull` - Overwrite local tasks with the gist
//! - `gist-push` - Overwrite the gist with local tasks
//! - `gist-sync` - Reconcile local tasks and the gist

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use taskflow_remote::sync::{GistConfig, DEFAULT_API_BASE, TOKEN_ENV};
use taskflow_remote::{GistSync, RemoteConfig, RemoteError, StorageConfig, SyncOptions};

/// Sync taskflow tasks with a GitHub Gist.
#[derive(Parser)]
#[command(name = "taskflow-remote")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory holding the task documents
    #[arg(global = true, long, env = "TASKFLOW_STORAGE_DIR")]
    storage_dir: Option<PathBuf>,

    /// Main task document file name
    #[arg(global = true, long, default_value = "tasks.yaml")]
    tasks_file: String,

    /// Archive document file name (derived from --tasks-file by default)
    #[arg(global = true, long)]
    archive_file: Option<String>,

    /// Sync metadata database (defaults to <storage-dir>/sync-state.db)
    #[arg(global = true, long)]
    state_db: Option<PathBuf>,

    /// Gist API base URL
    #[arg(global = true, long, env = "TASKFLOW_GIST_API", default_value = DEFAULT_API_BASE)]
    api_base: String,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a gist for task storage and remember its id
    GistInit {
        /// Create a public gist (default private)
        #[arg(long)]
        public: bool,
    },

    /// Show gist sync status
    GistStatus {
        /// Print status as JSON
        #[arg(long)]
        json: bool,
    },

    /// Overwrite local tasks with the gist (no conflict check)
    GistPull,

    /// Overwrite the gist with local tasks (no conflict check)
    GistPush,

    /// Reconcile local tasks and the gist
    GistSync {
        /// Resolve a divergence by overwriting one side
        #[arg(long)]
        force: bool,

        /// Side that wins with --force: push or pull
        #[arg(long)]
        mode: Option<String>,
    },
}

impl Cli {
    fn remote_config(&self) -> RemoteConfig {
        let storage = StorageConfig {
            dir: self
                .storage_dir
                .clone()
                .unwrap_or_else(taskflow_remote::default_storage_dir),
            tasks_file: self.tasks_file.clone(),
            archive_file: self.archive_file.clone(),
        };
        let gist = GistConfig::default()
            .with_api_base(&self.api_base)
            .with_token(std::env::var(TOKEN_ENV).unwrap_or_default());
        RemoteConfig {
            storage,
            gist,
            state_db: self.state_db.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    // Reject a bad mode before touching storage or the network.
    let options = match &cli.command {
        Commands::GistSync { force, mode } => Some(
            SyncOptions::from_flags(*force, mode.as_deref()).map_err(RemoteError::from)?,
        ),
        _ => None,
    };

    let gist = GistSync::open(cli.remote_config()).context("failed to open local storage")?;

    match cli.command {
        Commands::GistInit { public } => {
            let outcome = gist.init(public).await.context("gist-init failed")?;
            println!("{outcome}");
        }
        Commands::GistStatus { json } => {
            let Some(id) = gist.gist_id().await? else {
                println!("No gist configured.");
                return Ok(ExitCode::SUCCESS);
            };
            let status = gist.status().await.context("gist-status failed")?;
            if json {
                println!("{}", serde_json::to_string_pretty(&status)?);
            } else {
                println!("Configured gist: {id}");
                println!("Remote version: {}", status.remote_version);
                println!("Last synced version: {}", status.stored.last_version);
                println!("Local changed: {}", status.local_changed);
                println!("Remote changed: {}", status.remote_changed);
                println!("Planned action: {:?}", status.planned);
            }
        }
        Commands::GistPull => {
            let version = gist.pull().await.context("gist-pull failed")?;
            println!("Pulled remote state (version {version}).");
        }
        Commands::GistPush => {
            let version = gist.push().await.context("gist-push failed")?;
            println!("Pushed local state (version {version}).");
        }
        Commands::GistSync { .. } => {
            let options = options.unwrap_or_default();
            let outcome = gist.sync(&options).await.context("gist-sync failed")?;
            println!("{outcome}");
            if outcome.is_diverged() {
                return Ok(ExitCode::from(2));
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}
