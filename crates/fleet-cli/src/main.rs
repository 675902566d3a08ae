//! fleet CLI
//!
//! Command-line interface for interacting with the fleet daemon.

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// fleet - cluster-aware workflow scheduler
#[derive(Parser, Debug)]
#[command(name = "fleet")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Daemon API address
    #[arg(long, default_value = "http://localhost:9090", global = true)]
    api: String,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Submit a workflow to run now
    Submit {
        /// Workflow definition file
        file: PathBuf,

        /// Subscription tier
        #[arg(long, default_value = "free")]
        tier: String,

        /// CPU cores
        #[arg(long, default_value_t = 2)]
        cores: u32,

        /// Memory in megabytes
        #[arg(long, default_value_t = 2048)]
        memory_mb: u64,

        /// Repository clone URL
        #[arg(long, default_value = "")]
        repository_url: String,

        /// Branch to run against
        #[arg(long, default_value = "main")]
        branch: String,
    },

    /// Register a workflow's cron triggers
    Schedule {
        /// Repository identifier
        repository: String,

        /// Workflow definition file
        file: PathBuf,

        /// Path of the workflow inside the repository (defaults to the file name)
        #[arg(long)]
        workflow_path: Option<String>,
    },

    /// Remove a workflow's cron triggers
    Unschedule {
        /// Repository identifier
        repository: String,

        /// Path of the workflow inside the repository
        workflow_path: String,

        /// Only remove this expression
        #[arg(long)]
        cron: Option<String>,
    },

    /// List scheduled workflows
    Schedules {
        /// Only show this repository
        #[arg(long)]
        repository: Option<String>,
    },

    /// Enable or disable a cron trigger
    Toggle {
        /// Repository identifier
        repository: String,

        /// Path of the workflow inside the repository
        workflow_path: String,

        /// Cron expression as written in the workflow
        cron: String,

        /// Disable instead of enable
        #[arg(long)]
        disable: bool,
    },

    /// Describe a cron expression
    Describe {
        /// Cron expression, e.g. "0 9 * * 1-5"
        expression: String,
    },

    /// List cluster nodes
    Clusters,

    /// Show cluster statistics
    Stats,

    /// Show the resource limits of a tier
    Limits {
        /// Tier name
        tier: String,
    },

    /// Show system status
    Status,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::WARN
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);

    let client = commands::ApiClient::new(&cli.api);

    match cli.command {
        Commands::Submit {
            file,
            tier,
            cores,
            memory_mb,
            repository_url,
            branch,
        } => {
            let definition = std::fs::read_to_string(&file)?;
            let job = fleet_core::JobRequest {
                workflow_id: None,
                workflow_definition: definition,
                repository_url,
                branch,
                env: Default::default(),
                cores,
                memory_mb,
            };
            commands::submit(&client, tier, job).await?;
        }
        Commands::Schedule {
            repository,
            file,
            workflow_path,
        } => {
            let definition = std::fs::read_to_string(&file)?;
            let workflow_path = workflow_path.unwrap_or_else(|| {
                file.file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_else(|| file.display().to_string())
            });
            commands::schedule(&client, repository, workflow_path, definition).await?;
        }
        Commands::Unschedule {
            repository,
            workflow_path,
            cron,
        } => {
            commands::unschedule(&client, repository, workflow_path, cron).await?;
        }
        Commands::Schedules { repository } => {
            commands::schedules(&client, repository).await?;
        }
        Commands::Toggle {
            repository,
            workflow_path,
            cron,
            disable,
        } => {
            commands::toggle(&client, repository, workflow_path, cron, !disable).await?;
        }
        Commands::Describe { expression } => {
            commands::describe(&client, expression).await?;
        }
        Commands::Clusters => {
            commands::clusters(&client).await?;
        }
        Commands::Stats => {
            commands::stats(&client).await?;
        }
        Commands::Limits { tier } => {
            commands::limits(&client, tier).await?;
        }
        Commands::Status => {
            commands::status(&client).await?;
        }
    }

    Ok(())
}
