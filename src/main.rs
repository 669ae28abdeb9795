// ABOUTME: CLI entry point for opsglue
// ABOUTME: Parses commands and routes to appropriate handlers

use clap::{Args, Parser, Subcommand};
use opsglue::commands::{self, FailurePolicy, ReplicateOptions, UploadSource};
use opsglue::config::DEFAULT_CONFIG_PATH;
use opsglue::databricks::{DatabricksConfig, DatabricksEngine};
use opsglue::params::{FileParams, ReplicationParams};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "opsglue")]
#[command(about = "Schema replication driver and S3 upload utility", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct WorkspaceArgs {
    /// Workspace URL
    #[arg(long = "databricks-host", env = "DATABRICKS_HOST")]
    host: String,
    /// Access token for the workspace
    #[arg(long = "databricks-token", env = "DATABRICKS_TOKEN", hide_env_values = true)]
    token: String,
    /// SQL warehouse used to list tables and create the target schema
    #[arg(long, env = "DATABRICKS_WAREHOUSE_ID")]
    warehouse_id: String,
    /// Cluster that runs each table's stream
    #[arg(long, env = "DATABRICKS_CLUSTER_ID")]
    cluster_id: String,
    /// Path of the stream launcher script in the workspace
    #[arg(long, env = "OPSGLUE_STREAM_LAUNCHER")]
    launcher: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Copy net-new commits of every table in a schema into a target catalog
    Replicate {
        /// Source catalog [default: system]
        #[arg(long)]
        catalog: Option<String>,
        /// Source schema, reused as the target schema [default: lakeflow]
        #[arg(long)]
        schema: Option<String>,
        /// Catalog that receives the replicated tables
        #[arg(long)]
        target_catalog: Option<String>,
        /// Checkpoint root; each table uses {checkpoint}/{table} [default: /Volumes/default/streams_1]
        #[arg(long)]
        checkpoint: Option<String>,
        /// TOML file with catalog/schema/target_catalog/checkpoint values
        #[arg(long)]
        params_file: Option<PathBuf>,
        /// Stop at the first table that fails instead of continuing
        #[arg(long)]
        fail_fast: bool,
        /// Wait for each stream to finish before starting the next
        #[arg(long)]
        wait: bool,
        /// Per-stream wait limit in seconds (with --wait)
        #[arg(long, default_value_t = 3600)]
        wait_timeout: u64,
        #[command(flatten)]
        workspace: WorkspaceArgs,
    },
    /// Upload a local file or directory to an S3 bucket
    Upload {
        /// JSON configuration file (implies non-interactive mode)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Read the default configuration file instead of prompting
        #[arg(long)]
        no_interactive: bool,
        /// Exit with an error if any file fails to upload
        #[arg(long)]
        strict: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging - default to INFO level if RUST_LOG not set
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Replicate {
            catalog,
            schema,
            target_catalog,
            checkpoint,
            params_file,
            fail_fast,
            wait,
            wait_timeout,
            workspace,
        } => {
            let params = match params_file {
                Some(path) => ReplicationParams::from_store(&FileParams::load(path)?),
                None => ReplicationParams::from_store(&HashMap::<String, String>::new()),
            }
            .with_overrides(catalog, schema, target_catalog, checkpoint);

            let engine = DatabricksEngine::new(DatabricksConfig {
                host: workspace.host,
                token: workspace.token,
                warehouse_id: workspace.warehouse_id,
                cluster_id: workspace.cluster_id,
                launcher: workspace.launcher,
            })?;

            let options = ReplicateOptions {
                failure_policy: if fail_fast {
                    FailurePolicy::Abort
                } else {
                    FailurePolicy::Continue
                },
                wait,
                wait_timeout: Duration::from_secs(wait_timeout),
            };

            commands::replicate(&engine, params, &options).await?;
            Ok(())
        }
        Commands::Upload {
            config,
            no_interactive,
            strict,
        } => {
            let source = match config {
                Some(path) => UploadSource::ConfigFile(path),
                None if no_interactive => UploadSource::ConfigFile(DEFAULT_CONFIG_PATH.into()),
                None => UploadSource::Interactive,
            };
            commands::upload(&source, strict).await?;
            Ok(())
        }
    }
}
