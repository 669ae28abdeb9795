// ABOUTME: Replicate command implementation - incremental schema copy
// ABOUTME: Starts one available-now stream per source table into the target catalog

use crate::params::ReplicationParams;
use crate::replication::{list_source_tables, StreamOutcome, StreamSpec, StreamingEngine, TableRef};
use anyhow::{Context, Result};
use std::time::Duration;

/// What to do when one table's stream fails to start
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Log the failure, keep going, and report every failed table at the end
    #[default]
    Continue,
    /// Stop at the first failed table
    Abort,
}

#[derive(Debug, Clone)]
pub struct ReplicateOptions {
    pub failure_policy: FailurePolicy,
    /// Wait for each stream to finish before starting the next one
    pub wait: bool,
    pub wait_timeout: Duration,
}

impl Default for ReplicateOptions {
    fn default() -> Self {
        Self {
            failure_policy: FailurePolicy::Continue,
            wait: false,
            wait_timeout: Duration::from_secs(3600),
        }
    }
}

/// Per-run result: which target tables got a stream and which did not
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplicationSummary {
    pub started: Vec<String>,
    pub failed: Vec<(String, String)>,
}

impl ReplicationSummary {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Replicate every table of `params.catalog.params.schema` into
/// `params.target_catalog.params.schema`
///
/// Steps:
/// 1. Validates the parameters
/// 2. Creates the target schema if needed
/// 3. Lists the source tables (a listing failure is fatal)
/// 4. For each table, starts an append-only stream that reads net-new commits
///    with `skipChangeCommits`, merges new columns into the target, keeps its
///    checkpoint at `{checkpoint}/{table}`, and processes available data once
///
/// The driver has no scheduler; run it periodically so no source data ages out
/// before it is copied.
///
/// # Errors
///
/// Returns an error if the parameters are invalid, the target schema cannot be
/// created, or the source cannot be listed. With [`FailurePolicy::Abort`] the
/// first table failure is returned; with [`FailurePolicy::Continue`] all tables
/// are attempted and an error naming every failed table is returned at the end.
pub async fn replicate(
    engine: &dyn StreamingEngine,
    params: ReplicationParams,
    options: &ReplicateOptions,
) -> Result<ReplicationSummary> {
    let params = params.validate()?;

    tracing::info!("Starting schema replication...");
    tracing::info!(
        "Source: {}.{}  Target: {}.{}",
        params.catalog,
        params.schema,
        params.target_catalog,
        params.schema
    );
    tracing::info!("Checkpoint root: {}", params.checkpoint);

    engine
        .create_schema_if_not_exists(&params.target_catalog, &params.schema)
        .await
        .with_context(|| {
            format!(
                "Failed to create target schema {}.{}",
                params.target_catalog, params.schema
            )
        })?;
    tracing::info!(
        "✓ Target schema {}.{} is ready",
        params.target_catalog,
        params.schema
    );

    let tables = list_source_tables(engine, &params).await?;
    if tables.is_empty() {
        tracing::warn!("⚠ No tables found in {}.{}", params.catalog, params.schema);
        return Ok(ReplicationSummary::default());
    }

    let mut summary = ReplicationSummary::default();

    for table in &tables {
        let target = table.target_name(&params.target_catalog);
        tracing::info!("Processing table name {}", target);

        match replicate_table(engine, table, &params, options).await {
            Ok(()) => {
                tracing::info!("✓ {}", target);
                summary.started.push(target);
            }
            Err(e) => {
                tracing::error!("✗ {}: {:#}", target, e);
                if options.failure_policy == FailurePolicy::Abort {
                    return Err(e.context(format!("Replication aborted at {}", target)));
                }
                summary.failed.push((target, format!("{:#}", e)));
            }
        }
    }

    tracing::info!("");
    tracing::info!("========================================");
    tracing::info!(
        "Started {} of {} stream(s)",
        summary.started.len(),
        tables.len()
    );
    tracing::info!("========================================");

    if !summary.is_success() {
        let names: Vec<&str> = summary.failed.iter().map(|(t, _)| t.as_str()).collect();
        anyhow::bail!(
            "{} table(s) failed to replicate: {}",
            summary.failed.len(),
            names.join(", ")
        );
    }

    Ok(summary)
}

async fn replicate_table(
    engine: &dyn StreamingEngine,
    table: &TableRef,
    params: &ReplicationParams,
    options: &ReplicateOptions,
) -> Result<()> {
    let spec = StreamSpec::incremental_copy(table, &params.target_catalog, &params.checkpoint);
    tracing::debug!("Stream spec: {:?}", spec);

    let handle = engine
        .start_stream(&spec)
        .await
        .with_context(|| format!("Failed to start stream for {}", spec.source))?;

    if !options.wait {
        return Ok(());
    }

    match engine.wait_for_stream(&handle, options.wait_timeout).await? {
        StreamOutcome::Succeeded => Ok(()),
        StreamOutcome::Failed(reason) => anyhow::bail!("Stream failed: {}", reason),
        StreamOutcome::TimedOut => anyhow::bail!(
            "Stream did not finish within {}s",
            options.wait_timeout.as_secs()
        ),
    }
}
