// ABOUTME: Databricks-backed streaming engine
// ABOUTME: Wires SQL statements and Jobs runs into the StreamingEngine trait

pub mod client;
pub mod config;
pub mod jobs;
pub mod statements;

pub use client::DatabricksClient;
pub use config::DatabricksConfig;

use crate::replication::engine::{StreamHandle, StreamOutcome, StreamingEngine};
use crate::replication::stream::StreamSpec;
use crate::replication::tables::TableRef;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Streaming engine that runs statements on a SQL warehouse and launches
/// each stream as a one-time job run.
#[derive(Debug, Clone)]
pub struct DatabricksEngine {
    client: DatabricksClient,
    invocation_id: String,
}

impl DatabricksEngine {
    pub fn new(config: DatabricksConfig) -> Result<Self> {
        Ok(Self {
            client: DatabricksClient::new(config)?,
            invocation_id: new_invocation_id(),
        })
    }
}

/// Unique per process run; scopes run-submission idempotency tokens
fn new_invocation_id() -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    format!("{:x}-{:x}", nanos, std::process::id())
}

#[async_trait]
impl StreamingEngine for DatabricksEngine {
    async fn list_tables(&self, catalog: &str, schema: &str) -> Result<Vec<TableRef>> {
        let names = statements::show_tables(&self.client, catalog, schema).await?;
        Ok(names
            .into_iter()
            .map(|name| TableRef::new(catalog, schema, name))
            .collect())
    }

    async fn create_schema_if_not_exists(&self, catalog: &str, schema: &str) -> Result<()> {
        statements::create_schema_if_not_exists(&self.client, catalog, schema).await
    }

    async fn start_stream(&self, spec: &StreamSpec) -> Result<StreamHandle> {
        let run_id = jobs::submit_stream_run(&self.client, spec, &self.invocation_id).await?;
        tracing::debug!("Submitted run {} for {}", run_id, spec.target);
        Ok(StreamHandle {
            id: run_id.to_string(),
            target_table: spec.target_table(),
        })
    }

    async fn wait_for_stream(
        &self,
        handle: &StreamHandle,
        timeout: Duration,
    ) -> Result<StreamOutcome> {
        let run_id: u64 = handle
            .id
            .parse()
            .with_context(|| format!("Invalid run id '{}'", handle.id))?;
        jobs::wait_for_run(&self.client, run_id, timeout).await
    }
}
