// ABOUTME: Streaming engine abstraction used by the replication driver
// ABOUTME: Lets the driver run against Databricks or an in-memory test double

use crate::replication::stream::StreamSpec;
use crate::replication::tables::TableRef;
use anyhow::Result;
use async_trait::async_trait;
use std::time::Duration;

/// Handle to a started stream, as returned by the engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamHandle {
    pub id: String,
    pub target_table: String,
}

/// How a stream finished
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamOutcome {
    Succeeded,
    Failed(String),
    TimedOut,
}

/// The managed engine that owns checkpoints, schema merging and delivery.
#[async_trait]
pub trait StreamingEngine: Send + Sync {
    /// Names of all tables in `catalog.schema`, in the engine's listing order
    async fn list_tables(&self, catalog: &str, schema: &str) -> Result<Vec<TableRef>>;

    async fn create_schema_if_not_exists(&self, catalog: &str, schema: &str) -> Result<()>;

    /// Start the stream and return without waiting for it to finish
    async fn start_stream(&self, spec: &StreamSpec) -> Result<StreamHandle>;

    /// Block until the stream reaches a terminal state or `timeout` passes
    async fn wait_for_stream(&self, handle: &StreamHandle, timeout: Duration)
        -> Result<StreamOutcome>;
}
