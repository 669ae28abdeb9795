// ABOUTME: Jobs API one-time runs that execute each table's stream
// ABOUTME: Submits the stream launcher with rendered arguments and polls run state

use crate::databricks::client::{self, DatabricksClient};
use crate::replication::engine::StreamOutcome;
use crate::replication::stream::StreamSpec;
use crate::utils;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::time::{Duration, Instant};

const SUBMIT_PATH: &str = "/api/2.1/jobs/runs/submit";
const GET_PATH: &str = "/api/2.1/jobs/runs/get";
const POLL_INTERVAL: Duration = Duration::from_secs(10);

#[derive(Debug, Serialize)]
struct SubmitRequest {
    run_name: String,
    idempotency_token: String,
    tasks: Vec<SubmitTask>,
}

#[derive(Debug, Serialize)]
struct SubmitTask {
    task_key: String,
    existing_cluster_id: String,
    spark_python_task: SparkPythonTask,
}

#[derive(Debug, Serialize)]
struct SparkPythonTask {
    python_file: String,
    parameters: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    run_id: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RunStatus {
    pub state: RunState,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RunState {
    pub life_cycle_state: String,
    #[serde(default)]
    pub result_state: Option<String>,
    #[serde(default)]
    pub state_message: Option<String>,
}

impl RunState {
    /// `None` while the run is still going
    pub fn outcome(&self) -> Option<StreamOutcome> {
        match self.life_cycle_state.as_str() {
            "TERMINATED" | "SKIPPED" | "INTERNAL_ERROR" => {}
            _ => return None,
        }
        if self.result_state.as_deref() == Some("SUCCESS") {
            return Some(StreamOutcome::Succeeded);
        }
        Some(StreamOutcome::Failed(format!(
            "{}/{}: {}",
            self.life_cycle_state,
            self.result_state.as_deref().unwrap_or("NO_RESULT"),
            self.state_message.as_deref().unwrap_or("")
        )))
    }
}

/// Launcher script shipped with the crate; the flags below must match its parser
pub const LAUNCHER_SOURCE: &str = include_str!("../../launcher/stream_launcher.py");

/// Arguments passed to the launcher script for one stream
///
/// Table names are backtick-quoted so hyphenated catalogs parse in Spark.
pub fn launcher_arguments(spec: &StreamSpec) -> Vec<String> {
    let mut args = vec![
        "--source".to_string(),
        spec.source.quoted_name(),
        "--target".to_string(),
        spec.target.quoted_name(),
        "--checkpoint".to_string(),
        spec.checkpoint_location.clone(),
        "--trigger".to_string(),
        spec.trigger.to_string(),
    ];
    for (key, value) in &spec.read_options {
        args.push("--read-option".to_string());
        args.push(format!("{}={}", key, value));
    }
    for (key, value) in &spec.write_options {
        args.push("--write-option".to_string());
        args.push(format!("{}={}", key, value));
    }
    args
}

/// Token that makes resubmitting the same table within one invocation
/// return the existing run instead of starting a second stream on the same
/// checkpoint. Hex SHA-256, which fits the API's 64 character limit.
pub fn idempotency_token(invocation_id: &str, spec: &StreamSpec) -> String {
    let mut hasher = Sha256::new();
    hasher.update(invocation_id.as_bytes());
    hasher.update(b"\0");
    hasher.update(spec.target.quoted_name().as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Submit a one-time run for `spec`, returning the run id
///
/// Only transport failures and 5xx/429 responses are retried; every attempt
/// carries the same idempotency token.
pub async fn submit_stream_run(
    client: &DatabricksClient,
    spec: &StreamSpec,
    invocation_id: &str,
) -> Result<u64> {
    let config = client.config();
    let request = SubmitRequest {
        run_name: spec.run_name(),
        idempotency_token: idempotency_token(invocation_id, spec),
        tasks: vec![SubmitTask {
            task_key: "replicate".to_string(),
            existing_cluster_id: config.cluster_id.clone(),
            spark_python_task: SparkPythonTask {
                python_file: config.launcher.clone(),
                parameters: launcher_arguments(spec),
            },
        }],
    };

    let response: SubmitResponse = utils::retry_with_backoff_if(
        || client.post(SUBMIT_PATH, &request),
        3,
        Duration::from_secs(1),
        client::is_retryable,
    )
    .await
    .with_context(|| format!("Failed to submit run for {}", spec.target))?;

    Ok(response.run_id)
}

pub async fn get_run_state(client: &DatabricksClient, run_id: u64) -> Result<RunState> {
    let status: RunStatus = client
        .get(GET_PATH, &[("run_id", run_id.to_string())])
        .await
        .with_context(|| format!("Failed to get state of run {}", run_id))?;
    Ok(status.state)
}

/// Poll a run until it terminates or `timeout` elapses
pub async fn wait_for_run(
    client: &DatabricksClient,
    run_id: u64,
    timeout: Duration,
) -> Result<StreamOutcome> {
    let started = Instant::now();
    loop {
        let state = get_run_state(client, run_id).await?;
        if let Some(outcome) = state.outcome() {
            return Ok(outcome);
        }
        if started.elapsed() >= timeout {
            tracing::warn!(
                "⚠ Run {} still {} after {}s",
                run_id,
                state.life_cycle_state,
                timeout.as_secs()
            );
            return Ok(StreamOutcome::TimedOut);
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}
