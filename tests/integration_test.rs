// ABOUTME: Integration tests for the replicate and upload commands
// ABOUTME: Drives both commands end-to-end against in-memory engine and sink doubles

use anyhow::Result;
use async_trait::async_trait;
use opsglue::commands::{self, FailurePolicy, ReplicateOptions};
use opsglue::config::UploadConfig;
use opsglue::params::ReplicationParams;
use opsglue::replication::{
    get_tables_list, StreamHandle, StreamOutcome, StreamSpec, StreamingEngine, TableRef,
};
use opsglue::upload::{upload_to_s3, ObjectSink, UploadJob};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;
use tempfile::tempdir;

/// In-memory engine that records every call
#[derive(Default)]
struct FakeEngine {
    tables: Vec<String>,
    fail_listing: bool,
    fail_start_for: Option<String>,
    outcome: Option<StreamOutcome>,
    schemas_created: Mutex<Vec<String>>,
    started: Mutex<Vec<StreamSpec>>,
    waited: Mutex<Vec<String>>,
}

impl FakeEngine {
    fn with_tables(tables: &[&str]) -> Self {
        Self {
            tables: tables.iter().map(|t| t.to_string()).collect(),
            ..Default::default()
        }
    }

    fn started_targets(&self) -> Vec<String> {
        self.started
            .lock()
            .unwrap()
            .iter()
            .map(|s| s.target_table())
            .collect()
    }
}

#[async_trait]
impl StreamingEngine for FakeEngine {
    async fn list_tables(&self, catalog: &str, schema: &str) -> Result<Vec<TableRef>> {
        if self.fail_listing {
            anyhow::bail!("catalog unavailable");
        }
        Ok(self
            .tables
            .iter()
            .map(|t| TableRef::new(catalog, schema, t.as_str()))
            .collect())
    }

    async fn create_schema_if_not_exists(&self, catalog: &str, schema: &str) -> Result<()> {
        self.schemas_created
            .lock()
            .unwrap()
            .push(format!("{}.{}", catalog, schema));
        Ok(())
    }

    async fn start_stream(&self, spec: &StreamSpec) -> Result<StreamHandle> {
        self.started.lock().unwrap().push(spec.clone());
        let target = spec.target_table();
        if self.fail_start_for.as_deref() == Some(target.as_str()) {
            anyhow::bail!("cluster rejected run");
        }
        Ok(StreamHandle {
            id: format!("run-{}", target),
            target_table: target,
        })
    }

    async fn wait_for_stream(
        &self,
        handle: &StreamHandle,
        _timeout: Duration,
    ) -> Result<StreamOutcome> {
        self.waited.lock().unwrap().push(handle.id.clone());
        Ok(self.outcome.clone().unwrap_or(StreamOutcome::Succeeded))
    }
}

fn params(target_catalog: &str) -> ReplicationParams {
    ReplicationParams {
        target_catalog: target_catalog.to_string(),
        checkpoint: "/Volumes/ops/ckpt".to_string(),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_get_tables_list_qualifies_every_table() {
    let engine = FakeEngine::with_tables(&["pipelines", "job_runs", "events", "updates"]);
    let names = get_tables_list(&engine, &params("backup")).await.unwrap();

    assert_eq!(names.len(), 4);
    for (name, table) in names.iter().zip(&engine.tables) {
        assert_eq!(name, &format!("backup.lakeflow.{}", table));
    }
}

#[tokio::test]
async fn test_replicate_starts_one_stream_per_table() {
    let engine = FakeEngine::with_tables(&["pipelines", "job_runs"]);
    let summary = commands::replicate(&engine, params("backup"), &ReplicateOptions::default())
        .await
        .unwrap();

    assert_eq!(
        summary.started,
        vec!["backup.lakeflow.pipelines", "backup.lakeflow.job_runs"]
    );
    assert!(summary.is_success());
    assert_eq!(
        *engine.schemas_created.lock().unwrap(),
        vec!["backup.lakeflow"]
    );

    let started = engine.started.lock().unwrap();
    assert_eq!(started[0].source_table(), "system.lakeflow.pipelines");
    assert_eq!(started[0].checkpoint_location, "/Volumes/ops/ckpt/pipelines");
    assert_eq!(started[1].checkpoint_location, "/Volumes/ops/ckpt/job_runs");
    assert!(engine.waited.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_replicate_requires_target_catalog() {
    let engine = FakeEngine::with_tables(&["pipelines"]);
    let err = commands::replicate(&engine, params(""), &ReplicateOptions::default())
        .await
        .unwrap_err();

    assert!(err.to_string().contains("target_catalog"));
    assert!(engine.schemas_created.lock().unwrap().is_empty());
    assert!(engine.started.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_listing_failure_is_fatal() {
    let engine = FakeEngine {
        fail_listing: true,
        ..FakeEngine::with_tables(&["pipelines"])
    };
    let result = commands::replicate(&engine, params("backup"), &ReplicateOptions::default()).await;

    assert!(result.is_err());
    assert!(engine.started.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_continue_policy_attempts_remaining_tables() {
    let engine = FakeEngine {
        fail_start_for: Some("backup.lakeflow.b".to_string()),
        ..FakeEngine::with_tables(&["a", "b", "c"])
    };
    let err = commands::replicate(&engine, params("backup"), &ReplicateOptions::default())
        .await
        .unwrap_err();

    assert_eq!(
        engine.started_targets(),
        vec!["backup.lakeflow.a", "backup.lakeflow.b", "backup.lakeflow.c"]
    );
    let msg = err.to_string();
    assert!(msg.contains("1 table(s) failed"));
    assert!(msg.contains("backup.lakeflow.b"));
}

#[tokio::test]
async fn test_abort_policy_stops_at_first_failure() {
    let engine = FakeEngine {
        fail_start_for: Some("backup.lakeflow.b".to_string()),
        ..FakeEngine::with_tables(&["a", "b", "c"])
    };
    let options = ReplicateOptions {
        failure_policy: FailurePolicy::Abort,
        ..Default::default()
    };
    let result = commands::replicate(&engine, params("backup"), &options).await;

    assert!(result.is_err());
    assert_eq!(
        engine.started_targets(),
        vec!["backup.lakeflow.a", "backup.lakeflow.b"]
    );
}

#[tokio::test]
async fn test_wait_reports_failed_stream() {
    let engine = FakeEngine {
        outcome: Some(StreamOutcome::Failed("schema mismatch".to_string())),
        ..FakeEngine::with_tables(&["a"])
    };
    let options = ReplicateOptions {
        wait: true,
        ..Default::default()
    };
    let err = commands::replicate(&engine, params("backup"), &options)
        .await
        .unwrap_err();

    assert_eq!(*engine.waited.lock().unwrap(), vec!["run-backup.lakeflow.a"]);
    assert!(err.to_string().contains("backup.lakeflow.a"));
}

#[tokio::test]
async fn test_empty_schema_is_not_an_error() {
    let engine = FakeEngine::with_tables(&[]);
    let summary = commands::replicate(&engine, params("backup"), &ReplicateOptions::default())
        .await
        .unwrap();
    assert!(summary.started.is_empty());
}

/// Sink that records attempted keys and fails on chosen ones
#[derive(Default)]
struct RecordingSink {
    attempts: Mutex<Vec<String>>,
    fail_on: HashSet<String>,
}

#[async_trait]
impl ObjectSink for RecordingSink {
    async fn put_file(&self, _bucket: &str, key: &str, local: &Path) -> Result<()> {
        assert!(local.is_file());
        self.attempts.lock().unwrap().push(key.to_string());
        if self.fail_on.contains(key) {
            anyhow::bail!("simulated network error");
        }
        Ok(())
    }
}

fn write_tree(root: &Path) {
    std::fs::create_dir_all(root.join("nested/deep")).unwrap();
    std::fs::write(root.join("a.txt"), b"a").unwrap();
    std::fs::write(root.join("b.txt"), b"b").unwrap();
    std::fs::write(root.join("nested/c.csv"), b"c").unwrap();
    std::fs::write(root.join("nested/deep/d.json"), b"{}").unwrap();
}

#[tokio::test]
async fn test_directory_upload_keys_cover_every_file_once() {
    let tmp = tempdir().unwrap();
    let root = tmp.path().join("export");
    write_tree(&root);

    let sink = RecordingSink::default();
    let job = UploadJob::new(&root, "bucket", "backups", true);
    let report = upload_to_s3(&sink, &job).await;

    let mut keys = report.keys();
    keys.sort();
    assert_eq!(
        keys,
        vec![
            "backups/export/a.txt",
            "backups/export/b.txt",
            "backups/export/nested/c.csv",
            "backups/export/nested/deep/d.json",
        ]
    );
    assert!(report.is_success());
    assert_eq!(sink.attempts.lock().unwrap().len(), 4);
}

#[cfg(unix)]
#[tokio::test]
async fn test_symlinked_file_is_uploaded_under_its_link_name() {
    let tmp = tempdir().unwrap();
    let root = tmp.path().join("export");
    std::fs::create_dir_all(&root).unwrap();
    std::fs::write(root.join("a.txt"), b"a").unwrap();
    std::fs::write(tmp.path().join("outside.txt"), b"shared").unwrap();
    std::os::unix::fs::symlink("../outside.txt", root.join("link.txt")).unwrap();
    std::fs::create_dir_all(tmp.path().join("other")).unwrap();
    std::os::unix::fs::symlink("../other", root.join("linked_dir")).unwrap();

    let sink = RecordingSink::default();
    let job = UploadJob::new(&root, "bucket", "p", true);
    let report = upload_to_s3(&sink, &job).await;

    let mut keys = report.keys();
    keys.sort();
    assert_eq!(keys, vec!["p/export/a.txt", "p/export/link.txt"]);
    assert!(report.failed.is_empty());
}

#[tokio::test]
async fn test_one_failed_file_does_not_stop_the_rest() {
    let tmp = tempdir().unwrap();
    let root = tmp.path().join("export");
    write_tree(&root);

    let sink = RecordingSink {
        fail_on: ["backups/export/a.txt".to_string()].into_iter().collect(),
        ..Default::default()
    };
    let job = UploadJob::new(&root, "bucket", "backups", true);
    let report = commands::run_upload(&sink, &job, false).await.unwrap();

    assert_eq!(sink.attempts.lock().unwrap().len(), 4);
    assert_eq!(report.uploaded.len(), 3);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].key.as_deref(), Some("backups/export/a.txt"));
}

#[tokio::test]
async fn test_strict_mode_fails_after_attempting_all_files() {
    let tmp = tempdir().unwrap();
    let root = tmp.path().join("export");
    write_tree(&root);

    let sink = RecordingSink {
        fail_on: ["backups/export/b.txt".to_string()].into_iter().collect(),
        ..Default::default()
    };
    let job = UploadJob::new(&root, "bucket", "backups", true);
    let err = commands::run_upload(&sink, &job, true).await.unwrap_err();

    assert_eq!(sink.attempts.lock().unwrap().len(), 4);
    assert!(err.to_string().contains("1 file(s) failed"));
}

#[tokio::test]
async fn test_invalid_job_never_reaches_sink() {
    let sink = RecordingSink::default();
    let job = UploadJob::new("", "bucket", "", false);

    assert!(commands::run_upload(&sink, &job, false).await.is_err());
    assert!(sink.attempts.lock().unwrap().is_empty());
}

#[test]
fn test_config_validation_precedes_client_construction() {
    let tmp = tempdir().unwrap();
    let config = UploadConfig::parse(
        &serde_json::json!({
            "auth_method": "access_keys",
            "local_files_path": tmp.path().to_string_lossy(),
            "is_directory": true,
            "bucket_name": "bucket",
            "s3_prefix": "",
            "auth": {"access_keys": {"access_key_id": "", "secret_access_key": "x"}}
        })
        .to_string(),
    )
    .unwrap();

    let err = config.into_parts().unwrap_err();
    assert!(err.to_string().contains("access_key_id"));
}

#[tokio::test]
#[ignore]
async fn test_upload_to_real_bucket() {
    // Requires AWS credentials and TEST_BUCKET
    let bucket = std::env::var("TEST_BUCKET").expect("TEST_BUCKET must be set");
    let tmp = tempdir().unwrap();
    let file = tmp.path().join("opsglue-smoke.txt");
    std::fs::write(&file, b"hello").unwrap();

    let config = aws_config::load_from_env().await;
    let sink = opsglue::upload::S3Sink::new(aws_sdk_s3::Client::new(&config));
    let job = UploadJob::new(&file, bucket, "opsglue-tests", false);

    let report = upload_to_s3(&sink, &job).await;
    assert!(report.is_success(), "{:?}", report.failed);
}
