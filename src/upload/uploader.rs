// ABOUTME: Sequential upload pass for a single file or a directory tree
// ABOUTME: Uploads each file once, logs per-file failures, and keeps going

use crate::upload::job::UploadJob;
use crate::upload::keys::{directory_file_key, single_file_key, top_dir_name};
use anyhow::Result;
use async_trait::async_trait;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Destination for uploaded files
#[async_trait]
pub trait ObjectSink: Send + Sync {
    async fn put_file(&self, bucket: &str, key: &str, local: &Path) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedObject {
    pub local_path: PathBuf,
    pub key: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedUpload {
    pub local_path: PathBuf,
    pub key: Option<String>,
    pub error: String,
}

/// Manifest of one upload pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadReport {
    pub bucket: String,
    pub uploaded: Vec<UploadedObject>,
    pub failed: Vec<FailedUpload>,
}

impl UploadReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn keys(&self) -> Vec<&str> {
        self.uploaded.iter().map(|o| o.key.as_str()).collect()
    }
}

/// Upload a file or directory tree
///
/// Single-file mode uploads to `prefix/<file name>`. Directory mode walks the
/// tree and uploads every file to `prefix/<top dir>/<relative path>`. Files
/// are sent one at a time; a failed file is logged, recorded in the report,
/// and the walk continues with the next file.
///
/// The job is expected to be validated already; nothing here retries or
/// verifies the uploaded objects.
pub async fn upload_to_s3(sink: &dyn ObjectSink, job: &UploadJob) -> UploadReport {
    let mut report = UploadReport {
        bucket: job.bucket_name.clone(),
        ..Default::default()
    };

    if !job.is_directory {
        let key = single_file_key(&job.prefix, &job.local_path);
        upload_one(sink, &job.bucket_name, &job.local_path, key, &mut report).await;
        return report;
    }

    let root = &job.local_path;
    let top_dir = top_dir_name(root);
    let entries: Vec<_> = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .collect();
    let file_count = entries
        .iter()
        .filter(|e| matches!(e, Ok(entry) if is_uploadable(entry)))
        .count();

    tracing::info!(
        "Uploading {} file(s) from {} to s3://{}/{}",
        file_count,
        root.display(),
        job.bucket_name,
        directory_file_key(&job.prefix, &top_dir, Path::new(""))
    );

    let progress = ProgressBar::new(file_count as u64);
    if let Ok(style) =
        ProgressStyle::default_bar().template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")
    {
        progress.set_style(style.progress_chars("##-"));
    }

    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                let local_path = e.path().map(Path::to_path_buf).unwrap_or_else(|| root.clone());
                tracing::error!("Error reading {}: {}", local_path.display(), e);
                report.failed.push(FailedUpload {
                    local_path,
                    key: None,
                    error: e.to_string(),
                });
                continue;
            }
        };
        if !is_uploadable(&entry) {
            continue;
        }

        let local_path = entry.path();
        let relative = local_path.strip_prefix(root).unwrap_or(local_path);
        let key = directory_file_key(&job.prefix, &top_dir, relative);
        upload_one(sink, &job.bucket_name, local_path, key, &mut report).await;

        progress.inc(1);
        progress.set_message(relative.display().to_string());
    }

    progress.finish_and_clear();
    report
}

/// Regular files, including symlinks that resolve to one
///
/// The walk does not follow links, so a link to a directory is skipped and a
/// dangling link falls through to the sink and is reported as a failed upload.
fn is_uploadable(entry: &walkdir::DirEntry) -> bool {
    let file_type = entry.file_type();
    if file_type.is_symlink() {
        return !entry.path().is_dir();
    }
    file_type.is_file()
}

async fn upload_one(
    sink: &dyn ObjectSink,
    bucket: &str,
    local_path: &Path,
    key: String,
    report: &mut UploadReport,
) {
    match sink.put_file(bucket, &key, local_path).await {
        Ok(()) => {
            tracing::info!(
                "Uploaded {} to s3://{}/{}",
                local_path.display(),
                bucket,
                key
            );
            report.uploaded.push(UploadedObject {
                local_path: local_path.to_path_buf(),
                key,
            });
        }
        Err(e) => {
            tracing::error!("Error uploading {}: {:#}", local_path.display(), e);
            report.failed.push(FailedUpload {
                local_path: local_path.to_path_buf(),
                key: Some(key),
                error: format!("{:#}", e),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use tempfile::tempdir;

    #[derive(Default)]
    struct RecordingSink {
        attempts: Mutex<Vec<String>>,
        fail_on: Option<String>,
    }

    #[async_trait]
    impl ObjectSink for RecordingSink {
        async fn put_file(&self, _bucket: &str, key: &str, _local: &Path) -> Result<()> {
            self.attempts.lock().unwrap().push(key.to_string());
            if self.fail_on.as_deref() == Some(key) {
                anyhow::bail!("simulated failure");
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_single_file_upload() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("report.csv");
        std::fs::write(&file, b"a,b\n").unwrap();

        let sink = RecordingSink::default();
        let job = UploadJob::new(&file, "bucket", "landing", false);
        let report = upload_to_s3(&sink, &job).await;

        assert!(report.is_success());
        assert_eq!(report.keys(), vec!["landing/report.csv"]);
    }

    #[tokio::test]
    async fn test_single_file_failure_is_reported_not_raised() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("report.csv");
        std::fs::write(&file, b"x").unwrap();

        let sink = RecordingSink {
            fail_on: Some("report.csv".to_string()),
            ..Default::default()
        };
        let report = upload_to_s3(&sink, &UploadJob::new(&file, "bucket", "", false)).await;

        assert!(report.uploaded.is_empty());
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].key.as_deref(), Some("report.csv"));
        assert!(report.failed[0].error.contains("simulated failure"));
    }

    #[tokio::test]
    async fn test_empty_directory_uploads_nothing() {
        let dir = tempdir().unwrap();
        let sink = RecordingSink::default();
        let report = upload_to_s3(&sink, &UploadJob::new(dir.path(), "bucket", "p", true)).await;

        assert!(report.is_success());
        assert!(report.uploaded.is_empty());
        assert!(sink.attempts.lock().unwrap().is_empty());
    }
}
