// ABOUTME: Upload command implementation - send a file or directory to S3
// ABOUTME: Resolves the job from prompts or JSON config, then runs one upload pass

use crate::config::load_upload_config;
use crate::credentials::{build_s3_client, CredentialBundle};
use crate::interactive;
use crate::upload::{upload_to_s3, ObjectSink, S3Sink, UploadJob, UploadReport};
use anyhow::{Context, Result};
use std::path::PathBuf;

/// Where the upload parameters come from
#[derive(Debug, Clone)]
pub enum UploadSource {
    Interactive,
    ConfigFile(PathBuf),
}

/// Resolve and validate the job and credentials from the chosen front end
pub fn resolve_job(source: &UploadSource) -> Result<(UploadJob, CredentialBundle)> {
    match source {
        UploadSource::Interactive => interactive::prompt_upload_job(),
        UploadSource::ConfigFile(path) => {
            tracing::info!("Loading upload configuration from {}", path.display());
            load_upload_config(path)?.into_parts()
        }
    }
}

/// Upload a local file or directory to S3
///
/// The job and credentials are validated before any client is built, so a
/// missing bucket, path or key never reaches the network. Per-file failures
/// are logged and collected in the returned report; they only fail the
/// command when `strict` is set.
///
/// # Examples
///
/// ```no_run
/// # use anyhow::Result;
/// # use opsglue::commands::upload::{upload, UploadSource};
/// # async fn example() -> Result<()> {
/// let report = upload(&UploadSource::ConfigFile("upload_config.json".into()), false).await?;
/// println!("{} object(s) uploaded", report.uploaded.len());
/// # Ok(())
/// # }
/// ```
pub async fn upload(source: &UploadSource, strict: bool) -> Result<UploadReport> {
    let (job, credentials) = resolve_job(source)?;

    tracing::info!("Auth method: {}", credentials.method_name());
    let client = build_s3_client(&credentials)
        .await
        .context("Failed to create S3 client")?;
    let sink = S3Sink::new(client);

    run_upload(&sink, &job, strict).await
}

/// Run the upload pass against any sink and summarize it
pub async fn run_upload(sink: &dyn ObjectSink, job: &UploadJob, strict: bool) -> Result<UploadReport> {
    job.validate()?;

    let report = upload_to_s3(sink, job).await;

    tracing::info!("");
    tracing::info!("========================================");
    tracing::info!(
        "Uploaded {} file(s), {} failed",
        report.uploaded.len(),
        report.failed.len()
    );
    for failure in &report.failed {
        tracing::warn!("  ✗ {}: {}", failure.local_path.display(), failure.error);
    }
    tracing::info!("========================================");

    if strict && !report.is_success() {
        anyhow::bail!(
            "{} file(s) failed to upload to s3://{}",
            report.failed.len(),
            report.bucket
        );
    }

    Ok(report)
}
