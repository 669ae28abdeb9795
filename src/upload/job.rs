// ABOUTME: Upload job parameters shared by the prompt and config front ends
// ABOUTME: Validates local path, bucket and directory flag before any network call

use anyhow::{bail, Result};
use std::path::PathBuf;

/// One upload pass: what to send and where
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadJob {
    pub local_path: PathBuf,
    pub bucket_name: String,
    /// Key prefix; empty means the bucket root
    pub prefix: String,
    pub is_directory: bool,
}

impl UploadJob {
    pub fn new(
        local_path: impl Into<PathBuf>,
        bucket_name: impl Into<String>,
        prefix: impl Into<String>,
        is_directory: bool,
    ) -> Self {
        Self {
            local_path: local_path.into(),
            bucket_name: bucket_name.into(),
            prefix: prefix.into(),
            is_directory,
        }
    }

    /// Check required fields and that the local path matches the directory flag
    ///
    /// # Errors
    ///
    /// Returns an error naming the field if `local_files_path` or `bucket_name`
    /// is empty, if the path does not exist, or if it is a file when a
    /// directory was requested (or the other way around).
    pub fn validate(&self) -> Result<()> {
        if self.local_path.as_os_str().is_empty() {
            bail!("'local_files_path' is required and cannot be empty");
        }
        if self.bucket_name.trim().is_empty() {
            bail!("'bucket_name' is required and cannot be empty");
        }

        let path = &self.local_path;
        if !path.exists() {
            bail!("Local path does not exist: {}", path.display());
        }
        if self.is_directory && !path.is_dir() {
            bail!(
                "Local path is not a directory but is_directory is set: {}",
                path.display()
            );
        }
        if !self.is_directory && !path.is_file() {
            bail!(
                "Local path is a directory; set is_directory to upload it: {}",
                path.display()
            );
        }

        Ok(())
    }
}
