// ABOUTME: S3-backed object sink
// ABOUTME: Sends each local file with a single PutObject call

use crate::upload::uploader::ObjectSink;
use anyhow::{Context, Result};
use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client as S3Client;
use std::path::Path;

#[derive(Debug, Clone)]
pub struct S3Sink {
    client: S3Client,
}

impl S3Sink {
    pub fn new(client: S3Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ObjectSink for S3Sink {
    async fn put_file(&self, bucket: &str, key: &str, local: &Path) -> Result<()> {
        let body = ByteStream::from_path(local)
            .await
            .with_context(|| format!("Failed to open {}", local.display()))?;

        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(body)
            .send()
            .await
            .map_err(aws_sdk_s3::Error::from)
            .with_context(|| format!("PutObject s3://{}/{} failed", bucket, key))?;

        Ok(())
    }
}
