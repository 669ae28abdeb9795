// ABOUTME: HTTP client for the Databricks REST API
// ABOUTME: Handles authentication, request plumbing, and readable API errors

use crate::databricks::config::DatabricksConfig;
use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Authenticated client for one workspace
#[derive(Debug, Clone)]
pub struct DatabricksClient {
    http: reqwest::Client,
    config: DatabricksConfig,
}

impl DatabricksClient {
    pub fn new(config: DatabricksConfig) -> Result<Self> {
        let config = config.validate()?;
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &DatabricksConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.host, path)
    }

    /// POST a JSON body and decode the JSON response
    pub async fn post<B, R>(&self, path: &str, body: &B) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let response = self
            .http
            .post(self.url(path))
            .bearer_auth(&self.config.token)
            .json(body)
            .send()
            .await
            .with_context(|| format!("Request to {} failed", path))?;
        decode(path, response).await
    }

    /// GET with query parameters and decode the JSON response
    pub async fn get<Q, R>(&self, path: &str, query: &Q) -> Result<R>
    where
        Q: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let response = self
            .http
            .get(self.url(path))
            .bearer_auth(&self.config.token)
            .query(query)
            .send()
            .await
            .with_context(|| format!("Request to {} failed", path))?;
        decode(path, response).await
    }
}

async fn decode<R: DeserializeOwned>(path: &str, response: reqwest::Response) -> Result<R> {
    let status = response.status();
    let body = response
        .text()
        .await
        .with_context(|| format!("Failed to read response body from {}", path))?;

    if !status.is_success() {
        return Err(describe_api_error(status, &body).into());
    }

    serde_json::from_str(&body).with_context(|| format!("Unexpected response from {}", path))
}

/// A non-success HTTP response from the workspace
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    message: String,
}

impl ApiError {
    /// Server-side and throttling failures may succeed on a later attempt;
    /// auth, permission and request errors will not.
    pub fn is_retryable(&self) -> bool {
        self.status.is_server_error() || self.status == StatusCode::TOO_MANY_REQUESTS
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ApiError {}

/// Whether a failed request is worth sending again
///
/// API errors are retried only for 5xx and 429 responses. Transport errors
/// (connect failures, timeouts) are retried. Anything else, such as an
/// undecodable response body, is not.
pub fn is_retryable(err: &anyhow::Error) -> bool {
    if let Some(api) = err.downcast_ref::<ApiError>() {
        return api.is_retryable();
    }
    err.downcast_ref::<reqwest::Error>().is_some()
}

/// Turn a failed API response into an actionable message
pub fn describe_api_error(status: StatusCode, body: &str) -> ApiError {
    let detail = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string());

    let message = match status {
        StatusCode::UNAUTHORIZED => format!(
            "Authentication failed: the workspace rejected the token.\n\
             Please verify DATABRICKS_TOKEN.\n\
             Error: {}",
            detail
        ),
        StatusCode::FORBIDDEN => format!(
            "Permission denied: the token's principal lacks access.\n\
             Check grants on the source schema, target catalog and checkpoint volume.\n\
             Error: {}",
            detail
        ),
        StatusCode::NOT_FOUND => format!(
            "Not found: check the warehouse id, cluster id and workspace host.\n\
             Error: {}",
            detail
        ),
        _ => format!("Databricks API error ({}): {}", status, detail),
    };

    ApiError { status, message }
}
