// ABOUTME: Utility functions for validation and error handling
// ABOUTME: Provides identifier/host validation, retry logic, and display sanitizing

use anyhow::{bail, Result};
use std::time::Duration;

/// Validate a catalog or schema identifier
///
/// Identifiers are interpolated into SQL statements such as `SHOW TABLES IN`
/// and `CREATE SCHEMA IF NOT EXISTS`, so only plain names are accepted:
/// ASCII letters, digits, underscores and hyphens.
///
/// # Arguments
///
/// * `field` - Name of the parameter being validated (used in error messages)
/// * `value` - The identifier to validate
///
/// # Errors
///
/// Returns an error naming the field if the identifier is empty or contains
/// any other character.
///
/// # Examples
///
/// ```
/// # use opsglue::utils::validate_identifier;
/// assert!(validate_identifier("catalog", "system").is_ok());
/// assert!(validate_identifier("schema", "lake-flow_2").is_ok());
/// assert!(validate_identifier("target_catalog", "").is_err());
/// assert!(validate_identifier("schema", "a; DROP SCHEMA b").is_err());
/// ```
pub fn validate_identifier(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        bail!("'{}' is required and cannot be empty", field);
    }

    if let Some(bad) = value
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || *c == '_' || *c == '-'))
    {
        bail!(
            "Invalid character {:?} in '{}': {}\n\
             Only letters, digits, '_' and '-' are allowed",
            bad,
            field,
            sanitize_identifier(value)
        );
    }

    Ok(())
}

/// Quote one identifier part with backticks, doubling any embedded backtick
///
/// ```
/// # use opsglue::utils::quote_identifier;
/// assert_eq!(quote_identifier("backup-2024"), "`backup-2024`");
/// assert_eq!(quote_identifier("odd`name"), "`odd``name`");
/// ```
pub fn quote_identifier(part: &str) -> String {
    format!("`{}`", part.replace('`', "``"))
}

/// Quote and dot-join a multi-part name such as catalog.schema
pub fn quote_qualified(parts: &[&str]) -> String {
    parts
        .iter()
        .map(|p| quote_identifier(p))
        .collect::<Vec<_>>()
        .join(".")
}

/// Validate a workspace host URL
///
/// Checks that the host is non-empty and uses an http(s) scheme.
///
/// # Examples
///
/// ```
/// # use opsglue::utils::validate_host_url;
/// assert!(validate_host_url("https://adb-123.azuredatabricks.net").is_ok());
/// assert!(validate_host_url("adb-123.azuredatabricks.net").is_err());
/// assert!(validate_host_url("").is_err());
/// ```
pub fn validate_host_url(url: &str) -> Result<()> {
    if url.trim().is_empty() {
        bail!("Workspace host cannot be empty");
    }

    if !url.starts_with("https://") && !url.starts_with("http://") {
        bail!(
            "Invalid workspace host format.\n\
             Expected format: https://<workspace-host>\n\
             Got: {}",
            url
        );
    }

    Ok(())
}

/// Retry a function with exponential backoff
///
/// Executes an async operation with automatic retry on failure. Each retry doubles
/// the delay (exponential backoff) to handle transient failures gracefully.
///
/// # Arguments
///
/// * `operation` - Async function to retry (FnMut returning Future\<Output = Result\<T\>\>)
/// * `max_retries` - Maximum number of retry attempts (0 = no retries, just initial attempt)
/// * `initial_delay` - Delay before first retry (doubles each subsequent retry)
///
/// # Returns
///
/// Returns the successful result or the last error after all retries exhausted.
///
/// # Examples
///
/// ```no_run
/// # use anyhow::Result;
/// # use std::time::Duration;
/// # use opsglue::utils::retry_with_backoff;
/// # async fn example() -> Result<()> {
/// let result = retry_with_backoff(
///     || async { Ok("success") },
///     3,  // Try up to 3 times
///     Duration::from_secs(1)  // Start with 1s delay
/// ).await?;
/// # Ok(())
/// # }
/// ```
pub async fn retry_with_backoff<F, Fut, T>(
    operation: F,
    max_retries: u32,
    initial_delay: Duration,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T>>,
{
    retry_with_backoff_if(operation, max_retries, initial_delay, |_| true).await
}

/// Like [`retry_with_backoff`], but gives up immediately on errors for which
/// `should_retry` returns false
pub async fn retry_with_backoff_if<F, Fut, T, P>(
    mut operation: F,
    max_retries: u32,
    initial_delay: Duration,
    should_retry: P,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T>>,
    P: Fn(&anyhow::Error) -> bool,
{
    let mut delay = initial_delay;
    let mut last_error = None;

    for attempt in 0..=max_retries {
        match operation().await {
            Ok(result) => return Ok(result),
            Err(e) => {
                if !should_retry(&e) {
                    return Err(e);
                }
                last_error = Some(e);

                if attempt < max_retries {
                    tracing::warn!(
                        "Operation failed (attempt {}/{}), retrying in {:?}...",
                        attempt + 1,
                        max_retries + 1,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    delay *= 2;
                }
            }
        }
    }

    Err(last_error.unwrap_or_else(|| anyhow::anyhow!("Operation failed after retries")))
}

/// Sanitize an identifier (table name, file name, etc.) for display
///
/// Removes control characters and limits length to prevent log injection
/// and keep error messages readable.
///
/// # Examples
///
/// ```
/// # use opsglue::utils::sanitize_identifier;
/// assert_eq!(sanitize_identifier("normal_table"), "normal_table");
/// assert_eq!(sanitize_identifier("table\x00name"), "tablename");
///
/// let long_name = "a".repeat(200);
/// assert_eq!(sanitize_identifier(&long_name).len(), 100);
/// ```
pub fn sanitize_identifier(identifier: &str) -> String {
    identifier
        .chars()
        .filter(|c| !c.is_control())
        .take(100)
        .collect()
}
