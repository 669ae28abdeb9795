// ABOUTME: SQL Statement Execution API calls against a SQL warehouse
// ABOUTME: Runs catalog statements (SHOW TABLES, CREATE SCHEMA) and reads results

use crate::databricks::client::DatabricksClient;
use crate::utils::quote_qualified;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::{Duration, Instant};

const STATEMENTS_PATH: &str = "/api/2.0/sql/statements";
const POLL_INTERVAL: Duration = Duration::from_secs(2);
const STATEMENT_TIMEOUT: Duration = Duration::from_secs(600);

#[derive(Debug, Serialize)]
struct StatementRequest<'a> {
    warehouse_id: &'a str,
    statement: &'a str,
    wait_timeout: &'a str,
    on_wait_timeout: &'a str,
    format: &'a str,
    disposition: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatementResponse {
    pub statement_id: String,
    pub status: StatementStatus,
    #[serde(default)]
    pub manifest: Option<Manifest>,
    #[serde(default)]
    pub result: Option<ResultData>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatementStatus {
    pub state: String,
    #[serde(default)]
    pub error: Option<StatementError>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatementError {
    #[serde(default)]
    pub error_code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Manifest {
    pub schema: ManifestSchema,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ManifestSchema {
    #[serde(default)]
    pub columns: Vec<Column>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Column {
    pub name: String,
    pub position: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResultData {
    #[serde(default)]
    pub data_array: Vec<Vec<Option<String>>>,
    /// Set when more rows are waiting in a further chunk
    #[serde(default)]
    pub next_chunk_internal_link: Option<String>,
}

type Row = Vec<Option<String>>;

impl StatementResponse {
    fn is_pending(&self) -> bool {
        matches!(self.status.state.as_str(), "PENDING" | "RUNNING")
    }

    /// Fail unless the statement finished successfully
    fn ensure_succeeded(&self, statement: &str) -> Result<()> {
        match self.status.state.as_str() {
            "SUCCEEDED" => Ok(()),
            state => {
                let detail = self
                    .status
                    .error
                    .as_ref()
                    .map(|e| {
                        format!(
                            "{}: {}",
                            e.error_code.as_deref().unwrap_or("ERROR"),
                            e.message.as_deref().unwrap_or("no message")
                        )
                    })
                    .unwrap_or_else(|| "no error detail".to_string());
                bail!("Statement `{}` ended in state {} ({})", statement, state, detail)
            }
        }
    }

    /// Position of a named column in the result manifest
    pub fn column_position(&self, column: &str) -> Result<usize> {
        let manifest = self
            .manifest
            .as_ref()
            .context("Statement result has no manifest")?;
        manifest
            .schema
            .columns
            .iter()
            .find(|c| c.name == column)
            .map(|c| c.position)
            .with_context(|| format!("Statement result has no '{}' column", column))
    }

    /// Values of one named column across the rows of the first chunk
    pub fn column_values(&self, column: &str) -> Result<Vec<String>> {
        let position = self.column_position(column)?;
        let rows = self
            .result
            .as_ref()
            .map(|r| r.data_array.as_slice())
            .unwrap_or(&[]);
        Ok(values_at(rows, position))
    }
}

fn values_at(rows: &[Row], position: usize) -> Vec<String> {
    rows.iter()
        .filter_map(|row| row.get(position).cloned().flatten())
        .collect()
}

/// Gather rows from the first chunk and every chunk linked after it
///
/// `fetch` resolves a `next_chunk_internal_link` to the chunk it names.
pub async fn collect_rows<F, Fut>(first: Option<ResultData>, mut fetch: F) -> Result<Vec<Row>>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<ResultData>>,
{
    let mut rows = Vec::new();
    let mut next = first;
    while let Some(chunk) = next {
        rows.extend(chunk.data_array);
        next = match chunk.next_chunk_internal_link {
            Some(link) => Some(fetch(link).await?),
            None => None,
        };
    }
    Ok(rows)
}

/// Execute a statement and wait for it to finish
pub async fn execute_statement(
    client: &DatabricksClient,
    statement: &str,
) -> Result<StatementResponse> {
    tracing::debug!("Executing statement: {}", statement);

    let request = StatementRequest {
        warehouse_id: &client.config().warehouse_id,
        statement,
        wait_timeout: "30s",
        on_wait_timeout: "CONTINUE",
        format: "JSON_ARRAY",
        disposition: "INLINE",
    };

    let mut response: StatementResponse = client
        .post(STATEMENTS_PATH, &request)
        .await
        .with_context(|| format!("Failed to submit statement `{}`", statement))?;

    let started = Instant::now();
    while response.is_pending() {
        if started.elapsed() > STATEMENT_TIMEOUT {
            bail!(
                "Timeout: statement `{}` did not finish within {}s",
                statement,
                STATEMENT_TIMEOUT.as_secs()
            );
        }
        tokio::time::sleep(POLL_INTERVAL).await;
        let path = format!("{}/{}", STATEMENTS_PATH, response.statement_id);
        response = client
            .get(&path, &[] as &[(&str, &str)])
            .await
            .with_context(|| format!("Failed to poll statement `{}`", statement))?;
    }

    response.ensure_succeeded(statement)?;
    Ok(response)
}

pub fn show_tables_sql(catalog: &str, schema: &str) -> String {
    format!("SHOW TABLES IN {}", quote_qualified(&[catalog, schema]))
}

pub fn create_schema_sql(catalog: &str, schema: &str) -> String {
    format!(
        "CREATE SCHEMA IF NOT EXISTS {}",
        quote_qualified(&[catalog, schema])
    )
}

/// `SHOW TABLES IN catalog.schema`, returning the `tableName` column
pub async fn show_tables(client: &DatabricksClient, catalog: &str, schema: &str) -> Result<Vec<String>> {
    let statement = show_tables_sql(catalog, schema);
    let response = execute_statement(client, &statement).await?;
    let position = response.column_position("tableName")?;

    let rows = collect_rows(response.result, |link| async move {
        client
            .get::<_, ResultData>(&link, &[] as &[(&str, &str)])
            .await
            .with_context(|| format!("Failed to fetch result chunk {}", link))
    })
    .await?;

    Ok(values_at(&rows, position))
}

pub async fn create_schema_if_not_exists(
    client: &DatabricksClient,
    catalog: &str,
    schema: &str,
) -> Result<()> {
    let statement = create_schema_sql(catalog, schema);
    execute_statement(client, &statement).await?;
    Ok(())
}
