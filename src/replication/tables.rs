// ABOUTME: Table enumeration for schema replication
// ABOUTME: Lists source tables and maps them to target names and checkpoint paths

use crate::params::ReplicationParams;
use crate::replication::engine::StreamingEngine;
use crate::utils::quote_qualified;
use anyhow::{Context, Result};
use std::fmt;

/// A three-level table address: catalog.schema.table
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableRef {
    pub catalog: String,
    pub schema: String,
    pub table: String,
}

impl TableRef {
    pub fn new(
        catalog: impl Into<String>,
        schema: impl Into<String>,
        table: impl Into<String>,
    ) -> Self {
        Self {
            catalog: catalog.into(),
            schema: schema.into(),
            table: table.into(),
        }
    }

    /// Fully qualified name in the source catalog
    pub fn source_name(&self) -> String {
        self.to_string()
    }

    /// Same schema and table under `target_catalog`
    pub fn in_catalog(&self, target_catalog: &str) -> TableRef {
        TableRef::new(target_catalog, self.schema.as_str(), self.table.as_str())
    }

    /// Dotted name of the same table under `target_catalog`
    pub fn target_name(&self, target_catalog: &str) -> String {
        self.in_catalog(target_catalog).to_string()
    }

    /// Backtick-quoted name, safe to embed in SQL or hand to `spark.table`
    /// even when a part contains `-`
    pub fn quoted_name(&self) -> String {
        quote_qualified(&[&self.catalog, &self.schema, &self.table])
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.catalog, self.schema, self.table)
    }
}

/// Map listed source tables to target names, keeping listing order.
pub fn target_table_names(tables: &[TableRef], target_catalog: &str) -> Vec<String> {
    tables
        .iter()
        .map(|t| t.target_name(target_catalog))
        .collect()
}

/// Checkpoint directory for one table's stream
pub fn checkpoint_path(checkpoint_root: &str, table: &str) -> String {
    format!("{}/{}", checkpoint_root, table)
}

/// List the tables of the source namespace
///
/// # Errors
///
/// A listing failure is fatal for the whole run and is returned as-is with
/// context naming the namespace.
pub async fn list_source_tables(
    engine: &dyn StreamingEngine,
    params: &ReplicationParams,
) -> Result<Vec<TableRef>> {
    tracing::info!(
        "Listing tables in {}.{}...",
        params.catalog,
        params.schema
    );
    let tables = engine
        .list_tables(&params.catalog, &params.schema)
        .await
        .with_context(|| {
            format!(
                "Failed to list tables in {}.{}",
                params.catalog, params.schema
            )
        })?;
    tracing::info!("✓ Found {} table(s)", tables.len());
    Ok(tables)
}

/// List the source namespace and return the target-qualified table names
pub async fn get_tables_list(
    engine: &dyn StreamingEngine,
    params: &ReplicationParams,
) -> Result<Vec<String>> {
    let tables = list_source_tables(engine, params).await?;
    Ok(target_table_names(&tables, &params.target_catalog))
}
