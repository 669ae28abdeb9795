// ABOUTME: Operator parameters for the schema replication driver
// ABOUTME: Reads catalog/schema/target/checkpoint from a key-value store with defaults

use crate::utils::validate_identifier;
use anyhow::{bail, Context, Result};
use std::collections::HashMap;
use std::path::Path;

pub const DEFAULT_CATALOG: &str = "system";
pub const DEFAULT_SCHEMA: &str = "lakeflow";
pub const DEFAULT_CHECKPOINT: &str = "/Volumes/default/streams_1";

/// An opaque key to string store, the way notebook widgets hand out values.
pub trait ParamStore {
    fn get(&self, key: &str) -> Option<String>;
}

impl ParamStore for HashMap<String, String> {
    fn get(&self, key: &str) -> Option<String> {
        HashMap::get(self, key).cloned()
    }
}

/// Parameters loaded from a flat TOML file of string values
///
/// ```toml
/// catalog = "system"
/// schema = "lakeflow"
/// target_catalog = "backup"
/// checkpoint = "/Volumes/ops/checkpoints/lakeflow"
/// ```
#[derive(Debug, Clone, Default)]
pub struct FileParams {
    values: HashMap<String, String>,
}

impl FileParams {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read params file {}", path.display()))?;
        Self::parse(&contents)
            .with_context(|| format!("Failed to parse params file {}", path.display()))
    }

    pub fn parse(contents: &str) -> Result<Self> {
        let table: toml::Table = contents.parse().context("Invalid TOML")?;
        let mut values = HashMap::new();
        for (key, value) in table {
            match value {
                toml::Value::String(s) => {
                    values.insert(key, s);
                }
                other => bail!(
                    "Parameter '{}' must be a string, got {}",
                    key,
                    other.type_str()
                ),
            }
        }
        Ok(Self { values })
    }
}

impl ParamStore for FileParams {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }
}

/// Parameters for one replication run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplicationParams {
    /// Source catalog (e.g. `system`)
    pub catalog: String,
    /// Schema inside the source catalog; reused as the target schema
    pub schema: String,
    /// Catalog that receives the replicated tables
    pub target_catalog: String,
    /// Root under which each table gets its own checkpoint directory
    pub checkpoint: String,
}

impl Default for ReplicationParams {
    fn default() -> Self {
        Self {
            catalog: DEFAULT_CATALOG.to_string(),
            schema: DEFAULT_SCHEMA.to_string(),
            target_catalog: String::new(),
            checkpoint: DEFAULT_CHECKPOINT.to_string(),
        }
    }
}

impl ReplicationParams {
    /// Read parameters from a store, falling back to the widget defaults for
    /// any key that is missing.
    pub fn from_store(store: &dyn ParamStore) -> Self {
        let defaults = Self::default();
        Self {
            catalog: store.get("catalog").unwrap_or(defaults.catalog),
            schema: store.get("schema").unwrap_or(defaults.schema),
            target_catalog: store.get("target_catalog").unwrap_or(defaults.target_catalog),
            checkpoint: store.get("checkpoint").unwrap_or(defaults.checkpoint),
        }
    }

    /// Apply explicit overrides (command-line flags win over the store)
    pub fn with_overrides(
        mut self,
        catalog: Option<String>,
        schema: Option<String>,
        target_catalog: Option<String>,
        checkpoint: Option<String>,
    ) -> Self {
        if let Some(v) = catalog {
            self.catalog = v;
        }
        if let Some(v) = schema {
            self.schema = v;
        }
        if let Some(v) = target_catalog {
            self.target_catalog = v;
        }
        if let Some(v) = checkpoint {
            self.checkpoint = v;
        }
        self
    }

    /// Check every field and normalize the checkpoint root
    ///
    /// # Errors
    ///
    /// Returns an error naming the field if any parameter is empty, or if a
    /// catalog/schema name contains characters that cannot be used unquoted.
    pub fn validate(mut self) -> Result<Self> {
        validate_identifier("catalog", &self.catalog)?;
        validate_identifier("schema", &self.schema)?;
        validate_identifier("target_catalog", &self.target_catalog)?;

        let checkpoint = self.checkpoint.trim().trim_end_matches('/');
        if checkpoint.is_empty() {
            bail!("'checkpoint' is required and cannot be empty");
        }
        self.checkpoint = checkpoint.to_string();

        Ok(self)
    }
}
