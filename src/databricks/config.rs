// ABOUTME: Workspace connection settings for the Databricks engine
// ABOUTME: Holds host, token, warehouse, cluster and launcher with validation

use crate::utils::validate_host_url;
use anyhow::{bail, Result};
use std::fmt;

/// Connection settings for one Databricks workspace
#[derive(Clone)]
pub struct DatabricksConfig {
    /// Workspace URL, e.g. `https://dbc-1234.cloud.databricks.com`
    pub host: String,
    /// Personal access or OAuth token
    pub token: String,
    /// SQL warehouse used for catalog statements
    pub warehouse_id: String,
    /// Cluster that runs the stream launcher
    pub cluster_id: String,
    /// Workspace or volume path of the Python launcher run for each stream
    pub launcher: String,
}

impl DatabricksConfig {
    /// Check that every setting is present
    ///
    /// # Errors
    ///
    /// Returns an error naming the first missing setting, or if the host is
    /// not an http(s) URL.
    pub fn validate(self) -> Result<Self> {
        validate_host_url(&self.host)?;
        for (field, value) in [
            ("token", &self.token),
            ("warehouse_id", &self.warehouse_id),
            ("cluster_id", &self.cluster_id),
            ("launcher", &self.launcher),
        ] {
            if value.trim().is_empty() {
                bail!("Databricks '{}' is required and cannot be empty", field);
            }
        }
        Ok(Self {
            host: self.host.trim_end_matches('/').to_string(),
            ..self
        })
    }
}

impl fmt::Debug for DatabricksConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabricksConfig")
            .field("host", &self.host)
            .field("token", &"<redacted>")
            .field("warehouse_id", &self.warehouse_id)
            .field("cluster_id", &self.cluster_id)
            .field("launcher", &self.launcher)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> DatabricksConfig {
        DatabricksConfig {
            host: "https://dbc-1234.cloud.databricks.com/".to_string(),
            token: "dapi-secret".to_string(),
            warehouse_id: "abc123".to_string(),
            cluster_id: "0101-abcdef".to_string(),
            launcher: "/Workspace/ops/stream_launcher.py".to_string(),
        }
    }

    #[test]
    fn test_validate_trims_host() {
        let cfg = config().validate().unwrap();
        assert_eq!(cfg.host, "https://dbc-1234.cloud.databricks.com");
    }

    #[test]
    fn test_validate_names_missing_field() {
        let err = DatabricksConfig {
            warehouse_id: String::new(),
            ..config()
        }
        .validate()
        .unwrap_err();
        assert!(err.to_string().contains("warehouse_id"));
    }

    #[test]
    fn test_debug_redacts_token() {
        let rendered = format!("{:?}", config());
        assert!(!rendered.contains("dapi-secret"));
        assert!(rendered.contains("<redacted>"));
    }
}
