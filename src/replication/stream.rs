// ABOUTME: Description of one incremental-copy stream between two tables
// ABOUTME: Carries source/target names, checkpoint location, options, and trigger

use crate::replication::tables::{checkpoint_path, TableRef};
use std::collections::BTreeMap;
use std::fmt;

/// Read option that skips commits which only rewrite existing rows
pub const SKIP_CHANGE_COMMITS: &str = "skipChangeCommits";
/// Write option that merges new source columns into the target's schema
pub const MERGE_SCHEMA: &str = "mergeSchema";

/// When a stream processes data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// Process everything currently available, then stop
    AvailableNow,
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trigger::AvailableNow => write!(f, "availableNow"),
        }
    }
}

/// Everything an engine needs to start one table's stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamSpec {
    pub source: TableRef,
    pub target: TableRef,
    pub checkpoint_location: String,
    pub read_options: BTreeMap<String, String>,
    pub write_options: BTreeMap<String, String>,
    pub trigger: Trigger,
}

impl StreamSpec {
    /// Append-only copy of net-new commits from `table` into the same schema
    /// and table name under `target_catalog`, in a single available-now pass.
    pub fn incremental_copy(table: &TableRef, target_catalog: &str, checkpoint_root: &str) -> Self {
        let mut read_options = BTreeMap::new();
        read_options.insert(SKIP_CHANGE_COMMITS.to_string(), "true".to_string());

        let mut write_options = BTreeMap::new();
        write_options.insert(MERGE_SCHEMA.to_string(), "true".to_string());

        Self {
            source: table.clone(),
            target: table.in_catalog(target_catalog),
            checkpoint_location: checkpoint_path(checkpoint_root, &table.table),
            read_options,
            write_options,
            trigger: Trigger::AvailableNow,
        }
    }

    /// Dotted source name, for logs and reports
    pub fn source_table(&self) -> String {
        self.source.to_string()
    }

    /// Dotted target name, for logs and reports
    pub fn target_table(&self) -> String {
        self.target.to_string()
    }

    /// Short label used for run names and log lines
    pub fn run_name(&self) -> String {
        format!("replicate {} -> {}", self.source, self.target)
    }
}
