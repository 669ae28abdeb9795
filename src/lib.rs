// ABOUTME: Library module for opsglue
// ABOUTME: Exports all core functionality for use in binary and tests

pub mod commands;
pub mod config;
pub mod credentials;
pub mod databricks;
pub mod interactive;
pub mod params;
pub mod replication;
pub mod upload;
pub mod utils;
