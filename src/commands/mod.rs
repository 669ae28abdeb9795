// ABOUTME: Command implementations for each subcommand
// ABOUTME: Exports the replicate and upload commands

pub mod replicate;
pub mod upload;

pub use replicate::{replicate, FailurePolicy, ReplicateOptions, ReplicationSummary};
pub use upload::{run_upload, upload, UploadSource};
