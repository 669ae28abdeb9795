// ABOUTME: Schema replication module
// ABOUTME: Table enumeration, stream descriptions, and the engine seam

pub mod engine;
pub mod stream;
pub mod tables;

pub use engine::{StreamHandle, StreamOutcome, StreamingEngine};
pub use stream::{StreamSpec, Trigger};
pub use tables::{
    checkpoint_path, get_tables_list, list_source_tables, target_table_names, TableRef,
};
