//! unstar engine
//!
//! Glue between model discovery and the star expander:
//! - Project adapters (dbt, plain SQL files) behind one trait, looked up in
//!   an explicitly constructed registry
//! - File I/O, backups and diffs
//! - The per-target run loop and its summary
//! - Reporters for dry-run output

pub mod adapter;
pub mod registry;
pub mod dbt_adapter;
pub mod sql_adapter;
pub mod io;
pub mod orchestrator;
pub mod reporter;

pub use adapter::{AdapterError, LoadedProject, ProjectAdapter, ProjectOptions, Selection};
pub use registry::AdapterRegistry;
pub use dbt_adapter::DbtAdapter;
pub use sql_adapter::SqlAdapter;
pub use orchestrator::{Orchestrator, OutputMode, RunOptions, RunSummary, TargetOutcome};
pub use reporter::{Reporter, ReporterKind};
