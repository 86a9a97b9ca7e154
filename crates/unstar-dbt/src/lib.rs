//! dbt artifact parsing and model selection
//!
//! This crate handles:
//! - Parsing manifest.json (dbt-generated artifacts), skipping malformed nodes
//! - Building the dependency graph between models
//! - Selecting models by name or by directory

pub mod manifest;
pub mod artifacts;
pub mod dag;
pub mod selection;

pub use manifest::{Manifest, ManifestNode, DependsOn, ManifestError};
pub use artifacts::{DbtArtifacts, DbtModel, load_artifacts, default_manifest_path, absolutize};
pub use dag::{DependencyGraph, NodeId};
pub use selection::{find_models_by_names, find_models_by_path};
