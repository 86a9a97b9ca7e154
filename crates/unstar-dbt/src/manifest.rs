//! dbt manifest.json parsing
//!
//! Parses dbt-generated manifest.json to extract nodes and their dependencies.
//! Parsing is tolerant: a node that does not match the expected shape is
//! skipped with a warning instead of failing the whole manifest.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// dbt manifest.json structure (subset of fields we care about)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    /// Model, test, seed and snapshot nodes keyed by unique_id
    pub nodes: BTreeMap<String, ManifestNode>,
}

impl Manifest {
    /// Load manifest from file
    pub fn from_file(path: &Path) -> Result<Self, ManifestError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ManifestError::IoError(path.display().to_string(), e.to_string()))?;

        Self::from_str(&contents)
    }

    /// Parse manifest from JSON string
    ///
    /// Fails only if the document is not JSON at all. Missing `nodes` yields
    /// an empty manifest; individual malformed nodes are dropped.
    pub fn from_str(json: &str) -> Result<Self, ManifestError> {
        let document: serde_json::Value = serde_json::from_str(json)
            .map_err(|e| ManifestError::ParseError(e.to_string()))?;

        let Some(raw_nodes) = document.get("nodes").and_then(|n| n.as_object()) else {
            tracing::warn!("manifest has no `nodes` mapping");
            return Ok(Self::default());
        };

        let mut nodes = BTreeMap::new();
        for (unique_id, raw) in raw_nodes {
            match serde_json::from_value::<ManifestNode>(raw.clone()) {
                Ok(mut node) => {
                    if node.unique_id.is_empty() {
                        node.unique_id = unique_id.clone();
                    }
                    nodes.insert(unique_id.clone(), node);
                }
                Err(e) => {
                    tracing::warn!(node = %unique_id, error = %e, "skipping malformed manifest node");
                }
            }
        }

        Ok(Self { nodes })
    }

    /// Get all model nodes (filters out tests, seeds, etc.)
    pub fn models(&self) -> impl Iterator<Item = (&String, &ManifestNode)> {
        self.nodes
            .iter()
            .filter(|(_, node)| node.is_model())
    }
}

/// A node in the manifest (model, test, snapshot, etc.)
///
/// Every field is optional on the wire; absent fields take their default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManifestNode {
    /// Unique identifier (e.g., "model.my_project.users")
    pub unique_id: String,

    /// Node name (e.g., "users")
    pub name: Option<String>,

    /// Resource type (model, test, snapshot, etc.)
    pub resource_type: Option<String>,

    /// Relative path to SQL file
    pub path: Option<String>,

    /// Original file path, relative to the project root
    pub original_file_path: Option<String>,

    /// Dependencies
    pub depends_on: DependsOn,

    /// Templated SQL (dbt < 1.3)
    pub raw_sql: Option<String>,

    /// Templated SQL (dbt >= 1.3)
    pub raw_code: Option<String>,

    /// Compiled SQL (dbt < 1.3)
    pub compiled_sql: Option<String>,

    /// Compiled SQL (dbt >= 1.3)
    pub compiled_code: Option<String>,
}

impl ManifestNode {
    pub fn is_model(&self) -> bool {
        self.resource_type.as_deref() == Some("model")
    }

    /// File path relative to the project root; `original_file_path` wins
    pub fn file_path(&self) -> Option<&str> {
        non_empty(&self.original_file_path).or_else(|| non_empty(&self.path))
    }

    /// Templated SQL under either key
    pub fn raw_sql(&self) -> Option<&str> {
        non_empty(&self.raw_sql).or_else(|| non_empty(&self.raw_code))
    }

    /// Compiled SQL under either key
    pub fn compiled_sql(&self) -> Option<&str> {
        non_empty(&self.compiled_sql).or_else(|| non_empty(&self.compiled_code))
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

/// Dependencies structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DependsOn {
    /// List of node unique_ids this node depends on
    #[serde(default)]
    pub nodes: Vec<String>,
}

/// Manifest parsing errors
#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("Failed to read manifest file {0}: {1}")]
    IoError(String, String),

    #[error("Failed to parse manifest JSON: {0}")]
    ParseError(String),
}
