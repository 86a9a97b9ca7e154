//! Dependency graph (DAG) construction and traversal
//!
//! Builds reverse dependency edges between models so that the
//! consumers of a model can be found without rescanning every node.

use std::collections::HashMap;
use crate::artifacts::DbtModel;

/// Node identifier (unique_id from manifest)
pub type NodeId = String;

/// Reverse dependency graph
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    /// Reverse edges: node -> list of nodes that depend on it (children)
    children: HashMap<NodeId, Vec<NodeId>>,
}

impl DependencyGraph {
    /// Build a dependency graph from `depends_on` edges
    pub fn from_models<'a>(models: impl IntoIterator<Item = &'a DbtModel>) -> Self {
        let mut children: HashMap<NodeId, Vec<NodeId>> = HashMap::new();

        for model in models {
            for dep_id in &model.depends_on {
                children
                    .entry(dep_id.clone())
                    .or_default()
                    .push(model.node_id.clone());
            }
        }

        Self { children }
    }

    /// Get immediate children (dependents) of a node
    pub fn children(&self, node_id: &str) -> Vec<&NodeId> {
        self.children
            .get(node_id)
            .map(|deps| deps.iter().collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn model(id: &str, deps: &[&str]) -> DbtModel {
        DbtModel {
            name: id.rsplit('.').next().unwrap().to_string(),
            path: PathBuf::from(format!("/p/{id}.sql")),
            depends_on: deps.iter().map(|d| d.to_string()).collect(),
            node_id: id.to_string(),
            raw_sql: None,
            compiled_sql: None,
        }
    }

    #[test]
    fn reverse_edges() {
        let models = vec![
            model("model.p.a", &[]),
            model("model.p.b", &["model.p.a"]),
            model("model.p.c", &["model.p.a", "model.p.b"]),
        ];
        let dag = DependencyGraph::from_models(&models);

        assert_eq!(dag.children("model.p.a"), vec!["model.p.b", "model.p.c"]);
        assert!(dag.children("model.p.c").is_empty());
    }
}
