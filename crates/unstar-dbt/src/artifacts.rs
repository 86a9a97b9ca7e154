//! Loaded dbt project artifacts
//!
//! Flattens the manifest into the per-model view the rest of unstar works
//! with: absolute file paths, dependency ids and the model SQL.

use crate::dag::DependencyGraph;
use crate::manifest::Manifest;
use std::collections::{BTreeMap, HashSet};
use std::path::{Component, Path, PathBuf};

/// A dbt model as seen by unstar
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbtModel {
    pub name: String,

    /// Absolute path to the .sql file
    pub path: PathBuf,

    /// unique_ids this model depends on
    pub depends_on: Vec<String>,

    pub node_id: String,

    pub raw_sql: Option<String>,

    pub compiled_sql: Option<String>,
}

impl DbtModel {
    /// SQL used to analyze this model as a consumer: compiled first, raw second
    pub fn analysis_sql(&self) -> Option<(&str, bool)> {
        match (&self.compiled_sql, &self.raw_sql) {
            (Some(compiled), _) => Some((compiled.as_str(), false)),
            (None, Some(raw)) => Some((raw.as_str(), true)),
            (None, None) => None,
        }
    }
}

/// All models of a dbt project, keyed by model name
#[derive(Debug, Clone)]
pub struct DbtArtifacts {
    pub project_dir: PathBuf,
    pub models_by_name: BTreeMap<String, DbtModel>,
    graph: DependencyGraph,
}

impl DbtArtifacts {
    /// Build artifacts from a parsed manifest
    ///
    /// Model paths are resolved against `project_dir`. Models whose file is
    /// missing on disk are kept; the mismatch is only logged.
    pub fn from_manifest(manifest: &Manifest, project_dir: &Path) -> Self {
        let project_dir = absolutize(project_dir);
        let mut models_by_name = BTreeMap::new();

        for (node_id, node) in manifest.models() {
            let Some(name) = node.name.as_deref().filter(|n| !n.is_empty()) else {
                tracing::debug!(node = %node_id, "skipping model without a name");
                continue;
            };

            let rel_path = node.file_path().unwrap_or_default();
            let path = normalize(&project_dir.join(rel_path));

            if !path.exists() {
                tracing::warn!(
                    model = name,
                    path = %path.display(),
                    "model file not found; the manifest may be out of date (try `dbt compile`)"
                );
            }

            models_by_name.insert(
                name.to_string(),
                DbtModel {
                    name: name.to_string(),
                    path,
                    depends_on: node.depends_on.nodes.clone(),
                    node_id: node_id.clone(),
                    raw_sql: node.raw_sql().map(str::to_string),
                    compiled_sql: node.compiled_sql().map(str::to_string),
                },
            );
        }

        Self::new(project_dir, models_by_name)
    }

    /// Build artifacts from already-resolved models
    pub fn new(project_dir: impl Into<PathBuf>, models_by_name: BTreeMap<String, DbtModel>) -> Self {
        let graph = DependencyGraph::from_models(models_by_name.values());
        Self {
            project_dir: project_dir.into(),
            models_by_name,
            graph,
        }
    }

    /// Look up a model by name
    pub fn model(&self, name: &str) -> Option<&DbtModel> {
        self.models_by_name.get(name)
    }

    /// Models that directly depend on any model named `name`
    pub fn dependents_of(&self, name: &str) -> Vec<&DbtModel> {
        let target_ids: HashSet<&str> = self
            .models_by_name
            .values()
            .filter(|m| m.name == name)
            .map(|m| m.node_id.as_str())
            .collect();

        let child_ids: HashSet<&str> = target_ids
            .iter()
            .flat_map(|id| self.graph.children(id))
            .map(String::as_str)
            .collect();

        self.models_by_name
            .values()
            .filter(|m| child_ids.contains(m.node_id.as_str()))
            .collect()
    }
}

/// Default manifest location for a project
pub fn default_manifest_path(project_dir: &Path) -> PathBuf {
    project_dir.join("target").join("manifest.json")
}

/// Load artifacts for a dbt project
///
/// Returns `None` when the manifest does not exist. A manifest that cannot
/// be read or parsed yields artifacts with no models.
pub fn load_artifacts(project_dir: &Path, manifest_path: Option<&Path>) -> Option<DbtArtifacts> {
    let manifest_path = manifest_path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| default_manifest_path(project_dir));

    if !manifest_path.exists() {
        tracing::debug!(path = %manifest_path.display(), "no manifest found");
        return None;
    }

    let manifest = match Manifest::from_file(&manifest_path) {
        Ok(manifest) => manifest,
        Err(e) => {
            tracing::warn!(error = %e, "ignoring unusable manifest");
            Manifest::default()
        }
    };

    Some(DbtArtifacts::from_manifest(&manifest, project_dir))
}

/// Make a path absolute against the current directory without touching the filesystem
pub fn absolutize(path: &Path) -> PathBuf {
    if path.is_absolute() {
        normalize(path)
    } else {
        let cwd = std::env::current_dir().unwrap_or_default();
        normalize(&cwd.join(path))
    }
}

/// Lexically resolve `.` and `..` components
pub(crate) fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
