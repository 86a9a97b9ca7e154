//! Project adapter traits
//!
//! An adapter knows how to find the models of one kind of project and which
//! columns their consumers use. Opening a project loads its metadata once;
//! the returned [`LoadedProject`] then answers per-target questions.

use std::path::{Path, PathBuf};
use unstar_core::{ColumnScope, DialectConfig, ModelTarget};

/// Errors raised while opening a project or touching its model files
#[derive(Debug, thiserror::Error)]
pub enum AdapterError {
    #[error("Unknown adapter '{name}'. Available: {available}")]
    UnknownAdapter { name: String, available: String },

    #[error("no {adapter} project found at {}", path.display())]
    ProjectNotFound { adapter: &'static str, path: PathBuf },

    #[error("Model file not found: {}. The manifest may be out of sync with the project files; try running 'dbt compile'", .0.display())]
    ModelFileMissing(PathBuf),

    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Where and how to open a project
#[derive(Debug, Clone)]
pub struct ProjectOptions {
    pub project_dir: PathBuf,

    /// Manifest override (dbt only)
    pub manifest: Option<PathBuf>,

    /// Dialect used to read consumer SQL
    pub dialect: DialectConfig,
}

impl ProjectOptions {
    pub fn new(project_dir: impl Into<PathBuf>) -> Self {
        Self {
            project_dir: project_dir.into(),
            manifest: None,
            dialect: DialectConfig::default(),
        }
    }

    pub fn with_manifest(mut self, manifest: Option<PathBuf>) -> Self {
        self.manifest = manifest;
        self
    }

    pub fn with_dialect(mut self, dialect: DialectConfig) -> Self {
        self.dialect = dialect;
        self
    }
}

/// Which models to process
///
/// With no names and no path, every known model is selected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    /// Model names (dbt) or file paths (sql)
    pub names: Vec<String>,

    /// Directory prefix, relative to the project root
    pub path: Option<PathBuf>,
}

impl Selection {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn by_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
            path: None,
        }
    }

    pub fn by_path(path: impl Into<PathBuf>) -> Self {
        Self {
            names: Vec::new(),
            path: Some(path.into()),
        }
    }

    pub fn is_all(&self) -> bool {
        self.names.is_empty() && self.path.is_none()
    }
}

/// A kind of project unstar can work on
pub trait ProjectAdapter: Send + Sync {
    /// Registry name (e.g. "dbt")
    fn name(&self) -> &'static str;

    /// Whether `project_dir` looks like a project of this kind
    fn detect(&self, project_dir: &Path) -> bool;

    /// Load project metadata
    ///
    /// Fails with [`AdapterError::ProjectNotFound`] when [`ProjectAdapter::detect`]
    /// rejects the directory. Missing or broken metadata is not an error: the
    /// project then simply has no models.
    fn open(&self, options: &ProjectOptions) -> Result<Box<dyn LoadedProject>, AdapterError>;
}

/// An opened project
pub trait LoadedProject {
    /// Root every relative path is resolved against
    fn project_dir(&self) -> &Path;

    /// Targets matching `selection`, without duplicates
    fn list_models(&self, selection: &Selection) -> Vec<ModelTarget>;

    /// Columns the consumers of `target` reference
    fn downstream_columns(&self, target: &ModelTarget) -> ColumnScope;

    fn read_sql(&self, target: &ModelTarget) -> Result<String, AdapterError>;

    fn write_sql(&self, target: &ModelTarget, sql: &str) -> Result<(), AdapterError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selection_all_when_nothing_given() {
        assert!(Selection::all().is_all());
        assert!(!Selection::by_names(["orders"]).is_all());
        assert!(!Selection::by_path("models/staging").is_all());
    }

    #[test]
    fn error_messages() {
        let err = AdapterError::UnknownAdapter {
            name: "spark".to_string(),
            available: "dbt, sql".to_string(),
        };
        assert_eq!(err.to_string(), "Unknown adapter 'spark'. Available: dbt, sql");

        let err = AdapterError::ProjectNotFound {
            adapter: "dbt",
            path: PathBuf::from("/tmp/nowhere"),
        };
        assert_eq!(err.to_string(), "no dbt project found at /tmp/nowhere");
    }
}
