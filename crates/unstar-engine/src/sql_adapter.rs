//! Plain SQL files
//!
//! Targets are files named directly or found under a directory. There is
//! no dependency metadata, so the scope is always empty and nothing gets
//! rewritten; the adapter still checks that every file can be read.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use unstar_core::{ColumnScope, ModelTarget};
use unstar_dbt::absolutize;
use walkdir::WalkDir;

use crate::adapter::{AdapterError, LoadedProject, ProjectAdapter, ProjectOptions};
use crate::io;
use crate::Selection;

#[derive(Debug, Clone, Copy, Default)]
pub struct SqlAdapter;

impl SqlAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl ProjectAdapter for SqlAdapter {
    fn name(&self) -> &'static str {
        "sql"
    }

    fn detect(&self, project_dir: &Path) -> bool {
        project_dir.is_dir()
    }

    fn open(&self, options: &ProjectOptions) -> Result<Box<dyn LoadedProject>, AdapterError> {
        if !self.detect(&options.project_dir) {
            return Err(AdapterError::ProjectNotFound {
                adapter: self.name(),
                path: options.project_dir.clone(),
            });
        }

        Ok(Box::new(SqlFiles {
            project_dir: absolutize(&options.project_dir),
        }))
    }
}

/// A directory of SQL files
pub struct SqlFiles {
    project_dir: PathBuf,
}

impl SqlFiles {
    /// Resolve a file selector against the project root, then the current directory
    fn resolve_file(&self, name: &str) -> Option<PathBuf> {
        let in_project = self.project_dir.join(name);
        if in_project.is_file() {
            return Some(absolutize(&in_project));
        }

        let as_given = Path::new(name);
        as_given.is_file().then(|| absolutize(as_given))
    }

    fn scan(&self, dir: &Path) -> Vec<PathBuf> {
        WalkDir::new(dir)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry.file_name()))
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    tracing::warn!(error = %e, "skipping unreadable directory entry");
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file() && has_sql_extension(entry.path()))
            .map(|entry| absolutize(entry.path()))
            .collect()
    }
}

impl LoadedProject for SqlFiles {
    fn project_dir(&self) -> &Path {
        &self.project_dir
    }

    fn list_models(&self, selection: &Selection) -> Vec<ModelTarget> {
        let mut paths = Vec::new();

        for name in &selection.names {
            match self.resolve_file(name) {
                Some(path) => paths.push(path),
                None => tracing::warn!(file = %name, "selected SQL file does not exist"),
            }
        }

        if let Some(dir) = &selection.path {
            paths.extend(self.scan(&self.project_dir.join(dir)));
        }

        if selection.is_all() {
            paths.extend(self.scan(&self.project_dir));
        }

        let mut seen = HashSet::new();
        paths
            .into_iter()
            .filter(|path| seen.insert(path.clone()))
            .map(|path| {
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                ModelTarget::new(name, path)
            })
            .collect()
    }

    fn downstream_columns(&self, _target: &ModelTarget) -> ColumnScope {
        ColumnScope::new()
    }

    fn read_sql(&self, target: &ModelTarget) -> Result<String, AdapterError> {
        io::read_text(&target.path).map_err(|source| AdapterError::Read {
            path: target.path.clone(),
            source,
        })
    }

    fn write_sql(&self, target: &ModelTarget, sql: &str) -> Result<(), AdapterError> {
        io::write_text(&target.path, sql).map_err(|source| AdapterError::Write {
            path: target.path.clone(),
            source,
        })
    }
}

fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_str().is_some_and(|n| n.starts_with('.'))
}

fn has_sql_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("sql"))
}
