//! dbt projects
//!
//! Models come from `target/manifest.json`. The columns a model's consumers
//! use are collected from the consumers' SQL (compiled when dbt compiled
//! it, otherwise the raw template rendered with stub dbt functions).

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use unstar_core::{ColumnScope, ModelTarget};
use unstar_dbt::{
    absolutize, find_models_by_names, find_models_by_path, load_artifacts, DbtArtifacts, DbtModel,
};
use unstar_jinja::JinjaPreprocessor;
use unstar_sql::{infer_downstream_columns, SqlParser};

use crate::adapter::{AdapterError, LoadedProject, ProjectAdapter, ProjectOptions};
use crate::io;
use crate::Selection;

/// File marking the root of a dbt project
pub const DBT_PROJECT_FILE: &str = "dbt_project.yml";

#[derive(Debug, Clone, Copy, Default)]
pub struct DbtAdapter;

impl DbtAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl ProjectAdapter for DbtAdapter {
    fn name(&self) -> &'static str {
        "dbt"
    }

    fn detect(&self, project_dir: &Path) -> bool {
        project_dir.join(DBT_PROJECT_FILE).is_file()
    }

    fn open(&self, options: &ProjectOptions) -> Result<Box<dyn LoadedProject>, AdapterError> {
        if !self.detect(&options.project_dir) {
            return Err(AdapterError::ProjectNotFound {
                adapter: self.name(),
                path: options.project_dir.clone(),
            });
        }

        let project_dir = absolutize(&options.project_dir);
        let artifacts = load_artifacts(&project_dir, options.manifest.as_deref());
        match &artifacts {
            Some(artifacts) => tracing::info!(
                models = artifacts.models_by_name.len(),
                "loaded dbt manifest"
            ),
            None => tracing::warn!(
                project = %project_dir.display(),
                "no manifest found; run 'dbt compile' to generate target/manifest.json"
            ),
        }

        Ok(Box::new(DbtProject {
            project_dir,
            artifacts,
            preprocessor: JinjaPreprocessor::with_defaults(),
            parser: SqlParser::from_dialect(options.dialect),
        }))
    }
}

/// A dbt project with its manifest loaded
pub struct DbtProject {
    project_dir: PathBuf,
    artifacts: Option<DbtArtifacts>,
    preprocessor: JinjaPreprocessor,
    parser: SqlParser,
}

impl DbtProject {
    /// SQL of every model that depends on a model named `name`
    fn consumer_sql(&self, artifacts: &DbtArtifacts, name: &str) -> Vec<String> {
        artifacts
            .dependents_of(name)
            .into_iter()
            .filter_map(|model| {
                let (sql, is_raw) = model.analysis_sql()?;
                if sql.trim().is_empty() {
                    return None;
                }
                if is_raw {
                    Some(self.preprocessor.preprocess_or_original(sql))
                } else {
                    Some(sql.to_string())
                }
            })
            .collect()
    }
}

impl LoadedProject for DbtProject {
    fn project_dir(&self) -> &Path {
        &self.project_dir
    }

    fn list_models(&self, selection: &Selection) -> Vec<ModelTarget> {
        let Some(artifacts) = &self.artifacts else {
            return Vec::new();
        };

        let selected: Vec<&DbtModel> = if selection.is_all() {
            artifacts.models_by_name.values().collect()
        } else {
            let mut selected = find_models_by_names(artifacts, selection.names.as_slice());
            if let Some(path) = &selection.path {
                selected.extend(find_models_by_path(artifacts, path));
            }
            selected
        };

        let mut seen = HashSet::new();
        selected
            .into_iter()
            .filter(|model| seen.insert(model.name.as_str()))
            .map(|model| ModelTarget::new(&model.name, &model.path))
            .collect()
    }

    fn downstream_columns(&self, target: &ModelTarget) -> ColumnScope {
        let Some(artifacts) = &self.artifacts else {
            return ColumnScope::new();
        };

        let texts = self.consumer_sql(artifacts, &target.name);
        let scope = infer_downstream_columns(&self.parser, &texts);
        tracing::debug!(
            model = %target.name,
            consumers = texts.len(),
            columns = scope.union().len(),
            "resolved downstream columns"
        );
        scope
    }

    fn read_sql(&self, target: &ModelTarget) -> Result<String, AdapterError> {
        if !target.path.exists() {
            return Err(AdapterError::ModelFileMissing(target.path.clone()));
        }

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
