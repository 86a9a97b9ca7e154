//! Per-target run loop
//!
//! For every target: read the model, resolve its downstream columns, expand
//! stars and, depending on the output mode, write the result. A failing
//! target is recorded as a diagnostic and the run moves on.

use serde::Serialize;
use std::path::{Path, PathBuf};
use unstar_core::config::glob_match;
use unstar_core::{
    ColumnScope, Config, DialectConfig, Diagnostic, DiagnosticCode, ExpansionStrategy, Location,
    ModelTarget,
};
use unstar_sql::StarExpander;

use crate::adapter::{AdapterError, LoadedProject};
use crate::io::{self, DEFAULT_BACKUP_SUFFIX};

/// What to do with rewritten SQL
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// Report only
    #[default]
    DryRun,

    /// Overwrite model files, optionally keeping a backup of the original
    Write { backup: bool },

    /// Write rewritten models under this directory, mirroring project paths
    OutputDir(PathBuf),
}

/// Settings for one run
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub mode: OutputMode,
    pub strategy: ExpansionStrategy,
    pub dialect: DialectConfig,
    pub backup_suffix: String,

    /// Model-name patterns that are never processed
    pub exclude: Vec<String>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            mode: OutputMode::DryRun,
            strategy: ExpansionStrategy::default(),
            dialect: DialectConfig::default(),
            backup_suffix: DEFAULT_BACKUP_SUFFIX.to_string(),
            exclude: Vec::new(),
        }
    }
}

impl RunOptions {
    /// Options taken from `unstar.toml`, with the given output mode
    pub fn from_config(config: &Config, mode: OutputMode) -> Self {
        Self {
            mode,
            strategy: config.strategy,
            dialect: config.dialect,
            backup_suffix: config.backup_suffix.clone(),
            exclude: config.exclude.clone(),
        }
    }

    fn is_excluded(&self, model: &str) -> bool {
        self.exclude.iter().any(|pattern| glob_match(pattern, model))
    }
}

/// A target whose SQL changed
#[derive(Debug, Clone, Serialize)]
pub struct TargetOutcome {
    pub target: ModelTarget,
    pub scope: ColumnScope,
    pub original: String,
    pub rewritten: String,

    /// File the rewritten SQL went to, if anything was written
    pub written_to: Option<PathBuf>,

    /// Backup created before overwriting
    pub backup: Option<PathBuf>,
}

/// Result of processing all targets
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    pub changed: Vec<TargetOutcome>,
    pub unchanged: usize,

    /// Targets skipped by an exclude pattern
    pub excluded: Vec<ModelTarget>,

    /// Per-target failures
    pub diagnostics: Vec<Diagnostic>,
}

impl RunSummary {
    pub fn has_changes(&self) -> bool {
        !self.changed.is_empty()
    }

    pub fn has_failures(&self) -> bool {
        !self.diagnostics.is_empty()
    }

    /// Process exit code: 1 on failures, or on changes found in a dry run
    pub fn exit_code(&self, mode: &OutputMode) -> u8 {
        if self.has_failures() || (*mode == OutputMode::DryRun && self.has_changes()) {
            1
        } else {
            0
        }
    }
}

/// Runs the star expander over a project's targets
pub struct Orchestrator<'a> {
    project: &'a dyn LoadedProject,
    expander: StarExpander,
    options: RunOptions,
}

impl<'a> Orchestrator<'a> {
    pub fn new(project: &'a dyn LoadedProject, options: RunOptions) -> Self {
        Self {
            project,
            expander: StarExpander::new(options.strategy, options.dialect),
            options,
        }
    }

    pub fn run(&self, targets: &[ModelTarget]) -> RunSummary {
        let mut summary = RunSummary::default();

        for target in targets {
            if self.options.is_excluded(&target.name) {
                tracing::debug!(model = %target.name, "excluded by config");
                summary.excluded.push(target.clone());
                continue;
            }

            match self.process(target) {
                Ok(Some(outcome)) => summary.changed.push(outcome),
                Ok(None) => summary.unchanged += 1,
                Err(diagnostic) => {
                    tracing::warn!(model = %target.name, "{}", diagnostic.message);
                    summary.diagnostics.push(diagnostic);
                }
            }
        }

        tracing::info!(
            changed = summary.changed.len(),
            unchanged = summary.unchanged,
            failed = summary.diagnostics.len(),
            "run finished"
        );

        summary
    }

    fn process(&self, target: &ModelTarget) -> Result<Option<TargetOutcome>, Diagnostic> {
        let original = self.project.read_sql(target).map_err(|e| failure(target, &e))?;

        let scope = self.project.downstream_columns(target);
        let expansion = self.expander.expand_with_stats(&original, &scope);
        if expansion.sql == original {
            tracing::debug!(
                model = %target.name,
                unexpanded = expansion.unexpanded,
                "nothing to expand"
            );
            return Ok(None);
        }

        let mut outcome = TargetOutcome {
            target: target.clone(),
            scope,
            original,
            rewritten: expansion.sql,
            written_to: None,
            backup: None,
        };

        match &self.options.mode {
            OutputMode::DryRun => {}
            OutputMode::Write { backup } => {
                if *backup {
                    outcome.backup = io::ensure_backup(&target.path, &self.options.backup_suffix)
                        .map_err(|source| {
                            failure(
                                target,
                                &AdapterError::Write {
                                    path: io::backup_path(&target.path, &self.options.backup_suffix),
                                    source,
                                },
                            )
                        })?;
                }
                self.project
                    .write_sql(target, &outcome.rewritten)
                    .map_err(|e| failure(target, &e))?;
                outcome.written_to = Some(target.path.clone());
            }
            OutputMode::OutputDir(dir) => {
                let dest = output_path(dir, self.project.project_dir(), target);
                io::write_text(&dest, &outcome.rewritten).map_err(|source| {
                    failure(
                        target,
                        &AdapterError::Write {
                            path: dest.clone(),
                            source,
                        },
                    )
                })?;
                outcome.written_to = Some(dest);
            }
        }

        Ok(Some(outcome))
    }
}

/// Destination under `dir`; targets outside the project land at the top level
fn output_path(dir: &Path, root: &Path, target: &ModelTarget) -> PathBuf {
    let relative = target.relative_to(root);
    if relative.is_absolute() {
        dir.join(target.path.file_name().unwrap_or_default())
    } else {
        dir.join(relative)
    }
}

fn failure(target: &ModelTarget, error: &AdapterError) -> Diagnostic {
    let code = match error {
        AdapterError::ModelFileMissing(_) => DiagnosticCode::ModelFileMissing,
        AdapterError::Write { .. } => DiagnosticCode::ModelWriteFailed,
        _ => DiagnosticCode::ModelReadFailed,
    };

    Diagnostic::new(code, error.to_string())
        .with_model(&target.name)
        .with_location(Location::new(target.path.display().to_string()))
}
