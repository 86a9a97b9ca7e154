//! Run reporters
//!
//! Reporters render a [`RunSummary`] to text for stdout:
//! - `human`: one line per changed model plus a summary line
//! - `diff`: unified diffs of every changed model
//! - `github`: GitHub Actions workflow annotations

use colored::Colorize;
use std::fmt::Write as _;
use std::path::Path;
use unstar_core::{Diagnostic, UNQUALIFIED};

use crate::io;
use crate::orchestrator::{RunSummary, TargetOutcome};

/// Output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReporterKind {
    #[default]
    Human,
    Diff,
    Github,
}

/// Renders run summaries; paths are shown relative to the project root
pub struct Reporter<'a> {
    kind: ReporterKind,
    project_dir: &'a Path,
}

impl<'a> Reporter<'a> {
    pub fn new(kind: ReporterKind, project_dir: &'a Path) -> Self {
        Self { kind, project_dir }
    }

    pub fn render(&self, summary: &RunSummary) -> String {
        match self.kind {
            ReporterKind::Human => self.render_human(summary),
            ReporterKind::Diff => self.render_diff(summary),
            ReporterKind::Github => self.render_github(summary),
        }
    }

    fn display_path(&self, path: &Path) -> String {
        path.strip_prefix(self.project_dir)
            .unwrap_or(path)
            .display()
            .to_string()
    }

    fn render_human(&self, summary: &RunSummary) -> String {
        let mut out = String::new();

        for outcome in &summary.changed {
            let _ = write!(out, "{} {}: ", "Model".bold(), outcome.target.name);
            match unqualified_columns(outcome) {
                Some(columns) => {
                    let _ = write!(out, "SELECT * → {}", columns.join(", "));
                }
                None => out.push_str("No downstream columns found"),
            }
            if let Some(dest) = &outcome.written_to {
                let _ = write!(out, " {}", format!("(written to {})", dest.display()).dimmed());
            }
            out.push('\n');
        }

        for diagnostic in &summary.diagnostics {
            let _ = writeln!(
                out,
                "{}: {}",
                format!("error[{}]", diagnostic.code).red().bold(),
                diagnostic.message
            );
        }

        let changed = summary.changed.len();
        let headline = format!(
            "{} {} with expandable SELECT *, {} unchanged",
            changed,
            if changed == 1 { "model" } else { "models" },
            summary.unchanged
        );
        let _ = write!(
            out,
            "{}",
            if changed > 0 { headline.yellow() } else { headline.green() }
        );
        if !summary.excluded.is_empty() {
            let _ = write!(out, ", {} excluded", summary.excluded.len());
        }
        if !summary.diagnostics.is_empty() {
            let _ = write!(
                out,
                ", {}",
                format!("{} failed", summary.diagnostics.len()).red()
            );
        }
        out.push('\n');

        out
    }

    fn render_diff(&self, summary: &RunSummary) -> String {
        let mut out = String::new();

        for outcome in &summary.changed {
            let label = self.display_path(&outcome.target.path);
            out.push_str(&io::unified_diff(
                &label,
                &outcome.original,
                &label,
                &outcome.rewritten,
            ));
            if !out.ends_with('\n') {
                out.push('\n');
            }
        }

        for diagnostic in &summary.diagnostics {
            let _ = writeln!(out, "error[{}]: {}", diagnostic.code, diagnostic.message);
        }

        out
    }

    fn render_github(&self, summary: &RunSummary) -> String {
        let mut out = String::new();

        for outcome in &summary.changed {
            let _ = writeln!(
                out,
                "::warning file={}::SELECT * can be expanded to explicit columns",
                self.display_path(&outcome.target.path)
            );
        }

        for diagnostic in &summary.diagnostics {
            let _ = writeln!(
                out,
                "::error file={}::{}",
                self.diagnostic_file(diagnostic),
                escape_annotation(&diagnostic.message)
            );
        }

        out
    }

    fn diagnostic_file(&self, diagnostic: &Diagnostic) -> String {
        diagnostic
            .location
            .as_ref()
            .map(|location| self.display_path(Path::new(&location.file)))
            .unwrap_or_default()
    }
}

/// Sorted unqualified columns of the outcome's scope, if there are any
fn unqualified_columns(outcome: &TargetOutcome) -> Option<Vec<&str>> {
    let columns: Vec<&str> = outcome
        .scope
        .get(UNQUALIFIED)?
        .iter()
        .map(String::as_str)
        .collect();
    (!columns.is_empty()).then_some(columns)
}

/// Workflow commands end at a newline; encode the characters that would break them
fn escape_annotation(message: &str) -> String {
    message
        .replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}
