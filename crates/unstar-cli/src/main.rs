use anyhow::{Context, Result};
use clap::{ArgGroup, Parser, ValueEnum};
use colored::Colorize;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use unstar_core::{Config, ExpansionStrategy};
use unstar_engine::{
    AdapterRegistry, Orchestrator, OutputMode, ProjectOptions, Reporter, ReporterKind, RunOptions,
    Selection,
};

/// Exit code for usage and configuration errors
const EXIT_USAGE: u8 = 2;

/// unstar - Expand SELECT * into explicit column lists
#[derive(Parser, Debug)]
#[command(name = "unstar")]
#[command(author, version, about, long_about = None)]
#[command(group(ArgGroup::new("mode").args(["dry_run", "write", "output"])))]
struct Cli {
    /// Models (dbt) or SQL files (sql adapter) to process
    #[arg(long, num_args = 1.., value_name = "ITEM")]
    select: Vec<String>,

    /// Only process models under this directory (relative to the project root)
    #[arg(long, value_name = "DIR")]
    path: Option<PathBuf>,

    /// Adapter to use [default: from unstar.toml, else dbt]
    #[arg(long)]
    adapter: Option<String>,

    /// Project root directory
    #[arg(long, default_value = ".", value_name = "DIR")]
    project_dir: PathBuf,

    /// Custom path to manifest.json (dbt adapter only)
    #[arg(long, value_name = "FILE")]
    manifest: Option<PathBuf>,

    /// Path to config file (default: <project-dir>/unstar.toml)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Show changes without applying them (default)
    #[arg(long)]
    dry_run: bool,

    /// Edit model files in place
    #[arg(long)]
    write: bool,

    /// Write updated files to this directory instead
    #[arg(long, value_name = "DIR")]
    output: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value_t = ReporterArg::Human)]
    reporter: ReporterArg,

    /// Keep a backup of every file rewritten with --write
    #[arg(long, requires = "write")]
    backup: bool,

    /// Expansion strategy [default: from unstar.toml, else structural]
    #[arg(long, value_enum)]
    strategy: Option<StrategyArg>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ReporterArg {
    Human,
    Diff,
    Github,
}

impl From<ReporterArg> for ReporterKind {
    fn from(arg: ReporterArg) -> Self {
        match arg {
            ReporterArg::Human => ReporterKind::Human,
            ReporterArg::Diff => ReporterKind::Diff,
            ReporterArg::Github => ReporterKind::Github,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum StrategyArg {
    Structural,
    Textual,
}

impl From<StrategyArg> for ExpansionStrategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Structural => ExpansionStrategy::Structural,
            StrategyArg::Textual => ExpansionStrategy::Textual,
        }
    }
}

impl Cli {
    fn output_mode(&self) -> OutputMode {
        if self.write {
            OutputMode::Write { backup: self.backup }
        } else if let Some(dir) = &self.output {
            OutputMode::OutputDir(dir.clone())
        } else {
            OutputMode::DryRun
        }
    }

    fn selection(&self) -> Selection {
        Selection {
            names: self.select.clone(),
            path: self.path.clone(),
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(&cli) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("{} {:#}", "unstar:".red().bold(), e);
            ExitCode::from(EXIT_USAGE)
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_directives = if verbose {
        "warn,unstar_core=debug,unstar_dbt=debug,unstar_jinja=debug,unstar_sql=debug,unstar_engine=debug"
    } else {
        "warn"
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

/// Run unstar; `Err` means a usage or configuration problem
fn run(cli: &Cli) -> Result<u8> {
    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("invalid config file {}", path.display()))?,
        None => Config::discover(&cli.project_dir).context("invalid unstar.toml")?,
    };
    config.project_root = cli.project_dir.clone();

    if let Some(strategy) = cli.strategy {
        config.strategy = strategy.into();
    }
    let adapter_name = cli.adapter.clone().unwrap_or_else(|| config.adapter.clone());

    tracing::debug!(
        adapter = %adapter_name,
        strategy = %config.strategy,
        dialect = ?config.dialect,
        "configuration loaded"
    );

    let registry = AdapterRegistry::with_defaults();
    let adapter = registry.get(&adapter_name)?;

    let options = ProjectOptions::new(&cli.project_dir)
        .with_manifest(cli.manifest.clone().or_else(|| config.manifest_path()))
        .with_dialect(config.dialect);
    let project = adapter
        .open(&options)
        .context("specify --project-dir or run from the project root")?;

    let targets = project.list_models(&cli.selection());
    if targets.is_empty() {
        println!("unstar: no models selected");
        return Ok(0);
    }

    let mode = cli.output_mode();
    let summary = Orchestrator::new(&*project, RunOptions::from_config(&config, mode.clone())).run(&targets);

    let report = Reporter::new(cli.reporter.into(), project.project_dir()).render(&summary);
    print!("{report}");

    Ok(summary.exit_code(&mode))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn output_modes_are_mutually_exclusive() {
        let err = Cli::try_parse_from(["unstar", "--write", "--dry-run"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);

        let err = Cli::try_parse_from(["unstar", "--write", "--output", "out"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn parses_selection_and_modes() {
        let cli = Cli::try_parse_from([
            "unstar",
            "--select",
            "orders",
            "customers",
            "--write",
            "--backup",
            "--strategy",
            "textual",
            "--reporter",
            "github",
        ])
        .unwrap();

        assert_eq!(cli.select, vec!["orders", "customers"]);
        assert_eq!(cli.output_mode(), OutputMode::Write { backup: true });
        assert_eq!(cli.strategy, Some(StrategyArg::Textual));
        assert_eq!(cli.reporter, ReporterArg::Github);
        assert_eq!(cli.project_dir, PathBuf::from("."));
    }

    #[test]
    fn dry_run_is_the_default_mode() {
        let cli = Cli::try_parse_from(["unstar"]).unwrap();
        assert_eq!(cli.output_mode(), OutputMode::DryRun);
        assert!(cli.selection().is_all());
    }

    #[test]
    fn backup_requires_write() {
        let err = Cli::try_parse_from(["unstar", "--backup"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);

        let err = Cli::try_parse_from(["unstar", "--backup", "--dry-run"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn unknown_reporter_rejected() {
        let err = Cli::try_parse_from(["unstar", "--reporter", "xml"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::InvalidValue);
    }

    fn demo_project() -> TempDir {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::write(root.join("dbt_project.yml"), "name: demo\n").unwrap();
        fs::create_dir_all(root.join("models")).unwrap();
        fs::create_dir_all(root.join("target")).unwrap();
        fs::write(root.join("models/model_a.sql"), "SELECT * FROM source_table").unwrap();
        fs::write(root.join("models/model_b.sql"), "select a, b from {{ ref('model_a') }}").unwrap();

        let manifest = serde_json::json!({
            "nodes": {
                "model.demo.model_a": {
                    "resource_type": "model",
                    "name": "model_a",
                    "original_file_path": "models/model_a.sql",
                    "depends_on": {"nodes": []}
                },
                "model.demo.model_b": {
                    "resource_type": "model",
                    "name": "model_b",
                    "original_file_path": "models/model_b.sql",
                    "depends_on": {"nodes": ["model.demo.model_a"]},
                    "raw_code": "select a, b from {{ ref('model_a') }}"
                }
            }
        });
        fs::write(root.join("target/manifest.json"), manifest.to_string()).unwrap();
        dir
    }

    fn cli_for(root: &Path, extra: &[&str]) -> Cli {
        let mut args = vec!["unstar", "--project-dir", root.to_str().unwrap()];
        args.extend_from_slice(extra);
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn dry_run_with_changes_exits_one() {
        let dir = demo_project();
        let code = run(&cli_for(dir.path(), &["--select", "model_a", "--dry-run"])).unwrap();
        assert_eq!(code, 1);
    }

    #[test]
    fn write_then_dry_run_exits_zero() {
        let dir = demo_project();

        assert_eq!(run(&cli_for(dir.path(), &["--write"])).unwrap(), 0);
        assert_eq!(
            fs::read_to_string(dir.path().join("models/model_a.sql")).unwrap(),
            "SELECT a, b FROM source_table"
        );

        assert_eq!(run(&cli_for(dir.path(), &[])).unwrap(), 0);
    }

    #[test]
    fn missing_dbt_project_is_a_usage_error() {
        let dir = TempDir::new().unwrap();
        let err = run(&cli_for(dir.path(), &[])).unwrap_err();
        assert!(format!("{err:#}").contains("no dbt project found"));
    }

    #[test]
    fn unknown_adapter_is_a_usage_error() {
        let dir = demo_project();
        let err = run(&cli_for(dir.path(), &["--adapter", "looker"])).unwrap_err();
        assert!(err.to_string().contains("Available: dbt, sql"));
    }

    #[test]
    fn no_selected_models_exits_zero() {
        let dir = demo_project();
        assert_eq!(run(&cli_for(dir.path(), &["--select", "nope"])).unwrap(), 0);
    }

    #[test]
    fn config_file_sets_strategy() {
        let dir = demo_project();
        fs::write(dir.path().join("unstar.toml"), "strategy = \"textual\"\n").unwrap();
        let out = TempDir::new().unwrap();

        let code = run(&cli_for(
            dir.path(),
            &["--select", "model_a", "--output", out.path().to_str().unwrap()],
        ))
        .unwrap();

        assert_eq!(code, 0);
        assert_eq!(
            fs::read_to_string(out.path().join("models/model_a.sql")).unwrap(),
            "SELECT\n    a,\n    b\nFROM source_table"
        );
    }

    #[test]
    fn malformed_config_is_a_usage_error() {
        let dir = demo_project();
        fs::write(dir.path().join("unstar.toml"), "strategy = \"magic\"\n").unwrap();
        assert!(run(&cli_for(dir.path(), &[])).is_err());
    }
}
