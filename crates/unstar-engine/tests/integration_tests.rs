//! End-to-end runs over on-disk projects

use pretty_assertions::assert_eq;
use std::fs;
use std::path::Path;
use tempfile::TempDir;
use unstar_core::ExpansionStrategy;
use unstar_engine::{
    AdapterRegistry, Orchestrator, OutputMode, ProjectOptions, Reporter, ReporterKind, RunOptions,
    Selection,
};

fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

/// model_a selects * from a source; model_b reads columns a and b from it
fn dbt_project() -> TempDir {
    let dir = TempDir::new().unwrap();
    let root = dir.path();

    write(root, "dbt_project.yml", "name: demo\nversion: '1.0'\n");
    write(root, "models/model_a.sql", "SELECT * FROM source_table");
    write(root, "models/model_b.sql", "select a, b from {{ ref('model_a') }}\n");
    write(
        root,
        "models/staging/stg_events.sql",
        "{{ config(materialized='view') }}\n-- raw events\nselect *\nfrom {{ source('raw', 'events') }}\n",
    );
    write(root, "models/marts/event_counts.sql", "select event_type, count(*) from {{ ref('stg_events') }} group by event_type\n");

    let manifest = serde_json::json!({
        "metadata": {"dbt_version": "1.7.0"},
        "nodes": {
            "model.demo.model_a": {
                "resource_type": "model",
                "name": "model_a",
                "original_file_path": "models/model_a.sql",
                "depends_on": {"nodes": []},
                "raw_code": "SELECT * FROM source_table"
            },
            "model.demo.model_b": {
                "resource_type": "model",
                "name": "model_b",
                "original_file_path": "models/model_b.sql",
                "depends_on": {"nodes": ["model.demo.model_a"]},
                "raw_code": "select a, b from {{ ref('model_a') }}",
                "compiled_code": "select a, b from demo.model_a"
            },
            "model.demo.stg_events": {
                "resource_type": "model",
                "name": "stg_events",
                "original_file_path": "models/staging/stg_events.sql",
                "depends_on": {"nodes": []},
                "raw_code": "select * from {{ source('raw', 'events') }}"
            },
            "model.demo.event_counts": {
                "resource_type": "model",
                "name": "event_counts",
                "original_file_path": "models/marts/event_counts.sql",
                "depends_on": {"nodes": ["model.demo.stg_events"]},
                "raw_code": "select event_type, count(*) from {{ ref('stg_events') }} group by event_type"
            },
            "test.demo.not_null_model_a_a": {
                "resource_type": "test",
                "name": "not_null_model_a_a"
            },
            "model.demo.broken": "not an object"
        }
    });
    write(root, "target/manifest.json", &manifest.to_string());

    dir
}

fn run(root: &Path, selection: &Selection, options: RunOptions) -> unstar_engine::RunSummary {
    let registry = AdapterRegistry::with_defaults();
    let adapter = registry.get("dbt").unwrap();
    let project = adapter.open(&ProjectOptions::new(root)).unwrap();
    let targets = project.list_models(selection);
    Orchestrator::new(&*project, options).run(&targets)
}

#[test]
fn dry_run_detects_expandable_model() {
    let dir = dbt_project();
    let summary = run(dir.path(), &Selection::by_names(["model_a"]), RunOptions::default());

    assert_eq!(summary.changed.len(), 1);
    assert_eq!(summary.changed[0].rewritten, "SELECT a, b FROM source_table");
    assert_eq!(summary.exit_code(&OutputMode::DryRun), 1);

    // dry run leaves the file alone
    assert_eq!(
        fs::read_to_string(dir.path().join("models/model_a.sql")).unwrap(),
        "SELECT * FROM source_table"
    );
}

#[test]
fn templated_model_keeps_header_and_template_references() {
    let dir = dbt_project();
    let summary = run(dir.path(), &Selection::by_path("models/staging"), RunOptions::default());

    assert_eq!(summary.changed.len(), 1);
    assert_eq!(
        summary.changed[0].rewritten,
        "{{ config(materialized='view') }}\n-- raw events\nSELECT event_type FROM {{ source('raw', 'events') }}\n"
    );
}

#[test]
fn write_with_backup_then_rerun_is_a_no_op() {
    let dir = dbt_project();
    let mode = OutputMode::Write { backup: true };
    let options = RunOptions {
        mode: mode.clone(),
        ..RunOptions::default()
    };

    let summary = run(dir.path(), &Selection::all(), options.clone());
    assert_eq!(summary.changed.len(), 2);
    assert_eq!(summary.exit_code(&mode), 0);

    let model_a = dir.path().join("models/model_a.sql");
    assert_eq!(fs::read_to_string(&model_a).unwrap(), "SELECT a, b FROM source_table");
    assert_eq!(
        fs::read_to_string(dir.path().join("models/model_a.sql.bak")).unwrap(),
        "SELECT * FROM source_table"
    );

    let again = run(dir.path(), &Selection::all(), options);
    assert!(!again.has_changes());
    assert_eq!(again.unchanged, 4);
}

#[test]
fn output_directory_leaves_sources_untouched() {
    let dir = dbt_project();
    let out = TempDir::new().unwrap();
    let options = RunOptions {
        mode: OutputMode::OutputDir(out.path().to_path_buf()),
        ..RunOptions::default()
    };

    let summary = run(dir.path(), &Selection::by_names(["model_a"]), options);

    assert_eq!(summary.changed.len(), 1);
    assert_eq!(
        fs::read_to_string(out.path().join("models/model_a.sql")).unwrap(),
        "SELECT a, b FROM source_table"
    );
    assert_eq!(
        fs::read_to_string(dir.path().join("models/model_a.sql")).unwrap(),
        "SELECT * FROM source_table"
    );
}

#[test]
fn textual_strategy_rewrites_line_by_line() {
    let dir = dbt_project();
    let options = RunOptions {
        strategy: ExpansionStrategy::Textual,
        ..RunOptions::default()
    };

    let summary = run(dir.path(), &Selection::by_names(["stg_events"]), options);

    assert_eq!(
        summary.changed[0].rewritten,
        "{{ config(materialized='view') }}\n-- raw events\nselect\n    event_type\nfrom {{ source('raw', 'events') }}\n"
    );
}

#[test]
fn reporters_render_dry_run() {
    let dir = dbt_project();
    let summary = run(dir.path(), &Selection::by_names(["model_a"]), RunOptions::default());

    let project_dir = unstar_dbt::absolutize(dir.path());
    let github = Reporter::new(ReporterKind::Github, &project_dir).render(&summary);
    assert_eq!(
        github,
        "::warning file=models/model_a.sql::SELECT * can be expanded to explicit columns\n"
    );

    let human = Reporter::new(ReporterKind::Human, &project_dir).render(&summary);
    assert!(human.contains("model_a: SELECT * → a, b"));
}

#[test]
fn missing_model_file_is_reported_per_target() {
    let dir = dbt_project();
    fs::remove_file(dir.path().join("models/model_a.sql")).unwrap();

    let summary = run(dir.path(), &Selection::all(), RunOptions::default());

    assert_eq!(summary.diagnostics.len(), 1);
    assert_eq!(summary.diagnostics[0].model.as_deref(), Some("model_a"));
    assert_eq!(summary.changed.len(), 1);
    assert!(summary.has_failures());
}

#[test]
fn sql_adapter_never_rewrites() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "queries/report.sql", "select * from orders\n");

    let registry = AdapterRegistry::with_defaults();
    let project = registry
        .get("sql")
        .unwrap()
        .open(&ProjectOptions::new(dir.path()))
        .unwrap();
    let targets = project.list_models(&Selection::by_path("queries"));
    let summary = Orchestrator::new(&*project, RunOptions::default()).run(&targets);

    assert_eq!(targets.len(), 1);
    assert!(!summary.has_changes());
    assert_eq!(summary.unchanged, 1);
}
