//! End-to-end runs over every storage backend.

use ensemble_analysis::DecompositionPipeline;
use ensemble_core::config::{EnsembleConfig, SplitterKind, StorageBackend};
use ensemble_core::errors::{ConfigError, DecompositionError};
use ensemble_core::traits::NodeRepository;
use ensemble_core::types::NodeKey;
use test_fixtures::{bimodal_ensemble, full_mask};

fn config(backend: StorageBackend, dir: &std::path::Path) -> EnsembleConfig {
    EnsembleConfig::from_toml(&format!(
        r#"
[decomposition]
max_depth = 2

[storage]
backend = "{backend}"
directory = "{}"
"#,
        dir.join("nodes").display()
    ))
    .unwrap()
}

fn run_twice(backend: StorageBackend) {
    ensemble_core::tracing::init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let stack = bimodal_ensemble([3, 2, 1], 12, 20.0, 31);
    let mask = full_mask(&stack);

    let pipeline = DecompositionPipeline::from_config(config(backend, dir.path())).unwrap();
    assert_eq!(pipeline.repository().backend_name(), backend.to_string());
    let runs = pipeline.run(&stack, &mask).unwrap();

    let kinds: Vec<SplitterKind> = runs.iter().map(|r| r.splitter).collect();
    assert_eq!(kinds, SplitterKind::ALL.to_vec());
    for run in &runs {
        let evaluation = run.evaluation.as_ref().unwrap();
        assert!(evaluation.total_explainability > 0.0, "{}", run.splitter);
        let path = run.report_path.as_ref().unwrap();
        assert!(path.ends_with(format!("{}_evaluation.json", run.splitter)));
        assert!(path.exists());
    }
    // Only the first splitter computes the shared root.
    assert!(!runs[0].decomposition.node("root").unwrap().cached);
    assert!(runs[1].decomposition.node("root").unwrap().cached);

    if backend == StorageBackend::Memory {
        return;
    }
    // A fresh pipeline over the same directory recomputes nothing.
    let again = DecompositionPipeline::from_config(config(backend, dir.path()))
        .unwrap()
        .run(&stack, &mask)
        .unwrap();
    for (before, after) in runs.iter().zip(&again) {
        assert!(after.decomposition.fully_cached(), "{}", after.splitter);
        assert_eq!(after.evaluation, before.evaluation);
    }
}

#[test]
fn files_backend_round_trip() {
    run_twice(StorageBackend::Files);
}

#[test]
fn sqlite_backend_round_trip() {
    run_twice(StorageBackend::Sqlite);
}

#[test]
fn memory_backend_run() {
    run_twice(StorageBackend::Memory);
}

#[test]
fn selected_splitters_only() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config(StorageBackend::Memory, dir.path());
    config.decomposition.splitters = vec![SplitterKind::Ranking];
    config.evaluation.write_reports = Some(false);
    let stack = bimodal_ensemble([2, 2, 1], 12, 20.0, 1);

    let pipeline = DecompositionPipeline::from_config(config).unwrap();
    let runs = pipeline.run(&stack, &full_mask(&stack)).unwrap();
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].splitter, SplitterKind::Ranking);
    assert!(runs[0].report_path.is_none());
    assert!(pipeline.repository().contains(&NodeKey::root()).unwrap());
    assert!(std::fs::read_dir(dir.path()).unwrap().next().is_none());
}

#[test]
fn invalid_config_is_rejected_before_opening_storage() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config(StorageBackend::Files, dir.path());
    config.decomposition.significance = Some(1.5);
    assert!(matches!(
        DecompositionPipeline::from_config(config),
        Err(DecompositionError::Config(ConfigError::ValidationFailed { .. }))
    ));
    assert!(!dir.path().join("nodes").exists());
}
