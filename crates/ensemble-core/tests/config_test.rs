//! Tests for the layered configuration system.

use std::sync::Mutex;

use ensemble_core::config::{CliOverrides, EnsembleConfig, SplitterKind, StorageBackend};
use ensemble_core::errors::ConfigError;

/// Global mutex to serialize tests that modify environment variables.
static ENV_MUTEX: Mutex<()> = Mutex::new(());

fn tempdir() -> tempfile::TempDir {
    tempfile::TempDir::new().unwrap()
}

/// Clear all ENSEMBLE_ env vars to prevent cross-test contamination.
fn clear_ensemble_env_vars() {
    for key in [
        "ENSEMBLE_MAX_DEPTH",
        "ENSEMBLE_MIN_SPLIT_MEMBERS",
        "ENSEMBLE_SIGNIFICANCE",
        "ENSEMBLE_SPLITTERS",
        "ENSEMBLE_KMEANS_SEED",
        "ENSEMBLE_EVALUATION_MAX_LEVEL",
        "ENSEMBLE_STORAGE_BACKEND",
        "ENSEMBLE_STORAGE_DIRECTORY",
    ] {
        std::env::remove_var(key);
    }
}

#[test]
fn defaults_match_reference_run() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_ensemble_env_vars();

    let dir = tempdir();
    let config = EnsembleConfig::load(dir.path(), None).unwrap();
    assert_eq!(config.decomposition.effective_max_depth(), 4);
    assert_eq!(config.decomposition.effective_min_split_members(), 6);
    assert!((config.decomposition.effective_significance() - 0.05).abs() < 1e-12);
    assert_eq!(
        config.decomposition.effective_splitters(),
        vec![SplitterKind::Kmeans, SplitterKind::FieldSimilarity, SplitterKind::Ranking]
    );
    assert_eq!(config.kmeans.effective_seed(), 42);
    assert_eq!(config.ranking.effective_min_side_members(), 3);
    assert_eq!(config.evaluation.effective_max_level(), 512);
    assert_eq!(config.storage.effective_backend(), StorageBackend::Files);
}

#[test]
fn cli_beats_env_beats_project_file() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_ensemble_env_vars();

    let dir = tempdir();
    std::fs::write(
        dir.path().join("ensemble.toml"),
        r#"
[decomposition]
max_depth = 2
significance = 0.01
splitters = ["ranking"]

[storage]
backend = "sqlite"
directory = "from-file"
"#,
    )
    .unwrap();

    std::env::set_var("ENSEMBLE_MAX_DEPTH", "3");
    std::env::set_var("ENSEMBLE_STORAGE_DIRECTORY", "from-env");

    let cli = CliOverrides {
        storage_directory: Some("from-cli".to_string()),
        ..Default::default()
    };
    let config = EnsembleConfig::load(dir.path(), Some(&cli)).unwrap();

    assert_eq!(config.decomposition.effective_max_depth(), 3);
    assert!((config.decomposition.effective_significance() - 0.01).abs() < 1e-12);
    assert_eq!(config.decomposition.effective_splitters(), vec![SplitterKind::Ranking]);
    assert_eq!(config.storage.effective_backend(), StorageBackend::Sqlite);
    assert_eq!(config.storage.directory.as_deref(), Some("from-cli"));

    clear_ensemble_env_vars();
}

#[test]
fn env_splitter_list_is_parsed() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_ensemble_env_vars();

    std::env::set_var("ENSEMBLE_SPLITTERS", "field_similarity, kmeans");
    let config = EnsembleConfig::load(tempdir().path(), None).unwrap();
    assert_eq!(
        config.decomposition.effective_splitters(),
        vec![SplitterKind::FieldSimilarity, SplitterKind::Kmeans]
    );

    std::env::set_var("ENSEMBLE_SPLITTERS", "kmeans,bogus");
    let config = EnsembleConfig::load(tempdir().path(), None).unwrap();
    assert_eq!(config.decomposition.effective_splitters().len(), 3);

    clear_ensemble_env_vars();
}

#[test]
fn invalid_toml_reports_path() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_ensemble_env_vars();

    let dir = tempdir();
    std::fs::write(dir.path().join("ensemble.toml"), "[decomposition\nmax_depth = ").unwrap();
    let err = EnsembleConfig::load(dir.path(), None).unwrap_err();
    assert!(matches!(err, ConfigError::ParseError { .. }));
}

#[test]
fn validation_rejects_bad_values() {
    let cases = [
        "[decomposition]\nsignificance = 1.5",
        "[decomposition]\nsignificance = 0.0",
        "[decomposition]\nmin_split_members = 1",
        "[kmeans]\nmax_iterations = 0",
        "[kmeans]\ntolerance = -1.0",
        "[ranking]\nmin_side_members = 0",
        "[ranking]\nmin_side_members = 4",
        "[storage]\ndirectory = \"  \"",
    ];
    for case in cases {
        let config = EnsembleConfig::from_toml(case).unwrap();
        assert!(
            matches!(
                EnsembleConfig::validate(&config),
                Err(ConfigError::ValidationFailed { .. })
            ),
            "expected validation failure for {case:?}"
        );
    }
}

#[test]
fn toml_round_trip_preserves_values() {
    let config = EnsembleConfig::from_toml(
        "[decomposition]\nmax_depth = 7\nsplitters = [\"kmeans\"]\n[kmeans]\nseed = 9\n",
    )
    .unwrap();
    let again = EnsembleConfig::from_toml(&config.to_toml().unwrap()).unwrap();
    assert_eq!(again.decomposition.max_depth, Some(7));
    assert_eq!(again.decomposition.splitters, vec![SplitterKind::Kmeans]);
    assert_eq!(again.kmeans.seed, Some(9));
}

#[test]
fn report_directory_defaults_to_storage_directory() {
    let config = EnsembleConfig::from_toml("[storage]\ndirectory = \"runs/red_sea\"").unwrap();
    assert_eq!(config.report_directory(), std::path::PathBuf::from("runs/red_sea"));
    let config = EnsembleConfig::from_toml(
        "[storage]\ndirectory = \"a\"\n[evaluation]\nreport_directory = \"b\"",
    )
    .unwrap();
    assert_eq!(config.report_directory(), std::path::PathBuf::from("b"));
}
