// tests/finalize_engine.rs

#![cfg(unix)]

use std::collections::BTreeMap;
use std::fs;
use std::time::Duration;

use qualgate::engine::FinalizeEngine;
use qualgate::exec::ExecutionConfig;
use qualgate::plan::FinalizeSpec;
use qualgate::types::{ExecutionType, Status};
use qualgate_test_utils::init_tracing;
use tempfile::TempDir;

fn config_for(dir: &TempDir) -> ExecutionConfig {
    ExecutionConfig {
        root_work_dir: dir.path().to_path_buf(),
        strict: true,
        timeout: Duration::from_secs(10),
    }
}

fn no_env() -> BTreeMap<String, String> {
    BTreeMap::new()
}

#[tokio::test]
async fn absent_finalize_step_yields_no_output() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let engine = FinalizeEngine::with_config(&config_for(&dir));

    let output = engine.run(None, &no_env(), &no_env()).await.unwrap();

    assert!(output.is_none());
}

#[tokio::test]
async fn finalizer_runs_in_the_root_directory_with_result_path_set() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let engine = FinalizeEngine::with_config(&config_for(&dir));

    let spec = FinalizeSpec {
        run: "echo \"$result_path\"\ntouch finalized.marker".to_string(),
        ..FinalizeSpec::default()
    };

    let output = engine
        .run(Some(&spec), &no_env(), &no_env())
        .await
        .unwrap()
        .unwrap();

    assert_eq!(output.logs, vec![dir.path().display().to_string()]);
    // The script ran directly in the shared root directory.
    assert!(dir.path().join("finalized.marker").exists());
    assert_eq!(output.evidence_path.as_path(), dir.path());
}

#[tokio::test]
async fn config_files_are_overwritten_in_place_in_the_root_directory() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("settings.yaml"), "stale").unwrap();
    let engine = FinalizeEngine::with_config(&config_for(&dir));

    let mut config = BTreeMap::new();
    config.insert("settings.yaml".to_string(), "fresh".to_string());
    let spec = FinalizeSpec {
        run: "cat settings.yaml".to_string(),
        config,
        ..FinalizeSpec::default()
    };

    let output = engine
        .run(Some(&spec), &no_env(), &no_env())
        .await
        .unwrap()
        .unwrap();

    assert_eq!(output.logs, vec!["fresh".to_string()]);
    let root_file = fs::read_to_string(dir.path().join("settings.yaml")).unwrap();
    assert_eq!(root_file, "fresh");
}

#[tokio::test]
async fn nonzero_exit_is_reported_raw_without_a_validation_pass() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let engine = FinalizeEngine::with_config(&config_for(&dir));

    let spec = FinalizeSpec {
        run: "echo archived\nexit 3".to_string(),
        ..FinalizeSpec::default()
    };

    let output = engine
        .run(Some(&spec), &no_env(), &no_env())
        .await
        .unwrap()
        .unwrap();

    // Raw execution evidence only; the finalizer never goes through the
    // autopilot validation contract.
    assert_eq!(output.exit_code, 3);
    assert_eq!(output.logs, vec!["archived".to_string()]);
    assert_eq!(output.execution_type, ExecutionType::Automation);
    assert_eq!(output.status, Status::Na);
    assert_eq!(output.reason, "");
    assert!(output.results.is_empty());
}

#[tokio::test]
async fn spec_env_overrides_the_base_environment() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let engine = FinalizeEngine::with_config(&config_for(&dir));

    let mut base = BTreeMap::new();
    base.insert("LAYER".to_string(), "base".to_string());
    let mut env = BTreeMap::new();
    env.insert("LAYER".to_string(), "finalize".to_string());

    let spec = FinalizeSpec {
        run: "echo \"$LAYER\"".to_string(),
        env,
        ..FinalizeSpec::default()
    };

    let output = engine
        .run(Some(&spec), &base, &no_env())
        .await
        .unwrap()
        .unwrap();

    assert_eq!(output.logs, vec!["finalize".to_string()]);
}
