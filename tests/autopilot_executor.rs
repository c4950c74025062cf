// tests/autopilot_executor.rs

#![cfg(unix)]

use std::collections::BTreeMap;
use std::fs;
use std::time::Duration;

use qualgate::exec::{AutopilotExecutor, ExecutionConfig};
use qualgate::types::{ExecutionType, Status};
use qualgate_test_utils::builders::ItemBuilder;
use qualgate_test_utils::init_tracing;
use tempfile::TempDir;

fn config_for(dir: &TempDir, strict: bool) -> ExecutionConfig {
    ExecutionConfig {
        root_work_dir: dir.path().to_path_buf(),
        strict,
        timeout: Duration::from_secs(10),
    }
}

fn no_env() -> BTreeMap<String, String> {
    BTreeMap::new()
}

const VERDICT_SCRIPT: &str = r#"printf '%s\n' \
  '{"status":"GREEN"}' \
  '{"reason":"all good"}' \
  '{"result":{"criterion":"c1","fulfilled":true,"justification":"checked"}}' \
  '{"output":{"a":"b","c":"d"}}' \
  '{"output":{"c":"f"}}'"#;

#[tokio::test]
async fn full_verdict_is_scanned_into_the_output() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let executor = AutopilotExecutor::new(&config_for(&dir, true));

    let item = ItemBuilder::new("1", "1.1", "1")
        .autopilot("verdict", VERDICT_SCRIPT)
        .build();

    let output = executor
        .execute(&item, &no_env(), &no_env(), &no_env())
        .await
        .unwrap();

    assert_eq!(output.execution_type, ExecutionType::Automation);
    assert_eq!(output.exit_code, 0);
    assert_eq!(output.status, Status::Green);
    assert_eq!(output.reason, "all good");
    assert_eq!(output.results.len(), 1);
    assert_eq!(output.results[0].criterion, "c1");
    assert!(output.results[0].fulfilled);
    assert_eq!(output.results[0].justification, "checked");
    assert_eq!(output.evidence_path, dir.path().join("1").join("1.1").join("1"));

    // The output map is merged across records; last writer per key wins.
    let mut expected = BTreeMap::new();
    expected.insert("a".to_string(), "b".to_string());
    expected.insert("c".to_string(), "f".to_string());
    assert_eq!(output.outputs, expected);
}

#[tokio::test]
async fn strict_mode_forces_error_when_results_are_missing() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let executor = AutopilotExecutor::new(&config_for(&dir, true));

    let script = r#"printf '%s\n' '{"status":"GREEN"}' '{"reason":"ok"}'"#;
    let item = ItemBuilder::new("1", "1.1", "1")
        .autopilot("incomplete", script)
        .build();

    let output = executor
        .execute(&item, &no_env(), &no_env(), &no_env())
        .await
        .unwrap();

    assert_eq!(output.status, Status::Error);
    assert!(
        output.reason.contains("did not provide any 'results'"),
        "got: {}",
        output.reason
    );
}

#[tokio::test]
async fn non_strict_mode_keeps_the_original_status_on_violations() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let executor = AutopilotExecutor::new(&config_for(&dir, false));

    let script = r#"printf '%s\n' '{"status":"GREEN"}' '{"reason":"ok"}'"#;
    let item = ItemBuilder::new("1", "1.1", "1")
        .autopilot("incomplete", script)
        .build();

    let output = executor
        .execute(&item, &no_env(), &no_env(), &no_env())
        .await
        .unwrap();

    assert_eq!(output.status, Status::Green);
    assert_eq!(output.reason, "ok");
}

#[tokio::test]
async fn malformed_protocol_values_do_not_populate_fields_or_abort() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let executor = AutopilotExecutor::new(&config_for(&dir, false));

    // A numeric status, a non-record result and an object reason are all
    // ignored; the later well-formed records still land.
    let script = r#"printf '%s\n' \
  '{"status":5}' \
  '{"result":"oops"}' \
  '{"reason":{"nested":true}}' \
  '{"status":"GREEN"}' \
  '{"reason":"ok"}'"#;
    let item = ItemBuilder::new("1", "1.1", "1")
        .autopilot("sloppy", script)
        .build();

    let output = executor
        .execute(&item, &no_env(), &no_env(), &no_env())
        .await
        .unwrap();

    assert_eq!(output.exit_code, 0);
    assert_eq!(output.status, Status::Green);
    assert_eq!(output.reason, "ok");
    assert!(output.results.is_empty());
}

#[tokio::test]
async fn malformed_status_alone_counts_as_no_status_at_all() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let executor = AutopilotExecutor::new(&config_for(&dir, false));

    let script = r#"printf '%s\n' '{"status":5}' '{"reason":"ok"}'"#;
    let item = ItemBuilder::new("1", "1.1", "1")
        .autopilot("numeric", script)
        .build();

    let output = executor
        .execute(&item, &no_env(), &no_env(), &no_env())
        .await
        .unwrap();

    assert_eq!(output.status, Status::Error);
    assert!(
        output.reason.contains("did not provide a 'status'"),
        "got: {}",
        output.reason
    );
}

#[tokio::test]
async fn later_status_and_reason_records_overwrite_earlier_ones() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let executor = AutopilotExecutor::new(&config_for(&dir, false));

    let script = r#"printf '%s\n' \
  '{"status":"RED"}' \
  '{"reason":"first"}' \
  '{"status":"GREEN"}' \
  '{"reason":"second"}'"#;
    let item = ItemBuilder::new("1", "1.1", "1")
        .autopilot("revising", script)
        .build();

    let output = executor
        .execute(&item, &no_env(), &no_env(), &no_env())
        .await
        .unwrap();

    assert_eq!(output.status, Status::Green);
    assert_eq!(output.reason, "second");
}

#[tokio::test]
async fn invalid_status_is_forced_to_error() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let executor = AutopilotExecutor::new(&config_for(&dir, false));

    let script = r#"printf '%s\n' '{"status":"PURPLE"}' '{"reason":"ok"}'"#;
    let item = ItemBuilder::new("1", "1.1", "1")
        .autopilot("colorful", script)
        .build();

    let output = executor
        .execute(&item, &no_env(), &no_env(), &no_env())
        .await
        .unwrap();

    assert_eq!(output.status, Status::Error);
    assert!(output.reason.contains("invalid 'status'"), "got: {}", output.reason);
}

#[tokio::test]
async fn invalid_item_short_circuits_without_running_a_process() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let executor = AutopilotExecutor::new(&config_for(&dir, true));

    let item = ItemBuilder::new("1", "1.1", "1")
        .autopilot("ghost", "echo should-not-run")
        .validation_err("autopilot 'ghost' is not defined in the plan")
        .build();

    let output = executor
        .execute(&item, &no_env(), &no_env(), &no_env())
        .await
        .unwrap();

    assert_eq!(output.execution_type, ExecutionType::None);
    assert_eq!(output.status, Status::Error);
    assert!(
        output
            .reason
            .contains("autopilot 'ghost' is invalid and could not be executed"),
        "got: {}",
        output.reason
    );
    // No working directory was created for the check.
    assert!(!dir.path().join("1").exists());
}

#[tokio::test]
async fn timeout_is_reported_as_error_with_a_timeout_reason() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let config = ExecutionConfig {
        root_work_dir: dir.path().to_path_buf(),
        strict: true,
        timeout: Duration::from_millis(200),
    };
    let executor = AutopilotExecutor::new(&config);

    let item = ItemBuilder::new("1", "1.1", "1")
        .autopilot("sleepy", "sleep 5")
        .build();

    let output = executor
        .execute(&item, &no_env(), &no_env(), &no_env())
        .await
        .unwrap();

    assert_eq!(output.exit_code, 124);
    assert_eq!(output.status, Status::Error);
    assert!(output.reason.contains("timed out"), "got: {}", output.reason);
}

#[tokio::test]
async fn set_e_aborts_a_multi_line_script_with_the_failing_exit_code() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let executor = AutopilotExecutor::new(&config_for(&dir, false));

    let script = "false\necho '{\"status\":\"GREEN\"}'";
    let item = ItemBuilder::new("1", "1.1", "1")
        .autopilot("aborting", script)
        .build();

    let output = executor
        .execute(&item, &no_env(), &no_env(), &no_env())
        .await
        .unwrap();

    assert_eq!(output.exit_code, 1);
    assert_eq!(output.status, Status::Error);
    assert!(output.logs.is_empty());
}

#[tokio::test]
async fn config_files_are_materialized_in_the_working_directory() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let executor = AutopilotExecutor::new(&config_for(&dir, false));

    let item = ItemBuilder::new("1", "1.1", "1")
        .autopilot("reader", "cat check-config.yaml")
        .config_file("check-config.yaml", "hello: world")
        .build();

    let output = executor
        .execute(&item, &no_env(), &no_env(), &no_env())
        .await
        .unwrap();

    assert!(output.logs.contains(&"hello: world".to_string()));
}

#[tokio::test]
async fn shared_root_files_are_linked_in_and_cleaned_up() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("shared.txt"), "shared content").unwrap();
    let executor = AutopilotExecutor::new(&config_for(&dir, false));

    let item = ItemBuilder::new("1", "1.1", "1")
        .autopilot("linker", "cat shared.txt")
        .build();

    let output = executor
        .execute(&item, &no_env(), &no_env(), &no_env())
        .await
        .unwrap();

    // The link was visible during execution...
    assert!(output.logs.contains(&"shared content".to_string()));
    // ...and removed afterwards, while the root original stays.
    let work_dir = dir.path().join("1").join("1.1").join("1");
    assert!(!work_dir.join("shared.txt").exists());
    assert!(dir.path().join("shared.txt").exists());
}

#[tokio::test]
async fn reserved_environment_keys_are_set_for_the_child() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let executor = AutopilotExecutor::new(&config_for(&dir, false));

    let item = ItemBuilder::new("1", "1.1", "1")
        .autopilot("env-dump", "echo \"$evidence_path\"; echo \"$APPS\"")
        .app_path("/opt/apps")
        .env("OVERLAY", "from-item")
        .build();

    let output = executor
        .execute(&item, &no_env(), &no_env(), &no_env())
        .await
        .unwrap();

    assert_eq!(output.logs, vec![".".to_string(), "/opt/apps".to_string()]);
}

#[tokio::test]
async fn item_env_overrides_autopilot_env() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let executor = AutopilotExecutor::new(&config_for(&dir, false));

    let item = ItemBuilder::new("1", "1.1", "1")
        .autopilot("layered", "echo \"$LAYER\"")
        .autopilot_env("LAYER", "autopilot")
        .env("LAYER", "item")
        .build();

    let output = executor
        .execute(&item, &no_env(), &no_env(), &no_env())
        .await
        .unwrap();

    assert_eq!(output.logs, vec!["item".to_string()]);
}

#[tokio::test]
async fn root_snapshot_files_are_never_mutated_by_an_item() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join(".env"), "ROOT=original\n").unwrap();
    fs::write(dir.path().join(".vars"), "ROOT_VAR=original\n").unwrap();
    let executor = AutopilotExecutor::new(&config_for(&dir, false));

    let item = ItemBuilder::new("1", "1.1", "1")
        .autopilot("snapshotting", "true")
        .build();

    executor
        .execute(&item, &no_env(), &no_env(), &no_env())
        .await
        .unwrap();

    // The item writes its own snapshots; the root files stay untouched.
    assert_eq!(
        fs::read_to_string(dir.path().join(".env")).unwrap(),
        "ROOT=original\n"
    );
    assert_eq!(
        fs::read_to_string(dir.path().join(".vars")).unwrap(),
        "ROOT_VAR=original\n"
    );

    let work_dir = dir.path().join("1").join("1.1").join("1");
    let item_env = fs::read_to_string(work_dir.join(".env")).unwrap();
    assert!(item_env.contains("PATH="));
    assert!(!item_env.contains("ROOT=original"));
}

#[tokio::test]
async fn evidence_snapshots_never_contain_plaintext_secrets() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let executor = AutopilotExecutor::new(&config_for(&dir, false));

    let mut secrets = BTreeMap::new();
    secrets.insert("TOKEN".to_string(), "tok-value".to_string());
    let mut vars = BTreeMap::new();
    vars.insert("TARGET".to_string(), "production".to_string());

    let item = ItemBuilder::new("1", "1.1", "1")
        .autopilot("audited", "true")
        .env("AUTH", "tok-value")
        .build();

    executor
        .execute(&item, &no_env(), &vars, &secrets)
        .await
        .unwrap();

    let work_dir = dir.path().join("1").join("1.1").join("1");

    let env_snapshot = fs::read_to_string(work_dir.join(".env")).unwrap();
    assert!(!env_snapshot.contains("tok-value"));
    assert!(env_snapshot.contains("AUTH=***TOKEN***"));

    let vars_snapshot = fs::read_to_string(work_dir.join(".vars")).unwrap();
    assert!(vars_snapshot.contains("TARGET=production"));

    let secrets_snapshot = fs::read_to_string(work_dir.join(".secrets")).unwrap();
    assert!(secrets_snapshot.contains("TOKEN=***"));
    assert!(!secrets_snapshot.contains("tok-value"));
}
