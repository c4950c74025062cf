// src/exec/autopilot.rs

//! Autopilot executor.
//!
//! Runs one automated check: prepares a check-scoped working directory,
//! links the shared root files into it, merges the environment layers,
//! runs the autopilot script through the process runner, and converts the
//! captured output into a validated [`Output`].

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use tracing::{info, warn};

use crate::exec::ExecutionConfig;
use crate::exec::output::{Output, output_from_process};
use crate::exec::process::{ProcessRunner, redact_secrets};
use crate::plan::{Autopilot, Item};
use crate::types::{ExecutionType, Status};

#[cfg(unix)]
use std::os::unix::fs::symlink as symlink_file;
#[cfg(windows)]
use std::os::windows::fs::symlink_file;

/// Executes automated check items.
#[derive(Debug)]
pub struct AutopilotExecutor {
    root_work_dir: PathBuf,
    strict: bool,
    timeout: std::time::Duration,
    runner: ProcessRunner,
}

impl AutopilotExecutor {
    pub fn new(config: &ExecutionConfig) -> Self {
        Self {
            root_work_dir: config.root_work_dir.clone(),
            strict: config.strict,
            timeout: config.timeout,
            runner: ProcessRunner::new(),
        }
    }

    /// Execute one automated item.
    ///
    /// `Err` means an infrastructure failure (directory or file could not
    /// be created, process could not be spawned); everything the autopilot
    /// itself does wrong is folded into the returned [`Output`] instead.
    pub async fn execute(
        &self,
        item: &Item,
        env: &BTreeMap<String, String>,
        vars: &BTreeMap<String, String>,
        secrets: &BTreeMap<String, String>,
    ) -> Result<Output> {
        if let Some(validation_err) = &item.validation_err {
            let name = item.autopilot_name();
            warn!(
                check = %item.qualified_id(),
                autopilot = %name,
                "item is invalid; skipping execution"
            );
            return Ok(Output {
                execution_type: ExecutionType::None,
                status: Status::Error,
                reason: format!(
                    "autopilot '{name}' is invalid and could not be executed: {validation_err}"
                ),
                ..Output::default()
            });
        }

        let Some(autopilot) = &item.autopilot else {
            bail!(
                "item '{}' was dispatched to the autopilot executor without an autopilot",
                item.qualified_id()
            );
        };

        let work_dir = self
            .root_work_dir
            .join(&item.chapter.id)
            .join(&item.requirement.id)
            .join(&item.check.id);
        fs::create_dir_all(&work_dir)
            .with_context(|| format!("creating working directory {work_dir:?}"))?;

        for (filename, content) in &item.config {
            let path = work_dir.join(filename);
            fs::write(&path, content)
                .with_context(|| format!("writing config file {path:?}"))?;
        }

        // The shared root files are read-only from the item's perspective;
        // linking gives the child a filesystem snapshot plus its private
        // config files. The links must go away on every exit path.
        let links = link_root_files(&self.root_work_dir, &work_dir)?;
        let result = self
            .run_autopilot(item, autopilot, &work_dir, env, vars, secrets)
            .await;
        remove_links(&links);
        result
    }

    async fn run_autopilot(
        &self,
        item: &Item,
        autopilot: &Autopilot,
        work_dir: &Path,
        env: &BTreeMap<String, String>,
        vars: &BTreeMap<String, String>,
        secrets: &BTreeMap<String, String>,
    ) -> Result<Output> {
        let runtime_env = build_runtime_env(env, autopilot, item);

        info!(
            check = %item.qualified_id(),
            autopilot = %autopilot.name,
            "running autopilot"
        );

        let (program, args) = shell_invocation(&autopilot.run);
        let process = self
            .runner
            .execute(
                program,
                &args,
                &runtime_env,
                secrets,
                work_dir,
                Some(self.timeout),
            )
            .await
            .with_context(|| format!("running autopilot '{}'", autopilot.name))?;

        let output = output_from_process(
            &autopilot.name,
            process,
            work_dir.to_path_buf(),
            self.strict,
        );

        if output.status == Status::Error {
            warn!(
                check = %item.qualified_id(),
                autopilot = %autopilot.name,
                reason = %output.reason,
                "autopilot reported ERROR"
            );
        } else {
            info!(
                check = %item.qualified_id(),
                autopilot = %autopilot.name,
                status = %output.status,
                "autopilot finished"
            );
        }

        write_evidence_snapshots(work_dir, &runtime_env, vars, secrets)?;

        Ok(output)
    }
}

/// Build the autopilot runtime environment as an ordered merge: base env <
/// autopilot-level env < item-level env < reserved keys. Later layers win
/// on key collision.
fn build_runtime_env(
    base: &BTreeMap<String, String>,
    autopilot: &Autopilot,
    item: &Item,
) -> BTreeMap<String, String> {
    let mut env = base.clone();
    env.extend(autopilot.env.clone());
    env.extend(item.env.clone());

    env.insert("evidence_path".to_string(), ".".to_string());
    env.insert("APPS".to_string(), item.app_path.clone());

    let system_path = std::env::var("PATH").unwrap_or_default();
    let path = if item.app_path.is_empty() {
        system_path
    } else {
        let separator = if cfg!(windows) { ";" } else { ":" };
        format!("{}{separator}{system_path}", item.app_path)
    };
    env.insert("PATH".to_string(), path);

    env
}

/// Build a shell command appropriate for the platform.
///
/// On Unix the script is prefixed with `set -e` so any failing statement
/// inside a multi-line script aborts the script with its exit code.
pub(crate) fn shell_invocation(script: &str) -> (&'static str, Vec<String>) {
    if cfg!(windows) {
        ("cmd", vec!["/C".to_string(), script.to_string()])
    } else {
        ("sh", vec!["-c".to_string(), format!("set -e\n{script}")])
    }
}

/// Filenames written fresh into every item's working directory by
/// [`write_evidence_snapshots`]. They are never linked from the root:
/// writing through such a link would mutate the shared root file.
const SNAPSHOT_FILES: [&str; 3] = [".env", ".vars", ".secrets"];

/// Symlink every file from the shared root directory into the item's
/// working directory. Private config files with the same name win, and
/// the snapshot filenames are skipped entirely. On failure the links
/// created so far are removed before returning.
fn link_root_files(root: &Path, work_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut links = Vec::new();

    let entries = fs::read_dir(root)
        .with_context(|| format!("reading shared root directory {root:?}"))?;
    for entry in entries {
        let entry = entry.with_context(|| format!("reading entry of {root:?}"))?;
        let source = entry.path();
        if !source.is_file() {
            continue;
        }
        if SNAPSHOT_FILES.iter().any(|name| entry.file_name() == *name) {
            continue;
        }
        let target = work_dir.join(entry.file_name());
        if target.exists() {
            continue;
        }
        if let Err(err) = symlink_file(&source, &target) {
            remove_links(&links);
            return Err(err)
                .with_context(|| format!("linking {source:?} into {work_dir:?}"));
        }
        links.push(target);
    }

    Ok(links)
}

/// Best-effort removal of the shared-file links.
fn remove_links(links: &[PathBuf]) {
    for link in links {
        if let Err(err) = fs::remove_file(link) {
            warn!(link = ?link, error = %err, "failed to remove shared-file link");
        }
    }
}

/// Persist `.env`, `.vars` and `.secrets` snapshots beside the evidence
/// for auditability. Secret values are redacted in the environment and
/// masked entirely in the secrets snapshot.
fn write_evidence_snapshots(
    work_dir: &Path,
    env: &BTreeMap<String, String>,
    vars: &BTreeMap<String, String>,
    secrets: &BTreeMap<String, String>,
) -> Result<()> {
    let mut env_lines = String::new();
    for (key, value) in env {
        let value = redact_secrets(value, secrets);
        env_lines.push_str(&format!("{key}={value}\n"));
    }
    let env_path = work_dir.join(".env");
    fs::write(&env_path, env_lines)
        .with_context(|| format!("writing environment snapshot {env_path:?}"))?;

    let mut var_lines = String::new();
    for (key, value) in vars {
        var_lines.push_str(&format!("{key}={value}\n"));
    }
    let vars_path = work_dir.join(".vars");
    fs::write(&vars_path, var_lines)
        .with_context(|| format!("writing vars snapshot {vars_path:?}"))?;

    let mut secret_lines = String::new();
    for key in secrets.keys() {
        secret_lines.push_str(&format!("{key}=***\n"));
    }
    let secrets_path = work_dir.join(".secrets");
    fs::write(&secrets_path, secret_lines)
        .with_context(|| format!("writing secrets snapshot {secrets_path:?}"))?;

    Ok(())
}
