// src/exec/process.rs

//! Sandboxed subprocess runner.
//!
//! Runs one external command with a working directory, an environment
//! overlay, an optional timeout, and a secret set. Captured stdout/stderr
//! are redacted and split into log lines; stdout lines that decode as JSON
//! objects additionally become structured data records for the wire
//! protocol between the orchestrator and the autopilot.
//!
//! A timeout is not an error: it is encoded as exit code 124 plus an
//! error-log line, so downstream validation treats it uniformly with any
//! other failing exit code. `Err` is reserved for infrastructure failures
//! (the process could not be spawned or awaited at all).

use std::collections::BTreeMap;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tracing::{debug, warn};

/// Idiomatic exit code reported when the child is killed on timeout.
pub const TIMEOUT_EXIT_CODE: i32 = 124;

/// Captured result of one subprocess run.
#[derive(Debug, Clone, Default)]
pub struct ProcessResult {
    pub exit_code: i32,
    /// stdout split into lines, secrets redacted.
    pub logs: Vec<String>,
    /// stderr split into lines, secrets redacted.
    pub error_logs: Vec<String>,
    /// stdout lines that decoded as JSON objects, in emission order.
    /// Numbers are preserved as decimal text, not rounded floats.
    pub data: Vec<serde_json::Map<String, serde_json::Value>>,
}

impl ProcessResult {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Runs external commands and captures their output.
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner;

impl ProcessRunner {
    pub fn new() -> Self {
        Self
    }

    /// Execute `program` with `args` in `work_dir`.
    ///
    /// The child environment is the parent process environment merged with
    /// `env` (the overlay wins on key collision). Every occurrence of each
    /// secret *value* is replaced by `***<SECRET_NAME>***` in both streams
    /// before any line is stored or parsed.
    pub async fn execute(
        &self,
        program: &str,
        args: &[String],
        env: &BTreeMap<String, String>,
        secrets: &BTreeMap<String, String>,
        work_dir: &Path,
        timeout: Option<Duration>,
    ) -> Result<ProcessResult> {
        let mut cmd = Command::new(program);
        cmd.args(args)
            .envs(env)
            .current_dir(work_dir)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd
            .spawn()
            .with_context(|| format!("spawning process '{program}' in {work_dir:?}"))?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        // Drain both pipes concurrently so neither buffer can fill up and
        // block the child.
        let stdout_task = tokio::spawn(collect_lines(stdout));
        let stderr_task = tokio::spawn(collect_lines(stderr));

        let mut timed_out = false;
        let exit_code = match timeout {
            Some(limit) => {
                tokio::select! {
                    status = child.wait() => {
                        status
                            .with_context(|| format!("waiting for process '{program}'"))?
                            .code()
                            .unwrap_or(-1)
                    }
                    _ = tokio::time::sleep(limit) => {
                        warn!(program = %program, timeout = ?limit, "process timed out; killing it");
                        if let Err(err) = child.kill().await {
                            warn!(program = %program, error = %err, "failed to kill timed-out process");
                        }
                        // Reap the child so the pipes reach EOF.
                        let _ = child.wait().await;
                        timed_out = true;
                        TIMEOUT_EXIT_CODE
                    }
                }
            }
            None => child
                .wait()
                .await
                .with_context(|| format!("waiting for process '{program}'"))?
                .code()
                .unwrap_or(-1),
        };

        let raw_logs = stdout_task
            .await
            .context("joining stdout reader task")?;
        let raw_error_logs = stderr_task
            .await
            .context("joining stderr reader task")?;

        let mut result = ProcessResult {
            exit_code,
            ..ProcessResult::default()
        };

        // Redaction happens before storage and before JSON parsing; secret
        // values must never reach any artifact.
        for line in raw_logs {
            let line = redact_secrets(&line, secrets);
            if let Ok(serde_json::Value::Object(record)) = serde_json::from_str(&line) {
                result.data.push(record);
            }
            result.logs.push(line);
        }
        for line in raw_error_logs {
            result.error_logs.push(redact_secrets(&line, secrets));
        }

        if timed_out {
            let limit = timeout.unwrap_or_default();
            result
                .error_logs
                .push(format!("Command timed out after {limit:?}"));
        }

        debug!(
            program = %program,
            exit_code = result.exit_code,
            log_lines = result.logs.len(),
            data_records = result.data.len(),
            "process finished"
        );

        Ok(result)
    }
}

/// Read a pipe to EOF, line by line.
///
/// The `lines()` iterator never yields an empty trailing entry for a final
/// newline, which is exactly the contract the runner wants.
async fn collect_lines<R>(pipe: Option<R>) -> Vec<String>
where
    R: AsyncRead + Unpin + Send,
{
    let mut collected = Vec::new();
    if let Some(pipe) = pipe {
        let reader = BufReader::new(pipe);
        let mut lines = reader.lines();
        while let Ok(Some(line)) = lines.next_line().await {
            collected.push(line);
        }
    }
    collected
}

/// Replace every occurrence of each secret value with `***<NAME>***`.
///
/// Also used for the `.env` artifact snapshot, which must never contain
/// plaintext secret values.
pub fn redact_secrets(text: &str, secrets: &BTreeMap<String, String>) -> String {
    let mut redacted = text.to_string();
    for (name, value) in secrets {
        if value.is_empty() {
            continue;
        }
        redacted = redacted.replace(value, &format!("***{name}***"));
    }
    redacted
}
