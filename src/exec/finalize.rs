// src/exec/finalize.rs

//! Finalizer executor.
//!
//! Same general shape as the autopilot executor, but it operates in the
//! shared root working directory, overwrites its config files in place,
//! and reports the raw exit code, logs and evidence path without the
//! output-validation pass. No status, reason or results are populated
//! from this path.

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::info;

use crate::exec::ExecutionConfig;
use crate::exec::autopilot::shell_invocation;
use crate::exec::output::Output;
use crate::exec::process::ProcessRunner;
use crate::plan::FinalizeSpec;
use crate::types::ExecutionType;

/// Executes the optional closing step of a run.
#[derive(Debug)]
pub struct FinalizeExecutor {
    root_work_dir: PathBuf,
    timeout: std::time::Duration,
    runner: ProcessRunner,
}

impl FinalizeExecutor {
    pub fn new(config: &ExecutionConfig) -> Self {
        Self {
            root_work_dir: config.root_work_dir.clone(),
            timeout: config.timeout,
            runner: ProcessRunner::new(),
        }
    }

    pub async fn execute(
        &self,
        spec: &FinalizeSpec,
        env: &BTreeMap<String, String>,
        secrets: &BTreeMap<String, String>,
    ) -> Result<Output> {
        for (filename, content) in &spec.config {
            let path = self.root_work_dir.join(filename);
            fs::write(&path, content)
                .with_context(|| format!("writing finalizer config file {path:?}"))?;
        }

        let mut runtime_env = env.clone();
        runtime_env.extend(spec.env.clone());
        runtime_env.insert(
            "result_path".to_string(),
            self.root_work_dir.display().to_string(),
        );

        info!("running finalizer");

        let (program, args) = shell_invocation(&spec.run);
        let process = self
            .runner
            .execute(
                program,
                &args,
                &runtime_env,
                secrets,
                &self.root_work_dir,
                Some(self.timeout),
            )
            .await
            .context("running finalizer")?;

        info!(exit_code = process.exit_code, "finalizer finished");

        Ok(Output {
            execution_type: ExecutionType::Automation,
            exit_code: process.exit_code,
            logs: process.logs,
            error_logs: process.error_logs,
            evidence_path: self.root_work_dir.clone(),
            ..Output::default()
        })
    }
}
