// src/engine/item_engine.rs

//! Concurrent scheduling of check items.
//!
//! Each item is executed in its own Tokio task, so all checks of a plan
//! run in parallel; fan-out is bounded only by the number of items. Items
//! operate in private working directories and must not assume side effects
//! from siblings; the only synchronization point is the final join. One
//! item timing out or failing never cancels the others.

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::{Result, anyhow, bail};
use tokio::task::JoinSet;
use tracing::{debug, error, info};

use crate::engine::ItemResult;
use crate::exec::{CheckExecutor, ExecutionConfig, RealCheckExecutor};
use crate::plan::Item;

/// Schedules one concurrently executed task per check item and collects
/// the per-item outcomes.
pub struct ItemEngine {
    executor: Arc<dyn CheckExecutor>,
}

impl ItemEngine {
    /// Engine backed by the production executors.
    pub fn with_config(config: &ExecutionConfig) -> Self {
        Self::new(Arc::new(RealCheckExecutor::new(config)))
    }

    /// Engine backed by an arbitrary executor (used by tests to substitute
    /// a fake that runs no processes).
    pub fn new(executor: Arc<dyn CheckExecutor>) -> Self {
        Self { executor }
    }

    /// Execute all items and return their outcomes.
    ///
    /// The contract at this boundary is all-or-nothing: if any item task
    /// fails with an infrastructure error, the whole run reports failure
    /// and returns no results, even though other items may have completed.
    /// Evaluation failures are not errors — they arrive as `ERROR` outputs
    /// inside successful results.
    ///
    /// Result ordering follows task completion order, not input order;
    /// consumers needing a stable order must re-sort by
    /// chapter/requirement/check id.
    pub async fn run(
        &self,
        items: &[Item],
        env: &BTreeMap<String, String>,
        vars: &BTreeMap<String, String>,
        secrets: &BTreeMap<String, String>,
    ) -> Result<Vec<ItemResult>> {
        if items.is_empty() {
            info!("no items to execute");
            return Ok(Vec::new());
        }

        let env = Arc::new(env.clone());
        let vars = Arc::new(vars.clone());
        let secrets = Arc::new(secrets.clone());

        let mut tasks = JoinSet::new();
        for item in items.iter().cloned() {
            let executor = Arc::clone(&self.executor);
            let env = Arc::clone(&env);
            let vars = Arc::clone(&vars);
            let secrets = Arc::clone(&secrets);

            tasks.spawn(async move {
                info!(
                    chapter = %item.chapter.id,
                    requirement = %item.requirement.id,
                    check = %item.check.id,
                    title = %item.check.title,
                    "starting check"
                );
                let output = executor.execute(&item, &env, &vars, &secrets).await?;
                Ok::<ItemResult, anyhow::Error>(ItemResult { item, output })
            });
        }

        let mut results = Vec::new();
        let mut errors = Vec::new();

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Ok(result)) => {
                    flush_item_logs(&result);
                    results.push(result);
                }
                Ok(Err(err)) => {
                    error!(error = %err, "check execution failed");
                    errors.push(err);
                }
                Err(join_err) => {
                    error!(error = %join_err, "check task panicked or was aborted");
                    errors.push(anyhow!(join_err));
                }
            }
        }

        if !errors.is_empty() {
            let joined = errors
                .iter()
                .map(|e| format!("{e:#}"))
                .collect::<Vec<_>>()
                .join("; ");
            bail!(
                "{} of {} checks failed with infrastructure errors: {joined}",
                errors.len(),
                items.len()
            );
        }

        Ok(results)
    }
}

/// Emit the item's buffered child-process log lines as each result is
/// collected.
fn flush_item_logs(result: &ItemResult) {
    for line in &result.output.logs {
        debug!(check = %result.item.qualified_id(), "stdout: {line}");
    }
    for line in &result.output.error_logs {
        debug!(check = %result.item.qualified_id(), "stderr: {line}");
    }
}
