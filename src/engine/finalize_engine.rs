// src/engine/finalize_engine.rs

//! Single sequential closing step.
//!
//! The finalizer runs exactly once, strictly after every item task has
//! completed, in the shared root working directory.

use std::collections::BTreeMap;

use anyhow::Result;
use tracing::debug;

use crate::exec::{ExecutionConfig, FinalizeExecutor, Output};
use crate::plan::FinalizeSpec;

pub struct FinalizeEngine {
    executor: FinalizeExecutor,
}

impl FinalizeEngine {
    pub fn with_config(config: &ExecutionConfig) -> Self {
        Self {
            executor: FinalizeExecutor::new(config),
        }
    }

    /// Run the closing step if the plan has one.
    pub async fn run(
        &self,
        finalize: Option<&FinalizeSpec>,
        env: &BTreeMap<String, String>,
        secrets: &BTreeMap<String, String>,
    ) -> Result<Option<Output>> {
        let Some(spec) = finalize else {
            debug!("plan has no finalize step");
            return Ok(None);
        };

        let output = self.executor.execute(spec, env, secrets).await?;
        Ok(Some(output))
    }
}
