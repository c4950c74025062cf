// src/exec/backend.rs

//! Pluggable check executor abstraction.
//!
//! The item engine talks to a `CheckExecutor` instead of the concrete
//! executors. This makes it easy to swap in a fake executor in tests while
//! keeping the production implementations in [`super::autopilot`] and
//! [`super::manual`].
//!
//! - [`RealCheckExecutor`] is the default implementation: it dispatches to
//!   the manual or autopilot executor based on whether the item carries a
//!   manual answer.
//! - Tests can provide their own `CheckExecutor` that returns canned
//!   outputs or errors without running any process.

use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;

use anyhow::Result;

use crate::exec::ExecutionConfig;
use crate::exec::autopilot::AutopilotExecutor;
use crate::exec::manual::ManualExecutor;
use crate::exec::output::Output;
use crate::plan::Item;

/// Trait abstracting how a single check item is executed.
pub trait CheckExecutor: Send + Sync {
    /// Execute one item and produce its canonical output.
    ///
    /// `Err` is reserved for infrastructure failures; evaluation problems
    /// are encoded inside the returned [`Output`].
    fn execute<'a>(
        &'a self,
        item: &'a Item,
        env: &'a BTreeMap<String, String>,
        vars: &'a BTreeMap<String, String>,
        secrets: &'a BTreeMap<String, String>,
    ) -> Pin<Box<dyn Future<Output = Result<Output>> + Send + 'a>>;
}

/// Production executor: manual answers win over autopilot references.
#[derive(Debug)]
pub struct RealCheckExecutor {
    autopilot: AutopilotExecutor,
    manual: ManualExecutor,
}

impl RealCheckExecutor {
    pub fn new(config: &ExecutionConfig) -> Self {
        Self {
            autopilot: AutopilotExecutor::new(config),
            manual: ManualExecutor::new(),
        }
    }
}

impl CheckExecutor for RealCheckExecutor {
    fn execute<'a>(
        &'a self,
        item: &'a Item,
        env: &'a BTreeMap<String, String>,
        vars: &'a BTreeMap<String, String>,
        secrets: &'a BTreeMap<String, String>,
    ) -> Pin<Box<dyn Future<Output = Result<Output>> + Send + 'a>> {
        Box::pin(async move {
            if item.has_manual_answer() {
                Ok(self.manual.execute(item))
            } else {
                self.autopilot.execute(item, env, vars, secrets).await
            }
        })
    }
}
