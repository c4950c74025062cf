// src/exec/manual.rs

//! Manual executor.
//!
//! No process is run: the output is synthesized directly from the item's
//! manual answer in the plan.

use tracing::warn;

use crate::exec::output::Output;
use crate::plan::Item;
use crate::types::{ExecutionType, Status};

#[derive(Debug, Clone, Default)]
pub struct ManualExecutor;

impl ManualExecutor {
    pub fn new() -> Self {
        Self
    }

    /// Synthesize the output for a manually answered item.
    ///
    /// If the item also carries an autopilot reference, the manual answer
    /// wins; the conflict is logged but is not an error.
    pub fn execute(&self, item: &Item) -> Output {
        if item.autopilot.is_some() {
            warn!(
                check = %item.qualified_id(),
                autopilot = %item.autopilot_name(),
                "check has both a manual answer and an autopilot; using the manual answer"
            );
        }

        let (status, reason) = match &item.manual {
            Some(manual) => (manual.status, manual.reason.clone()),
            None => {
                // Dispatch only sends items with a manual answer here.
                warn!(
                    check = %item.qualified_id(),
                    "manual executor invoked without a manual answer"
                );
                (Status::Unanswered, "check was not answered".to_string())
            }
        };

        Output {
            execution_type: ExecutionType::Manual,
            status,
            reason,
            ..Output::default()
        }
    }
}
