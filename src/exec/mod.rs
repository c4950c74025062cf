// src/exec/mod.rs

//! Check execution: the process runner and the three executor variants
//! (autopilot, manual, finalizer), plus the pluggable [`CheckExecutor`]
//! seam the item engine is built against.

use std::path::PathBuf;
use std::time::Duration;

pub mod autopilot;
pub mod backend;
pub mod finalize;
pub mod manual;
pub mod output;
pub mod process;

pub use autopilot::AutopilotExecutor;
pub use backend::{CheckExecutor, RealCheckExecutor};
pub use finalize::FinalizeExecutor;
pub use manual::ManualExecutor;
pub use output::{Output, ResultRecord};
pub use process::{ProcessResult, ProcessRunner, TIMEOUT_EXIT_CODE};

/// Execution settings threaded into the executors, instead of process-wide
/// globals, so the engine stays testable and reentrant.
#[derive(Debug, Clone)]
pub struct ExecutionConfig {
    /// Shared root working directory of the run. Items get private
    /// subdirectories below it; the finalizer runs directly in it.
    pub root_work_dir: PathBuf,
    /// Whether output-contract violations force `ERROR`.
    pub strict: bool,
    /// Per-process timeout.
    pub timeout: Duration,
}
