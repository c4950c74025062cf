// src/engine/mod.rs

//! Run orchestration for qualgate.
//!
//! This module ties together:
//! - the item engine, which schedules one concurrent task per check item
//!   and collects their outputs
//! - the finalize engine, which runs the optional closing step once after
//!   all items have completed
//!
//! Evaluation failures never surface as errors here; they arrive as
//! `ERROR` outputs inside successful results. An `Err` from an engine
//! means an infrastructure failure that aborted the run.

use crate::exec::Output;
use crate::plan::Item;

pub mod finalize_engine;
pub mod item_engine;

pub use finalize_engine::FinalizeEngine;
pub use item_engine::ItemEngine;

/// Outcome of executing one check item.
#[derive(Debug, Clone)]
pub struct ItemResult {
    pub item: Item,
    pub output: Output,
}
