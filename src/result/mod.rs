// src/result/mod.rs

//! Result tree construction and persistence.

pub mod engine;
pub mod model;

pub use engine::ResultEngine;
pub use model::{
    ChapterResult, CheckResult, ExecutionInfo, FinalizeResult, Header, Metadata,
    RequirementResult, RunResult, Statistics, percentage,
};
