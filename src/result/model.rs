// src/result/model.rs

//! Serializable result tree.
//!
//! Chapter → requirement → check mappings keyed by id. The static title
//! and text fields are copied from the plan; the status fields are only
//! ever written by the aggregation pass in the result engine, never by
//! executors.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Serialize;

use crate::exec::ResultRecord;
use crate::types::{ExecutionType, Status};

#[derive(Debug, Clone, Serialize)]
pub struct RunResult {
    pub metadata: Metadata,
    pub header: Header,
    pub overall_status: Status,
    pub statistics: Statistics,
    pub chapters: BTreeMap<String, ChapterResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finalize: Option<FinalizeResult>,
}

impl Default for RunResult {
    fn default() -> Self {
        Self {
            metadata: Metadata::default(),
            header: Header::default(),
            overall_status: Status::Na,
            statistics: Statistics::default(),
            chapters: BTreeMap::new(),
            finalize: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Metadata {
    pub version: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Header {
    pub name: String,
    pub version: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChapterResult {
    pub title: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub text: String,
    pub status: Status,
    pub requirements: BTreeMap<String, RequirementResult>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RequirementResult {
    pub title: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub text: String,
    pub status: Status,
    pub checks: BTreeMap<String, CheckResult>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckResult {
    pub title: String,
    pub status: Status,
    #[serde(rename = "type")]
    pub execution_type: ExecutionType,
    pub reason: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub results: Vec<ResultRecord>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub outputs: BTreeMap<String, String>,
    pub execution: ExecutionInfo,
}

/// Raw execution evidence attached to a check or the finalize node.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ExecutionInfo {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub logs: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub error_logs: Vec<String>,
    pub evidence_path: PathBuf,
    pub exit_code: i32,
}

/// Finalizer node: execution info only, never part of the status rollup.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FinalizeResult {
    pub execution: ExecutionInfo,
}

/// Run statistics attached at the root of the tree.
///
/// The four counted categories are mutually exclusive: a check whose
/// status is `UNANSWERED` or `SKIPPED` is counted there regardless of how
/// it was executed; everything else is counted by execution type.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Statistics {
    pub count_checks: u32,
    pub count_automated_checks: u32,
    pub count_manual_checks: u32,
    pub count_unanswered_checks: u32,
    pub count_skipped_checks: u32,
    pub percentage_automated: f64,
    pub percentage_done: f64,
}

/// `part / total` as a percentage rounded to two decimal places.
///
/// A zero total yields `+Infinity`, not an error; callers formatting the
/// value must handle this explicitly.
pub fn percentage(part: u32, total: u32) -> f64 {
    if total == 0 {
        return f64::INFINITY;
    }
    let raw = part as f64 / total as f64 * 100.0;
    (raw * 100.0).round() / 100.0
}
