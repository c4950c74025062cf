// src/plan/mod.rs

//! Runtime execution plan model.
//!
//! The config loader flattens the chapter → requirement → check hierarchy
//! of the plan file into a list of [`Item`]s, one per check. An `Item`
//! carries everything an executor needs: the hierarchical identity, the
//! autopilot or manual payload, per-item config files and environment, and
//! the resolved app search path.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::Status;

/// Identity and display data of the chapter an item belongs to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChapterRef {
    pub id: String,
    pub title: String,
    pub text: String,
}

/// Identity and display data of the requirement an item belongs to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequirementRef {
    pub id: String,
    pub title: String,
    pub text: String,
}

/// Identity and display data of the check itself.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckRef {
    pub id: String,
    pub title: String,
}

/// A named autopilot script resolved for one item.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Autopilot {
    pub name: String,
    /// Shell script executed to evaluate the check.
    pub run: String,
    /// Autopilot-level environment (overridden by item-level env).
    pub env: BTreeMap<String, String>,
}

/// A manually answered check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManualAnswer {
    pub status: Status,
    pub reason: String,
}

/// One evaluable check, ready for execution.
///
/// Exactly one of `manual` / `autopilot` decides how the item is executed.
/// If both are present the manual answer wins (logged as a conflict by the
/// executor). A set `validation_err` short-circuits execution entirely.
#[derive(Debug, Clone, Default)]
pub struct Item {
    pub chapter: ChapterRef,
    pub requirement: RequirementRef,
    pub check: CheckRef,

    pub autopilot: Option<Autopilot>,
    pub manual: Option<ManualAnswer>,

    /// Config files to materialize in the item's working directory
    /// (filename → content), populated by the config loader.
    pub config: BTreeMap<String, String>,

    /// Item-level environment overlay (overrides autopilot-level env).
    pub env: BTreeMap<String, String>,

    /// Resolved executable search path for the referenced tool.
    pub app_path: String,

    /// Set when the item is known to be malformed before execution
    /// (e.g. an unresolvable autopilot reference). Such items are reported
    /// as `ERROR` outputs instead of being run.
    pub validation_err: Option<String>,
}

impl Item {
    /// Whether this item carries a manual answer and therefore bypasses
    /// autopilot execution.
    pub fn has_manual_answer(&self) -> bool {
        self.manual.is_some()
    }

    /// Name of the referenced autopilot, for log and error messages.
    pub fn autopilot_name(&self) -> &str {
        self.autopilot
            .as_ref()
            .map(|a| a.name.as_str())
            .unwrap_or("unknown")
    }

    /// `<chapter>/<requirement>/<check>` identity for logs and sorting.
    pub fn qualified_id(&self) -> String {
        format!(
            "{}/{}/{}",
            self.chapter.id, self.requirement.id, self.check.id
        )
    }
}

/// The closing step executed once after all items, in the shared root
/// working directory.
#[derive(Debug, Clone, Default)]
pub struct FinalizeSpec {
    pub run: String,
    pub env: BTreeMap<String, String>,
    /// Config files overwritten in place in the root working directory.
    pub config: BTreeMap<String, String>,
}

/// Fully resolved execution plan.
#[derive(Debug, Clone, Default)]
pub struct ExecutionPlan {
    /// Plan document format version.
    pub version: String,
    /// Name of the evaluated project or release.
    pub name: String,
    /// Version of the evaluated project or release.
    pub project_version: String,

    pub items: Vec<Item>,
    pub finalize: Option<FinalizeSpec>,
}
