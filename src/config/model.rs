// src/config/model.rs

//! Serde model of the YAML plan file.
//!
//! This mirrors the on-disk document shape only; semantic validation and
//! the flattening into runtime [`Item`](crate::plan::Item)s live in
//! [`validate`](super::validate).

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::plan::ManualAnswer;

/// Top-level plan document.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlanFile {
    #[serde(default)]
    pub metadata: MetadataSection,
    #[serde(default)]
    pub header: HeaderSection,
    /// Named autopilot definitions referenced by checks.
    #[serde(default)]
    pub autopilots: BTreeMap<String, AutopilotDef>,
    #[serde(default)]
    pub chapters: BTreeMap<String, ChapterDef>,
    /// Optional closing step, run once after all checks.
    #[serde(default)]
    pub finalize: Option<FinalizeDef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetadataSection {
    #[serde(default = "default_version")]
    pub version: String,
}

fn default_version() -> String {
    "v1".to_string()
}

impl Default for MetadataSection {
    fn default() -> Self {
        Self {
            version: default_version(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HeaderSection {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub version: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AutopilotDef {
    /// Shell script executed to evaluate a check.
    pub run: String,
    #[serde(default)]
    pub env: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChapterDef {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub requirements: BTreeMap<String, RequirementDef>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RequirementDef {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub checks: BTreeMap<String, CheckDef>,
}

/// One check. Carries a manual answer, an automation reference, or neither
/// (in which case it is reported as `UNANSWERED`).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CheckDef {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub manual: Option<ManualAnswer>,
    #[serde(default)]
    pub automation: Option<AutomationDef>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AutomationDef {
    /// Name of an entry in the top-level `autopilots` map.
    pub autopilot: String,
    /// Item-level environment overlay (overrides autopilot-level env).
    #[serde(default)]
    pub env: BTreeMap<String, String>,
    /// Config files (filename → content) materialized in the item's
    /// working directory before execution.
    #[serde(default)]
    pub config: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FinalizeDef {
    pub run: String,
    #[serde(default)]
    pub env: BTreeMap<String, String>,
    #[serde(default)]
    pub config: BTreeMap<String, String>,
}
