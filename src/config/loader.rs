// src/config/loader.rs

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::config::model::PlanFile;
use crate::config::validate::resolve_plan;
use crate::errors::Result;
use crate::plan::ExecutionPlan;

/// Load a plan file from the given path and return the raw [`PlanFile`].
///
/// This only performs YAML deserialization; it does **not** perform
/// semantic validation or item resolution. Use [`load_and_resolve`] for
/// that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<PlanFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let plan: PlanFile = serde_yaml::from_str(&contents)?;

    Ok(plan)
}

/// Load a plan file from path, validate it, and flatten it into an
/// [`ExecutionPlan`].
///
/// This is the recommended entry point for the rest of the application:
///
/// - Reads YAML.
/// - Applies defaults (handled by `serde` + `Default` impls).
/// - Checks structural sanity (chapters present, ids non-empty).
/// - Resolves autopilot references; unresolvable references become
///   per-item validation errors, not load failures.
pub fn load_and_resolve(path: impl AsRef<Path>, app_path: &str) -> Result<ExecutionPlan> {
    let raw = load_from_path(&path)?;
    resolve_plan(&raw, app_path)
}

/// Load a flat `string → string` YAML map, used for the `--vars` and
/// `--secrets` files. A missing path argument is handled by the caller;
/// an empty file yields an empty map.
pub fn load_string_map(path: impl AsRef<Path>) -> Result<BTreeMap<String, String>> {
    let contents = fs::read_to_string(path.as_ref())?;
    if contents.trim().is_empty() {
        return Ok(BTreeMap::new());
    }
    let map: BTreeMap<String, String> = serde_yaml::from_str(&contents)?;
    Ok(map)
}
