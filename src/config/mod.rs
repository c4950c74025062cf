// src/config/mod.rs

//! Plan file loading and validation.

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{load_and_resolve, load_from_path, load_string_map};
pub use model::{
    AutomationDef, AutopilotDef, ChapterDef, CheckDef, FinalizeDef, HeaderSection,
    MetadataSection, PlanFile, RequirementDef,
};
pub use validate::resolve_plan;
