// src/config/validate.rs

use tracing::warn;

use crate::config::model::{CheckDef, PlanFile};
use crate::errors::{QualgateError, Result};
use crate::plan::{
    Autopilot, ChapterRef, CheckRef, ExecutionPlan, FinalizeSpec, Item, ManualAnswer,
    RequirementRef,
};
use crate::types::Status;

/// Validate a raw plan document and flatten it into an [`ExecutionPlan`].
///
/// Structural problems (no chapters, empty ids) fail the whole load.
/// Per-item problems that only affect one check — most importantly an
/// automation referencing an unknown autopilot — are folded into the
/// item's `validation_err` so the run can still produce a result tree
/// with that check reported as `ERROR`.
pub fn resolve_plan(raw: &PlanFile, app_path: &str) -> Result<ExecutionPlan> {
    ensure_has_chapters(raw)?;
    ensure_nonempty_ids(raw)?;

    let mut items = Vec::new();

    for (chapter_id, chapter) in raw.chapters.iter() {
        let chapter_ref = ChapterRef {
            id: chapter_id.clone(),
            title: chapter.title.clone(),
            text: chapter.text.clone(),
        };

        for (req_id, req) in chapter.requirements.iter() {
            let req_ref = RequirementRef {
                id: req_id.clone(),
                title: req.title.clone(),
                text: req.text.clone(),
            };

            for (check_id, check) in req.checks.iter() {
                items.push(resolve_item(
                    raw,
                    &chapter_ref,
                    &req_ref,
                    check_id,
                    check,
                    app_path,
                ));
            }
        }
    }

    Ok(ExecutionPlan {
        version: raw.metadata.version.clone(),
        name: raw.header.name.clone(),
        project_version: raw.header.version.clone(),
        items,
        finalize: raw.finalize.as_ref().map(|f| FinalizeSpec {
            run: f.run.clone(),
            env: f.env.clone(),
            config: f.config.clone(),
        }),
    })
}

fn resolve_item(
    raw: &PlanFile,
    chapter: &ChapterRef,
    requirement: &RequirementRef,
    check_id: &str,
    check: &CheckDef,
    app_path: &str,
) -> Item {
    let mut item = Item {
        chapter: chapter.clone(),
        requirement: requirement.clone(),
        check: CheckRef {
            id: check_id.to_string(),
            title: check.title.clone(),
        },
        app_path: app_path.to_string(),
        ..Item::default()
    };

    item.manual = check.manual.clone();

    if let Some(automation) = &check.automation {
        item.env = automation.env.clone();
        item.config = automation.config.clone();

        match raw.autopilots.get(&automation.autopilot) {
            Some(def) => {
                item.autopilot = Some(Autopilot {
                    name: automation.autopilot.clone(),
                    run: def.run.clone(),
                    env: def.env.clone(),
                });
            }
            None => {
                // Keep the reference name for error reporting even though
                // there is nothing to run.
                item.autopilot = Some(Autopilot {
                    name: automation.autopilot.clone(),
                    ..Autopilot::default()
                });
                item.validation_err = Some(format!(
                    "autopilot '{}' is not defined in the plan",
                    automation.autopilot
                ));
            }
        }
    }

    if item.manual.is_none() && item.autopilot.is_none() {
        warn!(
            chapter = %chapter.id,
            requirement = %requirement.id,
            check = %check_id,
            "check has neither a manual answer nor an automation; reporting as UNANSWERED"
        );
        item.manual = Some(ManualAnswer {
            status: Status::Unanswered,
            reason: "check was not answered".to_string(),
        });
    }

    item
}

fn ensure_has_chapters(raw: &PlanFile) -> Result<()> {
    if raw.chapters.is_empty() {
        return Err(QualgateError::ConfigError(
            "plan must contain at least one chapter".to_string(),
        ));
    }
    Ok(())
}

fn ensure_nonempty_ids(raw: &PlanFile) -> Result<()> {
    for (chapter_id, chapter) in raw.chapters.iter() {
        if chapter_id.trim().is_empty() {
            return Err(QualgateError::ConfigError(
                "chapter id must not be empty".to_string(),
            ));
        }
        for (req_id, req) in chapter.requirements.iter() {
            if req_id.trim().is_empty() {
                return Err(QualgateError::ConfigError(format!(
                    "requirement id in chapter '{chapter_id}' must not be empty"
                )));
            }
            for check_id in req.checks.keys() {
                if check_id.trim().is_empty() {
                    return Err(QualgateError::ConfigError(format!(
                        "check id in requirement '{chapter_id}/{req_id}' must not be empty"
                    )));
                }
            }
        }
    }
    Ok(())
}
