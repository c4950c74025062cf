// src/result/engine.rs

//! Result engine: folds per-item outcomes into the hierarchical result
//! tree and computes the derived statuses and statistics.
//!
//! The engine exclusively owns the tree for the duration of a run. It is
//! only ever touched from the single collecting task after the item
//! results have been drained, so no locking is involved.

use std::collections::btree_map::Entry;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::engine::ItemResult;
use crate::errors::Result;
use crate::exec::Output;
use crate::plan::ExecutionPlan;
use crate::result::model::{
    ChapterResult, CheckResult, ExecutionInfo, FinalizeResult, Header, Metadata,
    RequirementResult, RunResult, percentage,
};
use crate::types::{ExecutionType, Status};

pub struct ResultEngine {
    root_work_dir: PathBuf,
    result: RunResult,
}

impl ResultEngine {
    pub fn new(root_work_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_work_dir: root_work_dir.into(),
            result: RunResult::default(),
        }
    }

    /// Reset the tree, copy the plan header, insert every item result, and
    /// run the bottom-up aggregation pass.
    pub fn create_new_result(&mut self, plan: &ExecutionPlan, item_results: &[ItemResult]) {
        self.result = RunResult {
            metadata: Metadata {
                version: plan.version.clone(),
            },
            header: Header {
                name: plan.name.clone(),
                version: plan.project_version.clone(),
            },
            ..RunResult::default()
        };

        for item_result in item_results {
            self.add_item_result(item_result);
        }

        self.aggregate();
        self.compute_statistics_percentages();

        info!(
            overall_status = %self.result.overall_status,
            checks = self.result.statistics.count_checks,
            "result tree built"
        );
    }

    /// Attach the finalizer outcome. Only execution info is recorded; the
    /// overall status is never recomputed from the finalizer.
    pub fn append_finalizer_result(&mut self, output: &Output) {
        let evidence_path = relative_to(&output.evidence_path, &self.root_work_dir);
        self.result.finalize = Some(FinalizeResult {
            execution: ExecutionInfo {
                logs: output.logs.clone(),
                error_logs: output.error_logs.clone(),
                evidence_path,
                exit_code: output.exit_code,
            },
        });
    }

    pub fn result(&self) -> &RunResult {
        &self.result
    }

    /// Serialize the result tree to YAML and write it to `path`.
    pub fn write_to(&self, path: &Path) -> Result<()> {
        let document = serde_yaml::to_string(&self.result)?;
        fs::write(path, document)?;
        info!(path = ?path, "result file written");
        Ok(())
    }

    fn add_item_result(&mut self, item_result: &ItemResult) {
        let item = &item_result.item;
        let output = &item_result.output;

        let chapter = match self.result.chapters.entry(item.chapter.id.clone()) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(ChapterResult {
                title: item.chapter.title.clone(),
                text: item.chapter.text.clone(),
                status: Status::Na,
                requirements: Default::default(),
            }),
        };

        let requirement = match chapter.requirements.entry(item.requirement.id.clone()) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(RequirementResult {
                title: item.requirement.title.clone(),
                text: item.requirement.text.clone(),
                status: Status::Na,
                checks: Default::default(),
            }),
        };

        let evidence_path = relative_to(&output.evidence_path, &self.root_work_dir);
        requirement.checks.insert(
            item.check.id.clone(),
            CheckResult {
                title: item.check.title.clone(),
                status: output.status,
                execution_type: output.execution_type,
                reason: output.reason.clone(),
                results: output.results.clone(),
                outputs: output.outputs.clone(),
                execution: ExecutionInfo {
                    logs: output.logs.clone(),
                    error_logs: output.error_logs.clone(),
                    evidence_path,
                    exit_code: output.exit_code,
                },
            },
        );

        let stats = &mut self.result.statistics;
        stats.count_checks += 1;
        match output.status {
            Status::Unanswered => stats.count_unanswered_checks += 1,
            Status::Skipped => stats.count_skipped_checks += 1,
            _ => match output.execution_type {
                ExecutionType::Manual => stats.count_manual_checks += 1,
                ExecutionType::Automation | ExecutionType::None => {
                    stats.count_automated_checks += 1
                }
            },
        }
    }

    /// Single bottom-up pass: each check's status is already copied
    /// verbatim from its evaluation; combine checks into requirements,
    /// requirements into chapters, chapters into the overall status.
    fn aggregate(&mut self) {
        let mut overall = Status::Na;

        for chapter in self.result.chapters.values_mut() {
            let mut chapter_status = Status::Na;

            for requirement in chapter.requirements.values_mut() {
                let mut requirement_status = Status::Na;
                for check in requirement.checks.values() {
                    requirement_status = Status::combine(requirement_status, check.status);
                }
                requirement.status = requirement_status;
                chapter_status = Status::combine(chapter_status, requirement_status);
            }

            chapter.status = chapter_status;
            overall = Status::combine(overall, chapter_status);
            debug!(status = %chapter_status, "chapter status combined");
        }

        self.result.overall_status = overall;
    }

    fn compute_statistics_percentages(&mut self) {
        let stats = &mut self.result.statistics;
        stats.percentage_automated =
            percentage(stats.count_automated_checks, stats.count_checks);
        stats.percentage_done = percentage(
            stats.count_checks - stats.count_unanswered_checks,
            stats.count_checks,
        );
    }
}

fn relative_to(path: &Path, root: &Path) -> PathBuf {
    path.strip_prefix(root).unwrap_or(path).to_path_buf()
}
