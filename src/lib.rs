// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod plan;
pub mod result;
pub mod types;

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::info;

use crate::cli::CliArgs;
use crate::config::{load_and_resolve, load_string_map};
use crate::engine::{FinalizeEngine, ItemEngine};
use crate::exec::ExecutionConfig;
use crate::plan::ExecutionPlan;
use crate::result::ResultEngine;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - plan loading and resolution
/// - the item engine (concurrent check execution)
/// - the result engine (tree construction and persistence)
/// - the finalize engine (optional closing step)
pub async fn run(args: CliArgs) -> Result<()> {
    let plan = load_and_resolve(&args.config, &args.app_dir)?;

    if args.dry_run {
        print_dry_run(&plan);
        return Ok(());
    }

    let vars = load_optional_map(args.vars.as_deref())?;
    let secrets = load_optional_map(args.secrets.as_deref())?;

    let root_work_dir = match &args.work_dir {
        Some(dir) => PathBuf::from(dir),
        None => std::env::current_dir().context("determining current working directory")?,
    };
    fs::create_dir_all(&root_work_dir)
        .with_context(|| format!("creating root working directory {root_work_dir:?}"))?;

    let exec_config = ExecutionConfig {
        root_work_dir: root_work_dir.clone(),
        strict: args.strict,
        timeout: Duration::from_secs(args.timeout),
    };

    // Base environment layer; autopilot- and item-level overlays are
    // merged on top by the executors.
    let base_env = BTreeMap::new();

    let item_engine = ItemEngine::with_config(&exec_config);
    let item_results = item_engine
        .run(&plan.items, &base_env, &vars, &secrets)
        .await?;

    let mut result_engine = ResultEngine::new(&root_work_dir);
    result_engine.create_new_result(&plan, &item_results);

    // The result file is written before the finalizer runs so the
    // finalizer can read it through `result_path`.
    let output_path = Path::new(&args.output);
    result_engine.write_to(output_path)?;

    let finalize_engine = FinalizeEngine::with_config(&exec_config);
    if let Some(output) = finalize_engine
        .run(plan.finalize.as_ref(), &base_env, &secrets)
        .await?
    {
        result_engine.append_finalizer_result(&output);
        result_engine.write_to(output_path)?;
    }

    info!(
        overall_status = %result_engine.result().overall_status,
        output = %args.output,
        "run finished"
    );

    Ok(())
}

fn load_optional_map(path: Option<&str>) -> Result<BTreeMap<String, String>> {
    match path {
        Some(path) => Ok(load_string_map(path)?),
        None => Ok(BTreeMap::new()),
    }
}

/// Simple dry-run output: print chapters, checks and autopilot references.
fn print_dry_run(plan: &ExecutionPlan) {
    println!("qualgate dry-run");
    println!("  plan: {} (version {})", plan.name, plan.project_version);
    println!();

    println!("checks ({}):", plan.items.len());
    for item in &plan.items {
        println!("  - {}", item.qualified_id());
        if !item.check.title.is_empty() {
            println!("      title: {}", item.check.title);
        }
        if let Some(manual) = &item.manual {
            println!("      manual: {} ({})", manual.status, manual.reason);
        }
        if let Some(autopilot) = &item.autopilot {
            println!("      autopilot: {}", autopilot.name);
        }
        if let Some(err) = &item.validation_err {
            println!("      invalid: {err}");
        }
    }

    if plan.finalize.is_some() {
        println!();
        println!("finalize step: present");
    }
}
