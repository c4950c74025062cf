// src/exec/output.rs

//! Canonical executor output and the autopilot wire protocol.
//!
//! An autopilot communicates its verdict by printing JSON objects, one per
//! stdout line. Only the keys `status`, `reason`, `result` and `output`
//! are interpreted; everything else is inert. Later records overwrite
//! earlier ones per key, except the `output` map which is merged key by
//! key. Malformed values for a recognized key are silently ignored — they
//! simply do not populate that field. Downstream behavior depends on
//! partial records being tolerated, so this must never be upgraded to an
//! error.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::exec::process::{ProcessResult, TIMEOUT_EXIT_CODE};
use crate::types::{ExecutionType, Status};

/// One criterion verdict reported by an autopilot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultRecord {
    #[serde(default)]
    pub criterion: String,
    #[serde(default)]
    pub fulfilled: bool,
    #[serde(default)]
    pub justification: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
}

/// Canonical result of executing one item.
///
/// `status` is always set before the output leaves an executor — either by
/// the child process or forced to `ERROR` by validation.
#[derive(Debug, Clone, Serialize)]
pub struct Output {
    pub execution_type: ExecutionType,
    pub exit_code: i32,
    pub logs: Vec<String>,
    pub error_logs: Vec<String>,
    pub evidence_path: PathBuf,
    pub status: Status,
    pub reason: String,
    pub results: Vec<ResultRecord>,
    pub outputs: BTreeMap<String, String>,
}

impl Default for Output {
    fn default() -> Self {
        Self {
            execution_type: ExecutionType::None,
            exit_code: 0,
            logs: Vec::new(),
            error_logs: Vec::new(),
            evidence_path: PathBuf::new(),
            status: Status::Na,
            reason: String::new(),
            results: Vec::new(),
            outputs: BTreeMap::new(),
        }
    }
}

/// Fields scanned out of the structured data records, before validation.
#[derive(Debug, Clone, Default)]
pub struct ScannedFields {
    /// Raw status string as emitted by the child; validated later.
    pub status: Option<String>,
    pub reason: Option<String>,
    pub results: Vec<ResultRecord>,
    pub outputs: BTreeMap<String, String>,
}

/// Scan the runner's data records for the recognized protocol keys.
pub fn scan_records(data: &[serde_json::Map<String, Value>]) -> ScannedFields {
    let mut fields = ScannedFields::default();

    for record in data {
        if let Some(value) = record.get("status") {
            if let Value::String(s) = value {
                fields.status = Some(s.clone());
            }
        }
        if let Some(value) = record.get("reason") {
            if let Value::String(s) = value {
                fields.reason = Some(s.clone());
            }
        }
        if let Some(value) = record.get("result") {
            if let Some(parsed) = parse_result_records(value) {
                fields.results = parsed;
            }
        }
        if let Some(Value::Object(map)) = record.get("output") {
            // Merged across records; last writer per key wins.
            for (key, value) in map {
                fields.outputs.insert(key.clone(), flatten_value(value));
            }
        }
    }

    fields
}

/// Accept a single record object or an array of record objects; anything
/// else is ignored.
fn parse_result_records(value: &Value) -> Option<Vec<ResultRecord>> {
    match value {
        Value::Object(_) => parse_result_record(value).map(|r| vec![r]),
        Value::Array(entries) => {
            let records: Vec<ResultRecord> =
                entries.iter().filter_map(parse_result_record).collect();
            if records.is_empty() { None } else { Some(records) }
        }
        _ => None,
    }
}

fn parse_result_record(value: &Value) -> Option<ResultRecord> {
    let map = value.as_object()?;

    let mut record = ResultRecord::default();
    if let Some(Value::String(s)) = map.get("criterion") {
        record.criterion = s.clone();
    }
    if let Some(Value::Bool(b)) = map.get("fulfilled") {
        record.fulfilled = *b;
    }
    if let Some(Value::String(s)) = map.get("justification") {
        record.justification = s.clone();
    }
    if let Some(Value::Object(meta)) = map.get("metadata") {
        for (key, value) in meta {
            record.metadata.insert(key.clone(), flatten_value(value));
        }
    }
    Some(record)
}

/// Flatten a dynamic JSON value to its string form: strings as-is, numbers
/// and booleans stringified, nested objects/arrays re-serialized as JSON
/// text.
fn flatten_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        other => serde_json::to_string(other).unwrap_or_default(),
    }
}

/// Populate an [`Output`] from a process result plus scanned fields, then
/// apply the validation contract.
pub fn output_from_process(
    autopilot_name: &str,
    process: ProcessResult,
    evidence_path: PathBuf,
    strict: bool,
) -> Output {
    let fields = scan_records(&process.data);

    let mut output = Output {
        execution_type: ExecutionType::Automation,
        exit_code: process.exit_code,
        logs: process.logs,
        error_logs: process.error_logs,
        evidence_path,
        reason: fields.reason.clone().unwrap_or_default(),
        results: fields.results.clone(),
        outputs: fields.outputs.clone(),
        ..Output::default()
    };

    validate_output(&mut output, &fields, autopilot_name, strict);
    output
}

/// Apply the output validation contract.
///
/// - A non-zero exit code forces `ERROR`, with a distinct message for the
///   timeout sentinel 124.
/// - The child status must be one of RED/GREEN/YELLOW/FAILED; anything
///   else (including an absent status) forces `ERROR`.
/// - Contract violations (missing reason; no results for any status except
///   FAILED; results missing criterion or justification) force `ERROR`
///   with the joined violation messages when `strict`, and are logged as
///   warnings otherwise.
fn validate_output(output: &mut Output, fields: &ScannedFields, name: &str, strict: bool) {
    if output.exit_code != 0 {
        output.status = Status::Error;
        output.reason = if output.exit_code == TIMEOUT_EXIT_CODE {
            format!("autopilot '{name}' timed out and was terminated (exit code 124)")
        } else {
            format!(
                "autopilot '{name}' exited with code {}",
                output.exit_code
            )
        };
        return;
    }

    match &fields.status {
        None => {
            output.status = Status::Error;
            output.reason = format!("autopilot '{name}' did not provide a 'status'");
            return;
        }
        Some(raw) => match Status::from_str(raw) {
            Ok(status) if status.is_valid_autopilot_status() => {
                output.status = status;
            }
            _ => {
                output.status = Status::Error;
                output.reason = format!(
                    "autopilot '{name}' provided an invalid 'status' '{raw}', \
                     expected one of RED, GREEN, YELLOW, FAILED"
                );
                return;
            }
        },
    }

    let violations = collect_violations(output, fields, name);
    if violations.is_empty() {
        return;
    }

    if strict {
        output.status = Status::Error;
        output.reason = violations.join("; ");
    } else {
        for violation in &violations {
            warn!(autopilot = %name, "{violation}");
        }
    }
}

fn collect_violations(output: &Output, fields: &ScannedFields, name: &str) -> Vec<String> {
    let mut violations = Vec::new();

    if fields.reason.as_deref().unwrap_or("").is_empty() {
        violations.push(format!("autopilot '{name}' did not provide a 'reason'"));
    }

    if output.status != Status::Failed && output.results.is_empty() {
        violations.push(format!("autopilot '{name}' did not provide any 'results'"));
    }

    for (index, record) in output.results.iter().enumerate() {
        if record.criterion.is_empty() {
            violations.push(format!(
                "autopilot '{name}' did not provide a 'criterion' in result {index}"
            ));
        }
        if record.justification.is_empty() {
            violations.push(format!(
                "autopilot '{name}' did not provide a 'justification' in result {index}"
            ));
        }
    }

    violations
}
