use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Status of a check, requirement, chapter or whole run.
///
/// The variants form a total priority order used when rolling many child
/// statuses into one parent status:
///
/// `ERROR > FAILED > RED > YELLOW > GREEN > SKIPPED > UNANSWERED`
///
/// `NA` sits outside the chain and acts as the identity element of
/// [`Status::combine`]: combining `NA` with anything yields the other
/// operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Status {
    Green,
    Yellow,
    Red,
    Failed,
    Error,
    Skipped,
    Unanswered,
    Na,
}

impl Status {
    /// Position in the combination chain; higher wins. `NA` has no priority.
    fn priority(self) -> u8 {
        match self {
            Status::Error => 7,
            Status::Failed => 6,
            Status::Red => 5,
            Status::Yellow => 4,
            Status::Green => 3,
            Status::Skipped => 2,
            Status::Unanswered => 1,
            Status::Na => 0,
        }
    }

    /// Combine two statuses into the one that dominates.
    ///
    /// Returns the highest-priority status present in `{a, b}`; `NA` is the
    /// identity. The operation is commutative and associative, so a parent
    /// status can be computed as a plain fold starting from `NA`.
    pub fn combine(a: Status, b: Status) -> Status {
        if a == Status::Na {
            return b;
        }
        if b == Status::Na {
            return a;
        }
        if a.priority() >= b.priority() { a } else { b }
    }

    /// The statuses an autopilot is allowed to report itself.
    ///
    /// Everything else (including an absent status) is forced to `ERROR`
    /// during output validation.
    pub fn is_valid_autopilot_status(self) -> bool {
        matches!(
            self,
            Status::Red | Status::Green | Status::Yellow | Status::Failed
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Status::Green => "GREEN",
            Status::Yellow => "YELLOW",
            Status::Red => "RED",
            Status::Failed => "FAILED",
            Status::Error => "ERROR",
            Status::Skipped => "SKIPPED",
            Status::Unanswered => "UNANSWERED",
            Status::Na => "NA",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "GREEN" => Ok(Status::Green),
            "YELLOW" => Ok(Status::Yellow),
            "RED" => Ok(Status::Red),
            "FAILED" => Ok(Status::Failed),
            "ERROR" => Ok(Status::Error),
            "SKIPPED" => Ok(Status::Skipped),
            "UNANSWERED" => Ok(Status::Unanswered),
            "NA" => Ok(Status::Na),
            other => Err(format!("unknown status '{other}'")),
        }
    }
}

/// How a check's output came to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutionType {
    /// No execution happened (e.g. the item was invalid before execution).
    None,
    /// The output was synthesized from a manual answer in the plan.
    Manual,
    /// The output was produced by running an autopilot process.
    Automation,
}

impl fmt::Display for ExecutionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionType::None => f.write_str("None"),
            ExecutionType::Manual => f.write_str("Manual"),
            ExecutionType::Automation => f.write_str("Automation"),
        }
    }
}
