use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use anyhow::{Result, anyhow};
use qualgate::exec::{CheckExecutor, Output};
use qualgate::plan::Item;
use qualgate::types::{ExecutionType, Status};

/// Canned behaviour for one check id.
#[derive(Debug, Clone)]
pub enum FakeBehaviour {
    /// Return this output.
    Output(Output),
    /// Fail with an infrastructure error carrying this message.
    Fail(String),
}

/// A fake check executor that:
/// - records which items were "executed" (by qualified id)
/// - returns canned outputs or errors per check id, defaulting to a GREEN
///   automation output.
pub struct FakeCheckExecutor {
    behaviours: HashMap<String, FakeBehaviour>,
    executed: Arc<Mutex<Vec<String>>>,
}

impl FakeCheckExecutor {
    pub fn new(executed: Arc<Mutex<Vec<String>>>) -> Self {
        Self {
            behaviours: HashMap::new(),
            executed,
        }
    }

    pub fn with_output(mut self, check_id: &str, output: Output) -> Self {
        self.behaviours
            .insert(check_id.to_string(), FakeBehaviour::Output(output));
        self
    }

    pub fn with_failure(mut self, check_id: &str, message: &str) -> Self {
        self.behaviours
            .insert(check_id.to_string(), FakeBehaviour::Fail(message.to_string()));
        self
    }
}

impl CheckExecutor for FakeCheckExecutor {
    fn execute<'a>(
        &'a self,
        item: &'a Item,
        _env: &'a BTreeMap<String, String>,
        _vars: &'a BTreeMap<String, String>,
        _secrets: &'a BTreeMap<String, String>,
    ) -> Pin<Box<dyn Future<Output = Result<Output>> + Send + 'a>> {
        let behaviour = self.behaviours.get(&item.check.id).cloned();
        let executed = Arc::clone(&self.executed);
        let qualified_id = item.qualified_id();

        Box::pin(async move {
            {
                let mut guard = executed.lock().unwrap();
                guard.push(qualified_id);
            }

            match behaviour {
                Some(FakeBehaviour::Output(output)) => Ok(output),
                Some(FakeBehaviour::Fail(message)) => Err(anyhow!(message)),
                None => Ok(automation_output(Status::Green, "ok")),
            }
        })
    }
}

/// A minimal valid automation output for tests.
pub fn automation_output(status: Status, reason: &str) -> Output {
    Output {
        execution_type: ExecutionType::Automation,
        status,
        reason: reason.to_string(),
        ..Output::default()
    }
}
