//! Deterministic stand-in for terraform.
//!
//! Responses are scripted per module directory and every call is recorded, along
//! with whether the harness-managed provider file was on disk at that moment.

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use parking_lot::Mutex;

use super::{DriverOp, TerraformDriver};
use crate::error::HarnessError;
use crate::module_input::ModuleInput;
use crate::plan::{ApplySummary, OutputDocument, PlanDocument, ValidateReport};
use crate::provider_file::DEFAULT_PROVIDER_FILE;
use crate::vars::VarValue;

#[derive(Debug, Clone, PartialEq)]
pub struct DriverCall {
    pub op: DriverOp,
    pub directory: PathBuf,
    pub vars: BTreeMap<String, VarValue>,
    pub provider_file_present: bool,
    /// `-out` / plan file argument for plan and show.
    pub plan_file: Option<String>,
}

#[derive(Default)]
struct Script {
    validate: Option<ValidateReport>,
    plans: HashMap<PathBuf, PlanDocument>,
    applies: HashMap<PathBuf, VecDeque<ApplySummary>>,
    outputs: HashMap<PathBuf, OutputDocument>,
    failures: HashSet<(DriverOp, PathBuf)>,
}

pub struct ScriptedDriver {
    provider_file: String,
    script: Mutex<Script>,
    calls: Mutex<Vec<DriverCall>>,
}

impl Default for ScriptedDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedDriver {
    pub fn new() -> Self {
        Self {
            provider_file: DEFAULT_PROVIDER_FILE.to_string(),
            script: Mutex::new(Script::default()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// File name checked for presence on every call.
    pub fn with_provider_file(mut self, name: impl Into<String>) -> Self {
        self.provider_file = name.into();
        self
    }

    pub fn with_validate(self, report: ValidateReport) -> Self {
        self.script.lock().validate = Some(report);
        self
    }

    pub fn with_plan(self, dir: impl Into<PathBuf>, plan: PlanDocument) -> Self {
        self.script.lock().plans.insert(dir.into(), plan);
        self
    }

    /// Summaries returned by successive applies in `dir`; once exhausted every
    /// apply reports no changes.
    pub fn with_applies(self, dir: impl Into<PathBuf>, summaries: Vec<ApplySummary>) -> Self {
        self.script
            .lock()
            .applies
            .insert(dir.into(), summaries.into_iter().collect());
        self
    }

    pub fn with_outputs(self, dir: impl Into<PathBuf>, outputs: OutputDocument) -> Self {
        self.script.lock().outputs.insert(dir.into(), outputs);
        self
    }

    /// Make `op` in `dir` exit non-zero.
    pub fn failing(self, op: DriverOp, dir: impl Into<PathBuf>) -> Self {
        self.script.lock().failures.insert((op, dir.into()));
        self
    }

    pub fn calls(&self) -> Vec<DriverCall> {
        self.calls.lock().clone()
    }

    pub fn ops(&self) -> Vec<DriverOp> {
        self.calls.lock().iter().map(|c| c.op).collect()
    }

    pub fn count(&self, op: DriverOp) -> usize {
        self.calls.lock().iter().filter(|c| c.op == op).count()
    }

    /// Directories `op` ran against, in call order.
    pub fn directories_for(&self, op: DriverOp) -> Vec<PathBuf> {
        self.calls
            .lock()
            .iter()
            .filter(|c| c.op == op)
            .map(|c| c.directory.clone())
            .collect()
    }

    fn record(
        &self,
        op: DriverOp,
        input: &ModuleInput,
        plan_file: Option<&str>,
    ) -> Result<(), HarnessError> {
        let dir = input.directory.clone();
        self.calls.lock().push(DriverCall {
            op,
            provider_file_present: dir.join(&self.provider_file).exists(),
            directory: dir.clone(),
            vars: input.vars.clone(),
            plan_file: plan_file.map(str::to_string),
        });
        if self.script.lock().failures.contains(&(op, dir)) {
            return Err(HarnessError::Exit {
                command: op.subcommand().to_string(),
                status: Some(1),
                stderr: format!("scripted {} failure", op.subcommand()),
            });
        }
        Ok(())
    }

    fn key(input: &ModuleInput) -> &Path {
        &input.directory
    }
}

#[async_trait]
impl TerraformDriver for ScriptedDriver {
    async fn init(&self, input: &ModuleInput) -> Result<(), HarnessError> {
        self.record(DriverOp::Init, input, None)
    }

    async fn validate(&self, input: &ModuleInput) -> Result<ValidateReport, HarnessError> {
        self.record(DriverOp::Validate, input, None)?;
        Ok(self
            .script
            .lock()
            .validate
            .clone()
            .unwrap_or_else(ValidateReport::clean))
    }

    async fn plan(&self, input: &ModuleInput, plan_out: &str) -> Result<(), HarnessError> {
        self.record(DriverOp::Plan, input, Some(plan_out))
    }

    async fn show_plan(
        &self,
        input: &ModuleInput,
        plan_file: &str,
    ) -> Result<PlanDocument, HarnessError> {
        self.record(DriverOp::ShowPlan, input, Some(plan_file))?;
        Ok(self
            .script
            .lock()
            .plans
            .get(Self::key(input))
            .cloned()
            .unwrap_or_default())
    }

    async fn apply(&self, input: &ModuleInput) -> Result<ApplySummary, HarnessError> {
        self.record(DriverOp::Apply, input, None)?;
        Ok(self
            .script
            .lock()
            .applies
            .get_mut(Self::key(input))
            .and_then(VecDeque::pop_front)
            .unwrap_or_default())
    }

    async fn destroy(&self, input: &ModuleInput) -> Result<(), HarnessError> {
        self.record(DriverOp::Destroy, input, None)
    }

    async fn output(&self, input: &ModuleInput) -> Result<OutputDocument, HarnessError> {
        self.record(DriverOp::Output, input, None)?;
        Ok(self
            .script
            .lock()
            .outputs
            .get(Self::key(input))
            .cloned()
            .unwrap_or_default())
    }
}
