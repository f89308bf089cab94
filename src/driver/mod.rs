//! The terraform process driver.
//!
//! Scenarios only talk to [`TerraformDriver`]. [`TerraformCli`] shells out to the
//! real binary; [`scripted::ScriptedDriver`] replays canned responses so the
//! orchestration logic can be tested without a cloud account.

pub mod scripted;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use crate::config::HarnessConfig;
use crate::error::HarnessError;
use crate::module_input::ModuleInput;
use crate::plan::{ApplySummary, OutputDocument, PlanDocument, ValidateReport};
use crate::runner::{CommandExecution, CommandRunner, SystemCommandRunner};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DriverOp {
    Init,
    Validate,
    Plan,
    ShowPlan,
    Apply,
    Destroy,
    Output,
}

impl DriverOp {
    pub fn subcommand(&self) -> &'static str {
        match self {
            DriverOp::Init => "init",
            DriverOp::Validate => "validate",
            DriverOp::Plan => "plan",
            DriverOp::ShowPlan => "show",
            DriverOp::Apply => "apply",
            DriverOp::Destroy => "destroy",
            DriverOp::Output => "output",
        }
    }
}

#[async_trait]
pub trait TerraformDriver: Send + Sync {
    async fn init(&self, input: &ModuleInput) -> Result<(), HarnessError>;

    async fn validate(&self, input: &ModuleInput) -> Result<ValidateReport, HarnessError>;

    /// Plan into `plan_out`, a file name relative to the module directory.
    async fn plan(&self, input: &ModuleInput, plan_out: &str) -> Result<(), HarnessError>;

    async fn show_plan(
        &self,
        input: &ModuleInput,
        plan_file: &str,
    ) -> Result<PlanDocument, HarnessError>;

    async fn apply(&self, input: &ModuleInput) -> Result<ApplySummary, HarnessError>;

    async fn destroy(&self, input: &ModuleInput) -> Result<(), HarnessError>;

    async fn output(&self, input: &ModuleInput) -> Result<OutputDocument, HarnessError>;
}

/// Drives the real terraform binary.
pub struct TerraformCli {
    exe: PathBuf,
    runner: Arc<dyn CommandRunner>,
    validate_timeout: Option<Duration>,
    show_timeout: Option<Duration>,
}

impl TerraformCli {
    pub fn new(exe: impl Into<PathBuf>) -> Self {
        let defaults = HarnessConfig::default();
        Self {
            exe: exe.into(),
            runner: Arc::new(SystemCommandRunner),
            validate_timeout: defaults.validate_timeout,
            show_timeout: defaults.show_timeout,
        }
    }

    pub fn from_config(exe: impl Into<PathBuf>, config: &HarnessConfig) -> Self {
        Self::new(exe).with_timeouts(config.validate_timeout, config.show_timeout)
    }

    pub fn with_runner(mut self, runner: Arc<dyn CommandRunner>) -> Self {
        self.runner = runner;
        self
    }

    pub fn with_timeouts(mut self, validate: Option<Duration>, show: Option<Duration>) -> Self {
        self.validate_timeout = validate;
        self.show_timeout = show;
        self
    }

    pub fn exe(&self) -> &std::path::Path {
        &self.exe
    }

    async fn exec(
        &self,
        op: DriverOp,
        input: &ModuleInput,
        args: Vec<String>,
        timeout: Option<Duration>,
    ) -> Result<CommandExecution, HarnessError> {
        let mut env = input.child_env();
        env.insert("TF_IN_AUTOMATION".to_string(), "1".to_string());

        tracing::info!(
            target: "tfharness",
            dir = %input.directory.display(),
            command = op.subcommand(),
            "running terraform"
        );
        let run = self.runner.run(&self.exe, &args, &input.directory, &env);
        let exec = match timeout {
            Some(limit) => tokio::time::timeout(limit, run)
                .await
                .map_err(|_| HarnessError::Timeout {
                    command: op.subcommand().to_string(),
                    after_ms: limit.as_millis(),
                })??,
            None => run.await?,
        };
        tracing::debug!(
            target: "tfharness",
            dir = %input.directory.display(),
            command = op.subcommand(),
            code = ?exec.status.code(),
            "terraform finished"
        );
        Ok(exec)
    }

    async fn exec_checked(
        &self,
        op: DriverOp,
        input: &ModuleInput,
        args: Vec<String>,
        timeout: Option<Duration>,
    ) -> Result<CommandExecution, HarnessError> {
        let exec = self.exec(op, input, args, timeout).await?;
        if !exec.success() {
            return Err(exit_error(op, &exec));
        }
        Ok(exec)
    }
}

fn exit_error(op: DriverOp, exec: &CommandExecution) -> HarnessError {
    let stderr = exec.stderr.trim();
    tracing::warn!(
        target: "tfharness",
        command = op.subcommand(),
        code = ?exec.status.code(),
        stderr = stderr,
        "terraform failed"
    );
    HarnessError::Exit {
        command: op.subcommand().to_string(),
        status: exec.status.code(),
        stderr: stderr.to_string(),
    }
}

fn base_args(op: DriverOp) -> Vec<String> {
    vec![op.subcommand().to_string()]
}

#[async_trait]
impl TerraformDriver for TerraformCli {
    async fn init(&self, input: &ModuleInput) -> Result<(), HarnessError> {
        let mut args = base_args(DriverOp::Init);
        args.push("-input=false".into());
        args.push("-no-color".into());
        if input.reconfigure {
            args.push("-reconfigure".into());
        }
        if input.upgrade {
            args.push("-upgrade".into());
        }
        self.exec_checked(DriverOp::Init, input, args, None).await?;
        Ok(())
    }

    async fn validate(&self, input: &ModuleInput) -> Result<ValidateReport, HarnessError> {
        let mut args = base_args(DriverOp::Validate);
        args.push("-json".into());
        args.push("-no-color".into());
        let exec = self
            .exec(DriverOp::Validate, input, args, self.validate_timeout)
            .await?;
        // An invalid configuration exits 1 but still prints the JSON report.
        if exec.stdout.trim().is_empty() {
            return Err(exit_error(DriverOp::Validate, &exec));
        }
        match ValidateReport::from_json(&exec.stdout) {
            Ok(report) => Ok(report),
            Err(_) if !exec.success() => Err(exit_error(DriverOp::Validate, &exec)),
            Err(err) => Err(err),
        }
    }

    async fn plan(&self, input: &ModuleInput, plan_out: &str) -> Result<(), HarnessError> {
        let mut args = base_args(DriverOp::Plan);
        args.push("-input=false".into());
        args.push("-no-color".into());
        args.push(format!("-out={plan_out}"));
        args.extend(input.var_args());
        self.exec_checked(DriverOp::Plan, input, args, None).await?;
        Ok(())
    }

    async fn show_plan(
        &self,
        input: &ModuleInput,
        plan_file: &str,
    ) -> Result<PlanDocument, HarnessError> {
        let mut args = base_args(DriverOp::ShowPlan);
        args.push("-json".into());
        args.push("-no-color".into());
        args.push(plan_file.to_string());
        let exec = self
            .exec_checked(DriverOp::ShowPlan, input, args, self.show_timeout)
            .await?;
        PlanDocument::from_json(&exec.stdout)
    }

    async fn apply(&self, input: &ModuleInput) -> Result<ApplySummary, HarnessError> {
        let mut args = base_args(DriverOp::Apply);
        args.push("-input=false".into());
        args.push("-no-color".into());
        args.push("-auto-approve".into());
        args.extend(input.var_args());
        let exec = self.exec_checked(DriverOp::Apply, input, args, None).await?;
        ApplySummary::parse(&exec.stdout).ok_or_else(|| HarnessError::UnrecognizedOutput {
            command: DriverOp::Apply.subcommand().to_string(),
            detail: "no resources summary line".to_string(),
        })
    }

    async fn destroy(&self, input: &ModuleInput) -> Result<(), HarnessError> {
        let mut args = base_args(DriverOp::Destroy);
        args.push("-input=false".into());
        args.push("-no-color".into());
        args.push("-auto-approve".into());
        args.extend(input.var_args());
        self.exec_checked(DriverOp::Destroy, input, args, None).await?;
        Ok(())
    }

    async fn output(&self, input: &ModuleInput) -> Result<OutputDocument, HarnessError> {
        let mut args = base_args(DriverOp::Output);
        args.push("-json".into());
        args.push("-no-color".into());
        let exec = self.exec_checked(DriverOp::Output, input, args, None).await?;
        OutputDocument::from_json(&exec.stdout)
    }
}
