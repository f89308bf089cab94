//! Test orchestration: the dry-run, unit and integration patterns.
//!
//! A case owns a [`CleanupStack`]; everything it acquires (provider files,
//! applied modules) is registered there the moment it is acquired and released
//! in reverse order once the case is over, pass or fail.

pub mod dry;
pub mod integration;
pub mod unit;

use std::sync::Arc;

use async_trait::async_trait;
use futures_util::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::Instrument as _;

pub use dry::DryCase;
pub use integration::{IntegrationCase, OutputWiring};
pub use unit::UnitCase;

use crate::cleanup::{CleanupStack, Release};
use crate::driver::TerraformDriver;
use crate::error::HarnessError;
use crate::module_input::ModuleInput;
use crate::plan::ValidateReport;
use crate::provider_file::{ProviderBlock, ProviderFile, DEFAULT_PROVIDER_FILE};
use crate::reporter::{CaseOutcome, Reporter, SuiteReport};

/// What `validate` may report and still let a dry run continue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidatePolicy {
    /// Any warning or error fails the case.
    #[default]
    Strict,
    /// Warnings are logged but tolerated.
    AllowWarnings,
}

impl ValidatePolicy {
    pub fn accepts(&self, report: &ValidateReport) -> bool {
        if !report.valid || report.error_count > 0 {
            return false;
        }
        match self {
            ValidatePolicy::Strict => report.warning_count == 0,
            ValidatePolicy::AllowWarnings => true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScenarioSettings {
    pub provider: ProviderBlock,
    pub provider_file: String,
    pub validate_policy: ValidatePolicy,
}

impl Default for ScenarioSettings {
    fn default() -> Self {
        Self {
            provider: ProviderBlock::default(),
            provider_file: DEFAULT_PROVIDER_FILE.to_string(),
            validate_policy: ValidatePolicy::Strict,
        }
    }
}

#[derive(Clone)]
pub struct ScenarioContext {
    pub driver: Arc<dyn TerraformDriver>,
    pub reporter: Arc<dyn Reporter>,
    pub settings: ScenarioSettings,
}

impl ScenarioContext {
    pub fn new(driver: Arc<dyn TerraformDriver>, reporter: Arc<dyn Reporter>) -> Self {
        Self {
            driver,
            reporter,
            settings: ScenarioSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: ScenarioSettings) -> Self {
        self.settings = settings;
        self
    }

    pub(crate) fn log(&self, case: &str, message: impl AsRef<str>) {
        self.reporter.log(case, message.as_ref());
    }
}

#[async_trait]
pub trait Scenario: Send + Sync {
    fn name(&self) -> &str;

    /// Run the case to completion, cleanup included.
    async fn run(&self, ctx: &ScenarioContext) -> Result<(), HarnessError>;
}

/// Run one case as an independent sub-test and report its outcome.
pub async fn run_case<S: Scenario + ?Sized>(ctx: &ScenarioContext, case: &S) -> CaseOutcome {
    let name = case.name();
    let span = tracing::info_span!("case", case = name);
    match case.run(ctx).instrument(span).await {
        Ok(()) => {
            ctx.reporter.pass(name);
            CaseOutcome::passed(name)
        }
        Err(err) => {
            ctx.reporter.fail(name, &err);
            CaseOutcome::failed(name, &err)
        }
    }
}

/// Run a table of cases. With `parallel` the cases are polled concurrently;
/// cases sharing a module directory must not be run that way.
pub async fn run_table<S: Scenario>(
    ctx: &ScenarioContext,
    cases: &[S],
    parallel: bool,
) -> SuiteReport {
    let outcomes = if parallel {
        join_all(cases.iter().map(|case| run_case(ctx, case))).await
    } else {
        let mut outcomes = Vec::with_capacity(cases.len());
        for case in cases {
            outcomes.push(run_case(ctx, case).await);
        }
        outcomes
    };
    SuiteReport { outcomes }
}

/// Write the provider file into `input`'s directory, registering its removal
/// before the content is written.
pub(crate) fn install_provider_file(
    ctx: &ScenarioContext,
    input: &ModuleInput,
    stack: &mut CleanupStack,
) -> Result<(), HarnessError> {
    let path = input.provider_file_path(&ctx.settings.provider_file);
    let file = ProviderFile::with_block(path, ctx.settings.provider.clone())?;
    stack.push(Release::ProviderFile(file));
    if let Some(Release::ProviderFile(file)) = stack.last_mut() {
        file.create()?;
    }
    Ok(())
}

/// Apply twice; the second run must not add, change or destroy anything.
pub(crate) async fn apply_idempotent(
    ctx: &ScenarioContext,
    case: &str,
    input: &ModuleInput,
) -> Result<(), HarnessError> {
    let first = ctx.driver.apply(input).await?;
    ctx.log(case, format!("apply: {first}"));
    let second = ctx.driver.apply(input).await?;
    ctx.log(case, format!("idempotency apply: {second}"));
    if second.has_changes() {
        return Err(HarnessError::NotIdempotent {
            directory: input.directory.clone(),
            summary: second,
        });
    }
    Ok(())
}

/// Combine the case result with cleanup failures. The original failure always
/// wins; a cleanup failure only fails an otherwise passing case.
pub(crate) fn settle(
    result: Result<(), HarnessError>,
    cleanup_failures: Vec<HarnessError>,
) -> Result<(), HarnessError> {
    result?;
    match cleanup_failures.into_iter().next() {
        Some(first) => Err(first),
        None => Ok(()),
    }
}
