use async_trait::async_trait;
use serde::Deserialize;

use super::{install_provider_file, settle, Scenario, ScenarioContext};
use crate::cleanup::CleanupStack;
use crate::diff::render_diff;
use crate::error::HarnessError;
use crate::module_input::ModuleInput;
use crate::plan::parse_resource_addresses;

pub const DEFAULT_PLAN_OUT: &str = "tfharness.tfplan";

/// Dry run: init, validate and plan a module, then compare the planned resource
/// addresses with `want`. Nothing is applied.
#[derive(Debug, Clone, Deserialize)]
pub struct DryCase {
    pub name: String,
    pub input: ModuleInput,
    /// Plan file name, written inside the module directory.
    #[serde(default = "default_plan_out")]
    pub plan_out: String,
    /// Expected addresses. Order matters; run once to see what terraform emits.
    #[serde(default)]
    pub want: Vec<String>,
}

fn default_plan_out() -> String {
    DEFAULT_PLAN_OUT.to_string()
}

impl DryCase {
    pub fn new(name: impl Into<String>, input: ModuleInput) -> Self {
        Self {
            name: name.into(),
            input,
            plan_out: default_plan_out(),
            want: Vec::new(),
        }
    }

    pub fn with_plan_out(mut self, plan_out: impl Into<String>) -> Self {
        self.plan_out = plan_out.into();
        self
    }

    pub fn with_want<I, S>(mut self, want: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.want = want.into_iter().map(Into::into).collect();
        self
    }

    async fn steps(
        &self,
        ctx: &ScenarioContext,
        input: &ModuleInput,
        stack: &mut CleanupStack,
    ) -> Result<(), HarnessError> {
        install_provider_file(ctx, input, stack)?;
        ctx.driver.init(input).await?;

        let report = ctx.driver.validate(input).await?;
        if !ctx.settings.validate_policy.accepts(&report) {
            for diagnostic in &report.diagnostics {
                let msg = serde_json::to_string(diagnostic).map_err(|source| {
                    HarnessError::Decode {
                        what: "validate diagnostic",
                        source,
                    }
                })?;
                ctx.log(&self.name, msg);
            }
            return Err(HarnessError::InvalidConfiguration {
                errors: report.error_count,
                warnings: report.warning_count,
            });
        }
        if report.warning_count > 0 {
            ctx.log(
                &self.name,
                format!("validate reported {} warnings", report.warning_count),
            );
        }

        ctx.driver.plan(input, &self.plan_out).await?;
        let plan = ctx.driver.show_plan(input, &self.plan_out).await?;
        let got = parse_resource_addresses(&plan);

        if let Some(diff) = render_diff(&self.want, &got) {
            return Err(HarnessError::PlanMismatch {
                case: self.name.clone(),
                diff,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl Scenario for DryCase {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, ctx: &ScenarioContext) -> Result<(), HarnessError> {
        let modules = [self.input.clone()];
        let mut stack = CleanupStack::new();
        let result = self.steps(ctx, &modules[0], &mut stack).await;
        let cleanup = stack
            .drain(ctx.driver.as_ref(), &modules, ctx.reporter.as_ref(), &self.name)
            .await;
        settle(result, cleanup)
    }
}
