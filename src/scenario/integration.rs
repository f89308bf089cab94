use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{apply_idempotent, install_provider_file, settle, Scenario, ScenarioContext};
use crate::cleanup::{CleanupStack, Release};
use crate::error::HarnessError;
use crate::module_input::ModuleInput;
use crate::plan::OutputDocument;

/// Hand one output of module `target - 1` to module `target` as an input variable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputWiring {
    pub target: usize,
    pub output: String,
    pub input: String,
}

impl OutputWiring {
    pub fn new(target: usize, output: impl Into<String>, input: impl Into<String>) -> Self {
        Self {
            target,
            output: output.into(),
            input: input.into(),
        }
    }
}

impl Default for OutputWiring {
    /// The network module's `subnet_id` feeds the next module's
    /// `virtual_network_id`. The names differ on purpose.
    fn default() -> Self {
        Self::new(1, "subnet_id", "virtual_network_id")
    }
}

fn default_wiring() -> Vec<OutputWiring> {
    vec![OutputWiring::default()]
}

/// Deploy several modules in dependency order, feeding outputs of each module
/// into the next, then destroy them in reverse.
#[derive(Debug, Clone, Deserialize)]
pub struct IntegrationCase {
    pub name: String,
    pub modules: Vec<ModuleInput>,
    #[serde(default = "default_wiring")]
    pub wiring: Vec<OutputWiring>,
}

impl IntegrationCase {
    pub fn new(name: impl Into<String>, modules: Vec<ModuleInput>) -> Self {
        Self {
            name: name.into(),
            modules,
            wiring: default_wiring(),
        }
    }

    pub fn with_wiring(mut self, wiring: Vec<OutputWiring>) -> Self {
        self.wiring = wiring;
        self
    }

    fn check(&self) -> Result<(), HarnessError> {
        if self.modules.is_empty() {
            return Err(HarnessError::InvalidCase(format!(
                "{}: integration case without modules",
                self.name
            )));
        }
        if let Some(bad) = self
            .wiring
            .iter()
            .find(|w| w.target == 0 || w.target >= self.modules.len())
        {
            return Err(HarnessError::InvalidCase(format!(
                "{}: wiring target {} must name a module after the first (have {})",
                self.name,
                bad.target,
                self.modules.len()
            )));
        }
        Ok(())
    }

    /// Copy every wired output of the preceding module into `target`'s vars.
    pub fn wire_inputs(
        &self,
        target: usize,
        upstream: &OutputDocument,
        input: &mut ModuleInput,
    ) -> Result<(), HarnessError> {
        for link in self.wiring.iter().filter(|w| w.target == target) {
            let value = upstream.get_var(&link.output)?;
            input.set_var(link.input.clone(), value);
        }
        Ok(())
    }

    async fn steps(
        &self,
        ctx: &ScenarioContext,
        modules: &mut [ModuleInput],
        stack: &mut CleanupStack,
    ) -> Result<(), HarnessError> {
        for input in modules.iter() {
            install_provider_file(ctx, input, stack)?;
        }
        // Pushed in deployment order, so they drain in reverse.
        for idx in 0..modules.len() {
            stack.push(Release::Destroy { module: idx });
        }

        let mut upstream: Option<OutputDocument> = None;
        for idx in 0..modules.len() {
            if let Some(outputs) = upstream.take() {
                self.wire_inputs(idx, &outputs, &mut modules[idx])?;
                ctx.log(
                    &self.name,
                    format!("wired outputs into {}", modules[idx].directory.display()),
                );
            }

            let input = &modules[idx];
            ctx.driver.init(input).await?;
            if idx == 0 {
                let summary = ctx.driver.apply(input).await?;
                ctx.log(&self.name, format!("apply: {summary}"));
            } else {
                apply_idempotent(ctx, &self.name, input).await?;
            }

            if idx + 1 < modules.len() {
                upstream = Some(ctx.driver.output(input).await?);
            }
        }
        Ok(())
    }
}

#[async_trait]
impl Scenario for IntegrationCase {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, ctx: &ScenarioContext) -> Result<(), HarnessError> {
        self.check()?;
        let mut modules = self.modules.clone();
        let mut stack = CleanupStack::new();
        let result = self.steps(ctx, &mut modules, &mut stack).await;
        let cleanup = stack
            .drain(ctx.driver.as_ref(), &modules, ctx.reporter.as_ref(), &self.name)
            .await;
        settle(result, cleanup)
    }
}
