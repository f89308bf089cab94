use async_trait::async_trait;
use serde::Deserialize;

use super::{apply_idempotent, install_provider_file, settle, Scenario, ScenarioContext};
use crate::cleanup::{CleanupStack, Release};
use crate::error::HarnessError;
use crate::module_input::ModuleInput;

/// Deploy one module in isolation, check the second apply is a no-op, destroy.
#[derive(Debug, Clone, Deserialize)]
pub struct UnitCase {
    pub name: String,
    pub input: ModuleInput,
}

impl UnitCase {
    pub fn new(name: impl Into<String>, input: ModuleInput) -> Self {
        Self {
            name: name.into(),
            input,
        }
    }

    async fn steps(
        &self,
        ctx: &ScenarioContext,
        input: &ModuleInput,
        stack: &mut CleanupStack,
    ) -> Result<(), HarnessError> {
        install_provider_file(ctx, input, stack)?;
        // Registered before anything is applied so a failed apply is still torn down.
        stack.push(Release::Destroy { module: 0 });
        ctx.driver.init(input).await?;
        apply_idempotent(ctx, &self.name, input).await
    }
}

#[async_trait]
impl Scenario for UnitCase {
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
