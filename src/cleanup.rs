//! Per-case cleanup stack.
//!
//! Every acquisition pushes its release at the moment it is acquired. The stack
//! is drained last-in-first-out whatever happened in between.

use crate::driver::TerraformDriver;
use crate::error::HarnessError;
use crate::module_input::ModuleInput;
use crate::provider_file::ProviderFile;
use crate::reporter::Reporter;

#[derive(Debug)]
pub enum Release {
    ProviderFile(ProviderFile),
    /// `terraform destroy` against the module at this index of the case's module list.
    Destroy { module: usize },
}

#[derive(Debug, Default)]
pub struct CleanupStack {
    entries: Vec<Release>,
}

impl CleanupStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, release: Release) {
        self.entries.push(release);
    }

    pub(crate) fn last_mut(&mut self) -> Option<&mut Release> {
        self.entries.last_mut()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Run every release in reverse order. Failures are reported and collected;
    /// they never stop the remaining releases.
    ///
    /// Destroys read `modules` at drain time, so variables wired in after the
    /// destroy was registered are honoured.
    pub async fn drain(
        &mut self,
        driver: &dyn TerraformDriver,
        modules: &[ModuleInput],
        reporter: &dyn Reporter,
        case: &str,
    ) -> Vec<HarnessError> {
        let mut failures = Vec::new();
        while let Some(release) = self.entries.pop() {
            let result = match release {
                Release::ProviderFile(mut file) => file.delete(),
                Release::Destroy { module } => match modules.get(module) {
                    Some(input) => {
                        reporter.log(
                            case,
                            &format!("destroying {}", input.directory.display()),
                        );
                        driver.destroy(input).await
                    }
                    None => Err(HarnessError::InvalidCase(format!(
                        "destroy registered for unknown module index {module}"
                    ))),
                },
            };
            if let Err(err) = result {
                reporter.log(case, &format!("cleanup failed: {err}"));
                failures.push(err);
            }
        }
        failures
    }
}

impl Drop for CleanupStack {
    // Only reached with entries left when a case unwound without draining.
    fn drop(&mut self) {
        while let Some(release) = self.entries.pop() {
            match release {
                Release::ProviderFile(mut file) => {
                    if let Err(err) = file.delete() {
                        tracing::warn!(target: "tfharness", "undrained provider file: {err}");
                    }
                }
                Release::Destroy { module } => {
                    tracing::warn!(
                        target: "tfharness",
                        module = module,
                        "cleanup stack dropped before destroy ran; resources may be left behind"
                    );
                }
            }
        }
    }
}
