//! Suite files: the dry, unit and integration tables as one JSON document.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::HarnessError;
use crate::module_input::{ModuleInput, VarDelivery};
use crate::provider_file::ProviderBlock;
use crate::reporter::SuiteReport;
use crate::scenario::{run_table, DryCase, IntegrationCase, ScenarioContext, UnitCase};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Dry,
    Unit,
    Integration,
}

impl Stage {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "dry" => Some(Stage::Dry),
            "unit" => Some(Stage::Unit),
            "integration" | "int" => Some(Stage::Integration),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SuiteFile {
    /// Run the cases of each table concurrently.
    pub parallel: bool,
    /// Overrides the provider block built from the environment.
    pub provider: Option<ProviderBlock>,
    pub dry: Vec<DryCase>,
    pub unit: Vec<UnitCase>,
    pub integration: Vec<IntegrationCase>,
}

impl SuiteFile {
    pub fn from_json(raw: &str) -> Result<Self, HarnessError> {
        serde_json::from_str(raw).map_err(|source| HarnessError::Decode {
            what: "suite file",
            source,
        })
    }

    /// Read a suite file. Relative module directories are resolved against the
    /// directory holding the file.
    pub fn load(path: &Path) -> Result<Self, HarnessError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| HarnessError::io(format!("read suite {}", path.display()), e))?;
        let mut suite = Self::from_json(&raw)?;
        if let Some(base) = path.parent() {
            suite.rebase(base);
        }
        Ok(suite)
    }

    pub fn case_count(&self) -> usize {
        self.dry.len() + self.unit.len() + self.integration.len()
    }

    /// Force every module onto `delivery`.
    pub fn with_var_delivery(mut self, delivery: VarDelivery) -> Self {
        for input in self.modules_mut() {
            input.var_delivery = delivery;
        }
        self
    }

    /// Run the selected tables in order: dry, unit, integration.
    pub async fn run(
        &self,
        ctx: &ScenarioContext,
        only: Option<Stage>,
        parallel: bool,
    ) -> SuiteReport {
        let parallel = parallel || self.parallel;
        let wants = |stage: Stage| only.map_or(true, |o| o == stage);

        let mut report = SuiteReport::default();
        if wants(Stage::Dry) {
            report.extend(run_table(ctx, &self.dry, parallel).await);
        }
        if wants(Stage::Unit) {
            report.extend(run_table(ctx, &self.unit, parallel).await);
        }
        if wants(Stage::Integration) {
            report.extend(run_table(ctx, &self.integration, parallel).await);
        }
        report
    }

    fn rebase(&mut self, base: &Path) {
        for input in self.modules_mut() {
            if input.directory.is_relative() {
                input.directory = join_clean(base, &input.directory);
            }
        }
    }

    fn modules_mut(&mut self) -> impl Iterator<Item = &mut ModuleInput> {
        self.dry
            .iter_mut()
            .map(|c| &mut c.input)
            .chain(self.unit.iter_mut().map(|c| &mut c.input))
            .chain(self.integration.iter_mut().flat_map(|c| c.modules.iter_mut()))
    }
}

fn join_clean(base: &Path, rel: &Path) -> PathBuf {
    let joined = base.join(rel);
    let mut out = PathBuf::new();
    for part in joined.components() {
        match part {
            std::path::Component::CurDir => {}
            other => out.push(other),
        }
    }
    out
}
