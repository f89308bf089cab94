//! Test harness for terraform modules: dry-run plan checks, single-module
//! idempotency tests and multi-module integration deployments.

pub mod cleanup;
pub mod config;
pub mod diff;
pub mod driver;
pub mod error;
pub mod locator;
pub mod module_input;
pub mod plan;
pub mod provider_file;
pub mod reporter;
pub mod runner;
pub mod scenario;
pub mod suite;
pub mod vars;

pub use cleanup::{CleanupStack, Release};
pub use config::HarnessConfig;
pub use diff::render_diff;
pub use driver::scripted::{DriverCall, ScriptedDriver};
pub use driver::{DriverOp, TerraformCli, TerraformDriver};
pub use error::{ErrorCategory, HarnessError};
pub use locator::{locate_terraform, locate_terraform_or_exit, TerraformResolveResult};
pub use module_input::{ModuleInput, VarDelivery};
pub use plan::{
    parse_resource_addresses, ApplySummary, OutputDocument, PlanDocument, ValidateReport,
};
pub use provider_file::{ProviderBlock, ProviderFile, ProviderOption};
pub use reporter::{CaseOutcome, MemoryReporter, Reporter, SuiteReport, TracingReporter};
pub use runner::{CommandExecution, CommandRunner, SystemCommandRunner};
pub use scenario::{
    run_case, run_table, DryCase, IntegrationCase, OutputWiring, Scenario, ScenarioContext,
    ScenarioSettings, UnitCase, ValidatePolicy,
};
pub use suite::{Stage, SuiteFile};
pub use vars::VarValue;
