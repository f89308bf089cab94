//! Harness configuration
//!
//! Everything that can be tuned without touching a test table lives here and is
//! read from the environment with sensible fallbacks.

pub mod errors;
pub mod timeouts;

use std::path::PathBuf;
use std::time::Duration;

use crate::module_input::VarDelivery;
use crate::provider_file::{
    ProviderBlock, ProviderOption, DEFAULT_PROVIDER_FILE, DEFAULT_PROVIDER_NAME,
};
use crate::scenario::{ScenarioSettings, ValidatePolicy};

/// Environment variables consulted before `PATH` when locating terraform.
pub const TERRAFORM_OVERRIDE_KEYS: &[&str] = &["TFH_TERRAFORM_PATH", "TFH_TERRAFORM_BIN"];

#[derive(Debug, Clone)]
pub struct HarnessConfig {
    pub provider_file: String,
    pub provider_name: String,
    /// Sub-blocks of the provider block; `None` uses the provider's default.
    pub provider_options: Option<Vec<ProviderOption>>,
    pub validate_policy: ValidatePolicy,
    pub validate_timeout: Option<Duration>,
    pub show_timeout: Option<Duration>,
    pub var_delivery: VarDelivery,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            provider_file: DEFAULT_PROVIDER_FILE.to_string(),
            provider_name: DEFAULT_PROVIDER_NAME.to_string(),
            provider_options: None,
            validate_policy: ValidatePolicy::Strict,
            validate_timeout: Some(Duration::from_millis(
                timeouts::DEFAULT_VALIDATE_TIMEOUT_MS,
            )),
            show_timeout: Some(Duration::from_millis(timeouts::DEFAULT_SHOW_TIMEOUT_MS)),
            var_delivery: VarDelivery::Flags,
        }
    }
}

impl HarnessConfig {
    /// Load configuration from environment variables with fallback to defaults.
    ///
    /// Environment variables:
    /// - TFH_PROVIDER_FILE: provider file name inside each module (default: provider.tf)
    /// - TFH_PROVIDER_NAME: provider block label (default: azurerm)
    /// - TFH_PROVIDER_OPTIONS: comma-separated empty sub-blocks, `none` for none
    ///   (default: `features` for azurerm, nothing otherwise)
    /// - TFH_ALLOW_WARNINGS: accept validate warnings (default: false)
    /// - TFH_VALIDATE_TIMEOUT_MS: validate timeout, 0 disables (default: 120000)
    /// - TFH_SHOW_TIMEOUT_MS: plan decoding timeout, 0 disables (default: 120000)
    /// - TFH_VAR_DELIVERY: `flags` or `env` (default: flags)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let provider_file = non_empty_var("TFH_PROVIDER_FILE").unwrap_or(defaults.provider_file);
        let provider_name = non_empty_var("TFH_PROVIDER_NAME").unwrap_or(defaults.provider_name);

        let provider_options = non_empty_var("TFH_PROVIDER_OPTIONS").map(|raw| {
            if raw.eq_ignore_ascii_case("none") {
                return Vec::new();
            }
            raw.split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(ProviderOption::from_block_name)
                .collect()
        });

        let allow_warnings = std::env::var("TFH_ALLOW_WARNINGS").unwrap_or_default();
        let validate_policy = if parse_env_flag(&allow_warnings) {
            ValidatePolicy::AllowWarnings
        } else {
            ValidatePolicy::Strict
        };

        let validate_timeout = timeout_var(
            "TFH_VALIDATE_TIMEOUT_MS",
            timeouts::DEFAULT_VALIDATE_TIMEOUT_MS,
        );
        let show_timeout = timeout_var("TFH_SHOW_TIMEOUT_MS", timeouts::DEFAULT_SHOW_TIMEOUT_MS);

        let var_delivery = match non_empty_var("TFH_VAR_DELIVERY")
            .map(|v| v.to_ascii_lowercase())
            .as_deref()
        {
            Some("env") | Some("environment") => VarDelivery::Environment,
            _ => VarDelivery::Flags,
        };

        Self {
            provider_file,
            provider_name,
            provider_options,
            validate_policy,
            validate_timeout,
            show_timeout,
            var_delivery,
        }
    }

    /// Explicit terraform path from the environment, if any.
    pub fn terraform_override() -> Option<PathBuf> {
        TERRAFORM_OVERRIDE_KEYS
            .iter()
            .find_map(|key| non_empty_var(key))
            .map(PathBuf::from)
    }

    pub fn provider_block(&self) -> ProviderBlock {
        let block = ProviderBlock::new(self.provider_name.clone());
        match &self.provider_options {
            Some(options) => block.with_options(options.clone()),
            None => block,
        }
    }

    pub fn scenario_settings(&self) -> ScenarioSettings {
        ScenarioSettings {
            provider: self.provider_block(),
            provider_file: self.provider_file.clone(),
            validate_policy: self.validate_policy,
        }
    }
}

pub(crate) fn parse_env_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn timeout_var(key: &str, default_ms: u64) -> Option<Duration> {
    let ms = std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .unwrap_or(default_ms);
    if ms == 0 {
        None
    } else {
        Some(Duration::from_millis(ms))
    }
}
