use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::vars::VarValue;

/// How input variables reach terraform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VarDelivery {
    /// One `-var=name=value` flag per variable.
    #[default]
    Flags,
    /// `TF_VAR_name=value` in the child environment.
    Environment,
}

/// A module directory plus the inputs terraform should be run with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleInput {
    pub directory: PathBuf,
    #[serde(default = "default_true")]
    pub reconfigure: bool,
    #[serde(default = "default_true")]
    pub upgrade: bool,
    #[serde(default)]
    pub vars: BTreeMap<String, VarValue>,
    /// Extra environment for every invocation against this module.
    #[serde(default)]
    pub env: BTreeMap<String, String>,
    #[serde(default)]
    pub var_delivery: VarDelivery,
}

fn default_true() -> bool {
    true
}

impl ModuleInput {
    /// Backend re-init and provider upgrades are on by default; that is what
    /// throwaway test runs almost always want.
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            reconfigure: true,
            upgrade: true,
            vars: BTreeMap::new(),
            env: BTreeMap::new(),
            var_delivery: VarDelivery::Flags,
        }
    }

    pub fn with_var(mut self, name: impl Into<String>, value: impl Into<VarValue>) -> Self {
        self.vars.insert(name.into(), value.into());
        self
    }

    pub fn with_reconfigure(mut self, reconfigure: bool) -> Self {
        self.reconfigure = reconfigure;
        self
    }

    pub fn with_upgrade(mut self, upgrade: bool) -> Self {
        self.upgrade = upgrade;
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn with_var_delivery(mut self, delivery: VarDelivery) -> Self {
        self.var_delivery = delivery;
        self
    }

    /// Add or overwrite a variable; used when wiring outputs into inputs.
    pub fn set_var(&mut self, name: impl Into<String>, value: impl Into<VarValue>) {
        self.vars.insert(name.into(), value.into());
    }

    pub fn var(&self, name: &str) -> Option<&VarValue> {
        self.vars.get(name)
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn provider_file_path(&self, file_name: &str) -> PathBuf {
        self.directory.join(file_name)
    }

    /// `-var=` flags for plan/apply/destroy. Empty under environment delivery.
    pub fn var_args(&self) -> Vec<String> {
        match self.var_delivery {
            VarDelivery::Flags => self
                .vars
                .iter()
                .map(|(name, value)| format!("-var={name}={}", value.to_cli_value()))
                .collect(),
            VarDelivery::Environment => Vec::new(),
        }
    }

    /// Child environment: `env` plus `TF_VAR_*` under environment delivery.
    pub fn child_env(&self) -> BTreeMap<String, String> {
        let mut out = self.env.clone();
        if self.var_delivery == VarDelivery::Environment {
            for (name, value) in &self.vars {
                out.insert(format!("TF_VAR_{name}"), value.to_cli_value());
            }
        }
        out
    }
}
