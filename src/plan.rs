//! Decoded forms of terraform's JSON documents.
//!
//! Only the fields the harness reads are modelled; everything else in the
//! published schemas is ignored on decode.

use std::collections::BTreeMap;
use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::HarnessError;
use crate::vars::VarValue;

// ----------------------------------------------------------------------------
// Plan
// ----------------------------------------------------------------------------

/// `terraform show -json <planfile>`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct PlanDocument {
    #[serde(default)]
    pub format_version: Option<String>,
    #[serde(default)]
    pub terraform_version: Option<String>,
    #[serde(default)]
    pub resource_changes: Vec<ResourceChange>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ResourceChange {
    pub address: String,
    #[serde(default, rename = "type")]
    pub resource_type: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub change: Option<Change>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Change {
    #[serde(default)]
    pub actions: Vec<String>,
}

impl PlanDocument {
    pub fn from_json(raw: &str) -> Result<Self, HarnessError> {
        serde_json::from_str(raw).map_err(|source| HarnessError::Decode {
            what: "plan JSON",
            source,
        })
    }

    /// Plan with one resource change per address, in order.
    pub fn with_addresses<I, S>(addresses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            resource_changes: addresses
                .into_iter()
                .map(|address| ResourceChange {
                    address: address.into(),
                    resource_type: None,
                    name: None,
                    change: None,
                })
                .collect(),
            ..Self::default()
        }
    }
}

/// Resource addresses in the order terraform emitted them. No filtering.
pub fn parse_resource_addresses(plan: &PlanDocument) -> Vec<String> {
    plan.resource_changes
        .iter()
        .map(|change| change.address.clone())
        .collect()
}

// ----------------------------------------------------------------------------
// Validate
// ----------------------------------------------------------------------------

/// `terraform validate -json`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ValidateReport {
    pub valid: bool,
    #[serde(default)]
    pub error_count: u64,
    #[serde(default)]
    pub warning_count: u64,
    #[serde(default)]
    pub diagnostics: Vec<Diagnostic>,
}

impl ValidateReport {
    pub fn clean() -> Self {
        Self {
            valid: true,
            error_count: 0,
            warning_count: 0,
            diagnostics: Vec::new(),
        }
    }

    pub fn from_json(raw: &str) -> Result<Self, HarnessError> {
        serde_json::from_str(raw).map_err(|source| HarnessError::Decode {
            what: "validate JSON",
            source,
        })
    }
}

/// A validate diagnostic. Fields beyond severity/summary/detail are kept so the
/// record can be logged verbatim.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Diagnostic {
    pub severity: String,
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

// ----------------------------------------------------------------------------
// Outputs
// ----------------------------------------------------------------------------

/// `terraform output -json`: `{name: {value, type, sensitive}}`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct OutputDocument {
    pub outputs: BTreeMap<String, OutputEntry>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct OutputEntry {
    pub value: Value,
    #[serde(default, rename = "type")]
    pub value_type: Option<Value>,
    #[serde(default)]
    pub sensitive: bool,
}

impl OutputDocument {
    pub fn from_json(raw: &str) -> Result<Self, HarnessError> {
        serde_json::from_str(raw).map_err(|source| HarnessError::Decode {
            what: "output JSON",
            source,
        })
    }

    pub fn get_output(&self, name: &str) -> Result<&Value, HarnessError> {
        self.outputs
            .get(name)
            .map(|entry| &entry.value)
            .ok_or_else(|| HarnessError::MissingOutput {
                name: name.to_string(),
                problem: "is not present".to_string(),
            })
    }

    /// The output as an input variable value.
    pub fn get_var(&self, name: &str) -> Result<VarValue, HarnessError> {
        let value = self.get_output(name)?;
        VarValue::from_json(value).ok_or_else(|| HarnessError::MissingOutput {
            name: name.to_string(),
            problem: "is null or contains null".to_string(),
        })
    }

    pub fn get_string(&self, name: &str) -> Result<&str, HarnessError> {
        self.get_output(name)?
            .as_str()
            .ok_or_else(|| HarnessError::MissingOutput {
                name: name.to_string(),
                problem: "is not a string".to_string(),
            })
    }
}

// ----------------------------------------------------------------------------
// Apply
// ----------------------------------------------------------------------------

static RESOURCES_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"Resources: (\d+) added, (\d+) changed, (\d+) destroyed").expect("static regex")
});

/// Counts from the `Apply complete!` line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ApplySummary {
    pub added: u64,
    pub changed: u64,
    pub destroyed: u64,
}

impl ApplySummary {
    /// Parse apply stdout. `No changes.` counts as zero; anything else without a
    /// resources line is undecodable.
    pub fn parse(stdout: &str) -> Option<Self> {
        if let Some(caps) = RESOURCES_LINE.captures_iter(stdout).last() {
            let num = |i: usize| caps.get(i).and_then(|m| m.as_str().parse::<u64>().ok());
            return Some(Self {
                added: num(1)?,
                changed: num(2)?,
                destroyed: num(3)?,
            });
        }
        if stdout.contains("No changes.") {
            return Some(Self::default());
        }
        None
    }

    pub fn has_changes(&self) -> bool {
        self.added > 0 || self.changed > 0 || self.destroyed > 0
    }
}

impl fmt::Display for ApplySummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} added, {} changed, {} destroyed",
            self.added, self.changed, self.destroyed
        )
    }
}
