//! Input variable values.
//!
//! Terraform variables can be strings, numbers, booleans, lists or maps. They are
//! kept as a small tagged tree and rendered to the CLI form only when a command
//! line is built.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VarValue {
    Bool(bool),
    Number(serde_json::Number),
    String(String),
    List(Vec<VarValue>),
    Map(BTreeMap<String, VarValue>),
}

impl VarValue {
    /// Value as passed after `name=` on the command line or in `TF_VAR_name`.
    ///
    /// Top-level strings go through untouched; everything else is written as an
    /// HCL literal so terraform parses it with the declared variable type.
    pub fn to_cli_value(&self) -> String {
        match self {
            VarValue::String(s) => s.clone(),
            other => other.to_hcl(),
        }
    }

    /// HCL literal form: `"text"`, `3`, `true`, `["a", "b"]`, `{"k" = "v"}`.
    pub fn to_hcl(&self) -> String {
        match self {
            VarValue::Bool(b) => b.to_string(),
            VarValue::Number(n) => n.to_string(),
            VarValue::String(s) => quote(s),
            VarValue::List(items) => {
                let parts: Vec<String> = items.iter().map(VarValue::to_hcl).collect();
                format!("[{}]", parts.join(", "))
            }
            VarValue::Map(entries) => {
                let parts: Vec<String> = entries
                    .iter()
                    .map(|(k, v)| format!("{} = {}", quote(k), v.to_hcl()))
                    .collect();
                format!("{{{}}}", parts.join(", "))
            }
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            VarValue::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Convert a decoded JSON value. `null` has no terraform literal and is rejected.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::Bool(b) => Some(VarValue::Bool(*b)),
            Value::Number(n) => Some(VarValue::Number(n.clone())),
            Value::String(s) => Some(VarValue::String(s.clone())),
            Value::Array(items) => items
                .iter()
                .map(VarValue::from_json)
                .collect::<Option<Vec<_>>>()
                .map(VarValue::List),
            Value::Object(map) => map
                .iter()
                .map(|(k, v)| VarValue::from_json(v).map(|v| (k.clone(), v)))
                .collect::<Option<BTreeMap<_, _>>>()
                .map(VarValue::Map),
        }
    }
}

// serde_json string escaping matches HCL's for the characters terraform cares about.
// Template introducers are doubled so quoted strings stay literal.
fn quote(s: &str) -> String {
    serde_json::to_string(s)
        .unwrap_or_else(|_| format!("\"{s}\""))
        .replace("${", "$${")
        .replace("%{", "%%{")
}

impl fmt::Display for VarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_cli_value())
    }
}

impl From<&str> for VarValue {
    fn from(value: &str) -> Self {
        VarValue::String(value.to_string())
    }
}

impl From<String> for VarValue {
    fn from(value: String) -> Self {
        VarValue::String(value)
    }
}

impl From<bool> for VarValue {
    fn from(value: bool) -> Self {
        VarValue::Bool(value)
    }
}

impl From<i64> for VarValue {
    fn from(value: i64) -> Self {
        VarValue::Number(value.into())
    }
}

impl<T: Into<VarValue>> From<Vec<T>> for VarValue {
    fn from(value: Vec<T>) -> Self {
        VarValue::List(value.into_iter().map(Into::into).collect())
    }
}

impl From<BTreeMap<String, VarValue>> for VarValue {
    fn from(value: BTreeMap<String, VarValue>) -> Self {
        VarValue::Map(value)
    }
}
