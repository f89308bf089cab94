use std::path::PathBuf;

use thiserror::Error;

use crate::config::errors;
use crate::plan::ApplySummary;

/// How a failure is treated by the runner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Missing tool binary or unusable module directory.
    Prerequisite,
    /// `validate` reported an invalid configuration, or a case is malformed.
    Configuration,
    /// A terraform invocation could not be spawned or exited non-zero.
    Execution,
    /// Plan mismatch or non-idempotent apply.
    Assertion,
    /// Malformed JSON from the tool.
    Decode,
}

#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("E-TFH-1001: terraform not found on PATH ({detail}); set TFH_TERRAFORM_PATH or install terraform")]
    ToolNotFound { detail: String },

    #[error("E-TFH-1002: could not open provided path {}: {}", .path.display(), .source)]
    ProviderFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("E-TFH-1101: configuration is not valid ({errors} errors, {warnings} warnings)")]
    InvalidConfiguration { errors: u64, warnings: u64 },

    #[error("E-TFH-1102: invalid case: {0}")]
    InvalidCase(String),

    #[error("E-TFH-1201: failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("E-TFH-1202: terraform {command} exited with {}: {stderr}", .status.map(|c| c.to_string()).unwrap_or_else(|| "signal".into()))]
    Exit {
        command: String,
        status: Option<i32>,
        stderr: String,
    },

    #[error("E-TFH-1203: terraform {command} timed out after {after_ms}ms")]
    Timeout { command: String, after_ms: u128 },

    #[error("E-TFH-1204: {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("E-TFH-1301: {case} = Unexpected result, (-want +got)\n{diff}")]
    PlanMismatch { case: String, diff: String },

    #[error("E-TFH-1302: {} is not idempotent, second apply reported {summary}", .directory.display())]
    NotIdempotent {
        directory: PathBuf,
        summary: ApplySummary,
    },

    #[error("E-TFH-1401: could not decode {what}: {source}")]
    Decode {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("E-TFH-1401: unrecognised output from terraform {command}: {detail}")]
    UnrecognizedOutput { command: String, detail: String },

    #[error("E-TFH-1402: output '{name}' {problem}")]
    MissingOutput { name: String, problem: String },
}

impl HarnessError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            HarnessError::ToolNotFound { .. } | HarnessError::ProviderFile { .. } => {
                ErrorCategory::Prerequisite
            }
            HarnessError::InvalidConfiguration { .. } | HarnessError::InvalidCase(_) => {
                ErrorCategory::Configuration
            }
            HarnessError::Spawn { .. }
            | HarnessError::Exit { .. }
            | HarnessError::Timeout { .. }
            | HarnessError::Io { .. } => ErrorCategory::Execution,
            HarnessError::PlanMismatch { .. } | HarnessError::NotIdempotent { .. } => {
                ErrorCategory::Assertion
            }
            HarnessError::Decode { .. }
            | HarnessError::UnrecognizedOutput { .. }
            | HarnessError::MissingOutput { .. } => ErrorCategory::Decode,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            HarnessError::ToolNotFound { .. } => errors::ERR_TOOL_NOT_FOUND,
            HarnessError::ProviderFile { .. } => errors::ERR_PROVIDER_FILE,
            HarnessError::InvalidConfiguration { .. } => errors::ERR_INVALID_CONFIG,
            HarnessError::InvalidCase(_) => errors::ERR_INVALID_CASE,
            HarnessError::Spawn { .. } => errors::ERR_SPAWN,
            HarnessError::Exit { .. } => errors::ERR_EXIT,
            HarnessError::Timeout { .. } => errors::ERR_TIMEOUT,
            HarnessError::Io { .. } => errors::ERR_IO,
            HarnessError::PlanMismatch { .. } => errors::ERR_PLAN_MISMATCH,
            HarnessError::NotIdempotent { .. } => errors::ERR_NOT_IDEMPOTENT,
            HarnessError::Decode { .. } | HarnessError::UnrecognizedOutput { .. } => {
                errors::ERR_DECODE
            }
            HarnessError::MissingOutput { .. } => errors::ERR_MISSING_OUTPUT,
        }
    }

    pub(crate) fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        HarnessError::Io {
            context: context.into(),
            source,
        }
    }
}
