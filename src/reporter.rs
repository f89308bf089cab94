//! Pass/fail/log sink for scenario cases.

use parking_lot::Mutex;
use serde::Serialize;

use crate::error::{ErrorCategory, HarnessError};

pub trait Reporter: Send + Sync {
    fn log(&self, case: &str, message: &str);
    fn pass(&self, case: &str);
    fn fail(&self, case: &str, error: &HarnessError);
}

/// Emits everything as tracing events.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn log(&self, case: &str, message: &str) {
        tracing::info!(target: "tfharness", case = case, "{message}");
    }

    fn pass(&self, case: &str) {
        tracing::info!(target: "tfharness", case = case, "PASS");
    }

    fn fail(&self, case: &str, error: &HarnessError) {
        tracing::error!(
            target: "tfharness",
            case = case,
            code = error.code(),
            category = ?error.category(),
            "FAIL: {error}"
        );
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReportEvent {
    Log { case: String, message: String },
    Pass { case: String },
    Fail { case: String, message: String },
}

/// Keeps every event in memory; used by tests and by callers that render their
/// own summary.
#[derive(Debug, Default)]
pub struct MemoryReporter {
    events: Mutex<Vec<ReportEvent>>,
}

impl MemoryReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ReportEvent> {
        self.events.lock().clone()
    }

    pub fn logs_for(&self, case: &str) -> Vec<String> {
        self.events
            .lock()
            .iter()
            .filter_map(|e| match e {
                ReportEvent::Log { case: c, message } if c == case => Some(message.clone()),
                _ => None,
            })
            .collect()
    }
}

impl Reporter for MemoryReporter {
    fn log(&self, case: &str, message: &str) {
        self.events.lock().push(ReportEvent::Log {
            case: case.to_string(),
            message: message.to_string(),
        });
    }

    fn pass(&self, case: &str) {
        self.events.lock().push(ReportEvent::Pass {
            case: case.to_string(),
        });
    }

    fn fail(&self, case: &str, error: &HarnessError) {
        self.events.lock().push(ReportEvent::Fail {
            case: case.to_string(),
            message: error.to_string(),
        });
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CaseStatus {
    Passed,
    Failed {
        code: &'static str,
        #[serde(skip)]
        category: ErrorCategory,
        message: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaseOutcome {
    pub name: String,
    #[serde(flatten)]
    pub status: CaseStatus,
}

impl CaseOutcome {
    pub fn passed(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: CaseStatus::Passed,
        }
    }

    pub fn failed(name: impl Into<String>, error: &HarnessError) -> Self {
        Self {
            name: name.into(),
            status: CaseStatus::Failed {
                code: error.code(),
                category: error.category(),
                message: error.to_string(),
            },
        }
    }

    pub fn is_passed(&self) -> bool {
        matches!(self.status, CaseStatus::Passed)
    }

    pub fn message(&self) -> Option<&str> {
        match &self.status {
            CaseStatus::Passed => None,
            CaseStatus::Failed { message, .. } => Some(message.as_str()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SuiteReport {
    pub outcomes: Vec<CaseOutcome>,
}

impl SuiteReport {
    pub fn extend(&mut self, other: SuiteReport) {
        self.outcomes.extend(other.outcomes);
    }

    pub fn passed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_passed()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.passed()
    }

    pub fn all_passed(&self) -> bool {
        self.failed() == 0
    }

    pub fn outcome(&self, name: &str) -> Option<&CaseOutcome> {
        self.outcomes.iter().find(|o| o.name == name)
    }
}
