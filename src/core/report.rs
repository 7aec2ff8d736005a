//! Per-consumer outcomes of an activation run.

use crate::error::ActivationError;
use crate::models::credential::Consumer;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// What an activator did when it did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Activation {
    /// Artifacts written; `warnings` lists non-fatal follow-up failures.
    Installed { warnings: Vec<String> },
    /// Consumer not present on this machine; nothing touched.
    Skipped { reason: String },
}

impl Activation {
    pub fn installed() -> Self {
        Activation::Installed {
            warnings: Vec::new(),
        }
    }
}

pub type ActivationResult = std::result::Result<Activation, ActivationError>;

#[derive(Debug)]
pub struct ConsumerOutcome {
    pub consumer: Consumer,
    pub result: ActivationResult,
}

#[derive(Debug)]
pub struct ActivationReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub outcomes: Vec<ConsumerOutcome>,
}

impl ActivationReport {
    pub fn outcome(&self, consumer: Consumer) -> Option<&ActivationResult> {
        self.outcomes
            .iter()
            .find(|o| o.consumer == consumer)
            .map(|o| &o.result)
    }

    pub fn failures(&self) -> impl Iterator<Item = (Consumer, &ActivationError)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().err().map(|e| (o.consumer, e)))
    }

    pub fn has_failures(&self) -> bool {
        self.failures().next().is_some()
    }

    pub fn to_view(&self) -> ReportView {
        ReportView {
            started_at: self.started_at,
            finished_at: self.finished_at,
            outcomes: self.outcomes.iter().map(OutcomeView::from).collect(),
        }
    }
}

/// Serializable form of the report.
#[derive(Debug, Serialize)]
pub struct ReportView {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub outcomes: Vec<OutcomeView>,
}

#[derive(Debug, Serialize)]
pub struct OutcomeView {
    pub consumer: Consumer,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<&ConsumerOutcome> for OutcomeView {
    fn from(outcome: &ConsumerOutcome) -> Self {
        let mut view = OutcomeView {
            consumer: outcome.consumer,
            status: "installed",
            warnings: Vec::new(),
            reason: None,
            error_kind: None,
            error: None,
        };
        match &outcome.result {
            Ok(Activation::Installed { warnings }) => view.warnings = warnings.clone(),
            Ok(Activation::Skipped { reason }) => {
                view.status = "skipped";
                view.reason = Some(reason.clone());
            }
            Err(e) => {
                view.status = "failed";
                view.error_kind = Some(e.kind());
                view.error = Some(e.to_string());
            }
        }
        view
    }
}
