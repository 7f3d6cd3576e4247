//! Webhook reconciliation.
//!
//! An incoming event is validated, folded into a [`ReconciliationPlan`]
//! (main-repository changes plus, when enabled, the configured release's
//! own changes), and applied: removals first, each confirmed against the
//! live repository, then additions and rerouted ids in one fetch.

mod payload;
mod plan;
mod reconciler;
mod validation;

pub use payload::{DocumentChanges, DocumentRef, Release, ReleaseChanges, WebhookPayload};
pub use plan::ReconciliationPlan;
pub use reconciler::{ReconciliationReport, WebhookReconciler};
pub use validation::{IgnoreReason, is_prismic_url, parse_webhook, validate_secret};

use serde::Serialize;

/// Whether an event was acted upon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum WebhookStatus {
    /// The event was reconciled.
    Processed,
    /// The event was dropped without touching the store.
    Ignored(IgnoreReason),
}

/// Result of handling one webhook event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WebhookOutcome {
    /// Processing status.
    #[serde(flatten)]
    pub status: WebhookStatus,
    /// Work performed; empty for ignored events.
    pub report: ReconciliationReport,
}

impl WebhookOutcome {
    /// Outcome of an event that was dropped.
    pub fn ignored(reason: IgnoreReason) -> Self {
        Self {
            status: WebhookStatus::Ignored(reason),
            report: ReconciliationReport::default(),
        }
    }

    /// Outcome of a reconciled event.
    pub fn processed(report: ReconciliationReport) -> Self {
        Self {
            status: WebhookStatus::Processed,
            report,
        }
    }
}
