//! Applies a reconciliation plan to the node store.

use std::collections::BTreeSet;

use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use super::validation::parse_webhook;
use super::{ReconciliationPlan, WebhookOutcome};
use crate::domain::fetcher::DocumentFetcher;
use crate::domain::node_writer::NodeWriter;
use crate::domain::normalizer::DocumentNormalizer;
use crate::domain::ports::NodeStore;
use crate::domain::Error;

/// Work performed for one event.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ReconciliationReport {
    /// Document nodes deleted (only nodes actually present count).
    pub deleted: usize,
    /// Documents fetched and written.
    pub updated: usize,
    /// Removal candidates still served by the repository, updated instead.
    pub rerouted: Vec<String>,
}

/// Drives one webhook event from validation to node writes.
pub struct WebhookReconciler<'a> {
    fetcher: DocumentFetcher<'a>,
    normalizer: DocumentNormalizer<'a>,
    store: &'a dyn NodeStore,
    secret: Option<&'a str>,
    active_release: Option<&'a str>,
}

impl<'a> WebhookReconciler<'a> {
    /// Assemble a reconciler.
    ///
    /// `active_release` must be `Some` only when a release is configured and
    /// preview mode is enabled.
    pub fn new(
        fetcher: DocumentFetcher<'a>,
        normalizer: DocumentNormalizer<'a>,
        store: &'a dyn NodeStore,
        secret: Option<&'a str>,
        active_release: Option<&'a str>,
    ) -> Self {
        Self {
            fetcher,
            normalizer,
            store,
            secret,
            active_release,
        }
    }

    /// Validate, plan, and apply one raw event.
    ///
    /// Events failing validation are ignored without error.
    ///
    /// # Errors
    ///
    /// See [`WebhookReconciler::apply`].
    pub async fn handle(&self, body: &Value) -> Result<WebhookOutcome, Error> {
        let payload = match parse_webhook(body, self.secret) {
            Ok(payload) => payload,
            Err(reason) => return Ok(WebhookOutcome::ignored(reason)),
        };
        let plan = ReconciliationPlan::from_payload(&payload, self.active_release);
        info!(
            additions = plan.additions.len(),
            removals = plan.removals.len(),
            release = self.active_release,
            "processing webhook"
        );
        let report = self.apply(&plan).await?;
        info!(
            deleted = report.deleted,
            updated = report.updated,
            rerouted = report.rerouted.len(),
            "processed webhook"
        );
        Ok(WebhookOutcome::processed(report))
    }

    /// Apply a plan: confirmed removals first, then updates.
    ///
    /// Removal candidates are re-fetched; any the repository still serves
    /// are rerouted to the update set rather than deleted. The update set
    /// (additions plus reroutes) is fetched once.
    ///
    /// # Errors
    ///
    /// Returns the first fetch, normalisation, or store error. Deletions
    /// already applied when the update phase fails stay applied; replaying
    /// the event is safe.
    pub async fn apply(&self, plan: &ReconciliationPlan) -> Result<ReconciliationReport, Error> {
        let mut report = ReconciliationReport::default();

        if !plan.removals.is_empty() {
            let still_served: BTreeSet<String> = self
                .fetcher
                .fetch_by_ids(&plan.removals)
                .await?
                .into_iter()
                .map(|document| document.id)
                .collect();
            let writer = NodeWriter::new(self.store);
            for id in &plan.removals {
                if still_served.contains(id) {
                    warn!(document_id = %id, "deleted document is still served; updating it instead");
                    report.rerouted.push(id.clone());
                } else if writer.delete_document(&self.store.create_node_id(id)).await? {
                    report.deleted += 1;
                }
            }
            info!(deleted = report.deleted, "removed documents");
        }

        let mut seen = BTreeSet::new();
        let updates: Vec<String> = plan
            .additions
            .iter()
            .chain(&report.rerouted)
            .filter(|id| seen.insert(*id))
            .cloned()
            .collect();
        if !updates.is_empty() {
            let documents = self.fetcher.fetch_by_ids(&updates).await?;
            report.updated = NodeWriter::new(self.store)
                .write_documents(self.normalizer, documents)
                .await?;
        }
        Ok(report)
    }
}
