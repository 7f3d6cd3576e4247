//! Add-set and remove-set computation.

use std::collections::BTreeSet;

use serde::Serialize;

use super::payload::{DocumentRef, Release, WebhookPayload};

/// Document ids to remove and to (re)fetch for one event, de-duplicated in
/// first-seen order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ReconciliationPlan {
    /// Ids to create or replace.
    pub additions: Vec<String>,
    /// Ids to remove, subject to confirmation.
    pub removals: Vec<String>,
}

impl ReconciliationPlan {
    /// Fold an event into a plan.
    ///
    /// `active_release` is the configured release id when release changes
    /// apply (a release is configured and preview is enabled). Release
    /// changes only count for the release whose id matches exactly.
    /// Additions come from added and updated releases; removals from
    /// deleted and updated releases.
    ///
    /// # Examples
    /// ```
    /// use prismic_source::domain::webhook::{ReconciliationPlan, WebhookPayload};
    /// use serde_json::json;
    ///
    /// let payload: WebhookPayload = serde_json::from_value(json!({
    ///     "documents": { "addition": ["A"], "deletion": ["B"] },
    ///     "releases": { "update": [{ "id": "R1", "documents": { "addition": ["C"] } }] }
    /// }))
    /// .expect("payload");
    ///
    /// let main_only = ReconciliationPlan::from_payload(&payload, None);
    /// assert_eq!(main_only.additions, vec!["A"]);
    /// let with_release = ReconciliationPlan::from_payload(&payload, Some("R1"));
    /// assert_eq!(with_release.additions, vec!["C", "A"]);
    /// assert_eq!(with_release.removals, vec!["B"]);
    /// ```
    pub fn from_payload(payload: &WebhookPayload, active_release: Option<&str>) -> Self {
        let releases = &payload.releases;
        let (release_additions, release_removals) = match active_release {
            Some(release_id) => (
                release_refs(
                    releases.update.iter().chain(&releases.addition),
                    release_id,
                    |release| &release.documents.addition,
                ),
                release_refs(
                    releases.deletion.iter().chain(&releases.update),
                    release_id,
                    |release| &release.documents.deletion,
                ),
            ),
            None => (Vec::new(), Vec::new()),
        };

        Self {
            additions: unique_ids(release_additions.into_iter().chain(&payload.documents.addition)),
            removals: unique_ids(release_removals.into_iter().chain(&payload.documents.deletion)),
        }
    }

    /// Whether the event changes nothing.
    pub fn is_empty(&self) -> bool {
        self.additions.is_empty() && self.removals.is_empty()
    }
}

fn release_refs<'a>(
    releases: impl Iterator<Item = &'a Release>,
    release_id: &str,
    select: impl Fn(&'a Release) -> &'a Vec<DocumentRef>,
) -> Vec<&'a DocumentRef> {
    releases
        .filter(|release| release.id == release_id)
        .flat_map(select)
        .collect()
}

fn unique_ids<'a>(refs: impl Iterator<Item = &'a DocumentRef>) -> Vec<String> {
    let mut seen = BTreeSet::new();
    refs.map(DocumentRef::id)
        .filter(|id| seen.insert(*id))
        .map(str::to_owned)
        .collect()
}

#[cfg(test)]
mod tests {
    //! Release overlay rules.

    use super::*;
    use rstest::{fixture, rstest};
    use serde_json::json;

    #[fixture]
    fn payload() -> WebhookPayload {
        serde_json::from_value(json!({
            "documents": { "addition": ["A", "A"], "deletion": ["B"] },
            "releases": {
                "addition": [{ "id": "R1", "documents": { "addition": ["N"] } }],
                "update": [
                    { "id": "R1", "documents": { "addition": ["D"], "deletion": ["D", "E"] } },
                    { "id": "R2", "documents": { "addition": ["X"], "deletion": ["Y"] } }
                ],
                "deletion": [{ "id": "R1", "documents": { "deletion": ["F"] } }]
            }
        }))
        .expect("payload fixture")
    }

    #[rstest]
    fn inactive_release_only_considers_main_changes(payload: WebhookPayload) {
        let plan = ReconciliationPlan::from_payload(&payload, None);
        assert_eq!(plan.additions, vec!["A"]);
        assert_eq!(plan.removals, vec!["B"]);
    }

    #[rstest]
    fn active_release_folds_in_its_own_changes_only(payload: WebhookPayload) {
        let plan = ReconciliationPlan::from_payload(&payload, Some("R1"));
        assert_eq!(plan.additions, vec!["D", "N", "A"]);
        assert_eq!(plan.removals, vec!["F", "D", "E", "B"]);
    }

    #[rstest]
    fn unmatched_release_is_ignored(payload: WebhookPayload) {
        let plan = ReconciliationPlan::from_payload(&payload, Some("R9"));
        assert_eq!(plan, ReconciliationPlan::from_payload(&payload, None));
    }

    #[test]
    fn empty_payload_yields_empty_plan() {
        assert!(ReconciliationPlan::from_payload(&WebhookPayload::default(), Some("R1")).is_empty());
    }
}
