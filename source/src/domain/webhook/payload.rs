//! Inbound webhook payload.

use serde::Deserialize;

/// Event body posted by the CMS.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookPayload {
    /// Shared secret, when the webhook is configured with one.
    #[serde(default)]
    pub secret: Option<String>,
    /// API endpoint of the repository that sent the event.
    #[serde(default)]
    pub api_url: Option<String>,
    /// Event type, e.g. `api-update` or `test-trigger`.
    #[serde(default, rename = "type")]
    pub event_type: Option<String>,
    /// Main-repository document changes.
    #[serde(default)]
    pub documents: DocumentChanges,
    /// Release changes.
    #[serde(default)]
    pub releases: ReleaseChanges,
}

/// Added and removed documents.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct DocumentChanges {
    /// Documents created or updated.
    #[serde(default)]
    pub addition: Vec<DocumentRef>,
    /// Documents removed.
    #[serde(default)]
    pub deletion: Vec<DocumentRef>,
}

/// Releases created, changed, or removed.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct ReleaseChanges {
    /// New releases.
    #[serde(default)]
    pub addition: Vec<Release>,
    /// Changed releases.
    #[serde(default)]
    pub update: Vec<Release>,
    /// Removed releases.
    #[serde(default)]
    pub deletion: Vec<Release>,
}

/// One release and the document changes it carries.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Release {
    /// Release identifier.
    pub id: String,
    /// Documents added to or removed from the release.
    #[serde(default)]
    pub documents: DocumentChanges,
}

/// A document reference: either a bare id or an object with an `id`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum DocumentRef {
    /// Bare id.
    Id(String),
    /// Object form.
    Object {
        /// Document id.
        id: String,
    },
}

impl DocumentRef {
    /// Referenced document id.
    pub fn id(&self) -> &str {
        match self {
            Self::Id(id) | Self::Object { id } => id,
        }
    }
}
