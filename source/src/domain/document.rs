//! Remote content records as fetched from the CMS.
//!
//! Documents are immutable snapshots. The crate never mutates them; it only
//! reads them while producing nodes.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A content record returned by the remote repository.
///
/// Field values live in `data`, keyed by field name and nested per the
/// custom-type schema. Publication dates are kept as the raw strings the API
/// returns so re-serialisation stays byte-stable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Remote document identifier.
    pub id: String,
    /// Custom-type identifier.
    #[serde(rename = "type")]
    pub custom_type: String,
    /// Optional human-readable unique identifier.
    #[serde(default)]
    pub uid: Option<String>,
    /// API URL of the document.
    #[serde(default)]
    pub href: Option<String>,
    /// Language code, e.g. `en-us`.
    #[serde(default)]
    pub lang: String,
    /// Tags assigned in the CMS.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Historic slugs.
    #[serde(default)]
    pub slugs: Vec<String>,
    /// First publication timestamp.
    #[serde(default)]
    pub first_publication_date: Option<String>,
    /// Last publication timestamp.
    #[serde(default)]
    pub last_publication_date: Option<String>,
    /// Translations of this document.
    #[serde(default)]
    pub alternate_languages: Vec<AlternateLanguage>,
    /// Field values.
    #[serde(default)]
    pub data: Map<String, Value>,
}

/// Reference to a translation of a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlternateLanguage {
    /// Remote identifier of the translation.
    pub id: String,
    /// UID of the translation, when the custom type has one.
    #[serde(default)]
    pub uid: Option<String>,
    /// Custom-type identifier of the translation.
    #[serde(rename = "type")]
    pub custom_type: String,
    /// Language code of the translation.
    pub lang: String,
}

impl Document {
    /// Serialise the document back into the JSON shape the API returned.
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}
