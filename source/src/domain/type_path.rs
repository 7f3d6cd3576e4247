//! Type path registry.
//!
//! A type path is a stable key (custom-type id plus nested field path) that
//! remembers the resolved schema shape of one field. Schema declaration
//! writes the registry once; every later normalisation pass, including
//! webhook-triggered ones in a different process, reads it back from the
//! persisted snapshot.
//!
//! The registry is append-only: writing an identical entry twice is a no-op,
//! writing a differing entry for an existing path is a [`TypePathConflict`].
//! Writes need `&mut TypePathRegistry`, so the single-writer declaration
//! phase is enforced by ownership; normalisation shares `&TypePathRegistry`.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::Error;
use super::inference::InferredShape;

/// Snapshot format version written by [`TypePathRegistry::to_snapshot`].
pub const REGISTRY_SNAPSHOT_VERSION: u32 = 1;

/// Structural path of a field inside a custom type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypePath {
    /// Custom-type identifier.
    pub custom_type: String,
    /// Field path segments below the document's data.
    pub segments: Vec<String>,
}

impl TypePath {
    /// Path of the custom type itself.
    pub fn root(custom_type: impl Into<String>) -> Self {
        Self {
            custom_type: custom_type.into(),
            segments: Vec::new(),
        }
    }

    /// Extend the path by one segment.
    #[must_use]
    pub fn child(&self, segment: impl Into<String>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment.into());
        Self {
            custom_type: self.custom_type.clone(),
            segments,
        }
    }

    /// Last segment, or `None` for a root path.
    pub fn last(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    /// Every component including the custom type, for type naming.
    pub fn components(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.custom_type.as_str()).chain(self.segments.iter().map(String::as_str))
    }

    /// Dotted rendering, e.g. `page.body.hero.primary.title`.
    pub fn dotted(&self) -> String {
        self.components().collect::<Vec<_>>().join(".")
    }
}

impl fmt::Display for TypePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.dotted())
    }
}

/// CMS field kinds understood by the resolver table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// Root entry of a custom type; members are its data fields.
    Document,
    /// UID field, hoisted onto the document node.
    Uid,
    /// Plain text.
    Text,
    /// Select from a fixed option list.
    Select,
    /// Hex colour.
    Color,
    /// Number.
    Number,
    /// Boolean toggle.
    Boolean,
    /// Calendar date.
    Date,
    /// Timestamp.
    Timestamp,
    /// Link to a document, web URL, or media item.
    Link,
    /// Image with optional thumbnails.
    Image,
    /// Rich text block list.
    RichText,
    /// Latitude/longitude pair.
    GeoPoint,
    /// oEmbed payload.
    Embed,
    /// Repeatable group; each item becomes a child node.
    Group,
    /// Slice zone; each slice becomes a child node.
    Slices,
    /// One slice choice within a slice zone.
    Slice,
    /// The `primary` or `items` section of a slice.
    SliceSection,
    /// Unknown or integration field whose shape is inferred from samples.
    Inferred,
}

impl FieldKind {
    /// Map a custom-type JSON `type` string onto a field kind.
    ///
    /// Returns `None` for types this crate does not know, which callers route
    /// to the inferred resolver with a warning.
    pub fn from_cms_type(cms_type: &str) -> Option<Self> {
        let kind = match cms_type {
            "UID" => Self::Uid,
            "Text" => Self::Text,
            "Select" => Self::Select,
            "Color" => Self::Color,
            "Number" => Self::Number,
            "Boolean" => Self::Boolean,
            "Date" => Self::Date,
            "Timestamp" => Self::Timestamp,
            "Link" => Self::Link,
            "Image" => Self::Image,
            "StructuredText" => Self::RichText,
            "GeoPoint" => Self::GeoPoint,
            "Embed" => Self::Embed,
            "Group" => Self::Group,
            "Slices" => Self::Slices,
            "IntegrationFields" => Self::Inferred,
            _ => return None,
        };
        Some(kind)
    }
}

/// Resolved descriptor stored under a type path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypePathEntry {
    /// Field kind driving resolver dispatch.
    pub kind: FieldKind,
    /// Schema type reference of the field, e.g. `PrismicLinkType`.
    pub type_name: String,
    /// Node type produced for each item, for kinds that emit nodes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_type: Option<String>,
    /// Ordered sub-field, slice choice, or thumbnail names.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub members: Vec<String>,
    /// Structural shape for inferred fields.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shape: Option<InferredShape>,
}

impl TypePathEntry {
    /// Entry for a leaf field with no nested structure.
    pub fn leaf(kind: FieldKind, type_name: impl Into<String>) -> Self {
        Self {
            kind,
            type_name: type_name.into(),
            node_type: None,
            members: Vec::new(),
            shape: None,
        }
    }

    /// Attach the node type emitted per item.
    #[must_use]
    pub fn with_node_type(mut self, node_type: impl Into<String>) -> Self {
        self.node_type = Some(node_type.into());
        self
    }

    /// Attach ordered member names.
    #[must_use]
    pub fn with_members(mut self, members: Vec<String>) -> Self {
        self.members = members;
        self
    }

    /// Attach an inferred shape.
    #[must_use]
    pub fn with_shape(mut self, shape: InferredShape) -> Self {
        self.shape = Some(shape);
        self
    }
}

/// Raised when a second, differing descriptor is registered for a path.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("conflicting shapes declared for type path {path}: {existing:?} vs {attempted:?}")]
pub struct TypePathConflict {
    /// Dotted path that was declared twice.
    pub path: String,
    /// Kind already registered.
    pub existing: FieldKind,
    /// Kind of the rejected declaration.
    pub attempted: FieldKind,
}

impl From<TypePathConflict> for Error {
    fn from(conflict: TypePathConflict) -> Self {
        Self::configuration(conflict.to_string())
            .with_details(serde_json::json!({ "typePath": conflict.path }))
    }
}

/// Append-only mapping from type paths to resolved descriptors.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TypePathRegistry {
    entries: BTreeMap<TypePath, TypePathEntry>,
}

impl TypePathRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up the descriptor registered for `path`.
    pub fn get(&self, path: &TypePath) -> Option<&TypePathEntry> {
        self.entries.get(path)
    }

    /// Look up a descriptor that normalisation depends on.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when the path was never declared, which
    /// means the registry snapshot predates the custom type.
    pub fn require(&self, path: &TypePath) -> Result<&TypePathEntry, Error> {
        self.get(path).ok_or_else(|| {
            Error::configuration(format!("type path {path} was not declared"))
                .with_details(serde_json::json!({ "typePath": path.dotted() }))
        })
    }

    /// Register `entry` under `path`.
    ///
    /// Registering an identical entry again succeeds without change.
    ///
    /// # Errors
    ///
    /// Returns [`TypePathConflict`] when a differing entry already exists.
    ///
    /// # Examples
    /// ```
    /// use prismic_source::domain::{FieldKind, TypePath, TypePathEntry, TypePathRegistry};
    ///
    /// let mut registry = TypePathRegistry::new();
    /// let path = TypePath::root("page").child("title");
    /// registry
    ///     .set(path.clone(), TypePathEntry::leaf(FieldKind::Text, "String"))
    ///     .expect("first declaration");
    /// let conflict = registry.set(path, TypePathEntry::leaf(FieldKind::Number, "Float"));
    /// assert!(conflict.is_err());
    /// ```
    pub fn set(&mut self, path: TypePath, entry: TypePathEntry) -> Result<(), TypePathConflict> {
        match self.entries.get(&path) {
            Some(existing) if *existing == entry => Ok(()),
            Some(existing) => Err(TypePathConflict {
                path: path.dotted(),
                existing: existing.kind,
                attempted: entry.kind,
            }),
            None => {
                self.entries.insert(path, entry);
                Ok(())
            }
        }
    }

    /// Custom types with a declared root entry, in id order.
    pub fn custom_types(&self) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .filter(|(path, entry)| path.segments.is_empty() && entry.kind == FieldKind::Document)
            .map(|(path, _)| path.custom_type.as_str())
    }

    /// Number of registered paths.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing has been declared.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Export a persistable snapshot with paths in sorted order.
    pub fn to_snapshot(&self) -> RegistrySnapshot {
        RegistrySnapshot {
            version: REGISTRY_SNAPSHOT_VERSION,
            entries: self
                .entries
                .iter()
                .map(|(path, entry)| TypePathRecord {
                    path: path.clone(),
                    entry: entry.clone(),
                })
                .collect(),
        }
    }

    /// Rebuild a registry from a persisted snapshot.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for an unsupported snapshot version or
    /// a snapshot that lists one path with two differing entries.
    pub fn from_snapshot(snapshot: RegistrySnapshot) -> Result<Self, Error> {
        if snapshot.version != REGISTRY_SNAPSHOT_VERSION {
            return Err(Error::configuration(format!(
                "unsupported type path snapshot version: expected {REGISTRY_SNAPSHOT_VERSION}, found {}",
                snapshot.version
            )));
        }
        let mut registry = Self::new();
        for record in snapshot.entries {
            registry.set(record.path, record.entry)?;
        }
        Ok(registry)
    }
}

/// Persisted form of the registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistrySnapshot {
    /// Snapshot format version.
    pub version: u32,
    /// Registered entries, sorted by path.
    pub entries: Vec<TypePathRecord>,
}

/// One persisted registry entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypePathRecord {
    /// Registry key.
    pub path: TypePath,
    /// Registered descriptor.
    pub entry: TypePathEntry,
}

#[cfg(test)]
mod tests {
    //! Registry invariants.

    use super::*;
    use crate::domain::ErrorCode;
    use rstest::{fixture, rstest};

    #[fixture]
    fn title_path() -> TypePath {
        TypePath::root("page").child("title")
    }

    #[rstest]
    fn identical_redeclaration_is_accepted(title_path: TypePath) {
        let mut registry = TypePathRegistry::new();
        let entry = TypePathEntry::leaf(FieldKind::Text, "String");
        registry.set(title_path.clone(), entry.clone()).expect("first set");
        registry.set(title_path.clone(), entry.clone()).expect("identical set");
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get(&title_path), Some(&entry));
    }

    #[rstest]
    fn differing_redeclaration_is_a_conflict(title_path: TypePath) {
        let mut registry = TypePathRegistry::new();
        registry
            .set(title_path.clone(), TypePathEntry::leaf(FieldKind::Text, "String"))
            .expect("first set");
        let conflict = registry
            .set(title_path.clone(), TypePathEntry::leaf(FieldKind::RichText, "PrismicStructuredTextType"))
            .expect_err("conflict expected");

        assert_eq!(conflict.path, "page.title");
        assert_eq!(conflict.existing, FieldKind::Text);
        let error = Error::from(conflict);
        assert_eq!(error.code(), ErrorCode::Configuration);
        assert!(error.is_fatal());
        assert_eq!(
            registry.get(&title_path).map(|entry| entry.kind),
            Some(FieldKind::Text),
            "the original entry must not be overwritten"
        );
    }

    #[rstest]
    fn members_participate_in_conflict_detection() {
        let path = TypePath::root("page").child("gallery");
        let mut registry = TypePathRegistry::new();
        registry
            .set(
                path.clone(),
                TypePathEntry::leaf(FieldKind::Group, "[G]").with_members(vec!["a".to_owned()]),
            )
            .expect("first set");
        let result = registry.set(
            path,
            TypePathEntry::leaf(FieldKind::Group, "[G]").with_members(vec!["b".to_owned()]),
        );
        assert!(result.is_err());
    }

    #[rstest]
    fn require_reports_undeclared_paths(title_path: TypePath) {
        let registry = TypePathRegistry::new();
        let error = registry.require(&title_path).expect_err("undeclared");
        assert_eq!(error.code(), ErrorCode::Configuration);
        assert!(error.message().contains("page.title"));
    }

    #[rstest]
    fn snapshot_survives_json_persistence(title_path: TypePath) {
        let mut registry = TypePathRegistry::new();
        registry
            .set(TypePath::root("page"), TypePathEntry::leaf(FieldKind::Document, "PrismicPage"))
            .expect("root");
        registry
            .set(title_path, TypePathEntry::leaf(FieldKind::Text, "String"))
            .expect("title");

        let json = serde_json::to_string(&registry.to_snapshot()).expect("serialise");
        let snapshot: RegistrySnapshot = serde_json::from_str(&json).expect("deserialise");
        let restored = TypePathRegistry::from_snapshot(snapshot).expect("restore");

        assert_eq!(restored, registry);
        assert_eq!(restored.custom_types().collect::<Vec<_>>(), vec!["page"]);
    }

    #[test]
    fn snapshot_with_unknown_version_is_rejected() {
        let snapshot = RegistrySnapshot {
            version: 99,
            entries: Vec::new(),
        };
        let error = TypePathRegistry::from_snapshot(snapshot).expect_err("version mismatch");
        assert_eq!(error.code(), ErrorCode::Configuration);
    }

    #[rstest]
    #[case("StructuredText", Some(FieldKind::RichText))]
    #[case("Slices", Some(FieldKind::Slices))]
    #[case("IntegrationFields", Some(FieldKind::Inferred))]
    #[case("Mystery", None)]
    fn maps_cms_type_strings(#[case] cms_type: &str, #[case] expected: Option<FieldKind>) {
        assert_eq!(FieldKind::from_cms_type(cms_type), expected);
    }
}
