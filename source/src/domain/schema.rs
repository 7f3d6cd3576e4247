//! Schema type descriptors handed to the host's type system.
//!
//! Descriptors are plain data. The host registers them before any document
//! is sourced; this crate only guarantees they are deterministic and that a
//! type name is never declared with two different shapes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::Error;

/// Root prefix shared by every generated type name.
pub const TYPE_NAME_ROOT: &str = "Prismic";

/// One schema type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TypeDescriptor {
    /// Object type with ordered fields.
    Object {
        /// Type name.
        name: String,
        /// Ordered field definitions.
        fields: Vec<FieldDefinition>,
        /// Implemented interfaces, e.g. `Node`.
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        interfaces: Vec<String>,
    },
    /// Union of object types.
    Union {
        /// Type name.
        name: String,
        /// Member type names.
        members: Vec<String>,
    },
    /// Enumeration.
    Enum {
        /// Type name.
        name: String,
        /// Allowed values.
        values: Vec<String>,
    },
}

impl TypeDescriptor {
    /// Object type without interfaces.
    pub fn object(name: impl Into<String>, fields: Vec<FieldDefinition>) -> Self {
        Self::Object {
            name: name.into(),
            fields,
            interfaces: Vec::new(),
        }
    }

    /// Object type implementing the host's `Node` interface.
    pub fn node(name: impl Into<String>, fields: Vec<FieldDefinition>) -> Self {
        Self::Object {
            name: name.into(),
            fields,
            interfaces: vec!["Node".to_owned()],
        }
    }

    /// Type name.
    pub fn name(&self) -> &str {
        match self {
            Self::Object { name, .. } | Self::Union { name, .. } | Self::Enum { name, .. } => name,
        }
    }
}

/// Field of an object type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDefinition {
    /// Field name.
    pub name: String,
    /// Type reference, e.g. `String`, `[PrismicPageBodySlicesType!]!`.
    pub type_ref: String,
    /// The stored value is a node id (or list of ids) to resolve lazily.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub link: bool,
}

impl FieldDefinition {
    /// Plain field.
    pub fn new(name: impl Into<String>, type_ref: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_ref: type_ref.into(),
            link: false,
        }
    }

    /// Field whose value references nodes by id.
    pub fn linked(name: impl Into<String>, type_ref: impl Into<String>) -> Self {
        Self {
            link: true,
            ..Self::new(name, type_ref)
        }
    }
}

/// Collects descriptors in declaration order, rejecting divergent
/// re-declarations of one name.
#[derive(Debug, Clone, Default)]
pub struct SchemaBuilder {
    types: Vec<TypeDescriptor>,
    index: BTreeMap<String, usize>,
}

impl SchemaBuilder {
    /// Empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare `descriptor`, accepting identical re-declarations.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when a type of the same name with a
    /// different shape was already declared.
    pub fn ensure(&mut self, descriptor: TypeDescriptor) -> Result<(), Error> {
        let name = descriptor.name().to_owned();
        if let Some(position) = self.index.get(&name) {
            if self.types.get(*position) == Some(&descriptor) {
                return Ok(());
            }
            return Err(Error::configuration(format!(
                "schema type {name} declared twice with different shapes"
            ))
            .with_details(serde_json::json!({ "typeName": name })));
        }
        self.index.insert(name, self.types.len());
        self.types.push(descriptor);
        Ok(())
    }

    /// Look up a declared type.
    pub fn get(&self, name: &str) -> Option<&TypeDescriptor> {
        self.index
            .get(name)
            .and_then(|position| self.types.get(*position))
    }

    /// Declared types in declaration order.
    pub fn into_types(self) -> Vec<TypeDescriptor> {
        self.types
    }
}

/// Derives deterministic type names from type paths.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeNaming {
    prefix: String,
}

impl TypeNaming {
    /// Naming with an optional user prefix inserted after the root prefix.
    ///
    /// # Examples
    /// ```
    /// use prismic_source::domain::TypeNaming;
    ///
    /// let naming = TypeNaming::new(Some("blog"));
    /// assert_eq!(naming.path_name(["page", "body_text"], "GroupType"), "PrismicBlogPageBodyTextGroupType");
    /// assert_eq!(naming.shared("LinkType"), "PrismicBlogLinkType");
    /// ```
    pub fn new(prefix: Option<&str>) -> Self {
        Self {
            prefix: prefix.map(pascal_case).unwrap_or_default(),
        }
    }

    /// Name for a type shared across all custom types.
    pub fn shared(&self, suffix: &str) -> String {
        format!("{TYPE_NAME_ROOT}{}{suffix}", self.prefix)
    }

    /// Name derived from path components plus a suffix.
    pub fn path_name<'a>(&self, components: impl IntoIterator<Item = &'a str>, suffix: &str) -> String {
        let body: String = components.into_iter().map(pascal_case).collect();
        format!("{TYPE_NAME_ROOT}{}{body}{suffix}", self.prefix)
    }
}

fn pascal_case(raw: &str) -> String {
    raw.split(|character: char| !character.is_ascii_alphanumeric())
        .filter(|chunk| !chunk.is_empty())
        .map(|chunk| {
            let mut characters = chunk.chars();
            characters.next().map_or_else(String::new, |first| {
                first.to_ascii_uppercase().to_string() + characters.as_str()
            })
        })
        .collect()
}
