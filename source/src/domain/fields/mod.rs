//! Field type resolvers.
//!
//! One resolver per [`FieldKind`], each implementing the same two-operation
//! contract:
//!
//! - `declare` runs at schema-customisation time against the field's
//!   custom-type JSON and produces the [`TypePathEntry`] recorded in the
//!   registry (registering any schema types it needs on the way);
//! - `normalize` runs at sourcing time against one document's raw value and
//!   produces a value shaped by that entry, never by the document.
//!
//! Dispatch goes through the fixed table in [`resolver_for`].

use serde_json::{Map, Value};
use tracing::warn;

use super::custom_type::{FieldSchema, NamedField};
use super::ports::{LinkResolver, NodeStore};
use super::{
    Document, Error, FieldDefinition, FieldKind, Node, NodeId, SchemaBuilder, TypeNaming,
    TypePath, TypePathEntry, TypePathRegistry,
};

mod embed;
mod geo_point;
mod group;
mod image;
mod inferred;
mod link;
mod rich_text;
mod scalar;
mod slices;

use link::link_target;

/// The two-operation contract every field kind implements.
pub(crate) trait FieldResolver: Sync {
    /// Declare the schema shape of the field at `path`.
    fn declare(
        &self,
        ctx: &mut DeclareContext<'_>,
        path: &TypePath,
        field: &FieldSchema,
    ) -> Result<TypePathEntry, Error>;

    /// Normalise one raw value into the declared shape.
    ///
    /// `value` is `None` when the document does not carry the field; the
    /// result is then the kind's empty value.
    fn normalize(
        &self,
        ctx: &mut NormalizeContext<'_>,
        path: &TypePath,
        entry: &TypePathEntry,
        value: Option<&Value>,
    ) -> Result<Value, Error>;
}

/// Resolver table.
pub(crate) fn resolver_for(kind: FieldKind) -> &'static dyn FieldResolver {
    match kind {
        FieldKind::Uid => &scalar::UID,
        FieldKind::Text => &scalar::TEXT,
        FieldKind::Select => &scalar::SELECT,
        FieldKind::Color => &scalar::COLOR,
        FieldKind::Number => &scalar::NUMBER,
        FieldKind::Boolean => &scalar::BOOLEAN,
        FieldKind::Date => &scalar::DATE,
        FieldKind::Timestamp => &scalar::TIMESTAMP,
        FieldKind::Link => &link::LinkResolverField,
        FieldKind::Image => &image::ImageField,
        FieldKind::RichText => &rich_text::RichTextField,
        FieldKind::GeoPoint => &geo_point::GeoPointField,
        FieldKind::Embed => &embed::EmbedField,
        FieldKind::Group => &group::GroupField,
        FieldKind::Slices | FieldKind::Slice | FieldKind::SliceSection => &slices::SliceZoneField,
        FieldKind::Document | FieldKind::Inferred => &inferred::InferredField,
    }
}

/// A non-fatal problem found while declaring a schema.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct SchemaWarning {
    /// Dotted type path of the field.
    pub path: String,
    /// Human-readable explanation.
    pub message: String,
}

/// Mutable state of one declaration phase.
pub(crate) struct DeclareContext<'a> {
    pub(crate) registry: TypePathRegistry,
    pub(crate) schema: SchemaBuilder,
    pub(crate) naming: &'a TypeNaming,
    pub(crate) samples: &'a [Document],
    pub(crate) warnings: Vec<SchemaWarning>,
}

impl<'a> DeclareContext<'a> {
    pub(crate) fn new(naming: &'a TypeNaming, samples: &'a [Document]) -> Self {
        Self {
            registry: TypePathRegistry::new(),
            schema: SchemaBuilder::new(),
            naming,
            samples,
            warnings: Vec::new(),
        }
    }

    pub(crate) fn warn(&mut self, path: &TypePath, message: String) {
        warn!(type_path = %path, "{message}");
        self.warnings.push(SchemaWarning {
            path: path.dotted(),
            message,
        });
    }
}

/// Declare one field and record its entry.
pub(crate) fn declare_field(
    ctx: &mut DeclareContext<'_>,
    path: &TypePath,
    field: &FieldSchema,
) -> Result<TypePathEntry, Error> {
    let resolver = match FieldKind::from_cms_type(&field.cms_type) {
        Some(kind) => resolver_for(kind),
        None => {
            ctx.warn(
                path,
                format!(
                    "an unknown field type \"{}\" was found at {path}; a generic inferred type will be created",
                    field.cms_type
                ),
            );
            &inferred::InferredField
        }
    };
    let entry = resolver.declare(ctx, path, field)?;
    ctx.registry.set(path.clone(), entry.clone())?;
    Ok(entry)
}

/// Declare a list of fields below `parent`, returning their definitions and
/// member names in authoring order. Fields stored as child node ids are
/// declared as links.
pub(crate) fn declare_members(
    ctx: &mut DeclareContext<'_>,
    parent: &TypePath,
    fields: &[NamedField],
) -> Result<(Vec<FieldDefinition>, Vec<String>), Error> {
    let mut definitions = Vec::with_capacity(fields.len());
    let mut members = Vec::with_capacity(fields.len());
    for field in fields {
        let path = parent.child(field.name.as_str());
        let entry = declare_field(ctx, &path, &field.schema)?;
        definitions.push(if entry.node_type.is_some() {
            FieldDefinition::linked(field.name.as_str(), entry.type_name)
        } else {
            FieldDefinition::new(field.name.as_str(), entry.type_name)
        });
        members.push(field.name.clone());
    }
    Ok((definitions, members))
}

/// Read-mostly state of one document's normalisation.
pub(crate) struct NormalizeContext<'a> {
    pub(crate) registry: &'a TypePathRegistry,
    pub(crate) store: &'a dyn NodeStore,
    pub(crate) link_resolver: Option<&'a dyn LinkResolver>,
    pub(crate) document_node_id: NodeId,
    pub(crate) scope: String,
    pub(crate) children: Vec<Node>,
}

impl<'a> NormalizeContext<'a> {
    pub(crate) fn new(
        registry: &'a TypePathRegistry,
        store: &'a dyn NodeStore,
        link_resolver: Option<&'a dyn LinkResolver>,
        document_id: &str,
    ) -> Self {
        Self {
            registry,
            store,
            link_resolver,
            document_node_id: store.create_node_id(document_id),
            scope: document_id.to_owned(),
            children: Vec::new(),
        }
    }

    /// Source id of the `index`th item of the field at `path`, scoped by the
    /// item currently being normalised so nested items never collide.
    pub(crate) fn child_source_id(&self, path: &TypePath, index: usize) -> String {
        format!("{}__{}__{index}", self.scope, path.segments.join("."))
    }
}

/// Normalise the fields of one child node under its own scope, record the
/// node, and return its id.
pub(crate) fn emit_child<'a>(
    ctx: &mut NormalizeContext<'a>,
    source_id: String,
    node_type: &str,
    raw: &Value,
    build: impl FnOnce(&mut NormalizeContext<'a>) -> Result<Map<String, Value>, Error>,
) -> Result<NodeId, Error> {
    let id = ctx.store.create_node_id(&source_id);
    let parent_scope = std::mem::replace(&mut ctx.scope, source_id);
    let built = build(ctx);
    ctx.scope = parent_scope;
    let mut fields = built?;
    fields.insert("raw".to_owned(), raw.clone());
    ctx.children.push(Node {
        id: id.clone(),
        parent: Some(ctx.document_node_id.clone()),
        children: Vec::new(),
        node_type: node_type.to_owned(),
        fields,
        content_digest: ctx.store.create_content_digest(raw),
    });
    Ok(id)
}

/// Normalise the field at `path` using its registry entry.
pub(crate) fn normalize_field(
    ctx: &mut NormalizeContext<'_>,
    path: &TypePath,
    value: Option<&Value>,
) -> Result<Value, Error> {
    let registry = ctx.registry;
    let entry = registry.require(path)?;
    resolver_for(entry.kind).normalize(ctx, path, entry, value.filter(|raw| !raw.is_null()))
}

/// Normalise every member of `entry` against the raw object `value`.
pub(crate) fn normalize_members(
    ctx: &mut NormalizeContext<'_>,
    path: &TypePath,
    entry: &TypePathEntry,
    value: Option<&Value>,
) -> Result<Map<String, Value>, Error> {
    let object = value.and_then(Value::as_object);
    let mut normalized = Map::new();
    for member in &entry.members {
        let raw = object.and_then(|fields| fields.get(member));
        let field_value = normalize_field(ctx, &path.child(member.as_str()), raw)?;
        normalized.insert(member.clone(), field_value);
    }
    Ok(normalized)
}

/// Copy the named keys of a raw object, defaulting missing keys to `null`.
pub(crate) fn pick(object: Option<&Map<String, Value>>, keys: &[&str]) -> Map<String, Value> {
    keys.iter()
        .map(|key| {
            let value = object
                .and_then(|fields| fields.get(*key))
                .cloned()
                .unwrap_or(Value::Null);
            ((*key).to_owned(), value)
        })
        .collect()
}
