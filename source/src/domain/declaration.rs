//! Schema declaration phase.
//!
//! Runs every field resolver in declare mode over the custom types, filling
//! a fresh [`TypePathRegistry`] and collecting the schema types the host
//! must register. Nothing here depends on documents except inferred
//! fields, which read the sample documents supplied up front.

use serde::Serialize;

use super::custom_type::{CustomTypeDefinition, CustomTypeSchema};
use super::fields::{DeclareContext, SchemaWarning, declare_members};
use super::{
    Document, Error, FieldDefinition, FieldKind, TypeDescriptor, TypeNaming, TypePath,
    TypePathEntry, TypePathRegistry,
};

/// Output of the declaration phase.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchemaDeclaration {
    /// Schema types in declaration order.
    pub types: Vec<TypeDescriptor>,
    /// Non-fatal inference warnings.
    pub warnings: Vec<SchemaWarning>,
    /// The populated registry.
    #[serde(skip)]
    pub registry: TypePathRegistry,
}

/// Declare every custom type.
///
/// # Errors
///
/// Returns a configuration error for malformed custom-type JSON, for a type
/// path declared twice with different shapes, or for a schema type name
/// declared twice with different fields.
pub fn declare_custom_types(
    naming: &TypeNaming,
    custom_types: &[CustomTypeDefinition],
    samples: &[Document],
) -> Result<SchemaDeclaration, Error> {
    let mut ctx = DeclareContext::new(naming, samples);
    let all_documents = naming.shared("AllDocumentTypes");
    let alternate_language = naming.shared("AlternateLanguageType");
    ctx.schema.ensure(TypeDescriptor::object(
        alternate_language.clone(),
        vec![
            FieldDefinition::new("id", "ID"),
            FieldDefinition::new("uid", "String"),
            FieldDefinition::new("type", "String"),
            FieldDefinition::new("lang", "String"),
            FieldDefinition::linked("document", all_documents.clone()),
        ],
    ))?;

    let mut document_types = Vec::with_capacity(custom_types.len());
    for definition in custom_types {
        let schema = CustomTypeSchema::parse(definition)?;
        let root = TypePath::root(schema.id.as_str());
        let (data_fields, members) = declare_members(&mut ctx, &root, &schema.fields)?;

        let data_type = naming.path_name(root.components(), "DataType");
        ctx.schema
            .ensure(TypeDescriptor::object(data_type.clone(), data_fields))?;

        let node_type = naming.path_name(root.components(), "");
        ctx.schema.ensure(TypeDescriptor::node(
            node_type.clone(),
            vec![
                FieldDefinition::new("prismicId", "ID"),
                FieldDefinition::new("uid", "String"),
                FieldDefinition::new("type", "String"),
                FieldDefinition::new("lang", "String"),
                FieldDefinition::new("tags", "[String]"),
                FieldDefinition::new("href", "String"),
                FieldDefinition::new("url", "String"),
                FieldDefinition::new("first_publication_date", "Date"),
                FieldDefinition::new("last_publication_date", "Date"),
                FieldDefinition::new("alternate_languages", format!("[{alternate_language}]")),
                FieldDefinition::new("data", data_type),
                FieldDefinition::new("dataRaw", "JSON"),
                FieldDefinition::new("dataString", "String"),
            ],
        ))?;
        ctx.registry.set(
            root,
            TypePathEntry::leaf(FieldKind::Document, node_type.clone())
                .with_node_type(node_type.clone())
                .with_members(members),
        )?;
        if !document_types.contains(&node_type) {
            document_types.push(node_type);
        }
    }

    ctx.schema.ensure(TypeDescriptor::Union {
        name: all_documents,
        members: document_types,
    })?;

    Ok(SchemaDeclaration {
        types: ctx.schema.into_types(),
        warnings: ctx.warnings,
        registry: ctx.registry,
    })
}
