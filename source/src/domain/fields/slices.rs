//! Slice zones.
//!
//! Each slice becomes a child node carrying its `slice_type`, its
//! normalised `primary` section, and its normalised repeatable `items`.
//! The zone value is the ordered list of slice node ids. Slices whose
//! `slice_type` was not declared in the custom type are skipped with a
//! warning: the schema cannot describe them.

use serde_json::{Map, Value};
use tracing::warn;

use super::{
    DeclareContext, FieldResolver, NormalizeContext, declare_members, emit_child,
    normalize_members,
};
use crate::domain::custom_type::{FieldSchema, NamedField};
use crate::domain::{Error, FieldDefinition, FieldKind, TypeDescriptor, TypePath, TypePathEntry};

const PRIMARY: &str = "primary";
const ITEMS: &str = "items";

pub(super) struct SliceZoneField;

impl FieldResolver for SliceZoneField {
    fn declare(
        &self,
        ctx: &mut DeclareContext<'_>,
        path: &TypePath,
        field: &FieldSchema,
    ) -> Result<TypePathEntry, Error> {
        let choices = field.slice_choices(&path.dotted())?;
        let mut slice_types = Vec::with_capacity(choices.len());
        let mut names = Vec::with_capacity(choices.len());
        for choice in choices {
            let choice_path = path.child(choice.name.as_str());
            let (primary, items) = if choice.cms_type == "Slice" {
                (choice.primary, choice.items)
            } else {
                ctx.warn(
                    &choice_path,
                    format!(
                        "slice choice {} has unsupported type \"{}\"; it is declared without fields",
                        choice.name, choice.cms_type
                    ),
                );
                (Vec::new(), Vec::new())
            };
            slice_types.push(declare_slice(ctx, &choice_path, &primary, &items)?);
            names.push(choice.name);
        }

        let union = ctx.naming.path_name(path.components(), "SlicesType");
        ctx.schema.ensure(TypeDescriptor::Union {
            name: union.clone(),
            members: slice_types,
        })?;
        Ok(TypePathEntry::leaf(FieldKind::Slices, format!("[{union}]"))
            .with_node_type(union)
            .with_members(names))
    }

    fn normalize(
        &self,
        ctx: &mut NormalizeContext<'_>,
        path: &TypePath,
        entry: &TypePathEntry,
        value: Option<&Value>,
    ) -> Result<Value, Error> {
        if entry.kind != FieldKind::Slices {
            return Err(Error::internal(format!(
                "{path} is normalised through its slice zone"
            )));
        }
        let registry = ctx.registry;
        let slices: &[Value] = value.and_then(Value::as_array).map_or(&[], Vec::as_slice);
        let mut ids = Vec::with_capacity(slices.len());
        for (index, slice) in slices.iter().enumerate() {
            let slice_type = slice.get("slice_type").and_then(Value::as_str).unwrap_or_default();
            let choice_path = path.child(slice_type);
            let Some(choice) = registry
                .get(&choice_path)
                .filter(|choice| choice.kind == FieldKind::Slice)
            else {
                warn!(type_path = %path, slice_type, "skipping slice of undeclared type");
                continue;
            };
            let node_type = choice.node_type.as_deref().unwrap_or(choice.type_name.as_str());
            let source_id = ctx.child_source_id(path, index);
            let id = emit_child(ctx, source_id, node_type, slice, |child| {
                let mut fields = Map::new();
                fields.insert("slice_type".to_owned(), Value::String(slice_type.to_owned()));
                fields.insert(
                    "slice_label".to_owned(),
                    slice.get("slice_label").cloned().unwrap_or(Value::Null),
                );
                if choice.members.iter().any(|member| member == PRIMARY) {
                    let section_path = choice_path.child(PRIMARY);
                    let section = registry.require(&section_path)?;
                    let primary = normalize_members(child, &section_path, section, slice.get(PRIMARY))?;
                    fields.insert(PRIMARY.to_owned(), Value::Object(primary));
                }
                if choice.members.iter().any(|member| member == ITEMS) {
                    let section_path = choice_path.child(ITEMS);
                    let section = registry.require(&section_path)?;
                    let raw_items: &[Value] = slice
                        .get(ITEMS)
                        .and_then(Value::as_array)
                        .map_or(&[], Vec::as_slice);
                    let mut items = Vec::with_capacity(raw_items.len());
                    for item in raw_items {
                        items.push(Value::Object(normalize_members(
                            child,
                            &section_path,
                            section,
                            Some(item),
                        )?));
                    }
                    fields.insert(ITEMS.to_owned(), Value::Array(items));
                }
                Ok(fields)
            })?;
            ids.push(Value::String(id.to_string()));
        }
        Ok(Value::Array(ids))
    }
}

/// Declare one slice choice and its sections. Returns the slice node type.
fn declare_slice(
    ctx: &mut DeclareContext<'_>,
    choice_path: &TypePath,
    primary: &[NamedField],
    items: &[NamedField],
) -> Result<String, Error> {
    let slice_type = ctx.naming.path_name(choice_path.components(), "");
    let mut definitions = vec![
        FieldDefinition::new("slice_type", "String"),
        FieldDefinition::new("slice_label", "String"),
    ];
    let mut sections = Vec::new();
    for (section, fields, suffix) in [(PRIMARY, primary, "PrimaryType"), (ITEMS, items, "ItemType")] {
        if fields.is_empty() {
            continue;
        }
        let section_path = choice_path.child(section);
        let (section_definitions, members) = declare_members(ctx, &section_path, fields)?;
        let section_type = ctx.naming.path_name(choice_path.components(), suffix);
        ctx.schema
            .ensure(TypeDescriptor::object(section_type.clone(), section_definitions))?;
        let type_ref = if section == ITEMS {
            format!("[{section_type}]")
        } else {
            section_type
        };
        ctx.registry.set(
            section_path,
            TypePathEntry::leaf(FieldKind::SliceSection, type_ref.clone()).with_members(members),
        )?;
        definitions.push(FieldDefinition::new(section, type_ref));
        sections.push(section.to_owned());
    }
    definitions.push(FieldDefinition::new("raw", "JSON"));

    ctx.schema
        .ensure(TypeDescriptor::node(slice_type.clone(), definitions))?;
    ctx.registry.set(
        choice_path.clone(),
        TypePathEntry::leaf(FieldKind::Slice, slice_type.clone())
            .with_node_type(slice_type.clone())
            .with_members(sections),
    )?;
    Ok(slice_type)
}
