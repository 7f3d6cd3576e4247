//! Repeatable groups.
//!
//! Each group item becomes a child node owned by the document; the field
//! value is the ordered list of those node ids.

use serde_json::Value;

use super::{
    DeclareContext, FieldResolver, NormalizeContext, declare_members, emit_child,
    normalize_members,
};
use crate::domain::custom_type::FieldSchema;
use crate::domain::{Error, FieldKind, TypeDescriptor, TypePath, TypePathEntry};

pub(super) struct GroupField;

impl FieldResolver for GroupField {
    fn declare(
        &self,
        ctx: &mut DeclareContext<'_>,
        path: &TypePath,
        field: &FieldSchema,
    ) -> Result<TypePathEntry, Error> {
        let sub_fields = field.group_fields(&path.dotted())?;
        let (mut definitions, members) = declare_members(ctx, path, &sub_fields)?;
        definitions.push(crate::domain::FieldDefinition::new("raw", "JSON"));

        let node_type = ctx.naming.path_name(path.components(), "GroupType");
        ctx.schema
            .ensure(TypeDescriptor::node(node_type.clone(), definitions))?;
        Ok(TypePathEntry::leaf(FieldKind::Group, format!("[{node_type}]"))
            .with_node_type(node_type)
            .with_members(members))
    }

    fn normalize(
        &self,
        ctx: &mut NormalizeContext<'_>,
        path: &TypePath,
        entry: &TypePathEntry,
        value: Option<&Value>,
    ) -> Result<Value, Error> {
        let node_type = entry.node_type.as_deref().ok_or_else(|| {
            Error::internal(format!("group {path} was declared without a node type"))
        })?;
        let items: &[Value] = value.and_then(Value::as_array).map_or(&[], Vec::as_slice);
        let mut ids = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            let source_id = ctx.child_source_id(path, index);
            let id = emit_child(ctx, source_id, node_type, item, |child| {
                normalize_members(child, path, entry, Some(item))
            })?;
            ids.push(Value::String(id.to_string()));
        }
        Ok(Value::Array(ids))
    }
}
