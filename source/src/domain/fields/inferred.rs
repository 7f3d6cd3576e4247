//! Fields whose structure is inferred from sample documents.
//!
//! Used for integration fields and for any CMS type this crate does not
//! know. The shape is fixed at declaration time from the documents
//! available then and recorded in the registry; normalisation conforms
//! values to it and never re-infers.

use serde_json::Value;

use super::{DeclareContext, FieldResolver, NormalizeContext};
use crate::domain::custom_type::FieldSchema;
use crate::domain::{
    Document, Error, FieldDefinition, FieldKind, InferredShape, TypeDescriptor, TypePath,
    TypePathEntry,
};

pub(super) struct InferredField;

impl FieldResolver for InferredField {
    fn declare(
        &self,
        ctx: &mut DeclareContext<'_>,
        path: &TypePath,
        _field: &FieldSchema,
    ) -> Result<TypePathEntry, Error> {
        let samples = sample_values(ctx.samples, path);
        let shape = InferredShape::infer(samples);
        let mut components: Vec<String> = path.components().map(str::to_owned).collect();
        let type_ref = shape_type_ref(ctx, &mut components, &shape)?;
        Ok(TypePathEntry::leaf(FieldKind::Inferred, type_ref).with_shape(shape))
    }

    fn normalize(
        &self,
        _ctx: &mut NormalizeContext<'_>,
        _path: &TypePath,
        entry: &TypePathEntry,
        value: Option<&Value>,
    ) -> Result<Value, Error> {
        let value = value.unwrap_or(&Value::Null);
        Ok(entry
            .shape
            .as_ref()
            .map_or_else(|| value.clone(), |shape| shape.conform(value)))
    }
}

/// Type reference for an inferred shape, declaring object types named after
/// the path (extended by nested keys) as needed.
fn shape_type_ref(
    ctx: &mut DeclareContext<'_>,
    components: &mut Vec<String>,
    shape: &InferredShape,
) -> Result<String, Error> {
    Ok(match shape {
        InferredShape::Json => "JSON".to_owned(),
        InferredShape::Boolean => "Boolean".to_owned(),
        InferredShape::Int => "Int".to_owned(),
        InferredShape::Float => "Float".to_owned(),
        InferredShape::String => "String".to_owned(),
        InferredShape::List { item } => format!("[{}]", shape_type_ref(ctx, components, item)?),
        InferredShape::Object { fields } => {
            let mut definitions = Vec::with_capacity(fields.len());
            for (key, field_shape) in fields {
                components.push(key.clone());
                let type_ref = shape_type_ref(ctx, components, field_shape);
                components.pop();
                definitions.push(FieldDefinition::new(key.as_str(), type_ref?));
            }
            let name = ctx
                .naming
                .path_name(components.iter().map(String::as_str), "InferredType");
            ctx.schema
                .ensure(TypeDescriptor::object(name.clone(), definitions))?;
            name
        }
    })
}

/// Raw values found at `path` across the sample documents of its custom
/// type.
///
/// Arrays met on the way are flattened: group items contribute their
/// sub-field values, and slices contribute only when their `slice_type`
/// matches the next path segment.
pub(super) fn sample_values<'a>(samples: &'a [Document], path: &TypePath) -> Vec<&'a Value> {
    let mut values: Vec<&'a Value> = Vec::new();
    for document in samples.iter().filter(|document| document.custom_type == path.custom_type) {
        let Some((first, rest)) = path.segments.split_first() else {
            continue;
        };
        let mut current: Vec<&'a Value> = document.data.get(first).into_iter().collect();
        for segment in rest {
            current = current
                .into_iter()
                .flat_map(|value| descend(value, segment))
                .collect();
        }
        values.extend(current);
    }
    values
}

fn descend<'a>(value: &'a Value, segment: &str) -> Vec<&'a Value> {
    match value {
        Value::Array(items) => items
            .iter()
            .filter_map(|item| match item.get("slice_type").and_then(Value::as_str) {
                Some(slice_type) if slice_type == segment => Some(item),
                Some(_) => None,
                None => item.get(segment),
            })
            .collect(),
        Value::Object(object) => object.get(segment).into_iter().collect(),
        _ => Vec::new(),
    }
}
