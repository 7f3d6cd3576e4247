//! Geographic point fields.

use serde_json::{Value, json};

use super::{DeclareContext, FieldResolver, NormalizeContext};
use crate::domain::custom_type::FieldSchema;
use crate::domain::{Error, FieldDefinition, FieldKind, TypeDescriptor, TypePath, TypePathEntry};

pub(super) struct GeoPointField;

impl FieldResolver for GeoPointField {
    fn declare(
        &self,
        ctx: &mut DeclareContext<'_>,
        _path: &TypePath,
        _field: &FieldSchema,
    ) -> Result<TypePathEntry, Error> {
        let type_name = ctx.naming.shared("GeoPointType");
        ctx.schema.ensure(TypeDescriptor::object(
            type_name.clone(),
            vec![
                FieldDefinition::new("latitude", "Float"),
                FieldDefinition::new("longitude", "Float"),
            ],
        ))?;
        Ok(TypePathEntry::leaf(FieldKind::GeoPoint, type_name))
    }

    fn normalize(
        &self,
        _ctx: &mut NormalizeContext<'_>,
        _path: &TypePath,
        _entry: &TypePathEntry,
        value: Option<&Value>,
    ) -> Result<Value, Error> {
        let coordinate = |key: &str| value.and_then(|raw| raw.get(key)).and_then(Value::as_f64);
        Ok(match (coordinate("latitude"), coordinate("longitude")) {
            (Some(latitude), Some(longitude)) => json!({ "latitude": latitude, "longitude": longitude }),
            _ => Value::Null,
        })
    }
}
