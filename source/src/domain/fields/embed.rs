//! oEmbed fields.

use serde_json::Value;

use super::{DeclareContext, FieldResolver, NormalizeContext, pick};
use crate::domain::custom_type::FieldSchema;
use crate::domain::{Error, FieldDefinition, FieldKind, TypeDescriptor, TypePath, TypePathEntry};

const EMBED_FIELDS: [(&str, &str); 14] = [
    ("type", "String"),
    ("version", "String"),
    ("title", "String"),
    ("author_name", "String"),
    ("author_url", "String"),
    ("provider_name", "String"),
    ("provider_url", "String"),
    ("cache_age", "String"),
    ("thumbnail_url", "String"),
    ("thumbnail_width", "Int"),
    ("thumbnail_height", "Int"),
    ("html", "String"),
    ("width", "Int"),
    ("height", "Int"),
];

pub(super) struct EmbedField;

impl FieldResolver for EmbedField {
    fn declare(
        &self,
        ctx: &mut DeclareContext<'_>,
        _path: &TypePath,
        _field: &FieldSchema,
    ) -> Result<TypePathEntry, Error> {
        let type_name = ctx.naming.shared("EmbedType");
        let mut fields: Vec<FieldDefinition> = EMBED_FIELDS
            .iter()
            .map(|(name, type_ref)| FieldDefinition::new(*name, *type_ref))
            .collect();
        fields.push(FieldDefinition::new("embed_url", "String"));
        fields.push(FieldDefinition::new("raw", "JSON"));
        ctx.schema.ensure(TypeDescriptor::object(type_name.clone(), fields))?;
        Ok(TypePathEntry::leaf(FieldKind::Embed, type_name))
    }

    fn normalize(
        &self,
        _ctx: &mut NormalizeContext<'_>,
        _path: &TypePath,
        _entry: &TypePathEntry,
        value: Option<&Value>,
    ) -> Result<Value, Error> {
        let Some(object) = value.and_then(Value::as_object).filter(|raw| !raw.is_empty()) else {
            return Ok(Value::Null);
        };
        let keys: Vec<&str> = EMBED_FIELDS
            .iter()
            .map(|(name, _)| *name)
            .chain(["embed_url"])
            .collect();
        let mut embed = pick(Some(object), &keys);
        embed.insert("raw".to_owned(), Value::Object(object.clone()));
        Ok(Value::Object(embed))
    }
}
