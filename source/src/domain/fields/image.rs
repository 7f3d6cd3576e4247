//! Image fields with optional named thumbnails.

use serde_json::{Map, Value, json};

use super::{DeclareContext, FieldResolver, NormalizeContext, pick};
use crate::domain::custom_type::FieldSchema;
use crate::domain::{Error, FieldDefinition, FieldKind, TypeDescriptor, TypePath, TypePathEntry};

const IMAGE_KEYS: [&str; 4] = ["alt", "copyright", "dimensions", "url"];

pub(super) struct ImageField;

impl FieldResolver for ImageField {
    fn declare(
        &self,
        ctx: &mut DeclareContext<'_>,
        path: &TypePath,
        field: &FieldSchema,
    ) -> Result<TypePathEntry, Error> {
        let naming = ctx.naming;
        let dimensions = naming.shared("ImageDimensionsType");
        let local_file = naming.shared("RemoteFileType");
        let thumbnail = naming.shared("ImageThumbnailType");
        ctx.schema.ensure(TypeDescriptor::object(
            dimensions.clone(),
            vec![
                FieldDefinition::new("width", "Int"),
                FieldDefinition::new("height", "Int"),
            ],
        ))?;
        ctx.schema.ensure(TypeDescriptor::object(
            local_file.clone(),
            vec![FieldDefinition::new("url", "String")],
        ))?;
        ctx.schema.ensure(TypeDescriptor::object(
            thumbnail.clone(),
            image_fields(&dimensions, &local_file),
        ))?;

        let thumbnails = field.thumbnail_names();
        let mut fields = image_fields(&dimensions, &local_file);
        if !thumbnails.is_empty() {
            let thumbnails_type = naming.path_name(path.components(), "ImageThumbnailsType");
            ctx.schema.ensure(TypeDescriptor::object(
                thumbnails_type.clone(),
                thumbnails
                    .iter()
                    .map(|name| FieldDefinition::new(name.as_str(), thumbnail.as_str()))
                    .collect(),
            ))?;
            fields.push(FieldDefinition::new("thumbnails", thumbnails_type));
        }
        fields.push(FieldDefinition::new("raw", "JSON"));

        let type_name = naming.path_name(path.components(), "ImageType");
        ctx.schema.ensure(TypeDescriptor::object(type_name.clone(), fields))?;
        Ok(TypePathEntry::leaf(FieldKind::Image, type_name).with_members(thumbnails))
    }

    fn normalize(
        &self,
        _ctx: &mut NormalizeContext<'_>,
        _path: &TypePath,
        entry: &TypePathEntry,
        value: Option<&Value>,
    ) -> Result<Value, Error> {
        let object = value.and_then(Value::as_object);
        let mut image = image_value(object);
        if !entry.members.is_empty() {
            let thumbnails: Map<String, Value> = entry
                .members
                .iter()
                .map(|name| {
                    let thumbnail = object
                        .and_then(|fields| fields.get(name))
                        .and_then(Value::as_object)
                        .map_or(Value::Null, |raw| Value::Object(image_value(Some(raw))));
                    (name.clone(), thumbnail)
                })
                .collect();
            image.insert("thumbnails".to_owned(), Value::Object(thumbnails));
        }
        image.insert(
            "raw".to_owned(),
            value.cloned().unwrap_or_else(|| json!({})),
        );
        Ok(Value::Object(image))
    }
}

fn image_fields(dimensions: &str, local_file: &str) -> Vec<FieldDefinition> {
    vec![
        FieldDefinition::new("alt", "String"),
        FieldDefinition::new("copyright", "String"),
        FieldDefinition::new("dimensions", dimensions),
        FieldDefinition::new("url", "String"),
        FieldDefinition::new("localFile", local_file),
    ]
}

fn image_value(object: Option<&Map<String, Value>>) -> Map<String, Value> {
    let mut image = pick(object, &IMAGE_KEYS);
    let local_file = image
        .get("url")
        .and_then(Value::as_str)
        .filter(|url| !url.is_empty())
        .map_or(Value::Null, |url| json!({ "url": url }));
    image.insert("localFile".to_owned(), local_file);
    image
}
