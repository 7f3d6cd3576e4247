//! Link fields.
//!
//! A link value is denormalised into a fixed object. The `document` member
//! is a weak reference: the node id of the target document, set only when
//! the link is an intact document link with both `type` and `id` present.

use serde_json::{Map, Value, json};

use super::{DeclareContext, FieldResolver, NormalizeContext};
use crate::domain::custom_type::FieldSchema;
use crate::domain::ports::LinkTarget;
use crate::domain::{Error, FieldDefinition, FieldKind, TypeDescriptor, TypePath, TypePathEntry};

/// Link kinds reported by the CMS.
const LINK_TYPES: [&str; 4] = ["Any", "Document", "Media", "Web"];

pub(super) struct LinkResolverField;

impl FieldResolver for LinkResolverField {
    fn declare(
        &self,
        ctx: &mut DeclareContext<'_>,
        _path: &TypePath,
        _field: &FieldSchema,
    ) -> Result<TypePathEntry, Error> {
        let naming = ctx.naming;
        let link_types = naming.shared("LinkTypes");
        let local_file = naming.shared("RemoteFileType");
        ctx.schema.ensure(TypeDescriptor::Enum {
            name: link_types.clone(),
            values: LINK_TYPES.iter().map(|value| (*value).to_owned()).collect(),
        })?;
        ctx.schema.ensure(TypeDescriptor::object(
            local_file.clone(),
            vec![FieldDefinition::new("url", "String")],
        ))?;

        let type_name = naming.shared("LinkType");
        ctx.schema.ensure(TypeDescriptor::object(
            type_name.clone(),
            vec![
                FieldDefinition::new("link_type", link_types),
                FieldDefinition::new("isBroken", "Boolean"),
                FieldDefinition::new("url", "String"),
                FieldDefinition::new("target", "String"),
                FieldDefinition::new("size", "Int"),
                FieldDefinition::new("id", "ID"),
                FieldDefinition::new("type", "String"),
                FieldDefinition::new("tags", "[String]"),
                FieldDefinition::new("lang", "String"),
                FieldDefinition::new("slug", "String"),
                FieldDefinition::new("uid", "String"),
                FieldDefinition::linked("document", naming.shared("AllDocumentTypes")),
                FieldDefinition::new("localFile", local_file),
                FieldDefinition::new("raw", "JSON"),
            ],
        ))?;
        Ok(TypePathEntry::leaf(FieldKind::Link, type_name))
    }

    fn normalize(
        &self,
        ctx: &mut NormalizeContext<'_>,
        _path: &TypePath,
        _entry: &TypePathEntry,
        value: Option<&Value>,
    ) -> Result<Value, Error> {
        let empty = json!({ "link_type": "Any" });
        let raw = value.filter(|raw| raw.is_object()).unwrap_or(&empty);
        let link_type = str_field(raw, "link_type").unwrap_or("Any");
        let is_broken = raw.get("isBroken").and_then(Value::as_bool).unwrap_or(false);
        let id = str_field(raw, "id");
        let target_type = str_field(raw, "type");

        let document = match (link_type, id, target_type, is_broken) {
            ("Document", Some(id), Some(_), false) => {
                Value::String(ctx.store.create_node_id(id).to_string())
            }
            _ => Value::Null,
        };

        let url = if link_type == "Document" {
            link_target(raw)
                .zip(ctx.link_resolver)
                .and_then(|(target, resolver)| resolver.resolve(&target))
                .map_or(Value::Null, Value::String)
        } else {
            copy(raw, "url")
        };

        let local_file = match (link_type, str_field(raw, "url")) {
            ("Media", Some(url)) => json!({ "url": url }),
            _ => Value::Null,
        };

        let mut link = Map::new();
        link.insert("link_type".to_owned(), Value::String(link_type.to_owned()));
        link.insert("isBroken".to_owned(), Value::Bool(is_broken));
        link.insert("url".to_owned(), url);
        for key in ["target", "size", "id", "type"] {
            link.insert(key.to_owned(), copy(raw, key));
        }
        let tags = raw.get("tags").filter(|tags| tags.is_array()).cloned();
        link.insert("tags".to_owned(), tags.unwrap_or_else(|| json!([])));
        for key in ["lang", "slug", "uid"] {
            link.insert(key.to_owned(), copy(raw, key));
        }
        link.insert("document".to_owned(), document);
        link.insert("localFile".to_owned(), local_file);
        link.insert("raw".to_owned(), raw.clone());
        Ok(Value::Object(link))
    }
}

/// Describe the document a raw link (or hyperlink span data) points at.
///
/// Returns `None` for links that do not target a document.
pub(crate) fn link_target(raw: &Value) -> Option<LinkTarget> {
    if str_field(raw, "link_type") != Some("Document") {
        return None;
    }
    let id = str_field(raw, "id")?;
    let owned = |key: &str| str_field(raw, key).map(str::to_owned);
    Some(LinkTarget {
        id: id.to_owned(),
        uid: owned("uid"),
        custom_type: owned("type"),
        lang: owned("lang"),
        tags: raw
            .get("tags")
            .and_then(Value::as_array)
            .map(|tags| tags.iter().filter_map(Value::as_str).map(str::to_owned).collect())
            .unwrap_or_default(),
        slug: owned("slug"),
        is_broken: raw.get("isBroken").and_then(Value::as_bool).unwrap_or(false),
    })
}

fn str_field<'a>(raw: &'a Value, key: &str) -> Option<&'a str> {
    raw.get(key).and_then(Value::as_str).filter(|value| !value.is_empty())
}

fn copy(raw: &Value, key: &str) -> Value {
    raw.get(key).cloned().unwrap_or(Value::Null)
}
