//! Document normaliser.
//!
//! Walks the fields the registry declares for a document's custom type,
//! not the keys present in the payload, so every declared field is present
//! on the resulting node. Output depends only on the document, the
//! registry, and the store's deterministic id and digest functions: the
//! same inputs always produce identical nodes.

use serde_json::{Map, Value, json};

use super::fields::{NormalizeContext, normalize_field};
use super::ports::{LinkResolver, LinkTarget, NodeStore};
use super::{Document, Error, FieldKind, Node, NormalizedDocument, TypePath, TypePathRegistry};

/// Normalises fetched documents against a declared registry.
#[derive(Clone, Copy)]
pub struct DocumentNormalizer<'a> {
    registry: &'a TypePathRegistry,
    store: &'a dyn NodeStore,
    link_resolver: Option<&'a dyn LinkResolver>,
}

impl<'a> DocumentNormalizer<'a> {
    /// Bind a normaliser to its registry, node store, and optional link
    /// resolver.
    pub fn new(
        registry: &'a TypePathRegistry,
        store: &'a dyn NodeStore,
        link_resolver: Option<&'a dyn LinkResolver>,
    ) -> Self {
        Self {
            registry,
            store,
            link_resolver,
        }
    }

    /// Normalise one document into its node and child nodes.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when the document's custom type (or one
    /// of its fields) was never declared in the registry.
    pub fn normalize(&self, document: &Document) -> Result<NormalizedDocument, Error> {
        let root = TypePath::root(document.custom_type.as_str());
        let entry = self.registry.get(&root).ok_or_else(|| {
            Error::configuration(format!(
                "custom type {} was not declared before sourcing",
                document.custom_type
            ))
            .with_details(json!({ "documentId": document.id, "customType": document.custom_type }))
        })?;
        if entry.kind != FieldKind::Document {
            return Err(Error::configuration(format!(
                "type path {root} is not a custom type root"
            )));
        }

        let mut ctx =
            NormalizeContext::new(self.registry, self.store, self.link_resolver, &document.id);
        let mut data = Map::new();
        for member in &entry.members {
            let value = normalize_field(&mut ctx, &root.child(member.as_str()), document.data.get(member))?;
            data.insert(member.clone(), value);
        }

        let uid = document
            .uid
            .clone()
            .or_else(|| self.hoisted_uid(&root, &entry.members, &data));
        let url = self
            .link_resolver
            .and_then(|resolver| resolver.resolve(&self.target_of(document, uid.as_deref())))
            .map_or(Value::Null, Value::String);
        let alternate_languages: Vec<Value> = document
            .alternate_languages
            .iter()
            .map(|alternate| {
                json!({
                    "id": alternate.id,
                    "uid": alternate.uid,
                    "type": alternate.custom_type,
                    "lang": alternate.lang,
                    "document": self.store.create_node_id(&alternate.id).to_string(),
                })
            })
            .collect();

        let raw_data = Value::Object(document.data.clone());
        let mut fields = Map::new();
        fields.insert("prismicId".to_owned(), Value::String(document.id.clone()));
        fields.insert("uid".to_owned(), uid.map_or(Value::Null, Value::String));
        fields.insert("type".to_owned(), Value::String(document.custom_type.clone()));
        fields.insert("lang".to_owned(), Value::String(document.lang.clone()));
        fields.insert("tags".to_owned(), json!(document.tags));
        fields.insert("href".to_owned(), json!(document.href));
        fields.insert("url".to_owned(), url);
        fields.insert(
            "first_publication_date".to_owned(),
            json!(document.first_publication_date),
        );
        fields.insert(
            "last_publication_date".to_owned(),
            json!(document.last_publication_date),
        );
        fields.insert("alternate_languages".to_owned(), Value::Array(alternate_languages));
        fields.insert("data".to_owned(), Value::Object(data));
        fields.insert("dataString".to_owned(), Value::String(raw_data.to_string()));
        fields.insert("dataRaw".to_owned(), raw_data);

        let children = ctx.children;
        let node = Node {
            id: ctx.document_node_id,
            parent: None,
            children: children.iter().map(|child| child.id.clone()).collect(),
            node_type: entry
                .node_type
                .clone()
                .unwrap_or_else(|| entry.type_name.clone()),
            fields,
            content_digest: self.store.create_content_digest(&document.to_value()),
        };
        Ok(NormalizedDocument { node, children })
    }

    fn hoisted_uid(&self, root: &TypePath, members: &[String], data: &Map<String, Value>) -> Option<String> {
        members
            .iter()
            .find(|member| {
                self.registry
                    .get(&root.child(member.as_str()))
                    .is_some_and(|entry| entry.kind == FieldKind::Uid)
            })
            .and_then(|member| data.get(member))
            .and_then(Value::as_str)
            .map(str::to_owned)
    }

    fn target_of(&self, document: &Document, uid: Option<&str>) -> LinkTarget {
        LinkTarget {
            id: document.id.clone(),
            uid: uid.map(str::to_owned),
            custom_type: Some(document.custom_type.clone()),
            lang: Some(document.lang.clone()),
            tags: document.tags.clone(),
            slug: document.slugs.first().cloned(),
            is_broken: false,
        }
    }
}
