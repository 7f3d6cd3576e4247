//! Phase ordering and wiring of the sourcing service.

use std::sync::Arc;

use rstest::{fixture, rstest};
use serde_json::{Value, json};

use super::*;
use crate::domain::ports::{
    FixtureCmsClient, FixtureSchemaRegistrar, MockSchemaRegistrar, SchemaRegistrarError,
};
use crate::domain::webhook::{IgnoreReason, ReconciliationReport, WebhookStatus};
use crate::domain::{ErrorCode, NodeId};
use crate::outbound::{InMemoryNodeStore, InMemoryTypePathCache};

const API_URL: &str = "https://blog.prismic.io/api/v2";

fn post_type() -> CustomTypeDefinition {
    CustomTypeDefinition::new(
        "post",
        json!({
            "Main": {
                "uid": { "type": "UID" },
                "title": { "type": "StructuredText" },
                "sections": {
                    "type": "Group",
                    "config": { "fields": { "heading": { "type": "Text" } } }
                }
            }
        }),
    )
}

fn post(id: &str, sections: usize) -> Document {
    let sections: Vec<Value> = (0..sections)
        .map(|index| json!({ "heading": format!("Section {index}") }))
        .collect();
    serde_json::from_value(json!({
        "id": id,
        "uid": id.to_lowercase(),
        "type": "post",
        "lang": "en-us",
        "data": {
            "title": [{ "type": "heading1", "text": id, "spans": [] }],
            "sections": sections
        }
    }))
    .expect("post fixture")
}

struct Harness {
    client: Arc<FixtureCmsClient>,
    store: Arc<InMemoryNodeStore>,
    cache: Arc<InMemoryTypePathCache>,
    service: ContentSourcingService,
}

impl Harness {
    fn new(options: SourceOptions, registrar: Arc<dyn SchemaRegistrar>) -> Self {
        let client = Arc::new(FixtureCmsClient::default());
        let store = Arc::new(InMemoryNodeStore::new());
        let cache = Arc::new(InMemoryTypePathCache::new());
        let service = ContentSourcingService::new(
            SourcingPorts {
                client: client.clone(),
                store: store.clone(),
                cache: cache.clone(),
                registrar,
            },
            options,
        );
        Self {
            client,
            store,
            cache,
            service,
        }
    }

    fn node_id(&self, id: &str) -> NodeId {
        self.store.create_node_id(id)
    }
}

#[fixture]
fn harness() -> Harness {
    Harness::new(SourceOptions::new("blog"), Arc::new(FixtureSchemaRegistrar))
}

#[rstest]
#[tokio::test]
async fn declared_schema_is_cached_and_drives_sourcing(harness: Harness) {
    let declaration = harness
        .service
        .declare_schema(&[post_type()], &[])
        .await
        .expect("declare");
    assert!(declaration.warnings.is_empty());
    assert!(harness.cache.load("blog:master").await.expect("load").is_some());

    harness
        .client
        .set_documents(vec![post("A", 2), post("B", 0)])
        .expect("serve documents");
    let report = harness.service.source_all().await.expect("source");

    assert_eq!(report.documents, 2);
    assert_eq!(harness.store.len().expect("len"), 4);
    let node = harness
        .store
        .get_node(&harness.node_id("A"))
        .await
        .expect("get")
        .expect("document node");
    assert_eq!(node.node_type, "PrismicPost");
    assert_eq!(node.fields["uid"], "a");
    assert_eq!(node.children.len(), 2);
}

#[rstest]
#[tokio::test]
async fn resourcing_a_shrunk_document_removes_stale_children(harness: Harness) {
    harness
        .service
        .declare_schema(&[post_type()], &[])
        .await
        .expect("declare");
    harness.client.set_documents(vec![post("A", 3)]).expect("serve");
    harness.service.source_all().await.expect("first run");
    assert_eq!(harness.store.len().expect("len"), 4);

    harness.client.set_documents(vec![post("A", 1)]).expect("serve");
    harness.service.source_all().await.expect("second run");
    assert_eq!(harness.store.len().expect("len"), 2);
}

#[rstest]
#[tokio::test]
async fn sourcing_before_declaration_is_a_configuration_error(harness: Harness) {
    let error = harness.service.source_all().await.expect_err("no registry");
    assert_eq!(error.code(), ErrorCode::Configuration);
}

#[tokio::test]
async fn registry_is_cached_before_the_host_sees_the_types() {
    let mut registrar = MockSchemaRegistrar::new();
    registrar
        .expect_register_types()
        .times(1)
        .returning(|_| Err(SchemaRegistrarError::rejected("duplicate type")));
    let harness = Harness::new(SourceOptions::new("blog"), Arc::new(registrar));

    let error = harness
        .service
        .declare_schema(&[post_type()], &[])
        .await
        .expect_err("registration rejected");
    assert_eq!(error.code(), ErrorCode::Configuration);
    assert!(harness.service.load_registry().await.is_ok());
}

#[rstest]
#[tokio::test]
async fn release_builds_use_their_own_registry_key() {
    let mut options = SourceOptions::new("blog");
    options.release_id = Some("R1".to_owned());
    let harness = Harness::new(options, Arc::new(FixtureSchemaRegistrar));

    harness
        .service
        .declare_schema(&[post_type()], &[])
        .await
        .expect("declare");
    assert!(harness.cache.load("blog:R1").await.expect("load").is_some());
    assert!(harness.cache.load("blog:master").await.expect("load").is_none());
}

#[rstest]
#[case(json!([1, 2]), IgnoreReason::NotAnObject)]
#[case(json!({ "secret": "wrong", "apiUrl": API_URL }), IgnoreReason::InvalidSecret)]
#[case(json!({ "secret": "s3cret", "type": "test-trigger", "apiUrl": API_URL }), IgnoreReason::TestTrigger)]
#[case(json!({ "secret": "s3cret", "apiUrl": "https://example.com/api" }), IgnoreReason::UnrecognisedSource)]
#[tokio::test]
async fn invalid_events_are_ignored_without_a_registry(#[case] body: Value, #[case] reason: IgnoreReason) {
    let mut options = SourceOptions::new("blog");
    options.webhook_secret = Some("s3cret".to_owned());
    let harness = Harness::new(options, Arc::new(FixtureSchemaRegistrar));

    let outcome = harness.service.handle_webhook(&body).await.expect("ignored");
    assert_eq!(outcome.status, WebhookStatus::Ignored(reason));
    assert_eq!(outcome.report, ReconciliationReport::default());
}

#[rstest]
#[tokio::test]
async fn webhook_applies_additions_and_deletions(harness: Harness) {
    harness
        .service
        .declare_schema(&[post_type()], &[])
        .await
        .expect("declare");
    harness
        .client
        .set_documents(vec![post("A", 0), post("B", 1)])
        .expect("serve");
    harness.service.source_all().await.expect("source");

    harness
        .client
        .set_documents(vec![post("A", 0), post("C", 0)])
        .expect("serve");
    let outcome = harness
        .service
        .handle_webhook(&json!({
            "type": "api-update",
            "apiUrl": API_URL,
            "documents": { "addition": ["C"], "deletion": [{ "id": "B" }] }
        }))
        .await
        .expect("processed");

    assert_eq!(outcome.status, WebhookStatus::Processed);
    assert_eq!(outcome.report.deleted, 1);
    assert_eq!(outcome.report.updated, 1);
    assert!(harness.store.get_node(&harness.node_id("B")).await.expect("get").is_none());
    assert!(harness.store.get_node(&harness.node_id("C")).await.expect("get").is_some());
    assert_eq!(harness.store.len().expect("len"), 2);
}
