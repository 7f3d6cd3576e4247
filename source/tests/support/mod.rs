//! Shared fixtures for integration tests.

use prismic_source::domain::{CustomTypeDefinition, Document};

/// The `page` custom type from `fixtures/custom_types/page.json`.
pub fn page_type() -> CustomTypeDefinition {
    let json = serde_json::from_str(include_str!("../../fixtures/custom_types/page.json"))
        .expect("page custom type fixture parses");
    CustomTypeDefinition::new("page", json)
}

/// Fixture documents whose ids are listed, in fixture order.
pub fn documents(ids: &[&str]) -> Vec<Document> {
    let all: Vec<Document> = serde_json::from_str(include_str!("../../fixtures/documents.json"))
        .expect("document fixtures parse");
    all.into_iter()
        .filter(|document| ids.contains(&document.id.as_str()))
        .collect()
}
