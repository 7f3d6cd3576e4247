//! The type path registry written by one process drives sourcing in another.
//!
//! Declaration and sourcing run through separate service instances that
//! share nothing but a cache directory, as a cold build and a webhook
//! handler in a long-running server would.

use std::sync::Arc;

use camino::Utf8PathBuf;
use prismic_source::domain::ErrorCode;
use prismic_source::domain::ports::{FixtureCmsClient, FixtureSchemaRegistrar, LinkTarget, NodeStore};
use prismic_source::outbound::{FsTypePathCache, InMemoryNodeStore};
use prismic_source::{ContentSourcingService, SourceOptions, SourcingPorts};
use rstest::{fixture, rstest};
use tempfile::TempDir;

mod support;

struct CacheDir {
    _temp: TempDir,
    path: Utf8PathBuf,
}

#[fixture]
fn cache_dir() -> CacheDir {
    let temp = TempDir::new().expect("temp dir");
    let path = Utf8PathBuf::from_path_buf(temp.path().join("cache")).expect("utf-8 temp path");
    CacheDir { _temp: temp, path }
}

fn service(
    cache_dir: &CacheDir,
    client: Arc<FixtureCmsClient>,
    store: Arc<InMemoryNodeStore>,
) -> ContentSourcingService {
    let cache = FsTypePathCache::open(&cache_dir.path).expect("open cache");
    let options = SourceOptions::new("blog")
        .with_link_resolver(|target: &LinkTarget| target.uid.as_ref().map(|uid| format!("/{uid}")));
    ContentSourcingService::new(
        SourcingPorts {
            client,
            store,
            cache: Arc::new(cache),
            registrar: Arc::new(FixtureSchemaRegistrar),
        },
        options,
    )
}

#[rstest]
#[tokio::test]
async fn sourcing_reads_the_registry_declared_elsewhere(cache_dir: CacheDir) {
    let declaring = service(
        &cache_dir,
        Arc::new(FixtureCmsClient::default()),
        Arc::new(InMemoryNodeStore::new()),
    );
    declaring
        .declare_schema(&[support::page_type()], &[])
        .await
        .expect("declare schema");

    let store = Arc::new(InMemoryNodeStore::new());
    let client = Arc::new(FixtureCmsClient::with_documents(support::documents(&["A", "B", "C"])));
    let sourcing = service(&cache_dir, client, store.clone());
    let report = sourcing.source_all().await.expect("source");
    assert_eq!(report.documents, 3);
    assert_eq!(store.len().expect("len"), 6);

    let home = store
        .get_node(&store.create_node_id("A"))
        .await
        .expect("read")
        .expect("home node");
    assert_eq!(home.fields["url"], "/home");
    assert_eq!(home.fields["data"]["related"]["url"], "/about");
    assert_eq!(
        home.fields["data"]["related"]["document"],
        store.create_node_id("B").to_string()
    );
    assert_eq!(home.fields["data"]["hero"]["thumbnails"]["mobile"]["dimensions"]["width"], 640);

    let text_slice = store
        .get_node(&home.children[0])
        .await
        .expect("read")
        .expect("text slice node");
    assert_eq!(text_slice.node_type, "PrismicPageBodyText");
    assert_eq!(
        text_slice.fields["primary"]["content"]["html"],
        r#"<p>Read <a href="/about">about us</a>.</p>"#
    );
}

#[rstest]
#[tokio::test]
async fn sourcing_without_a_declared_registry_fails(cache_dir: CacheDir) {
    let sourcing = service(
        &cache_dir,
        Arc::new(FixtureCmsClient::with_documents(support::documents(&["A"]))),
        Arc::new(InMemoryNodeStore::new()),
    );
    let error = sourcing.source_all().await.expect_err("no registry");
    assert_eq!(error.code(), ErrorCode::Configuration);
}
