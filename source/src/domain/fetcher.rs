//! Query/fetch aggregator.
//!
//! Pages through the CMS client with an explicit loop until the reported
//! page count is reached, accumulating a flat, de-duplicated document list.
//! Callers never see page numbers or page sizes, and must not rely on the
//! order of the returned documents.

use std::collections::BTreeSet;

use tracing::debug;

use super::Document;
use super::Error;
use super::mapping::map_cms_error;
use super::ports::{CmsClient, QueryOptions};

/// Documents requested per page.
pub const QUERY_PAGE_SIZE: u32 = 100;

#[derive(Clone, Copy)]
enum Query<'q> {
    ByIds(&'q [String]),
    All,
}

/// Paginated document fetching over a [`CmsClient`].
#[derive(Clone, Copy)]
pub struct DocumentFetcher<'a> {
    client: &'a dyn CmsClient,
    base: &'a QueryOptions,
}

impl<'a> DocumentFetcher<'a> {
    /// Bind a fetcher to a client. `base` supplies language, fetch links,
    /// and release; its page fields are ignored.
    pub fn new(client: &'a dyn CmsClient, base: &'a QueryOptions) -> Self {
        Self { client, base }
    }

    /// Fetch every document whose id is listed.
    ///
    /// An empty id list returns an empty list without querying.
    ///
    /// # Errors
    ///
    /// Returns a service-unavailable error when any page fails, or a
    /// configuration error when the client reports bad credentials.
    pub async fn fetch_by_ids(&self, ids: &[String]) -> Result<Vec<Document>, Error> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        self.collect(Query::ByIds(ids)).await
    }

    /// Fetch every document in the repository (or release).
    ///
    /// # Errors
    ///
    /// As for [`DocumentFetcher::fetch_by_ids`].
    pub async fn fetch_all(&self) -> Result<Vec<Document>, Error> {
        self.collect(Query::All).await
    }

    async fn collect(&self, query: Query<'_>) -> Result<Vec<Document>, Error> {
        let mut documents = Vec::new();
        let mut seen = BTreeSet::new();
        let mut page = 1;
        loop {
            let options = QueryOptions {
                page,
                page_size: QUERY_PAGE_SIZE,
                ..self.base.clone()
            };
            let result = match query {
                Query::ByIds(ids) => self.client.get_by_ids(ids, &options).await,
                Query::All => self.client.query_all(&options).await,
            }
            .map_err(|error| map_cms_error(error, page))?;

            debug!(page, total_pages = result.total_pages, results = result.results.len(), "fetched page");
            for document in result.results {
                if seen.insert(document.id.clone()) {
                    documents.push(document);
                }
            }
            if page >= result.total_pages {
                break;
            }
            page += 1;
        }
        Ok(documents)
    }
}
