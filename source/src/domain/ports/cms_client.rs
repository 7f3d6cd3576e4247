//! Driven port for the remote CMS query API.
//!
//! The client owns authentication, ref resolution (master or release), and
//! transport retries. The domain only asks for one page at a time.

use async_trait::async_trait;

use super::define_port_error;
use crate::domain::Document;

/// Options for one page request.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QueryOptions {
    /// One-based page number.
    pub page: u32,
    /// Documents per page.
    pub page_size: u32,
    /// Language filter; all languages when `None`.
    pub lang: Option<String>,
    /// Linked-document fields to denormalise into link values.
    pub fetch_links: Vec<String>,
    /// Release to read from; the master ref when `None`.
    pub release_id: Option<String>,
}

/// One page of query results.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct QueryPage {
    /// Documents on this page.
    pub results: Vec<Document>,
    /// Page number reported by the API.
    pub page: u32,
    /// Total page count reported by the API.
    pub total_pages: u32,
}

define_port_error! {
    /// Errors surfaced while querying the CMS.
    pub enum CmsClientError {
        /// Network transport failed.
        Transport => "cms transport failed",
        /// The API rejected the credentials or ref.
        Unauthorized => "cms request unauthorized",
        /// The response could not be decoded.
        Decode => "cms response decode failed",
    }
}

/// Port for paginated document queries.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CmsClient: Send + Sync {
    /// Fetch one page of the documents whose ids are listed.
    async fn get_by_ids(
        &self,
        ids: &[String],
        options: &QueryOptions,
    ) -> Result<QueryPage, CmsClientError>;

    /// Fetch one page of every document in the repository.
    async fn query_all(&self, options: &QueryOptions) -> Result<QueryPage, CmsClientError>;
}

/// Fixture client serving a fixed, in-memory repository.
///
/// Pages are cut by `page_size`; a zero page size serves everything on one
/// page. Documents can be replaced between calls to simulate publishing.
#[derive(Debug, Default)]
pub struct FixtureCmsClient {
    documents: std::sync::RwLock<Vec<Document>>,
}

impl FixtureCmsClient {
    /// Serve `documents`.
    pub fn with_documents(documents: Vec<Document>) -> Self {
        Self {
            documents: std::sync::RwLock::new(documents),
        }
    }

    /// Replace the served documents.
    ///
    /// # Errors
    ///
    /// Returns [`CmsClientError::Transport`] if the fixture lock is poisoned.
    pub fn set_documents(&self, documents: Vec<Document>) -> Result<(), CmsClientError> {
        let mut served = self
            .documents
            .write()
            .map_err(|_| CmsClientError::transport("fixture repository lock poisoned"))?;
        *served = documents;
        Ok(())
    }

    fn page_of(
        &self,
        options: &QueryOptions,
        keep: impl Fn(&Document) -> bool,
    ) -> Result<QueryPage, CmsClientError> {
        let served = self
            .documents
            .read()
            .map_err(|_| CmsClientError::transport("fixture repository lock poisoned"))?;
        let matching: Vec<&Document> = served.iter().filter(|document| keep(document)).collect();
        let page = options.page.max(1);
        let Some(page_size) = usize::try_from(options.page_size).ok().filter(|size| *size > 0) else {
            return Ok(QueryPage {
                results: matching.into_iter().cloned().collect(),
                page,
                total_pages: 1,
            });
        };
        let total_pages = u32::try_from(matching.len().div_ceil(page_size))
            .map_err(|_| CmsClientError::decode("fixture repository too large"))?
            .max(1);
        let skip = usize::try_from(page - 1).unwrap_or(usize::MAX).saturating_mul(page_size);
        Ok(QueryPage {
            results: matching.into_iter().skip(skip).take(page_size).cloned().collect(),
            page,
            total_pages,
        })
    }
}

#[async_trait]
impl CmsClient for FixtureCmsClient {
    async fn get_by_ids(
        &self,
        ids: &[String],
        options: &QueryOptions,
    ) -> Result<QueryPage, CmsClientError> {
        self.page_of(options, |document| ids.contains(&document.id))
    }

    async fn query_all(&self, options: &QueryOptions) -> Result<QueryPage, CmsClientError> {
        self.page_of(options, |_| true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn document(id: &str) -> Document {
        serde_json::from_value(json!({ "id": id, "type": "page" })).expect("document fixture")
    }

    #[tokio::test]
    async fn fixture_pages_by_page_size() {
        let client = FixtureCmsClient::with_documents(["A", "B", "C"].map(document).to_vec());
        let options = QueryOptions {
            page: 2,
            page_size: 2,
            ..QueryOptions::default()
        };
        let page = client.query_all(&options).await.expect("page");
        assert_eq!(page.total_pages, 2);
        assert_eq!(page.results, vec![document("C")]);
    }

    #[tokio::test]
    async fn fixture_serves_only_requested_ids() {
        let client = FixtureCmsClient::with_documents(["A", "B"].map(document).to_vec());
        let page = client
            .get_by_ids(&["B".to_owned(), "Z".to_owned()], &QueryOptions::default())
            .await
            .expect("page");
        assert_eq!(page.results, vec![document("B")]);
        assert_eq!(page.total_pages, 1);
    }
}
