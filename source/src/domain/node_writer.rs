//! Applies normalised documents to the node store.
//!
//! Writes are create-or-replace keyed by deterministic node ids, so
//! replaying the same document is harmless. When a re-normalised document
//! owns fewer children than before, the children it no longer references
//! are deleted.

use std::collections::BTreeSet;

use futures_util::{StreamExt, stream};
use tracing::debug;

use super::mapping::map_store_error;
use super::normalizer::DocumentNormalizer;
use super::ports::NodeStore;
use super::{Document, Error, NodeId, NormalizedDocument};

/// Documents normalised and written concurrently.
pub const WRITE_CONCURRENCY: usize = 8;

/// Node-store writes for whole documents.
#[derive(Clone, Copy)]
pub struct NodeWriter<'a> {
    store: &'a dyn NodeStore,
}

impl<'a> NodeWriter<'a> {
    /// Wrap a node store.
    pub fn new(store: &'a dyn NodeStore) -> Self {
        Self { store }
    }

    /// Create or replace a document node and its children.
    ///
    /// Children are written before the document node.
    ///
    /// # Errors
    ///
    /// Returns a service-unavailable error when the store fails.
    pub async fn upsert(&self, normalized: NormalizedDocument) -> Result<(), Error> {
        let previous = self
            .store
            .get_node(&normalized.node.id)
            .await
            .map_err(map_store_error)?;
        if let Some(existing) = previous {
            let retained: BTreeSet<&NodeId> = normalized.node.children.iter().collect();
            for stale in existing.children.iter().filter(|id| !retained.contains(id)) {
                debug!(node_id = %stale, "removing stale child node");
                self.delete_if_present(stale).await?;
            }
        }

        for node in normalized.into_nodes() {
            self.store.create_node(node).await.map_err(map_store_error)?;
        }
        Ok(())
    }

    /// Normalise and write a batch of documents concurrently.
    ///
    /// Every document is attempted; the first failure is returned after the
    /// batch settles. Returns the number of documents written.
    ///
    /// # Errors
    ///
    /// Returns the normaliser's configuration errors or the store's
    /// service-unavailable errors.
    pub async fn write_documents(
        &self,
        normalizer: DocumentNormalizer<'_>,
        documents: Vec<Document>,
    ) -> Result<usize, Error> {
        let results: Vec<Result<(), Error>> = stream::iter(documents)
            .map(|document| async move {
                let normalized = normalizer.normalize(&document)?;
                self.upsert(normalized).await
            })
            .buffer_unordered(WRITE_CONCURRENCY)
            .collect()
            .await;
        let written = results.len();
        results.into_iter().collect::<Result<Vec<()>, Error>>()?;
        Ok(written)
    }

    /// Delete a document node and the child nodes it owns.
    ///
    /// Returns whether the document node existed.
    ///
    /// # Errors
    ///
    /// Returns a service-unavailable error when the store fails.
    pub async fn delete_document(&self, id: &NodeId) -> Result<bool, Error> {
        let Some(node) = self.store.get_node(id).await.map_err(map_store_error)? else {
            return Ok(false);
        };
        for child in &node.children {
            self.delete_if_present(child).await?;
        }
        self.store.delete_node(&node).await.map_err(map_store_error)?;
        Ok(true)
    }

    async fn delete_if_present(&self, id: &NodeId) -> Result<(), Error> {
        if let Some(node) = self.store.get_node(id).await.map_err(map_store_error)? {
            self.store.delete_node(&node).await.map_err(map_store_error)?;
        }
        Ok(())
    }
}
