//! In-memory node store.
//!
//! Node ids are UUIDv5 values in a namespace derived from the source name,
//! so the same source id always maps to the same node id across processes.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use serde_json::Value;
use uuid::Uuid;

use crate::domain::content_digest;
use crate::domain::ports::{NodeStore, NodeStoreError};
use crate::domain::{Node, NodeId};

/// Namespace seed for node ids.
const NODE_ID_NAMESPACE: &[u8] = b"prismic-source";

/// Map-backed [`NodeStore`].
#[derive(Debug)]
pub struct InMemoryNodeStore {
    namespace: Uuid,
    nodes: Mutex<BTreeMap<NodeId, Node>>,
}

impl Default for InMemoryNodeStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryNodeStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            namespace: Uuid::new_v5(&Uuid::NAMESPACE_URL, NODE_ID_NAMESPACE),
            nodes: Mutex::new(BTreeMap::new()),
        }
    }

    /// Snapshot of every stored node, ordered by id.
    ///
    /// # Errors
    ///
    /// Returns [`NodeStoreError::Read`] if the store lock is poisoned.
    pub fn nodes(&self) -> Result<Vec<Node>, NodeStoreError> {
        Ok(self
            .lock()
            .map_err(NodeStoreError::read)?
            .values()
            .cloned()
            .collect())
    }

    /// Number of stored nodes.
    ///
    /// # Errors
    ///
    /// Returns [`NodeStoreError::Read`] if the store lock is poisoned.
    pub fn len(&self) -> Result<usize, NodeStoreError> {
        Ok(self.lock().map_err(NodeStoreError::read)?.len())
    }

    fn lock(&self) -> Result<MutexGuard<'_, BTreeMap<NodeId, Node>>, String> {
        self.nodes
            .lock()
            .map_err(|_| "node store lock poisoned".to_owned())
    }
}

#[async_trait]
impl NodeStore for InMemoryNodeStore {
    async fn create_node(&self, node: Node) -> Result<(), NodeStoreError> {
        self.lock()
            .map_err(NodeStoreError::write)?
            .insert(node.id.clone(), node);
        Ok(())
    }

    async fn delete_node(&self, node: &Node) -> Result<(), NodeStoreError> {
        self.lock().map_err(NodeStoreError::delete)?.remove(&node.id);
        Ok(())
    }

    async fn get_node(&self, id: &NodeId) -> Result<Option<Node>, NodeStoreError> {
        Ok(self.lock().map_err(NodeStoreError::read)?.get(id).cloned())
    }

    fn create_node_id(&self, source_id: &str) -> NodeId {
        NodeId::new(Uuid::new_v5(&self.namespace, source_id.as_bytes()).to_string())
    }

    fn create_content_digest(&self, value: &Value) -> String {
        content_digest(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Map, json};

    fn node(store: &InMemoryNodeStore, source_id: &str) -> Node {
        Node {
            id: store.create_node_id(source_id),
            parent: None,
            children: Vec::new(),
            node_type: "PrismicPage".to_owned(),
            fields: Map::new(),
            content_digest: store.create_content_digest(&json!({ "id": source_id })),
        }
    }

    #[test]
    fn node_ids_are_deterministic_across_instances() {
        let first = InMemoryNodeStore::new();
        let second = InMemoryNodeStore::new();
        assert_eq!(first.create_node_id("XyZ1"), second.create_node_id("XyZ1"));
        assert_ne!(first.create_node_id("XyZ1"), first.create_node_id("XyZ2"));
    }

    #[tokio::test]
    async fn create_replaces_and_delete_removes() {
        let store = InMemoryNodeStore::new();
        let mut page = node(&store, "A");
        store.create_node(page.clone()).await.expect("create");
        page.node_type = "PrismicPost".to_owned();
        store.create_node(page.clone()).await.expect("replace");

        assert_eq!(store.len().expect("len"), 1);
        let stored = store.get_node(&page.id).await.expect("get");
        assert_eq!(stored.map(|found| found.node_type), Some("PrismicPost".to_owned()));

        store.delete_node(&page).await.expect("delete");
        assert!(store.get_node(&page.id).await.expect("get").is_none());
    }
}
