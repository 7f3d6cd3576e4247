//! Driven port for the host's local node store.
//!
//! The store owns node persistence and identity. Node ids must be derived
//! deterministically from their source string so that re-normalising a
//! document replaces, rather than duplicates, its nodes.

use async_trait::async_trait;
use serde_json::Value;

use super::define_port_error;
use crate::domain::{Node, NodeId};

define_port_error! {
    /// Errors raised by the node store.
    pub enum NodeStoreError {
        /// The node could not be written.
        Write => "node store write failed",
        /// The node could not be removed.
        Delete => "node store delete failed",
        /// The node could not be read.
        Read => "node store read failed",
    }
}

/// Port for creating, replacing, reading, and deleting nodes.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NodeStore: Send + Sync {
    /// Create a node, replacing any node with the same id.
    async fn create_node(&self, node: Node) -> Result<(), NodeStoreError>;

    /// Delete a node.
    async fn delete_node(&self, node: &Node) -> Result<(), NodeStoreError>;

    /// Fetch a node by id.
    async fn get_node(&self, id: &NodeId) -> Result<Option<Node>, NodeStoreError>;

    /// Derive a node id from a source identifier. Must be deterministic.
    fn create_node_id(&self, source_id: &str) -> NodeId;

    /// Digest of a JSON value. Must be deterministic.
    fn create_content_digest(&self, value: &Value) -> String;
}
