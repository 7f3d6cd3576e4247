//! Locally normalised content nodes.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Deterministic node identifier.
///
/// Produced by [`crate::domain::ports::NodeStore::create_node_id`] from the
/// owning document id and the structural path, so re-normalising a document
/// always targets the same nodes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    /// Wrap an already-derived identifier.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Borrow the identifier.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AsRef<str> for NodeId {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

/// A normalised document or sub-structure of a document.
///
/// `fields` holds the node's data in schema order. References to child
/// nodes (group items, slices) are stored as node ids in `fields` and
/// mirrored in `children`, preserving authoring order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    /// Node identifier.
    pub id: NodeId,
    /// Owning node, if this is a child node.
    pub parent: Option<NodeId>,
    /// Owned child nodes in field order.
    pub children: Vec<NodeId>,
    /// Name of the schema type this node conforms to.
    pub node_type: String,
    /// Normalised field values.
    pub fields: Map<String, Value>,
    /// Digest of the raw content this node was produced from.
    pub content_digest: String,
}

/// The node set produced by normalising one document.
///
/// Child nodes are listed before the document node so a store that resolves
/// links eagerly never sees a dangling child reference.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedDocument {
    /// The top-level document node.
    pub node: Node,
    /// Group item and slice nodes owned by the document.
    pub children: Vec<Node>,
}

impl NormalizedDocument {
    /// Iterate over every node, children first.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.children.iter().chain(std::iter::once(&self.node))
    }

    /// Consume into a flat list, children first.
    pub fn into_nodes(self) -> Vec<Node> {
        let mut nodes = self.children;
        nodes.push(self.node);
        nodes
    }
}
