//! Domain primitives, services, and ports.
//!
//! Purpose: keep every node derived from a remote document consistent with
//! a schema declared once, before any document is normalised.
//!
//! Public surface:
//! - `Error` / `ErrorCode`: transport-agnostic failures with stable codes.
//! - `TypePathRegistry`: append-only field-shape registry and its snapshot.
//! - `DocumentNormalizer`: documents to deterministic node sets.
//! - `DocumentFetcher`: paginated fetching.
//! - `webhook`: payload validation, planning, and reconciliation.
//! - `ContentSourcingService`: the phases wired to their ports.

pub mod custom_type;
pub mod declaration;
pub mod digest;
pub mod document;
pub mod error;
pub mod fetcher;
mod fields;
pub mod inference;
mod mapping;
pub mod node;
pub mod node_writer;
pub mod normalizer;
pub mod ports;
pub mod schema;
pub mod sourcing;
pub mod type_path;
pub mod webhook;

pub use self::custom_type::{CustomTypeDefinition, CustomTypeSchema, FieldSchema, NamedField};
pub use self::declaration::{SchemaDeclaration, declare_custom_types};
pub use self::digest::content_digest;
pub use self::document::{AlternateLanguage, Document};
pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::fetcher::{DocumentFetcher, QUERY_PAGE_SIZE};
pub use self::fields::SchemaWarning;
pub use self::inference::InferredShape;
pub use self::node::{Node, NodeId, NormalizedDocument};
pub use self::node_writer::NodeWriter;
pub use self::normalizer::DocumentNormalizer;
pub use self::schema::{FieldDefinition, SchemaBuilder, TYPE_NAME_ROOT, TypeDescriptor, TypeNaming};
pub use self::sourcing::{ContentSourcingService, SourcingPorts, SourcingReport};
pub use self::type_path::{
    FieldKind, REGISTRY_SNAPSHOT_VERSION, RegistrySnapshot, TypePath, TypePathConflict,
    TypePathEntry, TypePathRecord, TypePathRegistry,
};
pub use self::webhook::{WebhookOutcome, WebhookStatus};
