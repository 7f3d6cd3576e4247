//! Domain ports and supporting types for the hexagonal boundary.
//!
//! Ports describe how the domain expects to interact with its collaborators
//! (node store, remote CMS, host schema hook, registry cache). Each trait
//! exposes strongly typed errors so adapters map their failures into
//! predictable variants.

mod macros;
pub(crate) use macros::define_port_error;

mod cms_client;
mod link_resolver;
mod node_store;
mod schema_registrar;
mod type_path_cache;

#[cfg(test)]
pub use cms_client::MockCmsClient;
pub use cms_client::{CmsClient, CmsClientError, FixtureCmsClient, QueryOptions, QueryPage};
pub use link_resolver::{LinkResolver, LinkTarget};
#[cfg(test)]
pub use node_store::MockNodeStore;
pub use node_store::{NodeStore, NodeStoreError};
#[cfg(test)]
pub use schema_registrar::MockSchemaRegistrar;
pub use schema_registrar::{FixtureSchemaRegistrar, SchemaRegistrar, SchemaRegistrarError};
#[cfg(test)]
pub use type_path_cache::MockTypePathCache;
pub use type_path_cache::{TypePathCache, TypePathCacheError};
