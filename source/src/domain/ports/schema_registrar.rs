//! Driven port for the host's schema customisation hook.

use async_trait::async_trait;

use super::define_port_error;
use crate::domain::TypeDescriptor;

define_port_error! {
    /// Errors raised while registering types with the host.
    pub enum SchemaRegistrarError {
        /// The host rejected a type definition.
        Rejected => "schema registration rejected",
    }
}

/// Port accepting type descriptors before any document is sourced.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SchemaRegistrar: Send + Sync {
    /// Register every descriptor with the host's type system.
    async fn register_types(&self, types: &[TypeDescriptor]) -> Result<(), SchemaRegistrarError>;
}

/// Registrar that accepts and discards descriptors.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixtureSchemaRegistrar;

#[async_trait]
impl SchemaRegistrar for FixtureSchemaRegistrar {
    async fn register_types(&self, _types: &[TypeDescriptor]) -> Result<(), SchemaRegistrarError> {
        Ok(())
    }
}
