//! Driven port for persisting the type path registry between phases.
//!
//! Schema declaration and document sourcing may run in different processes
//! (cold build versus a webhook handler in a running server). The snapshot
//! written at the end of declaration is the only thing they share.

use async_trait::async_trait;

use super::define_port_error;
use crate::domain::RegistrySnapshot;

define_port_error! {
    /// Errors raised by the registry cache.
    pub enum TypePathCacheError {
        /// The snapshot could not be read.
        Read => "type path cache read failed",
        /// The snapshot could not be written.
        Write => "type path cache write failed",
        /// The stored snapshot is not valid JSON for a registry.
        Decode => "type path cache decode failed",
    }
}

/// Port for loading and storing registry snapshots by key.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TypePathCache: Send + Sync {
    /// Load the snapshot stored under `key`, if any.
    async fn load(&self, key: &str) -> Result<Option<RegistrySnapshot>, TypePathCacheError>;

    /// Store `snapshot` under `key`, replacing any previous snapshot.
    async fn store(&self, key: &str, snapshot: &RegistrySnapshot) -> Result<(), TypePathCacheError>;
}
