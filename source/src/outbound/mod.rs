//! Outbound adapters implementing domain ports.
//!
//! - **memory_node_store**: map-backed node store with deterministic ids
//! - **memory_type_path_cache**: process-local registry snapshots
//! - **fs_type_path_cache**: registry snapshots as JSON files, written
//!   atomically through a capability-scoped directory
//!
//! Adapters translate between domain types and storage. They contain no
//! sourcing logic.

mod atomic_io;
pub mod fs_type_path_cache;
pub mod memory_node_store;
pub mod memory_type_path_cache;

pub use fs_type_path_cache::FsTypePathCache;
pub use memory_node_store::InMemoryNodeStore;
pub use memory_type_path_cache::InMemoryTypePathCache;
