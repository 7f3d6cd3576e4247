//! Content sourcing for a headless-CMS repository.
//!
//! The crate keeps a local graph of typed content nodes consistent with a
//! remote Prismic-style repository, on full builds and on webhook-triggered
//! incremental updates. It is organised as a small hexagon:
//!
//! - [`domain`] owns the type path registry, the per-field resolvers, the
//!   document normaliser, the fetch aggregator, the webhook reconciler, and
//!   the ports describing every external collaborator.
//! - [`outbound`] provides driven adapters (in-memory node store, in-memory
//!   and filesystem type path caches).
//! - [`config`] loads [`config::SourceSettings`] through OrthoConfig and turns
//!   them into validated [`config::SourceOptions`].

pub mod config;
pub mod domain;
pub mod outbound;

pub use config::{SourceOptions, SourceSettings};
pub use domain::{ContentSourcingService, Error, ErrorCode, SourcingPorts};
