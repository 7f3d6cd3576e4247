//! Content sourcing orchestration service.
//!
//! Owns the three phases and the persistence boundary between them:
//! - schema declaration writes the registry snapshot to the cache, then
//!   registers types with the host;
//! - full sourcing and webhook handling load the snapshot first and never
//!   write it.

use std::sync::Arc;

use serde_json::Value;
use tracing::{info, warn};

use super::custom_type::CustomTypeDefinition;
use super::declaration::{SchemaDeclaration, declare_custom_types};
use super::fetcher::DocumentFetcher;
use super::mapping::{map_cache_error, map_registrar_error};
use super::node_writer::NodeWriter;
use super::normalizer::DocumentNormalizer;
use super::ports::{CmsClient, NodeStore, SchemaRegistrar, TypePathCache};
use super::webhook::{WebhookOutcome, WebhookReconciler};
use super::{Document, Error, TypePathRegistry};
use crate::config::SourceOptions;

/// Driven adapters the service depends on.
#[derive(Clone)]
pub struct SourcingPorts {
    /// Remote CMS query client.
    pub client: Arc<dyn CmsClient>,
    /// Local node store.
    pub store: Arc<dyn NodeStore>,
    /// Registry snapshot cache.
    pub cache: Arc<dyn TypePathCache>,
    /// Host schema registration hook.
    pub registrar: Arc<dyn SchemaRegistrar>,
}

/// Counts reported by a full sourcing run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SourcingReport {
    /// Documents fetched and written.
    pub documents: usize,
}

/// Domain service running declaration, sourcing, and webhook phases.
#[derive(Clone)]
pub struct ContentSourcingService {
    ports: SourcingPorts,
    options: SourceOptions,
}

impl ContentSourcingService {
    /// Create a service.
    pub fn new(ports: SourcingPorts, options: SourceOptions) -> Self {
        Self { ports, options }
    }

    /// Configured options.
    pub fn options(&self) -> &SourceOptions {
        &self.options
    }

    /// Declare the schema for `custom_types`.
    ///
    /// `samples` are the documents available at declaration time; they only
    /// inform fields whose shape must be inferred. The registry snapshot is
    /// flushed to the cache before the types are handed to the host, so no
    /// later phase can observe types without the registry behind them.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for conflicting declarations or a
    /// rejected schema, and a service-unavailable error when the cache fails.
    pub async fn declare_schema(
        &self,
        custom_types: &[CustomTypeDefinition],
        samples: &[Document],
    ) -> Result<SchemaDeclaration, Error> {
        let declaration = declare_custom_types(&self.options.type_naming(), custom_types, samples)?;
        for warning in &declaration.warnings {
            warn!(type_path = %warning.path, "{}", warning.message);
        }

        let key = self.options.registry_cache_key();
        self.ports
            .cache
            .store(&key, &declaration.registry.to_snapshot())
            .await
            .map_err(map_cache_error)?;
        self.ports
            .registrar
            .register_types(&declaration.types)
            .await
            .map_err(map_registrar_error)?;

        info!(
            custom_types = custom_types.len(),
            types = declaration.types.len(),
            type_paths = declaration.registry.len(),
            warnings = declaration.warnings.len(),
            cache_key = %key,
            "declared schema"
        );
        Ok(declaration)
    }

    /// Load the registry written by the declaration phase.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when no snapshot exists for this
    /// repository and release, or the snapshot is unusable.
    pub async fn load_registry(&self) -> Result<TypePathRegistry, Error> {
        let key = self.options.registry_cache_key();
        let snapshot = self
            .ports
            .cache
            .load(&key)
            .await
            .map_err(map_cache_error)?
            .ok_or_else(|| {
                Error::configuration(format!(
                    "no type path registry cached under {key}; declare the schema first"
                ))
            })?;
        TypePathRegistry::from_snapshot(snapshot)
    }

    /// Fetch every document and write its nodes.
    ///
    /// # Errors
    ///
    /// Returns registry, fetch, normalisation, or store errors.
    pub async fn source_all(&self) -> Result<SourcingReport, Error> {
        let registry = self.load_registry().await?;
        let query = self.options.query_options();
        let documents = DocumentFetcher::new(self.ports.client.as_ref(), &query)
            .fetch_all()
            .await?;
        info!(documents = documents.len(), "fetched documents");

        let normalizer = self.normalizer(&registry);
        let written = NodeWriter::new(self.ports.store.as_ref())
            .write_documents(normalizer, documents)
            .await?;
        info!(documents = written, "sourced documents");
        Ok(SourcingReport { documents: written })
    }

    /// Reconcile one webhook event.
    ///
    /// Events failing validation are ignored without error and without
    /// loading the registry.
    ///
    /// # Errors
    ///
    /// Returns registry errors, and the fetch or store errors described by
    /// [`WebhookReconciler::apply`].
    pub async fn handle_webhook(&self, body: &Value) -> Result<WebhookOutcome, Error> {
        let secret = self.options.webhook_secret.as_deref();
        if let Err(reason) = super::webhook::parse_webhook(body, secret) {
            return Ok(WebhookOutcome::ignored(reason));
        }

        let registry = self.load_registry().await?;
        let query = self.options.query_options();
        let reconciler = WebhookReconciler::new(
            DocumentFetcher::new(self.ports.client.as_ref(), &query),
            self.normalizer(&registry),
            self.ports.store.as_ref(),
            secret,
            self.options.active_release(),
        );
        reconciler.handle(body).await
    }

    fn normalizer<'a>(&'a self, registry: &'a TypePathRegistry) -> DocumentNormalizer<'a> {
        DocumentNormalizer::new(
            registry,
            self.ports.store.as_ref(),
            self.options.link_resolver.as_deref(),
        )
    }
}

#[cfg(test)]
mod tests;
