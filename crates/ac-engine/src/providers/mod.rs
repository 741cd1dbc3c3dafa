//! Resource type providers and the registry that maps types to them
//!
//! A provider knows how to enumerate candidates of one resource type and
//! how to turn a resource into the metric dimensions its alarms need.
//! Supporting a new type means registering one more provider.

mod arn;
mod rest_api;
mod tagged;

pub use rest_api::RestApiProvider;
pub use tagged::TaggedProvider;

use crate::error::{EngineError, EngineResult};
use ac_cloud::{CloudResult, ResourceCatalog, RetryPolicy};
use ac_core::{Resource, ResourceType, Tags};
use futures::stream::BoxStream;
use std::collections::BTreeMap;
use std::time::Duration;

/// Metric dimensions of one alarm, keyed by dimension name.
pub type Dimensions = BTreeMap<String, String>;

/// What a provider needs to issue listing calls.
#[derive(Clone, Copy)]
pub struct ListContext<'a> {
    pub catalog: &'a dyn ResourceCatalog,
    pub retry: &'a RetryPolicy,
    /// Pause before every page after the first
    pub pacing: Duration,
}

impl ListContext<'_> {
    pub(crate) async fn pace(&self, token: &Option<String>) {
        if token.is_some() && !self.pacing.is_zero() {
            tokio::time::sleep(self.pacing).await;
        }
    }
}

/// Capability set of one resource type.
pub trait ResourceProvider: Send + Sync {
    fn resource_type(&self) -> ResourceType;

    /// Namespace used when a selector does not set one.
    fn default_namespace(&self) -> &'static str;

    /// Lazily list candidate resources, every page fetched with retry.
    ///
    /// `tag_filter` may be applied server-side; callers still check tags.
    /// Each call starts a fresh listing.
    fn list_candidates<'a>(
        &'a self,
        ctx: ListContext<'a>,
        tag_filter: &'a Tags,
    ) -> BoxStream<'a, CloudResult<Resource>>;

    /// Dimensions identifying the resource's metrics. Pure.
    fn dimensions_for(&self, resource: &Resource) -> Dimensions;
}

/// Resource type to provider map, built once per run.
pub struct ProviderRegistry {
    providers: BTreeMap<ResourceType, Box<dyn ResourceProvider>>,
}

impl ProviderRegistry {
    /// Registry without providers.
    pub fn empty() -> Self {
        Self {
            providers: BTreeMap::new(),
        }
    }

    /// Registry with a provider for every supported resource type.
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        registry.register(Box::new(TaggedProvider::function()));
        registry.register(Box::new(TaggedProvider::state_machine()));
        registry.register(Box::new(RestApiProvider));
        registry.register(Box::new(TaggedProvider::topic()));
        registry.register(Box::new(TaggedProvider::queue()));
        registry.register(Box::new(TaggedProvider::rule()));
        registry.register(Box::new(TaggedProvider::http_api()));
        registry.register(Box::new(TaggedProvider::schedule_group()));
        registry
    }

    /// Add or replace the provider for its resource type.
    pub fn register(&mut self, provider: Box<dyn ResourceProvider>) {
        self.providers.insert(provider.resource_type(), provider);
    }

    pub fn get(&self, resource_type: ResourceType) -> EngineResult<&dyn ResourceProvider> {
        self.providers
            .get(&resource_type)
            .map(|p| p.as_ref())
            .ok_or(EngineError::NoProvider(resource_type))
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
