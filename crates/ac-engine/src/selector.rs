//! Resource selector: live resources matching each configured selector

use crate::error::{EngineError, EngineResult};
use crate::providers::{ListContext, ProviderRegistry};
use ac_cloud::{CloudClient, CloudError, RetryPolicy};
use ac_core::{Resource, ResourceType, Selector, SelectorId};
use futures::TryStreamExt;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

/// Discovery outcome of one selector
#[derive(Debug)]
pub struct SelectorMatch {
    pub selector: SelectorId,
    pub resource_type: ResourceType,
    /// Matched resources sorted by display name, or the discovery failure
    pub result: EngineResult<Vec<Resource>>,
}

/// Matches selectors against the live inventory.
#[derive(Clone)]
pub struct ResourceSelector {
    client: Arc<dyn CloudClient>,
    registry: Arc<ProviderRegistry>,
    retry: RetryPolicy,
    pacing: Duration,
    max_concurrency: usize,
}

impl ResourceSelector {
    pub fn new(
        client: Arc<dyn CloudClient>,
        registry: Arc<ProviderRegistry>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            client,
            registry,
            retry,
            pacing: Duration::ZERO,
            max_concurrency: 1,
        }
    }

    pub fn pacing(mut self, pacing: Duration) -> Self {
        self.pacing = pacing;
        self
    }

    pub fn max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }

    /// Resources currently matching one selector.
    pub async fn match_selector(&self, selector: &Selector) -> EngineResult<Vec<Resource>> {
        match_one(
            self.client.as_ref(),
            &self.registry,
            &self.retry,
            self.pacing,
            selector,
        )
        .await
    }

    /// Match every selector, at most `max_concurrency` at a time.
    ///
    /// One selector failing does not stop the others; results come back in
    /// selector order.
    pub async fn match_all(&self, selectors: &[Selector]) -> Vec<SelectorMatch> {
        let semaphore = Arc::new(Semaphore::new(self.max_concurrency));
        let mut handles = Vec::with_capacity(selectors.len());

        for selector in selectors {
            let selector = selector.clone();
            let client = Arc::clone(&self.client);
            let registry = Arc::clone(&self.registry);
            let retry = self.retry.clone();
            let pacing = self.pacing;
            let semaphore = Arc::clone(&semaphore);

            handles.push(tokio::spawn(async move {
                let _permit = semaphore.acquire().await;
                let result =
                    match_one(client.as_ref(), &registry, &retry, pacing, &selector).await;
                SelectorMatch {
                    selector: selector.id,
                    resource_type: selector.resource_type,
                    result,
                }
            }));
        }

        let mut matches = Vec::with_capacity(selectors.len());
        for (handle, selector) in handles.into_iter().zip(selectors) {
            let matched = handle.await.unwrap_or_else(|e| SelectorMatch {
                selector: selector.id.clone(),
                resource_type: selector.resource_type,
                result: Err(EngineError::Discovery {
                    selector: selector.id.to_string(),
                    source: CloudError::Internal(format!("discovery task failed: {}", e)),
                }),
            });
            matches.push(matched);
        }
        matches
    }
}

async fn match_one(
    client: &dyn CloudClient,
    registry: &ProviderRegistry,
    retry: &RetryPolicy,
    pacing: Duration,
    selector: &Selector,
) -> EngineResult<Vec<Resource>> {
    let provider = registry.get(selector.resource_type)?;
    let ctx = ListContext {
        catalog: client.as_catalog(),
        retry,
        pacing,
    };

    let candidates: Vec<Resource> = provider
        .list_candidates(ctx, &selector.tags)
        .try_collect()
        .await
        .map_err(|source| EngineError::Discovery {
            selector: selector.id.to_string(),
            source,
        })?;
    let candidate_count = candidates.len();

    let mut unique: BTreeMap<String, Resource> = BTreeMap::new();
    for resource in candidates {
        if selector.matches(&resource) {
            unique.entry(resource.id.clone()).or_insert(resource);
        }
    }

    let mut matched: Vec<Resource> = unique.into_values().collect();
    matched.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));

    log::debug!(
        "Selector '{}': {} candidate(s), {} matched",
        selector.id,
        candidate_count,
        matched.len()
    );
    Ok(matched)
}

#[cfg(test)]
#[path = "selector_test.rs"]
mod tests;
