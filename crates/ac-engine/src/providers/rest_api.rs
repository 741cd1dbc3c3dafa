//! REST API provider
//!
//! REST APIs are listed through API Gateway rather than the tagging API,
//! and their metrics are keyed by API name.

use super::{Dimensions, ListContext, ResourceProvider};
use ac_cloud::{paginate, CloudResult};
use ac_core::{Resource, ResourceType, Tags};
use futures::stream::{BoxStream, StreamExt, TryStreamExt};

#[derive(Debug, Clone, Copy, Default)]
pub struct RestApiProvider;

impl ResourceProvider for RestApiProvider {
    fn resource_type(&self) -> ResourceType {
        ResourceType::RestApi
    }

    fn default_namespace(&self) -> &'static str {
        "AWS/ApiGateway"
    }

    fn list_candidates<'a>(
        &'a self,
        ctx: ListContext<'a>,
        tag_filter: &'a Tags,
    ) -> BoxStream<'a, CloudResult<Resource>> {
        paginate(move |token: Option<String>| async move {
            ctx.pace(&token).await;
            ctx.retry
                .run("GetRestApis", || ctx.catalog.rest_apis_page(token.clone()))
                .await
        })
        .try_filter_map(move |api| {
            let candidate = Resource {
                id: api.id,
                name: api.name,
                resource_type: ResourceType::RestApi,
                tags: api.tags,
            };
            let keep = candidate.has_tags(tag_filter);
            futures::future::ready(Ok(keep.then_some(candidate)))
        })
        .boxed()
    }

    fn dimensions_for(&self, resource: &Resource) -> Dimensions {
        Dimensions::from([("ApiName".to_string(), resource.name.clone())])
    }
}
