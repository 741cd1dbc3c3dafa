//! Providers backed by the tagging API

use super::arn::NameRule;
use super::{Dimensions, ListContext, ResourceProvider};
use ac_cloud::{paginate, CloudResult, TaggedResource};
use ac_core::{Resource, ResourceType, Tags};
use futures::stream::{BoxStream, StreamExt, TryStreamExt};
use regex::Regex;
use std::sync::OnceLock;

/// Which part of the resource goes into the dimension value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DimensionValue {
    DisplayName,
    Arn,
}

/// A resource type listed through `GetResources` with a resource type filter.
#[derive(Debug, Clone)]
pub struct TaggedProvider {
    resource_type: ResourceType,
    namespace: &'static str,
    dimension: &'static str,
    value: DimensionValue,
    name_rule: NameRule,
    exclude: Option<fn() -> &'static Regex>,
}

fn api_stage_arn() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^arn:[^:]*:apigateway:[^:]*::/apis/[^/]*/stages/.*").expect("valid regex")
    })
}

impl TaggedProvider {
    fn new(
        resource_type: ResourceType,
        namespace: &'static str,
        dimension: &'static str,
        name_rule: NameRule,
    ) -> Self {
        Self {
            resource_type,
            namespace,
            dimension,
            value: DimensionValue::DisplayName,
            name_rule,
            exclude: None,
        }
    }

    pub fn function() -> Self {
        Self::new(
            ResourceType::Function,
            "AWS/Lambda",
            "FunctionName",
            NameRule::AfterResourceType,
        )
    }

    pub fn state_machine() -> Self {
        Self {
            value: DimensionValue::Arn,
            ..Self::new(
                ResourceType::StateMachine,
                "AWS/States",
                "StateMachineArn",
                NameRule::AfterResourceType,
            )
        }
    }

    pub fn topic() -> Self {
        Self::new(ResourceType::Topic, "AWS/SNS", "TopicName", NameRule::AfterAccount)
    }

    pub fn queue() -> Self {
        Self::new(ResourceType::Queue, "AWS/SQS", "QueueName", NameRule::AfterAccount)
    }

    pub fn rule() -> Self {
        Self::new(ResourceType::Rule, "AWS/Events", "RuleName", NameRule::AfterSlash)
    }

    /// HTTP and WebSocket APIs; stage ARNs share the type and are skipped.
    pub fn http_api() -> Self {
        Self {
            exclude: Some(api_stage_arn),
            ..Self::new(ResourceType::HttpApi, "AWS/ApiGateway", "ApiId", NameRule::AfterSlash)
        }
    }

    pub fn schedule_group() -> Self {
        Self::new(
            ResourceType::ScheduleGroup,
            "AWS/Scheduler",
            "ScheduleGroup",
            NameRule::AfterSlash,
        )
    }

    fn to_resource(&self, tagged: TaggedResource) -> Option<Resource> {
        if self.exclude.is_some_and(|re| re().is_match(&tagged.arn)) {
            return None;
        }
        let Some(name) = self.name_rule.display_name(&tagged.arn) else {
            log::warn!(
                "Skipping {} with unexpected ARN '{}'",
                self.resource_type,
                tagged.arn
            );
            return None;
        };
        Some(Resource {
            name: name.to_string(),
            id: tagged.arn,
            resource_type: self.resource_type,
            tags: tagged.tags,
        })
    }
}

impl ResourceProvider for TaggedProvider {
    fn resource_type(&self) -> ResourceType {
        self.resource_type
    }

    fn default_namespace(&self) -> &'static str {
        self.namespace
    }

    fn list_candidates<'a>(
        &'a self,
        ctx: ListContext<'a>,
        tag_filter: &'a Tags,
    ) -> BoxStream<'a, CloudResult<Resource>> {
        let resource_type = self.resource_type.as_str();
        paginate(move |token: Option<String>| async move {
            ctx.pace(&token).await;
            ctx.retry
                .run("GetResources", || {
                    ctx.catalog
                        .tagged_resources_page(resource_type, tag_filter, token.clone())
                })
                .await
        })
        .try_filter_map(move |tagged| futures::future::ready(Ok(self.to_resource(tagged))))
        .boxed()
    }

    fn dimensions_for(&self, resource: &Resource) -> Dimensions {
        let value = match self.value {
            DimensionValue::DisplayName => resource.name.clone(),
            DimensionValue::Arn => resource.id.clone(),
        };
        Dimensions::from([(self.dimension.to_string(), value)])
    }
}
