//! Resource types and discovered resources

use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Tag set of a resource, or the required tags of a selector.
pub type Tags = BTreeMap<String, String>;

/// Supported resource categories.
///
/// The serialized form is the resource-type string used by the tagging API,
/// which is also what users write as `target_resource_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ResourceType {
    /// Lambda function
    #[serde(rename = "lambda:function")]
    Function,
    /// Step Functions state machine
    #[serde(rename = "states:stateMachine")]
    StateMachine,
    /// API Gateway REST API
    #[serde(rename = "apigateway:restapi")]
    RestApi,
    /// SNS topic
    #[serde(rename = "sns:topic")]
    Topic,
    /// SQS queue
    #[serde(rename = "sqs:queue")]
    Queue,
    /// EventBridge rule
    #[serde(rename = "events:rule")]
    Rule,
    /// API Gateway v2 HTTP or WebSocket API
    #[serde(rename = "apigateway:apis")]
    HttpApi,
    /// EventBridge Scheduler schedule group
    #[serde(rename = "scheduler:schedule-group")]
    ScheduleGroup,
}

impl ResourceType {
    /// Every supported type, in declaration order.
    pub const ALL: [ResourceType; 8] = [
        ResourceType::Function,
        ResourceType::StateMachine,
        ResourceType::RestApi,
        ResourceType::Topic,
        ResourceType::Queue,
        ResourceType::Rule,
        ResourceType::HttpApi,
        ResourceType::ScheduleGroup,
    ];

    /// The tagging-API resource type string.
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::Function => "lambda:function",
            ResourceType::StateMachine => "states:stateMachine",
            ResourceType::RestApi => "apigateway:restapi",
            ResourceType::Topic => "sns:topic",
            ResourceType::Queue => "sqs:queue",
            ResourceType::Rule => "events:rule",
            ResourceType::HttpApi => "apigateway:apis",
            ResourceType::ScheduleGroup => "scheduler:schedule-group",
        }
    }

    /// Comma-separated list of supported type strings, for error messages.
    pub fn supported() -> String {
        Self::ALL
            .iter()
            .map(|t| t.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| CoreError::UnknownResourceType {
                value: s.to_string(),
                supported: Self::supported(),
            })
    }
}

/// A live cloud object discovered by a provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    /// Provider-native identifier (ARN, or API id for REST APIs)
    pub id: String,

    /// Display name used in alarm names and name-pattern matching
    pub name: String,

    /// Category of the resource
    pub resource_type: ResourceType,

    /// Tags attached to the resource
    #[serde(default)]
    pub tags: Tags,
}

impl Resource {
    /// Create an untagged resource.
    pub fn new(id: impl Into<String>, name: impl Into<String>, resource_type: ResourceType) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            resource_type,
            tags: Tags::new(),
        }
    }

    /// Attach tags, replacing any already present.
    pub fn with_tags<K, V>(mut self, tags: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.tags = tags
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self
    }

    /// True when every required tag key is present with the required value.
    ///
    /// An empty requirement matches every resource.
    pub fn has_tags(&self, required: &Tags) -> bool {
        required
            .iter()
            .all(|(key, value)| self.tags.get(key) == Some(value))
    }
}

#[cfg(test)]
#[path = "resource_test.rs"]
mod tests;
