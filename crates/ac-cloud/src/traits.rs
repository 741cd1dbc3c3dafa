//! Cloud client capability traits

use crate::error::CloudResult;
use ac_core::{AlarmName, DesiredAlarmSpec, ExistingAlarm, Tags};
use async_trait::async_trait;

/// One page of a paginated listing.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Token for the next page; `None` on the last page
    pub next_token: Option<String>,
}

impl<T> Page<T> {
    pub fn last(items: Vec<T>) -> Self {
        Self {
            items,
            next_token: None,
        }
    }
}

/// A resource as reported by the tagging API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggedResource {
    pub arn: String,
    pub tags: Tags,
}

/// A REST API as reported by API Gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestApiSummary {
    pub id: String,
    pub name: String,
    pub tags: Tags,
}

/// What a put attaches besides the compared alarm definition
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PutOptions {
    pub tags: Tags,

    /// Topics notified on ALARM, OK and INSUFFICIENT_DATA transitions
    pub notification_arns: Vec<String>,
}

/// Read access to the resource inventory.
///
/// Implementations must be Send + Sync for async operation.
#[async_trait]
pub trait ResourceCatalog: Send + Sync {
    /// One page of resources of a tagging-API resource type.
    ///
    /// Every entry of `tag_filter` must match (key and value).
    async fn tagged_resources_page(
        &self,
        resource_type: &str,
        tag_filter: &Tags,
        token: Option<String>,
    ) -> CloudResult<Page<TaggedResource>>;

    /// One page of REST APIs with their tags.
    async fn rest_apis_page(&self, token: Option<String>) -> CloudResult<Page<RestApiSummary>>;
}

/// Read/write access to the metric alarm store.
#[async_trait]
pub trait AlarmStore: Send + Sync {
    /// One page of metric alarms whose name starts with `name_prefix`.
    async fn describe_alarms_page(
        &self,
        name_prefix: &str,
        token: Option<String>,
    ) -> CloudResult<Page<ExistingAlarm>>;

    /// Create or replace an alarm.
    async fn put_alarm(&self, spec: &DesiredAlarmSpec, options: &PutOptions) -> CloudResult<()>;

    /// Delete up to [`MAX_DELETE_BATCH`] alarms in one call.
    ///
    /// Fails with [`CloudError::NotFound`](crate::CloudError::NotFound) when
    /// any name is missing.
    async fn delete_alarms(&self, names: &[AlarmName]) -> CloudResult<()>;

    /// Backend identifier for logging
    fn backend_name(&self) -> &'static str;
}

/// Largest number of names a single delete call accepts.
pub const MAX_DELETE_BATCH: usize = 100;

/// Everything the engine needs from the cloud.
pub trait CloudClient: ResourceCatalog + AlarmStore {
    fn as_catalog(&self) -> &dyn ResourceCatalog;

    fn as_store(&self) -> &dyn AlarmStore;
}

impl<T: ResourceCatalog + AlarmStore> CloudClient for T {
    fn as_catalog(&self) -> &dyn ResourceCatalog {
        self
    }

    fn as_store(&self) -> &dyn AlarmStore {
        self
    }
}
