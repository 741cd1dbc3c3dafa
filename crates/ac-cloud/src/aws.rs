//! AWS implementation of the cloud traits
//!
//! Resources are listed through the Resource Groups Tagging API (and API
//! Gateway for REST APIs), alarms through CloudWatch. The SDK's own retry
//! layer is disabled; [`crate::RetryPolicy`] is the only retry loop.

use crate::error::{CloudError, CloudResult};
use crate::traits::{
    AlarmStore, Page, PutOptions, ResourceCatalog, RestApiSummary, TaggedResource,
};
use ac_core::{
    AlarmDefinition, AlarmName, ComparisonOperator, DesiredAlarmSpec, ExistingAlarm, Statistic,
    Tags, TreatMissingData,
};
use async_trait::async_trait;
use aws_config::retry::RetryConfig;
use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_sdk_cloudwatch::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_cloudwatch::types::{AlarmType, Dimension, MetricAlarm, Tag};
use aws_sdk_resourcegroupstagging::types::TagFilter;
use chrono::{DateTime, Utc};

const DESCRIBE_PAGE_SIZE: i32 = 100;
const REST_API_PAGE_SIZE: i32 = 500;

const THROTTLING_CODES: &[&str] = &[
    "Throttling",
    "ThrottlingException",
    "ThrottledException",
    "RequestThrottled",
    "RequestThrottledException",
    "TooManyRequestsException",
    "RequestLimitExceeded",
    "LimitExceededException",
    "SlowDown",
    "PriorRequestNotComplete",
];

const UNAVAILABLE_CODES: &[&str] = &[
    "ServiceUnavailable",
    "ServiceUnavailableException",
    "InternalFailure",
    "InternalServiceFault",
    "InternalServiceException",
    "InternalServerError",
    "InternalError",
];

const NOT_FOUND_CODES: &[&str] = &[
    "ResourceNotFound",
    "ResourceNotFoundException",
    "NotFoundException",
];

/// Where to point the AWS clients
#[derive(Debug, Clone, Default)]
pub struct AwsSettings {
    /// Overrides the region from the environment/profile
    pub region: Option<String>,
    /// Named profile from the shared config files
    pub profile: Option<String>,
}

/// Cloud backend talking to AWS
#[derive(Debug, Clone)]
pub struct AwsBackend {
    cloudwatch: aws_sdk_cloudwatch::Client,
    tagging: aws_sdk_resourcegroupstagging::Client,
    apigateway: aws_sdk_apigateway::Client,
}

impl AwsBackend {
    /// Load credentials and region from the standard provider chain.
    pub async fn connect(settings: &AwsSettings) -> Self {
        let mut loader =
            aws_config::defaults(BehaviorVersion::latest()).retry_config(RetryConfig::disabled());
        if let Some(region) = &settings.region {
            loader = loader.region(Region::new(region.clone()));
        }
        if let Some(profile) = &settings.profile {
            loader = loader.profile_name(profile);
        }
        let shared = loader.load().await;
        log::debug!(
            "AWS clients configured for region {}",
            shared
                .region()
                .map(|r| r.to_string())
                .unwrap_or_else(|| "<unset>".to_string())
        );
        Self::from_config(&shared)
    }

    /// Build clients from an already loaded SDK config.
    pub fn from_config(shared: &SdkConfig) -> Self {
        Self {
            cloudwatch: aws_sdk_cloudwatch::Client::new(shared),
            tagging: aws_sdk_resourcegroupstagging::Client::new(shared),
            apigateway: aws_sdk_apigateway::Client::new(shared),
        }
    }
}

#[async_trait]
impl ResourceCatalog for AwsBackend {
    async fn tagged_resources_page(
        &self,
        resource_type: &str,
        tag_filter: &Tags,
        token: Option<String>,
    ) -> CloudResult<Page<TaggedResource>> {
        let mut request = self
            .tagging
            .get_resources()
            .resource_type_filters(resource_type)
            .set_pagination_token(token);
        for (key, value) in tag_filter {
            request = request.tag_filters(TagFilter::builder().key(key).values(value).build());
        }

        let output = request
            .send()
            .await
            .map_err(|e| classify("tagging", e))?;

        let items = output
            .resource_tag_mapping_list()
            .iter()
            .filter_map(|mapping| {
                let arn = mapping.resource_arn()?;
                let tags = mapping
                    .tags()
                    .iter()
                    .map(|t| (t.key().to_string(), t.value().to_string()))
                    .collect();
                Some(TaggedResource {
                    arn: arn.to_string(),
                    tags,
                })
            })
            .collect();

        Ok(Page {
            items,
            next_token: non_empty(output.pagination_token()),
        })
    }

    async fn rest_apis_page(&self, token: Option<String>) -> CloudResult<Page<RestApiSummary>> {
        let output = self
            .apigateway
            .get_rest_apis()
            .set_position(token)
            .limit(REST_API_PAGE_SIZE)
            .send()
            .await
            .map_err(|e| classify("apigateway", e))?;

        let items = output
            .items()
            .iter()
            .filter_map(|api| {
                let id = api.id()?;
                Some(RestApiSummary {
                    id: id.to_string(),
                    name: api.name().unwrap_or(id).to_string(),
                    tags: api
                        .tags()
                        .map(|t| t.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
                        .unwrap_or_default(),
                })
            })
            .collect();

        Ok(Page {
            items,
            next_token: non_empty(output.position()),
        })
    }
}

#[async_trait]
impl AlarmStore for AwsBackend {
    async fn describe_alarms_page(
        &self,
        name_prefix: &str,
        token: Option<String>,
    ) -> CloudResult<Page<ExistingAlarm>> {
        let output = self
            .cloudwatch
            .describe_alarms()
            .alarm_name_prefix(name_prefix)
            .alarm_types(AlarmType::MetricAlarm)
            .max_records(DESCRIBE_PAGE_SIZE)
            .set_next_token(token)
            .send()
            .await
            .map_err(|e| classify("cloudwatch", e))?;

        let items = output
            .metric_alarms()
            .iter()
            .filter_map(existing_alarm)
            .collect();

        Ok(Page {
            items,
            next_token: non_empty(output.next_token()),
        })
    }

    async fn put_alarm(&self, spec: &DesiredAlarmSpec, options: &PutOptions) -> CloudResult<()> {
        let def = &spec.definition;
        let dimensions = def
            .dimensions
            .iter()
            .map(|(name, value)| Dimension::builder().name(name).value(value).build())
            .collect::<Vec<_>>();
        let tags = options
            .tags
            .iter()
            .map(|(key, value)| Tag::builder().key(key).value(value).build())
            .collect::<Vec<_>>();
        let actions =
            (!options.notification_arns.is_empty()).then(|| options.notification_arns.clone());

        self.cloudwatch
            .put_metric_alarm()
            .alarm_name(spec.name.as_str())
            .set_alarm_description(def.description.clone())
            .namespace(&def.namespace)
            .metric_name(&def.metric_name)
            .statistic(aws_sdk_cloudwatch::types::Statistic::from(
                def.statistic.as_str(),
            ))
            .set_dimensions(Some(dimensions))
            .period(def.period)
            .evaluation_periods(def.evaluation_periods)
            .set_datapoints_to_alarm(def.datapoints_to_alarm)
            .threshold(def.threshold)
            .comparison_operator(aws_sdk_cloudwatch::types::ComparisonOperator::from(
                def.comparison_operator.as_str(),
            ))
            .treat_missing_data(def.treat_missing_data.as_str())
            .set_tags((!tags.is_empty()).then_some(tags))
            .set_alarm_actions(actions.clone())
            .set_ok_actions(actions.clone())
            .set_insufficient_data_actions(actions)
            .send()
            .await
            .map_err(|e| classify("cloudwatch", e))?;
        Ok(())
    }

    async fn delete_alarms(&self, names: &[AlarmName]) -> CloudResult<()> {
        if names.is_empty() {
            return Ok(());
        }
        self.cloudwatch
            .delete_alarms()
            .set_alarm_names(Some(names.iter().map(|n| n.to_string()).collect()))
            .send()
            .await
            .map_err(|e| classify("cloudwatch", e))?;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "aws"
    }
}

fn non_empty(token: Option<&str>) -> Option<String> {
    token.filter(|t| !t.is_empty()).map(str::to_string)
}

fn existing_alarm(alarm: &MetricAlarm) -> Option<ExistingAlarm> {
    let name = match AlarmName::try_new(alarm.alarm_name()?) {
        Ok(name) => name,
        Err(reason) => {
            log::warn!("Skipping alarm with unusable name: {}", reason);
            return None;
        }
    };
    let definition = definition_of(alarm);
    if definition.is_none() {
        log::debug!("Alarm '{}' has no single-metric definition", name);
    }
    Some(ExistingAlarm {
        name,
        definition,
        updated_at: alarm
            .alarm_configuration_updated_timestamp()
            .and_then(|ts| DateTime::<Utc>::from_timestamp(ts.secs(), ts.subsec_nanos())),
    })
}

/// Reduce a stored alarm to the fields alarm-craft manages.
///
/// `None` for metric-math alarms, extended statistics and anything else
/// alarm-craft would never have written.
fn definition_of(alarm: &MetricAlarm) -> Option<AlarmDefinition> {
    Some(AlarmDefinition {
        namespace: alarm.namespace()?.to_string(),
        metric_name: alarm.metric_name()?.to_string(),
        dimensions: alarm
            .dimensions()
            .iter()
            .filter_map(|d| Some((d.name()?.to_string(), d.value()?.to_string())))
            .collect(),
        statistic: Statistic::from_api(alarm.statistic()?.as_str())?,
        period: alarm.period()?,
        evaluation_periods: alarm.evaluation_periods()?,
        datapoints_to_alarm: alarm.datapoints_to_alarm(),
        threshold: alarm.threshold()?,
        comparison_operator: ComparisonOperator::from_api(alarm.comparison_operator()?.as_str())?,
        treat_missing_data: alarm
            .treat_missing_data()
            .and_then(TreatMissingData::from_api)
            .unwrap_or(TreatMissingData::Missing),
        description: alarm
            .alarm_description()
            .filter(|d| !d.is_empty())
            .map(str::to_string),
    })
}

/// Map an SDK failure onto the retry-relevant error classes.
fn classify<E, R>(service: &str, err: SdkError<E, R>) -> CloudError
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
    R: std::fmt::Debug + Send + Sync + 'static,
{
    let message = DisplayErrorContext(&err).to_string();
    let service = service.to_string();
    match &err {
        SdkError::TimeoutError(_) | SdkError::DispatchFailure(_) | SdkError::ResponseError(_) => {
            CloudError::Transport { service, message }
        }
        SdkError::ServiceError(context) => {
            let code = context.err().code().unwrap_or("Unknown").to_string();
            let message = context
                .err()
                .message()
                .map(str::to_string)
                .unwrap_or(message);
            if THROTTLING_CODES.contains(&code.as_str()) {
                CloudError::Throttled { service, message }
            } else if UNAVAILABLE_CODES.contains(&code.as_str()) {
                CloudError::Unavailable { service, message }
            } else if NOT_FOUND_CODES.contains(&code.as_str()) {
                CloudError::NotFound { service, message }
            } else {
                CloudError::Rejected {
                    service,
                    code,
                    message,
                }
            }
        }
        _ => CloudError::Internal(message),
    }
}
