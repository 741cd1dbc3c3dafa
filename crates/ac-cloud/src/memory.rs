//! In-memory cloud backend with fault injection, for tests

use crate::error::{CloudError, CloudResult};
use crate::traits::{
    AlarmStore, Page, PutOptions, ResourceCatalog, RestApiSummary, TaggedResource,
};
use ac_core::{AlarmDefinition, AlarmName, DesiredAlarmSpec, ExistingAlarm, Tags};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::Mutex;

/// Operations a fault can be attached to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FaultTarget {
    /// Tagged listing of one resource type
    ListResources(String),
    ListRestApis,
    DescribeAlarms,
    /// Put of one alarm name
    PutAlarm(String),
    /// Any delete call that includes this alarm name
    DeleteAlarm(String),
    /// Any delete call naming more than one alarm
    DeleteBatch,
}

/// An injected failure
#[derive(Debug, Clone)]
pub struct Fault {
    target: FaultTarget,
    error: CloudError,
    /// `None` fails forever
    remaining: Option<usize>,
}

impl Fault {
    /// Fail every matching call with `error`.
    pub fn new(target: FaultTarget, error: CloudError) -> Self {
        Self {
            target,
            error,
            remaining: None,
        }
    }

    /// Fail only the next `n` matching calls.
    pub fn times(mut self, n: usize) -> Self {
        self.remaining = Some(n);
        self
    }
}

/// A throttling error as the alarm store would report it.
pub fn throttling_error() -> CloudError {
    CloudError::Throttled {
        service: "memory".to_string(),
        message: "Rate exceeded".to_string(),
    }
}

#[derive(Debug, Clone)]
struct StoredAlarm {
    definition: Option<AlarmDefinition>,
    options: PutOptions,
}

#[derive(Debug, Default)]
struct State {
    resources: Vec<(String, TaggedResource)>,
    rest_apis: Vec<RestApiSummary>,
    alarms: BTreeMap<String, StoredAlarm>,
    faults: Vec<Fault>,
    calls: Vec<String>,
}

/// Cloud backend holding resources and alarms in memory
#[derive(Debug)]
pub struct MemoryBackend {
    state: Mutex<State>,
    page_size: usize,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBackend {
    /// Empty backend with a page size of 2, so listings always paginate.
    pub fn new() -> Self {
        Self::with_page_size(2)
    }

    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            state: Mutex::new(State::default()),
            page_size: page_size.max(1),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|p| p.into_inner())
    }

    /// Register a resource under a tagging-API resource type.
    pub fn add_resource<K, V>(
        &self,
        resource_type: &str,
        arn: &str,
        tags: impl IntoIterator<Item = (K, V)>,
    ) where
        K: Into<String>,
        V: Into<String>,
    {
        let resource = TaggedResource {
            arn: arn.to_string(),
            tags: collect_tags(tags),
        };
        self.lock()
            .resources
            .push((resource_type.to_string(), resource));
    }

    /// Remove a resource by ARN, as if it had been deleted.
    pub fn remove_resource(&self, arn: &str) {
        self.lock().resources.retain(|(_, r)| r.arn != arn);
    }

    pub fn add_rest_api<K, V>(&self, id: &str, name: &str, tags: impl IntoIterator<Item = (K, V)>)
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.lock().rest_apis.push(RestApiSummary {
            id: id.to_string(),
            name: name.to_string(),
            tags: collect_tags(tags),
        });
    }

    /// Store an alarm directly, bypassing the put path.
    pub fn insert_alarm(&self, name: &str, definition: Option<AlarmDefinition>) {
        self.lock().alarms.insert(
            name.to_string(),
            StoredAlarm {
                definition,
                options: PutOptions::default(),
            },
        );
    }

    /// Remove an alarm directly, as an out-of-band delete would.
    pub fn remove_alarm(&self, name: &str) {
        self.lock().alarms.remove(name);
    }

    pub fn inject(&self, fault: Fault) {
        self.lock().faults.push(fault);
    }

    pub fn clear_faults(&self) {
        self.lock().faults.clear();
    }

    /// All stored alarm names, sorted.
    pub fn alarm_names(&self) -> Vec<String> {
        self.lock().alarms.keys().cloned().collect()
    }

    pub fn alarm(&self, name: &str) -> Option<AlarmDefinition> {
        self.lock()
            .alarms
            .get(name)
            .and_then(|a| a.definition.clone())
    }

    pub fn alarm_tags(&self, name: &str) -> Option<Tags> {
        self.lock().alarms.get(name).map(|a| a.options.tags.clone())
    }

    pub fn alarm_actions(&self, name: &str) -> Option<Vec<String>> {
        self.lock()
            .alarms
            .get(name)
            .map(|a| a.options.notification_arns.clone())
    }

    /// Number of calls made to an operation, e.g. `"PutMetricAlarm"`.
    pub fn call_count(&self, operation: &str) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|c| c.as_str() == operation)
            .count()
    }

    /// Record the call and return the injected error, if a fault matches.
    fn check(&self, operation: &str, matches: impl Fn(&FaultTarget) -> bool) -> CloudResult<()> {
        let mut state = self.lock();
        state.calls.push(operation.to_string());
        let Some(index) = state
            .faults
            .iter()
            .position(|f| f.remaining != Some(0) && matches(&f.target))
        else {
            return Ok(());
        };
        let fault = &mut state.faults[index];
        if let Some(n) = fault.remaining.as_mut() {
            *n -= 1;
        }
        Err(fault.error.clone())
    }

    fn page<T: Clone>(&self, items: &[T], token: Option<String>) -> CloudResult<Page<T>> {
        let start = match token {
            Some(t) => t
                .parse::<usize>()
                .map_err(|_| CloudError::Internal(format!("bad page token '{}'", t)))?,
            None => 0,
        };
        let end = (start + self.page_size).min(items.len());
        let items_page = items.get(start..end).unwrap_or_default().to_vec();
        let next_token = (end < items.len()).then(|| end.to_string());
        Ok(Page {
            items: items_page,
            next_token,
        })
    }
}

fn collect_tags<K, V>(tags: impl IntoIterator<Item = (K, V)>) -> Tags
where
    K: Into<String>,
    V: Into<String>,
{
    tags.into_iter().map(|(k, v)| (k.into(), v.into())).collect()
}

#[async_trait]
impl ResourceCatalog for MemoryBackend {
    async fn tagged_resources_page(
        &self,
        resource_type: &str,
        tag_filter: &Tags,
        token: Option<String>,
    ) -> CloudResult<Page<TaggedResource>> {
        self.check("GetResources", |t| {
            matches!(t, FaultTarget::ListResources(rt) if rt == resource_type)
        })?;
        let matching: Vec<TaggedResource> = self
            .lock()
            .resources
            .iter()
            .filter(|(rt, r)| {
                rt == resource_type
                    && tag_filter
                        .iter()
                        .all(|(k, v)| r.tags.get(k) == Some(v))
            })
            .map(|(_, r)| r.clone())
            .collect();
        self.page(&matching, token)
    }

    async fn rest_apis_page(&self, token: Option<String>) -> CloudResult<Page<RestApiSummary>> {
        self.check("GetRestApis", |t| matches!(t, FaultTarget::ListRestApis))?;
        let apis = self.lock().rest_apis.clone();
        self.page(&apis, token)
    }
}

#[async_trait]
impl AlarmStore for MemoryBackend {
    async fn describe_alarms_page(
        &self,
        name_prefix: &str,
        token: Option<String>,
    ) -> CloudResult<Page<ExistingAlarm>> {
        self.check("DescribeAlarms", |t| matches!(t, FaultTarget::DescribeAlarms))?;
        let alarms: Vec<ExistingAlarm> = self
            .lock()
            .alarms
            .iter()
            .filter(|(name, _)| name.starts_with(name_prefix))
            .filter_map(|(name, stored)| {
                Some(ExistingAlarm {
                    name: AlarmName::try_new(name.clone()).ok()?,
                    definition: stored.definition.clone(),
                    updated_at: Some(Utc::now()),
                })
            })
            .collect();
        self.page(&alarms, token)
    }

    async fn put_alarm(&self, spec: &DesiredAlarmSpec, options: &PutOptions) -> CloudResult<()> {
        self.check("PutMetricAlarm", |t| {
            matches!(t, FaultTarget::PutAlarm(name) if spec.name == name.as_str())
        })?;
        self.lock().alarms.insert(
            spec.name.to_string(),
            StoredAlarm {
                definition: Some(spec.definition.clone()),
                options: options.clone(),
            },
        );
        Ok(())
    }

    async fn delete_alarms(&self, names: &[AlarmName]) -> CloudResult<()> {
        self.check("DeleteAlarms", |t| match t {
            FaultTarget::DeleteAlarm(name) => names.iter().any(|n| n == name.as_str()),
            FaultTarget::DeleteBatch => names.len() > 1,
            _ => false,
        })?;
        let mut state = self.lock();
        if let Some(missing) = names.iter().find(|n| !state.alarms.contains_key(n.as_str())) {
            return Err(CloudError::NotFound {
                service: "memory".to_string(),
                message: format!("alarm '{}' does not exist", missing),
            });
        }
        for name in names {
            state.alarms.remove(name.as_str());
        }
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
#[path = "memory_test.rs"]
mod tests;
