//! Configuration types and parsing for alarm-config.yaml

use crate::alarm::AlarmParams;
use crate::error::{CoreError, CoreResult};
use crate::names::{AlarmNaming, SelectorId, DEFAULT_ALARM_NAME_PREFIX};
use crate::resource::{ResourceType, Tags};
use crate::selector::{AlarmTemplate, MetricTemplate, Selector};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

/// File names probed, in order, when no config path is given.
pub const DEFAULT_CONFIG_FILES: [&str; 3] =
    ["alarm-config.yaml", "alarm-config.yml", "alarm-config.json"];

/// Main configuration from alarm-config.yaml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Settings shared by every selector
    #[serde(default)]
    pub globals: GlobalsConfig,

    /// Selectors keyed by id, in file order
    #[serde(default)]
    pub resources: IndexMap<SelectorId, ResourceConfig>,
}

/// The `globals:` section
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GlobalsConfig {
    #[serde(default)]
    pub alarm: GlobalAlarmConfig,

    /// Filter merged into every resource entry
    #[serde(default)]
    pub resource_filter: ResourceFilter,

    /// Pause between consecutive cloud calls of one worker
    #[serde(default = "default_api_call_interval_ms")]
    pub api_call_interval_ms: u64,

    /// Worker pool size for discovery and apply
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    /// Retries per cloud call after the first attempt
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

impl Default for GlobalsConfig {
    fn default() -> Self {
        Self {
            alarm: GlobalAlarmConfig::default(),
            resource_filter: ResourceFilter::default(),
            api_call_interval_ms: default_api_call_interval_ms(),
            max_concurrency: default_max_concurrency(),
            max_retries: default_max_retries(),
        }
    }
}

fn default_api_call_interval_ms() -> u64 {
    334
}

fn default_max_concurrency() -> usize {
    4
}

fn default_max_retries() -> u32 {
    5
}

/// The `globals.alarm:` section
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GlobalAlarmConfig {
    #[serde(default = "default_alarm_name_prefix")]
    pub alarm_name_prefix: String,

    /// Layered over the built-in defaults
    #[serde(default)]
    pub default_alarm_params: AlarmParams,

    /// Tags attached to every alarm alarm-craft puts
    #[serde(default)]
    pub alarm_tags: Tags,

    /// SNS topics notified on every state change of every alarm
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notification_topic_arns: Vec<String>,
}

impl Default for GlobalAlarmConfig {
    fn default() -> Self {
        Self {
            alarm_name_prefix: default_alarm_name_prefix(),
            default_alarm_params: AlarmParams::default(),
            alarm_tags: Tags::new(),
            notification_topic_arns: Vec::new(),
        }
    }
}

fn default_alarm_name_prefix() -> String {
    DEFAULT_ALARM_NAME_PREFIX.to_string()
}

/// Name/tag filter shared by all selectors
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResourceFilter {
    #[serde(default)]
    pub target_resource_name_pattern: Option<String>,

    #[serde(default)]
    pub target_resource_tags: Tags,
}

/// One entry under `resources:`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResourceConfig {
    pub target_resource_type: ResourceType,

    #[serde(default)]
    pub target_resource_name_pattern: Option<String>,

    #[serde(default)]
    pub target_resource_tags: Tags,

    pub alarm: ResourceAlarmConfig,
}

/// The `alarm:` block of a resource entry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResourceAlarmConfig {
    /// Overrides the provider's default namespace
    #[serde(default)]
    pub namespace: Option<String>,

    pub metrics: Vec<String>,

    /// Per-metric parameter overrides
    #[serde(default)]
    pub alarm_param_overrides: BTreeMap<String, AlarmParams>,
}

impl Config {
    /// Load and validate configuration from a file.
    ///
    /// `.json` files are parsed as JSON, everything else as YAML.
    pub fn load(path: &Path) -> CoreResult<Self> {
        if !path.exists() {
            return Err(CoreError::ConfigNotFound {
                path: path.display().to_string(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| CoreError::IoWithPath {
            path: path.display().to_string(),
            source: e,
        })?;

        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));
        let parsed = if is_json {
            serde_json::from_str::<Config>(&content).map_err(|e| e.to_string())
        } else {
            serde_yaml::from_str::<Config>(&content).map_err(|e| e.to_string())
        };
        let config = parsed.map_err(|message| CoreError::ConfigParseError {
            path: path.display().to_string(),
            message,
        })?;

        config.validate()?;
        log::debug!(
            "Loaded {} selector(s) from {}",
            config.resources.len(),
            path.display()
        );
        Ok(config)
    }

    /// Find the first default config file in `dir`.
    pub fn discover(dir: &Path) -> CoreResult<PathBuf> {
        DEFAULT_CONFIG_FILES
            .iter()
            .map(|name| dir.join(name))
            .find(|candidate| candidate.is_file())
            .ok_or(CoreError::ConfigNotDiscovered)
    }

    /// Load `path` if given, otherwise the first default file in `dir`.
    pub fn load_or_discover(path: Option<&Path>, dir: &Path) -> CoreResult<(PathBuf, Self)> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::discover(dir)?,
        };
        let config = Self::load(&path)?;
        Ok((path, config))
    }

    /// Check every rule that must hold before any cloud call.
    pub fn validate(&self) -> CoreResult<()> {
        self.naming()?;

        if self.globals.max_concurrency == 0 {
            return Err(CoreError::ConfigInvalid {
                message: "globals.max_concurrency must be at least 1".to_string(),
            });
        }

        for arn in &self.globals.alarm.notification_topic_arns {
            validate_topic_arn(arn)?;
        }

        if self.resources.is_empty() {
            log::warn!("No resources configured; every owned alarm would be deleted");
        }

        self.selectors().map(|_| ())
    }

    /// The alarm naming convention for this config.
    pub fn naming(&self) -> CoreResult<AlarmNaming> {
        AlarmNaming::new(self.globals.alarm.alarm_name_prefix.clone())
    }

    /// Default parameters after layering the config over the built-ins.
    pub fn default_alarm_params(&self) -> AlarmParams {
        AlarmParams::builtin_defaults().overlay(&self.globals.alarm.default_alarm_params)
    }

    /// Build compiled selectors in config order.
    ///
    /// The global resource filter is merged into each entry: tag maps are
    /// combined with the entry's own values winning, and the entry's name
    /// pattern replaces the global one.
    pub fn selectors(&self) -> CoreResult<Vec<Selector>> {
        let defaults = self.default_alarm_params();
        let filter = &self.globals.resource_filter;

        self.resources
            .iter()
            .map(|(id, entry)| {
                let mut tags = filter.target_resource_tags.clone();
                tags.extend(
                    entry
                        .target_resource_tags
                        .iter()
                        .map(|(k, v)| (k.clone(), v.clone())),
                );
                let pattern = entry
                    .target_resource_name_pattern
                    .as_deref()
                    .or(filter.target_resource_name_pattern.as_deref());

                let template = build_template(id, &entry.alarm, &defaults)?;
                Selector::new(
                    id.clone(),
                    entry.target_resource_type,
                    pattern,
                    tags,
                    template,
                )
            })
            .collect()
    }
}

/// Check that a notification target looks like an ARN.
pub fn validate_topic_arn(arn: &str) -> CoreResult<()> {
    if arn.starts_with("arn:") {
        Ok(())
    } else {
        Err(CoreError::ConfigInvalid {
            message: format!("notification topic '{}' is not an ARN", arn),
        })
    }
}

fn build_template(
    id: &SelectorId,
    alarm: &ResourceAlarmConfig,
    defaults: &AlarmParams,
) -> CoreResult<AlarmTemplate> {
    let invalid = |metric: &str, reason: String| CoreError::InvalidTemplate {
        selector: id.to_string(),
        metric: metric.to_string(),
        reason,
    };

    if alarm.metrics.is_empty() {
        return Err(invalid("-", "alarm.metrics must list at least one metric".to_string()));
    }
    if let Some(ns) = &alarm.namespace {
        if ns.trim().is_empty() {
            return Err(invalid("-", "alarm.namespace cannot be empty".to_string()));
        }
    }

    let mut seen = BTreeSet::new();
    for metric in &alarm.metrics {
        if metric.trim().is_empty() {
            return Err(invalid(metric, "metric name cannot be empty".to_string()));
        }
        if !seen.insert(metric.as_str()) {
            return Err(invalid(metric, "metric is listed more than once".to_string()));
        }
    }
    for metric in alarm.alarm_param_overrides.keys() {
        if !seen.contains(metric.as_str()) {
            return Err(invalid(
                metric,
                "alarm_param_overrides names a metric that is not in alarm.metrics".to_string(),
            ));
        }
    }

    let metrics = alarm
        .metrics
        .iter()
        .map(|metric| {
            let layered = match alarm.alarm_param_overrides.get(metric) {
                Some(over) => defaults.overlay(over),
                None => defaults.clone(),
            };
            let params = layered.resolve().map_err(|reason| invalid(metric, reason))?;
            Ok(MetricTemplate {
                metric_name: metric.clone(),
                params,
            })
        })
        .collect::<CoreResult<Vec<_>>>()?;

    Ok(AlarmTemplate {
        namespace: alarm.namespace.clone(),
        metrics,
    })
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
