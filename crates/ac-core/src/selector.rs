//! Compiled selectors: which resources to monitor and which alarms to give them
//!
//! A [`Selector`] is built once from a validated config entry and never
//! mutated afterwards.

use crate::alarm::ResolvedAlarmParams;
use crate::error::{CoreError, CoreResult};
use crate::names::SelectorId;
use crate::resource::{Resource, ResourceType, Tags};
use regex::Regex;

/// One metric of an alarm template with its resolved parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricTemplate {
    pub metric_name: String,
    pub params: ResolvedAlarmParams,
}

/// The alarms to create for every resource a selector matches.
#[derive(Debug, Clone, PartialEq)]
pub struct AlarmTemplate {
    /// Metric namespace; `None` means the provider's default namespace
    pub namespace: Option<String>,

    /// Metrics in config order
    pub metrics: Vec<MetricTemplate>,
}

/// A resource selector.
#[derive(Debug, Clone)]
pub struct Selector {
    pub id: SelectorId,
    pub resource_type: ResourceType,
    /// Pattern as written by the user, kept for display
    pub name_pattern_source: Option<String>,
    name_pattern: Option<Regex>,
    pub tags: Tags,
    pub template: AlarmTemplate,
}

impl Selector {
    /// Build a selector, compiling the name pattern.
    ///
    /// The pattern is anchored at the start of the display name and open at
    /// the end: `prod` matches `prod-orders` but not `old-prod`.
    pub fn new(
        id: SelectorId,
        resource_type: ResourceType,
        name_pattern: Option<&str>,
        tags: Tags,
        template: AlarmTemplate,
    ) -> CoreResult<Self> {
        let compiled = name_pattern
            .map(|p| compile_name_pattern(id.as_str(), p))
            .transpose()?;
        Ok(Self {
            id,
            resource_type,
            name_pattern_source: name_pattern.map(str::to_string),
            name_pattern: compiled,
            tags,
            template,
        })
    }

    /// True when the display name satisfies the name pattern (or there is none).
    pub fn matches_name(&self, name: &str) -> bool {
        self.name_pattern
            .as_ref()
            .map_or(true, |re| re.is_match(name))
    }

    /// Full match test: type, name pattern and tag AND-set.
    pub fn matches(&self, resource: &Resource) -> bool {
        resource.resource_type == self.resource_type
            && self.matches_name(&resource.name)
            && resource.has_tags(&self.tags)
    }

    /// Metric names in template order.
    pub fn metric_names(&self) -> impl Iterator<Item = &str> {
        self.template.metrics.iter().map(|m| m.metric_name.as_str())
    }
}

fn compile_name_pattern(selector: &str, pattern: &str) -> CoreResult<Regex> {
    Regex::new(&format!("^(?:{})", pattern)).map_err(|e| CoreError::InvalidPattern {
        selector: selector.to_string(),
        pattern: pattern.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
#[path = "selector_test.rs"]
mod tests;
