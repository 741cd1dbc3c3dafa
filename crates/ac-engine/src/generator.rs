//! Alarm spec generation: selector template x matched resources

use crate::error::EngineResult;
use crate::providers::ProviderRegistry;
use ac_core::{
    AlarmDefinition, AlarmNaming, CoreError, DesiredAlarmSpec, RejectedAlarm, Resource, Selector,
};

/// Output of [`AlarmSpecGenerator::generate`] for one selector.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeneratedAlarms {
    /// Sorted by alarm name
    pub specs: Vec<DesiredAlarmSpec>,

    /// Pairs whose alarm name the store would reject
    pub rejected: Vec<RejectedAlarm>,
}

/// Turns matched resources into desired alarm specs.
///
/// Generation is pure: the same selector and resources always give the same
/// specs, in the same order.
pub struct AlarmSpecGenerator<'a> {
    naming: &'a AlarmNaming,
    registry: &'a ProviderRegistry,
}

impl<'a> AlarmSpecGenerator<'a> {
    pub fn new(naming: &'a AlarmNaming, registry: &'a ProviderRegistry) -> Self {
        Self { naming, registry }
    }

    /// Namespace the selector's alarms live in.
    pub fn namespace_for(&self, selector: &Selector) -> EngineResult<String> {
        match &selector.template.namespace {
            Some(ns) => Ok(ns.clone()),
            None => Ok(self
                .registry
                .get(selector.resource_type)?
                .default_namespace()
                .to_string()),
        }
    }

    /// One spec per (resource, metric), sorted by alarm name.
    ///
    /// An invalid template fails the whole selector. A resource whose name
    /// makes an invalid alarm name only loses that alarm, which is listed in
    /// `rejected`.
    pub fn generate(
        &self,
        selector: &Selector,
        resources: &[Resource],
    ) -> EngineResult<GeneratedAlarms> {
        let provider = self.registry.get(selector.resource_type)?;
        let namespace = self.namespace_for(selector)?;

        for metric in &selector.template.metrics {
            metric
                .params
                .validate()
                .map_err(|reason| CoreError::InvalidTemplate {
                    selector: selector.id.to_string(),
                    metric: metric.metric_name.clone(),
                    reason,
                })?;
        }

        let mut specs = Vec::with_capacity(resources.len() * selector.template.metrics.len());
        let mut rejected = Vec::new();
        for resource in resources {
            let dimensions = provider.dimensions_for(resource);
            for metric in &selector.template.metrics {
                let name = match self.naming.alarm_name(&resource.name, &metric.metric_name) {
                    Ok(name) => name,
                    Err(reason) => {
                        log::warn!(
                            "Selector '{}': no {} alarm for '{}': {}",
                            selector.id,
                            metric.metric_name,
                            resource.name,
                            reason
                        );
                        rejected.push(RejectedAlarm {
                            selector: selector.id.clone(),
                            resource_name: resource.name.clone(),
                            metric_name: metric.metric_name.clone(),
                            reason,
                        });
                        continue;
                    }
                };

                let mut definition = AlarmDefinition::from_params(
                    namespace.as_str(),
                    metric.metric_name.as_str(),
                    dimensions.clone(),
                    &metric.params,
                );
                if definition.description.is_none() {
                    definition.description = Some(default_description(selector, resource));
                }

                specs.push(DesiredAlarmSpec {
                    name,
                    selector: selector.id.clone(),
                    resource_type: selector.resource_type,
                    resource_name: resource.name.clone(),
                    definition,
                });
            }
        }

        specs.sort_by(|a, b| a.name.cmp(&b.name));
        log::debug!(
            "Selector '{}': {} alarm spec(s) for {} resource(s)",
            selector.id,
            specs.len(),
            resources.len()
        );
        Ok(GeneratedAlarms { specs, rejected })
    }
}

fn default_description(selector: &Selector, resource: &Resource) -> String {
    format!(
        "Auto-generated by alarm-craft for {} {}",
        selector.resource_type, resource.name
    )
}

#[cfg(test)]
#[path = "generator_test.rs"]
mod tests;
