//! Alarm parameters, canonical alarm definitions, desired and existing alarms

use crate::names::{AlarmName, SelectorId};
use crate::resource::ResourceType;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Enums whose wire form is the CloudWatch API string.
macro_rules! api_enum {
    (
        $(#[$meta:meta])*
        pub enum $Name:ident { $($Variant:ident => $wire:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $Name {
            $(
                #[serde(rename = $wire)]
                $Variant,
            )+
        }

        impl $Name {
            /// CloudWatch API representation.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($Name::$Variant => $wire,)+
                }
            }

            /// Parse the CloudWatch API representation.
            pub fn from_api(s: &str) -> Option<Self> {
                match s {
                    $($wire => Some($Name::$Variant),)+
                    _ => None,
                }
            }
        }

        impl fmt::Display for $Name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

api_enum! {
    /// Statistic applied to the metric
    pub enum Statistic {
        SampleCount => "SampleCount",
        Average => "Average",
        Sum => "Sum",
        Minimum => "Minimum",
        Maximum => "Maximum",
    }
}

api_enum! {
    /// Comparison between the statistic and the threshold
    pub enum ComparisonOperator {
        GreaterThanOrEqualToThreshold => "GreaterThanOrEqualToThreshold",
        GreaterThanThreshold => "GreaterThanThreshold",
        LessThanThreshold => "LessThanThreshold",
        LessThanOrEqualToThreshold => "LessThanOrEqualToThreshold",
    }
}

api_enum! {
    /// How missing datapoints are evaluated
    pub enum TreatMissingData {
        Breaching => "breaching",
        NotBreaching => "notBreaching",
        Ignore => "ignore",
        Missing => "missing",
    }
}

/// Partially specified alarm parameters, as written in the config file.
///
/// Layers are combined with [`AlarmParams::overlay`]: built-in defaults,
/// then `default_alarm_params`, then the per-metric override.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct AlarmParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub statistic: Option<Statistic>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evaluation_periods: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datapoints_to_alarm: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comparison_operator: Option<ComparisonOperator>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub treat_missing_data: Option<TreatMissingData>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alarm_description: Option<String>,
}

impl AlarmParams {
    /// Parameters used when the config says nothing.
    pub fn builtin_defaults() -> Self {
        Self {
            statistic: Some(Statistic::Sum),
            period: Some(60),
            evaluation_periods: Some(1),
            datapoints_to_alarm: None,
            threshold: Some(1.0),
            comparison_operator: Some(ComparisonOperator::GreaterThanOrEqualToThreshold),
            treat_missing_data: Some(TreatMissingData::NotBreaching),
            alarm_description: None,
        }
    }

    /// Layer `top` over `self`; fields set in `top` win.
    pub fn overlay(&self, top: &AlarmParams) -> AlarmParams {
        AlarmParams {
            statistic: top.statistic.or(self.statistic),
            period: top.period.or(self.period),
            evaluation_periods: top.evaluation_periods.or(self.evaluation_periods),
            datapoints_to_alarm: top.datapoints_to_alarm.or(self.datapoints_to_alarm),
            threshold: top.threshold.or(self.threshold),
            comparison_operator: top.comparison_operator.or(self.comparison_operator),
            treat_missing_data: top.treat_missing_data.or(self.treat_missing_data),
            alarm_description: top
                .alarm_description
                .clone()
                .or_else(|| self.alarm_description.clone()),
        }
    }

    /// Turn a fully layered parameter set into resolved values, then validate them.
    pub fn resolve(&self) -> Result<ResolvedAlarmParams, String> {
        let missing = |field: &str| format!("{} is not set", field);
        let resolved = ResolvedAlarmParams {
            statistic: self.statistic.ok_or_else(|| missing("Statistic"))?,
            period: self.period.ok_or_else(|| missing("Period"))?,
            evaluation_periods: self
                .evaluation_periods
                .ok_or_else(|| missing("EvaluationPeriods"))?,
            datapoints_to_alarm: self.datapoints_to_alarm,
            threshold: self.threshold.ok_or_else(|| missing("Threshold"))?,
            comparison_operator: self
                .comparison_operator
                .ok_or_else(|| missing("ComparisonOperator"))?,
            treat_missing_data: self
                .treat_missing_data
                .ok_or_else(|| missing("TreatMissingData"))?,
            description: self
                .alarm_description
                .clone()
                .filter(|d| !d.trim().is_empty()),
        };
        resolved.validate()?;
        Ok(resolved)
    }
}

/// Fully resolved alarm parameters for one metric of one selector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedAlarmParams {
    pub statistic: Statistic,
    pub period: i32,
    pub evaluation_periods: i32,
    pub datapoints_to_alarm: Option<i32>,
    pub threshold: f64,
    pub comparison_operator: ComparisonOperator,
    pub treat_missing_data: TreatMissingData,
    pub description: Option<String>,
}

impl ResolvedAlarmParams {
    /// Check the structural rules CloudWatch enforces on alarm parameters.
    pub fn validate(&self) -> Result<(), String> {
        if !is_valid_period(self.period) {
            return Err(format!(
                "Period must be 10, 30 or a positive multiple of 60 seconds, got {}",
                self.period
            ));
        }
        if self.evaluation_periods < 1 {
            return Err(format!(
                "EvaluationPeriods must be at least 1, got {}",
                self.evaluation_periods
            ));
        }
        if let Some(datapoints) = self.datapoints_to_alarm {
            if datapoints < 1 || datapoints > self.evaluation_periods {
                return Err(format!(
                    "DatapointsToAlarm must be between 1 and EvaluationPeriods ({}), got {}",
                    self.evaluation_periods, datapoints
                ));
            }
        }
        if !self.threshold.is_finite() {
            return Err(format!("Threshold must be a finite number, got {}", self.threshold));
        }
        Ok(())
    }
}

fn is_valid_period(period: i32) -> bool {
    period == 10 || period == 30 || (period > 0 && period % 60 == 0)
}

/// The semantically relevant content of a metric alarm.
///
/// Both desired and existing alarms are reduced to this shape so that
/// diffing is a field-by-field comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlarmDefinition {
    pub namespace: String,
    pub metric_name: String,
    pub dimensions: BTreeMap<String, String>,
    pub statistic: Statistic,
    pub period: i32,
    pub evaluation_periods: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datapoints_to_alarm: Option<i32>,
    pub threshold: f64,
    pub comparison_operator: ComparisonOperator,
    pub treat_missing_data: TreatMissingData,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl AlarmDefinition {
    /// Build a definition from resolved parameters.
    pub fn from_params(
        namespace: impl Into<String>,
        metric_name: impl Into<String>,
        dimensions: BTreeMap<String, String>,
        params: &ResolvedAlarmParams,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            metric_name: metric_name.into(),
            dimensions,
            statistic: params.statistic,
            period: params.period,
            evaluation_periods: params.evaluation_periods,
            datapoints_to_alarm: params.datapoints_to_alarm,
            threshold: params.threshold,
            comparison_operator: params.comparison_operator,
            treat_missing_data: params.treat_missing_data,
            description: params.description.clone(),
        }
    }

    /// DatapointsToAlarm as CloudWatch evaluates it (defaults to EvaluationPeriods).
    pub fn effective_datapoints(&self) -> i32 {
        self.datapoints_to_alarm.unwrap_or(self.evaluation_periods)
    }

    fn effective_description(&self) -> Option<&str> {
        self.description.as_deref().filter(|d| !d.is_empty())
    }

    /// Names of the fields that differ between two definitions.
    ///
    /// Empty when the two are equivalent from CloudWatch's point of view.
    pub fn differences(&self, other: &AlarmDefinition) -> Vec<&'static str> {
        let mut changed = Vec::new();
        if self.namespace != other.namespace {
            changed.push("namespace");
        }
        if self.metric_name != other.metric_name {
            changed.push("metric_name");
        }
        if self.dimensions != other.dimensions {
            changed.push("dimensions");
        }
        if self.statistic != other.statistic {
            changed.push("statistic");
        }
        if self.period != other.period {
            changed.push("period");
        }
        if self.evaluation_periods != other.evaluation_periods {
            changed.push("evaluation_periods");
        }
        if self.effective_datapoints() != other.effective_datapoints() {
            changed.push("datapoints_to_alarm");
        }
        if self.threshold != other.threshold {
            changed.push("threshold");
        }
        if self.comparison_operator != other.comparison_operator {
            changed.push("comparison_operator");
        }
        if self.treat_missing_data != other.treat_missing_data {
            changed.push("treat_missing_data");
        }
        if self.effective_description() != other.effective_description() {
            changed.push("description");
        }
        changed
    }

    /// True when no field differs.
    pub fn is_equivalent(&self, other: &AlarmDefinition) -> bool {
        self.differences(other).is_empty()
    }
}

/// One alarm alarm-craft wants to exist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesiredAlarmSpec {
    pub name: AlarmName,

    /// Selector that produced this alarm
    pub selector: SelectorId,

    pub resource_type: ResourceType,

    /// Display name of the monitored resource
    pub resource_name: String,

    pub definition: AlarmDefinition,
}

/// An owned alarm currently present in the alarm store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExistingAlarm {
    pub name: AlarmName,

    /// `None` when the stored alarm could not be mapped to a definition
    /// (e.g. a metric-math alarm or an unknown statistic)
    pub definition: Option<AlarmDefinition>,

    /// Last configuration update reported by the store
    pub updated_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
#[path = "alarm_test.rs"]
mod tests;
