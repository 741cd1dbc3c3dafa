//! ac-core - Core library for alarm-craft
//!
//! This crate provides the configuration model, strongly-typed names,
//! resource and alarm definitions, and the pure reconciliation logic that
//! diffs desired alarms against the alarms already owned by alarm-craft.
//! Nothing in here talks to the cloud.

pub mod alarm;
pub mod config;
pub mod error;
pub mod names;
mod newtype_string;
pub mod plan;
pub mod resource;
pub mod selector;
pub mod summary;

pub use alarm::{
    AlarmDefinition, AlarmParams, ComparisonOperator, DesiredAlarmSpec, ExistingAlarm,
    ResolvedAlarmParams, Statistic, TreatMissingData,
};
pub use config::Config;
pub use error::{CoreError, CoreResult};
pub use names::{AlarmName, AlarmNaming, SelectorId};
pub use plan::{AlarmUpdate, Reconciler, ReconciliationPlan};
pub use resource::{Resource, ResourceType, Tags};
pub use selector::{AlarmTemplate, MetricTemplate, Selector};
pub use summary::{
    AlarmOutcome, OutcomeCounts, OutcomeKind, RejectedAlarm, RunReport, SelectorReport,
};
