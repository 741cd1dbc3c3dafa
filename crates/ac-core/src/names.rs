//! Alarm and selector names, and the naming convention that marks ownership.
//!
//! Generated alarm names are `{prefix}-{resource display name}-{metric}`.
//! The same `{prefix}-` string is the only thing the inventory uses to claim
//! an alarm as ours, so an alarm created by hand with a matching name is
//! indistinguishable from a generated one.

use crate::error::{CoreError, CoreResult};
use crate::newtype_string::define_newtype_string;

define_newtype_string! {
    /// Name of a CloudWatch metric alarm.
    pub struct AlarmName(max_len = 255);
}

define_newtype_string! {
    /// Key of a selector entry under `resources:` in the config file.
    pub struct SelectorId(max_len = 128);
}

/// Separator placed between prefix, resource name and metric name.
pub const ALARM_NAME_SEPARATOR: char = '-';

/// Prefix used when the config does not set `alarm_name_prefix`.
pub const DEFAULT_ALARM_NAME_PREFIX: &str = "alarm-craft-autogen";

/// The reserved naming convention for alarms owned by alarm-craft.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlarmNaming {
    prefix: String,
    owned_prefix: String,
}

impl AlarmNaming {
    /// Build the convention for a prefix.
    ///
    /// The prefix must be non-empty and must not end with the separator,
    /// otherwise generated names would contain a doubled separator.
    pub fn new(prefix: impl Into<String>) -> CoreResult<Self> {
        let prefix = prefix.into();
        if prefix.trim().is_empty() {
            return Err(CoreError::ConfigInvalid {
                message: "alarm_name_prefix cannot be empty".to_string(),
            });
        }
        if prefix.ends_with(ALARM_NAME_SEPARATOR) {
            return Err(CoreError::ConfigInvalid {
                message: format!(
                    "alarm_name_prefix '{}' must not end with '{}'; the separator is added automatically",
                    prefix, ALARM_NAME_SEPARATOR
                ),
            });
        }
        let owned_prefix = format!("{}{}", prefix, ALARM_NAME_SEPARATOR);
        Ok(Self {
            prefix,
            owned_prefix,
        })
    }

    /// The configured prefix, without separator.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// The string every owned alarm name starts with (`{prefix}-`).
    pub fn owned_prefix(&self) -> &str {
        &self.owned_prefix
    }

    /// Derive the alarm name for a (resource, metric) pair.
    ///
    /// Pure: identical inputs always produce identical names. Fails with the
    /// reason when the store would reject the name (too long).
    pub fn alarm_name(&self, resource_name: &str, metric_name: &str) -> Result<AlarmName, String> {
        AlarmName::try_new(format!(
            "{}{}{}{}",
            self.owned_prefix, resource_name, ALARM_NAME_SEPARATOR, metric_name
        ))
    }

    /// Whether an alarm name falls under the reserved convention.
    pub fn owns(&self, alarm_name: &str) -> bool {
        alarm_name.len() > self.owned_prefix.len() && alarm_name.starts_with(&self.owned_prefix)
    }
}

impl Default for AlarmNaming {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_ALARM_NAME_PREFIX.to_string(),
            owned_prefix: format!("{}{}", DEFAULT_ALARM_NAME_PREFIX, ALARM_NAME_SEPARATOR),
        }
    }
}

#[cfg(test)]
#[path = "names_test.rs"]
mod tests;
