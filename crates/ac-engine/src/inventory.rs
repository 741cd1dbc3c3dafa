//! Listing the alarms alarm-craft owns

use crate::error::{EngineError, EngineResult};
use ac_cloud::{collect_all, AlarmStore, RetryPolicy};
use ac_core::{AlarmNaming, ExistingAlarm};
use std::time::Duration;

/// Reads owned alarms from the alarm store.
pub struct AlarmInventory<'a> {
    store: &'a dyn AlarmStore,
    retry: &'a RetryPolicy,
    naming: &'a AlarmNaming,
    pacing: Duration,
}

impl<'a> AlarmInventory<'a> {
    pub fn new(store: &'a dyn AlarmStore, retry: &'a RetryPolicy, naming: &'a AlarmNaming) -> Self {
        Self {
            store,
            retry,
            naming,
            pacing: Duration::ZERO,
        }
    }

    pub fn pacing(mut self, pacing: Duration) -> Self {
        self.pacing = pacing;
        self
    }

    /// Every alarm under the naming convention, sorted by name.
    ///
    /// Listing is by name prefix, so alarms outside the convention are never
    /// returned. A listing failure after retries aborts the run.
    pub async fn list_owned(&self) -> EngineResult<Vec<ExistingAlarm>> {
        let prefix = self.naming.owned_prefix();
        let alarms = collect_all(|token: Option<String>| async move {
            if token.is_some() && !self.pacing.is_zero() {
                tokio::time::sleep(self.pacing).await;
            }
            self.retry
                .run("DescribeAlarms", || {
                    self.store.describe_alarms_page(prefix, token.clone())
                })
                .await
        })
        .await
        .map_err(EngineError::Inventory)?;

        let mut owned: Vec<ExistingAlarm> = alarms
            .into_iter()
            .filter(|a| self.naming.owns(a.name.as_str()))
            .collect();
        owned.sort_by(|a, b| a.name.cmp(&b.name));

        log::info!(
            "Found {} existing alarm(s) under prefix '{}'",
            owned.len(),
            prefix
        );
        Ok(owned)
    }
}

#[cfg(test)]
#[path = "inventory_test.rs"]
mod tests;
