//! Applying a reconciliation plan to the alarm store
//!
//! Deletes run first, in batches, then puts. Within a phase operations run
//! in parallel up to `max_concurrency`, each one retried on throttling and
//! followed by the configured pause while its permit is still held. One
//! failing alarm never stops the others.

use crate::cancel::CancellationFlag;
use ac_cloud::{CloudClient, CloudError, PutOptions, RetryPolicy, MAX_DELETE_BATCH};
use ac_core::{
    AlarmName, AlarmOutcome, DesiredAlarmSpec, OutcomeKind, ReconciliationPlan,
};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Semaphore;

/// Called once per finished alarm, from worker tasks.
pub type OutcomeObserver = Arc<dyn Fn(&AlarmOutcome) + Send + Sync>;

/// Knobs for [`ApplyExecutor`]
#[derive(Debug, Clone)]
pub struct ApplyOptions {
    pub max_concurrency: usize,

    /// Pause after every mutating call
    pub pacing: Duration,

    /// Tags and notification targets attached to every alarm put
    pub put_options: PutOptions,
}

impl Default for ApplyOptions {
    fn default() -> Self {
        Self {
            max_concurrency: 4,
            pacing: Duration::ZERO,
            put_options: PutOptions::default(),
        }
    }
}

enum Operation {
    Delete(Vec<AlarmName>),
    Put { spec: DesiredAlarmSpec, create: bool },
}

impl Operation {
    fn names(&self) -> Vec<AlarmName> {
        match self {
            Operation::Delete(batch) => batch.clone(),
            Operation::Put { spec, .. } => vec![spec.name.clone()],
        }
    }
}

/// Per-alarm result of applying a plan, sorted by alarm name
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApplyResult {
    pub outcomes: Vec<AlarmOutcome>,
}

impl ApplyResult {
    /// True when no operation failed or was left unstarted.
    pub fn is_success(&self) -> bool {
        self.outcomes
            .iter()
            .all(|o| !o.is_failure() && o.outcome != OutcomeKind::Skipped)
    }

    pub fn failures(&self) -> impl Iterator<Item = &AlarmOutcome> {
        self.outcomes.iter().filter(|o| o.is_failure())
    }
}

/// Executes plan mutations against the alarm store.
#[derive(Clone)]
pub struct ApplyExecutor {
    client: Arc<dyn CloudClient>,
    retry: RetryPolicy,
    options: ApplyOptions,
    cancel: CancellationFlag,
    observer: Option<OutcomeObserver>,
}

impl ApplyExecutor {
    pub fn new(client: Arc<dyn CloudClient>, retry: RetryPolicy, options: ApplyOptions) -> Self {
        Self {
            client,
            retry,
            options,
            cancel: CancellationFlag::new(),
            observer: None,
        }
    }

    pub fn with_cancellation(mut self, cancel: CancellationFlag) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn with_observer(mut self, observer: OutcomeObserver) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Run every mutation of the plan and report one outcome per alarm.
    ///
    /// Operations not started before cancellation are reported as skipped.
    /// The result is sorted by alarm name.
    pub async fn apply(&self, plan: &ReconciliationPlan) -> ApplyResult {
        log::info!(
            "Applying {} create(s), {} update(s), {} delete(s) via {}",
            plan.to_create.len(),
            plan.to_update.len(),
            plan.to_delete.len(),
            self.client.as_store().backend_name()
        );

        let deletes = plan
            .to_delete
            .chunks(MAX_DELETE_BATCH)
            .map(|batch| Operation::Delete(batch.to_vec()))
            .collect();
        let mut outcomes = self.run_phase(deletes).await;

        let puts = plan
            .to_create
            .iter()
            .map(|spec| Operation::Put {
                spec: spec.clone(),
                create: true,
            })
            .chain(plan.to_update.iter().map(|update| Operation::Put {
                spec: update.spec.clone(),
                create: false,
            }))
            .collect();
        outcomes.extend(self.run_phase(puts).await);

        outcomes.sort_by(|a, b| a.name.cmp(&b.name));
        ApplyResult { outcomes }
    }

    async fn run_phase(&self, operations: Vec<Operation>) -> Vec<AlarmOutcome> {
        let semaphore = Arc::new(Semaphore::new(self.options.max_concurrency.max(1)));
        let results = Arc::new(Mutex::new(Vec::new()));
        let mut handles = Vec::with_capacity(operations.len());

        for operation in operations {
            let names = operation.names();
            let executor = self.clone();
            let semaphore = Arc::clone(&semaphore);
            let results = Arc::clone(&results);

            let handle = tokio::spawn(async move {
                let _permit = match semaphore.acquire().await {
                    Ok(permit) => permit,
                    Err(_) => {
                        executor.record(&results, skipped(operation.names()));
                        return;
                    }
                };

                let outcomes = if executor.cancel.is_cancelled() {
                    skipped(operation.names())
                } else {
                    let outcomes = executor.execute(operation).await;
                    executor.pace().await;
                    outcomes
                };
                executor.record(&results, outcomes);
            });
            handles.push((names, handle));
        }

        for (names, handle) in handles {
            if let Err(e) = handle.await {
                log::error!("Apply worker failed: {}", e);
                let failed = names
                    .into_iter()
                    .map(|name| AlarmOutcome::failed(name, format!("worker task failed: {}", e)))
                    .collect();
                self.record(&results, failed);
            }
        }

        let mut results = results.lock().unwrap_or_else(|p| p.into_inner());
        std::mem::take(&mut *results)
    }

    async fn execute(&self, operation: Operation) -> Vec<AlarmOutcome> {
        match operation {
            Operation::Delete(batch) => self.delete_batch(batch).await,
            Operation::Put { spec, create } => vec![self.put(&spec, create).await],
        }
    }

    async fn put(&self, spec: &DesiredAlarmSpec, create: bool) -> AlarmOutcome {
        let store = self.client.as_store();
        let put_options = &self.options.put_options;
        match self
            .retry
            .run("PutMetricAlarm", || store.put_alarm(spec, put_options))
            .await
        {
            Ok(()) if create => {
                log::info!("Created alarm {}", spec.name);
                AlarmOutcome::created(spec.name.clone())
            }
            Ok(()) => {
                log::info!("Updated alarm {}", spec.name);
                AlarmOutcome::updated(spec.name.clone())
            }
            Err(e) => {
                log::error!("Failed to put alarm {}: {}", spec.name, e);
                AlarmOutcome::failed(spec.name.clone(), e.to_string())
            }
        }
    }

    async fn delete_batch(&self, batch: Vec<AlarmName>) -> Vec<AlarmOutcome> {
        let store = self.client.as_store();
        let result = self
            .retry
            .run("DeleteAlarms", || store.delete_alarms(&batch))
            .await;

        match result {
            Ok(()) => {
                for name in &batch {
                    log::info!("Deleted alarm {}", name);
                }
                batch.into_iter().map(AlarmOutcome::deleted).collect()
            }
            Err(e) if batch.len() == 1 => batch
                .into_iter()
                .map(|name| delete_failure(name, &e))
                .collect(),
            Err(e) => {
                log::warn!(
                    "Deleting {} alarm(s) in one call failed ({}); deleting one at a time",
                    batch.len(),
                    e
                );
                let mut outcomes = Vec::with_capacity(batch.len());
                for name in batch {
                    if self.cancel.is_cancelled() {
                        outcomes.push(AlarmOutcome::skipped(name, "cancelled"));
                        continue;
                    }
                    self.pace().await;
                    let single = std::slice::from_ref(&name);
                    match self
                        .retry
                        .run("DeleteAlarms", || store.delete_alarms(single))
                        .await
                    {
                        Ok(()) => {
                            log::info!("Deleted alarm {}", name);
                            outcomes.push(AlarmOutcome::deleted(name));
                        }
                        Err(e) => outcomes.push(delete_failure(name, &e)),
                    }
                }
                outcomes
            }
        }
    }

    async fn pace(&self) {
        if !self.options.pacing.is_zero() {
            tokio::time::sleep(self.options.pacing).await;
        }
    }

    fn record(&self, results: &Mutex<Vec<AlarmOutcome>>, outcomes: Vec<AlarmOutcome>) {
        if let Some(observer) = &self.observer {
            for outcome in &outcomes {
                observer(outcome);
            }
        }
        results
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .extend(outcomes);
    }
}

fn skipped(names: Vec<AlarmName>) -> Vec<AlarmOutcome> {
    names
        .into_iter()
        .map(|name| AlarmOutcome::skipped(name, "cancelled"))
        .collect()
}

/// A delete that found nothing to delete still reaches the desired state.
fn delete_failure(name: AlarmName, error: &CloudError) -> AlarmOutcome {
    if error.is_not_found() {
        log::info!("Alarm {} was already absent", name);
        AlarmOutcome {
            reason: Some("already absent".to_string()),
            ..AlarmOutcome::deleted(name)
        }
    } else {
        log::error!("Failed to delete alarm {}: {}", name, error);
        AlarmOutcome::failed(name, error.to_string())
    }
}

#[cfg(test)]
#[path = "executor_test.rs"]
mod tests;
