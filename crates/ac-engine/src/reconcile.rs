//! A full reconciliation run: discover, generate, inventory, plan, apply

use crate::cancel::CancellationFlag;
use crate::error::EngineResult;
use crate::executor::{ApplyExecutor, ApplyOptions, OutcomeObserver};
use crate::generator::AlarmSpecGenerator;
use crate::inventory::AlarmInventory;
use crate::providers::ProviderRegistry;
use crate::selector::ResourceSelector;
use ac_cloud::{CloudClient, PutOptions, RetryPolicy};
use ac_core::config::validate_topic_arn;
use ac_core::{
    AlarmNaming, AlarmOutcome, Config, ExistingAlarm, Reconciler, ReconciliationPlan, RunReport,
    Selector, SelectorReport,
};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

/// Result of the read-only half of a run.
#[derive(Debug, Clone)]
pub struct PlannedRun {
    pub plan: ReconciliationPlan,

    /// Report started when planning began, with selector results recorded
    report: RunReport,
}

impl PlannedRun {
    pub fn selectors(&self) -> &[SelectorReport] {
        &self.report.selectors
    }

    /// True when at least one selector could not be discovered.
    pub fn has_discovery_failures(&self) -> bool {
        self.report.failed_selectors().next().is_some()
    }

    /// Report for a run that stops after planning.
    ///
    /// Planned mutations are recorded as skipped with the action that would
    /// have been taken.
    pub fn into_dry_run_report(self) -> RunReport {
        let PlannedRun { plan, mut report } = self;
        report.dry_run = true;
        record_unapplied(&mut report, &plan);
        for spec in plan.to_create {
            report.record(AlarmOutcome::skipped(spec.name, "would create"));
        }
        for update in plan.to_update {
            let reason = if update.is_forced() {
                "would update (forced)".to_string()
            } else {
                format!("would update ({})", update.changed_fields.join(", "))
            };
            report.record(AlarmOutcome::skipped(update.spec.name, reason));
        }
        for name in plan.to_delete {
            report.record(AlarmOutcome::skipped(name, "would delete"));
        }
        report.finish();
        report
    }
}

/// Unchanged and withheld alarms are reported the same way whether or not
/// the plan is applied.
fn record_unapplied(report: &mut RunReport, plan: &ReconciliationPlan) {
    for spec in &plan.unchanged {
        report.record(AlarmOutcome::unchanged(spec.name.clone()));
    }
    for name in &plan.withheld {
        report.record(AlarmOutcome::skipped(
            name.clone(),
            "kept: discovery failed for a selector that may own it",
        ));
    }
}

/// Drives one reconciliation run for a validated config.
pub struct Reconciliation {
    client: Arc<dyn CloudClient>,
    registry: Arc<ProviderRegistry>,
    selectors: Vec<Selector>,
    naming: AlarmNaming,
    retry: RetryPolicy,
    options: ApplyOptions,
    cancel: CancellationFlag,
}

impl Reconciliation {
    /// Compile the config into a run against `client`.
    ///
    /// Fails on any configuration error; nothing is called before this
    /// succeeds.
    pub fn from_config(config: &Config, client: Arc<dyn CloudClient>) -> EngineResult<Self> {
        let globals = &config.globals;
        Ok(Self {
            client,
            registry: Arc::new(ProviderRegistry::with_defaults()),
            selectors: config.selectors()?,
            naming: config.naming()?,
            retry: RetryPolicy::new(globals.max_retries),
            options: ApplyOptions {
                max_concurrency: globals.max_concurrency,
                pacing: Duration::from_millis(globals.api_call_interval_ms),
                put_options: PutOptions {
                    tags: globals.alarm.alarm_tags.clone(),
                    notification_arns: globals.alarm.notification_topic_arns.clone(),
                },
            },
            cancel: CancellationFlag::new(),
        })
    }

    pub fn with_registry(mut self, registry: ProviderRegistry) -> Self {
        self.registry = Arc::new(registry);
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Notify these topics from every alarm put, in addition to the
    /// configured ones.
    ///
    /// Fails like an invalid config when a topic is not an ARN.
    pub fn with_notification_topics(
        mut self,
        arns: impl IntoIterator<Item = String>,
    ) -> EngineResult<Self> {
        let current = &mut self.options.put_options.notification_arns;
        for arn in arns {
            validate_topic_arn(&arn)?;
            if !current.contains(&arn) {
                current.push(arn);
            }
        }
        Ok(self)
    }

    pub fn with_pacing(mut self, pacing: Duration) -> Self {
        self.options.pacing = pacing;
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationFlag) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn selectors(&self) -> &[Selector] {
        &self.selectors
    }

    pub fn naming(&self) -> &AlarmNaming {
        &self.naming
    }

    pub fn cancellation(&self) -> &CancellationFlag {
        &self.cancel
    }

    /// Alarms currently owned by alarm-craft.
    pub async fn list_owned(&self) -> EngineResult<Vec<ExistingAlarm>> {
        AlarmInventory::new(self.client.as_store(), &self.retry, &self.naming)
            .pacing(self.options.pacing)
            .list_owned()
            .await
    }

    /// Compute the plan without changing anything.
    ///
    /// A selector whose discovery fails is reported and its namespace is
    /// protected from deletes; the other selectors are planned normally.
    /// Configuration errors, name conflicts and inventory failures abort.
    pub async fn plan(&self, update_all: bool) -> EngineResult<PlannedRun> {
        let mut report = RunReport::new(false);

        let matches = ResourceSelector::new(
            Arc::clone(&self.client),
            Arc::clone(&self.registry),
            self.retry.clone(),
        )
        .pacing(self.options.pacing)
        .max_concurrency(self.options.max_concurrency)
        .match_all(&self.selectors)
        .await;

        let generator = AlarmSpecGenerator::new(&self.naming, &self.registry);
        let mut desired = Vec::new();
        let mut protected = BTreeSet::new();

        for (selector, matched) in self.selectors.iter().zip(matches) {
            match matched.result {
                Ok(resources) => {
                    log::info!(
                        "Selector '{}' ({}): {} resource(s) matched",
                        selector.id,
                        selector.resource_type,
                        resources.len()
                    );
                    let generated = generator.generate(selector, &resources)?;
                    desired.extend(generated.specs);
                    report.record_rejected(generated.rejected);
                    report.record_selector(SelectorReport {
                        selector: matched.selector,
                        resource_type: matched.resource_type,
                        matched: resources.len(),
                        error: None,
                    });
                }
                Err(e) if e.is_fatal_config() => return Err(e),
                Err(e) => {
                    log::error!("{}", e);
                    protected.insert(generator.namespace_for(selector)?);
                    report.record_selector(SelectorReport {
                        selector: matched.selector,
                        resource_type: matched.resource_type,
                        matched: 0,
                        error: Some(e.to_string()),
                    });
                }
            }
        }

        let existing = self.list_owned().await?;

        let plan = Reconciler::new(self.naming.clone())
            .update_all(update_all)
            .protect_namespaces(protected)
            .plan(desired, existing)?;

        log::info!(
            "Plan: {} to create, {} to update, {} to delete, {} unchanged, {} withheld",
            plan.to_create.len(),
            plan.to_update.len(),
            plan.to_delete.len(),
            plan.unchanged.len(),
            plan.withheld.len()
        );
        Ok(PlannedRun { plan, report })
    }

    /// Apply a plan and build the run report.
    pub async fn apply(&self, planned: PlannedRun) -> RunReport {
        self.apply_observed(planned, None).await
    }

    /// Like [`Reconciliation::apply`], calling `observer` for every finished
    /// mutation.
    pub async fn apply_observed(
        &self,
        planned: PlannedRun,
        observer: Option<OutcomeObserver>,
    ) -> RunReport {
        let PlannedRun { plan, mut report } = planned;
        record_unapplied(&mut report, &plan);

        let mut executor = ApplyExecutor::new(
            Arc::clone(&self.client),
            self.retry.clone(),
            self.options.clone(),
        )
        .with_cancellation(self.cancel.clone());
        if let Some(observer) = observer {
            executor = executor.with_observer(observer);
        }

        let result = executor.apply(&plan).await;
        report.record_all(result.outcomes);
        report.finish();
        report
    }

    /// Plan and, unless `dry_run`, apply.
    pub async fn run(&self, dry_run: bool, update_all: bool) -> EngineResult<RunReport> {
        let planned = self.plan(update_all).await?;
        if dry_run {
            return Ok(planned.into_dry_run_report());
        }
        Ok(self.apply(planned).await)
    }
}

impl std::fmt::Debug for Reconciliation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reconciliation")
            .field("selectors", &self.selectors.len())
            .field("naming", &self.naming)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "reconcile_test.rs"]
mod tests;
