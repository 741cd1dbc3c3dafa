//! Apply command implementation - plan, confirm, then reconcile

use ac_core::AlarmOutcome;
use ac_engine::{CancellationFlag, OutcomeObserver, Reconciliation};
use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::cli::{ApplyArgs, GlobalArgs, OutputFormat};
use crate::commands::common::{self, exit_for, print_change_set, print_report};

/// Execute the apply command
pub(crate) async fn execute(args: &ApplyArgs, global: &GlobalArgs) -> Result<()> {
    let (_, config) = common::load_config(global)?;
    let client = common::connect(global).await;
    let cancel = CancellationFlag::new();
    let run = Reconciliation::from_config(&config, client)?
        .with_notification_topics(args.change_set.notification_topic_arns.clone())?
        .with_cancellation(cancel.clone());

    let budget = args.timeout_secs.map(Duration::from_secs);
    let started = Instant::now();
    let planned = common::within(budget, run.plan(args.change_set.update_all))
        .await?
        .context("Failed to compute alarm change set")?;
    let remaining = budget.map(|b| b.saturating_sub(started.elapsed()));
    let text = args.change_set.output == OutputFormat::Text;

    if text {
        print_change_set(&planned.plan);
    }

    if planned.plan.is_empty() {
        if text {
            println!("all required alarms already exist. no updates executed");
        }
        let report = run.apply(planned).await;
        print_report(&report, args.change_set.output)?;
        return exit_for(&report);
    }

    if !args.no_confirm_changeset
        && !common::confirm("execute updating above alarms ?")?
    {
        eprintln!("no updates executed..");
        return Ok(());
    }

    if text {
        println!("!!! UPDATE ALARMS !!!");
    }
    spawn_cancellation(&cancel, remaining);

    let pb = text.then(|| {
        let pb = ProgressBar::new(planned.plan.mutation_count() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template(
                    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({msg})",
                )
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        Arc::new(pb)
    });
    let observer = pb.as_ref().map(|pb| {
        let pb = Arc::clone(pb);
        Arc::new(move |outcome: &AlarmOutcome| {
            pb.set_message(format!("{} {}", outcome.outcome, outcome.name));
            pb.inc(1);
        }) as OutcomeObserver
    });

    let report = run.apply_observed(planned, observer).await;

    if let Some(pb) = &pb {
        pb.finish_and_clear();
    }
    if cancel.is_cancelled() {
        log::warn!("Run cancelled; operations not yet started were skipped");
    }

    print_report(&report, args.change_set.output)?;
    exit_for(&report)
}

/// Cancel on Ctrl-C, and once `remaining` of the run budget has passed.
///
/// Cancellation only stops new operations; in-flight calls finish.
fn spawn_cancellation(cancel: &CancellationFlag, remaining: Option<Duration>) {
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::warn!("Interrupt received, finishing in-flight operations");
            on_signal.cancel();
        }
    });

    if let Some(remaining) = remaining {
        let on_timeout = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(remaining).await;
            log::warn!("Run timeout reached, finishing in-flight operations");
            on_timeout.cancel();
        });
    }
}
