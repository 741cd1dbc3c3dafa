//! Plan command implementation - show the change set, apply nothing

use ac_engine::Reconciliation;
use anyhow::{Context, Result};

use crate::cli::{GlobalArgs, OutputFormat, PlanArgs};
use crate::commands::common::{self, exit_for, print_change_set, print_report};

/// Execute the plan command
pub(crate) async fn execute(args: &PlanArgs, global: &GlobalArgs) -> Result<()> {
    let (_, config) = common::load_config(global)?;
    let client = common::connect(global).await;
    let run = Reconciliation::from_config(&config, client)?
        .with_notification_topics(args.change_set.notification_topic_arns.clone())?;

    let planned = run
        .plan(args.change_set.update_all)
        .await
        .context("Failed to compute alarm change set")?;

    if args.change_set.output == OutputFormat::Text {
        print_change_set(&planned.plan);
    }
    let report = planned.into_dry_run_report();
    print_report(&report, args.change_set.output)?;
    exit_for(&report)
}
