//! Shared utilities for CLI commands

use ac_cloud::{AwsBackend, AwsSettings, CloudClient};
use ac_core::{Config, OutcomeKind, ReconciliationPlan, RunReport};
use anyhow::{anyhow, Context, Result};
use std::fmt;
use std::future::Future;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::cli::{GlobalArgs, OutputFormat};

/// Error type representing a non-zero process exit code.
///
/// Use `return Err(ExitCode(N).into())` instead of `std::process::exit(N)`
/// so that destructors run and the progress bar is cleared.
#[derive(Debug)]
pub(crate) struct ExitCode(pub(crate) i32);

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Control flow only; main.rs prints nothing for it.
        write!(f, "")
    }
}

impl std::error::Error for ExitCode {}

/// Load the config named by `-c`, or discover one in the working directory.
pub(crate) fn load_config(global: &GlobalArgs) -> Result<(PathBuf, Config)> {
    let explicit = global.config_file.as_deref().map(Path::new);
    let (path, config) = Config::load_or_discover(explicit, Path::new("."))?;
    log::debug!("Using config {}", path.display());
    Ok((path, config))
}

/// Connect to AWS with the region/profile from the global flags.
pub(crate) async fn connect(global: &GlobalArgs) -> Arc<dyn CloudClient> {
    let settings = AwsSettings {
        region: global.region.clone(),
        profile: global.profile.clone(),
    };
    Arc::new(AwsBackend::connect(&settings).await)
}

/// One line per alarm, marked with the action the plan takes.
///
/// `+` create, `~` update, `U` forced update, `-` delete, `!` kept because
/// its selector could not be discovered, blank for unchanged.
pub(crate) fn change_set_lines(plan: &ReconciliationPlan) -> Vec<String> {
    let mut lines = Vec::with_capacity(
        plan.to_create.len()
            + plan.to_update.len()
            + plan.to_delete.len()
            + plan.unchanged.len()
            + plan.withheld.len(),
    );
    for spec in &plan.to_create {
        lines.push(format!("+ {}", spec.name));
    }
    for update in &plan.to_update {
        if update.is_forced() {
            lines.push(format!("U {}", update.spec.name));
        } else {
            lines.push(format!(
                "~ {} ({})",
                update.spec.name,
                update.changed_fields.join(", ")
            ));
        }
    }
    for spec in &plan.unchanged {
        lines.push(format!("  {}", spec.name));
    }
    for name in &plan.withheld {
        lines.push(format!("! {}", name));
    }
    for name in &plan.to_delete {
        lines.push(format!("- {}", name));
    }
    lines
}

pub(crate) fn print_change_set(plan: &ReconciliationPlan) {
    for line in change_set_lines(plan) {
        println!("{}", line);
    }
}

/// Ask on stdin with the prompt on stderr, so stdout stays machine-readable.
pub(crate) fn confirm(prompt: &str) -> Result<bool> {
    confirm_with(prompt, &mut std::io::stdin().lock(), &mut std::io::stderr())
}

pub(crate) fn confirm_with(
    prompt: &str,
    input: &mut impl BufRead,
    out: &mut impl Write,
) -> Result<bool> {
    write!(out, "{} [y/n]: ", prompt).context("Failed to write prompt")?;
    out.flush().context("Failed to flush prompt")?;
    let mut answer = String::new();
    input
        .read_line(&mut answer)
        .context("Failed to read confirmation")?;
    Ok(is_confirmation(&answer))
}

pub(crate) fn is_confirmation(answer: &str) -> bool {
    answer.trim() == "y"
}

/// Await `work`, failing once `budget` has passed.
pub(crate) async fn within<T>(
    budget: Option<Duration>,
    work: impl Future<Output = T>,
) -> Result<T> {
    match budget {
        Some(budget) => tokio::time::timeout(budget, work).await.map_err(|_| {
            anyhow!(
                "Planning did not finish within {}s; nothing was changed",
                budget.as_secs()
            )
        }),
        None => Ok(work.await),
    }
}

/// Print the run report in the requested format.
pub(crate) fn print_report(report: &RunReport, output: OutputFormat) -> Result<()> {
    match output {
        OutputFormat::Json => {
            let json =
                serde_json::to_string_pretty(report).context("Failed to serialize run report")?;
            println!("{}", json);
        }
        OutputFormat::Text => {
            for line in report_lines(report) {
                println!("{}", line);
            }
        }
    }
    Ok(())
}

pub(crate) fn report_lines(report: &RunReport) -> Vec<String> {
    let mut lines = Vec::new();
    for selector in report.failed_selectors() {
        lines.push(format!(
            "selector {} ({}): {}",
            selector.selector,
            selector.resource_type,
            selector.error.as_deref().unwrap_or("discovery failed")
        ));
    }
    for rejected in &report.rejected {
        lines.push(format!(
            "rejected {} ({}, {}): {}",
            rejected.selector, rejected.resource_name, rejected.metric_name, rejected.reason
        ));
    }
    // A dry run's skipped entries repeat the change set.
    for alarm in &report.alarms {
        let listed = match alarm.outcome {
            OutcomeKind::Failed => true,
            OutcomeKind::Skipped => !report.dry_run,
            _ => false,
        };
        if listed {
            match &alarm.reason {
                Some(reason) => lines.push(format!("{} {}: {}", alarm.outcome, alarm.name, reason)),
                None => lines.push(format!("{} {}", alarm.outcome, alarm.name)),
            }
        }
    }

    let counts = &report.counts;
    let label = if report.dry_run { "Dry run" } else { "Done" };
    lines.push(format!(
        "{}: {} created, {} updated, {} deleted, {} unchanged, {} failed, {} skipped{}",
        label,
        counts.created,
        counts.updated,
        counts.deleted,
        counts.unchanged,
        counts.failed,
        counts.skipped,
        report
            .duration_ms()
            .map(|ms| format!(" in {}ms", ms))
            .unwrap_or_default()
    ));
    lines
}

/// Exit with 1 when a selector or an operation failed.
pub(crate) fn exit_for(report: &RunReport) -> Result<()> {
    if report.success {
        Ok(())
    } else {
        Err(ExitCode(1).into())
    }
}

#[cfg(test)]
#[path = "common_test.rs"]
mod tests;
