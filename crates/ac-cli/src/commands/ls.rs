//! List command implementation - show the alarms alarm-craft owns

use ac_core::ExistingAlarm;
use ac_engine::Reconciliation;
use anyhow::{Context, Result};

use crate::cli::{GlobalArgs, LsArgs, OutputFormat};
use crate::commands::common;

/// Execute the ls command
pub(crate) async fn execute(args: &LsArgs, global: &GlobalArgs) -> Result<()> {
    let (_, config) = common::load_config(global)?;
    let client = common::connect(global).await;
    let run = Reconciliation::from_config(&config, client)?;

    let alarms = run
        .list_owned()
        .await
        .context("Failed to list owned alarms")?;

    match args.output {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&alarms)
                .context("Failed to serialize alarm list")?;
            println!("{}", json);
        }
        OutputFormat::Text => {
            for line in alarm_lines(&alarms) {
                println!("{}", line);
            }
            println!(
                "{} alarm(s) with prefix '{}'",
                alarms.len(),
                run.naming().prefix()
            );
        }
    }
    Ok(())
}

fn alarm_lines(alarms: &[ExistingAlarm]) -> Vec<String> {
    alarms
        .iter()
        .map(|alarm| match &alarm.definition {
            Some(def) => format!("{}  {}/{}", alarm.name, def.namespace, def.metric_name),
            None => format!("{}  (unrecognized definition)", alarm.name),
        })
        .collect()
}
