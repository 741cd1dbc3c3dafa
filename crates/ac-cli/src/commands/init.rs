//! Init command implementation - writes a starter alarm-config.yaml

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use crate::cli::InitArgs;

pub(crate) const CONFIG_FILE_NAME: &str = "alarm-config.yaml";

pub(crate) const STARTER_CONFIG: &str = r#"# alarm-craft configuration
#
# Every alarm alarm-craft creates is named
#   <alarm_name_prefix>-<resource name>-<metric name>
# and alarms with that prefix that are no longer wanted are deleted.

globals:
  alarm:
    alarm_name_prefix: alarm-craft-autogen
    default_alarm_params:
      Statistic: Sum
      Period: 60
      EvaluationPeriods: 1
      Threshold: 1
      ComparisonOperator: GreaterThanOrEqualToThreshold
      TreatMissingData: notBreaching
    alarm_tags:
      ManagedBy: alarm-craft
    # notification_topic_arns:
    #   - arn:aws:sns:us-east-1:123456789012:oncall
  # resource_filter:
  #   target_resource_tags:
  #     env: prod
  api_call_interval_ms: 334
  max_concurrency: 4
  max_retries: 5

resources:
  lambda_functions:
    target_resource_type: lambda:function
    alarm:
      metrics:
        - Errors
        - Throttles
  state_machines:
    target_resource_type: states:stateMachine
    alarm:
      metrics:
        - ExecutionsFailed
  sqs_queues:
    target_resource_type: sqs:queue
    alarm:
      metrics:
        - ApproximateAgeOfOldestMessage
      alarm_param_overrides:
        ApproximateAgeOfOldestMessage:
          Statistic: Maximum
          Threshold: 300
"#;

/// Execute the init command
pub(crate) async fn execute(args: &InitArgs) -> Result<()> {
    let path = write_starter_config(Path::new(&args.dir), args.force)?;
    println!("Wrote {}", path.display());
    println!("Review the selectors, then run `alarm-craft plan`.");
    Ok(())
}

fn write_starter_config(dir: &Path, force: bool) -> Result<std::path::PathBuf> {
    if !dir.is_dir() {
        anyhow::bail!("Directory '{}' does not exist", dir.display());
    }
    let path = dir.join(CONFIG_FILE_NAME);
    if path.exists() && !force {
        anyhow::bail!(
            "'{}' already exists. Pass --force to overwrite it.",
            path.display()
        );
    }
    fs::write(&path, STARTER_CONFIG)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}

#[cfg(test)]
#[path = "init_test.rs"]
mod tests;
