//! CLI argument definitions using clap derive API

use clap::{Args, Parser, Subcommand, ValueEnum};

/// alarm-craft - Keep CloudWatch alarms in sync with your resources
#[derive(Parser, Debug)]
#[command(name = "alarm-craft")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Global arguments available to all commands
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file (default: alarm-config.yaml/.yml/.json in the current directory)
    #[arg(short = 'c', long, global = true, env = "ALARM_CRAFT_CONFIG")]
    pub config_file: Option<String>,

    /// AWS region, overriding the environment and profile
    #[arg(long, global = true)]
    pub region: Option<String>,

    /// Named AWS profile
    #[arg(long, global = true)]
    pub profile: Option<String>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the alarm change set without applying it
    Plan(PlanArgs),

    /// Compute the change set and apply it
    Apply(ApplyArgs),

    /// List alarms currently owned by alarm-craft
    Ls(LsArgs),

    /// Load and validate the config without calling AWS
    Validate(ValidateArgs),

    /// Write a starter config file
    Init(InitArgs),
}

/// Options shared by plan and apply
#[derive(Args, Debug, Clone)]
pub struct ChangeSetArgs {
    /// Put every desired alarm, including unchanged ones
    #[arg(short = 'u', long)]
    pub update_all: bool,

    /// SNS topic notified on every alarm state change (repeatable)
    #[arg(short = 'n', long = "notification-topic-arn", value_name = "ARN")]
    pub notification_topic_arns: Vec<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,
}

/// Arguments for the plan command
#[derive(Args, Debug)]
pub struct PlanArgs {
    #[command(flatten)]
    pub change_set: ChangeSetArgs,
}

/// Arguments for the apply command
#[derive(Args, Debug)]
pub struct ApplyArgs {
    #[command(flatten)]
    pub change_set: ChangeSetArgs,

    /// Apply without asking for confirmation
    #[arg(short = 'f', long)]
    pub no_confirm_changeset: bool,

    /// Run budget in seconds, covering discovery and apply
    ///
    /// Planning past the budget aborts with nothing changed; during apply,
    /// no new operations start once it is spent. Time at the confirmation
    /// prompt is not counted.
    #[arg(long, value_name = "SECS")]
    pub timeout_secs: Option<u64>,
}

/// Arguments for the ls command
#[derive(Args, Debug)]
pub struct LsArgs {
    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,
}

/// Arguments for the validate command
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Print the compiled selectors
    #[arg(long)]
    pub show_selectors: bool,
}

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Directory to write alarm-config.yaml into
    #[arg(default_value = ".")]
    pub dir: String,

    /// Overwrite an existing config file
    #[arg(long)]
    pub force: bool,
}

/// Output formats
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable text
    Text,
    /// JSON output
    Json,
}

#[cfg(test)]
#[path = "cli_test.rs"]
mod tests;
