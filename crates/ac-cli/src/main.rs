//! alarm-craft CLI - keep CloudWatch alarms in sync with your resources

use ac_core::CoreError;
use ac_engine::EngineError;
use clap::Parser;

mod cli;
mod commands;

use cli::Cli;
use commands::{apply, common, init, ls, plan, validate};

#[tokio::main]
async fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    init_logging(cli.global.verbose);

    let result = match &cli.command {
        cli::Commands::Plan(args) => plan::execute(args, &cli.global).await,
        cli::Commands::Apply(args) => apply::execute(args, &cli.global).await,
        cli::Commands::Ls(args) => ls::execute(args, &cli.global).await,
        cli::Commands::Validate(args) => validate::execute(args, &cli.global).await,
        cli::Commands::Init(args) => init::execute(args).await,
    };

    match result {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(err) => {
            if let Some(code) = err.downcast_ref::<common::ExitCode>() {
                return exit_code(code.0);
            }
            eprintln!("Error: {:#}", err);
            exit_code(failure_code(&err))
        }
    }
}

/// `RUST_LOG` wins, then `ALARM_CRAFT_LOG`, then the verbosity flag.
fn init_logging(verbose: bool) {
    let filters = std::env::var("RUST_LOG")
        .or_else(|_| std::env::var("ALARM_CRAFT_LOG"))
        .unwrap_or_else(|_| if verbose { "debug" } else { "info" }.to_string());
    env_logger::Builder::new()
        .parse_filters(&filters)
        .format_target(verbose)
        .init();
}

/// Configuration problems exit with 2, everything else with 1.
fn failure_code(err: &anyhow::Error) -> i32 {
    let is_config = err.chain().any(|cause| {
        cause.downcast_ref::<CoreError>().is_some()
            || cause
                .downcast_ref::<EngineError>()
                .is_some_and(EngineError::is_fatal_config)
    });
    if is_config {
        2
    } else {
        1
    }
}

fn exit_code(code: i32) -> std::process::ExitCode {
    std::process::ExitCode::from(u8::try_from(code).unwrap_or(1))
}
