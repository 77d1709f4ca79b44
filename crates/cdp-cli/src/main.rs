//! Commit Data Platform CLI.

use clap::{ColorChoice, Parser};
use std::io::{self, IsTerminal};
use tracing::level_filters::LevelFilter;

mod cli;
mod commands;
mod logging;
mod summary;

use crate::cli::{Cli, Command, LogFormatArg, LogLevelArg};
use crate::commands::{run_ingest, run_pipeline, run_train, run_transform, run_validate};
use crate::logging::{LogConfig, LogFormat, init_logging};

fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    cli.color.write_global();
    let log_config = log_config_from_cli(&cli);
    if let Err(error) = init_logging(&log_config) {
        eprintln!("error: failed to initialize logging: {error}");
        std::process::exit(1);
    }
    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(error) => {
            eprintln!("error: failed to start runtime: {error}");
            std::process::exit(1);
        }
    };
    let exit_code = match cli.command {
        Command::Ingest(args) => to_exit_code(runtime.block_on(run_ingest(&args))),
        Command::Transform(args) => to_exit_code(runtime.block_on(run_transform(&args))),
        Command::Validate(args) => match runtime.block_on(run_validate(&args)) {
            Ok(passed) => {
                if passed {
                    0
                } else {
                    1
                }
            }
            Err(error) => {
                eprintln!("error: {error}");
                1
            }
        },
        Command::Train => to_exit_code(runtime.block_on(run_train())),
        Command::Run => to_exit_code(runtime.block_on(run_pipeline())),
    };
    std::process::exit(exit_code);
}

fn to_exit_code(result: anyhow::Result<()>) -> i32 {
    match result {
        Ok(()) => 0,
        Err(error) => {
            eprintln!("error: {error}");
            1
        }
    }
}

/// Build logging configuration from CLI flags with consistent precedence.
fn log_config_from_cli(cli: &Cli) -> LogConfig {
    let mut config = LogConfig {
        level_filter: cli.verbosity.tracing_level_filter(),
        ..LogConfig::default()
    };
    config.use_env_filter = !(cli.verbosity.is_present() || cli.log_level.is_some());
    if let Some(level) = cli.log_level {
        config.level_filter = match level {
            LogLevelArg::Error => LevelFilter::ERROR,
            LogLevelArg::Warn => LevelFilter::WARN,
            LogLevelArg::Info => LevelFilter::INFO,
            LogLevelArg::Debug => LevelFilter::DEBUG,
            LogLevelArg::Trace => LevelFilter::TRACE,
        };
    }
    config.format = match cli.log_format {
        LogFormatArg::Pretty => LogFormat::Pretty,
        LogFormatArg::Compact => LogFormat::Compact,
        LogFormatArg::Json => LogFormat::Json,
    };
    config.log_file = cli.log_file.clone();
    config.with_ansi = match cli.color.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => cli.log_file.is_none() && io::stderr().is_terminal(),
    };
    config
}
