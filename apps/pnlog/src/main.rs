//! pnlog - decode, validate and summarize package manager event logs
//!
//! Reads a JSON Lines event log from a file or stdin and either prints the
//! decoded events, reports the records that fail to decode, or folds the
//! run into per-package progress.

mod cli;
mod display;
mod error;
mod logging;

use crate::cli::{Cli, Commands, GlobalArgs};
use crate::display::OutputRenderer;
use crate::error::CliError;
use clap::Parser;
use pnlog_config::Config;
use pnlog_reducer::RunState;
use pnlog_stream::{DecodeOptions, RecordSource};
use pnlog_types::{ColorChoice, OutputFormat};
use std::process;
use tracing::{debug, error, info};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Logging settings live in the config, so it is loaded before tracing starts
    let config = match load_config(&cli.global).await {
        Ok(config) => config,
        Err(e) => {
            report_error(&e, cli.global.json);
            process::exit(1);
        }
    };
    let json_mode = config.general.output == OutputFormat::Json;

    logging::init_tracing(json_mode, cli.global.debug, &config.logging);

    match run(cli, config).await {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(e) => {
            error!("Application error: {}", e);
            report_error(&e, json_mode);
            process::exit(1);
        }
    }
}

/// Main application logic. `Ok(false)` means the command ran but found problems.
async fn run(cli: Cli, config: Config) -> Result<bool, CliError> {
    info!("Starting pnlog v{}", env!("CARGO_PKG_VERSION"));

    let options = DecodeOptions::default()
        .with_max_record_bytes(config.decoder.max_record_bytes)
        .with_ignore_blank(config.decoder.ignore_blank);
    let color = match config.general.output {
        OutputFormat::Plain => ColorChoice::Never,
        OutputFormat::Tty | OutputFormat::Json => config.general.color,
    };
    let renderer = OutputRenderer::new(config.general.output == OutputFormat::Json, color);
    let mirror = cli.global.debug;
    let command = cli.command;

    // Decoding pulls from a blocking reader
    tokio::task::spawn_blocking(move || execute_command(&command, options, &renderer, mirror))
        .await
        .map_err(|e| CliError::Pnlog(pnlog_errors::Error::internal(format!("command task failed: {e}"))))?
}

/// Execute the specified command
fn execute_command(
    command: &Commands,
    options: DecodeOptions,
    renderer: &OutputRenderer,
    mirror: bool,
) -> Result<bool, CliError> {
    let source = match command.input() {
        Some(path) => RecordSource::open(path)?,
        None => RecordSource::stdin(),
    };
    debug!(source = source.label(), ?options, "decoding");
    let mut decoder = source.decode(options);

    let clean = match command {
        Commands::Decode { .. } => {
            while let Some(outcome) = decoder.next() {
                let position = decoder.position();
                if let (true, Ok(record)) = (mirror, &outcome) {
                    logging::log_record_with_tracing(position, record);
                }
                renderer.render_outcome(position, &outcome)?;
            }
            true
        }

        Commands::Check { .. } => {
            let mut records = 0;
            let mut rejected = 0;
            while let Some(outcome) = decoder.next() {
                records += 1;
                if outcome.is_err() {
                    rejected += 1;
                    renderer.render_outcome(decoder.position(), &outcome)?;
                }
            }
            renderer.render_check_totals(records, rejected)?;
            rejected == 0
        }

        Commands::Summary { .. } => {
            let mut state = RunState::new();
            for outcome in decoder.by_ref() {
                state.apply_outcome(&outcome);
            }
            renderer.render_summary(&state.summary())?;
            true
        }
    };

    if let Some(err) = decoder.get_mut().take_error() {
        renderer.render_read_error(&err)?;
        return Ok(false);
    }

    info!("Command completed");
    Ok(clean)
}

/// Load configuration with precedence file < environment < CLI flags
async fn load_config(global: &GlobalArgs) -> Result<Config, CliError> {
    let mut config = Config::load_or_default(global.config.as_deref()).await?;
    config.merge_env()?;
    apply_cli_config(&mut config, global)?;
    Ok(config)
}

/// Apply CLI configuration overrides (highest precedence)
fn apply_cli_config(config: &mut Config, global: &GlobalArgs) -> Result<(), CliError> {
    if let Some(color) = global.color {
        config.general.color = color;
    }
    if global.json {
        config.general.output = OutputFormat::Json;
    }
    if let Some(bytes) = global.max_record_bytes {
        config.decoder.max_record_bytes = usize::try_from(bytes).map_err(|_| {
            CliError::InvalidArguments(format!("--max-record-bytes {bytes} is too large"))
        })?;
    }
    Ok(())
}

fn report_error(e: &CliError, json_mode: bool) {
    if json_mode {
        println!("{}", e.to_json());
    } else {
        eprintln!("Error: {e}");
    }
}
