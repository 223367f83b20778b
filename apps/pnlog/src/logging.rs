//! Tracing setup and structured mirroring of decoded records
//!
//! Decoded records can be replayed into the tracing pipeline so a `--debug`
//! log file holds the input events next to pnlog's own diagnostics.

use pnlog_config::LoggingConfig;
use pnlog_events::{LifecycleOutput, LogEvent, LogRecord, RootMessage};
use pnlog_types::LogLevel;
use std::path::Path;
use tracing_subscriber::EnvFilter;

/// Log a decoded record at its own level with structured fields
pub fn log_record_with_tracing(position: usize, record: &LogRecord) {
    let family = record.log_target();
    let pkg_id = record.event.pkg_id();
    let time = record.meta.time().map(|t| t.to_rfc3339());

    macro_rules! emit {
        ($($fields:tt)*) => {
            match record.level {
                LogLevel::Debug => tracing::debug!(position, family, pkg_id = ?pkg_id, time = ?time, $($fields)*),
                LogLevel::Info => tracing::info!(position, family, pkg_id = ?pkg_id, time = ?time, $($fields)*),
                LogLevel::Warn => tracing::warn!(position, family, pkg_id = ?pkg_id, time = ?time, $($fields)*),
                LogLevel::Error => tracing::error!(position, family, pkg_id = ?pkg_id, time = ?time, $($fields)*),
            }
        };
    }

    match &record.event {
        LogEvent::Progress(message) => {
            emit!(status = %message.status(), "progress");
        }
        LogEvent::Lifecycle(message) => match &message.output {
            LifecycleOutput::Line(line) => {
                emit!(script = %message.script, line = %line, "lifecycle output");
            }
            LifecycleOutput::ExitCode(code) => {
                emit!(script = %message.script, exit_code = code, "lifecycle exit");
            }
        },
        LogEvent::Root(RootMessage::Added(dep)) => {
            emit!(dependency = %dep.name, version = %dep.version, dependency_type = %dep.dependency_type, "dependency added");
        }
        LogEvent::Root(RootMessage::Removed(dep)) => {
            emit!(dependency = %dep.name, version = ?dep.version, dependency_type = %dep.dependency_type, "dependency removed");
        }
        LogEvent::Deprecation(message) => {
            emit!(depth = message.depth, deprecated = %message.deprecated, "deprecated package");
        }
        LogEvent::InstallCheck(message) => {
            emit!(code = %message.code, "install check");
        }
        LogEvent::Registry(message) => {
            emit!(text = %message.message, "registry");
        }
        LogEvent::Base(message) => {
            emit!(text = ?message.message(), extra = message.extra().len(), "message");
        }
        LogEvent::Stage(stage) => {
            emit!(stage = stage.as_str(), "stage");
        }
        LogEvent::Summary(_) => {
            emit!("summary");
        }
    }
}

/// Initialize tracing/logging
///
/// JSON output mode keeps stdout and stderr clean unless `--debug` sends
/// diagnostics to a file.
pub fn init_tracing(json_mode: bool, debug_enabled: bool, config: &LoggingConfig) {
    let filter = |default: &str| {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
    };

    if debug_enabled {
        match create_log_file(&config.log_dir()) {
            Ok((file, path)) => {
                tracing_subscriber::fmt()
                    .json()
                    .with_writer(file)
                    .with_env_filter(filter("debug"))
                    .init();
                if !json_mode {
                    eprintln!("Debug logging enabled: {}", path.display());
                }
                return;
            }
            Err(e) => {
                if !json_mode {
                    eprintln!("Warning: Failed to create log file: {e}");
                }
            }
        }
    }

    if json_mode {
        tracing_subscriber::fmt()
            .with_writer(std::io::sink)
            .with_env_filter("off")
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(filter(config.filter()))
            .init();
    }
}

fn create_log_file(log_dir: &Path) -> std::io::Result<(std::fs::File, std::path::PathBuf)> {
    std::fs::create_dir_all(log_dir)?;
    let path = log_dir.join(format!(
        "pnlog-{}.log",
        chrono::Utc::now().format("%Y%m%d-%H%M%S")
    ));
    let file = std::fs::File::create(&path)?;
    Ok((file, path))
}
