//! Configuration sections and their defaults

use pnlog_types::{ColorChoice, OutputFormat};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Presentation settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneralConfig {
    #[serde(default = "default_output_format")]
    pub output: OutputFormat,
    #[serde(default = "default_color_choice")]
    pub color: ColorChoice,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            output: OutputFormat::Tty,
            color: ColorChoice::Auto,
        }
    }
}

/// Stream decoder settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecoderConfig {
    /// Records larger than this are rejected as malformed.
    #[serde(default = "default_max_record_bytes")]
    pub max_record_bytes: usize,
    #[serde(default = "default_ignore_blank")]
    pub ignore_blank: bool,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            max_record_bytes: default_max_record_bytes(),
            ignore_blank: default_ignore_blank(),
        }
    }
}

/// Diagnostics of the pnlog binary itself
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct LoggingConfig {
    /// `EnvFilter` directives used when `RUST_LOG` is unset.
    pub filter: Option<String>,
    /// Where `--debug` writes its JSON log files.
    pub log_dir: Option<PathBuf>,
}

impl LoggingConfig {
    #[must_use]
    pub fn filter(&self) -> &str {
        self.filter.as_deref().unwrap_or("warn")
    }

    #[must_use]
    pub fn log_dir(&self) -> PathBuf {
        self.log_dir.clone().unwrap_or_else(|| {
            dirs::data_local_dir()
                .unwrap_or_else(std::env::temp_dir)
                .join("pnlog")
                .join("logs")
        })
    }
}

fn default_output_format() -> OutputFormat {
    OutputFormat::Tty
}

fn default_color_choice() -> ColorChoice {
    ColorChoice::Auto
}

fn default_max_record_bytes() -> usize {
    1024 * 1024
}

fn default_ignore_blank() -> bool {
    true
}
