//! Command line interface definition

use clap::{Parser, Subcommand};
use pnlog_types::ColorChoice;
use std::path::{Path, PathBuf};

/// pnlog - Decode, validate and summarize package manager event logs
#[derive(Parser)]
#[command(name = "pnlog")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Decode, validate and summarize package manager event logs")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalArgs,
}

/// Global arguments available for all commands
#[derive(Parser)]
pub struct GlobalArgs {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Write JSON diagnostics to a log file and mirror decoded records into it
    #[arg(long, global = true)]
    pub debug: bool,

    /// Color output control
    #[arg(long, global = true, value_enum)]
    pub color: Option<ColorChoice>,

    /// Use alternate config file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Reject records larger than this many bytes
    #[arg(long, global = true, value_name = "N", value_parser = clap::value_parser!(u64).range(1..))]
    pub max_record_bytes: Option<u64>,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Print every decoded event and every rejected record
    #[command(alias = "d")]
    Decode {
        /// Log file, or `-` for stdin
        file: Option<PathBuf>,
    },

    /// Print rejected records only; exit with status 1 if there are any
    Check {
        /// Log file, or `-` for stdin
        file: Option<PathBuf>,
    },

    /// Fold the log into per-package progress and run totals
    #[command(alias = "sum")]
    Summary {
        /// Log file, or `-` for stdin
        file: Option<PathBuf>,
    },
}

impl Commands {
    /// Input file, `None` meaning stdin.
    pub fn input(&self) -> Option<&Path> {
        let (Self::Decode { file } | Self::Check { file } | Self::Summary { file }) = self;
        file.as_deref().filter(|path| *path != Path::new("-"))
    }
}
