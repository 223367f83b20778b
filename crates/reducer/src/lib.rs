#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Folds a decoded event stream into the state of one install run
//!
//! The reducer is best-effort: events arriving out of the expected order
//! (progress before `fetching_started`, anything after `summary`) are
//! applied anyway and noted as [`Anomaly`] entries. Nothing here fails.

mod package;
mod state;
mod summary;

pub use package::{PackageProgress, RequestState, ScriptState};
pub use state::RunState;
pub use summary::{Anomaly, DecodeErrorCounts, LevelCounts, PackageSummary, RunSummary, Totals};
