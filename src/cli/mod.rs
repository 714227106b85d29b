//! Command Line Interface (CLI) layer for qytools.
//!
//! This module defines argument parsing (`args`), error types (`errors`),
//! the progress bar sink (`progress`) and the orchestration logic (`runner`)
//! for the crop, grid and stats subcommands. It wires user-provided options
//! to the library functionality exposed via `qytools::api`.
//!
//! If you are embedding qytools into another application, prefer using
//! the high-level `qytools::api` module instead of calling the CLI code.
pub mod args;
pub mod errors;
pub mod progress;
pub mod runner;

pub use args::CliArgs;
pub use runner::run;
