//! Tally CLI library.
//!
//! Command implementations, configuration, confirmation prompts, and the
//! `pmset` gap signal source behind the `tally` binary.

mod cli;
pub mod commands;
mod config;
pub mod prompt;
pub mod signal;

pub use cli::{Cli, Commands};
pub use config::{Config, GapSourceKind};
