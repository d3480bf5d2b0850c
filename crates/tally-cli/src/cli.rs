//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::commands::delete::DeleteArgs;
use crate::commands::edit::EditArgs;
use crate::commands::log::LogArgs;
use crate::commands::pause::PauseArgs;
use crate::commands::report::ReportArgs;
use crate::commands::resume::ResumeArgs;
use crate::commands::start::StartArgs;

/// Personal time tracker.
///
/// Tracks one entry at a time, excluding pauses and time the machine spent
/// asleep or with the display off.
#[derive(Debug, Parser)]
#[command(name = "tally", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Start tracking: `tally start @project [title words] [+tag ...]`.
    Start(StartArgs),

    /// Stop the active entry.
    Stop,

    /// Pause the active entry, or record a past pause with --from.
    Pause(PauseArgs),

    /// Resume a paused entry, reopen the last one, or switch to a project.
    Resume(ResumeArgs),

    /// Show the active entry.
    Status,

    /// List entries.
    Log(LogArgs),

    /// Time totals for a period: `tally report [period] [@project] [+tag ...]`.
    Report(ReportArgs),

    /// Edit an entry in $EDITOR.
    Edit(EditArgs),

    /// Delete an entry.
    Delete(DeleteArgs),
}
