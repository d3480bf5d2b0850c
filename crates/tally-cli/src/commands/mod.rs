//! CLI subcommand implementations.

use std::io::Write;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use tally_core::{GapSignalSource, reconcile};
use tally_db::Database;

pub mod delete;
pub mod edit;
pub mod log;
pub mod pause;
pub mod report;
pub mod resume;
pub mod start;
pub mod status;
pub mod stop;
pub mod util;

/// What a tracking command runs against.
pub struct Session<'a> {
    pub db: &'a mut Database,
    pub signals: &'a dyn GapSignalSource,
    /// Wall-clock time of this invocation.
    pub now: DateTime<Utc>,
}

impl Session<'_> {
    /// Records sleep and display-off gaps of the active entry as pauses,
    /// reporting each new one to `writer`.
    ///
    /// An unreadable signal source is reported as a warning line and the
    /// command carries on.
    pub fn reconcile_gaps<W: Write>(&mut self, writer: &mut W) -> Result<()> {
        let result = reconcile(&mut *self.db, self.signals).context("failed to reconcile gaps")?;
        if let Some(err) = &result.warning {
            writeln!(writer, "Warning: {err}; gap detection skipped")?;
        }
        for pause in &result.created {
            writeln!(
                writer,
                "Excluded {} of {} time",
                util::format_duration(pause.duration(self.now)),
                util::reason_label(pause.reason)
            )?;
        }
        Ok(())
    }
}
