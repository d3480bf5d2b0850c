//! Stop command.

use std::io::Write;

use anyhow::Result;
use tally_core::Tracker;

use super::Session;
use super::util::{describe, format_duration};

pub fn run<W: Write>(writer: &mut W, session: &mut Session<'_>) -> Result<()> {
    session.reconcile_gaps(writer)?;
    let mut tracker = Tracker::new(&mut *session.db);
    let Some(active) = tracker.active()? else {
        writeln!(writer, "No timer running")?;
        return Ok(());
    };
    let entry = tracker.stop(&active.id, session.now)?;
    writeln!(
        writer,
        "Stopped timer for {} [{}]",
        describe(&entry),
        format_duration(entry.duration(session.now))
    )?;
    Ok(())
}
