//! Status command for the active entry.

use std::io::Write;

use anyhow::Result;
use tally_core::Tracker;

use super::Session;
use super::util::write_status;

pub fn run<W: Write>(writer: &mut W, session: &mut Session<'_>) -> Result<()> {
    session.reconcile_gaps(writer)?;
    match Tracker::new(&mut *session.db).active()? {
        Some(entry) => write_status(writer, &entry, session.now),
        None => {
            writeln!(writer, "No timer running")?;
            Ok(())
        }
    }
}
