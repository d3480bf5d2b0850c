//! Delete command.

use std::io::{BufRead, Write};

use anyhow::Result;
use chrono::Local;
use clap::Args;
use tally_core::{EntryId, Tracker};

use super::Session;
use super::util::format_duration;
use crate::prompt::Prompt;

#[derive(Debug, Args)]
pub struct DeleteArgs {
    /// Entry to delete; defaults to the most recent entry.
    pub id: Option<String>,

    /// Skip the confirmation prompt.
    #[arg(short, long)]
    pub force: bool,
}

pub fn run<W: Write, R: BufRead>(
    writer: &mut W,
    session: &mut Session<'_>,
    prompt: &mut Prompt<R>,
    args: &DeleteArgs,
) -> Result<()> {
    let mut tracker = Tracker::new(&mut *session.db);
    let entry = match &args.id {
        Some(id) => tracker.get(&EntryId::new(id.as_str())?)?,
        None => match tracker.last(None)? {
            Some(entry) => entry,
            None => {
                writeln!(writer, "No entries to delete")?;
                return Ok(());
            }
        },
    };

    writeln!(writer, "Entry: {}", entry.id)?;
    writeln!(writer, "  Project: @{}", entry.project)?;
    if let Some(title) = &entry.title {
        writeln!(writer, "  Title:   {title}")?;
    }
    writeln!(
        writer,
        "  Date:    {}",
        entry.start_time.with_timezone(&Local).format("%Y-%m-%d %H:%M")
    )?;
    writeln!(
        writer,
        "  Duration: {}",
        format_duration(entry.duration(session.now))
    )?;
    writeln!(writer)?;

    if !args.force && !prompt.confirm(writer, "Delete this entry?")? {
        writeln!(writer, "Cancelled")?;
        return Ok(());
    }
    tracker.delete(&entry.id)?;
    writeln!(writer, "Entry deleted")?;
    Ok(())
}
