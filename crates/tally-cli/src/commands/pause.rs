//! Pause command: pause now, or record a pause in the past.

use std::io::Write;

use anyhow::{Result, bail};
use clap::Args;
use tally_core::{PauseReason, Tracker, Transition};

use super::Session;
use super::util::{clock, describe, format_duration, parse_time, write_status};

#[derive(Debug, Args)]
pub struct PauseArgs {
    /// Record a finished pause starting at this time (HH:MM, HH:MM:SS or YYYY-MM-DD HH:MM:SS).
    #[arg(short, long)]
    pub from: Option<String>,

    /// End of the recorded pause; defaults to now.
    #[arg(short, long, requires = "from")]
    pub to: Option<String>,
}

pub fn run<W: Write>(writer: &mut W, session: &mut Session<'_>, args: &PauseArgs) -> Result<()> {
    session.reconcile_gaps(writer)?;
    let now = session.now;
    let mut tracker = Tracker::new(&mut *session.db);
    let Some(active) = tracker.active()? else {
        writeln!(writer, "No timer running")?;
        return Ok(());
    };

    if let Some(from) = &args.from {
        let from = parse_time(from, now)?;
        let to = match &args.to {
            Some(to) => parse_time(to, now)?,
            None => now,
        };
        if to > now {
            bail!("pause cannot end in the future ({})", clock(to));
        }
        let pause = tracker.insert_historical_pause(&active.id, from, to)?;
        writeln!(
            writer,
            "Added pause: {} - {} ({})",
            clock(from),
            clock(to),
            format_duration(pause.duration(now))
        )?;
        return Ok(());
    }

    match tracker.pause(&active.id, PauseReason::Manual, now)? {
        Transition::Unchanged(entry) => {
            writeln!(writer, "Timer is already paused")?;
            write_status(writer, &entry, now)?;
        }
        Transition::Applied(entry) => {
            writeln!(
                writer,
                "Paused timer for {} [{} elapsed]",
                describe(&entry),
                format_duration(entry.duration(now))
            )?;
        }
    }
    Ok(())
}
