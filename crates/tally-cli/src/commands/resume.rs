//! Resume command: continue a paused entry, reopen a stopped one, or pick
//! a project back up.

use std::io::{BufRead, Write};

use anyhow::Result;
use chrono::{DateTime, Utc};
use clap::Args;
use tally_core::timefmt::format_local;
use tally_core::{Entry, ProjectName, ResumeOutcome, Tracker};

use super::Session;
use super::util::{describe, format_duration, tag_suffix, write_status};
use crate::prompt::Prompt;

#[derive(Debug, Args)]
pub struct ResumeArgs {
    /// Project to resume (`@project`); stops any other active entry.
    #[arg(value_name = "@PROJECT")]
    pub project: Option<String>,

    /// Reopen without asking for confirmation.
    #[arg(short, long)]
    pub yes: bool,
}

pub fn run<W: Write, R: BufRead>(
    writer: &mut W,
    session: &mut Session<'_>,
    prompt: &mut Prompt<R>,
    args: &ResumeArgs,
) -> Result<()> {
    let project = args
        .project
        .as_deref()
        .map(|name| ProjectName::new(name.trim_start_matches('@')))
        .transpose()?;
    session.reconcile_gaps(writer)?;
    let now = session.now;

    let mut prompt_error = None;
    let resumption = {
        let yes = args.yes;
        let mut confirm = |entry: &Entry, at: DateTime<Utc>| -> bool {
            if yes {
                return true;
            }
            match confirm_reopen(&mut *writer, &mut *prompt, entry, at) {
                Ok(answer) => answer,
                Err(err) => {
                    prompt_error = Some(err);
                    false
                }
            }
        };
        Tracker::new(&mut *session.db).resolve_resume(project.as_ref(), now, &mut confirm)?
    };
    if let Some(err) = prompt_error {
        return Err(err);
    }

    if let Some(stopped) = &resumption.stopped {
        writeln!(
            writer,
            "Stopped timer for {} [{}]",
            describe(stopped),
            format_duration(stopped.duration(now))
        )?;
    }
    match resumption.outcome {
        ResumeOutcome::AlreadyRunning(entry) => {
            writeln!(writer, "Timer is already running")?;
            write_status(writer, &entry, now)?;
        }
        ResumeOutcome::Resumed(entry) => {
            writeln!(writer, "Resumed timer for {}", describe(&entry))?;
        }
        ResumeOutcome::Reopened { entry, gap } => {
            writeln!(
                writer,
                "Reopened timer for {} (excluded {} gap)",
                describe(&entry),
                format_duration(gap.duration(now))
            )?;
        }
        ResumeOutcome::Cloned { entry, .. } => {
            writeln!(
                writer,
                "Started timer for {}{}",
                describe(&entry),
                tag_suffix(&entry)
            )?;
        }
        ResumeOutcome::Declined(_) => writeln!(writer, "Cancelled")?,
        ResumeOutcome::NothingToResume => writeln!(writer, "No timer to resume")?,
    }
    Ok(())
}

/// Shows the stopped entry and asks whether to reopen it.
fn confirm_reopen<W: Write, R: BufRead>(
    writer: &mut W,
    prompt: &mut Prompt<R>,
    entry: &Entry,
    at: DateTime<Utc>,
) -> Result<bool> {
    writeln!(writer, "Last entry:")?;
    writeln!(writer, "  Project: @{}", entry.project)?;
    if let Some(title) = &entry.title {
        writeln!(writer, "  Title:   {title}")?;
    }
    if !entry.tags.is_empty() {
        writeln!(writer, "  Tags:    {}", entry.tag_list())?;
    }
    writeln!(writer, "  Started: {}", format_local(entry.start_time))?;
    if let Some(end_time) = entry.end_time {
        writeln!(writer, "  Stopped: {}", format_local(end_time))?;
        writeln!(writer, "  Gap:     {} ago", format_duration(at - end_time))?;
    }
    writeln!(writer)?;
    prompt.confirm(writer, "Reopen this entry? A pause will be created for the gap.")
}
