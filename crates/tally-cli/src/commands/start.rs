//! Start command: begin tracking a new entry.

use std::io::Write;

use anyhow::{Result, bail};
use clap::Args;
use tally_core::{ProjectName, TrackError, Tracker};

use super::Session;
use super::util::{describe, tag_suffix, write_status};

#[derive(Debug, Args)]
pub struct StartArgs {
    /// `@project`, then any `+tag`s and title words in any order.
    #[arg(required = true, num_args = 1.., value_name = "@PROJECT [TITLE] [+TAG]")]
    pub words: Vec<String>,
}

/// Parsed `start` words.
#[derive(Debug, PartialEq, Eq)]
pub struct StartRequest {
    pub project: String,
    pub title: Option<String>,
    pub tags: Vec<String>,
}

/// Splits `@project`, `+tag` and title words.
///
/// Exactly one project is required; remaining words join into the title.
pub fn parse_start_args(words: &[String]) -> Result<StartRequest> {
    let mut project: Option<String> = None;
    let mut title_words: Vec<&str> = Vec::new();
    let mut tags = Vec::new();
    for word in words {
        if let Some(name) = word.strip_prefix('@') {
            if project.is_some() {
                bail!("multiple projects specified");
            }
            project = Some(name.to_string());
        } else if let Some(tag) = word.strip_prefix('+') {
            tags.push(tag.to_string());
        } else {
            title_words.push(word);
        }
    }
    let Some(project) = project else {
        bail!("project is required (use @projectname)");
    };
    let title = Some(title_words.join(" ")).filter(|t| !t.trim().is_empty());
    Ok(StartRequest {
        project,
        title,
        tags,
    })
}

pub fn run<W: Write>(writer: &mut W, session: &mut Session<'_>, args: &StartArgs) -> Result<()> {
    let request = parse_start_args(&args.words)?;
    let project = ProjectName::new(request.project)?;
    session.reconcile_gaps(writer)?;

    let mut tracker = Tracker::new(&mut *session.db);
    let tags: Vec<&str> = request.tags.iter().map(String::as_str).collect();
    match tracker.start(project, request.title, &tags, session.now) {
        Ok(entry) => {
            writeln!(
                writer,
                "Started timer for {}{}",
                describe(&entry),
                tag_suffix(&entry)
            )?;
        }
        Err(TrackError::ActiveEntryExists { active }) => {
            let active = tracker.get(&active)?;
            writeln!(writer, "Timer already running:")?;
            write_status(writer, &active, session.now)?;
        }
        Err(err) => return Err(err.into()),
    }
    Ok(())
}
