//! Log command: list entries, newest first.

use std::fmt::Write as _;
use std::io::Write;

use anyhow::{Result, bail};
use chrono::{DateTime, Local, Utc};
use clap::Args;
use serde::Serialize;
use tally_core::{Entry, EntryFilter, EntryStatus, EntryStore, ProjectName, TagName};

use super::Session;
use super::util::{format_duration_short, parse_day_end, parse_day_start};

const TITLE_WIDTH: usize = 30;

#[derive(Debug, Args)]
pub struct LogArgs {
    /// `@project` and `+tag` filters.
    #[arg(value_name = "FILTER")]
    pub filters: Vec<String>,

    /// Number of entries to show.
    #[arg(short = 'n', long, default_value_t = 10)]
    pub limit: usize,

    /// First day to include (YYYY-MM-DD).
    #[arg(long)]
    pub from: Option<String>,

    /// Last day to include (YYYY-MM-DD).
    #[arg(long)]
    pub to: Option<String>,

    /// Output as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Builds the store filter from `@project`/`+tag` words and date bounds.
pub fn build_filter(args: &LogArgs) -> Result<EntryFilter> {
    let mut filter = EntryFilter {
        limit: Some(args.limit),
        ..EntryFilter::default()
    };
    for word in &args.filters {
        if let Some(name) = word.strip_prefix('@') {
            if filter.project.is_some() {
                bail!("multiple projects specified");
            }
            filter.project = Some(ProjectName::new(name)?);
        } else if let Some(name) = word.strip_prefix('+') {
            filter.tags.push(TagName::new(name)?);
        } else {
            bail!("unexpected filter {word:?} (use @project or +tag)");
        }
    }
    filter.from = args.from.as_deref().map(parse_day_start).transpose()?;
    filter.to = args.to.as_deref().map(parse_day_end).transpose()?;
    Ok(filter)
}

/// One row of JSON output.
#[derive(Debug, Serialize)]
pub struct JsonEntry<'a> {
    #[serde(flatten)]
    pub entry: &'a Entry,
    /// Active time in seconds as of the listing.
    pub duration_secs: i64,
}

/// Formats entries as JSON.
pub fn format_entries_json(entries: &[Entry], now: DateTime<Utc>) -> Result<String> {
    let rows: Vec<JsonEntry<'_>> = entries
        .iter()
        .map(|entry| JsonEntry {
            entry,
            duration_secs: entry.duration(now).num_seconds(),
        })
        .collect();
    Ok(serde_json::to_string_pretty(&rows)?)
}

/// Formats entries as an aligned table.
pub fn format_entries(entries: &[Entry], now: DateTime<Utc>) -> String {
    let mut output = String::new();
    if entries.is_empty() {
        writeln!(output, "No entries found").unwrap();
        return output;
    }

    let header = ["ID", "Project", "Title", "Duration", "Tags", "Date"].map(String::from);
    let rows: Vec<[String; 6]> = entries.iter().map(|entry| row(entry, now)).collect();
    let mut widths = header.clone().map(|cell| cell.chars().count());
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    for cells in std::iter::once(&header).chain(&rows) {
        let mut line = String::new();
        for (i, (cell, width)) in cells.iter().zip(widths).enumerate() {
            if i + 1 == cells.len() {
                line.push_str(cell);
            } else {
                write!(line, "{cell:<width$}  ").unwrap();
            }
        }
        writeln!(output, "{}", line.trim_end()).unwrap();
    }
    writeln!(output).unwrap();
    writeln!(output, "* = running, ~ = paused").unwrap();
    output
}

fn row(entry: &Entry, now: DateTime<Utc>) -> [String; 6] {
    let marker = match entry.status {
        EntryStatus::Running => "*",
        EntryStatus::Paused => "~",
        EntryStatus::Stopped => "",
    };
    let title = entry.title.as_deref().unwrap_or_default();
    // Truncate by characters, not bytes
    let title = if title.chars().count() > TITLE_WIDTH {
        format!("{}...", title.chars().take(TITLE_WIDTH - 3).collect::<String>())
    } else {
        title.to_string()
    };
    let tags = entry
        .tags
        .iter()
        .map(TagName::as_str)
        .collect::<Vec<_>>()
        .join(", ");
    [
        entry.id.to_string(),
        format!("@{}", entry.project),
        title,
        format!("{}{marker}", format_duration_short(entry.duration(now))),
        tags,
        entry
            .start_time
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M")
            .to_string(),
    ]
}

pub fn run<W: Write>(writer: &mut W, session: &Session<'_>, args: &LogArgs) -> Result<()> {
    let filter = build_filter(args)?;
    let entries = session.db.list_entries(&filter)?;
    tracing::debug!(count = entries.len(), "listed entries");
    if args.json {
        writeln!(writer, "{}", format_entries_json(&entries, session.now)?)?;
    } else {
        write!(writer, "{}", format_entries(&entries, session.now))?;
    }
    Ok(())
}
