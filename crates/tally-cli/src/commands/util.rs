//! Shared utilities for CLI commands.

use std::io::Write;

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Local, NaiveDate, Utc};
use tally_core::timefmt::{local_to_utc, parse_time_input};
use tally_core::{Entry, EntryStatus, PauseReason};

/// Formats a duration as `Xh Ym Zs`, `Ym Zs` or `Zs`, rounded to the second.
pub fn format_duration(duration: Duration) -> String {
    let secs = (duration.num_milliseconds().max(0) + 500) / 1000;
    let (h, m, s) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    if h > 0 {
        format!("{h}h {m}m {s}s")
    } else if m > 0 {
        format!("{m}m {s}s")
    } else {
        format!("{s}s")
    }
}

/// Formats a duration as `Xh Ym` or `Ym`, rounded to the minute.
pub fn format_duration_short(duration: Duration) -> String {
    let mins = (duration.num_seconds().max(0) + 30) / 60;
    let (h, m) = (mins / 60, mins % 60);
    if h > 0 {
        format!("{h}h {m}m")
    } else {
        format!("{m}m")
    }
}

/// `@project` followed by `: title` when the entry has one.
pub fn describe(entry: &Entry) -> String {
    match &entry.title {
        Some(title) => format!("@{}: {title}", entry.project),
        None => format!("@{}", entry.project),
    }
}

/// ` [+a +b]`, or nothing for an untagged entry.
pub fn tag_suffix(entry: &Entry) -> String {
    if entry.tags.is_empty() {
        String::new()
    } else {
        format!(" [{}]", entry.tag_list())
    }
}

/// Local `HH:MM:SS` of an instant.
pub fn clock(timestamp: DateTime<Utc>) -> String {
    timestamp.with_timezone(&Local).format("%H:%M:%S").to_string()
}

/// The local calendar date of `now`, used to anchor time-only inputs.
pub fn local_date(now: DateTime<Utc>) -> NaiveDate {
    now.with_timezone(&Local).date_naive()
}

/// Parses `HH:MM`, `HH:MM:SS` or a full local timestamp relative to `now`.
pub fn parse_time(input: &str, now: DateTime<Utc>) -> Result<DateTime<Utc>> {
    Ok(parse_time_input(input, local_date(now))?)
}

/// Local midnight at the start of a `YYYY-MM-DD` date, as UTC.
pub fn parse_day_start(input: &str) -> Result<DateTime<Utc>> {
    let date = NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d")
        .with_context(|| format!("invalid date {input:?} (use YYYY-MM-DD)"))?;
    Ok(local_to_utc(date.and_time(chrono::NaiveTime::MIN))?)
}

/// Local midnight at the end of a `YYYY-MM-DD` date, as UTC.
pub fn parse_day_end(input: &str) -> Result<DateTime<Utc>> {
    let date = NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d")
        .with_context(|| format!("invalid date {input:?} (use YYYY-MM-DD)"))?;
    let next = date
        .succ_opt()
        .with_context(|| format!("date {input:?} is out of range"))?;
    Ok(local_to_utc(next.and_time(chrono::NaiveTime::MIN))?)
}

/// Human label of the time excluded by a pause of this reason.
pub const fn reason_label(reason: PauseReason) -> &'static str {
    match reason {
        PauseReason::Manual => "paused",
        PauseReason::DisplayOff => "display-off",
        PauseReason::SystemSleep => "sleep",
    }
}

/// Writes the status block of an active entry.
pub fn write_status<W: Write>(writer: &mut W, entry: &Entry, now: DateTime<Utc>) -> Result<()> {
    let state = match entry.status {
        EntryStatus::Running => "Running",
        EntryStatus::Paused => "Paused",
        EntryStatus::Stopped => "Stopped",
    };
    writeln!(writer, "[{state}] {}{}", describe(entry), tag_suffix(entry))?;
    writeln!(writer, "  Started: {}", clock(entry.start_time))?;
    writeln!(writer, "  Elapsed: {}", format_duration(entry.duration(now)))?;
    if !entry.pauses.is_empty() {
        writeln!(
            writer,
            "  Paused:  {} ({} pause(s))",
            format_duration(entry.paused_duration(now)),
            entry.pauses.len()
        )?;
    }
    Ok(())
}
