//! Report command: time totals for a calendar period.
//!
//! `tally report [period] [@project] [+tag ...]` lists the entries that
//! started in the period and totals them by project and by tag. Without a
//! period the user picks one from a menu.

use std::fmt::{self, Write as _};
use std::io::{BufRead, Write};

use anyhow::{Result, bail};
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use clap::Args;
use serde::Serialize;
use tally_core::timefmt::local_to_utc;
use tally_core::{
    Entry, EntryFilter, EntryStore, Period, ProjectName, Summary, TagName, summarize,
};

use super::Session;
use super::log::{JsonEntry, format_entries};
use super::util::{format_duration, format_duration_short, local_date};
use crate::prompt::Prompt;

#[derive(Debug, Args)]
pub struct ReportArgs {
    /// Period (today, yesterday, week, lastWeek, month, lastMonth, year,
    /// lastYear) and `@project`/`+tag` filters.
    #[arg(value_name = "PERIOD|FILTER")]
    pub words: Vec<String>,

    /// Output as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Splits report arguments into the period and the entry filter.
fn parse_words(words: &[String]) -> Result<(Option<Period>, EntryFilter)> {
    let mut period = None;
    let mut filter = EntryFilter::default();
    for word in words {
        if let Some(name) = word.strip_prefix('@') {
            if filter.project.is_some() {
                bail!("multiple projects specified");
            }
            filter.project = Some(ProjectName::new(name)?);
        } else if let Some(name) = word.strip_prefix('+') {
            filter.tags.push(TagName::new(name)?);
        } else if period.is_some() {
            bail!("multiple periods specified");
        } else {
            period = Some(word.parse::<Period>()?);
        }
    }
    Ok((period, filter))
}

/// A report ready for rendering.
#[derive(Debug)]
pub struct Report {
    pub period: Period,
    /// First local day of the period.
    pub first_day: NaiveDate,
    /// Last local day of the period, inclusive.
    pub last_day: NaiveDate,
    pub entries: Vec<Entry>,
    pub summary: Summary,
}

/// Loads the entries of `period` matching `filter` and totals them.
pub fn build_report<S: EntryStore + ?Sized>(
    store: &S,
    period: Period,
    mut filter: EntryFilter,
    now: DateTime<Utc>,
) -> Result<Report> {
    let (first_day, end_day) = period.days(local_date(now));
    filter.from = Some(local_to_utc(first_day.and_time(NaiveTime::MIN))?);
    filter.to = Some(local_to_utc(end_day.and_time(NaiveTime::MIN))?);
    filter.limit = None;
    let entries = store.list_entries(&filter)?;
    tracing::debug!(%period, count = entries.len(), "loaded report entries");
    let summary = summarize(&entries, now);
    Ok(Report {
        period,
        first_day,
        last_day: end_day - Duration::days(1),
        entries,
        summary,
    })
}

/// Formats the report for the terminal.
pub fn format_report(report: &Report, now: DateTime<Utc>) -> String {
    let mut output = String::new();
    writeln!(output, "Report: {}", report.period).unwrap();
    writeln!(
        output,
        "Period: {} to {}",
        report.first_day.format("%Y-%m-%d"),
        report.last_day.format("%Y-%m-%d")
    )
    .unwrap();
    writeln!(output).unwrap();

    output.push_str(&format_entries(&report.entries, now));

    let projects: Vec<(String, Duration)> = report
        .summary
        .by_project
        .iter()
        .map(|(name, duration)| (format!("@{name}"), *duration))
        .collect();
    write_totals(&mut output, "By Project:", &projects);
    let tags: Vec<(String, Duration)> = report
        .summary
        .by_tag
        .iter()
        .map(|(name, duration)| (format!("+{name}"), *duration))
        .collect();
    write_totals(&mut output, "By Tag:", &tags);

    writeln!(output).unwrap();
    writeln!(output, "Total: {}", format_duration(report.summary.total)).unwrap();
    output
}

fn write_totals(output: &mut String, heading: &str, totals: &[(String, Duration)]) {
    if totals.is_empty() {
        return;
    }
    let width = totals
        .iter()
        .map(|(label, _)| label.chars().count())
        .max()
        .unwrap_or_default();
    writeln!(output).unwrap();
    writeln!(output, "{heading}").unwrap();
    for (label, duration) in totals {
        writeln!(output, "  {label:<width$}  {}", format_duration_short(*duration)).unwrap();
    }
}

/// JSON form of a report.
#[derive(Debug, Serialize)]
pub struct JsonReport<'a> {
    pub period: &'static str,
    pub start_date: String,
    pub end_date: String,
    pub total_secs: i64,
    pub by_project: Vec<JsonTotal>,
    pub by_tag: Vec<JsonTotal>,
    pub entries: Vec<JsonEntry<'a>>,
}

#[derive(Debug, Serialize)]
pub struct JsonTotal {
    pub name: String,
    pub duration_secs: i64,
}

fn json_totals<T: fmt::Display>(rows: &[(T, Duration)]) -> Vec<JsonTotal> {
    rows.iter()
        .map(|(name, duration)| JsonTotal {
            name: name.to_string(),
            duration_secs: duration.num_seconds(),
        })
        .collect()
}

/// Formats the report as JSON.
pub fn format_report_json(report: &Report, now: DateTime<Utc>) -> Result<String> {
    let json = JsonReport {
        period: report.period.as_str(),
        start_date: report.first_day.format("%Y-%m-%d").to_string(),
        end_date: report.last_day.format("%Y-%m-%d").to_string(),
        total_secs: report.summary.total.num_seconds(),
        by_project: json_totals(&report.summary.by_project),
        by_tag: json_totals(&report.summary.by_tag),
        entries: report
            .entries
            .iter()
            .map(|entry| JsonEntry {
                entry,
                duration_secs: entry.duration(now).num_seconds(),
            })
            .collect(),
    };
    Ok(serde_json::to_string_pretty(&json)?)
}

pub fn run<W: Write, R: BufRead>(
    writer: &mut W,
    session: &Session<'_>,
    prompt: &mut Prompt<R>,
    args: &ReportArgs,
) -> Result<()> {
    let (period, filter) = parse_words(&args.words)?;
    let period = match period {
        Some(period) => period,
        None => {
            let names = Period::ALL.map(Period::as_str);
            let choice = prompt.select(writer, "Select a report period:", &names)?;
            writeln!(writer)?;
            Period::ALL[choice]
        }
    };

    let report = build_report(&*session.db, period, filter, session.now)?;
    if args.json {
        writeln!(writer, "{}", format_report_json(&report, session.now)?)?;
    } else {
        write!(writer, "{}", format_report(&report, session.now))?;
    }
    Ok(())
}
