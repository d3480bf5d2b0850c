//! Gap signals from the macOS power management log.
//!
//! `pmset -g log` lines look like:
//!
//! ```text
//! 2026-01-01 18:40:56 -0500 Sleep               	Entering Sleep state due to 'Idle Sleep'
//! 2026-01-01 18:44:41 -0500 Wake                	Wake from Deep Idle [CDNVA] : due to UserActivity
//! 2026-01-01 19:02:10 -0500 Notification        	Display is turned off
//! ```

use std::process::Command;
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use tally_core::{GapBoundary, GapSignal, GapSignalSource, NoSignals, SignalSourceError};

use crate::config::GapSourceKind;

static SLEEP_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2} [+-]\d{4})\s+Sleep\s+Entering Sleep state")
        .unwrap()
});

static WAKE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2} [+-]\d{4})\s+Wake\s+(?:Wake from|DarkWake to FullWake)",
    )
    .unwrap()
});

static DISPLAY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2} [+-]\d{4})\s+Notification\s+Display is turned (off|on)",
    )
    .unwrap()
});

const PMSET_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S %z";

/// Reads sleep, wake and display markers by running `pmset -g log`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PmsetSignalSource;

impl GapSignalSource for PmsetSignalSource {
    fn signals_since(&self, since: DateTime<Utc>) -> Result<Vec<GapSignal>, SignalSourceError> {
        let output = Command::new("pmset")
            .args(["-g", "log"])
            .output()
            .map_err(|err| SignalSourceError::Unavailable {
                message: format!("failed to run pmset: {err}"),
            })?;
        if !output.status.success() {
            return Err(SignalSourceError::Unavailable {
                message: format!("pmset exited with {}", output.status),
            });
        }
        let log = String::from_utf8_lossy(&output.stdout);
        let signals = parse_pmset_log(&log, since);
        tracing::debug!(count = signals.len(), %since, "read pmset signals");
        Ok(signals)
    }
}

/// Extracts gap markers strictly after `since`, in log order.
///
/// Lines that do not match a known marker are skipped.
pub fn parse_pmset_log(log: &str, since: DateTime<Utc>) -> Vec<GapSignal> {
    log.lines()
        .filter_map(parse_line)
        .filter(|signal| signal.time > since)
        .collect()
}

fn parse_line(line: &str) -> Option<GapSignal> {
    let (time, boundary) = if let Some(caps) = SLEEP_RE.captures(line) {
        (caps.get(1)?.as_str(), GapBoundary::SystemSleep)
    } else if let Some(caps) = WAKE_RE.captures(line) {
        (caps.get(1)?.as_str(), GapBoundary::SystemWake)
    } else if let Some(caps) = DISPLAY_RE.captures(line) {
        let boundary = if &caps[2] == "off" {
            GapBoundary::DisplayOff
        } else {
            GapBoundary::DisplayOn
        };
        (caps.get(1)?.as_str(), boundary)
    } else {
        return None;
    };
    let time = DateTime::parse_from_str(time, PMSET_TIME_FORMAT)
        .ok()?
        .with_timezone(&Utc);
    Some(GapSignal { time, boundary })
}

/// Builds the configured signal source.
pub fn signal_source(kind: GapSourceKind) -> Box<dyn GapSignalSource> {
    match kind.resolve() {
        GapSourceKind::Pmset => Box::new(PmsetSignalSource),
        GapSourceKind::Auto | GapSourceKind::None => Box::new(NoSignals),
    }
}
