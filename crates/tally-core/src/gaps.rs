//! Gap reconciliation.
//!
//! Turns raw sleep/wake and display off/on markers into closed pauses on the
//! active entry.
//!
//! # Algorithm Summary
//!
//! 1. Pair boundary markers into candidate gaps. A system-sleep start seen
//!    while a display-off gap is open upgrades that gap to system level; a
//!    gap closes at the first end marker of its own level.
//! 2. Clip each gap to begin no earlier than the entry's `start_time`, the
//!    lower bound every pause must respect.
//! 3. Drop gaps shorter than [`NOISE_THRESHOLD`].
//! 4. Drop gaps ending at or before the entry's latest closed-pause
//!    `resume_time`; those are already accounted for.
//! 5. Subtract the entry's existing pauses from each remaining gap. Every
//!    uncovered piece at least [`NOISE_THRESHOLD`] long becomes one closed
//!    pause, so pauses never overlap.
//!
//! Reading the signal source is best effort: a failure is reported as a
//! warning and treated as "no gaps".

use chrono::{DateTime, Duration, Utc};

use crate::entry::{Entry, Pause};
use crate::error::{SignalSourceError, TrackError};
use crate::ledger::PauseLedger;
use crate::store::{EntryStore, NewPause};
use crate::types::PauseReason;

/// Gaps shorter than this are display flicker, not interruptions.
pub const NOISE_THRESHOLD: Duration = Duration::seconds(60);

/// Kind of a raw boundary marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GapBoundary {
    SystemSleep,
    SystemWake,
    DisplayOff,
    DisplayOn,
}

impl GapBoundary {
    pub const fn level(self) -> GapLevel {
        match self {
            Self::SystemSleep | Self::SystemWake => GapLevel::System,
            Self::DisplayOff | Self::DisplayOn => GapLevel::Display,
        }
    }

    pub const fn is_start(self) -> bool {
        matches!(self, Self::SystemSleep | Self::DisplayOff)
    }
}

/// Classification of a gap. `System` dominates `Display`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum GapLevel {
    Display,
    System,
}

impl GapLevel {
    pub const fn reason(self) -> PauseReason {
        match self {
            Self::Display => PauseReason::DisplayOff,
            Self::System => PauseReason::SystemSleep,
        }
    }
}

/// A timestamped boundary marker from a [`GapSignalSource`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GapSignal {
    pub time: DateTime<Utc>,
    pub boundary: GapBoundary,
}

/// A closed inactivity interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Gap {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub level: GapLevel,
}

impl Gap {
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }
}

/// Platform source of sleep/wake and display markers.
pub trait GapSignalSource {
    /// Markers strictly after `since`, in chronological order.
    fn signals_since(&self, since: DateTime<Utc>) -> Result<Vec<GapSignal>, SignalSourceError>;
}

/// A source that never reports anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSignals;

impl GapSignalSource for NoSignals {
    fn signals_since(&self, _since: DateTime<Utc>) -> Result<Vec<GapSignal>, SignalSourceError> {
        Ok(Vec::new())
    }
}

/// Outcome of one reconciliation pass.
#[derive(Debug, Default)]
pub struct Reconciliation {
    /// Pauses created for newly detected gaps.
    pub created: Vec<Pause>,
    /// Set when the signal source could not be read.
    pub warning: Option<SignalSourceError>,
}

/// Pairs boundary markers into closed gaps.
///
/// Orphan end markers and a trailing unclosed start are ignored.
pub fn pair_gaps(signals: &[GapSignal]) -> Vec<Gap> {
    let mut ordered = signals.to_vec();
    ordered.sort_by_key(|signal| signal.time);

    let mut gaps = Vec::new();
    let mut open: Option<(DateTime<Utc>, GapLevel)> = None;
    for signal in ordered {
        let level = signal.boundary.level();
        if signal.boundary.is_start() {
            open = match open {
                None => Some((signal.time, level)),
                Some((start, current)) => Some((start, current.max(level))),
            };
        } else if let Some((start, current)) = open {
            if level == current {
                gaps.push(Gap {
                    start,
                    end: signal.time,
                    level: current,
                });
                open = None;
            }
        }
    }
    gaps
}

/// Filters candidate gaps down to the time not yet reflected on `entry`.
pub fn unaccounted_gaps(entry: &Entry, gaps: Vec<Gap>) -> Vec<Gap> {
    let last_pause_end = entry.last_pause_end();
    let mut covered: Vec<(DateTime<Utc>, DateTime<Utc>)> = entry
        .pauses
        .iter()
        .map(|pause| {
            (
                pause.pause_time,
                pause.resume_time.unwrap_or(DateTime::<Utc>::MAX_UTC),
            )
        })
        .collect();
    covered.sort_unstable();

    gaps.into_iter()
        .filter_map(|mut gap| {
            gap.start = gap.start.max(entry.start_time);
            if gap.duration() < NOISE_THRESHOLD {
                return None;
            }
            if last_pause_end.is_some_and(|last| gap.end <= last) {
                return None;
            }
            Some(gap)
        })
        .flat_map(|gap| uncovered_pieces(gap, &covered))
        .filter(|piece| piece.duration() >= NOISE_THRESHOLD)
        .collect()
}

/// Splits `gap` around the sorted `covered` intervals.
fn uncovered_pieces(gap: Gap, covered: &[(DateTime<Utc>, DateTime<Utc>)]) -> Vec<Gap> {
    let mut pieces = Vec::new();
    let mut cursor = gap.start;
    for &(from, to) in covered {
        if to <= cursor || from >= gap.end {
            continue;
        }
        if from > cursor {
            pieces.push(Gap {
                start: cursor,
                end: from,
                level: gap.level,
            });
        }
        cursor = cursor.max(to);
        if cursor >= gap.end {
            break;
        }
    }
    if cursor < gap.end {
        pieces.push(Gap {
            start: cursor,
            ..gap
        });
    }
    if pieces.len() != 1 || pieces[0] != gap {
        tracing::debug!(
            start = %gap.start,
            end = %gap.end,
            pieces = pieces.len(),
            "gap overlaps existing pauses"
        );
    }
    pieces
}

/// Detects gaps since the active entry started and records them as pauses.
///
/// Does nothing when no entry is active.
pub fn reconcile<S, G>(store: &mut S, source: &G) -> Result<Reconciliation, TrackError>
where
    S: EntryStore + ?Sized,
    G: GapSignalSource + ?Sized,
{
    let Some(entry) = store.active_entry()? else {
        return Ok(Reconciliation::default());
    };

    let signals = match source.signals_since(entry.start_time) {
        Ok(signals) => signals,
        Err(err) => {
            tracing::warn!(error = %err, "gap detection unavailable");
            return Ok(Reconciliation {
                created: Vec::new(),
                warning: Some(err),
            });
        }
    };

    let gaps = unaccounted_gaps(&entry, pair_gaps(&signals));
    if gaps.is_empty() {
        tracing::debug!(entry = %entry.id, signals = signals.len(), "no new gaps");
        return Ok(Reconciliation::default());
    }

    let pauses: Vec<NewPause> = gaps
        .iter()
        .map(|gap| NewPause::closed(gap.start, gap.end, gap.level.reason()))
        .collect();
    let created = PauseLedger::new(store).create_many(&entry, &pauses)?;
    tracing::info!(entry = %entry.id, count = created.len(), "recorded detected gaps");

    Ok(Reconciliation {
        created,
        warning: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::TimeZone;

    use crate::types::{EntryId, EntryStatus, PauseId, ProjectName};

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, hour, minute, 0).unwrap()
    }

    fn signal(time: DateTime<Utc>, boundary: GapBoundary) -> GapSignal {
        GapSignal { time, boundary }
    }

    fn running_entry(pauses: Vec<Pause>) -> Entry {
        Entry {
            id: EntryId::new("e1").unwrap(),
            project: ProjectName::new("work").unwrap(),
            title: None,
            tags: Vec::new(),
            start_time: at(8, 0),
            end_time: None,
            status: EntryStatus::Running,
            pauses,
        }
    }

    fn closed_pause(from: DateTime<Utc>, to: DateTime<Utc>) -> Pause {
        Pause {
            id: PauseId::new("p1").unwrap(),
            entry_id: EntryId::new("e1").unwrap(),
            pause_time: from,
            resume_time: Some(to),
            reason: PauseReason::Manual,
        }
    }

    #[test]
    fn pairs_sleep_and_wake() {
        let gaps = pair_gaps(&[
            signal(at(9, 0), GapBoundary::SystemSleep),
            signal(at(9, 30), GapBoundary::SystemWake),
            signal(at(10, 0), GapBoundary::DisplayOff),
            signal(at(10, 5), GapBoundary::DisplayOn),
        ]);
        assert_eq!(
            gaps,
            vec![
                Gap {
                    start: at(9, 0),
                    end: at(9, 30),
                    level: GapLevel::System
                },
                Gap {
                    start: at(10, 0),
                    end: at(10, 5),
                    level: GapLevel::Display
                },
            ]
        );
    }

    #[test]
    fn sleep_during_display_off_upgrades_to_system() {
        let gaps = pair_gaps(&[
            signal(at(9, 0), GapBoundary::DisplayOff),
            signal(at(9, 2), GapBoundary::SystemSleep),
            signal(at(10, 0), GapBoundary::SystemWake),
            signal(at(10, 1), GapBoundary::DisplayOn),
        ]);
        assert_eq!(
            gaps,
            vec![Gap {
                start: at(9, 0),
                end: at(10, 0),
                level: GapLevel::System
            }]
        );
    }

    #[test]
    fn display_off_never_downgrades_system_gap() {
        let gaps = pair_gaps(&[
            signal(at(9, 0), GapBoundary::SystemSleep),
            signal(at(9, 1), GapBoundary::DisplayOff),
            signal(at(9, 5), GapBoundary::DisplayOn),
            signal(at(9, 40), GapBoundary::SystemWake),
        ]);
        assert_eq!(gaps.len(), 1);
        assert_eq!(gaps[0].level, GapLevel::System);
        assert_eq!(gaps[0].end, at(9, 40));
    }

    #[test]
    fn repeated_starts_keep_earliest_and_orphans_are_ignored() {
        let gaps = pair_gaps(&[
            signal(at(8, 30), GapBoundary::SystemWake),
            signal(at(9, 0), GapBoundary::SystemSleep),
            signal(at(9, 10), GapBoundary::SystemSleep),
            signal(at(9, 30), GapBoundary::SystemWake),
            signal(at(11, 0), GapBoundary::SystemSleep),
        ]);
        assert_eq!(gaps.len(), 1);
        assert_eq!(gaps[0].start, at(9, 0));
    }

    #[test]
    fn short_gaps_are_noise() {
        let start = at(9, 0);
        let gaps = vec![
            Gap {
                start,
                end: start + Duration::seconds(59),
                level: GapLevel::Display,
            },
            Gap {
                start: at(10, 0),
                end: at(10, 1),
                level: GapLevel::Display,
            },
        ];
        let kept = unaccounted_gaps(&running_entry(Vec::new()), gaps);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].start, at(10, 0));
    }

    #[test]
    fn gaps_before_last_pause_end_are_already_accounted() {
        // Last closed pause ends at 10:00.
        let entry = running_entry(vec![closed_pause(at(9, 50), at(10, 0))]);
        let gaps = vec![
            Gap {
                start: at(9, 55),
                end: at(9, 58),
                level: GapLevel::System,
            },
            Gap {
                start: at(10, 10),
                end: at(10, 13),
                level: GapLevel::System,
            },
        ];
        let kept = unaccounted_gaps(&entry, gaps);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].start, at(10, 10));
        assert_eq!(kept[0].level.reason(), PauseReason::SystemSleep);
    }

    #[test]
    fn gaps_keep_the_time_outside_existing_pauses() {
        let entry = running_entry(vec![closed_pause(at(8, 30), at(9, 0))]);
        let gaps = vec![Gap {
            start: at(8, 45),
            end: at(9, 30),
            level: GapLevel::System,
        }];
        let kept = unaccounted_gaps(&entry, gaps);
        assert_eq!(
            kept,
            vec![Gap {
                start: at(9, 0),
                end: at(9, 30),
                level: GapLevel::System
            }]
        );
    }

    #[test]
    fn gap_around_a_pause_splits_in_two() {
        let entry = running_entry(vec![closed_pause(at(9, 0), at(9, 10))]);
        let gaps = vec![Gap {
            start: at(8, 50),
            end: at(9, 30),
            level: GapLevel::Display,
        }];
        let spans: Vec<_> = unaccounted_gaps(&entry, gaps)
            .iter()
            .map(|gap| (gap.start, gap.end))
            .collect();
        assert_eq!(spans, vec![(at(8, 50), at(9, 0)), (at(9, 10), at(9, 30))]);
    }

    #[test]
    fn covered_gaps_and_short_remainders_are_dropped() {
        let mut open = closed_pause(at(9, 0), at(9, 0));
        open.resume_time = None;
        let entry = running_entry(vec![
            closed_pause(at(8, 20), at(8, 40) - Duration::seconds(30)),
            open,
        ]);
        let gaps = vec![
            // Leaves 30 seconds uncovered.
            Gap {
                start: at(8, 20),
                end: at(8, 40),
                level: GapLevel::System,
            },
            // Inside the open pause.
            Gap {
                start: at(9, 30),
                end: at(10, 0),
                level: GapLevel::System,
            },
        ];
        assert!(unaccounted_gaps(&entry, gaps).is_empty());
    }

    #[test]
    fn gap_start_is_clipped_to_entry_start() {
        let gaps = vec![Gap {
            start: at(7, 0),
            end: at(8, 30),
            level: GapLevel::System,
        }];
        let kept = unaccounted_gaps(&running_entry(Vec::new()), gaps);
        assert_eq!(kept[0].start, at(8, 0));
    }
}
