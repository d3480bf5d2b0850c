//! Pause ledger: validated create/update/delete of an entry's pauses.
//!
//! Every write is checked against the owning entry before it reaches the
//! store:
//! - `resume_time` is not before `pause_time`
//! - `pause_time` is not before the entry's `start_time`
//! - the pause does not overlap another pause of the same entry (an open
//!   pause extends indefinitely)
//! - an open pause exists only while the entry is paused, and at most one

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};

use crate::entry::{Entry, Pause};
use crate::error::TrackError;
use crate::store::{EntryStore, NewPause, PausePlan};
use crate::types::{EntryStatus, PauseId, PauseReason};

/// One item of a submitted pause list.
///
/// Items with an `id` update the stored pause of that id; items without one
/// are created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PauseDraft {
    pub id: Option<PauseId>,
    pub pause_time: DateTime<Utc>,
    pub resume_time: Option<DateTime<Utc>>,
    pub reason: PauseReason,
}

/// Validated pause writes for one store.
pub struct PauseLedger<'s, S: ?Sized> {
    store: &'s mut S,
}

impl<'s, S: EntryStore + ?Sized> PauseLedger<'s, S> {
    pub const fn new(store: &'s mut S) -> Self {
        Self { store }
    }

    /// Creates one pause on `entry`.
    pub fn create(&mut self, entry: &Entry, pause: NewPause) -> Result<Pause, TrackError> {
        let mut created = self.create_many(entry, std::slice::from_ref(&pause))?;
        created
            .pop()
            .ok_or_else(|| TrackError::validation("pause", "store created no pause"))
    }

    /// Creates several pauses on `entry` in one store call.
    pub fn create_many(
        &mut self,
        entry: &Entry,
        pauses: &[NewPause],
    ) -> Result<Vec<Pause>, TrackError> {
        let mut accepted: Vec<Interval> = entry.pauses.iter().map(Interval::from).collect();
        for pause in pauses {
            let candidate = Interval {
                id: None,
                pause_time: pause.pause_time,
                resume_time: pause.resume_time,
            };
            validate_interval(entry, &candidate)?;
            check_overlap(&accepted, &candidate)?;
            accepted.push(candidate);
        }
        check_open_pauses(entry.status, &accepted)?;

        let created = self.store.create_pauses(&entry.id, pauses)?;
        tracing::debug!(entry = %entry.id, count = created.len(), "created pauses");
        Ok(created)
    }

    /// Replaces the stored times and reason of an existing pause.
    pub fn update(&mut self, entry: &Entry, pause: &Pause) -> Result<(), TrackError> {
        if !entry.pauses.iter().any(|p| p.id == pause.id) {
            return Err(pause_not_found(&pause.id));
        }
        let candidate = Interval::from(pause);
        validate_interval(entry, &candidate)?;
        let others: Vec<Interval> = entry
            .pauses
            .iter()
            .filter(|p| p.id != pause.id)
            .map(Interval::from)
            .collect();
        check_overlap(&others, &candidate)?;
        let mut resulting = others;
        resulting.push(candidate);
        check_open_pauses(entry.status, &resulting)?;

        self.store.update_pause(pause)?;
        tracing::debug!(entry = %entry.id, pause = %pause.id, "updated pause");
        Ok(())
    }

    /// Deletes a pause of `entry`.
    ///
    /// The open pause of a paused entry cannot be deleted; resume instead.
    pub fn delete(&mut self, entry: &Entry, id: &PauseId) -> Result<(), TrackError> {
        let Some(pause) = entry.pauses.iter().find(|p| &p.id == id) else {
            return Err(pause_not_found(id));
        };
        if pause.is_open() && entry.status == EntryStatus::Paused {
            return Err(TrackError::validation(
                "pause",
                format!("pause {id} is open; resume the entry instead"),
            ));
        }
        self.store.delete_pause(id)?;
        tracing::debug!(entry = %entry.id, pause = %id, "deleted pause");
        Ok(())
    }
}

/// Diffs `targets` against the pauses stored on `entry`.
///
/// Replace semantics: stored pauses missing from `targets` are deleted.
/// Checks are made against `entry.start_time` and `entry.status`, so callers
/// editing those fields pass the entry with its new values.
pub fn plan_pauses(entry: &Entry, targets: &[PauseDraft]) -> Result<PausePlan, TrackError> {
    let stored: HashMap<&PauseId, &Pause> = entry.pauses.iter().map(|p| (&p.id, p)).collect();
    let mut seen: HashSet<&PauseId> = HashSet::new();
    let mut accepted: Vec<Interval> = Vec::with_capacity(targets.len());
    let mut plan = PausePlan::default();

    for target in targets {
        let candidate = Interval {
            id: target.id.clone(),
            pause_time: target.pause_time,
            resume_time: target.resume_time,
        };
        validate_interval(entry, &candidate)?;
        check_overlap(&accepted, &candidate)?;
        accepted.push(candidate);

        match &target.id {
            Some(id) => {
                let Some(existing) = stored.get(id) else {
                    return Err(pause_not_found(id));
                };
                if !seen.insert(id) {
                    return Err(TrackError::validation(
                        "pauses",
                        format!("pause {id} listed more than once"),
                    ));
                }
                let updated = Pause {
                    id: id.clone(),
                    entry_id: entry.id.clone(),
                    pause_time: target.pause_time,
                    resume_time: target.resume_time,
                    reason: target.reason,
                };
                if **existing != updated {
                    plan.updates.push(updated);
                }
            }
            None => plan.creates.push(NewPause {
                pause_time: target.pause_time,
                resume_time: target.resume_time,
                reason: target.reason,
            }),
        }
    }
    check_open_pauses(entry.status, &accepted)?;
    if entry.status == EntryStatus::Paused && !accepted.iter().any(|i| i.resume_time.is_none()) {
        return Err(TrackError::validation(
            "pauses",
            "a paused entry needs exactly one open pause",
        ));
    }

    plan.deletes = entry
        .pauses
        .iter()
        .filter(|p| !seen.contains(&p.id))
        .map(|p| p.id.clone())
        .collect();
    Ok(plan)
}

#[derive(Debug, Clone)]
struct Interval {
    id: Option<PauseId>,
    pause_time: DateTime<Utc>,
    resume_time: Option<DateTime<Utc>>,
}

impl Interval {
    fn end(&self) -> DateTime<Utc> {
        self.resume_time.unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    fn overlaps(&self, other: &Self) -> bool {
        self.pause_time < other.end() && other.pause_time < self.end()
    }
}

impl From<&Pause> for Interval {
    fn from(pause: &Pause) -> Self {
        Self {
            id: Some(pause.id.clone()),
            pause_time: pause.pause_time,
            resume_time: pause.resume_time,
        }
    }
}

fn validate_interval(entry: &Entry, interval: &Interval) -> Result<(), TrackError> {
    if interval.pause_time < entry.start_time {
        return Err(TrackError::validation(
            "pause_time",
            format!(
                "pause starts at {} before the entry starts at {}",
                interval.pause_time, entry.start_time
            ),
        ));
    }
    if let Some(resume_time) = interval.resume_time {
        if resume_time < interval.pause_time {
            return Err(TrackError::validation(
                "resume_time",
                format!(
                    "resume time {resume_time} is before pause time {}",
                    interval.pause_time
                ),
            ));
        }
    }
    Ok(())
}

fn check_overlap(accepted: &[Interval], candidate: &Interval) -> Result<(), TrackError> {
    match accepted.iter().find(|other| other.overlaps(candidate)) {
        Some(other) => {
            let other = other
                .id
                .as_ref()
                .map_or_else(|| "another new pause".to_string(), |id| format!("pause {id}"));
            Err(TrackError::validation(
                "pause_time",
                format!(
                    "pause starting {} overlaps {other}",
                    candidate.pause_time
                ),
            ))
        }
        None => Ok(()),
    }
}

fn check_open_pauses(status: EntryStatus, intervals: &[Interval]) -> Result<(), TrackError> {
    let open = intervals.iter().filter(|i| i.resume_time.is_none()).count();
    match (status, open) {
        (_, 0) | (EntryStatus::Paused, 1) => Ok(()),
        (EntryStatus::Paused, _) => Err(TrackError::validation(
            "resume_time",
            "an entry can have at most one open pause",
        )),
        (EntryStatus::Running | EntryStatus::Stopped, _) => Err(TrackError::validation(
            "resume_time",
            format!("a {status} entry cannot have an open pause"),
        )),
    }
}

fn pause_not_found(id: &PauseId) -> TrackError {
    TrackError::NotFound {
        what: "pause",
        key: id.to_string(),
    }
}
