//! Entry lifecycle: start, pause, resume, stop, reopen.
//!
//! ```text
//!            pause            stop
//!  start → Running ⇄ Paused ───────→ Stopped
//!            resume     │              │
//!              ↑        └──── stop ────┤
//!              └────────── reopen ─────┘
//! ```
//!
//! Preconditions are checked here against a fresh read; the store re-checks
//! the status and the singleton-active-entry rule inside the write
//! transaction.

use chrono::{DateTime, Utc};

use crate::document::{EditRequest, normalize_tags};
use crate::entry::{Entry, Pause};
use crate::error::TrackError;
use crate::ledger::{PauseLedger, plan_pauses};
use crate::store::{EntryStore, EntryUpdate, NewEntry, NewPause, StateChange};
use crate::types::{EntryId, EntryStatus, PauseId, PauseReason, ProjectName};

/// Result of a transition that may already be satisfied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// The entry changed state.
    Applied(Entry),
    /// The entry was already in the requested state; nothing was written.
    Unchanged(Entry),
}

impl Transition {
    pub const fn entry(&self) -> &Entry {
        match self {
            Self::Applied(entry) | Self::Unchanged(entry) => entry,
        }
    }

    pub fn into_entry(self) -> Entry {
        match self {
            Self::Applied(entry) | Self::Unchanged(entry) => entry,
        }
    }
}

/// Owns entry transitions over an injected store.
pub struct Tracker<'s, S: ?Sized> {
    pub(crate) store: &'s mut S,
}

impl<'s, S: EntryStore + ?Sized> Tracker<'s, S> {
    pub const fn new(store: &'s mut S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &*self.store
    }

    /// The running or paused entry, if any.
    pub fn active(&self) -> Result<Option<Entry>, TrackError> {
        Ok(self.store.active_entry()?)
    }

    /// Looks up an entry, failing if it does not exist.
    pub fn get(&self, id: &EntryId) -> Result<Entry, TrackError> {
        self.store
            .entry(id)?
            .ok_or_else(|| TrackError::entry_not_found(id))
    }

    /// The most recently created entry, optionally for one project.
    pub fn last(&self, project: Option<&ProjectName>) -> Result<Option<Entry>, TrackError> {
        Ok(self.store.last_entry(project)?)
    }

    /// Starts a new running entry.
    ///
    /// Tags are deduplicated, keeping first-seen order.
    pub fn start(
        &mut self,
        project: ProjectName,
        title: Option<String>,
        tags: &[&str],
        at: DateTime<Utc>,
    ) -> Result<Entry, TrackError> {
        if let Some(active) = self.store.active_entry()? {
            return Err(TrackError::ActiveEntryExists { active: active.id });
        }
        let entry = NewEntry {
            project,
            title: title.filter(|t| !t.trim().is_empty()),
            tags: normalize_tags(tags.iter().copied())?,
            start_time: at,
            status: EntryStatus::Running,
        };
        let entry = self.store.create_entry(&entry)?;
        tracing::info!(entry = %entry.id, project = %entry.project, "started entry");
        Ok(entry)
    }

    /// Pauses a running entry by opening a pause at `at`.
    pub fn pause(
        &mut self,
        id: &EntryId,
        reason: PauseReason,
        at: DateTime<Utc>,
    ) -> Result<Transition, TrackError> {
        let entry = self.get(id)?;
        match entry.status {
            EntryStatus::Paused => Ok(Transition::Unchanged(entry)),
            EntryStatus::Stopped => Err(invalid(&entry, "pause")),
            EntryStatus::Running => {
                ensure_not_before(at, entry.start_time, "pause_time")?;
                if let Some(last) = entry.last_pause_end() {
                    ensure_not_before(at, last, "pause_time")?;
                }
                let change = StateChange {
                    expected: EntryStatus::Running,
                    status: EntryStatus::Paused,
                    end_time: None,
                    close_open_pause_at: None,
                    insert_pause: Some(NewPause {
                        pause_time: at,
                        resume_time: None,
                        reason,
                    }),
                };
                let entry = self.store.apply_change(id, &change)?;
                tracing::info!(entry = %id, %reason, "paused entry");
                Ok(Transition::Applied(entry))
            }
        }
    }

    /// Resumes a paused entry by closing its open pause at `at`.
    pub fn resume(&mut self, id: &EntryId, at: DateTime<Utc>) -> Result<Transition, TrackError> {
        let entry = self.get(id)?;
        match entry.status {
            EntryStatus::Running => Ok(Transition::Unchanged(entry)),
            EntryStatus::Stopped => Err(invalid(&entry, "resume")),
            EntryStatus::Paused => {
                if let Some(open) = entry.open_pause() {
                    ensure_not_before(at, open.pause_time, "resume_time")?;
                }
                let change = StateChange {
                    expected: EntryStatus::Paused,
                    status: EntryStatus::Running,
                    end_time: None,
                    close_open_pause_at: Some(at),
                    insert_pause: None,
                };
                let entry = self.store.apply_change(id, &change)?;
                tracing::info!(entry = %id, "resumed entry");
                Ok(Transition::Applied(entry))
            }
        }
    }

    /// Stops a running or paused entry, closing any open pause at `at`.
    pub fn stop(&mut self, id: &EntryId, at: DateTime<Utc>) -> Result<Entry, TrackError> {
        let entry = self.get(id)?;
        let expected = match entry.status {
            EntryStatus::Stopped => return Err(invalid(&entry, "stop")),
            status @ (EntryStatus::Running | EntryStatus::Paused) => status,
        };
        ensure_not_before(at, entry.start_time, "end_time")?;
        if let Some(open) = entry.open_pause() {
            ensure_not_before(at, open.pause_time, "end_time")?;
        }
        let change = StateChange {
            expected,
            status: EntryStatus::Stopped,
            end_time: Some(at),
            close_open_pause_at: Some(at),
            insert_pause: None,
        };
        let entry = self.store.apply_change(id, &change)?;
        tracing::info!(entry = %id, "stopped entry");
        Ok(entry)
    }

    /// Reopens a stopped entry, recording `[end_time, at)` as a pause.
    ///
    /// Mutates closed history; callers confirm with the user first.
    pub fn reopen(&mut self, id: &EntryId, at: DateTime<Utc>) -> Result<(Entry, Pause), TrackError> {
        let entry = self.get(id)?;
        let end_time = match (entry.status, entry.end_time) {
            (EntryStatus::Stopped, Some(end_time)) => end_time,
            (EntryStatus::Stopped, None) => entry.start_time,
            (EntryStatus::Running | EntryStatus::Paused, _) => {
                return Err(invalid(&entry, "reopen"));
            }
        };
        ensure_not_before(at, end_time, "reopen time")?;

        let gap = NewPause::closed(end_time, at, PauseReason::Manual);
        let change = StateChange {
            expected: EntryStatus::Stopped,
            status: EntryStatus::Running,
            end_time: None,
            close_open_pause_at: None,
            insert_pause: Some(gap),
        };
        let reopened = self.store.apply_change(id, &change)?;
        let pause = reopened
            .pauses
            .iter()
            .find(|p| !entry.pauses.iter().any(|known| known.id == p.id))
            .cloned()
            .ok_or_else(|| TrackError::validation("pause", "reopen gap was not recorded"))?;
        tracing::info!(entry = %id, gap_start = %end_time, "reopened entry");
        Ok((reopened, pause))
    }

    /// Records a closed pause in the past without touching the entry's status.
    pub fn insert_historical_pause(
        &mut self,
        id: &EntryId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Pause, TrackError> {
        let entry = self.get(id)?;
        if to < from {
            return Err(TrackError::validation(
                "to",
                format!("pause end {to} is before pause start {from}"),
            ));
        }
        PauseLedger::new(&mut *self.store).create(
            &entry,
            NewPause::closed(from, to, PauseReason::Manual),
        )
    }

    /// Updates one existing pause of an entry.
    pub fn update_pause(&mut self, pause: &Pause) -> Result<Entry, TrackError> {
        let entry = self.get(&pause.entry_id)?;
        PauseLedger::new(&mut *self.store).update(&entry, pause)?;
        self.get(&entry.id)
    }

    /// Deletes one pause of an entry.
    pub fn delete_pause(&mut self, entry_id: &EntryId, id: &PauseId) -> Result<Entry, TrackError> {
        let entry = self.get(entry_id)?;
        PauseLedger::new(&mut *self.store).delete(&entry, id)?;
        self.get(entry_id)
    }

    /// Deletes an entry with its pauses and tags, returning what was removed.
    pub fn delete(&mut self, id: &EntryId) -> Result<Entry, TrackError> {
        let entry = self.get(id)?;
        self.store.delete_entry(id)?;
        tracing::info!(entry = %id, "deleted entry");
        Ok(entry)
    }

    /// Applies an edited document: fields, tags, and the full pause list.
    pub fn edit(&mut self, request: EditRequest) -> Result<Entry, TrackError> {
        let stored = self.get(&request.id)?;
        match (stored.status, request.end_time) {
            (EntryStatus::Stopped, None) => {
                return Err(TrackError::validation(
                    "end_time",
                    "a stopped entry needs an end time",
                ));
            }
            (EntryStatus::Running | EntryStatus::Paused, Some(_)) => {
                return Err(TrackError::validation(
                    "end_time",
                    format!("a {} entry cannot have an end time", stored.status),
                ));
            }
            _ => {}
        }

        let mut target = stored.clone();
        target.start_time = request.start_time;
        target.end_time = request.end_time;
        let plan = plan_pauses(&target, &request.pauses)?;

        let update = EntryUpdate {
            project: request.project,
            title: request.title,
            tags: request.tags,
            start_time: request.start_time,
            end_time: request.end_time,
        };
        let entry = self.store.update_entry(&stored.id, &update, &plan)?;
        tracing::info!(
            entry = %entry.id,
            updated = plan.updates.len(),
            created = plan.creates.len(),
            deleted = plan.deletes.len(),
            "edited entry"
        );
        Ok(entry)
    }
}

fn invalid(entry: &Entry, action: &'static str) -> TrackError {
    TrackError::InvalidTransition {
        id: entry.id.clone(),
        status: entry.status,
        action,
    }
}

fn ensure_not_before(
    at: DateTime<Utc>,
    bound: DateTime<Utc>,
    field: &'static str,
) -> Result<(), TrackError> {
    if at < bound {
        return Err(TrackError::validation(
            field,
            format!("{at} is before {bound}"),
        ));
    }
    Ok(())
}
