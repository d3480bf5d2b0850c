//! The storage seam.
//!
//! Components never hold a global handle; they receive an [`EntryStore`]
//! and go through it for every read and write. Each mutating method is one
//! all-or-nothing unit: an implementation must apply every part of the
//! request or none of it.

use chrono::{DateTime, Utc};

use crate::entry::{Entry, Pause};
use crate::error::StoreError;
use crate::types::{EntryId, EntryStatus, PauseId, PauseReason, ProjectName, TagName};

/// A pause to be inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPause {
    pub pause_time: DateTime<Utc>,
    pub resume_time: Option<DateTime<Utc>>,
    pub reason: PauseReason,
}

impl NewPause {
    pub const fn closed(from: DateTime<Utc>, to: DateTime<Utc>, reason: PauseReason) -> Self {
        Self {
            pause_time: from,
            resume_time: Some(to),
            reason,
        }
    }
}

/// An entry to be inserted.
///
/// Project and tags are referenced by name; the store creates them on first
/// use inside the same transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEntry {
    pub project: ProjectName,
    pub title: Option<String>,
    pub tags: Vec<TagName>,
    pub start_time: DateTime<Utc>,
    pub status: EntryStatus,
}

/// Replacement values for an entry's editable fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryUpdate {
    pub project: ProjectName,
    pub title: Option<String>,
    pub tags: Vec<TagName>,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
}

/// Pause writes derived by diffing a submitted pause list against the stored one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PausePlan {
    pub updates: Vec<Pause>,
    pub creates: Vec<NewPause>,
    pub deletes: Vec<PauseId>,
}

impl PausePlan {
    pub fn is_empty(&self) -> bool {
        self.updates.is_empty() && self.creates.is_empty() && self.deletes.is_empty()
    }
}

/// A status transition, applied atomically by [`EntryStore::apply_change`].
///
/// The store verifies that the entry still has status `expected`, and when
/// `status` is active, that no other entry is active, inside the same
/// transaction as the write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateChange {
    pub expected: EntryStatus,
    pub status: EntryStatus,
    /// New value of `end_time`; `None` clears it.
    pub end_time: Option<DateTime<Utc>>,
    /// Close the entry's open pause at this time, if it has one.
    pub close_open_pause_at: Option<DateTime<Utc>>,
    pub insert_pause: Option<NewPause>,
}

/// Selection criteria for [`EntryStore::list_entries`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryFilter {
    pub project: Option<ProjectName>,
    /// Matches entries carrying any of these tags.
    pub tags: Vec<TagName>,
    /// Inclusive lower bound on `start_time`.
    pub from: Option<DateTime<Utc>>,
    /// Exclusive upper bound on `start_time`.
    pub to: Option<DateTime<Utc>>,
    pub limit: Option<usize>,
}

/// Persistence for entries, pauses, projects and tags.
///
/// Returned entries are fully loaded: project, ordered tags, and pauses
/// ordered by `pause_time`.
pub trait EntryStore {
    /// The entry whose status is running or paused, if any.
    fn active_entry(&self) -> Result<Option<Entry>, StoreError>;

    fn entry(&self, id: &EntryId) -> Result<Option<Entry>, StoreError>;

    /// The most recently created entry, optionally limited to one project.
    fn last_entry(&self, project: Option<&ProjectName>) -> Result<Option<Entry>, StoreError>;

    /// Entries matching `filter`, newest first.
    fn list_entries(&self, filter: &EntryFilter) -> Result<Vec<Entry>, StoreError>;

    /// Inserts an entry with its tag associations.
    ///
    /// Fails with [`StoreError::ActiveEntryExists`] when `entry.status` is
    /// active and another entry already is.
    fn create_entry(&mut self, entry: &NewEntry) -> Result<Entry, StoreError>;

    /// Replaces an entry's fields and tags and applies a pause plan.
    fn update_entry(
        &mut self,
        id: &EntryId,
        update: &EntryUpdate,
        pauses: &PausePlan,
    ) -> Result<Entry, StoreError>;

    /// Deletes an entry together with its pauses and tag associations.
    fn delete_entry(&mut self, id: &EntryId) -> Result<(), StoreError>;

    fn apply_change(&mut self, id: &EntryId, change: &StateChange) -> Result<Entry, StoreError>;

    fn list_pauses(&self, entry_id: &EntryId) -> Result<Vec<Pause>, StoreError>;

    /// Inserts several pauses for one entry.
    fn create_pauses(
        &mut self,
        entry_id: &EntryId,
        pauses: &[NewPause],
    ) -> Result<Vec<Pause>, StoreError>;

    fn update_pause(&mut self, pause: &Pause) -> Result<(), StoreError>;

    fn delete_pause(&mut self, id: &PauseId) -> Result<(), StoreError>;
}
