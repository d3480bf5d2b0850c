//! Resume policy: resume in place, reopen, or clone into a new entry.

use chrono::{DateTime, Utc};

use crate::entry::{Entry, Pause};
use crate::error::TrackError;
use crate::machine::{Tracker, Transition};
use crate::store::EntryStore;
use crate::types::{EntryId, EntryStatus, ProjectName, TagName};

/// Asks the user before a stopped entry is reopened.
pub trait ConfirmReopen {
    fn confirm_reopen(&mut self, entry: &Entry, at: DateTime<Utc>) -> bool;
}

impl<F> ConfirmReopen for F
where
    F: FnMut(&Entry, DateTime<Utc>) -> bool,
{
    fn confirm_reopen(&mut self, entry: &Entry, at: DateTime<Utc>) -> bool {
        self(entry, at)
    }
}

/// What a resume request ended up doing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResumeOutcome {
    /// The active entry was already running.
    AlreadyRunning(Entry),
    /// The active entry was paused and is running again.
    Resumed(Entry),
    /// A stopped entry was reopened; `gap` covers the time it was stopped.
    Reopened { entry: Entry, gap: Pause },
    /// A new entry was started with the project, title and tags of `source`.
    Cloned { entry: Entry, source: EntryId },
    /// The user declined to reopen this entry.
    Declined(Entry),
    NothingToResume,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resumption {
    /// Entry stopped to make room for the requested project.
    pub stopped: Option<Entry>,
    pub outcome: ResumeOutcome,
}

impl<S: EntryStore + ?Sized> Tracker<'_, S> {
    /// Resumes work, optionally on a specific project.
    ///
    /// Without a project: resume the active entry, or reopen the most recent
    /// entry after confirmation.
    ///
    /// With a project: stop whatever is active, then reopen the most recent
    /// entry if it belongs to `project`, otherwise clone that project's most
    /// recent entry into a new one starting at `at`.
    pub fn resolve_resume(
        &mut self,
        project: Option<&ProjectName>,
        at: DateTime<Utc>,
        confirm: &mut dyn ConfirmReopen,
    ) -> Result<Resumption, TrackError> {
        match project {
            None => {
                let outcome = self.resume_latest(at, confirm)?;
                Ok(Resumption {
                    stopped: None,
                    outcome,
                })
            }
            Some(project) => self.resume_project(project, at, confirm),
        }
    }

    fn resume_latest(
        &mut self,
        at: DateTime<Utc>,
        confirm: &mut dyn ConfirmReopen,
    ) -> Result<ResumeOutcome, TrackError> {
        if let Some(active) = self.active()? {
            return Ok(match self.resume(&active.id, at)? {
                Transition::Applied(entry) => ResumeOutcome::Resumed(entry),
                Transition::Unchanged(entry) => ResumeOutcome::AlreadyRunning(entry),
            });
        }
        match self.last(None)? {
            Some(last) if last.status == EntryStatus::Stopped => self.reopen_confirmed(last, at, confirm),
            _ => Ok(ResumeOutcome::NothingToResume),
        }
    }

    fn resume_project(
        &mut self,
        project: &ProjectName,
        at: DateTime<Utc>,
        confirm: &mut dyn ConfirmReopen,
    ) -> Result<Resumption, TrackError> {
        let stopped = match self.active()? {
            Some(active) => Some(self.stop(&active.id, at)?),
            None => None,
        };

        if let Some(last) = self.last(None)? {
            if &last.project == project {
                let outcome = self.reopen_confirmed(last, at, confirm)?;
                return Ok(Resumption { stopped, outcome });
            }
        }

        let Some(source) = self.last(Some(project))? else {
            return Err(TrackError::NotFound {
                what: "entry for project",
                key: project.to_string(),
            });
        };
        let tags: Vec<&str> = source.tags.iter().map(TagName::as_str).collect();
        let entry = self.start(project.clone(), source.title.clone(), &tags, at)?;
        tracing::info!(entry = %entry.id, source = %source.id, "cloned entry");
        Ok(Resumption {
            stopped,
            outcome: ResumeOutcome::Cloned {
                entry,
                source: source.id,
            },
        })
    }

    fn reopen_confirmed(
        &mut self,
        entry: Entry,
        at: DateTime<Utc>,
        confirm: &mut dyn ConfirmReopen,
    ) -> Result<ResumeOutcome, TrackError> {
        if !confirm.confirm_reopen(&entry, at) {
            tracing::debug!(entry = %entry.id, "reopen declined");
            return Ok(ResumeOutcome::Declined(entry));
        }
        let (entry, gap) = self.reopen(&entry.id, at)?;
        Ok(ResumeOutcome::Reopened { entry, gap })
    }
}
