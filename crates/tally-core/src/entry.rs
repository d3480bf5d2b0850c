//! Entries, pauses, and active-duration accounting.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{EntryId, EntryStatus, PauseId, PauseReason, ProjectName, TagName};

/// A sub-interval of an entry excluded from its active duration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pause {
    pub id: PauseId,
    pub entry_id: EntryId,
    pub pause_time: DateTime<Utc>,
    /// Absent while the pause is still open.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resume_time: Option<DateTime<Utc>>,
    pub reason: PauseReason,
}

impl Pause {
    pub const fn is_open(&self) -> bool {
        self.resume_time.is_none()
    }

    /// Length of the pause. Open pauses run until `now`.
    pub fn duration(&self, now: DateTime<Utc>) -> Duration {
        let end = self.resume_time.unwrap_or(now);
        (end - self.pause_time).max(Duration::zero())
    }
}

/// One tracked work interval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub id: EntryId,
    pub project: ProjectName,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub tags: Vec<TagName>,
    pub start_time: DateTime<Utc>,
    /// Present iff the entry is stopped.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    pub status: EntryStatus,
    /// Ordered by `pause_time`.
    #[serde(default)]
    pub pauses: Vec<Pause>,
}

impl Entry {
    /// Active (unpaused) time of the entry as of `now`.
    ///
    /// Grows while running, holds still while paused, and is fixed once
    /// stopped. Never negative.
    pub fn duration(&self, now: DateTime<Utc>) -> Duration {
        let end = self.end_time.unwrap_or(now);
        let mut total = end - self.start_time;
        for pause in &self.pauses {
            match pause.resume_time {
                Some(resume_time) => total = total - (resume_time - pause.pause_time),
                None if self.status == EntryStatus::Paused => {
                    total = total - (now - pause.pause_time);
                }
                None => {}
            }
        }
        total.max(Duration::zero())
    }

    /// Sum of all pause lengths, open pauses counted up to `now`.
    pub fn paused_duration(&self, now: DateTime<Utc>) -> Duration {
        self.pauses
            .iter()
            .map(|pause| pause.duration(now))
            .fold(Duration::zero(), |acc, d| acc + d)
    }

    /// The currently open pause, if any.
    pub fn open_pause(&self) -> Option<&Pause> {
        self.pauses.iter().find(|pause| pause.is_open())
    }

    /// Latest `resume_time` among closed pauses.
    pub fn last_pause_end(&self) -> Option<DateTime<Utc>> {
        self.pauses.iter().filter_map(|pause| pause.resume_time).max()
    }

    /// Tag names joined as `+a +b`.
    pub fn tag_list(&self) -> String {
        self.tags
            .iter()
            .map(|tag| format!("+{tag}"))
            .collect::<Vec<_>>()
            .join(" ")
    }
}
