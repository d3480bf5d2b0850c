//! Bulk-edit exchange document.
//!
//! One document per entry, timestamps in local `YYYY-MM-DD HH:MM:SS`.
//! A pause without `id` is created on apply; a stored pause missing from
//! `pauses` is deleted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entry::Entry;
use crate::error::TrackError;
use crate::ledger::PauseDraft;
use crate::timefmt::local_time;
use crate::types::{EntryId, EntryStatus, PauseId, PauseReason, ProjectName, TagName};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryDocument {
    pub id: EntryId,
    pub project: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(with = "local_time")]
    pub start_time: DateTime<Utc>,
    #[serde(
        default,
        with = "local_time::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub end_time: Option<DateTime<Utc>>,
    /// Informational; status changes go through start/stop/pause/resume.
    pub status: EntryStatus,
    #[serde(default)]
    pub pauses: Vec<PauseDocument>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PauseDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<PauseId>,
    #[serde(with = "local_time")]
    pub pause_time: DateTime<Utc>,
    #[serde(
        default,
        with = "local_time::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub resume_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub reason: PauseReason,
}

/// Validated contents of a submitted document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditRequest {
    pub id: EntryId,
    pub project: ProjectName,
    pub title: Option<String>,
    pub tags: Vec<TagName>,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub pauses: Vec<PauseDraft>,
}

impl From<&Entry> for EntryDocument {
    fn from(entry: &Entry) -> Self {
        Self {
            id: entry.id.clone(),
            project: entry.project.to_string(),
            title: entry.title.clone(),
            tags: entry.tags.iter().map(ToString::to_string).collect(),
            start_time: entry.start_time,
            end_time: entry.end_time,
            status: entry.status,
            pauses: entry
                .pauses
                .iter()
                .map(|pause| PauseDocument {
                    id: Some(pause.id.clone()),
                    pause_time: pause.pause_time,
                    resume_time: pause.resume_time,
                    reason: pause.reason,
                })
                .collect(),
        }
    }
}

impl EntryDocument {
    /// Parses a JSON document.
    pub fn from_json(text: &str) -> Result<Self, TrackError> {
        serde_json::from_str(text)
            .map_err(|err| TrackError::validation("document", err.to_string()))
    }

    /// Renders the document as pretty JSON.
    pub fn to_json(&self) -> Result<String, TrackError> {
        serde_json::to_string_pretty(self)
            .map_err(|err| TrackError::validation("document", err.to_string()))
    }

    /// Normalizes names and checks field-level rules.
    ///
    /// Ordering rules that depend on stored state are checked when the
    /// request is applied.
    pub fn into_request(self) -> Result<EditRequest, TrackError> {
        let project = ProjectName::new(self.project.trim().trim_start_matches('@'))?;
        let tags = normalize_tags(self.tags.iter().map(|t| t.trim().trim_start_matches('+')))?;
        let title = self
            .title
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());
        if let Some(end_time) = self.end_time {
            if end_time < self.start_time {
                return Err(TrackError::validation(
                    "end_time",
                    format!(
                        "end time {end_time} is before start time {}",
                        self.start_time
                    ),
                ));
            }
        }
        let pauses = self
            .pauses
            .into_iter()
            .map(|pause| PauseDraft {
                id: pause.id,
                pause_time: pause.pause_time,
                resume_time: pause.resume_time,
                reason: pause.reason,
            })
            .collect();
        Ok(EditRequest {
            id: self.id,
            project,
            title,
            tags,
            start_time: self.start_time,
            end_time: self.end_time,
            pauses,
        })
    }
}

/// Validates tag names, dropping repeats while keeping first-seen order.
pub fn normalize_tags<'a>(
    names: impl IntoIterator<Item = &'a str>,
) -> Result<Vec<TagName>, TrackError> {
    let mut tags: Vec<TagName> = Vec::new();
    for name in names {
        let tag = TagName::new(name)?;
        if !tags.contains(&tag) {
            tags.push(tag);
        }
    }
    Ok(tags)
}
