//! Error types shared by every component.

use std::fmt;

use thiserror::Error;

use crate::types::{EntryId, EntryStatus, PauseId, ValidationError};

/// Coarse classification of a [`TrackError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Conflict,
    Validation,
    Store,
    SignalSource,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::NotFound => "not found",
            Self::Conflict => "conflict",
            Self::Validation => "validation",
            Self::Store => "store",
            Self::SignalSource => "signal source",
        };
        write!(f, "{s}")
    }
}

/// Errors returned by tracker operations.
///
/// Validation and conflict errors are raised before anything is written.
/// Store errors abort the enclosing transaction.
#[derive(Debug, Error)]
pub enum TrackError {
    /// No such entry, pause, or project.
    #[error("{what} not found: {key}")]
    NotFound { what: &'static str, key: String },

    /// Another entry is already running or paused.
    #[error("entry {active} is already active; stop it first")]
    ActiveEntryExists { active: EntryId },

    /// The entry is not in a state that permits the transition.
    #[error("cannot {action} entry {id}: it is {status}")]
    InvalidTransition {
        id: EntryId,
        status: EntryStatus,
        action: &'static str,
    },

    /// Malformed or ordering-violating input.
    #[error("invalid {field}: {message}")]
    Validation {
        field: &'static str,
        message: String,
    },

    /// The entry store failed.
    #[error("store error: {0}")]
    Store(#[source] StoreError),

    /// The gap signal source could not be read.
    #[error(transparent)]
    SignalSource(#[from] SignalSourceError),
}

impl TrackError {
    /// Returns the coarse kind of this error.
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::ActiveEntryExists { .. } | Self::InvalidTransition { .. } => {
                ErrorKind::Conflict
            }
            Self::Validation { .. } => ErrorKind::Validation,
            Self::Store(_) => ErrorKind::Store,
            Self::SignalSource(_) => ErrorKind::SignalSource,
        }
    }

    pub(crate) fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }

    pub(crate) fn entry_not_found(id: &EntryId) -> Self {
        Self::NotFound {
            what: "entry",
            key: id.to_string(),
        }
    }
}

impl From<ValidationError> for TrackError {
    fn from(err: ValidationError) -> Self {
        let field = match &err {
            ValidationError::Empty { field } => *field,
            ValidationError::InvalidStatus { .. } => "status",
            ValidationError::InvalidPauseReason { .. } => "reason",
            ValidationError::InvalidPeriod { .. } => "period",
        };
        Self::Validation {
            field,
            message: err.to_string(),
        }
    }
}

impl From<StoreError> for TrackError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::ActiveEntryExists(active) => Self::ActiveEntryExists { active },
            StoreError::EntryNotFound(id) => Self::entry_not_found(&id),
            StoreError::PauseNotFound(id) => Self::NotFound {
                what: "pause",
                key: id.to_string(),
            },
            StoreError::StaleStatus {
                id,
                found,
                expected: _,
            } => Self::InvalidTransition {
                id,
                status: found,
                action: "update",
            },
            other @ StoreError::Backend(_) => Self::Store(other),
        }
    }
}

/// Errors reported by an [`EntryStore`](crate::store::EntryStore).
#[derive(Debug, Error)]
pub enum StoreError {
    /// The write would create a second active entry.
    #[error("entry {0} is already active")]
    ActiveEntryExists(EntryId),

    #[error("entry not found: {0}")]
    EntryNotFound(EntryId),

    #[error("pause not found: {0}")]
    PauseNotFound(PauseId),

    /// The entry changed status between the caller's read and the write.
    #[error("entry {id} is {found}, expected {expected}")]
    StaleStatus {
        id: EntryId,
        expected: EntryStatus,
        found: EntryStatus,
    },

    /// The storage backend failed.
    #[error(transparent)]
    Backend(Box<dyn std::error::Error + Send + Sync>),
}

/// Errors from a [`GapSignalSource`](crate::gaps::GapSignalSource).
///
/// Never fatal: the reconciler downgrades these to a warning.
#[derive(Debug, Error)]
pub enum SignalSourceError {
    /// Gap signals are not available on this platform.
    #[error("gap signals are not supported on this platform")]
    Unsupported,

    /// The signal source failed to produce output.
    #[error("failed to read gap signals: {message}")]
    Unavailable { message: String },
}
