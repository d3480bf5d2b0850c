//! Core type definitions with validation.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Validation errors for core types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The provided value was empty or blank.
    #[error("{field} cannot be empty")]
    Empty { field: &'static str },

    /// Invalid entry status value.
    #[error("invalid entry status: {value}")]
    InvalidStatus { value: String },

    /// Invalid pause reason value.
    #[error("invalid pause reason: {value}")]
    InvalidPauseReason { value: String },

    /// Unknown report period name.
    #[error("invalid period: {value}")]
    InvalidPeriod { value: String },
}

/// Lifecycle state of an entry.
///
/// At most one entry in a store may be [`Running`](Self::Running) or
/// [`Paused`](Self::Paused) at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryStatus {
    Running,
    Paused,
    Stopped,
}

impl EntryStatus {
    /// String representation for database storage.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Paused => "paused",
            Self::Stopped => "stopped",
        }
    }

    /// Whether this status counts as the active entry.
    #[must_use]
    pub const fn is_active(self) -> bool {
        match self {
            Self::Running | Self::Paused => true,
            Self::Stopped => false,
        }
    }
}

impl fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for EntryStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "running" => Ok(Self::Running),
            "paused" => Ok(Self::Paused),
            "stopped" => Ok(Self::Stopped),
            _ => Err(ValidationError::InvalidStatus {
                value: s.to_string(),
            }),
        }
    }
}

/// Why a pause exists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PauseReason {
    /// Paused by the user, inserted historically, or the gap of a reopen.
    #[default]
    Manual,
    /// Display was off long enough to count as an interruption.
    DisplayOff,
    /// The machine was asleep.
    SystemSleep,
}

impl PauseReason {
    /// String representation for database storage.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::DisplayOff => "display_off",
            Self::SystemSleep => "system_sleep",
        }
    }
}

impl fmt::Display for PauseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for PauseReason {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "manual" => Ok(Self::Manual),
            "display_off" => Ok(Self::DisplayOff),
            "system_sleep" => Ok(Self::SystemSleep),
            _ => Err(ValidationError::InvalidPauseReason {
                value: s.to_string(),
            }),
        }
    }
}

/// Generates a validated string newtype with common trait implementations.
macro_rules! define_string_id {
    (
        $(#[$meta:meta])*
        $name:ident, $field_name:literal
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Creates a new value after validation.
            pub fn new(id: impl Into<String>) -> Result<Self, ValidationError> {
                let id = id.into();
                if id.trim().is_empty() {
                    return Err(ValidationError::Empty { field: $field_name });
                }
                Ok(Self(id))
            }

            /// Returns the value as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = ValidationError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_string_id!(
    /// A validated entry identifier.
    EntryId, "entry ID"
);

define_string_id!(
    /// A validated pause identifier.
    PauseId, "pause ID"
);

define_string_id!(
    /// A project name. Projects are keyed by name and created on first use.
    ProjectName, "project"
);

define_string_id!(
    /// A tag name. Tags are keyed by name and created on first use.
    TagName, "tag"
);
