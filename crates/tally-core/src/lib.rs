//! Core domain logic for the tally time tracker.
//!
//! This crate contains the fundamental types and logic for:
//! - Duration: active time of an entry net of its pauses
//! - Pause ledger: validated pause writes and replace-by-diff planning
//! - Gap reconciliation: turning sleep/display signals into pauses
//! - Entry lifecycle: start, pause, resume, stop, reopen, edit, delete
//! - Resume policy: resume in place, reopen, or clone by project
//! - Reports: calendar periods and per-project/per-tag totals
//!
//! Storage and gap signals are reached only through the [`EntryStore`] and
//! [`GapSignalSource`] traits.

pub mod document;
pub mod entry;
pub mod error;
pub mod gaps;
pub mod ledger;
mod machine;
pub mod report;
mod resume;
pub mod store;
pub mod timefmt;
pub mod types;

pub use document::{EditRequest, EntryDocument, PauseDocument};
pub use entry::{Entry, Pause};
pub use error::{ErrorKind, SignalSourceError, StoreError, TrackError};
pub use gaps::{
    Gap, GapBoundary, GapLevel, GapSignal, GapSignalSource, NOISE_THRESHOLD, NoSignals,
    Reconciliation, reconcile,
};
pub use ledger::{PauseDraft, PauseLedger, plan_pauses};
pub use machine::{Tracker, Transition};
pub use report::{Period, Summary, summarize};
pub use resume::{ConfirmReopen, ResumeOutcome, Resumption};
pub use store::{EntryFilter, EntryStore, EntryUpdate, NewEntry, NewPause, PausePlan, StateChange};
pub use types::{EntryId, EntryStatus, PauseId, PauseReason, ProjectName, TagName, ValidationError};
