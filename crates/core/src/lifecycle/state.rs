//! Lifecycle value type and transitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use ecoop_shared::types::UserId;

/// Derived state of a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchState {
    /// Generated; entries may be regenerated and inputs edited.
    Draft,
    /// Frozen for review; may be posted or returned to draft.
    Printed,
    /// Committed to the ledger; immutable.
    Posted,
}

impl std::fmt::Display for BatchState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Draft => write!(f, "draft"),
            Self::Printed => write!(f, "printed"),
            Self::Posted => write!(f, "posted"),
        }
    }
}

/// A transition was requested from the wrong state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Batch must be {required} but is {actual}")]
pub struct StateConflict {
    /// State the transition requires.
    pub required: BatchState,
    /// State the batch is actually in.
    pub actual: BatchState,
}

impl StateConflict {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        "STATE_CONFLICT"
    }
}

/// Persisted stamps violate `posted ⇒ printed` or have a user without a date.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Corrupt lifecycle stamps: {0}")]
pub struct CorruptLifecycle(pub String);

/// Print and post stamps of a batch.
///
/// The state is derived from which stamps are present, so an invalid
/// combination can only enter through [`Lifecycle::from_stamps`], which rejects it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Lifecycle {
    printed_by: Option<UserId>,
    printed_date: Option<DateTime<Utc>>,
    posted_by: Option<UserId>,
    posted_date: Option<DateTime<Utc>>,
}

impl Lifecycle {
    /// A freshly generated batch.
    #[must_use]
    pub const fn draft() -> Self {
        Self {
            printed_by: None,
            printed_date: None,
            posted_by: None,
            posted_date: None,
        }
    }

    /// Rebuilds a lifecycle from stored columns.
    ///
    /// # Errors
    ///
    /// Returns `CorruptLifecycle` when a posted stamp exists without a printed
    /// stamp, or when a user is recorded without its date (or the reverse).
    pub fn from_stamps(
        printed_by: Option<UserId>,
        printed_date: Option<DateTime<Utc>>,
        posted_by: Option<UserId>,
        posted_date: Option<DateTime<Utc>>,
    ) -> Result<Self, CorruptLifecycle> {
        if printed_by.is_some() != printed_date.is_some() {
            return Err(CorruptLifecycle("printed_by and printed_date disagree".into()));
        }
        if posted_by.is_some() != posted_date.is_some() {
            return Err(CorruptLifecycle("posted_by and posted_date disagree".into()));
        }
        if posted_date.is_some() && printed_date.is_none() {
            return Err(CorruptLifecycle("posted batch was never printed".into()));
        }
        Ok(Self {
            printed_by,
            printed_date,
            posted_by,
            posted_date,
        })
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> BatchState {
        if self.posted_date.is_some() {
            BatchState::Posted
        } else if self.printed_date.is_some() {
            BatchState::Printed
        } else {
            BatchState::Draft
        }
    }

    /// Operator who printed the batch.
    #[must_use]
    pub const fn printed_by(&self) -> Option<UserId> {
        self.printed_by
    }

    /// When the batch was printed.
    #[must_use]
    pub const fn printed_date(&self) -> Option<DateTime<Utc>> {
        self.printed_date
    }

    /// Operator who posted the batch.
    #[must_use]
    pub const fn posted_by(&self) -> Option<UserId> {
        self.posted_by
    }

    /// When the batch was posted.
    #[must_use]
    pub const fn posted_date(&self) -> Option<DateTime<Utc>> {
        self.posted_date
    }

    /// Fails unless the batch is in `required`.
    pub fn require(&self, required: BatchState) -> Result<(), StateConflict> {
        let actual = self.state();
        if actual == required {
            Ok(())
        } else {
            Err(StateConflict { required, actual })
        }
    }

    /// Draft → Printed.
    pub fn print(&self, by: UserId, at: DateTime<Utc>) -> Result<Self, StateConflict> {
        self.require(BatchState::Draft)?;
        Ok(Self {
            printed_by: Some(by),
            printed_date: Some(at),
            ..*self
        })
    }

    /// Printed → Draft, clearing the print stamps.
    pub fn undo_print(&self) -> Result<Self, StateConflict> {
        self.require(BatchState::Printed)?;
        Ok(Self::draft())
    }

    /// Printed → Posted. There is no way back.
    pub fn post(&self, by: UserId, at: DateTime<Utc>) -> Result<Self, StateConflict> {
        self.require(BatchState::Printed)?;
        Ok(Self {
            posted_by: Some(by),
            posted_date: Some(at),
            ..*self
        })
    }
}
