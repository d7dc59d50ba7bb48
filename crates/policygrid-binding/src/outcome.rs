//! Outcomes of bind and unbind operations.
//!
//! These are internal result types, not wire codes. The HTTP layer maps
//! them to status codes.

use policygrid_core::ValidationError;
use policygrid_notify::NotifyError;
use policygrid_state::StateError;

/// How a bind ended.
#[derive(Debug)]
pub enum BindOutcome {
    /// Policy stored and activated on the scheduler.
    Committed {
        policy_guid: String,
        /// A previous policy for the application was replaced.
        replaced: bool,
    },
    /// The document failed validation; nothing was touched.
    Rejected(ValidationError),
    /// The store write failed; the scheduler was never called.
    PersistenceFailure(StateError),
    /// The scheduler refused or could not be reached after the record was
    /// written. The record was then deleted unless `compensated` is false,
    /// in which case an orphaned record remains in the store.
    NotificationFailure {
        error: NotifyError,
        compensated: bool,
    },
}

impl BindOutcome {
    pub fn is_committed(&self) -> bool {
        matches!(self, BindOutcome::Committed { .. })
    }

    /// Short label for request logs.
    pub fn label(&self) -> &'static str {
        match self {
            BindOutcome::Committed { .. } => "committed",
            BindOutcome::Rejected(_) => "rejected",
            BindOutcome::PersistenceFailure(_) => "persistence_failure",
            BindOutcome::NotificationFailure { .. } => "notification_failure",
        }
    }
}

/// How an unbind ended.
#[derive(Debug)]
pub enum UnbindOutcome {
    /// No policy remains for the application.
    Committed {
        /// A policy was attached before this call.
        had_policy: bool,
    },
    /// The store could not be read or the final delete failed.
    PersistenceFailure(StateError),
    /// The scheduler refused the deactivation; the record was kept.
    NotificationFailure(NotifyError),
}

impl UnbindOutcome {
    pub fn is_committed(&self) -> bool {
        matches!(self, UnbindOutcome::Committed { .. })
    }

    pub fn label(&self) -> &'static str {
        match self {
            UnbindOutcome::Committed { .. } => "committed",
            UnbindOutcome::PersistenceFailure(_) => "persistence_failure",
            UnbindOutcome::NotificationFailure(_) => "notification_failure",
        }
    }
}
