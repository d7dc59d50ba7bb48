//! policygrid-binding — attach and detach autoscaling policies.
//!
//! A policy lives in two systems of record that share no transaction: the
//! policy store and the scheduler service. Bind and unbind are two-step
//! sagas whose step order makes the compensating action trivial.
//!
//! # Bind
//!
//! ```text
//! Validating ──▶ Persisting ──▶ Notifying ──▶ Committed
//!     │              │              │
//!     ▼              ▼              ▼
//!  Rejected   PersistenceFailed  Compensating (delete record)
//!                                   │
//!                                   ▼
//!                          NotificationFailure
//! ```
//!
//! # Unbind
//!
//! ```text
//! Fetching ──▶ Notifying ──▶ Deleting ──▶ Committed
//!   │  │           │            ▲
//!   │  └───────────┼(no policy)─┘
//!   ▼              ▼
//! PersistenceFailure  NotificationFailure (record kept)
//! ```
//!
//! Every exit is a variant of [`BindOutcome`] or [`UnbindOutcome`]. Nothing
//! is retried; the caller decides whether to try again.

pub mod binder;
pub mod bind;
pub mod outcome;
pub mod unbind;

#[cfg(test)]
mod testing;

pub use binder::PolicyBinder;
pub use outcome::{BindOutcome, UnbindOutcome};
