//! policygrid-notify — tells the scheduler service which policies are live.
//!
//! The scheduler executes time-based schedules on its own; PolicyGrid only
//! informs it when a policy is attached (activate, with the full policy
//! document) or detached (deactivate). Each notification is exactly one
//! outbound call. There is no retry: any failure is returned to the caller,
//! which owns the compensation decision.
//!
//! # Architecture
//!
//! ```text
//! ScheduleNotifier (trait, injected for testability)
//!   └── HttpScheduleNotifier
//!         ├── Activate   → PUT    {base}/v2/schedules/{app_id}?guid={guid}
//!         └── Deactivate → DELETE {base}/v2/schedules/{app_id}
//! ```

pub mod error;
pub mod http;
pub mod notifier;

pub use error::{NotifyError, NotifyResult};
pub use http::HttpScheduleNotifier;
pub use notifier::{NotifyFuture, ScheduleNotification, ScheduleNotifier, ScheduleOperation};
