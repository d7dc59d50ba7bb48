//! The notifier capability the orchestrators depend on.

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use policygrid_core::PolicyDocument;

use crate::error::NotifyResult;

/// Boxed future returned by [`ScheduleNotifier::notify`].
pub type NotifyFuture<'a> = Pin<Box<dyn Future<Output = NotifyResult<()>> + Send + 'a>>;

/// What the scheduler should do with an application's schedules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleOperation {
    Activate,
    Deactivate,
}

impl fmt::Display for ScheduleOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScheduleOperation::Activate => f.write_str("activate"),
            ScheduleOperation::Deactivate => f.write_str("deactivate"),
        }
    }
}

/// A single message to the scheduler. Lives only for the duration of the call.
#[derive(Debug, Clone, Copy)]
pub struct ScheduleNotification<'a> {
    pub app_id: &'a str,
    pub operation: ScheduleOperation,
    /// Revision id of the policy being activated.
    pub policy_guid: Option<&'a str>,
    /// Full policy document; present only on activate.
    pub policy: Option<&'a PolicyDocument>,
}

impl<'a> ScheduleNotification<'a> {
    pub fn activate(app_id: &'a str, policy_guid: &'a str, policy: &'a PolicyDocument) -> Self {
        Self {
            app_id,
            operation: ScheduleOperation::Activate,
            policy_guid: Some(policy_guid),
            policy: Some(policy),
        }
    }

    pub fn deactivate(app_id: &'a str) -> Self {
        Self {
            app_id,
            operation: ScheduleOperation::Deactivate,
            policy_guid: None,
            policy: None,
        }
    }
}

/// Informs the scheduler service of policy activation changes.
///
/// Implementations make exactly one attempt per call. Transport failures,
/// timeouts and refusals all surface as an error.
pub trait ScheduleNotifier: Send + Sync {
    fn notify<'a>(&'a self, notification: ScheduleNotification<'a>) -> NotifyFuture<'a>;
}
