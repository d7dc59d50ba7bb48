//! Unbind: look up, deactivate on the scheduler, then delete.
//!
//! The scheduler is told before the record is removed. A failed
//! deactivation leaves both systems still agreeing the policy is live, which
//! a retry can fix; deleting first could strand a running schedule with no
//! policy behind it. The delete only removes the revision that was read, so
//! a bind that lands in between keeps its record.

use tracing::{debug, info, warn};

use policygrid_notify::ScheduleNotification;

use crate::binder::PolicyBinder;
use crate::outcome::UnbindOutcome;

/// Non-terminal unbind states.
#[derive(Debug, Clone)]
enum UnbindStep {
    Fetching,
    Notifying { policy_guid: String },
    /// `None` when no policy was attached.
    Deleting { policy_guid: Option<String> },
}

impl UnbindStep {
    fn name(&self) -> &'static str {
        match self {
            UnbindStep::Fetching => "fetching",
            UnbindStep::Notifying { .. } => "notifying",
            UnbindStep::Deleting { .. } => "deleting",
        }
    }
}

impl PolicyBinder {
    /// Detach whatever policy `app_id` has. Detaching an application with
    /// no policy succeeds without contacting the scheduler.
    pub async fn unbind(&self, app_id: &str) -> UnbindOutcome {
        let mut step = UnbindStep::Fetching;
        loop {
            debug!(%app_id, step = step.name(), "unbind");
            step = match step {
                UnbindStep::Fetching => match self.store.get_policy(app_id) {
                    Ok(Some(record)) => UnbindStep::Notifying {
                        policy_guid: record.policy_guid,
                    },
                    Ok(None) => {
                        debug!(%app_id, "no policy attached, skipping scheduler");
                        UnbindStep::Deleting { policy_guid: None }
                    }
                    Err(e) => {
                        warn!(%app_id, error = %e, "failed to read policy");
                        return UnbindOutcome::PersistenceFailure(e);
                    }
                },

                UnbindStep::Notifying { policy_guid } => {
                    match self
                        .notifier
                        .notify(ScheduleNotification::deactivate(app_id))
                        .await
                    {
                        Ok(()) => UnbindStep::Deleting {
                            policy_guid: Some(policy_guid),
                        },
                        Err(e) => {
                            warn!(%app_id, error = %e, "scheduler deactivation failed, policy kept");
                            return UnbindOutcome::NotificationFailure(e);
                        }
                    }
                }

                // Nothing was read, so there is nothing of ours to remove.
                UnbindStep::Deleting { policy_guid: None } => {
                    info!(%app_id, had_policy = false, "policy unbound");
                    return UnbindOutcome::Committed { had_policy: false };
                }

                UnbindStep::Deleting {
                    policy_guid: Some(policy_guid),
                } => match self.store.delete_policy_if_guid(app_id, &policy_guid) {
                    Ok(removed) => {
                        if !removed {
                            debug!(%app_id, %policy_guid, "policy superseded by a newer bind, kept");
                        }
                        info!(%app_id, had_policy = true, "policy unbound");
                        return UnbindOutcome::Committed { had_policy: true };
                    }
                    Err(e) => {
                        // Schedules are already deactivated; a retry re-sends the
                        // deactivation and then deletes.
                        warn!(%app_id, error = %e, "failed to delete policy");
                        return UnbindOutcome::PersistenceFailure(e);
                    }
                },
            };
        }
    }
}
