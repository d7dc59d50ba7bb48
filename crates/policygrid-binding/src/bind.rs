//! Bind: validate, persist, then activate on the scheduler.
//!
//! The store is written before the scheduler is told. If activation fails
//! the only thing to undo is our own write, which a delete of that exact
//! revision reverses.

use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{debug, error, info, warn};

use policygrid_core::{validate, PolicyDocument, ValidationError};
use policygrid_notify::{NotifyError, ScheduleNotification};
use policygrid_state::PolicyRecord;

use crate::binder::PolicyBinder;
use crate::outcome::BindOutcome;

/// Non-terminal bind states.
#[derive(Debug)]
enum BindStep {
    Validating,
    Persisting,
    Notifying { replaced: bool },
    Compensating(NotifyError),
}

impl BindStep {
    fn name(&self) -> &'static str {
        match self {
            BindStep::Validating => "validating",
            BindStep::Persisting => "persisting",
            BindStep::Notifying { .. } => "notifying",
            BindStep::Compensating(_) => "compensating",
        }
    }
}

impl PolicyBinder {
    /// Attach `policy` to `app_id`, replacing any existing policy.
    pub async fn bind(&self, app_id: &str, policy: PolicyDocument) -> BindOutcome {
        let record = PolicyRecord {
            app_id: app_id.to_string(),
            policy_guid: uuid::Uuid::new_v4().to_string(),
            policy,
            updated_at: epoch_secs(),
        };

        let mut step = BindStep::Validating;
        loop {
            debug!(%app_id, step = step.name(), "bind");
            step = match step {
                BindStep::Validating => match validate_binding(app_id, &record.policy) {
                    Ok(()) => BindStep::Persisting,
                    Err(e) => {
                        warn!(%app_id, error = %e, "policy rejected");
                        return BindOutcome::Rejected(e);
                    }
                },

                BindStep::Persisting => match self.store.put_policy(&record) {
                    Ok(replaced) => BindStep::Notifying { replaced },
                    Err(e) => {
                        warn!(%app_id, error = %e, "failed to store policy");
                        return BindOutcome::PersistenceFailure(e);
                    }
                },

                BindStep::Notifying { replaced } => {
                    let notification = ScheduleNotification::activate(
                        app_id,
                        &record.policy_guid,
                        &record.policy,
                    );
                    match self.notifier.notify(notification).await {
                        Ok(()) => {
                            info!(%app_id, policy_guid = %record.policy_guid, replaced, "policy bound");
                            return BindOutcome::Committed {
                                policy_guid: record.policy_guid.clone(),
                                replaced,
                            };
                        }
                        Err(e) => BindStep::Compensating(e),
                    }
                }

                BindStep::Compensating(notify_error) => {
                    warn!(%app_id, error = %notify_error, "scheduler activation failed, removing stored policy");
                    // Only our own revision is removed; a bind that committed
                    // meanwhile keeps its record.
                    let compensated = match self
                        .store
                        .delete_policy_if_guid(app_id, &record.policy_guid)
                    {
                        Ok(true) => true,
                        Ok(false) => {
                            debug!(%app_id, policy_guid = %record.policy_guid, "policy already superseded, nothing to remove");
                            true
                        }
                        Err(e) => {
                            error!(
                                %app_id,
                                policy_guid = %record.policy_guid,
                                error = %e,
                                "compensating delete failed, stored policy is orphaned"
                            );
                            false
                        }
                    };
                    return BindOutcome::NotificationFailure {
                        error: notify_error,
                        compensated,
                    };
                }
            };
        }
    }
}

fn validate_binding(app_id: &str, policy: &PolicyDocument) -> Result<(), ValidationError> {
    if app_id.trim().is_empty() {
        return Err(ValidationError {
            errors: vec!["app_id must not be empty".to_string()],
        });
    }
    validate(policy)
}

fn epoch_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use policygrid_notify::ScheduleOperation;
    use policygrid_state::{PolicyStore, StateStore};

    use super::*;
    use crate::testing::*;

    #[tokio::test]
    async fn bind_commits_and_stores_policy() {
        let store = StateStore::open_in_memory().unwrap();
        let notifier = Arc::new(RecordingNotifier::succeeding());
        let binder = PolicyBinder::new(Arc::new(store.clone()), notifier.clone());

        let outcome = binder.bind("app-1", test_policy(1, 4)).await;

        let policy_guid = match outcome {
            BindOutcome::Committed { policy_guid, replaced } => {
                assert!(!replaced);
                policy_guid
            }
            other => panic!("expected commit, got {other:?}"),
        };
        let record = store.get_policy("app-1").unwrap().unwrap();
        assert_eq!(record.policy, test_policy(1, 4));
        assert_eq!(record.policy_guid, policy_guid);
        assert_eq!(notifier.operations(), vec![ScheduleOperation::Activate]);
    }

    #[tokio::test]
    async fn rebind_replaces_and_issues_fresh_guid() {
        let store = StateStore::open_in_memory().unwrap();
        let binder = PolicyBinder::new(
            Arc::new(store.clone()),
            Arc::new(RecordingNotifier::succeeding()),
        );

        let first = binder.bind("app-1", test_policy(1, 4)).await;
        let second = binder.bind("app-1", test_policy(2, 8)).await;

        let (
            BindOutcome::Committed { policy_guid: g1, .. },
            BindOutcome::Committed { policy_guid: g2, replaced },
        ) = (first, second)
        else {
            panic!("both binds should commit");
        };
        assert!(replaced);
        assert_ne!(g1, g2);
        assert_eq!(
            store.get_policy("app-1").unwrap().unwrap().policy,
            test_policy(2, 8)
        );
    }

    #[tokio::test]
    async fn invalid_policy_touches_nothing() {
        let store = StateStore::open_in_memory().unwrap();
        let notifier = Arc::new(RecordingNotifier::succeeding());
        let binder = PolicyBinder::new(Arc::new(store.clone()), notifier.clone());

        let outcome = binder.bind("app-1", test_policy(10, 4)).await;

        assert!(matches!(outcome, BindOutcome::Rejected(_)));
        assert!(store.get_policy("app-1").unwrap().is_none());
        assert_eq!(notifier.count(), 0);
    }

    #[tokio::test]
    async fn empty_app_id_is_rejected() {
        let notifier = Arc::new(RecordingNotifier::succeeding());
        let binder = PolicyBinder::new(Arc::new(UnreachableStore), notifier.clone());

        let outcome = binder.bind("  ", test_policy(1, 4)).await;

        let e = match outcome {
            BindOutcome::Rejected(e) => e,
            other => panic!("expected rejection, got {other:?}"),
        };
        assert_eq!(e.errors, vec!["app_id must not be empty".to_string()]);
        assert_eq!(notifier.count(), 0);
    }

    #[tokio::test]
    async fn store_failure_skips_scheduler() {
        let notifier = Arc::new(RecordingNotifier::succeeding());
        let binder = PolicyBinder::new(Arc::new(UnreachableStore), notifier.clone());

        let outcome = binder.bind("app-1", test_policy(1, 4)).await;

        assert!(matches!(outcome, BindOutcome::PersistenceFailure(_)));
        assert_eq!(notifier.count(), 0);
    }

    #[tokio::test]
    async fn scheduler_failure_compensates_once() {
        let store = StateStore::open_in_memory().unwrap();
        let notifier = Arc::new(RecordingNotifier::failing());
        let binder = PolicyBinder::new(Arc::new(store.clone()), notifier.clone());

        let outcome = binder.bind("app-1", test_policy(1, 4)).await;

        assert!(matches!(
            outcome,
            BindOutcome::NotificationFailure { compensated: true, .. }
        ));
        assert!(store.get_policy("app-1").unwrap().is_none());
        assert_eq!(notifier.count(), 1);
    }

    #[tokio::test]
    async fn failed_compensation_still_reports_notification_failure() {
        let store = StateStore::open_in_memory().unwrap();
        let flaky = Arc::new(DeleteFailingStore(store.clone()));
        let binder = PolicyBinder::new(flaky, Arc::new(RecordingNotifier::failing()));

        let outcome = binder.bind("app-1", test_policy(1, 4)).await;

        assert!(matches!(
            outcome,
            BindOutcome::NotificationFailure { compensated: false, .. }
        ));
        // The orphaned record is left behind.
        assert!(store.get_policy("app-1").unwrap().is_some());
    }

    #[tokio::test]
    async fn compensation_keeps_a_concurrently_committed_policy() {
        let store = StateStore::open_in_memory().unwrap();
        let notifier = Arc::new(RacingNotifier::new(store.clone(), true));
        let binder = PolicyBinder::new(Arc::new(store.clone()), notifier);

        let outcome = binder.bind("app-1", test_policy(1, 4)).await;

        assert!(matches!(
            outcome,
            BindOutcome::NotificationFailure { compensated: true, .. }
        ));
        let kept = store.get_policy("app-1").unwrap().unwrap();
        assert_eq!(kept.policy_guid, CONCURRENT_GUID);
        assert_eq!(kept.policy, test_policy(2, 6));
    }
}
