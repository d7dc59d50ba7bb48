//! Test doubles for the store and the scheduler.

use std::collections::BTreeSet;
use std::sync::Mutex;

use policygrid_core::{AppId, PolicyDocument, ScalingRule};
use policygrid_notify::{
    NotifyError, NotifyFuture, ScheduleNotification, ScheduleNotifier, ScheduleOperation,
};
use policygrid_state::{PolicyRecord, PolicyStore, StateError, StateResult, StateStore};

pub fn test_policy(min: i32, max: i32) -> PolicyDocument {
    PolicyDocument {
        instance_min_count: min,
        instance_max_count: max,
        scaling_rules: vec![ScalingRule {
            metric_type: "memoryused".to_string(),
            stat_window_secs: Some(300),
            breach_duration_secs: Some(600),
            threshold: 30,
            operator: "<".to_string(),
            cool_down_secs: Some(300),
            adjustment: "-1".to_string(),
        }],
        schedules: None,
    }
}

/// Records every notification and answers with a fixed result.
pub struct RecordingNotifier {
    fail: bool,
    calls: Mutex<Vec<ScheduleOperation>>,
}

impl RecordingNotifier {
    pub fn succeeding() -> Self {
        Self {
            fail: false,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn operations(&self) -> Vec<ScheduleOperation> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl ScheduleNotifier for RecordingNotifier {
    fn notify<'a>(&'a self, notification: ScheduleNotification<'a>) -> NotifyFuture<'a> {
        self.calls.lock().unwrap().push(notification.operation);
        let fail = self.fail;
        Box::pin(async move {
            if fail {
                Err(NotifyError::Status {
                    endpoint: format!("{} {}", notification.operation, notification.app_id),
                    status: 500,
                    body: "error".to_string(),
                })
            } else {
                Ok(())
            }
        })
    }
}

/// A store whose backend is down.
pub struct UnreachableStore;

fn unavailable<T>() -> StateResult<T> {
    Err(StateError::Transaction("connection refused".to_string()))
}

impl PolicyStore for UnreachableStore {
    fn put_policy(&self, _record: &PolicyRecord) -> StateResult<bool> {
        unavailable()
    }

    fn get_policy(&self, _app_id: &str) -> StateResult<Option<PolicyRecord>> {
        unavailable()
    }

    fn delete_policy(&self, _app_id: &str) -> StateResult<bool> {
        unavailable()
    }

    fn delete_policy_if_guid(&self, _app_id: &str, _policy_guid: &str) -> StateResult<bool> {
        unavailable()
    }

    fn list_app_ids(&self) -> StateResult<BTreeSet<AppId>> {
        unavailable()
    }

    fn list_policies(&self) -> StateResult<Vec<PolicyRecord>> {
        unavailable()
    }
}

/// Delegates to a real store but fails every delete.
pub struct DeleteFailingStore(pub StateStore);

impl PolicyStore for DeleteFailingStore {
    fn put_policy(&self, record: &PolicyRecord) -> StateResult<bool> {
        self.0.put_policy(record)
    }

    fn get_policy(&self, app_id: &str) -> StateResult<Option<PolicyRecord>> {
        self.0.get_policy(app_id)
    }

    fn delete_policy(&self, _app_id: &str) -> StateResult<bool> {
        unavailable()
    }

    fn delete_policy_if_guid(&self, _app_id: &str, _policy_guid: &str) -> StateResult<bool> {
        unavailable()
    }

    fn list_app_ids(&self) -> StateResult<BTreeSet<AppId>> {
        self.0.list_app_ids()
    }

    fn list_policies(&self) -> StateResult<Vec<PolicyRecord>> {
        self.0.list_policies()
    }
}

/// Guid of the record [`RacingNotifier`] writes.
pub const CONCURRENT_GUID: &str = "concurrent";

/// Simulates another bind for the same application committing while this
/// notification is in flight: the call stores a competing record, then
/// answers with a fixed result.
pub struct RacingNotifier {
    store: StateStore,
    fail: bool,
}

impl RacingNotifier {
    pub fn new(store: StateStore, fail: bool) -> Self {
        Self { store, fail }
    }
}

impl ScheduleNotifier for RacingNotifier {
    fn notify<'a>(&'a self, notification: ScheduleNotification<'a>) -> NotifyFuture<'a> {
        Box::pin(async move {
            let competing = PolicyRecord {
                app_id: notification.app_id.to_string(),
                policy_guid: CONCURRENT_GUID.to_string(),
                policy: test_policy(2, 6),
                updated_at: 2000,
            };
            self.store.put_policy(&competing).unwrap();
            if self.fail {
                Err(NotifyError::Status {
                    endpoint: format!("{} {}", notification.operation, notification.app_id),
                    status: 500,
                    body: "error".to_string(),
                })
            } else {
                Ok(())
            }
        })
    }
}
