//! The orchestrator handle shared by bind and unbind.

use std::sync::Arc;

use policygrid_notify::ScheduleNotifier;
use policygrid_state::PolicyStore;

/// Runs bind/unbind sagas against a policy store and a scheduler.
///
/// Holds no per-application state, so one binder can serve concurrent
/// requests for any number of applications.
#[derive(Clone)]
pub struct PolicyBinder {
    pub(crate) store: Arc<dyn PolicyStore>,
    pub(crate) notifier: Arc<dyn ScheduleNotifier>,
}

impl PolicyBinder {
    pub fn new(store: Arc<dyn PolicyStore>, notifier: Arc<dyn ScheduleNotifier>) -> Self {
        Self { store, notifier }
    }

    /// The store this binder writes to, for read-only queries.
    pub fn store(&self) -> &Arc<dyn PolicyStore> {
        &self.store
    }
}
