//! StateStore — redb-backed policy persistence.
//!
//! Records are JSON-serialized into redb's `&[u8]` value column, keyed by
//! application id. The store supports both on-disk and in-memory backends
//! (the latter for testing).

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;

use redb::{Database, ReadableDatabase, ReadableTable};
use tracing::{debug, warn};

use policygrid_core::AppId;

use crate::error::{StateError, StateResult};
use crate::tables::POLICIES;
use crate::types::PolicyRecord;

/// Convert any `Display` error into a `StateError` variant via a closure factory.
macro_rules! map_err {
    ($variant:ident) => {
        |e| StateError::$variant(e.to_string())
    };
}

/// Persistence operations the bind/unbind orchestrators depend on.
///
/// Implementations must make `put_policy` atomic from a reader's point of
/// view, `delete_policy` idempotent, and the guid check in
/// `delete_policy_if_guid` atomic with its removal.
pub trait PolicyStore: Send + Sync {
    /// Insert or replace the record for `record.app_id`. Returns true if a
    /// previous record was replaced.
    fn put_policy(&self, record: &PolicyRecord) -> StateResult<bool>;

    /// Get the record for an application, if any.
    fn get_policy(&self, app_id: &str) -> StateResult<Option<PolicyRecord>>;

    /// Delete the record for an application. Returns true if it existed;
    /// deleting an absent record is not an error.
    fn delete_policy(&self, app_id: &str) -> StateResult<bool>;

    /// Delete the record for an application only if it is still the
    /// revision identified by `policy_guid`. Returns true if it was removed;
    /// a missing record or a newer revision is left alone and returns false.
    fn delete_policy_if_guid(&self, app_id: &str, policy_guid: &str) -> StateResult<bool>;

    /// All application ids that currently have a policy.
    fn list_app_ids(&self) -> StateResult<BTreeSet<AppId>>;

    /// Snapshot of every stored record, in no particular order.
    fn list_policies(&self) -> StateResult<Vec<PolicyRecord>>;
}

/// Thread-safe policy store backed by redb.
#[derive(Clone)]
pub struct StateStore {
    db: Arc<Database>,
}

impl StateStore {
    /// Open (or create) a persistent policy store at the given path.
    pub fn open(path: &Path) -> StateResult<Self> {
        let db = Database::create(path).map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!(?path, "policy store opened");
        Ok(store)
    }

    /// Create an ephemeral in-memory policy store (for testing).
    pub fn open_in_memory() -> StateResult<Self> {
        let backend = redb::backends::InMemoryBackend::new();
        let db = Database::builder()
            .create_with_backend(backend)
            .map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!("in-memory policy store opened");
        Ok(store)
    }

    /// Create the policy table if it doesn't exist yet.
    fn ensure_tables(&self) -> StateResult<()> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        // Opening a table in a write transaction creates it if absent.
        txn.open_table(POLICIES).map_err(map_err!(Table))?;
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(())
    }
}

impl PolicyStore for StateStore {
    fn put_policy(&self, record: &PolicyRecord) -> StateResult<bool> {
        let key = record.table_key();
        let value = serde_json::to_vec(record).map_err(map_err!(Serialize))?;
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let replaced;
        {
            let mut table = txn.open_table(POLICIES).map_err(map_err!(Table))?;
            replaced = table
                .insert(key, value.as_slice())
                .map_err(map_err!(Write))?
                .is_some();
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(app_id = %key, replaced, "policy stored");
        Ok(replaced)
    }

    fn get_policy(&self, app_id: &str) -> StateResult<Option<PolicyRecord>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(POLICIES).map_err(map_err!(Table))?;
        match table.get(app_id).map_err(map_err!(Read))? {
            Some(guard) => {
                let record: PolicyRecord =
                    serde_json::from_slice(guard.value()).map_err(map_err!(Deserialize))?;
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    fn delete_policy(&self, app_id: &str) -> StateResult<bool> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let existed;
        {
            let mut table = txn.open_table(POLICIES).map_err(map_err!(Table))?;
            existed = table.remove(app_id).map_err(map_err!(Write))?.is_some();
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(%app_id, existed, "policy deleted");
        Ok(existed)
    }

    fn delete_policy_if_guid(&self, app_id: &str, policy_guid: &str) -> StateResult<bool> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let removed;
        {
            let mut table = txn.open_table(POLICIES).map_err(map_err!(Table))?;
            let current = match table.get(app_id).map_err(map_err!(Read))? {
                Some(guard) => {
                    let stored: PolicyRecord =
                        serde_json::from_slice(guard.value()).map_err(map_err!(Deserialize))?;
                    stored.policy_guid == policy_guid
                }
                None => false,
            };
            removed = current && table.remove(app_id).map_err(map_err!(Write))?.is_some();
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(%app_id, %policy_guid, removed, "conditional policy delete");
        Ok(removed)
    }

    fn list_app_ids(&self) -> StateResult<BTreeSet<AppId>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(POLICIES).map_err(map_err!(Table))?;
        let mut ids = BTreeSet::new();
        for entry in table.iter().map_err(map_err!(Read))? {
            let (key, _) = entry.map_err(map_err!(Read))?;
            ids.insert(key.value().to_string());
        }
        Ok(ids)
    }

    fn list_policies(&self) -> StateResult<Vec<PolicyRecord>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(POLICIES).map_err(map_err!(Table))?;
        let mut results = Vec::new();
        for entry in table.iter().map_err(map_err!(Read))? {
            let (key, value) = entry.map_err(map_err!(Read))?;
            match serde_json::from_slice::<PolicyRecord>(value.value()) {
                Ok(record) => results.push(record),
                // One bad row must not hide every other policy from consumers.
                Err(e) => warn!(app_id = %key.value(), error = %e, "skipping undecodable policy"),
            }
        }
        Ok(results)
    }
}
