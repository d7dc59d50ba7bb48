//! Persisted record types.

use serde::{Deserialize, Serialize};

use policygrid_core::{AppId, PolicyDocument};

/// The policy currently attached to an application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyRecord {
    pub app_id: AppId,
    /// Identifies this revision of the policy; regenerated on every bind.
    pub policy_guid: String,
    pub policy: PolicyDocument,
    /// Unix timestamp (seconds) of the bind that wrote this record.
    pub updated_at: u64,
}

impl PolicyRecord {
    /// Table key for this record.
    pub fn table_key(&self) -> &str {
        &self.app_id
    }
}
