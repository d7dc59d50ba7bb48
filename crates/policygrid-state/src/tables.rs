//! redb table definitions for the policy store.

use redb::TableDefinition;

/// Policy records keyed by application id. Values are JSON-serialized
/// [`PolicyRecord`](crate::PolicyRecord)s.
pub const POLICIES: TableDefinition<&str, &[u8]> = TableDefinition::new("policy_json");
