//! The audit trail facade the pipeline writes through.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use kyc_types::{KycResult, VerificationId};
use serde_json::Value;
use tracing::info;

use crate::entry::AuditEntry;
use crate::mask::{contains_sensitive_fields, mask_sensitive_fields};
use crate::store::{AuditQuery, AuditStore};

/// Records audit entries with masking and change tracking applied.
#[derive(Clone)]
pub struct AuditTrail {
    store: Arc<dyn AuditStore>,
}

impl AuditTrail {
    pub fn new(store: Arc<dyn AuditStore>) -> Self {
        Self { store }
    }

    /// Appends an entry as-is. Use [`record_change`](Self::record_change)
    /// when before/after snapshots are available.
    pub async fn record(&self, entry: AuditEntry) -> KycResult<()> {
        info!(
            action = %entry.action,
            verification_id = ?entry.verification_id,
            document_id = ?entry.document_id,
            compliance = entry.compliance_relevant,
            "Audit entry recorded"
        );
        self.store.append(entry).await
    }

    /// Masks both snapshots, derives the changed-field list, flags sensitive
    /// access, and appends.
    pub async fn record_change(
        &self,
        mut entry: AuditEntry,
        old_values: Option<Value>,
        new_values: Option<Value>,
    ) -> KycResult<()> {
        if let (Some(old), Some(new)) = (&old_values, &new_values) {
            entry.changed_fields = changed_fields(old, new);
        }
        entry.sensitive_data_accessed = old_values
            .as_ref()
            .map_or(false, contains_sensitive_fields)
            || new_values.as_ref().map_or(false, contains_sensitive_fields);
        entry.old_values = old_values.map(masked);
        entry.new_values = new_values.map(masked);
        self.record(entry).await
    }

    /// Full trail for one verification, most recent first.
    pub async fn trail_for(&self, verification_id: VerificationId) -> KycResult<Vec<AuditEntry>> {
        self.store
            .query(&AuditQuery::for_verification(verification_id))
            .await
    }

    pub async fn query(&self, query: &AuditQuery) -> KycResult<Vec<AuditEntry>> {
        self.store.query(query).await
    }

    /// Deletes entries past their retention deadline. Returns the count.
    pub async fn purge_expired(&self, now: DateTime<Utc>) -> KycResult<usize> {
        let purged = self.store.purge_expired(now).await?;
        if purged > 0 {
            info!(purged, "Purged expired audit entries");
        }
        Ok(purged)
    }
}

fn masked(mut value: Value) -> Value {
    mask_sensitive_fields(&mut value);
    value
}

/// Union of top-level keys whose values differ between the two snapshots.
fn changed_fields(old: &Value, new: &Value) -> Vec<String> {
    let (Some(old_map), Some(new_map)) = (old.as_object(), new.as_object()) else {
        return Vec::new();
    };
    let mut fields: Vec<String> = new_map
        .iter()
        .filter(|(key, value)| old_map.get(key.as_str()) != Some(*value))
        .map(|(key, _)| key.clone())
        .collect();
    for key in old_map.keys() {
        if !new_map.contains_key(key) && !fields.contains(key) {
            fields.push(key.clone());
        }
    }
    fields.sort();
    fields
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::{Actor, AuditAction};
    use crate::store::InMemoryAuditStore;
    use serde_json::json;

    #[tokio::test]
    async fn record_change_masks_and_diffs() {
        let trail = AuditTrail::new(Arc::new(InMemoryAuditStore::new()));
        let verification_id = VerificationId::new();
        let mut entry = AuditEntry::new(AuditAction::VerificationUpdated, Actor::system());
        entry.verification_id = Some(verification_id);

        let old = json!({"city": "Lyon", "document_number": "AB1234567"});
        let new = json!({"city": "Paris", "document_number": "AB1234567"});
        trail
            .record_change(entry, Some(old), Some(new))
            .await
            .unwrap();

        let entries = trail.trail_for(verification_id).await.unwrap();
        assert_eq!(entries.len(), 1);
        let stored = &entries[0];
        assert_eq!(stored.changed_fields, vec!["city".to_string()]);
        assert!(stored.sensitive_data_accessed);
        assert_eq!(stored.new_values.as_ref().unwrap()["document_number"], "AB*****67");
        assert_eq!(stored.new_values.as_ref().unwrap()["city"], "Paris");
    }

    #[tokio::test]
    async fn record_without_snapshots_is_not_sensitive() {
        let trail = AuditTrail::new(Arc::new(InMemoryAuditStore::new()));
        let verification_id = VerificationId::new();
        let mut entry = AuditEntry::new(AuditAction::VerificationCreated, Actor::system());
        entry.verification_id = Some(verification_id);
        trail.record(entry).await.unwrap();

        let entries = trail.trail_for(verification_id).await.unwrap();
        assert!(!entries[0].sensitive_data_accessed);
        assert!(entries[0].changed_fields.is_empty());
    }

    #[test]
    fn changed_fields_covers_added_and_removed_keys() {
        let old = json!({"a": 1, "b": 2});
        let new = json!({"a": 1, "c": 3});
        assert_eq!(changed_fields(&old, &new), vec!["b".to_string(), "c".to_string()]);
    }
}
