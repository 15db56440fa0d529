//! Persistence seam for audit entries.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use kyc_types::{ActorId, KycError, KycResult, MerchantId, VerificationId};

use crate::entry::{AuditAction, AuditEntry};

/// Filter for audit queries. Unset fields match everything.
#[derive(Clone, Debug, Default)]
pub struct AuditQuery {
    pub verification_id: Option<VerificationId>,
    pub merchant_id: Option<MerchantId>,
    pub actor_id: Option<ActorId>,
    pub action: Option<AuditAction>,
    pub compliance_only: bool,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
    /// 0 means unlimited.
    pub limit: usize,
}

impl AuditQuery {
    pub fn for_verification(verification_id: VerificationId) -> Self {
        Self {
            verification_id: Some(verification_id),
            ..Self::default()
        }
    }
}

/// Append-only storage for audit entries. Entries are never updated.
#[async_trait]
pub trait AuditStore: Send + Sync {
    async fn append(&self, entry: AuditEntry) -> KycResult<()>;
    /// Returns matching entries, most recent first.
    async fn query(&self, query: &AuditQuery) -> KycResult<Vec<AuditEntry>>;
    /// Deletes entries whose retention deadline has passed. Returns the count.
    async fn purge_expired(&self, now: DateTime<Utc>) -> KycResult<usize>;
}

/// In-memory audit store used for tests, local demos, and embedding.
#[derive(Default)]
pub struct InMemoryAuditStore {
    inner: RwLock<AuditState>,
}

#[derive(Default)]
struct AuditState {
    entries: Vec<AuditEntry>,
    by_verification: HashMap<VerificationId, Vec<usize>>,
}

impl InMemoryAuditStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> KycResult<std::sync::RwLockReadGuard<'_, AuditState>> {
        self.inner
            .read()
            .map_err(|_| KycError::System("audit store lock poisoned".into()))
    }

    fn write(&self) -> KycResult<std::sync::RwLockWriteGuard<'_, AuditState>> {
        self.inner
            .write()
            .map_err(|_| KycError::System("audit store lock poisoned".into()))
    }
}

#[async_trait]
impl AuditStore for InMemoryAuditStore {
    async fn append(&self, entry: AuditEntry) -> KycResult<()> {
        let mut state = self.write()?;
        let index = state.entries.len();
        if let Some(verification_id) = entry.verification_id {
            state
                .by_verification
                .entry(verification_id)
                .or_default()
                .push(index);
        }
        state.entries.push(entry);
        Ok(())
    }

    async fn query(&self, query: &AuditQuery) -> KycResult<Vec<AuditEntry>> {
        let state = self.read()?;
        let candidates: Vec<&AuditEntry> = match query.verification_id {
            Some(id) => state
                .by_verification
                .get(&id)
                .map(|indexes| indexes.iter().map(|&i| &state.entries[i]).collect())
                .unwrap_or_default(),
            None => state.entries.iter().collect(),
        };
        let mut matches: Vec<AuditEntry> = candidates
            .into_iter()
            .filter(|e| query.merchant_id.map_or(true, |id| e.merchant_id == Some(id)))
            .filter(|e| query.actor_id.map_or(true, |id| e.actor.id == Some(id)))
            .filter(|e| query.action.map_or(true, |a| e.action == a))
            .filter(|e| !query.compliance_only || e.compliance_relevant)
            .filter(|e| query.since.map_or(true, |t| e.created_at >= t))
            .filter(|e| query.until.map_or(true, |t| e.created_at <= t))
            .cloned()
            .collect();
        matches.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        if query.limit > 0 {
            matches.truncate(query.limit);
        }
        Ok(matches)
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> KycResult<usize> {
        let mut state = self.write()?;
        let before = state.entries.len();
        state.entries.retain(|e| e.retention_until > now);
        // Rebuild the index after compaction.
        let mut by_verification: HashMap<VerificationId, Vec<usize>> = HashMap::new();
        for (index, entry) in state.entries.iter().enumerate() {
            if let Some(verification_id) = entry.verification_id {
                by_verification.entry(verification_id).or_default().push(index);
            }
        }
        state.by_verification = by_verification;
        Ok(before - state.entries.len())
    }
}
