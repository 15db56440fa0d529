use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use kyc_types::{
    DocumentId, DocumentRecord, DocumentStatus, DocumentType, KycError, KycResult, MerchantId,
    VerificationId, VerificationRecord, VerificationStatus,
};

use crate::traits::{DocumentStore, VerificationFilter, VerificationStore};

/// In-memory verification store used for tests, local demos, and embedding.
#[derive(Default)]
pub struct InMemoryVerificationStore {
    inner: RwLock<VerificationState>,
}

#[derive(Default)]
struct VerificationState {
    records: HashMap<VerificationId, VerificationRecord>,
    by_merchant: HashMap<MerchantId, Vec<VerificationId>>,
}

impl InMemoryVerificationStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> KycResult<std::sync::RwLockReadGuard<'_, VerificationState>> {
        self.inner
            .read()
            .map_err(|_| KycError::System("verification store lock poisoned".into()))
    }

    fn write(&self) -> KycResult<std::sync::RwLockWriteGuard<'_, VerificationState>> {
        self.inner
            .write()
            .map_err(|_| KycError::System("verification store lock poisoned".into()))
    }
}

#[async_trait]
impl VerificationStore for InMemoryVerificationStore {
    async fn insert(&self, record: &VerificationRecord) -> KycResult<()> {
        let mut state = self.write()?;
        if state.records.contains_key(&record.id) {
            return Err(KycError::Conflict(format!(
                "verification {} already exists",
                record.id
            )));
        }
        state
            .by_merchant
            .entry(record.merchant_id)
            .or_default()
            .push(record.id);
        state.records.insert(record.id, record.clone());
        Ok(())
    }

    async fn get(&self, id: VerificationId) -> KycResult<Option<VerificationRecord>> {
        Ok(self.read()?.records.get(&id).cloned())
    }

    async fn update(&self, record: &VerificationRecord) -> KycResult<()> {
        let mut state = self.write()?;
        match state.records.get_mut(&record.id) {
            Some(existing) => {
                *existing = record.clone();
                Ok(())
            }
            None => Err(KycError::NotFound(format!(
                "verification {} not found",
                record.id
            ))),
        }
    }

    async fn find_active_for_merchant(
        &self,
        merchant_id: MerchantId,
    ) -> KycResult<Option<VerificationRecord>> {
        let state = self.read()?;
        let ids = state.by_merchant.get(&merchant_id);
        Ok(ids.and_then(|ids| {
            ids.iter()
                .filter_map(|id| state.records.get(id))
                .find(|r| r.status.is_active_processing())
                .cloned()
        }))
    }

    async fn latest_for_merchant(
        &self,
        merchant_id: MerchantId,
    ) -> KycResult<Option<VerificationRecord>> {
        let state = self.read()?;
        let ids = state.by_merchant.get(&merchant_id);
        Ok(ids.and_then(|ids| {
            ids.iter()
                .filter_map(|id| state.records.get(id))
                .max_by_key(|r| r.created_at)
                .cloned()
        }))
    }

    async fn list(&self, filter: &VerificationFilter) -> KycResult<Vec<VerificationRecord>> {
        let state = self.read()?;
        let mut records: Vec<VerificationRecord> = state
            .records
            .values()
            .filter(|r| filter.status.map_or(true, |s| r.status == s))
            .filter(|r| filter.risk_level.map_or(true, |l| r.risk_level == Some(l)))
            .filter(|r| filter.merchant_id.map_or(true, |m| r.merchant_id == m))
            .cloned()
            .collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let limit = if filter.limit == 0 { usize::MAX } else { filter.limit };
        Ok(records.into_iter().skip(filter.offset).take(limit).collect())
    }

    async fn list_approved_expiring(
        &self,
        cutoff: DateTime<Utc>,
    ) -> KycResult<Vec<VerificationRecord>> {
        let state = self.read()?;
        Ok(state
            .records
            .values()
            .filter(|r| r.status == VerificationStatus::Approved)
            .filter(|r| r.expires_at.is_some_and(|at| at <= cutoff))
            .cloned()
            .collect())
    }
}

/// In-memory document store, indexed by owning verification.
#[derive(Default)]
pub struct InMemoryDocumentStore {
    inner: RwLock<DocumentState>,
}

#[derive(Default)]
struct DocumentState {
    records: HashMap<DocumentId, DocumentRecord>,
    by_verification: HashMap<VerificationId, Vec<DocumentId>>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> KycResult<std::sync::RwLockReadGuard<'_, DocumentState>> {
        self.inner
            .read()
            .map_err(|_| KycError::System("document store lock poisoned".into()))
    }

    fn write(&self) -> KycResult<std::sync::RwLockWriteGuard<'_, DocumentState>> {
        self.inner
            .write()
            .map_err(|_| KycError::System("document store lock poisoned".into()))
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn insert(&self, record: &DocumentRecord) -> KycResult<()> {
        let mut state = self.write()?;
        if state.records.contains_key(&record.id) {
            return Err(KycError::Conflict(format!(
                "document {} already exists",
                record.id
            )));
        }
        state
            .by_verification
            .entry(record.verification_id)
            .or_default()
            .push(record.id);
        state.records.insert(record.id, record.clone());
        Ok(())
    }

    async fn get(&self, id: DocumentId) -> KycResult<Option<DocumentRecord>> {
        Ok(self.read()?.records.get(&id).cloned())
    }

    async fn update(&self, record: &DocumentRecord) -> KycResult<()> {
        let mut state = self.write()?;
        match state.records.get_mut(&record.id) {
            Some(existing) => {
                *existing = record.clone();
                Ok(())
            }
            None => Err(KycError::NotFound(format!(
                "document {} not found",
                record.id
            ))),
        }
    }

    async fn remove(&self, id: DocumentId) -> KycResult<()> {
        let mut state = self.write()?;
        let record = state
            .records
            .remove(&id)
            .ok_or_else(|| KycError::NotFound(format!("document {id} not found")))?;
        if let Some(ids) = state.by_verification.get_mut(&record.verification_id) {
            ids.retain(|doc_id| *doc_id != id);
        }
        Ok(())
    }

    async fn list_for_verification(
        &self,
        verification_id: VerificationId,
    ) -> KycResult<Vec<DocumentRecord>> {
        let state = self.read()?;
        let mut records: Vec<DocumentRecord> = state
            .by_verification
            .get(&verification_id)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| state.records.get(id))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        records.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(records)
    }

    async fn find_by_type(
        &self,
        verification_id: VerificationId,
        document_type: DocumentType,
    ) -> KycResult<Option<DocumentRecord>> {
        let state = self.read()?;
        Ok(state
            .by_verification
            .get(&verification_id)
            .and_then(|ids| {
                ids.iter()
                    .filter_map(|id| state.records.get(id))
                    .find(|r| r.document_type == document_type)
            })
            .cloned())
    }

    async fn list_verified_expired(&self, today: NaiveDate) -> KycResult<Vec<DocumentRecord>> {
        let state = self.read()?;
        Ok(state
            .records
            .values()
            .filter(|r| r.status == DocumentStatus::Verified)
            .filter(|r| r.expiry_date.is_some_and(|d| d <= today))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kyc_types::VerificationKind;

    fn record(merchant: MerchantId) -> VerificationRecord {
        VerificationRecord::new(merchant, VerificationKind::Individual)
    }

    #[tokio::test]
    async fn insert_then_get_round_trips() {
        let store = InMemoryVerificationStore::new();
        let rec = record(MerchantId::new());
        store.insert(&rec).await.unwrap();
        let loaded = store.get(rec.id).await.unwrap().unwrap();
        assert_eq!(loaded.id, rec.id);
        assert_eq!(loaded.status, VerificationStatus::NotStarted);
    }

    #[tokio::test]
    async fn duplicate_insert_conflicts() {
        let store = InMemoryVerificationStore::new();
        let rec = record(MerchantId::new());
        store.insert(&rec).await.unwrap();
        assert!(matches!(
            store.insert(&rec).await,
            Err(KycError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn active_lookup_only_sees_processing() {
        let store = InMemoryVerificationStore::new();
        let merchant = MerchantId::new();

        let mut first = record(merchant);
        first.status = VerificationStatus::Rejected;
        store.insert(&first).await.unwrap();

        assert!(store
            .find_active_for_merchant(merchant)
            .await
            .unwrap()
            .is_none());

        let mut second = record(merchant);
        second.status = VerificationStatus::Processing;
        store.insert(&second).await.unwrap();

        let active = store
            .find_active_for_merchant(merchant)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(active.id, second.id);
    }

    #[tokio::test]
    async fn update_of_unknown_record_is_not_found() {
        let store = InMemoryVerificationStore::new();
        let rec = record(MerchantId::new());
        assert!(matches!(
            store.update(&rec).await,
            Err(KycError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn document_type_lookup_is_scoped_by_verification() {
        let store = InMemoryDocumentStore::new();
        let vid_a = VerificationId::new();
        let vid_b = VerificationId::new();
        let doc = DocumentRecord::new(
            vid_a,
            DocumentType::Passport,
            "p.jpg",
            "kyc-documents/a/p.jpg",
            100_000,
            "image/jpeg",
            "hash",
        );
        store.insert(&doc).await.unwrap();

        assert!(store
            .find_by_type(vid_a, DocumentType::Passport)
            .await
            .unwrap()
            .is_some());
        assert!(store
            .find_by_type(vid_b, DocumentType::Passport)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn remove_drops_the_index_entry() {
        let store = InMemoryDocumentStore::new();
        let vid = VerificationId::new();
        let doc = DocumentRecord::new(
            vid,
            DocumentType::ProofOfAddress,
            "bill.pdf",
            "kyc-documents/a/bill.pdf",
            80_000,
            "application/pdf",
            "hash",
        );
        store.insert(&doc).await.unwrap();
        store.remove(doc.id).await.unwrap();
        assert!(store.get(doc.id).await.unwrap().is_none());
        assert!(store.list_for_verification(vid).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn verified_expired_sweep_honors_status_and_date() {
        let store = InMemoryDocumentStore::new();
        let vid = VerificationId::new();

        let mut expired = DocumentRecord::new(
            vid,
            DocumentType::Passport,
            "p.jpg",
            "kyc-documents/a/p.jpg",
            100_000,
            "image/jpeg",
            "hash1",
        );
        expired.status = DocumentStatus::Verified;
        expired.expiry_date = NaiveDate::from_ymd_opt(2020, 1, 1);
        store.insert(&expired).await.unwrap();

        let mut current = DocumentRecord::new(
            vid,
            DocumentType::ProofOfAddress,
            "b.pdf",
            "kyc-documents/a/b.pdf",
            90_000,
            "application/pdf",
            "hash2",
        );
        current.status = DocumentStatus::Verified;
        current.expiry_date = NaiveDate::from_ymd_opt(2999, 1, 1);
        store.insert(&current).await.unwrap();

        let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let found = store.list_verified_expired(today).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, expired.id);
    }
}
