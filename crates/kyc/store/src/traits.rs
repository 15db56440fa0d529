use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use kyc_types::{
    DocumentId, DocumentRecord, DocumentType, KycResult, MerchantId, RiskLevel,
    VerificationId, VerificationRecord, VerificationStatus,
};

/// Filter for verification listings (admin review queues, dashboards).
#[derive(Clone, Debug, Default)]
pub struct VerificationFilter {
    pub status: Option<VerificationStatus>,
    pub risk_level: Option<RiskLevel>,
    pub merchant_id: Option<MerchantId>,
    pub limit: usize,
    pub offset: usize,
}

impl VerificationFilter {
    pub fn by_status(status: VerificationStatus) -> Self {
        Self {
            status: Some(status),
            limit: 100,
            ..Default::default()
        }
    }
}

/// Write/read boundary for verification records.
#[async_trait]
pub trait VerificationStore: Send + Sync {
    async fn insert(&self, record: &VerificationRecord) -> KycResult<()>;

    async fn get(&self, id: VerificationId) -> KycResult<Option<VerificationRecord>>;

    /// Persist the current state of an existing record.
    async fn update(&self, record: &VerificationRecord) -> KycResult<()>;

    /// The record currently counting against the one-active-per-merchant rule.
    async fn find_active_for_merchant(
        &self,
        merchant_id: MerchantId,
    ) -> KycResult<Option<VerificationRecord>>;

    /// Most recently created record for a merchant, any status.
    async fn latest_for_merchant(
        &self,
        merchant_id: MerchantId,
    ) -> KycResult<Option<VerificationRecord>>;

    async fn list(&self, filter: &VerificationFilter) -> KycResult<Vec<VerificationRecord>>;

    /// Approved records whose validity window has lapsed.
    async fn list_approved_expiring(
        &self,
        cutoff: DateTime<Utc>,
    ) -> KycResult<Vec<VerificationRecord>>;
}

/// Write/read boundary for document records.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn insert(&self, record: &DocumentRecord) -> KycResult<()>;

    async fn get(&self, id: DocumentId) -> KycResult<Option<DocumentRecord>>;

    async fn update(&self, record: &DocumentRecord) -> KycResult<()>;

    /// Hard delete; callers enforce the uploaded/rejected precondition.
    async fn remove(&self, id: DocumentId) -> KycResult<()>;

    async fn list_for_verification(
        &self,
        verification_id: VerificationId,
    ) -> KycResult<Vec<DocumentRecord>>;

    async fn find_by_type(
        &self,
        verification_id: VerificationId,
        document_type: DocumentType,
    ) -> KycResult<Option<DocumentRecord>>;

    /// Verified documents whose embedded expiry date has passed.
    async fn list_verified_expired(&self, today: NaiveDate) -> KycResult<Vec<DocumentRecord>>;
}
