//! Merchant-facing verification lifecycle operations.

use chrono::{DateTime, Duration, Utc};
use kyc_audit::{Actor, AuditAction, AuditEntry, RequestContext};
use kyc_queue::{Job, JobPayload};
use kyc_store::VerificationFilter;
use kyc_types::{
    ActorId, DocumentStatus, DocumentSummary, KycError, KycResult, MerchantId,
    VerificationId, VerificationKind, VerificationRecord, VerificationStatus,
    VerificationSummary,
};
use tracing::{info, warn};

use crate::collaborators::Notification;
use crate::config::ApprovalPolicy;
use crate::PipelineContext;

/// Profile fields a merchant may set before submission. `None` leaves the
/// existing value untouched.
#[derive(Clone, Debug, Default)]
pub struct ProfileUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub date_of_birth: Option<chrono::NaiveDate>,
    pub nationality: Option<String>,
    pub phone_number: Option<String>,
    pub address_line1: Option<String>,
    pub address_line2: Option<String>,
    pub city: Option<String>,
    pub state_province: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
    pub business_name: Option<String>,
    pub business_registration_number: Option<String>,
    pub business_type: Option<String>,
    pub business_country: Option<String>,
    pub business_address: Option<String>,
}

impl ProfileUpdate {
    fn apply(&self, record: &mut VerificationRecord) {
        macro_rules! set {
            ($field:ident) => {
                if let Some(value) = &self.$field {
                    record.$field = Some(value.clone());
                }
            };
        }
        set!(first_name);
        set!(last_name);
        set!(nationality);
        set!(phone_number);
        set!(address_line1);
        set!(address_line2);
        set!(city);
        set!(state_province);
        set!(postal_code);
        set!(country);
        set!(business_name);
        set!(business_registration_number);
        set!(business_type);
        set!(business_country);
        set!(business_address);
        if let Some(dob) = self.date_of_birth {
            record.date_of_birth = Some(dob);
        }
        record.updated_at = Utc::now();
    }
}

/// A reviewer's decision on a record in processing or under review.
#[derive(Clone, Debug)]
pub enum ReviewDecision {
    Approve,
    Reject { reason: String },
    RequestResubmission { notes: String },
    Suspend { notes: String },
}

/// Sets the approval fields and validity window on a record.
pub(crate) fn apply_approval(
    record: &mut VerificationRecord,
    policy: &ApprovalPolicy,
    now: DateTime<Utc>,
) -> KycResult<()> {
    record.transition_to(VerificationStatus::Approved)?;
    record.approved_at = Some(now);
    record.processed_at = record.processed_at.or(Some(now));
    record.expires_at = Some(now + Duration::days(policy.validity_days));
    record.next_review_at = Some(now + Duration::days(policy.next_review_days));
    Ok(())
}

/// Synchronous verification operations: create, profile updates, submission,
/// review decisions, reads, and the approval-expiry sweep.
#[derive(Clone)]
pub struct VerificationManager {
    ctx: PipelineContext,
}

impl VerificationManager {
    pub fn new(ctx: PipelineContext) -> Self {
        Self { ctx }
    }

    /// Starts a new verification for a merchant.
    ///
    /// Rejected only when the merchant already has a record in processing;
    /// an approved merchant may start a re-verification. The check and the
    /// insert are not atomic, so two concurrent creates can both pass the
    /// check; a persistent store closes that window with a partial unique
    /// index on active records.
    pub async fn create(
        &self,
        merchant_id: MerchantId,
        kind: VerificationKind,
        actor: Actor,
        context: RequestContext,
    ) -> KycResult<VerificationRecord> {
        if let Some(active) = self
            .ctx
            .verifications
            .find_active_for_merchant(merchant_id)
            .await?
        {
            return Err(KycError::Conflict(format!(
                "verification {} is already processing for this merchant",
                active.id
            )));
        }

        let mut record = VerificationRecord::new(merchant_id, kind);
        record.transition_to(VerificationStatus::DocumentsPending)?;
        self.ctx.verifications.insert(&record).await?;

        let mut entry = self.entry(AuditAction::VerificationCreated, actor, &record);
        entry.context = context;
        self.ctx.audit.record(entry).await?;
        self.send(record.merchant_id, Notification::VerificationStarted)
            .await;

        info!(verification_id = %record.id, merchant_id = %merchant_id, kind = %kind, "Verification created");
        Ok(record)
    }

    /// Applies profile fields. Only allowed before submission.
    pub async fn update_profile(
        &self,
        id: VerificationId,
        update: &ProfileUpdate,
        actor: Actor,
        context: RequestContext,
    ) -> KycResult<VerificationRecord> {
        let mut record = self.get(id).await?;
        if !record.status.allows_document_changes() {
            return Err(KycError::State(format!(
                "verification {id} is {} and no longer accepts profile changes",
                record.status
            )));
        }

        let old = snapshot(&record)?;
        update.apply(&mut record);
        let new = snapshot(&record)?;
        self.ctx.verifications.update(&record).await?;

        let mut entry = self.entry(AuditAction::VerificationUpdated, actor, &record);
        entry.context = context;
        self.ctx.audit.record_change(entry, Some(old), Some(new)).await?;
        Ok(record)
    }

    /// Validates the required-document set and hands the record to the
    /// background pipeline.
    pub async fn submit(
        &self,
        id: VerificationId,
        actor: Actor,
        context: RequestContext,
    ) -> KycResult<VerificationRecord> {
        let mut record = self.get(id).await?;
        if !record.status.allows_document_changes() {
            return Err(KycError::State(format!(
                "verification {id} is {} and cannot be submitted",
                record.status
            )));
        }

        let documents = self.ctx.documents.list_for_verification(id).await?;
        let uploaded: Vec<_> = documents
            .iter()
            .filter(|d| d.status != DocumentStatus::Rejected)
            .map(|d| d.document_type)
            .collect();
        let missing: Vec<String> = record
            .kind
            .required_documents()
            .iter()
            .filter(|req| !req.is_satisfied_by(&uploaded))
            .map(|req| req.describe())
            .collect();
        if !missing.is_empty() {
            return Err(KycError::missing_documents(missing));
        }

        if record.status == VerificationStatus::DocumentsPending {
            record.transition_to(VerificationStatus::DocumentsUploaded)?;
        }
        record.transition_to(VerificationStatus::Processing)?;
        record.submitted_at = Some(Utc::now());
        self.ctx.verifications.update(&record).await?;

        let mut entry = self.entry(AuditAction::VerificationSubmitted, actor, &record);
        entry.context = context;
        self.ctx.audit.record(entry).await?;

        self.ctx
            .queue
            .enqueue(Job::new(JobPayload::ProcessVerification {
                verification_id: id,
            }))
            .await?;
        info!(verification_id = %id, "Verification submitted for processing");
        Ok(record)
    }

    /// Applies a reviewer decision to a record in processing or under review.
    pub async fn review(
        &self,
        id: VerificationId,
        reviewer: ActorId,
        decision: ReviewDecision,
        context: RequestContext,
    ) -> KycResult<VerificationRecord> {
        let mut record = self.get(id).await?;
        if !record.status.allows_review() {
            return Err(KycError::State(format!(
                "verification {id} is {} and is not reviewable",
                record.status
            )));
        }

        let old = snapshot(&record)?;
        let now = Utc::now();
        record.reviewer_id = Some(reviewer);
        let (action, notification) = match decision {
            ReviewDecision::Approve => {
                apply_approval(&mut record, &self.ctx.approval_policy, now)?;
                let expires_at = record.expires_at.unwrap_or(now);
                (
                    AuditAction::VerificationApproved,
                    Some(Notification::VerificationApproved { expires_at }),
                )
            }
            ReviewDecision::Reject { reason } => {
                record.transition_to(VerificationStatus::Rejected)?;
                record.rejected_at = Some(now);
                record.processed_at = record.processed_at.or(Some(now));
                record.rejection_reason = Some(reason.clone());
                (
                    AuditAction::VerificationRejected,
                    Some(Notification::VerificationRejected { reason }),
                )
            }
            ReviewDecision::RequestResubmission { notes } => {
                record.transition_to(VerificationStatus::ResubmissionRequested)?;
                record.review_notes = Some(notes.clone());
                (
                    AuditAction::ResubmissionRequested,
                    Some(Notification::ResubmissionRequested { notes }),
                )
            }
            ReviewDecision::Suspend { notes } => {
                record.transition_to(VerificationStatus::Suspended)?;
                record.review_notes = Some(notes);
                (AuditAction::VerificationSuspended, None)
            }
        };
        let new = snapshot(&record)?;
        self.ctx.verifications.update(&record).await?;

        let mut entry = self.entry(action, Actor::reviewer(reviewer), &record);
        entry.context = context;
        self.ctx.audit.record_change(entry, Some(old), Some(new)).await?;

        if let Some(notification) = notification {
            self.send(record.merchant_id, notification).await;
        }
        info!(verification_id = %id, status = %record.status, "Review decision applied");
        Ok(record)
    }

    pub async fn get(&self, id: VerificationId) -> KycResult<VerificationRecord> {
        self.ctx
            .verifications
            .get(id)
            .await?
            .ok_or_else(|| KycError::NotFound(format!("verification {id}")))
    }

    /// Latest verification plus its documents, as the merchant dashboard
    /// sees them.
    pub async fn status_for_merchant(
        &self,
        merchant_id: MerchantId,
    ) -> KycResult<Option<(VerificationSummary, Vec<DocumentSummary>)>> {
        let Some(record) = self.ctx.verifications.latest_for_merchant(merchant_id).await? else {
            return Ok(None);
        };
        let documents = self
            .ctx
            .documents
            .list_for_verification(record.id)
            .await?
            .iter()
            .map(|d| d.summary())
            .collect();
        Ok(Some((record.summary(), documents)))
    }

    pub async fn list(&self, filter: &VerificationFilter) -> KycResult<Vec<VerificationSummary>> {
        Ok(self
            .ctx
            .verifications
            .list(filter)
            .await?
            .iter()
            .map(|r| r.summary())
            .collect())
    }

    /// Expires approved records past their validity window. Returns the count.
    pub async fn expire_lapsed(&self, now: DateTime<Utc>) -> KycResult<usize> {
        let lapsed = self.ctx.verifications.list_approved_expiring(now).await?;
        let mut expired = 0;
        for mut record in lapsed {
            record.transition_to(VerificationStatus::Expired)?;
            self.ctx.verifications.update(&record).await?;
            self.ctx
                .audit
                .record(self.entry(AuditAction::VerificationExpired, Actor::system(), &record))
                .await?;
            self.send(record.merchant_id, Notification::VerificationExpired)
                .await;
            expired += 1;
        }
        if expired > 0 {
            info!(expired, "Expired lapsed approvals");
        }
        Ok(expired)
    }

    fn entry(&self, action: AuditAction, actor: Actor, record: &VerificationRecord) -> AuditEntry {
        let mut entry = AuditEntry::new(action, actor);
        entry.verification_id = Some(record.id);
        entry.merchant_id = Some(record.merchant_id);
        entry
    }

    async fn send(&self, merchant_id: MerchantId, notification: Notification) {
        if let Err(err) = self.ctx.notifier.notify(merchant_id, notification).await {
            warn!(merchant_id = %merchant_id, error = %err, "Notification delivery failed");
        }
    }
}

fn snapshot(record: &VerificationRecord) -> KycResult<serde_json::Value> {
    serde_json::to_value(record).map_err(|e| KycError::System(format!("snapshot failed: {e}")))
}
