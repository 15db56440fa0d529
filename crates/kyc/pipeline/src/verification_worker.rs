//! The full background run for one submitted verification: identity and
//! business checks, sanctions screening, risk assessment, then the decision.

use chrono::Utc;
use kyc_audit::{Actor, AuditAction, AuditEntry};
use kyc_providers::{
    BusinessVerificationRequest, IdentityVerificationRequest, ProviderOutcome, SanctionsQuery,
};
use kyc_types::{
    DocumentRecord, DocumentType, KycError, KycResult, RiskLevel, VerificationId,
    VerificationRecord, VerificationStatus,
};
use serde_json::json;
use tracing::{error, info, warn};

use crate::collaborators::Notification;
use crate::verifications::apply_approval;
use crate::PipelineContext;

const CODE_SANCTIONS_MATCH: &str = "SANCTIONS_MATCH";
const CODE_PROCESSING_ERROR: &str = "PROCESSING_ERROR";

#[derive(Clone)]
pub struct VerificationWorker {
    ctx: PipelineContext,
}

impl VerificationWorker {
    pub fn new(ctx: PipelineContext) -> Self {
        Self { ctx }
    }

    /// Runs every stage for a record in `Processing`.
    ///
    /// Fails closed: any internal error rejects the record with
    /// `PROCESSING_ERROR` and an audit entry before the error is re-raised
    /// for the queue's retry accounting. A retry then finds the record out
    /// of `Processing` and skips it, so the run is idempotent per submission.
    pub async fn process(&self, verification_id: VerificationId) -> KycResult<()> {
        let Some(record) = self.ctx.verifications.get(verification_id).await? else {
            warn!(verification_id = %verification_id, "Verification vanished before processing");
            return Ok(());
        };
        if record.status != VerificationStatus::Processing {
            warn!(
                verification_id = %verification_id,
                status = %record.status,
                "Skipping verification not in processing"
            );
            return Ok(());
        }

        match self.run(record).await {
            Ok(()) => Ok(()),
            Err(err) => {
                error!(verification_id = %verification_id, error = %err, "Verification run failed");
                self.fail_processing(verification_id, &err).await;
                Err(err)
            }
        }
    }

    async fn run(&self, mut record: VerificationRecord) -> KycResult<()> {
        let now = Utc::now();
        // Every document counts for scoring, rejected ones included, so an
        // inauthentic scan still surfaces as a risk factor.
        let documents: Vec<DocumentRecord> =
            self.ctx.documents.list_for_verification(record.id).await?;

        // Stage 1: identity.
        let identity = if record.kind.needs_identity_check() {
            Some(self.identity_check(&record, &documents).await?)
        } else {
            None
        };

        // Stage 2: business registry.
        let business = if record.kind.needs_business_check() {
            Some(self.business_check(&record, &documents).await?)
        } else {
            None
        };

        // Stage 3: sanctions screening across every configured list.
        let sanctions = self.sanctions_check(&mut record).await?;

        // Stage 4: risk assessment over everything gathered so far.
        let assessment =
            self.ctx
                .risk
                .assess(&record, &documents, business.as_ref(), Some(&sanctions), now);
        record.risk_level = Some(assessment.risk_level);
        record.risk_score = Some(assessment.risk_score);
        let mut entry = self.entry(AuditAction::RiskAssessed, &record);
        entry.details = serde_json::to_value(&assessment)
            .map(Some)
            .map_err(|e| KycError::System(format!("assessment snapshot failed: {e}")))?;
        self.ctx.audit.record(entry).await?;

        record.provider_response = Some(json!({
            "identity": &identity,
            "business": &business,
            "sanctions": &sanctions,
            "risk_score": assessment.risk_score,
        }));
        record.processed_at = Some(now);

        // Stage 5: decision. Identity and business outcomes influence the
        // result only through the risk assessment.
        if !sanctions.success {
            return self
                .reject(record, "sanctions screening failed", CODE_SANCTIONS_MATCH)
                .await;
        }
        if assessment.requires_manual_review {
            let note = format!(
                "risk {} (score {:.0}), manual review required",
                assessment.risk_level, assessment.risk_score
            );
            return self.park(record, &note).await;
        }
        if assessment.risk_level == RiskLevel::Low {
            return self.approve(record).await;
        }
        let note = format!(
            "risk {} (score {:.0}), routed to manual review",
            assessment.risk_level, assessment.risk_score
        );
        self.park(record, &note).await
    }

    async fn identity_check(
        &self,
        record: &VerificationRecord,
        documents: &[DocumentRecord],
    ) -> KycResult<ProviderOutcome> {
        let identity_doc = documents
            .iter()
            .find(|d| d.document_type.is_identity_document())
            .ok_or_else(|| KycError::State("no identity document available".into()))?;
        let selfie = documents
            .iter()
            .find(|d| d.document_type == DocumentType::Selfie);
        let request = IdentityVerificationRequest {
            first_name: record.first_name.clone(),
            last_name: record.last_name.clone(),
            date_of_birth: record.date_of_birth,
            nationality: record.nationality.clone(),
            document_type: identity_doc.document_type,
            document_number: identity_doc.document_number.clone(),
            document_path: identity_doc.file_path.clone(),
            selfie_path: selfie.map(|d| d.file_path.clone()),
        };
        Ok(self.ctx.gateway.verify_identity(&request).await)
    }

    async fn business_check(
        &self,
        record: &VerificationRecord,
        documents: &[DocumentRecord],
    ) -> KycResult<ProviderOutcome> {
        let business_doc = documents
            .iter()
            .find(|d| d.document_type.is_business_document())
            .ok_or_else(|| KycError::State("no business document available".into()))?;
        let request = BusinessVerificationRequest {
            business_name: record.business_name.clone(),
            registration_number: record.business_registration_number.clone(),
            business_type: record.business_type.clone(),
            country: record.business_country.clone(),
            address: record.business_address.clone(),
            document_path: business_doc.file_path.clone(),
        };
        Ok(self.ctx.gateway.verify_business(&request).await)
    }

    /// Screens the applicant (or, for business-only records, the company
    /// name) and writes the result onto the record. A screening-infrastructure
    /// failure comes back as a non-clear outcome, so the decision stage
    /// rejects it the same way it rejects a match.
    async fn sanctions_check(
        &self,
        record: &mut VerificationRecord,
    ) -> KycResult<ProviderOutcome> {
        let subject = record
            .full_name()
            .or_else(|| record.business_name.clone())
            .ok_or_else(|| KycError::State("no subject name for sanctions screening".into()))?;
        let query = SanctionsQuery {
            full_name: subject,
            date_of_birth: record.date_of_birth,
            nationality: record.nationality.clone(),
        };
        let outcome = self.ctx.gateway.check_sanctions(&query).await;
        record.sanctions_checked = true;
        record.sanctions_clear = Some(outcome.success);
        record.sanctions_details = Some(outcome.details.clone());
        let mut entry = self.entry(AuditAction::SanctionsScreened, record);
        entry.details = Some(json!({
            "status": outcome.status,
            "confidence": outcome.confidence,
            "reference": outcome.provider_reference,
        }));
        self.ctx.audit.record(entry).await?;
        Ok(outcome)
    }

    async fn approve(&self, mut record: VerificationRecord) -> KycResult<()> {
        apply_approval(&mut record, &self.ctx.approval_policy, Utc::now())?;
        self.ctx.verifications.update(&record).await?;
        self.ctx
            .audit
            .record(self.entry(AuditAction::VerificationApproved, &record))
            .await?;
        if let Some(expires_at) = record.expires_at {
            self.send(&record, Notification::VerificationApproved { expires_at })
                .await;
        }
        info!(verification_id = %record.id, "Verification auto-approved");
        Ok(())
    }

    async fn reject(
        &self,
        mut record: VerificationRecord,
        reason: &str,
        code: &str,
    ) -> KycResult<()> {
        record.transition_to(VerificationStatus::Rejected)?;
        record.rejected_at = Some(Utc::now());
        record.rejection_reason = Some(reason.to_string());
        record.rejection_code = Some(code.to_string());
        self.ctx.verifications.update(&record).await?;
        self.ctx
            .audit
            .record(self.entry(AuditAction::VerificationRejected, &record))
            .await?;
        self.send(
            &record,
            Notification::VerificationRejected {
                reason: reason.to_string(),
            },
        )
        .await;
        info!(verification_id = %record.id, code, "Verification rejected");
        Ok(())
    }

    async fn park(&self, mut record: VerificationRecord, note: &str) -> KycResult<()> {
        record.transition_to(VerificationStatus::UnderReview)?;
        record.review_notes = Some(note.to_string());
        self.ctx.verifications.update(&record).await?;
        let mut entry = self.entry(AuditAction::ComplianceFlagRaised, &record);
        entry.details = Some(json!({ "note": note }));
        self.ctx.audit.record(entry).await?;
        self.send(&record, Notification::VerificationUnderReview).await;
        info!(verification_id = %record.id, note, "Verification routed to manual review");
        Ok(())
    }

    /// Best-effort fail-closed rejection used when the run itself errored.
    async fn fail_processing(&self, verification_id: VerificationId, err: &KycError) {
        let Ok(Some(mut record)) = self.ctx.verifications.get(verification_id).await else {
            return;
        };
        if record.status != VerificationStatus::Processing {
            return;
        }
        if record.transition_to(VerificationStatus::Rejected).is_ok() {
            record.rejected_at = Some(Utc::now());
            record.rejection_reason = Some("processing failed due to a system error".to_string());
            record.rejection_code = Some(CODE_PROCESSING_ERROR.to_string());
            if let Err(update_err) = self.ctx.verifications.update(&record).await {
                error!(
                    verification_id = %verification_id,
                    error = %update_err,
                    "Failed to record the processing failure"
                );
                return;
            }
            let mut entry = self.entry(AuditAction::VerificationRejected, &record);
            entry.details = Some(json!({ "error": err.to_string() }));
            if let Err(audit_err) = self.ctx.audit.record(entry).await {
                error!(
                    verification_id = %verification_id,
                    error = %audit_err,
                    "Failed to audit the processing failure"
                );
            }
        }
    }

    fn entry(&self, action: AuditAction, record: &VerificationRecord) -> AuditEntry {
        let mut entry = AuditEntry::new(action, Actor::system());
        entry.verification_id = Some(record.id);
        entry.merchant_id = Some(record.merchant_id);
        entry
    }

    async fn send(&self, record: &VerificationRecord, notification: Notification) {
        if let Err(err) = self
            .ctx
            .notifier
            .notify(record.merchant_id, notification)
            .await
        {
            warn!(merchant_id = %record.merchant_id, error = %err, "Notification delivery failed");
        }
    }
}
