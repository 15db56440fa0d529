//! Background document stages: quality assessment and extraction, then
//! authenticity verification, plus the expiry sweep.

use chrono::{NaiveDate, Utc};
use kyc_audit::{Actor, AuditAction, AuditEntry};
use kyc_providers::DocumentCheckRequest;
use kyc_queue::{Job, JobPayload};
use kyc_types::{DocumentId, DocumentQuality, DocumentRecord, DocumentStatus, KycResult};
use tracing::{info, warn};

use crate::collaborators::Notification;
use crate::PipelineContext;

/// Rejection codes stamped on documents that fail a stage.
const CODE_QUALITY_POOR: &str = "QUALITY_POOR";
const CODE_PROCESSING_ERROR: &str = "PROCESSING_ERROR";
const CODE_VERIFICATION_ERROR: &str = "VERIFICATION_ERROR";
const CODE_NO_EXTRACTED_DATA: &str = "NO_EXTRACTED_DATA";
const CODE_LOW_OCR_CONFIDENCE: &str = "LOW_OCR_CONFIDENCE";

/// OCR confidence below this blocks the authenticity stage.
const OCR_CONFIDENCE_FLOOR: f64 = 70.0;

#[derive(Clone)]
pub struct DocumentWorker {
    ctx: PipelineContext,
}

impl DocumentWorker {
    pub fn new(ctx: PipelineContext) -> Self {
        Self { ctx }
    }

    /// Quality assessment and data extraction for one uploaded document.
    ///
    /// Poor quality and analyzer failures are terminal for the document:
    /// the record is rejected and no retry happens. Anything else advances
    /// to `Processed` and queues the authenticity check.
    pub async fn process(&self, document_id: DocumentId) -> KycResult<()> {
        let Some(mut document) = self.ctx.documents.get(document_id).await? else {
            warn!(document_id = %document_id, "Document vanished before processing");
            return Ok(());
        };
        if document.status != DocumentStatus::Uploaded {
            warn!(document_id = %document_id, status = %document.status, "Skipping non-uploaded document");
            return Ok(());
        }

        document.status = DocumentStatus::Processing;
        document.updated_at = Utc::now();
        self.ctx.documents.update(&document).await?;

        let bytes = match self.ctx.storage.get(&document.file_path).await? {
            Some(bytes) => bytes,
            None => {
                return self
                    .reject(document, "stored file is missing", CODE_PROCESSING_ERROR)
                    .await;
            }
        };
        let analysis = match self.ctx.analyzer.analyze(&document, &bytes).await {
            Ok(analysis) => analysis,
            Err(err) => {
                warn!(document_id = %document_id, error = %err, "Document analysis failed");
                return self
                    .reject(
                        document,
                        format!("document analysis failed: {err}"),
                        CODE_PROCESSING_ERROR,
                    )
                    .await;
            }
        };

        document.quality_score = Some(analysis.quality_score);
        document.quality_rating = Some(DocumentQuality::from_score(analysis.quality_score));
        document.quality_issues = analysis.quality_issues;
        if document.quality_rating == Some(DocumentQuality::Poor) {
            return self
                .reject(document, "scan quality too poor to process", CODE_QUALITY_POOR)
                .await;
        }

        document.ocr_text = analysis.ocr_text;
        document.ocr_confidence = analysis.ocr_confidence;
        document.extracted_data = analysis.extracted_data;
        document.document_number = analysis.document_number;
        document.issue_date = analysis.issue_date;
        document.expiry_date = analysis.expiry_date;
        document.issuing_authority = analysis.issuing_authority;
        document.issuing_country = analysis.issuing_country;
        if let Some(expiry) = document.expiry_date {
            document.is_expired = expiry < Utc::now().date_naive();
        }
        document.status = DocumentStatus::Processed;
        document.processed_at = Some(Utc::now());
        document.updated_at = Utc::now();
        self.ctx.documents.update(&document).await?;

        self.audit(AuditAction::DocumentProcessed, &document).await?;
        self.ctx
            .queue
            .enqueue(Job::new(JobPayload::VerifyDocument { document_id }))
            .await?;
        info!(document_id = %document_id, quality = analysis.quality_score, "Document processed");
        Ok(())
    }

    /// Authenticity verification for one processed document.
    pub async fn verify(&self, document_id: DocumentId) -> KycResult<()> {
        let Some(mut document) = self.ctx.documents.get(document_id).await? else {
            warn!(document_id = %document_id, "Document vanished before verification");
            return Ok(());
        };
        if document.status != DocumentStatus::Processed {
            warn!(document_id = %document_id, status = %document.status, "Skipping non-processed document");
            return Ok(());
        }

        let Some(extracted) = document.extracted_data.clone() else {
            return self
                .reject(document, "no data could be extracted", CODE_NO_EXTRACTED_DATA)
                .await;
        };
        if document
            .ocr_confidence
            .map_or(true, |c| c < OCR_CONFIDENCE_FLOOR)
        {
            return self
                .reject(
                    document,
                    "text extraction confidence too low to trust",
                    CODE_LOW_OCR_CONFIDENCE,
                )
                .await;
        }

        let request = DocumentCheckRequest {
            document_type: document.document_type,
            document_number: document.document_number.clone(),
            document_path: document.file_path.clone(),
            extracted_data: extracted,
        };
        let outcome = self.ctx.gateway.check_document(&request).await;
        document.verification_provider = Some(outcome.provider.clone());
        document.verification_reference = Some(outcome.reference.clone());
        document.verification_result = Some(outcome.details.clone());

        if outcome.authentic {
            document.is_authentic = Some(true);
            document.status = DocumentStatus::Verified;
            document.verified_at = Some(Utc::now());
            document.updated_at = Utc::now();
            self.ctx.documents.update(&document).await?;
            self.audit(AuditAction::DocumentVerified, &document).await?;
            info!(document_id = %document_id, "Document verified");
            Ok(())
        } else {
            document.is_authentic = Some(false);
            let reason = outcome
                .rejection_reason
                .unwrap_or_else(|| "document could not be verified".to_string());
            let code = outcome
                .rejection_code
                .unwrap_or_else(|| CODE_VERIFICATION_ERROR.to_string());
            self.reject(document, reason, code).await
        }
    }

    /// Expires verified documents whose embedded expiry date has passed.
    /// Returns the count.
    pub async fn check_expiry(&self, today: NaiveDate) -> KycResult<usize> {
        let expired_docs = self.ctx.documents.list_verified_expired(today).await?;
        let mut expired = 0;
        for mut document in expired_docs {
            document.status = DocumentStatus::Expired;
            document.is_expired = true;
            document.updated_at = Utc::now();
            self.ctx.documents.update(&document).await?;
            self.audit(AuditAction::DocumentExpired, &document).await?;
            expired += 1;
        }
        if expired > 0 {
            info!(expired, "Expired verified documents past their expiry date");
        }
        Ok(expired)
    }

    async fn reject(
        &self,
        mut document: DocumentRecord,
        reason: impl Into<String>,
        code: impl Into<String>,
    ) -> KycResult<()> {
        let reason = reason.into();
        document.reject(reason.clone(), code);
        self.ctx.documents.update(&document).await?;
        self.audit(AuditAction::DocumentRejected, &document).await?;

        if let Some(verification) = self.ctx.verifications.get(document.verification_id).await? {
            if let Err(err) = self
                .ctx
                .notifier
                .notify(
                    verification.merchant_id,
                    Notification::DocumentRejected {
                        document_type: document.document_type,
                        reason: reason.clone(),
                    },
                )
                .await
            {
                warn!(merchant_id = %verification.merchant_id, error = %err, "Notification delivery failed");
            }
        }
        info!(
            document_id = %document.id,
            code = document.rejection_code.as_deref().unwrap_or(""),
            "Document rejected"
        );
        Ok(())
    }

    async fn audit(&self, action: AuditAction, document: &DocumentRecord) -> KycResult<()> {
        let mut entry = AuditEntry::new(action, Actor::system());
        entry.verification_id = Some(document.verification_id);
        entry.document_id = Some(document.id);
        entry.details = Some(serde_json::json!({
            "document_type": document.document_type.to_string(),
            "status": document.status.to_string(),
            "rejection_code": document.rejection_code,
        }));
        self.ctx.audit.record(entry).await
    }
}
