//! Document upload and deletion.

use kyc_audit::{Actor, AuditAction, AuditEntry, RequestContext};
use kyc_queue::{Job, JobPayload};
use kyc_types::{
    DocumentId, DocumentRecord, DocumentStatus, DocumentType, KycError, KycResult,
    VerificationId, VerificationStatus,
};
use tracing::info;

use crate::PipelineContext;

/// Upload validation, file storage, and the uploaded-document index.
#[derive(Clone)]
pub struct DocumentManager {
    ctx: PipelineContext,
}

impl DocumentManager {
    pub fn new(ctx: PipelineContext) -> Self {
        Self { ctx }
    }

    /// Validates and stores one uploaded file, then queues it for
    /// processing. Uploading to a resubmission-requested record reopens it.
    pub async fn upload(
        &self,
        verification_id: VerificationId,
        document_type: DocumentType,
        file_name: &str,
        mime_type: &str,
        bytes: &[u8],
        actor: Actor,
        context: RequestContext,
    ) -> KycResult<DocumentRecord> {
        let mut verification = self
            .ctx
            .verifications
            .get(verification_id)
            .await?
            .ok_or_else(|| KycError::NotFound(format!("verification {verification_id}")))?;

        if verification.status == VerificationStatus::ResubmissionRequested {
            verification.transition_to(VerificationStatus::DocumentsPending)?;
        }
        if !verification.status.allows_document_changes() {
            return Err(KycError::State(format!(
                "verification {verification_id} is {} and does not accept documents",
                verification.status
            )));
        }

        let policy = &self.ctx.document_policy;
        if !policy.allows_mime(mime_type) {
            return Err(KycError::Validation(format!(
                "unsupported file type {mime_type}"
            )));
        }
        if bytes.is_empty() {
            return Err(KycError::Validation("empty file".into()));
        }
        if bytes.len() as u64 > policy.max_file_size {
            return Err(KycError::Validation(format!(
                "file exceeds the {} byte limit",
                policy.max_file_size
            )));
        }
        if let Some(existing) = self
            .ctx
            .documents
            .find_by_type(verification_id, document_type)
            .await?
        {
            if existing.status != DocumentStatus::Rejected {
                return Err(KycError::duplicate_document(document_type));
            }
        }

        let file_hash = blake3::hash(bytes).to_hex().to_string();
        let file_path = format!(
            "kyc-documents/{}/{}/{}/{}",
            verification.merchant_id, verification_id, document_type, file_name
        );
        self.ctx.storage.put(&file_path, bytes).await?;

        let record = DocumentRecord::new(
            verification_id,
            document_type,
            file_name,
            file_path,
            bytes.len() as u64,
            mime_type,
            file_hash,
        );
        self.ctx.documents.insert(&record).await?;

        // The required set is only checked at submission; the first upload
        // already moves the record forward.
        if verification.status == VerificationStatus::DocumentsPending {
            verification.transition_to(VerificationStatus::DocumentsUploaded)?;
        }
        self.ctx.verifications.update(&verification).await?;

        let mut entry = AuditEntry::new(AuditAction::DocumentUploaded, actor);
        entry.verification_id = Some(verification_id);
        entry.document_id = Some(record.id);
        entry.merchant_id = Some(verification.merchant_id);
        entry.context = context;
        entry.details = Some(serde_json::json!({
            "document_type": document_type.to_string(),
            "file_name": file_name,
            "file_size": bytes.len(),
        }));
        self.ctx.audit.record(entry).await?;

        self.ctx
            .queue
            .enqueue(Job::new(JobPayload::ProcessDocument {
                document_id: record.id,
            }))
            .await?;
        info!(document_id = %record.id, verification_id = %verification_id, document_type = %document_type, "Document uploaded");
        Ok(record)
    }

    /// Deletes a document that has not been processed (or was rejected),
    /// removing the stored file as well.
    pub async fn delete(
        &self,
        document_id: DocumentId,
        actor: Actor,
        context: RequestContext,
    ) -> KycResult<()> {
        let document = self
            .ctx
            .documents
            .get(document_id)
            .await?
            .ok_or_else(|| KycError::NotFound(format!("document {document_id}")))?;
        let verification = self
            .ctx
            .verifications
            .get(document.verification_id)
            .await?
            .ok_or_else(|| {
                KycError::NotFound(format!("verification {}", document.verification_id))
            })?;

        if !document.status.allows_delete() {
            return Err(KycError::State(format!(
                "document {document_id} is {} and cannot be deleted",
                document.status
            )));
        }
        if !verification.status.allows_document_changes() {
            return Err(KycError::State(format!(
                "verification {} is {} and its documents are frozen",
                verification.id, verification.status
            )));
        }

        self.ctx.storage.delete(&document.file_path).await?;
        self.ctx.documents.remove(document_id).await?;

        let mut entry = AuditEntry::new(AuditAction::DocumentDeleted, actor);
        entry.verification_id = Some(document.verification_id);
        entry.document_id = Some(document_id);
        entry.merchant_id = Some(verification.merchant_id);
        entry.context = context;
        entry.details = Some(serde_json::json!({
            "document_type": document.document_type.to_string(),
            "file_name": document.file_name,
        }));
        self.ctx.audit.record(entry).await?;
        info!(document_id = %document_id, "Document deleted");
        Ok(())
    }
}
