//! Queue payload dispatch.

use async_trait::async_trait;
use chrono::Utc;
use kyc_queue::{JobHandler, JobPayload};
use kyc_types::KycResult;

use crate::document_worker::DocumentWorker;
use crate::verification_worker::VerificationWorker;
use crate::verifications::VerificationManager;
use crate::PipelineContext;

/// The single handler behind the worker loop; routes each payload kind to
/// its stage.
pub struct PipelineHandler {
    documents: DocumentWorker,
    verifications: VerificationWorker,
    manager: VerificationManager,
}

impl PipelineHandler {
    pub fn new(ctx: PipelineContext) -> Self {
        Self {
            documents: DocumentWorker::new(ctx.clone()),
            verifications: VerificationWorker::new(ctx.clone()),
            manager: VerificationManager::new(ctx),
        }
    }
}

#[async_trait]
impl JobHandler for PipelineHandler {
    async fn handle(&self, payload: &JobPayload) -> KycResult<()> {
        match payload {
            JobPayload::ProcessDocument { document_id } => {
                self.documents.process(*document_id).await
            }
            JobPayload::VerifyDocument { document_id } => self.documents.verify(*document_id).await,
            JobPayload::ProcessVerification { verification_id } => {
                self.verifications.process(*verification_id).await
            }
            JobPayload::CheckDocumentExpiry => {
                self.documents.check_expiry(Utc::now().date_naive()).await.map(|_| ())
            }
            JobPayload::CheckVerificationExpiry => {
                self.manager.expire_lapsed(Utc::now()).await.map(|_| ())
            }
        }
    }
}
