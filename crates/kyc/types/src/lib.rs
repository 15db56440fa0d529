//! Core types for the merchant KYC verification pipeline.
//!
//! Everything that the managers, workers, and stores agree on lives here:
//! identifiers, the verification and document records, the lifecycle state
//! machines, per-kind document requirements, and the shared error taxonomy.

mod document;
mod error;
mod id;
mod verification;

pub use document::{
    DocumentQuality, DocumentRecord, DocumentStatus, DocumentSummary, DocumentType,
};
pub use error::{KycError, KycResult};
pub use id::{ActorId, DocumentId, MerchantId, VerificationId};
pub use verification::{
    DocumentRequirement, RiskLevel, VerificationKind, VerificationRecord, VerificationStatus,
    VerificationSummary,
};
