//! Document record: one uploaded artifact attached to a verification.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::id::{DocumentId, VerificationId};

/// Kind of uploaded document. Unique per verification.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    Passport,
    DriversLicense,
    NationalId,
    UtilityBill,
    BankStatement,
    BusinessRegistration,
    ArticlesOfIncorporation,
    CertificateOfIncorporation,
    TaxCertificate,
    ProofOfAddress,
    Selfie,
    Other,
}

impl DocumentType {
    /// Identity documents usable as the primary document for identity checks.
    pub fn is_identity_document(self) -> bool {
        matches!(
            self,
            DocumentType::Passport | DocumentType::DriversLicense | DocumentType::NationalId
        )
    }

    /// Documents usable to anchor a business-registry check.
    pub fn is_business_document(self) -> bool {
        matches!(
            self,
            DocumentType::BusinessRegistration
                | DocumentType::ArticlesOfIncorporation
                | DocumentType::CertificateOfIncorporation
        )
    }
}

impl std::fmt::Display for DocumentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DocumentType::Passport => "passport",
            DocumentType::DriversLicense => "drivers_license",
            DocumentType::NationalId => "national_id",
            DocumentType::UtilityBill => "utility_bill",
            DocumentType::BankStatement => "bank_statement",
            DocumentType::BusinessRegistration => "business_registration",
            DocumentType::ArticlesOfIncorporation => "articles_of_incorporation",
            DocumentType::CertificateOfIncorporation => "certificate_of_incorporation",
            DocumentType::TaxCertificate => "tax_certificate",
            DocumentType::ProofOfAddress => "proof_of_address",
            DocumentType::Selfie => "selfie",
            DocumentType::Other => "other",
        };
        f.write_str(s)
    }
}

/// Processing state of a document.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    Uploaded,
    Processing,
    Processed,
    Verified,
    Rejected,
    Expired,
}

impl DocumentStatus {
    /// Only never-processed or already-rejected documents may be deleted.
    pub fn allows_delete(self) -> bool {
        matches!(self, DocumentStatus::Uploaded | DocumentStatus::Rejected)
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            DocumentStatus::Verified | DocumentStatus::Rejected | DocumentStatus::Expired
        )
    }
}

impl std::fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DocumentStatus::Uploaded => "uploaded",
            DocumentStatus::Processing => "processing",
            DocumentStatus::Processed => "processed",
            DocumentStatus::Verified => "verified",
            DocumentStatus::Rejected => "rejected",
            DocumentStatus::Expired => "expired",
        };
        f.write_str(s)
    }
}

/// Quality rating derived from the quality score.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentQuality {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl DocumentQuality {
    /// Thresholds: >= 90 excellent, >= 70 good, >= 50 fair, else poor.
    pub fn from_score(score: f64) -> Self {
        if score >= 90.0 {
            DocumentQuality::Excellent
        } else if score >= 70.0 {
            DocumentQuality::Good
        } else if score >= 50.0 {
            DocumentQuality::Fair
        } else {
            DocumentQuality::Poor
        }
    }
}

/// One uploaded document, owned by exactly one verification record.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub id: DocumentId,
    pub verification_id: VerificationId,
    pub document_type: DocumentType,
    pub status: DocumentStatus,

    pub file_name: String,
    pub file_path: String,
    pub file_size: u64,
    pub mime_type: String,
    /// Hex-encoded blake3 digest of the uploaded bytes.
    pub file_hash: String,

    // Quality assessment
    pub quality_score: Option<f64>,
    pub quality_rating: Option<DocumentQuality>,
    pub quality_issues: Vec<String>,

    // OCR / extraction
    pub ocr_text: Option<String>,
    pub extracted_data: Option<serde_json::Value>,
    pub ocr_confidence: Option<f64>,

    // Document-type-specific fields derived from extraction
    pub document_number: Option<String>,
    pub issue_date: Option<NaiveDate>,
    pub expiry_date: Option<NaiveDate>,
    pub issuing_authority: Option<String>,
    pub issuing_country: Option<String>,

    // Verification outcome
    pub is_authentic: Option<bool>,
    pub is_expired: bool,
    pub verification_provider: Option<String>,
    pub verification_reference: Option<String>,
    pub verification_result: Option<serde_json::Value>,

    pub rejection_reason: Option<String>,
    pub rejection_code: Option<String>,

    pub processed_at: Option<DateTime<Utc>>,
    pub verified_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DocumentRecord {
    pub fn new(
        verification_id: VerificationId,
        document_type: DocumentType,
        file_name: impl Into<String>,
        file_path: impl Into<String>,
        file_size: u64,
        mime_type: impl Into<String>,
        file_hash: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: DocumentId::new(),
            verification_id,
            document_type,
            status: DocumentStatus::Uploaded,
            file_name: file_name.into(),
            file_path: file_path.into(),
            file_size,
            mime_type: mime_type.into(),
            file_hash: file_hash.into(),
            quality_score: None,
            quality_rating: None,
            quality_issues: Vec::new(),
            ocr_text: None,
            extracted_data: None,
            ocr_confidence: None,
            document_number: None,
            issue_date: None,
            expiry_date: None,
            issuing_authority: None,
            issuing_country: None,
            is_authentic: None,
            is_expired: false,
            verification_provider: None,
            verification_reference: None,
            verification_result: None,
            rejection_reason: None,
            rejection_code: None,
            processed_at: None,
            verified_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn reject(&mut self, reason: impl Into<String>, code: impl Into<String>) {
        self.status = DocumentStatus::Rejected;
        self.rejection_reason = Some(reason.into());
        self.rejection_code = Some(code.into());
        self.updated_at = Utc::now();
    }

    /// Narrow boundary projection.
    pub fn summary(&self) -> DocumentSummary {
        DocumentSummary {
            id: self.id,
            verification_id: self.verification_id,
            document_type: self.document_type,
            status: self.status,
            file_name: self.file_name.clone(),
            quality_score: self.quality_score,
            quality_rating: self.quality_rating,
            document_number: self.document_number.clone(),
            issue_date: self.issue_date,
            expiry_date: self.expiry_date,
            issuing_country: self.issuing_country.clone(),
            is_authentic: self.is_authentic,
            is_expired: self.is_expired,
            processed_at: self.processed_at,
            verified_at: self.verified_at,
        }
    }
}

/// Projection of a document record for boundary consumers.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DocumentSummary {
    pub id: DocumentId,
    pub verification_id: VerificationId,
    pub document_type: DocumentType,
    pub status: DocumentStatus,
    pub file_name: String,
    pub quality_score: Option<f64>,
    pub quality_rating: Option<DocumentQuality>,
    pub document_number: Option<String>,
    pub issue_date: Option<NaiveDate>,
    pub expiry_date: Option<NaiveDate>,
    pub issuing_country: Option<String>,
    pub is_authentic: Option<bool>,
    pub is_expired: bool,
    pub processed_at: Option<DateTime<Utc>>,
    pub verified_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quality_thresholds() {
        assert_eq!(DocumentQuality::from_score(95.0), DocumentQuality::Excellent);
        assert_eq!(DocumentQuality::from_score(90.0), DocumentQuality::Excellent);
        assert_eq!(DocumentQuality::from_score(70.0), DocumentQuality::Good);
        assert_eq!(DocumentQuality::from_score(50.0), DocumentQuality::Fair);
        assert_eq!(DocumentQuality::from_score(49.9), DocumentQuality::Poor);
    }

    #[test]
    fn delete_only_from_uploaded_or_rejected() {
        assert!(DocumentStatus::Uploaded.allows_delete());
        assert!(DocumentStatus::Rejected.allows_delete());
        assert!(!DocumentStatus::Processing.allows_delete());
        assert!(!DocumentStatus::Processed.allows_delete());
        assert!(!DocumentStatus::Verified.allows_delete());
        assert!(!DocumentStatus::Expired.allows_delete());
    }

    #[test]
    fn reject_records_reason_and_code() {
        let mut doc = DocumentRecord::new(
            VerificationId::new(),
            DocumentType::Passport,
            "passport.jpg",
            "kyc-documents/m/passport.jpg",
            120_000,
            "image/jpeg",
            "abc",
        );
        doc.reject("too blurry", "QUALITY_POOR");
        assert_eq!(doc.status, DocumentStatus::Rejected);
        assert_eq!(doc.rejection_code.as_deref(), Some("QUALITY_POOR"));
    }
}
