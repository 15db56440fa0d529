//! Verification record and its lifecycle state machine.
//!
//! The allowed status transitions are enumerated exactly once in
//! [`VerificationStatus::can_transition_to`]; every manager and worker checks
//! through that table so the rules cannot drift between call sites.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::document::DocumentType;
use crate::id::{ActorId, MerchantId, VerificationId};

/// Lifecycle status of a verification record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    NotStarted,
    DocumentsPending,
    DocumentsUploaded,
    Processing,
    UnderReview,
    Approved,
    Rejected,
    ResubmissionRequested,
    Expired,
    Suspended,
}

impl VerificationStatus {
    /// The single source of truth for allowed lifecycle transitions.
    ///
    /// `ResubmissionRequested` and `Suspended` are reviewer-only exits from
    /// the review states; the automatic pipeline never produces them.
    pub fn can_transition_to(self, next: VerificationStatus) -> bool {
        use VerificationStatus::*;
        match self {
            NotStarted => matches!(next, DocumentsPending),
            DocumentsPending => matches!(next, DocumentsUploaded),
            DocumentsUploaded => matches!(next, Processing),
            Processing => matches!(
                next,
                UnderReview | Approved | Rejected | ResubmissionRequested | Suspended
            ),
            UnderReview => matches!(next, Approved | Rejected | ResubmissionRequested | Suspended),
            ResubmissionRequested => matches!(next, DocumentsPending),
            Approved => matches!(next, Expired | Suspended),
            Rejected | Expired | Suspended => false,
        }
    }

    /// Terminal statuses never leave their state again.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            VerificationStatus::Rejected | VerificationStatus::Expired | VerificationStatus::Suspended
        )
    }

    /// Whether a record in this status counts against the
    /// one-active-verification-per-merchant rule.
    pub fn is_active_processing(self) -> bool {
        matches!(self, VerificationStatus::Processing)
    }

    /// Profile updates and document uploads are only allowed pre-submission.
    pub fn allows_document_changes(self) -> bool {
        matches!(
            self,
            VerificationStatus::DocumentsPending | VerificationStatus::DocumentsUploaded
        )
    }

    /// Reviewer decisions are only accepted while the pipeline holds the record.
    pub fn allows_review(self) -> bool {
        matches!(
            self,
            VerificationStatus::Processing | VerificationStatus::UnderReview
        )
    }
}

impl std::fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            VerificationStatus::NotStarted => "not_started",
            VerificationStatus::DocumentsPending => "documents_pending",
            VerificationStatus::DocumentsUploaded => "documents_uploaded",
            VerificationStatus::Processing => "processing",
            VerificationStatus::UnderReview => "under_review",
            VerificationStatus::Approved => "approved",
            VerificationStatus::Rejected => "rejected",
            VerificationStatus::ResubmissionRequested => "resubmission_requested",
            VerificationStatus::Expired => "expired",
            VerificationStatus::Suspended => "suspended",
        };
        f.write_str(s)
    }
}

/// What is being verified: a person, a company, or both (enhanced due diligence).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationKind {
    Individual,
    Business,
    Enhanced,
}

impl VerificationKind {
    pub fn needs_identity_check(self) -> bool {
        matches!(self, VerificationKind::Individual | VerificationKind::Enhanced)
    }

    pub fn needs_business_check(self) -> bool {
        matches!(self, VerificationKind::Business | VerificationKind::Enhanced)
    }

    /// Document types that must be present before the merchant may submit.
    pub fn required_documents(self) -> Vec<DocumentRequirement> {
        use DocumentRequirement::*;
        use DocumentType::*;
        let identity = OneOf(vec![Passport, DriversLicense, NationalId]);
        match self {
            VerificationKind::Individual => vec![identity, Exactly(ProofOfAddress)],
            VerificationKind::Business => vec![
                Exactly(BusinessRegistration),
                Exactly(ArticlesOfIncorporation),
                Exactly(ProofOfAddress),
            ],
            VerificationKind::Enhanced => vec![
                identity,
                Exactly(ProofOfAddress),
                Exactly(BusinessRegistration),
                Exactly(ArticlesOfIncorporation),
                Exactly(BankStatement),
            ],
        }
    }
}

impl std::fmt::Display for VerificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            VerificationKind::Individual => "individual",
            VerificationKind::Business => "business",
            VerificationKind::Enhanced => "enhanced",
        };
        f.write_str(s)
    }
}

/// One slot in a kind's required-document set.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DocumentRequirement {
    /// Exactly this type must be present.
    Exactly(DocumentType),
    /// Any one of these types satisfies the slot.
    OneOf(Vec<DocumentType>),
}

impl DocumentRequirement {
    pub fn is_satisfied_by(&self, uploaded: &[DocumentType]) -> bool {
        match self {
            DocumentRequirement::Exactly(ty) => uploaded.contains(ty),
            DocumentRequirement::OneOf(types) => types.iter().any(|ty| uploaded.contains(ty)),
        }
    }

    /// Human-readable name used when reporting missing documents.
    pub fn describe(&self) -> String {
        match self {
            DocumentRequirement::Exactly(ty) => ty.to_string(),
            DocumentRequirement::OneOf(types) => types
                .iter()
                .map(|t| t.to_string())
                .collect::<Vec<_>>()
                .join("|"),
        }
    }
}

/// Bucketed severity of a computed risk score.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    VeryHigh,
}

impl RiskLevel {
    /// Thresholds: >= 70 very high, >= 50 high, >= 25 medium, else low.
    pub fn from_score(score: f64) -> Self {
        if score >= 70.0 {
            RiskLevel::VeryHigh
        } else if score >= 50.0 {
            RiskLevel::High
        } else if score >= 25.0 {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
            RiskLevel::VeryHigh => "very_high",
        };
        f.write_str(s)
    }
}

/// One merchant verification attempt. Never deleted; retained for compliance.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VerificationRecord {
    pub id: VerificationId,
    pub merchant_id: MerchantId,
    pub kind: VerificationKind,
    pub status: VerificationStatus,

    pub risk_level: Option<RiskLevel>,
    /// Always within [0, 100] once set.
    pub risk_score: Option<f64>,

    // Personal profile
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub nationality: Option<String>,
    pub phone_number: Option<String>,

    // Address
    pub address_line1: Option<String>,
    pub address_line2: Option<String>,
    pub city: Option<String>,
    pub state_province: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,

    // Business profile
    pub business_name: Option<String>,
    pub business_registration_number: Option<String>,
    pub business_type: Option<String>,
    pub business_country: Option<String>,
    pub business_address: Option<String>,

    // Sanctions screening outcome
    pub sanctions_checked: bool,
    pub sanctions_clear: Option<bool>,
    pub sanctions_details: Option<serde_json::Value>,

    // Review
    pub reviewer_id: Option<ActorId>,
    pub review_notes: Option<String>,
    pub rejection_reason: Option<String>,
    pub rejection_code: Option<String>,

    /// Full provider-response snapshot persisted after processing.
    pub provider_response: Option<serde_json::Value>,

    // Lifecycle timestamps
    pub submitted_at: Option<DateTime<Utc>>,
    pub processed_at: Option<DateTime<Utc>>,
    pub approved_at: Option<DateTime<Utc>>,
    pub rejected_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub next_review_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl VerificationRecord {
    pub fn new(merchant_id: MerchantId, kind: VerificationKind) -> Self {
        let now = Utc::now();
        Self {
            id: VerificationId::new(),
            merchant_id,
            kind,
            status: VerificationStatus::NotStarted,
            risk_level: None,
            risk_score: None,
            first_name: None,
            last_name: None,
            date_of_birth: None,
            nationality: None,
            phone_number: None,
            address_line1: None,
            address_line2: None,
            city: None,
            state_province: None,
            postal_code: None,
            country: None,
            business_name: None,
            business_registration_number: None,
            business_type: None,
            business_country: None,
            business_address: None,
            sanctions_checked: false,
            sanctions_clear: None,
            sanctions_details: None,
            reviewer_id: None,
            review_notes: None,
            rejection_reason: None,
            rejection_code: None,
            provider_response: None,
            submitted_at: None,
            processed_at: None,
            approved_at: None,
            rejected_at: None,
            expires_at: None,
            next_review_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply a status transition through the central table.
    pub fn transition_to(&mut self, next: VerificationStatus) -> Result<(), crate::KycError> {
        if !self.status.can_transition_to(next) {
            return Err(crate::KycError::State(format!(
                "verification {} cannot transition from {} to {}",
                self.id, self.status, next
            )));
        }
        self.status = next;
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn full_name(&self) -> Option<String> {
        match (&self.first_name, &self.last_name) {
            (Some(first), Some(last)) => Some(format!("{first} {last}")),
            (Some(first), None) => Some(first.clone()),
            (None, Some(last)) => Some(last.clone()),
            (None, None) => None,
        }
    }

    /// Narrow boundary projection (what list endpoints and notifications see).
    pub fn summary(&self) -> VerificationSummary {
        VerificationSummary {
            id: self.id,
            merchant_id: self.merchant_id,
            kind: self.kind,
            status: self.status,
            risk_level: self.risk_level,
            risk_score: self.risk_score,
            sanctions_checked: self.sanctions_checked,
            sanctions_clear: self.sanctions_clear,
            submitted_at: self.submitted_at,
            processed_at: self.processed_at,
            approved_at: self.approved_at,
            rejected_at: self.rejected_at,
            expires_at: self.expires_at,
            next_review_at: self.next_review_at,
            rejection_reason: self.rejection_reason.clone(),
            rejection_code: self.rejection_code.clone(),
        }
    }
}

/// Projection of a verification record for boundary consumers.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VerificationSummary {
    pub id: VerificationId,
    pub merchant_id: MerchantId,
    pub kind: VerificationKind,
    pub status: VerificationStatus,
    pub risk_level: Option<RiskLevel>,
    pub risk_score: Option<f64>,
    pub sanctions_checked: bool,
    pub sanctions_clear: Option<bool>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub processed_at: Option<DateTime<Utc>>,
    pub approved_at: Option<DateTime<Utc>>,
    pub rejected_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub next_review_at: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
    pub rejection_code: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_path_transitions() {
        use VerificationStatus::*;
        let path = [
            (NotStarted, DocumentsPending),
            (DocumentsPending, DocumentsUploaded),
            (DocumentsUploaded, Processing),
            (Processing, UnderReview),
            (UnderReview, Approved),
            (Approved, Expired),
        ];
        for (from, to) in path {
            assert!(from.can_transition_to(to), "{from} -> {to} must be allowed");
        }
    }

    #[test]
    fn terminal_statuses_have_no_exits() {
        use VerificationStatus::*;
        let all = [
            NotStarted,
            DocumentsPending,
            DocumentsUploaded,
            Processing,
            UnderReview,
            Approved,
            Rejected,
            ResubmissionRequested,
            Expired,
            Suspended,
        ];
        for terminal in [Rejected, Expired, Suspended] {
            for next in all {
                assert!(!terminal.can_transition_to(next));
            }
        }
    }

    #[test]
    fn skipping_submission_is_rejected() {
        use VerificationStatus::*;
        assert!(!DocumentsPending.can_transition_to(Processing));
        assert!(!NotStarted.can_transition_to(Approved));
        assert!(!Processing.can_transition_to(Expired));
    }

    #[test]
    fn resubmission_reopens_the_record() {
        use VerificationStatus::*;
        assert!(UnderReview.can_transition_to(ResubmissionRequested));
        assert!(ResubmissionRequested.can_transition_to(DocumentsPending));
    }

    #[test]
    fn record_transition_enforces_table() {
        let mut record =
            VerificationRecord::new(MerchantId::new(), VerificationKind::Individual);
        record
            .transition_to(VerificationStatus::DocumentsPending)
            .unwrap();
        let err = record
            .transition_to(VerificationStatus::Approved)
            .unwrap_err();
        assert!(matches!(err, crate::KycError::State(_)));
        assert_eq!(record.status, VerificationStatus::DocumentsPending);
    }

    #[test]
    fn risk_level_thresholds() {
        assert_eq!(RiskLevel::from_score(0.0), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(24.9), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(25.0), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(50.0), RiskLevel::High);
        assert_eq!(RiskLevel::from_score(70.0), RiskLevel::VeryHigh);
        assert_eq!(RiskLevel::from_score(100.0), RiskLevel::VeryHigh);
    }

    #[test]
    fn individual_requirements_accept_any_identity_document() {
        let reqs = VerificationKind::Individual.required_documents();
        let uploaded = vec![DocumentType::DriversLicense, DocumentType::ProofOfAddress];
        assert!(reqs.iter().all(|r| r.is_satisfied_by(&uploaded)));

        let missing_address = vec![DocumentType::Passport];
        let unsatisfied: Vec<_> = reqs
            .iter()
            .filter(|r| !r.is_satisfied_by(&missing_address))
            .collect();
        assert_eq!(unsatisfied.len(), 1);
        assert_eq!(unsatisfied[0].describe(), "proof_of_address");
    }

    #[test]
    fn enhanced_requirements_are_the_union_plus_bank_statement() {
        let reqs = VerificationKind::Enhanced.required_documents();
        assert_eq!(reqs.len(), 5);
        assert!(reqs.contains(&DocumentRequirement::Exactly(DocumentType::BankStatement)));
        assert!(reqs.contains(&DocumentRequirement::Exactly(
            DocumentType::ArticlesOfIncorporation
        )));
    }
}
