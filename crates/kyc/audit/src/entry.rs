//! Audit entry shape and the retention schedule keyed off its action.

use chrono::{DateTime, Duration, Utc};
use kyc_types::{ActorId, DocumentId, MerchantId, VerificationId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What happened. Drives both the retention period and whether the entry is
/// surfaced in compliance exports.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    VerificationCreated,
    VerificationUpdated,
    VerificationSubmitted,
    VerificationApproved,
    VerificationRejected,
    VerificationExpired,
    ResubmissionRequested,
    VerificationSuspended,
    DocumentUploaded,
    DocumentDeleted,
    DocumentProcessed,
    DocumentVerified,
    DocumentRejected,
    DocumentExpired,
    SanctionsScreened,
    RiskAssessed,
    ComplianceFlagRaised,
    DataAccessed,
}

impl AuditAction {
    /// How long entries for this action must be retained, in days.
    ///
    /// Approval, rejection, and document-verification records are kept seven
    /// years; screening and risk records five; compliance flags ten; the
    /// rest three.
    pub fn retention_days(self) -> i64 {
        match self {
            AuditAction::VerificationApproved
            | AuditAction::VerificationRejected
            | AuditAction::DocumentVerified => 7 * 365,
            AuditAction::SanctionsScreened | AuditAction::RiskAssessed => 5 * 365,
            AuditAction::ComplianceFlagRaised => 10 * 365,
            _ => 3 * 365,
        }
    }

    /// Entries surfaced in regulator-facing exports.
    pub fn is_compliance_relevant(self) -> bool {
        matches!(
            self,
            AuditAction::VerificationApproved
                | AuditAction::VerificationRejected
                | AuditAction::DocumentVerified
                | AuditAction::SanctionsScreened
                | AuditAction::RiskAssessed
                | AuditAction::ComplianceFlagRaised
        )
    }
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            AuditAction::VerificationCreated => "verification_created",
            AuditAction::VerificationUpdated => "verification_updated",
            AuditAction::VerificationSubmitted => "verification_submitted",
            AuditAction::VerificationApproved => "verification_approved",
            AuditAction::VerificationRejected => "verification_rejected",
            AuditAction::VerificationExpired => "verification_expired",
            AuditAction::ResubmissionRequested => "resubmission_requested",
            AuditAction::VerificationSuspended => "verification_suspended",
            AuditAction::DocumentUploaded => "document_uploaded",
            AuditAction::DocumentDeleted => "document_deleted",
            AuditAction::DocumentProcessed => "document_processed",
            AuditAction::DocumentVerified => "document_verified",
            AuditAction::DocumentRejected => "document_rejected",
            AuditAction::DocumentExpired => "document_expired",
            AuditAction::SanctionsScreened => "sanctions_screened",
            AuditAction::RiskAssessed => "risk_assessed",
            AuditAction::ComplianceFlagRaised => "compliance_flag_raised",
            AuditAction::DataAccessed => "data_accessed",
        };
        f.write_str(s)
    }
}

/// Who performed the action.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorType {
    Merchant,
    Reviewer,
    System,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub actor_type: ActorType,
    pub id: Option<ActorId>,
}

impl Actor {
    pub fn system() -> Self {
        Self {
            actor_type: ActorType::System,
            id: None,
        }
    }

    pub fn merchant(id: ActorId) -> Self {
        Self {
            actor_type: ActorType::Merchant,
            id: Some(id),
        }
    }

    pub fn reviewer(id: ActorId) -> Self {
        Self {
            actor_type: ActorType::Reviewer,
            id: Some(id),
        }
    }
}

/// Request metadata captured alongside user-initiated actions.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestContext {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub request_id: Option<String>,
}

/// One immutable audit record.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: Uuid,
    pub action: AuditAction,
    pub actor: Actor,
    pub context: RequestContext,

    pub verification_id: Option<VerificationId>,
    pub document_id: Option<DocumentId>,
    pub merchant_id: Option<MerchantId>,

    /// Masked snapshot of the record before the change.
    pub old_values: Option<serde_json::Value>,
    /// Masked snapshot of the record after the change.
    pub new_values: Option<serde_json::Value>,
    /// Top-level keys whose value differs between the snapshots.
    pub changed_fields: Vec<String>,

    pub details: Option<serde_json::Value>,
    /// Set when the action read or wrote masked personal data.
    pub sensitive_data_accessed: bool,
    pub compliance_relevant: bool,

    pub retention_until: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl AuditEntry {
    pub fn new(action: AuditAction, actor: Actor) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            action,
            actor,
            context: RequestContext::default(),
            verification_id: None,
            document_id: None,
            merchant_id: None,
            old_values: None,
            new_values: None,
            changed_fields: Vec::new(),
            details: None,
            sensitive_data_accessed: false,
            compliance_relevant: action.is_compliance_relevant(),
            retention_until: now + Duration::days(action.retention_days()),
            created_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retention_schedule_by_action() {
        assert_eq!(AuditAction::VerificationApproved.retention_days(), 2555);
        assert_eq!(AuditAction::VerificationRejected.retention_days(), 2555);
        assert_eq!(AuditAction::DocumentVerified.retention_days(), 2555);
        assert_eq!(AuditAction::SanctionsScreened.retention_days(), 1825);
        assert_eq!(AuditAction::RiskAssessed.retention_days(), 1825);
        assert_eq!(AuditAction::ComplianceFlagRaised.retention_days(), 3650);
        assert_eq!(AuditAction::DocumentUploaded.retention_days(), 1095);
    }

    #[test]
    fn compliance_relevance_follows_the_allowlist() {
        assert!(AuditAction::VerificationApproved.is_compliance_relevant());
        assert!(AuditAction::SanctionsScreened.is_compliance_relevant());
        assert!(!AuditAction::DocumentUploaded.is_compliance_relevant());
        assert!(!AuditAction::VerificationCreated.is_compliance_relevant());
    }

    #[test]
    fn new_entry_derives_retention_and_relevance() {
        let entry = AuditEntry::new(AuditAction::RiskAssessed, Actor::system());
        assert!(entry.compliance_relevant);
        let days = (entry.retention_until - entry.created_at).num_days();
        assert_eq!(days, 1825);
    }
}
