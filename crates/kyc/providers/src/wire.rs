//! Request and result shapes shared by all providers.

use chrono::NaiveDate;
use kyc_types::DocumentType;
use serde::{Deserialize, Serialize};

/// Uniform result returned by identity, business, and sanctions operations.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProviderOutcome {
    pub success: bool,
    pub status: String,
    /// Provider confidence in the result, 0-100.
    pub confidence: f64,
    pub details: serde_json::Value,
    pub provider_reference: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

impl ProviderOutcome {
    pub fn clear(confidence: f64, reference: impl Into<String>) -> Self {
        Self {
            success: true,
            status: "clear".into(),
            confidence,
            details: serde_json::Value::Null,
            provider_reference: reference.into(),
            errors: Vec::new(),
        }
    }

    pub fn failure(
        status: impl Into<String>,
        reference: impl Into<String>,
        errors: Vec<String>,
    ) -> Self {
        Self {
            success: false,
            status: status.into(),
            confidence: 0.0,
            details: serde_json::Value::Null,
            provider_reference: reference.into(),
            errors,
        }
    }

    /// Provider or transport failure mapped into a value the pipeline can
    /// act on without unwinding.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            status: "error".into(),
            confidence: 0.0,
            details: serde_json::Value::Null,
            provider_reference: String::new(),
            errors: vec![message.into()],
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = details;
        self
    }
}

/// Identity check request (individual and enhanced verifications).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct IdentityVerificationRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub nationality: Option<String>,
    pub document_type: DocumentType,
    pub document_number: Option<String>,
    pub document_path: String,
    pub selfie_path: Option<String>,
}

/// Business-registry check request (business and enhanced verifications).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BusinessVerificationRequest {
    pub business_name: Option<String>,
    pub registration_number: Option<String>,
    pub business_type: Option<String>,
    pub country: Option<String>,
    pub address: Option<String>,
    pub document_path: String,
}

/// Subject of a sanctions screening.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SanctionsQuery {
    pub full_name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub nationality: Option<String>,
}

/// Result from one sanctions list source.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SanctionsScreen {
    /// True when the subject did not match the list.
    pub clear: bool,
    pub confidence: f64,
    pub details: serde_json::Value,
}

/// Document-authenticity check request.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DocumentCheckRequest {
    pub document_type: DocumentType,
    pub document_number: Option<String>,
    pub document_path: String,
    pub extracted_data: serde_json::Value,
}

/// Outcome of a document-authenticity check.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AuthenticityOutcome {
    pub authentic: bool,
    pub provider: String,
    pub reference: String,
    pub details: serde_json::Value,
    pub rejection_reason: Option<String>,
    pub rejection_code: Option<String>,
}

impl AuthenticityOutcome {
    pub fn authentic(provider: impl Into<String>, reference: impl Into<String>) -> Self {
        Self {
            authentic: true,
            provider: provider.into(),
            reference: reference.into(),
            details: serde_json::Value::Null,
            rejection_reason: None,
            rejection_code: None,
        }
    }

    pub fn rejected(
        provider: impl Into<String>,
        reference: impl Into<String>,
        reason: impl Into<String>,
        code: impl Into<String>,
    ) -> Self {
        Self {
            authentic: false,
            provider: provider.into(),
            reference: reference.into(),
            details: serde_json::Value::Null,
            rejection_reason: Some(reason.into()),
            rejection_code: Some(code.into()),
        }
    }
}
