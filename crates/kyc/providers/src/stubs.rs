//! Deterministic stub providers.
//!
//! These stand in for live integrations in tests and local runs. They keep
//! the gateway seam honest: callers cannot tell a stub from a real provider.

use std::collections::HashSet;

use async_trait::async_trait;
use serde_json::json;
use uuid::Uuid;

use crate::traits::{
    BusinessRegistry, DocumentChecker, IdentityProvider, ProviderError, SanctionsSource,
};
use crate::wire::{
    AuthenticityOutcome, BusinessVerificationRequest, DocumentCheckRequest,
    IdentityVerificationRequest, ProviderOutcome, SanctionsQuery, SanctionsScreen,
};

/// Identity provider returning a fixed outcome.
pub struct StaticIdentityProvider {
    confidence: f64,
    failure: Option<String>,
}

impl StaticIdentityProvider {
    pub fn clear() -> Self {
        Self {
            confidence: 95.0,
            failure: None,
        }
    }

    pub fn with_confidence(confidence: f64) -> Self {
        Self {
            confidence,
            failure: None,
        }
    }

    /// Always fails with a network error; for exercising the error mapping.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            confidence: 0.0,
            failure: Some(message.into()),
        }
    }
}

#[async_trait]
impl IdentityProvider for StaticIdentityProvider {
    fn name(&self) -> &str {
        "static-identity"
    }

    async fn verify_identity(
        &self,
        request: &IdentityVerificationRequest,
    ) -> Result<ProviderOutcome, ProviderError> {
        if let Some(message) = &self.failure {
            return Err(ProviderError::Network(message.clone()));
        }
        let reference = format!("identity_{}", Uuid::new_v4());
        Ok(ProviderOutcome::clear(self.confidence, reference).with_details(json!({
            "document_type": request.document_type.to_string(),
            "selfie_checked": request.selfie_path.is_some(),
        })))
    }
}

/// Business registry returning a fixed outcome.
pub struct StaticBusinessRegistry {
    found: bool,
    failure: Option<String>,
}

impl StaticBusinessRegistry {
    pub fn verified() -> Self {
        Self {
            found: true,
            failure: None,
        }
    }

    pub fn not_found() -> Self {
        Self {
            found: false,
            failure: None,
        }
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            found: false,
            failure: Some(message.into()),
        }
    }
}

#[async_trait]
impl BusinessRegistry for StaticBusinessRegistry {
    fn name(&self) -> &str {
        "static-registry"
    }

    async fn verify_business(
        &self,
        request: &BusinessVerificationRequest,
    ) -> Result<ProviderOutcome, ProviderError> {
        if let Some(message) = &self.failure {
            return Err(ProviderError::Network(message.clone()));
        }
        let reference = format!("registry_{}", Uuid::new_v4());
        if self.found {
            let mut outcome = ProviderOutcome::clear(95.0, reference);
            outcome.status = "verified".into();
            outcome.details = json!({ "business_name": request.business_name });
            Ok(outcome)
        } else {
            Ok(ProviderOutcome::failure(
                "not_found",
                reference,
                vec!["business not found in registry".into()],
            ))
        }
    }
}

/// Sanctions list backed by an in-memory set of restricted names.
pub struct InMemorySanctionsList {
    name: String,
    entries: HashSet<String>,
    confidence: f64,
}

impl InMemorySanctionsList {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: HashSet::new(),
            confidence: 95.0,
        }
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence;
        self
    }

    pub fn add_entry(&mut self, full_name: impl AsRef<str>) {
        self.entries.insert(full_name.as_ref().to_lowercase());
    }
}

#[async_trait]
impl SanctionsSource for InMemorySanctionsList {
    fn name(&self) -> &str {
        &self.name
    }

    async fn screen(&self, query: &SanctionsQuery) -> Result<SanctionsScreen, ProviderError> {
        let clear = !self.entries.contains(&query.full_name.to_lowercase());
        Ok(SanctionsScreen {
            clear,
            confidence: self.confidence,
            details: json!({ "source": self.name, "checked": query.full_name }),
        })
    }
}

/// Document checker returning a fixed authenticity verdict.
pub struct StaticDocumentChecker {
    authentic: bool,
    failure: Option<String>,
}

impl StaticDocumentChecker {
    pub fn authentic() -> Self {
        Self {
            authentic: true,
            failure: None,
        }
    }

    pub fn inauthentic() -> Self {
        Self {
            authentic: false,
            failure: None,
        }
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            authentic: false,
            failure: Some(message.into()),
        }
    }
}

#[async_trait]
impl DocumentChecker for StaticDocumentChecker {
    fn name(&self) -> &str {
        "static-document-checker"
    }

    async fn check_document(
        &self,
        request: &DocumentCheckRequest,
    ) -> Result<AuthenticityOutcome, ProviderError> {
        if let Some(message) = &self.failure {
            return Err(ProviderError::Network(message.clone()));
        }
        let reference = format!("doccheck_{}", Uuid::new_v4());
        if self.authentic {
            let mut outcome = AuthenticityOutcome::authentic(self.name(), reference);
            outcome.details = json!({
                "document_type": request.document_type.to_string(),
                "security_features": { "hologram": "present", "watermark": "present" },
            });
            Ok(outcome)
        } else {
            Ok(AuthenticityOutcome::rejected(
                self.name(),
                reference,
                "document failed authenticity checks",
                "AUTHENTICITY_FAILED",
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[tokio::test]
    async fn sanctions_list_matches_are_case_insensitive() {
        let mut list = InMemorySanctionsList::new("ofac");
        list.add_entry("Bad Actor");

        let query = SanctionsQuery {
            full_name: "bad actor".into(),
            date_of_birth: NaiveDate::from_ymd_opt(1980, 5, 5),
            nationality: None,
        };
        let screen = list.screen(&query).await.unwrap();
        assert!(!screen.clear);

        let query = SanctionsQuery {
            full_name: "Good Person".into(),
            date_of_birth: None,
            nationality: None,
        };
        let screen = list.screen(&query).await.unwrap();
        assert!(screen.clear);
    }

    #[tokio::test]
    async fn inauthentic_checker_supplies_rejection_code() {
        let checker = StaticDocumentChecker::inauthentic();
        let request = DocumentCheckRequest {
            document_type: kyc_types::DocumentType::Passport,
            document_number: Some("X123".into()),
            document_path: "p.jpg".into(),
            extracted_data: json!({}),
        };
        let outcome = checker.check_document(&request).await.unwrap();
        assert!(!outcome.authentic);
        assert_eq!(outcome.rejection_code.as_deref(), Some("AUTHENTICITY_FAILED"));
    }
}
