use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tracing::warn;
use uuid::Uuid;

use crate::traits::{
    BusinessRegistry, DocumentChecker, IdentityProvider, ProviderError, SanctionsSource,
};
use crate::wire::{
    AuthenticityOutcome, BusinessVerificationRequest, DocumentCheckRequest,
    IdentityVerificationRequest, ProviderOutcome, SanctionsQuery,
};

/// Gateway tuning. Every provider call runs under `call_timeout`; a timeout
/// is treated as provider failure, never as success.
#[derive(Clone, Debug)]
pub struct GatewayConfig {
    pub call_timeout: Duration,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            call_timeout: Duration::from_secs(30),
        }
    }
}

/// Uniform front over the external verification services.
///
/// All four operations return outcome values rather than errors: a failed or
/// timed-out provider call becomes `{success: false, status: "error"}` so
/// the workers can decide fail-closed.
pub struct ProviderGateway {
    identity: Arc<dyn IdentityProvider>,
    business: Arc<dyn BusinessRegistry>,
    document: Arc<dyn DocumentChecker>,
    sanctions: Vec<Arc<dyn SanctionsSource>>,
    config: GatewayConfig,
}

impl ProviderGateway {
    pub fn new(
        identity: Arc<dyn IdentityProvider>,
        business: Arc<dyn BusinessRegistry>,
        document: Arc<dyn DocumentChecker>,
        sanctions: Vec<Arc<dyn SanctionsSource>>,
        config: GatewayConfig,
    ) -> Self {
        Self {
            identity,
            business,
            document,
            sanctions,
            config,
        }
    }

    pub async fn verify_identity(&self, request: &IdentityVerificationRequest) -> ProviderOutcome {
        let call = self.identity.verify_identity(request);
        match tokio::time::timeout(self.config.call_timeout, call).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(err)) => self.map_error(self.identity.name(), "identity", err),
            Err(_) => self.map_error(self.identity.name(), "identity", ProviderError::Timeout),
        }
    }

    pub async fn verify_business(&self, request: &BusinessVerificationRequest) -> ProviderOutcome {
        let call = self.business.verify_business(request);
        match tokio::time::timeout(self.config.call_timeout, call).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(err)) => self.map_error(self.business.name(), "business", err),
            Err(_) => self.map_error(self.business.name(), "business", ProviderError::Timeout),
        }
    }

    /// Screen against every configured list; a positive match on any list
    /// fails the whole check (logical AND of "clear").
    pub async fn check_sanctions(&self, query: &SanctionsQuery) -> ProviderOutcome {
        let reference = format!("sanctions_{}", Uuid::new_v4());
        let mut all_details = serde_json::Map::new();
        let mut min_confidence = 100.0_f64;
        let mut matched_lists: Vec<String> = Vec::new();

        for source in &self.sanctions {
            let call = source.screen(query);
            let screen = match tokio::time::timeout(self.config.call_timeout, call).await {
                Ok(Ok(screen)) => screen,
                Ok(Err(err)) => {
                    warn!(source = source.name(), error = %err, "Sanctions source failed");
                    return ProviderOutcome::error(format!(
                        "sanctions source {} failed: {err}",
                        source.name()
                    ));
                }
                Err(_) => {
                    warn!(source = source.name(), "Sanctions source timed out");
                    return ProviderOutcome::error(format!(
                        "sanctions source {} timed out",
                        source.name()
                    ));
                }
            };

            all_details.insert(source.name().to_string(), screen.details.clone());
            min_confidence = min_confidence.min(screen.confidence);
            if !screen.clear {
                matched_lists.push(source.name().to_string());
            }
        }

        if !matched_lists.is_empty() {
            return ProviderOutcome::failure(
                "match_found",
                reference,
                vec![format!("sanctions match on: {}", matched_lists.join(", "))],
            )
            .with_details(json!({ "sources": all_details, "matched": matched_lists }));
        }

        let mut outcome = ProviderOutcome::clear(min_confidence, reference);
        outcome.details = json!({ "sources": all_details });
        outcome
    }

    pub async fn check_document(&self, request: &DocumentCheckRequest) -> AuthenticityOutcome {
        let call = self.document.check_document(request);
        match tokio::time::timeout(self.config.call_timeout, call).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(err)) => {
                warn!(provider = self.document.name(), error = %err, "Document check failed");
                AuthenticityOutcome::rejected(
                    self.document.name(),
                    String::new(),
                    format!("document check failed: {err}"),
                    "PROVIDER_ERROR",
                )
            }
            Err(_) => {
                warn!(provider = self.document.name(), "Document check timed out");
                AuthenticityOutcome::rejected(
                    self.document.name(),
                    String::new(),
                    "document check timed out",
                    "PROVIDER_TIMEOUT",
                )
            }
        }
    }

    fn map_error(&self, provider: &str, operation: &str, err: ProviderError) -> ProviderOutcome {
        warn!(provider, operation, error = %err, "Provider call failed");
        ProviderOutcome::error(format!("{operation} verification via {provider} failed: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stubs::{
        InMemorySanctionsList, StaticBusinessRegistry, StaticDocumentChecker,
        StaticIdentityProvider,
    };
    use chrono::NaiveDate;

    fn gateway_with_lists(lists: Vec<Arc<dyn SanctionsSource>>) -> ProviderGateway {
        ProviderGateway::new(
            Arc::new(StaticIdentityProvider::clear()),
            Arc::new(StaticBusinessRegistry::verified()),
            Arc::new(StaticDocumentChecker::authentic()),
            lists,
            GatewayConfig::default(),
        )
    }

    fn query(name: &str) -> SanctionsQuery {
        SanctionsQuery {
            full_name: name.to_string(),
            date_of_birth: NaiveDate::from_ymd_opt(1990, 1, 1),
            nationality: Some("United States".into()),
        }
    }

    #[tokio::test]
    async fn all_lists_clear_means_clear() {
        let gateway = gateway_with_lists(vec![
            Arc::new(InMemorySanctionsList::new("ofac")),
            Arc::new(InMemorySanctionsList::new("eu")),
            Arc::new(InMemorySanctionsList::new("un")),
        ]);
        let outcome = gateway.check_sanctions(&query("John Doe")).await;
        assert!(outcome.success);
        assert_eq!(outcome.status, "clear");
    }

    #[tokio::test]
    async fn any_list_match_fails_the_whole_check() {
        let mut eu = InMemorySanctionsList::new("eu");
        eu.add_entry("Bad Actor");
        let gateway = gateway_with_lists(vec![
            Arc::new(InMemorySanctionsList::new("ofac")),
            Arc::new(eu),
        ]);
        let outcome = gateway.check_sanctions(&query("Bad Actor")).await;
        assert!(!outcome.success);
        assert_eq!(outcome.status, "match_found");
    }

    #[tokio::test]
    async fn identity_provider_error_becomes_error_outcome() {
        let gateway = ProviderGateway::new(
            Arc::new(StaticIdentityProvider::failing("connection reset")),
            Arc::new(StaticBusinessRegistry::verified()),
            Arc::new(StaticDocumentChecker::authentic()),
            vec![],
            GatewayConfig::default(),
        );
        let request = IdentityVerificationRequest {
            first_name: Some("John".into()),
            last_name: Some("Doe".into()),
            date_of_birth: None,
            nationality: None,
            document_type: kyc_types::DocumentType::Passport,
            document_number: None,
            document_path: "p.jpg".into(),
            selfie_path: None,
        };
        let outcome = gateway.verify_identity(&request).await;
        assert!(!outcome.success);
        assert_eq!(outcome.status, "error");
        assert!(!outcome.errors.is_empty());
    }
}
