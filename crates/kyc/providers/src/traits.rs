use async_trait::async_trait;
use thiserror::Error;

use crate::wire::{
    AuthenticityOutcome, BusinessVerificationRequest, DocumentCheckRequest,
    IdentityVerificationRequest, ProviderOutcome, SanctionsQuery, SanctionsScreen,
};

/// Transport or protocol failure talking to an external provider.
///
/// These never leave the gateway: [`crate::ProviderGateway`] converts them
/// into non-success outcomes.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProviderError {
    #[error("provider call timed out")]
    Timeout,

    #[error("network error: {0}")]
    Network(String),

    #[error("provider protocol error: {0}")]
    Protocol(String),

    #[error("provider not configured: {0}")]
    NotConfigured(String),
}

/// External identity verification capability (Onfido/Jumio class services).
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn verify_identity(
        &self,
        request: &IdentityVerificationRequest,
    ) -> Result<ProviderOutcome, ProviderError>;
}

/// External business-registry capability (OpenCorporates class services).
#[async_trait]
pub trait BusinessRegistry: Send + Sync {
    fn name(&self) -> &str;

    async fn verify_business(
        &self,
        request: &BusinessVerificationRequest,
    ) -> Result<ProviderOutcome, ProviderError>;
}

/// One restricted-party list (OFAC, EU, UN, ...). The gateway screens
/// against every configured source and ANDs the results.
#[async_trait]
pub trait SanctionsSource: Send + Sync {
    fn name(&self) -> &str;

    async fn screen(&self, query: &SanctionsQuery) -> Result<SanctionsScreen, ProviderError>;
}

/// Per-document authenticity check capability.
#[async_trait]
pub trait DocumentChecker: Send + Sync {
    fn name(&self) -> &str;

    async fn check_document(
        &self,
        request: &DocumentCheckRequest,
    ) -> Result<AuthenticityOutcome, ProviderError>;
}
