//! Provider gateway: the abstraction boundary over external identity,
//! business-registry, sanctions-screening, and document-authenticity
//! services.
//!
//! Concrete providers implement the capability traits and are swappable
//! without touching callers. The [`ProviderGateway`] wraps every call in a
//! timeout and maps network/provider failures into non-success outcome
//! values, so pipeline stages always receive an explicit result to make a
//! fail-closed decision on. Provider errors never propagate as `Err` past
//! this crate.

mod gateway;
mod stubs;
mod traits;
mod wire;

pub use gateway::{GatewayConfig, ProviderGateway};
pub use stubs::{
    InMemorySanctionsList, StaticBusinessRegistry, StaticDocumentChecker, StaticIdentityProvider,
};
pub use traits::{
    BusinessRegistry, DocumentChecker, IdentityProvider, ProviderError, SanctionsSource,
};
pub use wire::{
    AuthenticityOutcome, BusinessVerificationRequest, DocumentCheckRequest,
    IdentityVerificationRequest, ProviderOutcome, SanctionsQuery, SanctionsScreen,
};
