//! Persistence seam for the KYC pipeline.
//!
//! The managers and workers only talk to [`VerificationStore`] and
//! [`DocumentStore`]; a database-backed implementation plugs in behind the
//! same traits. The in-memory implementations here keep secondary indexes by
//! owning entity and are used for tests, local demos, and embedding.

mod memory;
mod traits;

pub use memory::{InMemoryDocumentStore, InMemoryVerificationStore};
pub use traits::{DocumentStore, VerificationFilter, VerificationStore};
