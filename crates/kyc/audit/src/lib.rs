//! Append-only compliance audit trail.
//!
//! Every state-changing operation in the pipeline records an [`AuditEntry`]
//! through [`AuditTrail`]. Entries are immutable once written; sensitive
//! snapshot fields are masked before they are persisted, and each entry
//! carries a retention deadline derived from its action so expired entries
//! can be purged on schedule.

mod entry;
mod mask;
mod service;
mod store;

pub use entry::{Actor, ActorType, AuditAction, AuditEntry, RequestContext};
pub use mask::mask_sensitive_fields;
pub use service::AuditTrail;
pub use store::{AuditQuery, AuditStore, InMemoryAuditStore};
