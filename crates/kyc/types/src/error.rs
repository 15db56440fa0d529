use thiserror::Error;

use crate::document::DocumentType;

/// Error taxonomy shared by the synchronous KYC surface.
///
/// Provider failures never appear here: the gateway maps them into
/// non-success outcome values so pipeline stages decide fail-closed.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum KycError {
    /// Bad input rejected synchronously, never retried.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Duplicate active verification or duplicate document type.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Unknown verification or document id, optionally scoped by merchant.
    #[error("not found: {0}")]
    NotFound(String),

    /// Operation not valid for the record's current status.
    #[error("invalid state: {0}")]
    State(String),

    /// Submission blocked by an incomplete required-document set.
    #[error("missing required documents: {}", format_missing(.0))]
    MissingDocuments(Vec<String>),

    /// Unexpected failure inside a worker or collaborator.
    #[error("system error: {0}")]
    System(String),
}

impl KycError {
    pub fn missing_documents(slots: impl IntoIterator<Item = String>) -> Self {
        KycError::MissingDocuments(slots.into_iter().collect())
    }

    pub fn duplicate_document(ty: DocumentType) -> Self {
        KycError::Conflict(format!("document of type {ty} already exists"))
    }
}

fn format_missing(slots: &[String]) -> String {
    slots.join(", ")
}

pub type KycResult<T> = Result<T, KycError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_documents_message_names_each_slot() {
        let err = KycError::missing_documents(vec![
            "passport|drivers_license|national_id".to_string(),
            "proof_of_address".to_string(),
        ]);
        let message = err.to_string();
        assert!(message.contains("proof_of_address"));
        assert!(message.contains("passport|drivers_license|national_id"));
    }
}
