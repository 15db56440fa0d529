//! Pipeline tuning.

/// Upload validation rules.
#[derive(Clone, Debug)]
pub struct DocumentPolicy {
    pub allowed_mime_types: Vec<String>,
    pub max_file_size: u64,
}

impl Default for DocumentPolicy {
    fn default() -> Self {
        Self {
            allowed_mime_types: vec![
                "image/jpeg".to_string(),
                "image/png".to_string(),
                "image/webp".to_string(),
                "application/pdf".to_string(),
            ],
            max_file_size: 10 * 1024 * 1024,
        }
    }
}

impl DocumentPolicy {
    pub fn allows_mime(&self, mime_type: &str) -> bool {
        self.allowed_mime_types.iter().any(|m| m == mime_type)
    }
}

/// Validity window applied on approval.
#[derive(Clone, Copy, Debug)]
pub struct ApprovalPolicy {
    /// Days until an approval lapses.
    pub validity_days: i64,
    /// Days until the record is due for periodic re-review.
    pub next_review_days: i64,
}

impl Default for ApprovalPolicy {
    fn default() -> Self {
        Self {
            validity_days: 365,
            next_review_days: 330,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_mime_allowlist() {
        let policy = DocumentPolicy::default();
        assert!(policy.allows_mime("image/jpeg"));
        assert!(policy.allows_mime("application/pdf"));
        assert!(!policy.allows_mime("image/gif"));
        assert!(!policy.allows_mime("application/zip"));
    }

    #[test]
    fn review_precedes_expiry() {
        let policy = ApprovalPolicy::default();
        assert!(policy.next_review_days < policy.validity_days);
    }
}
