//! Storage and notification seams.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use kyc_types::{DocumentType, KycError, KycResult, MerchantId};
use serde::{Deserialize, Serialize};

/// Object storage for uploaded document files.
#[async_trait]
pub trait BlobStorage: Send + Sync {
    async fn put(&self, path: &str, bytes: &[u8]) -> KycResult<()>;
    async fn get(&self, path: &str) -> KycResult<Option<Vec<u8>>>;
    async fn delete(&self, path: &str) -> KycResult<()>;
}

/// In-memory blob storage used for tests, local demos, and embedding.
#[derive(Default)]
pub struct InMemoryBlobStorage {
    inner: Mutex<HashMap<String, Vec<u8>>>,
}

impl InMemoryBlobStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> KycResult<std::sync::MutexGuard<'_, HashMap<String, Vec<u8>>>> {
        self.inner
            .lock()
            .map_err(|_| KycError::System("blob storage lock poisoned".into()))
    }
}

#[async_trait]
impl BlobStorage for InMemoryBlobStorage {
    async fn put(&self, path: &str, bytes: &[u8]) -> KycResult<()> {
        self.lock()?.insert(path.to_string(), bytes.to_vec());
        Ok(())
    }

    async fn get(&self, path: &str) -> KycResult<Option<Vec<u8>>> {
        Ok(self.lock()?.get(path).cloned())
    }

    async fn delete(&self, path: &str) -> KycResult<()> {
        self.lock()?.remove(path);
        Ok(())
    }
}

/// Merchant-facing event emitted at each visible outcome.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Notification {
    VerificationStarted,
    VerificationApproved {
        expires_at: DateTime<Utc>,
    },
    VerificationRejected {
        reason: String,
    },
    ResubmissionRequested {
        notes: String,
    },
    VerificationUnderReview,
    VerificationExpired,
    DocumentRejected {
        document_type: DocumentType,
        reason: String,
    },
}

/// Delivery seam for merchant notifications. Failures are logged by the
/// caller and never block the pipeline.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, merchant_id: MerchantId, notification: Notification) -> KycResult<()>;
}

/// Captures notifications in memory for assertions.
#[derive(Default)]
pub struct RecordingNotifier {
    inner: Mutex<Vec<(MerchantId, Notification)>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<(MerchantId, Notification)> {
        self.inner.lock().map(|v| v.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, merchant_id: MerchantId, notification: Notification) -> KycResult<()> {
        self.inner
            .lock()
            .map_err(|_| KycError::System("notifier lock poisoned".into()))?
            .push((merchant_id, notification));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn blob_storage_round_trip() {
        let storage = InMemoryBlobStorage::new();
        storage.put("a/b.jpg", b"bytes").await.unwrap();
        assert_eq!(storage.get("a/b.jpg").await.unwrap(), Some(b"bytes".to_vec()));
        storage.delete("a/b.jpg").await.unwrap();
        assert_eq!(storage.get("a/b.jpg").await.unwrap(), None);
    }

    #[tokio::test]
    async fn recording_notifier_captures_events() {
        let notifier = RecordingNotifier::new();
        let merchant = MerchantId::new();
        notifier
            .notify(merchant, Notification::VerificationExpired)
            .await
            .unwrap();
        let sent = notifier.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, merchant);
    }
}
