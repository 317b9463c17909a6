//! Remote submission of queued snapshots.

use async_trait::async_trait;
use chrono::Utc;
use tracing::debug;

use crate::error::SyncError;

use super::entry::OfflineEntry;

/// The remote side of offline reconciliation. One call per queued entry;
/// any 2xx response counts as accepted.
#[async_trait]
pub trait SyncClient: Send + Sync {
    async fn submit(&self, entry: &OfflineEntry) -> Result<(), SyncError>;
}

/// HTTP submission to the onboarding sync endpoint.
///
/// The body is the onboarding payload with `offlineTimestamp` (capture time
/// in epoch milliseconds) and `syncedAt` (submission time, RFC 3339) merged
/// in.
pub struct HttpSyncClient {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpSyncClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }

    fn body_for(entry: &OfflineEntry) -> serde_json::Value {
        let mut body = serde_json::to_value(&entry.payload)
            .unwrap_or_else(|_| serde_json::json!({}));
        if let Some(obj) = body.as_object_mut() {
            obj.insert(
                "offlineTimestamp".to_string(),
                entry.captured_at.timestamp_millis().into(),
            );
            obj.insert("syncedAt".to_string(), Utc::now().to_rfc3339().into());
        }
        body
    }
}

#[async_trait]
impl SyncClient for HttpSyncClient {
    async fn submit(&self, entry: &OfflineEntry) -> Result<(), SyncError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&Self::body_for(entry))
            .send()
            .await
            .map_err(|e| SyncError::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            debug!(%status, "offline entry accepted");
            Ok(())
        } else {
            Err(SyncError::Status(status.as_u16()))
        }
    }
}
