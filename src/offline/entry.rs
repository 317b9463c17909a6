//! One queued offline snapshot.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::progress::OnboardingRecord;

/// Sync state of a queued entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    /// Captured, awaiting submission.
    Pending,
    /// Accepted by the remote endpoint.
    Synced,
    /// Rejected or lost in transport; kept for a manual retry.
    Failed,
}

/// A snapshot of the onboarding record captured while disconnected.
///
/// Stored format: the payload under `onboardingData`, the capture time as
/// epoch milliseconds under `timestamp`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OfflineEntry {
    /// Queue-local identity; sync passes match status writes on it.
    /// Defaulted on load so queues saved without ids stay readable.
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    #[serde(rename = "onboardingData")]
    pub payload: OnboardingRecord,
    #[serde(rename = "timestamp", with = "chrono::serde::ts_milliseconds")]
    pub captured_at: DateTime<Utc>,
    #[serde(rename = "syncStatus")]
    pub sync_status: SyncStatus,
}

impl OfflineEntry {
    /// A fresh pending entry captured now.
    pub fn pending(payload: OnboardingRecord) -> Self {
        Self {
            id: Uuid::new_v4(),
            payload,
            captured_at: Utc::now(),
            sync_status: SyncStatus::Pending,
        }
    }
}
