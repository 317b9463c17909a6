//! The offline outbox: a bounded, durable queue of snapshots awaiting
//! remote sync.

use std::collections::VecDeque;
use std::sync::Arc;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::capability::{ConnectivityMonitor, DurableStore};
use crate::config::ProgressConfig;
use crate::progress::OnboardingRecord;

use super::entry::{OfflineEntry, SyncStatus};
use super::sync::SyncClient;

/// Durable-storage key for the queue.
pub const OFFLINE_KEY: &str = "ki-offline-data";

/// Outcome of one sync pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub attempted: usize,
    pub synced: usize,
    pub failed: usize,
}

/// Ordered queue of offline captures, bounded at
/// [`ProgressConfig::max_offline_entries`] with oldest-first eviction.
/// Persisted to durable storage after every mutation.
pub struct OfflineOutbox {
    store: Arc<dyn DurableStore>,
    connectivity: Arc<dyn ConnectivityMonitor>,
    client: Arc<dyn SyncClient>,
    config: ProgressConfig,
    entries: RwLock<VecDeque<OfflineEntry>>,
}

impl OfflineOutbox {
    /// Open the outbox, loading any persisted queue. A missing or corrupt
    /// queue reads as empty.
    pub async fn open(
        store: Arc<dyn DurableStore>,
        connectivity: Arc<dyn ConnectivityMonitor>,
        client: Arc<dyn SyncClient>,
        config: ProgressConfig,
    ) -> Arc<Self> {
        let entries = match store.get(OFFLINE_KEY).await {
            Ok(Some(raw)) => match serde_json::from_str::<VecDeque<OfflineEntry>>(&raw) {
                Ok(entries) => {
                    debug!(count = entries.len(), "loaded offline queue");
                    entries
                }
                Err(e) => {
                    warn!(error = %e, "ignoring corrupt offline queue");
                    VecDeque::new()
                }
            },
            Ok(None) => VecDeque::new(),
            Err(e) => {
                warn!(error = %e, "failed to read offline queue");
                VecDeque::new()
            }
        };
        Arc::new(Self {
            store,
            connectivity,
            client,
            config,
            entries: RwLock::new(entries),
        })
    }

    pub async fn entries(&self) -> Vec<OfflineEntry> {
        self.entries.read().await.iter().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    pub async fn has_pending(&self) -> bool {
        self.entries
            .read()
            .await
            .iter()
            .any(|e| e.sync_status == SyncStatus::Pending)
    }

    /// Append a pending snapshot captured now, evicting the oldest entries
    /// down to capacity, then persist the queue.
    pub async fn enqueue(&self, snapshot: OnboardingRecord) {
        {
            let mut entries = self.entries.write().await;
            entries.push_back(OfflineEntry::pending(snapshot));
            while entries.len() > self.config.max_offline_entries {
                entries.pop_front();
            }
            info!(count = entries.len(), "offline snapshot queued");
        }
        self.persist_queue().await;
    }

    /// One sync pass: submit every `Pending` entry sequentially, marking
    /// each `Synced` or `Failed`, then persist the statuses. A no-op while
    /// offline; no network calls are attempted.
    ///
    /// Entries already marked `Failed` are left alone here; they are only
    /// retried through an explicit [`retry_failed`](Self::retry_failed).
    pub async fn sync(&self) -> SyncReport {
        if !self.connectivity.is_online() {
            debug!("offline, skipping sync pass");
            return SyncReport::default();
        }

        let pending: Vec<OfflineEntry> = self
            .entries
            .read()
            .await
            .iter()
            .filter(|e| e.sync_status == SyncStatus::Pending)
            .cloned()
            .collect();
        if pending.is_empty() {
            return SyncReport::default();
        }

        let mut report = SyncReport {
            attempted: pending.len(),
            ..SyncReport::default()
        };
        for entry in pending {
            let status = match self.client.submit(&entry).await {
                Ok(()) => {
                    report.synced += 1;
                    SyncStatus::Synced
                }
                Err(e) => {
                    warn!(error = %e, "offline entry sync failed");
                    report.failed += 1;
                    SyncStatus::Failed
                }
            };
            let mut entries = self.entries.write().await;
            if let Some(stored) = entries.iter_mut().find(|s| s.id == entry.id) {
                stored.sync_status = status;
            }
        }

        self.persist_queue().await;
        info!(
            attempted = report.attempted,
            synced = report.synced,
            failed = report.failed,
            "sync pass finished"
        );
        report
    }

    /// Manual retry: re-mark every `Failed` entry as `Pending`, then run a
    /// sync pass.
    pub async fn retry_failed(&self) -> SyncReport {
        {
            let mut entries = self.entries.write().await;
            for entry in entries.iter_mut() {
                if entry.sync_status == SyncStatus::Failed {
                    entry.sync_status = SyncStatus::Pending;
                }
            }
        }
        self.sync().await
    }

    /// Empty the queue and delete its durable key.
    pub async fn clear(&self) {
        self.entries.write().await.clear();
        if let Err(e) = self.store.remove(OFFLINE_KEY).await {
            warn!(error = %e, "failed to clear offline queue");
        }
        info!("offline queue cleared");
    }

    async fn persist_queue(&self) {
        let json = {
            let entries = self.entries.read().await;
            match serde_json::to_string(&*entries) {
                Ok(json) => json,
                Err(e) => {
                    warn!(error = %e, "failed to serialize offline queue");
                    return;
                }
            }
        };
        if let Err(e) = self.store.put(OFFLINE_KEY, &json).await {
            warn!(error = %e, "failed to save offline queue");
        }
    }

    /// Auto-sync on reconnect: when connectivity flips offline→online and
    /// the queue has pending entries, wait out the debounce window,
    /// re-check the link, then run a sync pass.
    pub fn spawn_auto_sync(self: &Arc<Self>) -> JoinHandle<()> {
        let weak = Arc::downgrade(self);
        let mut rx = self.connectivity.watch();
        let debounce = self.config.sync_debounce;
        tokio::spawn(async move {
            let mut was_online = *rx.borrow();
            while rx.changed().await.is_ok() {
                let online = *rx.borrow();
                let came_online = online && !was_online;
                was_online = online;
                if !came_online {
                    continue;
                }
                let Some(outbox) = weak.upgrade() else {
                    break;
                };
                if !outbox.has_pending().await {
                    continue;
                }
                debug!("reconnected with pending entries, debouncing before sync");
                tokio::time::sleep(debounce).await;
                if outbox.connectivity.is_online() {
                    outbox.sync().await;
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque as Script;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;

    use crate::capability::{MemoryStore, SharedConnectivity};
    use crate::error::SyncError;
    use crate::progress::FieldUpdate;

    use super::*;

    /// Sync client with scripted outcomes; default accepts everything.
    struct FakeSyncClient {
        script: Mutex<Script<Result<(), SyncError>>>,
        calls: AtomicUsize,
    }

    impl FakeSyncClient {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                script: Mutex::new(Script::new()),
                calls: AtomicUsize::new(0),
            })
        }

        fn script(&self, results: impl IntoIterator<Item = Result<(), SyncError>>) {
            self.script.lock().unwrap().extend(results);
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl SyncClient for FakeSyncClient {
        async fn submit(&self, _entry: &OfflineEntry) -> Result<(), SyncError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.script.lock().unwrap().pop_front().unwrap_or(Ok(()))
        }
    }

    struct Harness {
        outbox: Arc<OfflineOutbox>,
        backing: Arc<MemoryStore>,
        connectivity: Arc<SharedConnectivity>,
        client: Arc<FakeSyncClient>,
    }

    async fn harness_online(online: bool) -> Harness {
        let backing = Arc::new(MemoryStore::new());
        let connectivity = SharedConnectivity::new(online);
        let client = FakeSyncClient::new();
        let outbox = OfflineOutbox::open(
            Arc::clone(&backing) as Arc<dyn DurableStore>,
            connectivity.clone(),
            client.clone(),
            ProgressConfig::default(),
        )
        .await;
        Harness {
            outbox,
            backing,
            connectivity,
            client,
        }
    }

    fn snapshot(name: &str) -> OnboardingRecord {
        let mut record = OnboardingRecord::fresh();
        record.apply(FieldUpdate::Name(name.to_string()));
        record
    }

    #[tokio::test]
    async fn overflow_evicts_oldest_first() {
        let h = harness_online(false).await;

        for i in 1..=11 {
            h.outbox.enqueue(snapshot(&format!("user-{i}"))).await;
        }

        let entries = h.outbox.entries().await;
        assert_eq!(entries.len(), 10);
        assert_eq!(entries[0].payload.name, "user-2", "oldest entry evicted");
        assert_eq!(entries[9].payload.name, "user-11");
    }

    #[tokio::test]
    async fn sync_while_offline_attempts_nothing() {
        let h = harness_online(false).await;
        h.outbox.enqueue(snapshot("ava")).await;

        let report = h.outbox.sync().await;

        assert_eq!(report, SyncReport::default());
        assert_eq!(h.client.calls(), 0);
        assert!(
            h.outbox
                .entries()
                .await
                .iter()
                .all(|e| e.sync_status == SyncStatus::Pending)
        );
    }

    #[tokio::test]
    async fn sync_marks_accepted_entries_synced() {
        let h = harness_online(true).await;
        h.outbox.enqueue(snapshot("ava")).await;
        h.outbox.enqueue(snapshot("ben")).await;

        let report = h.outbox.sync().await;

        assert_eq!(report.attempted, 2);
        assert_eq!(report.synced, 2);
        assert_eq!(report.failed, 0);
        assert!(
            h.outbox
                .entries()
                .await
                .iter()
                .all(|e| e.sync_status == SyncStatus::Synced)
        );
    }

    #[tokio::test]
    async fn rejected_entry_becomes_failed_and_is_kept() {
        let h = harness_online(true).await;
        h.client.script([Err(SyncError::Status(500))]);
        h.outbox.enqueue(snapshot("ava")).await;

        let report = h.outbox.sync().await;

        assert_eq!(report.failed, 1);
        let entries = h.outbox.entries().await;
        assert_eq!(entries.len(), 1, "no entries lost");
        assert_eq!(entries[0].sync_status, SyncStatus::Failed);
    }

    #[tokio::test]
    async fn plain_sync_skips_failed_entries() {
        let h = harness_online(true).await;
        h.client.script([Err(SyncError::Transport("reset".into()))]);
        h.outbox.enqueue(snapshot("ava")).await;
        h.outbox.sync().await;
        assert_eq!(h.client.calls(), 1);

        // Second pass has nothing pending, so nothing is attempted.
        assert!(!h.outbox.has_pending().await);
        let report = h.outbox.sync().await;
        assert_eq!(report.attempted, 0);
        assert_eq!(h.client.calls(), 1);
    }

    #[tokio::test]
    async fn retry_failed_repends_and_syncs() {
        let h = harness_online(true).await;
        h.client.script([Err(SyncError::Status(503))]);
        h.outbox.enqueue(snapshot("ava")).await;
        h.outbox.sync().await;
        assert_eq!(
            h.outbox.entries().await[0].sync_status,
            SyncStatus::Failed
        );

        let report = h.outbox.retry_failed().await;

        assert_eq!(report.attempted, 1);
        assert_eq!(report.synced, 1);
        assert!(!h.outbox.has_pending().await);
        assert_eq!(
            h.outbox.entries().await[0].sync_status,
            SyncStatus::Synced
        );
    }

    #[tokio::test]
    async fn entries_sharing_a_capture_time_get_distinct_statuses() {
        // A reloaded queue only has millisecond capture times, so two
        // entries saved within the same millisecond are distinguishable
        // by id alone.
        let backing = Arc::new(MemoryStore::new());
        let stored = serde_json::json!([
            {
                "onboardingData": snapshot("ava"),
                "timestamp": 1_700_000_000_000i64,
                "syncStatus": "pending"
            },
            {
                "onboardingData": snapshot("ben"),
                "timestamp": 1_700_000_000_000i64,
                "syncStatus": "pending"
            }
        ]);
        backing.put(OFFLINE_KEY, &stored.to_string()).await.unwrap();

        let connectivity = SharedConnectivity::new(true);
        let client = FakeSyncClient::new();
        client.script([Err(SyncError::Status(500)), Ok(())]);
        let outbox = OfflineOutbox::open(
            backing,
            connectivity,
            client.clone(),
            ProgressConfig::default(),
        )
        .await;

        let report = outbox.sync().await;

        assert_eq!(report.attempted, 2);
        let entries = outbox.entries().await;
        assert_eq!(entries[0].sync_status, SyncStatus::Failed);
        assert_eq!(entries[1].sync_status, SyncStatus::Synced);
    }

    #[tokio::test]
    async fn queue_survives_reload() {
        let h = harness_online(false).await;
        h.outbox.enqueue(snapshot("ava")).await;
        h.outbox.enqueue(snapshot("ben")).await;

        let reloaded = OfflineOutbox::open(
            Arc::clone(&h.backing) as Arc<dyn DurableStore>,
            h.connectivity.clone(),
            h.client.clone(),
            ProgressConfig::default(),
        )
        .await;

        let entries = reloaded.entries().await;
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].payload.name, "ava");
        assert_eq!(entries[1].payload.name, "ben");
    }

    #[tokio::test]
    async fn clear_empties_queue_and_deletes_key() {
        let h = harness_online(false).await;
        h.outbox.enqueue(snapshot("ava")).await;
        assert!(h.backing.get(OFFLINE_KEY).await.unwrap().is_some());

        h.outbox.clear().await;

        assert!(h.outbox.is_empty().await);
        assert!(h.backing.get(OFFLINE_KEY).await.unwrap().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn auto_sync_runs_after_reconnect_debounce() {
        let h = harness_online(false).await;
        h.outbox.enqueue(snapshot("ava")).await;
        let _task = h.outbox.spawn_auto_sync();
        tokio::time::sleep(Duration::from_millis(10)).await;

        h.connectivity.set_online(true);
        tokio::time::sleep(Duration::from_millis(1900)).await;
        assert_eq!(h.client.calls(), 0, "still inside the debounce window");

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(h.client.calls(), 1);
        assert_eq!(
            h.outbox.entries().await[0].sync_status,
            SyncStatus::Synced
        );
    }

    #[tokio::test(start_paused = true)]
    async fn auto_sync_aborts_if_link_drops_during_debounce() {
        let h = harness_online(false).await;
        h.outbox.enqueue(snapshot("ava")).await;
        let _task = h.outbox.spawn_auto_sync();
        tokio::time::sleep(Duration::from_millis(10)).await;

        h.connectivity.set_online(true);
        tokio::time::sleep(Duration::from_millis(1000)).await;
        h.connectivity.set_online(false);
        tokio::time::sleep(Duration::from_millis(2000)).await;

        assert_eq!(h.client.calls(), 0);
        assert_eq!(
            h.outbox.entries().await[0].sync_status,
            SyncStatus::Pending
        );
    }

    #[tokio::test(start_paused = true)]
    async fn auto_sync_skips_empty_queue() {
        let h = harness_online(false).await;
        let _task = h.outbox.spawn_auto_sync();
        tokio::time::sleep(Duration::from_millis(10)).await;

        h.connectivity.set_online(true);
        tokio::time::sleep(Duration::from_millis(2500)).await;

        assert_eq!(h.client.calls(), 0);
    }
}
