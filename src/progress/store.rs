//! The progress store owns the live onboarding record, persists it under
//! one durable key, and answers the resume-or-start-over question on load.
//!
//! Storage failures never reach the caller: the in-memory record is the
//! source of truth and a failed write just means nothing was saved this
//! time.

use std::sync::Arc;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::capability::DurableStore;
use crate::config::ProgressConfig;

use super::record::{FieldUpdate, OnboardingRecord};
use super::steps::OnboardingStep;

/// Durable-storage key for the progress snapshot.
pub const PROGRESS_KEY: &str = "ki-onboarding-progress";

/// Maintains one mutable [`OnboardingRecord`] across the intake flow.
pub struct ProgressStore {
    store: Arc<dyn DurableStore>,
    config: ProgressConfig,
    record: RwLock<OnboardingRecord>,
    /// Last known saved snapshot, used for the resume prompt.
    saved: RwLock<Option<OnboardingRecord>>,
}

impl ProgressStore {
    /// Open the store, reading any prior snapshot for the resume prompt.
    /// The live record starts fresh; call [`restore`](Self::restore) to
    /// adopt the snapshot.
    pub async fn open(store: Arc<dyn DurableStore>, config: ProgressConfig) -> Arc<Self> {
        let saved = read_snapshot(store.as_ref()).await;
        if saved.is_some() {
            debug!("found saved onboarding progress");
        }
        Arc::new(Self {
            store,
            config,
            record: RwLock::new(OnboardingRecord::fresh()),
            saved: RwLock::new(saved),
        })
    }

    /// Snapshot of the live record.
    pub async fn record(&self) -> OnboardingRecord {
        self.record.read().await.clone()
    }

    /// Current 0-based step index.
    pub async fn current_step(&self) -> usize {
        self.record.read().await.last_active_step
    }

    pub async fn has_saved_progress(&self) -> bool {
        self.saved.read().await.is_some()
    }

    pub async fn saved_snapshot(&self) -> Option<OnboardingRecord> {
        self.saved.read().await.clone()
    }

    /// Whether the caller should surface a resume-or-start-over decision
    /// before allowing further input: a snapshot exists and its name field
    /// is filled in. Resume via [`restore`](Self::restore), start over via
    /// [`clear`](Self::clear); both are valid choices.
    pub async fn should_prompt_resume(&self) -> bool {
        self.saved
            .read()
            .await
            .as_ref()
            .is_some_and(|s| !s.name.is_empty())
    }

    // ── Mutations ───────────────────────────────────────────────────

    /// Set one field and stamp `last_updated`. Does not persist.
    pub async fn update_field(&self, update: FieldUpdate) {
        self.record.write().await.apply(update);
    }

    /// Move to a step index, clamped to `[0, TOTAL - 1]`.
    pub async fn advance_step(&self, index: usize) {
        let clamped = index.min(OnboardingStep::TOTAL - 1);
        let mut record = self.record.write().await;
        record.last_active_step = clamped;
        record.last_updated = chrono::Utc::now();
        debug!(step = clamped, "active step changed");
    }

    /// Record a step as completed. Idempotent.
    pub async fn mark_step_completed(&self, step: OnboardingStep) {
        let mut record = self.record.write().await;
        record.completed_steps.insert(step.id().to_string());
        record.last_updated = chrono::Utc::now();
    }

    // ── Persistence ─────────────────────────────────────────────────

    /// Serialize the full record under [`PROGRESS_KEY`], replacing any
    /// prior value, and refresh the saved snapshot.
    pub async fn persist(&self) {
        let record = self.record.read().await.clone();
        let json = match serde_json::to_string(&record) {
            Ok(json) => json,
            Err(e) => {
                warn!(error = %e, "failed to serialize onboarding progress");
                return;
            }
        };
        if let Err(e) = self.store.put(PROGRESS_KEY, &json).await {
            warn!(error = %e, "failed to save onboarding progress");
            return;
        }
        *self.saved.write().await = Some(record);
        debug!("onboarding progress saved");
    }

    /// Load the durable snapshot, if any, into the live record and resume
    /// from its saved step. An absent, corrupt, or unparsable snapshot
    /// reads as "no saved progress"; this never errors to the caller.
    pub async fn restore(&self) {
        let Some(snapshot) = read_snapshot(self.store.as_ref()).await else {
            return;
        };
        info!(step = snapshot.last_active_step, "resuming saved onboarding progress");
        *self.record.write().await = snapshot.clone();
        *self.saved.write().await = Some(snapshot);
    }

    /// Delete the durable snapshot and reset the live record to a fresh
    /// default.
    pub async fn clear(&self) {
        if let Err(e) = self.store.remove(PROGRESS_KEY).await {
            warn!(error = %e, "failed to clear onboarding progress");
        }
        *self.record.write().await = OnboardingRecord::fresh();
        *self.saved.write().await = None;
        info!("onboarding progress cleared");
    }

    /// Periodic auto-persist. Each tick persists only when at least one
    /// user-visible field is non-empty.
    pub fn spawn_autosave(self: &Arc<Self>) -> JoinHandle<()> {
        let weak = Arc::downgrade(self);
        let interval = self.config.autosave_interval;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                let Some(store) = weak.upgrade() else {
                    break;
                };
                if store.record.read().await.has_content() {
                    store.persist().await;
                }
            }
        })
    }
}

async fn read_snapshot(store: &dyn DurableStore) -> Option<OnboardingRecord> {
    let raw = match store.get(PROGRESS_KEY).await {
        Ok(raw) => raw?,
        Err(e) => {
            warn!(error = %e, "failed to read onboarding progress");
            return None;
        }
    };
    match serde_json::from_str(&raw) {
        Ok(record) => Some(record),
        Err(e) => {
            warn!(error = %e, "ignoring corrupt onboarding snapshot");
            None
        }
    }
}
