//! Configuration types.

use std::time::Duration;

use crate::capability::RecognizerSettings;

/// Tuning for the input-mode controller.
#[derive(Debug, Clone)]
pub struct InputConfig {
    /// Session configuration handed to the recognizer on every start.
    pub recognizer: RecognizerSettings,
    /// Minimum recognizer confidence for a silence-timeout auto-send.
    /// Below this, the transcript is retained for manual confirmation.
    pub min_confidence: f32,
    /// Whether the silence timeout auto-dispatches the transcript at all.
    pub auto_send: bool,
    /// Silence window after the last recognizer result before the session
    /// is stopped automatically.
    pub silence_timeout: Duration,
    /// How long a surfaced recognition error stays visible before it
    /// clears itself.
    pub error_clear_after: Duration,
    /// Delay before the single stop-then-restart retry when `start()`
    /// reports an already-active session.
    pub start_retry_delay: Duration,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            recognizer: RecognizerSettings::default(),
            min_confidence: 0.7,
            auto_send: true,
            silence_timeout: Duration::from_millis(2000),
            error_clear_after: Duration::from_millis(5000),
            start_retry_delay: Duration::from_millis(2000),
        }
    }
}

/// Tuning for progress persistence and the offline queue.
#[derive(Debug, Clone)]
pub struct ProgressConfig {
    /// Auto-persist interval. Each tick persists only if the record has at
    /// least one user-visible field filled in.
    pub autosave_interval: Duration,
    /// Offline queue capacity. Oldest entries are evicted first on overflow.
    pub max_offline_entries: usize,
    /// Debounce after an offline-to-online transition before auto-sync
    /// runs. Connectivity is re-checked when the window elapses.
    pub sync_debounce: Duration,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            autosave_interval: Duration::from_secs(30),
            max_offline_entries: 10,
            sync_debounce: Duration::from_millis(2000),
        }
    }
}
