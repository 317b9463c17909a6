//! The input-mode controller: one consistent view of idle/typing/listening
//! for a single input widget.
//!
//! Built around three rules. Exactly one mode is active at a time. Cancel
//! always wins and resets everything. A recognition failure never blocks
//! falling back to typed text.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::capability::{ConnectivityMonitor, RecognizerEvent, SpeechRecognizer};
use crate::config::InputConfig;
use crate::error::RecognitionError;

use super::keys::{Key, KeyInput};
use super::mode::InputMode;
use super::session::InputSession;
use super::timer::DelayedTask;

/// How a finalized message left the widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendMode {
    Text,
    Voice,
}

impl std::fmt::Display for SendMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Voice => write!(f, "voice"),
        }
    }
}

/// Caller-supplied send sink. Assumed not to throw; invoked outside the
/// session lock.
pub type SendCallback = Arc<dyn Fn(&str, SendMode) + Send + Sync>;

/// Owns the interaction state for one text-or-voice input field.
pub struct InputModeController {
    config: InputConfig,
    recognizer: Arc<dyn SpeechRecognizer>,
    connectivity: Arc<dyn ConnectivityMonitor>,
    on_send: SendCallback,
    session: RwLock<InputSession>,
    enabled: AtomicBool,
    silence_timer: DelayedTask,
    retry_timer: DelayedTask,
    error_clear_timer: DelayedTask,
}

impl InputModeController {
    pub fn new(
        recognizer: Arc<dyn SpeechRecognizer>,
        connectivity: Arc<dyn ConnectivityMonitor>,
        config: InputConfig,
        on_send: SendCallback,
    ) -> Arc<Self> {
        Arc::new(Self {
            config,
            recognizer,
            connectivity,
            on_send,
            session: RwLock::new(InputSession::default()),
            enabled: AtomicBool::new(true),
            silence_timer: DelayedTask::new(),
            retry_timer: DelayedTask::new(),
            error_clear_timer: DelayedTask::new(),
        })
    }

    /// Pump recognizer events into the controller until the recognizer's
    /// sender side goes away or the controller is dropped.
    pub fn spawn_event_pump(self: &Arc<Self>) -> JoinHandle<()> {
        let weak = Arc::downgrade(self);
        let mut rx = self.recognizer.subscribe();
        tokio::spawn(async move {
            loop {
                let event = match rx.recv().await {
                    Ok(event) => event,
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(missed)) => {
                        warn!(missed, "recognizer event pump lagged");
                        continue;
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                };
                let Some(controller) = weak.upgrade() else {
                    break;
                };
                controller.handle_event(event).await;
            }
        })
    }

    /// Snapshot of the current session.
    pub async fn session(&self) -> InputSession {
        self.session.read().await.clone()
    }

    pub async fn mode(&self) -> InputMode {
        self.session.read().await.mode
    }

    /// Whether voice input is available at all in this environment.
    pub fn voice_supported(&self) -> bool {
        self.recognizer.is_supported()
    }

    /// Enable or disable the widget. While disabled, every entry point is
    /// a no-op except `cancel_input`.
    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
    }

    fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    // ── Typing ──────────────────────────────────────────────────────

    /// Enter typing mode, stopping any live recognition session first.
    pub async fn start_typing(&self) {
        if !self.is_enabled() {
            return;
        }
        let mut session = self.session.write().await;
        if session.mode == InputMode::Typing {
            return;
        }
        if session.mode == InputMode::Listening {
            self.silence_timer.cancel();
            self.recognizer.stop();
            session.clear_voice();
        }
        session.enter(InputMode::Typing);
        session.last_error = None;
        debug!("input mode: typing");
    }

    /// Replace the typed buffer.
    pub async fn set_text(&self, text: impl Into<String>) {
        let mut session = self.session.write().await;
        session.text_buffer = text.into();
    }

    /// Send the trimmed text buffer, if non-empty, and return to idle.
    pub async fn send_text_message(&self) {
        let trimmed = {
            let mut session = self.session.write().await;
            let trimmed = session.text_buffer.trim().to_string();
            if trimmed.is_empty() {
                return;
            }
            session.text_buffer.clear();
            session.enter(InputMode::Idle);
            trimmed
        };
        info!(chars = trimmed.len(), "text message sent");
        (self.on_send)(&trimmed, SendMode::Text);
    }

    // ── Listening ───────────────────────────────────────────────────

    /// Begin a voice session. No-op (with an error surfaced) when
    /// recognition is unsupported or the client is offline; guarded no-op
    /// when already listening.
    pub async fn start_listening(self: &Arc<Self>) {
        if !self.is_enabled() {
            return;
        }
        if !self.recognizer.is_supported() {
            debug!("voice input unavailable: no recognition capability");
            self.surface_error(RecognitionError::Unsupported).await;
            return;
        }
        if !self.connectivity.is_online() {
            debug!("voice input unavailable: offline");
            self.surface_error(RecognitionError::Network).await;
            return;
        }

        {
            let mut session = self.session.write().await;
            if session.mode == InputMode::Listening {
                return;
            }
            session.clear_voice();
            session.last_error = None;
        }

        match self.recognizer.start(&self.config.recognizer) {
            Ok(()) => debug!("recognition session starting"),
            Err(RecognitionError::AlreadyActive) => {
                warn!("recognition session already active, scheduling one retry");
                self.schedule_start_retry();
                self.surface_error(RecognitionError::AlreadyActive).await;
            }
            Err(err) => {
                warn!(%err, "recognition session failed to start");
                self.surface_error(err).await;
            }
        }
    }

    /// One stop-then-restart attempt after `start_retry_delay`. If that
    /// also fails, give up with a generic error.
    fn schedule_start_retry(self: &Arc<Self>) {
        let weak = Arc::downgrade(self);
        self.retry_timer
            .schedule(self.config.start_retry_delay, async move {
                let Some(controller) = weak.upgrade() else {
                    return;
                };
                controller.recognizer.stop();
                if let Err(err) = controller.recognizer.start(&controller.config.recognizer) {
                    warn!(%err, "recognition start retry failed");
                    controller.surface_error(RecognitionError::StartFailed).await;
                }
            });
    }

    /// Explicitly stop listening. A non-empty accumulated transcript is
    /// sent as a voice message; an empty one drops back to idle.
    pub async fn stop_listening(&self) {
        let transcript = {
            let mut session = self.session.write().await;
            if session.mode != InputMode::Listening {
                return;
            }
            self.silence_timer.cancel();
            self.recognizer.stop();
            let transcript = session.transcript().trim().to_string();
            session.clear_voice();
            session.enter(InputMode::Idle);
            transcript
        };
        if transcript.is_empty() {
            debug!("listening stopped with nothing captured");
        } else {
            info!(chars = transcript.len(), "voice message sent");
            (self.on_send)(&transcript, SendMode::Voice);
        }
    }

    /// Carry the current transcript into typing mode. An empty transcript
    /// drops back to idle instead.
    pub async fn switch_to_text(&self) {
        let mut session = self.session.write().await;
        if session.mode != InputMode::Listening {
            return;
        }
        self.silence_timer.cancel();
        self.recognizer.stop();
        let carried = session.transcript().trim().to_string();
        session.clear_voice();
        if carried.is_empty() {
            session.enter(InputMode::Idle);
        } else {
            debug!(chars = carried.len(), "transcript carried into typing mode");
            session.text_buffer = carried;
            session.enter(InputMode::Typing);
        }
    }

    /// Global escape: stop any recognition session, discard all buffered
    /// state, clear any error, return to idle. Always available.
    pub async fn cancel_input(&self) {
        self.silence_timer.cancel();
        self.retry_timer.cancel();
        self.error_clear_timer.cancel();
        let mut session = self.session.write().await;
        if session.mode == InputMode::Listening {
            self.recognizer.stop();
        }
        session.reset();
        debug!("input canceled");
    }

    // ── Recognizer events ───────────────────────────────────────────

    /// Process one recognizer event. Events are handled in delivery order;
    /// each result event rearms the single silence timer.
    pub async fn handle_event(self: &Arc<Self>, event: RecognizerEvent) {
        match event {
            RecognizerEvent::Started => {
                let mut session = self.session.write().await;
                if session.enter(InputMode::Listening) {
                    session.last_error = None;
                    debug!("input mode: listening");
                } else {
                    warn!(mode = %session.mode, "ignoring session start in current mode");
                }
            }
            RecognizerEvent::Result(segments) => {
                {
                    let mut session = self.session.write().await;
                    if session.mode != InputMode::Listening {
                        return;
                    }
                    let mut interim = String::new();
                    let mut saw_final = false;
                    for segment in segments {
                        if segment.is_final {
                            session.voice_final.push_str(&segment.transcript);
                            session.confidence = segment.confidence.unwrap_or(1.0);
                            saw_final = true;
                        } else {
                            interim.push_str(&segment.transcript);
                        }
                    }
                    if saw_final {
                        session.voice_interim.clear();
                    } else {
                        session.voice_interim = interim;
                    }
                }
                self.arm_silence_timer();
            }
            RecognizerEvent::Error { code } => {
                self.silence_timer.cancel();
                let err = RecognitionError::from_engine_code(&code);
                warn!(code, %err, "recognition error");
                {
                    let mut session = self.session.write().await;
                    if session.mode == InputMode::Listening {
                        session.enter(InputMode::Idle);
                    }
                    session.voice_interim.clear();
                    session.confidence = 0.0;
                }
                self.surface_error(err).await;
            }
            RecognizerEvent::Ended => {
                self.silence_timer.cancel();
                let mut session = self.session.write().await;
                session.voice_interim.clear();
                if session.mode == InputMode::Listening {
                    session.enter(InputMode::Idle);
                    debug!("recognition session ended");
                }
            }
        }
    }

    fn arm_silence_timer(self: &Arc<Self>) {
        let weak = Arc::downgrade(self);
        self.silence_timer
            .schedule(self.config.silence_timeout, async move {
                if let Some(controller) = weak.upgrade() {
                    controller.on_silence_elapsed().await;
                }
            });
    }

    /// Silence window elapsed with no new results: stop the session and
    /// auto-dispatch the transcript if it clears the confidence bar,
    /// otherwise retain it for the caller to confirm or edit.
    async fn on_silence_elapsed(&self) {
        let dispatched = {
            let mut session = self.session.write().await;
            if session.mode != InputMode::Listening {
                return;
            }
            self.recognizer.stop();
            let transcript = session.voice_final.trim().to_string();
            session.voice_interim.clear();
            session.enter(InputMode::Idle);

            if transcript.is_empty() {
                debug!("silence timeout with empty transcript");
                None
            } else if self.config.auto_send && session.confidence >= self.config.min_confidence {
                session.clear_voice();
                Some(transcript)
            } else {
                info!(
                    confidence = session.confidence,
                    threshold = self.config.min_confidence,
                    "transcript retained for confirmation"
                );
                None
            }
        };
        if let Some(transcript) = dispatched {
            info!(chars = transcript.len(), "voice message auto-sent after silence");
            (self.on_send)(&transcript, SendMode::Voice);
        }
    }

    async fn surface_error(self: &Arc<Self>, err: RecognitionError) {
        {
            let mut session = self.session.write().await;
            session.last_error = Some(err);
        }
        let weak = Arc::downgrade(self);
        self.error_clear_timer
            .schedule(self.config.error_clear_after, async move {
                if let Some(controller) = weak.upgrade() {
                    controller.session.write().await.last_error = None;
                }
            });
    }

    // ── Keyboard shortcuts ──────────────────────────────────────────

    /// Apply the global keyboard-shortcut contract to one key press.
    ///
    /// Space toggles listening when nothing editable has focus, Escape
    /// always cancels, Enter sends while typing, and any other printable
    /// character seeds typing mode from idle.
    pub async fn handle_key(self: &Arc<Self>, input: KeyInput) {
        if !self.is_enabled() {
            return;
        }
        match input.key {
            Key::Escape => self.cancel_input().await,
            Key::Space => {
                if input.chorded() || input.shift || input.editable_focused {
                    return;
                }
                match self.mode().await {
                    InputMode::Listening => self.stop_listening().await,
                    InputMode::Idle => self.start_listening().await,
                    InputMode::Typing => {}
                }
            }
            Key::Enter => {
                if self.mode().await == InputMode::Typing {
                    self.send_text_message().await;
                }
            }
            Key::Char(c) => {
                if input.chorded() || input.editable_focused {
                    return;
                }
                let mut session = self.session.write().await;
                if session.mode != InputMode::Idle {
                    return;
                }
                session.enter(InputMode::Typing);
                session.text_buffer.clear();
                session.text_buffer.push(c);
                session.last_error = None;
                debug!("typing seeded from keypress");
            }
            Key::Other => {}
        }
    }
}
