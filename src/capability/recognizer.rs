//! Speech-recognition capability seam.

use tokio::sync::broadcast;

use crate::error::RecognitionError;

/// One transcript piece from a recognizer result event.
#[derive(Debug, Clone, PartialEq)]
pub struct RecognitionSegment {
    pub transcript: String,
    /// Whether the engine has committed to this segment, as opposed to a
    /// tentative (interim) one that later events may replace.
    pub is_final: bool,
    /// Engine-reported confidence for final segments. Treated as 1.0 when
    /// the engine does not report one.
    pub confidence: Option<f32>,
}

impl RecognitionSegment {
    pub fn interim(transcript: impl Into<String>) -> Self {
        Self {
            transcript: transcript.into(),
            is_final: false,
            confidence: None,
        }
    }

    pub fn final_with(transcript: impl Into<String>, confidence: f32) -> Self {
        Self {
            transcript: transcript.into(),
            is_final: true,
            confidence: Some(confidence),
        }
    }
}

/// Event emitted by a recognition session, in engine delivery order.
#[derive(Debug, Clone)]
pub enum RecognizerEvent {
    /// The session is live and capturing audio.
    Started,
    /// A batch of result segments (final and/or interim).
    Result(Vec<RecognitionSegment>),
    /// Engine error, carrying the engine-specific code string
    /// (e.g. `"network"`, `"not-allowed"`, `"no-speech"`).
    Error { code: String },
    /// The session ended, whether by request or on its own.
    Ended,
}

/// Session configuration passed to [`SpeechRecognizer::start`]. The
/// controller assumes continuous capture with interim results.
#[derive(Debug, Clone)]
pub struct RecognizerSettings {
    pub continuous: bool,
    pub interim_results: bool,
    pub language: String,
}

impl Default for RecognizerSettings {
    fn default() -> Self {
        Self {
            continuous: true,
            interim_results: true,
            language: "en-US".to_string(),
        }
    }
}

/// An external speech-recognition capability.
///
/// `start` must return [`RecognitionError::AlreadyActive`] when a session is
/// already running; the controller handles the single-retry policy. Events
/// fan out on a broadcast channel so the controller (and anything else) can
/// observe the session.
pub trait SpeechRecognizer: Send + Sync {
    /// Whether recognition is available at all. When false, voice input is
    /// permanently disabled and the widget stays text-only.
    fn is_supported(&self) -> bool;

    /// Begin a capture session configured by `settings`.
    fn start(&self, settings: &RecognizerSettings) -> Result<(), RecognitionError>;

    /// Request the active session to stop. No-op when idle; the `Ended`
    /// event may still arrive asynchronously.
    fn stop(&self);

    /// Subscribe to session events.
    fn subscribe(&self) -> broadcast::Receiver<RecognizerEvent>;
}

/// The degenerate recognizer for environments without a speech API.
pub struct UnsupportedRecognizer {
    tx: broadcast::Sender<RecognizerEvent>,
}

impl UnsupportedRecognizer {
    pub fn new() -> Self {
        let (tx, _rx) = broadcast::channel(1);
        Self { tx }
    }
}

impl Default for UnsupportedRecognizer {
    fn default() -> Self {
        Self::new()
    }
}

impl SpeechRecognizer for UnsupportedRecognizer {
    fn is_supported(&self) -> bool {
        false
    }

    fn start(&self, _settings: &RecognizerSettings) -> Result<(), RecognitionError> {
        Err(RecognitionError::Unsupported)
    }

    fn stop(&self) {}

    fn subscribe(&self) -> broadcast::Receiver<RecognizerEvent> {
        self.tx.subscribe()
    }
}
