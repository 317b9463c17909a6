//! Per-widget input session state.

use crate::error::RecognitionError;

use super::mode::InputMode;

/// Snapshot of what the user is currently saying, across both input paths.
///
/// The buffers follow the mode: `text_buffer` accumulates while typing,
/// the voice buffers accumulate while listening. A finalized-but-unsent
/// transcript may outlive `Listening` (the preview case) until cleared.
#[derive(Debug, Clone)]
pub struct InputSession {
    pub mode: InputMode,
    pub text_buffer: String,
    /// Finalized speech-to-text output.
    pub voice_final: String,
    /// Latest tentative segment; replaced on every interim result.
    pub voice_interim: String,
    /// Confidence of the most recent finalized segment.
    pub confidence: f32,
    pub last_error: Option<RecognitionError>,
}

impl InputSession {
    /// Combined transcript as the user would see it.
    pub fn transcript(&self) -> String {
        let mut t = self.voice_final.clone();
        t.push_str(&self.voice_interim);
        t
    }

    /// Reset to the idle default, clearing every buffer and any error.
    /// This is the cancel path; it bypasses the transition table.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Move to `target` through the transition table. Same-mode is a
    /// no-op that reports success; an invalid transition is refused and
    /// leaves the session untouched.
    pub(crate) fn enter(&mut self, target: InputMode) -> bool {
        if self.mode == target {
            return true;
        }
        if !self.mode.can_transition_to(target) {
            return false;
        }
        self.mode = target;
        true
    }

    pub(crate) fn clear_voice(&mut self) {
        self.voice_final.clear();
        self.voice_interim.clear();
        self.confidence = 1.0;
    }
}

impl Default for InputSession {
    fn default() -> Self {
        Self {
            mode: InputMode::Idle,
            text_buffer: String::new(),
            voice_final: String::new(),
            voice_interim: String::new(),
            confidence: 1.0,
            last_error: None,
        }
    }
}
