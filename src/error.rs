//! Error types for the Ki interaction core.
//!
//! Nothing here propagates past the crate boundary as a panic: recognition
//! errors become session state, storage errors are logged and swallowed, and
//! sync errors become per-entry queue status.

/// Top-level error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Recognition error: {0}")]
    Recognition(#[from] RecognitionError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Sync error: {0}")]
    Sync(#[from] SyncError),
}

/// Speech-recognition failures. All recoverable; the widget keeps working
/// in text mode regardless of which one fires.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecognitionError {
    #[error("network error - check your connection")]
    Network,

    #[error("microphone access denied")]
    PermissionDenied,

    #[error("no speech detected - try speaking closer to the microphone")]
    NoSpeech,

    #[error("microphone not found or not working")]
    CaptureDevice,

    #[error("speech service not available")]
    ServiceUnavailable,

    #[error("speech recognition not supported in this environment")]
    Unsupported,

    #[error("recognition session already active")]
    AlreadyActive,

    #[error("unable to start voice recognition")]
    StartFailed,

    #[error("speech recognition error: {0}")]
    Other(String),
}

impl RecognitionError {
    /// Map an engine-specific error code to the taxonomy. Unknown codes fall
    /// back to [`RecognitionError::Other`].
    pub fn from_engine_code(code: &str) -> Self {
        match code {
            "network" => Self::Network,
            "not-allowed" => Self::PermissionDenied,
            "no-speech" => Self::NoSpeech,
            "audio-capture" => Self::CaptureDevice,
            "service-not-allowed" => Self::ServiceUnavailable,
            other => Self::Other(other.to_string()),
        }
    }
}

/// Durable-storage failures. Never surfaced to the user; the in-memory
/// record stays the source of truth.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("read failed: {0}")]
    Read(String),

    #[error("write failed: {0}")]
    Write(String),

    #[error("delete failed: {0}")]
    Delete(String),

    #[error("serialization failed: {0}")]
    Serialization(String),
}

/// Remote-sync failures. Recorded per queue entry as `Failed`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SyncError {
    #[error("sync endpoint returned status {0}")]
    Status(u16),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("client is offline")]
    Offline,
}

/// Result type alias for the crate.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_codes_map_to_taxonomy() {
        assert_eq!(
            RecognitionError::from_engine_code("network"),
            RecognitionError::Network
        );
        assert_eq!(
            RecognitionError::from_engine_code("not-allowed"),
            RecognitionError::PermissionDenied
        );
        assert_eq!(
            RecognitionError::from_engine_code("no-speech"),
            RecognitionError::NoSpeech
        );
        assert_eq!(
            RecognitionError::from_engine_code("audio-capture"),
            RecognitionError::CaptureDevice
        );
        assert_eq!(
            RecognitionError::from_engine_code("service-not-allowed"),
            RecognitionError::ServiceUnavailable
        );
    }

    #[test]
    fn unknown_engine_code_falls_back_to_other() {
        assert_eq!(
            RecognitionError::from_engine_code("aborted"),
            RecognitionError::Other("aborted".to_string())
        );
    }
}
