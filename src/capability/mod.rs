//! Injected capability interfaces.
//!
//! Environment capabilities (speech recognition, connectivity, durable
//! storage) are modeled as explicit traits so the controller and store
//! logic is testable without a real host.

pub mod connectivity;
pub mod recognizer;
pub mod storage;

pub use connectivity::{ConnectivityMonitor, SharedConnectivity};
pub use recognizer::{
    RecognitionSegment, RecognizerEvent, RecognizerSettings, SpeechRecognizer,
    UnsupportedRecognizer,
};
pub use storage::{DurableStore, FsStore, MemoryStore};
