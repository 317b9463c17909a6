//! Core client logic for the Ki relationship-coaching app: the voice/text
//! input state machine, durable onboarding progress, and the offline sync
//! queue.
//!
//! The crate is shell-agnostic. Platform capabilities (speech recognition,
//! connectivity, durable storage, the sync transport) enter through the
//! traits in [`capability`] and [`offline::SyncClient`]; everything else is
//! plain async Rust on tokio.

pub mod capability;
pub mod chat;
pub mod config;
pub mod error;
pub mod input;
pub mod offline;
pub mod progress;

pub use config::{InputConfig, ProgressConfig};
pub use error::{Error, RecognitionError, Result, StorageError, SyncError};
pub use input::{InputMode, InputModeController, SendMode};
pub use offline::{OfflineOutbox, SyncReport};
pub use progress::{OnboardingStep, ProgressStore};
