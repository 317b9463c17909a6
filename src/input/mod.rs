//! Voice/text input-mode controller.
//!
//! Mediates between raw keyboard input, a speech-recognition session, and a
//! single send callback, keeping one always-consistent view of what the
//! user is currently saying.

pub mod controller;
pub mod keys;
pub mod mode;
pub mod session;
pub mod timer;

pub use controller::{InputModeController, SendCallback, SendMode};
pub use keys::{Key, KeyInput};
pub use mode::InputMode;
pub use session::InputSession;
pub use timer::DelayedTask;
