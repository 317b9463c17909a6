//! Input-mode state machine: which of the three mutually-exclusive modes
//! the widget is in.

use serde::{Deserialize, Serialize};

/// The interaction state of a single input widget. Exactly one is active
/// at any observation point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputMode {
    Idle,
    Typing,
    Listening,
}

impl InputMode {
    /// Check if a transition from `self` to `target` is valid.
    ///
    /// Cancel makes `Idle` reachable from everywhere; `Listening` is only
    /// entered from `Idle`; switching to text carries `Listening` into
    /// `Typing`. Self-transitions are no-ops, not transitions.
    pub fn can_transition_to(&self, target: InputMode) -> bool {
        use InputMode::*;
        matches!(
            (self, target),
            (Idle, Typing) | (Idle, Listening) | (Typing, Idle) | (Listening, Idle) | (Listening, Typing)
        )
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    pub fn is_listening(&self) -> bool {
        matches!(self, Self::Listening)
    }
}

impl Default for InputMode {
    fn default() -> Self {
        Self::Idle
    }
}

impl std::fmt::Display for InputMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::Typing => "typing",
            Self::Listening => "listening",
        };
        write!(f, "{s}")
    }
}
