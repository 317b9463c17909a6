//! The intake wizard steps, in order.

use serde::{Deserialize, Serialize};

/// The nine steps of the intake flow. Step indices are 0-based and bounded
/// by [`OnboardingStep::TOTAL`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnboardingStep {
    Welcome,
    Name,
    Age,
    Location,
    Relationship,
    Length,
    Goals,
    Partner,
    Complete,
}

impl OnboardingStep {
    pub const ALL: [OnboardingStep; 9] = [
        Self::Welcome,
        Self::Name,
        Self::Age,
        Self::Location,
        Self::Relationship,
        Self::Length,
        Self::Goals,
        Self::Partner,
        Self::Complete,
    ];

    pub const TOTAL: usize = Self::ALL.len();

    /// Stable identifier used in `completed_steps`.
    pub fn id(&self) -> &'static str {
        match self {
            Self::Welcome => "welcome",
            Self::Name => "name",
            Self::Age => "age",
            Self::Location => "location",
            Self::Relationship => "relationship",
            Self::Length => "length",
            Self::Goals => "goals",
            Self::Partner => "partner",
            Self::Complete => "complete",
        }
    }

    pub fn index(&self) -> usize {
        Self::ALL.iter().position(|s| s == self).expect("step in ALL")
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn next(&self) -> Option<Self> {
        Self::from_index(self.index() + 1)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete)
    }
}

impl std::fmt::Display for OnboardingStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id())
    }
}
