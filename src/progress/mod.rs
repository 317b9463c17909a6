//! Onboarding progress: the record, the wizard steps, and the store that
//! persists one user's progress across reloads.

pub mod record;
pub mod steps;
pub mod store;

pub use record::{FieldUpdate, OnboardingRecord, RelationshipStatus};
pub use steps::OnboardingStep;
pub use store::{PROGRESS_KEY, ProgressStore};
