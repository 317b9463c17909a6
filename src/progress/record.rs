//! The onboarding record: one user's answers and position in the intake
//! flow, serialized as a single JSON snapshot.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Relationship status as collected in the intake flow. `Unspecified` is
/// the unanswered state and serializes as the empty string, matching the
/// stored snapshot format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RelationshipStatus {
    #[serde(rename = "dating")]
    Dating,
    #[serde(rename = "partnered")]
    Partnered,
    #[serde(rename = "engaged")]
    Engaged,
    #[serde(rename = "married")]
    Married,
    #[serde(rename = "")]
    Unspecified,
}

impl Default for RelationshipStatus {
    fn default() -> Self {
        Self::Unspecified
    }
}

impl std::fmt::Display for RelationshipStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Dating => "dating",
            Self::Partnered => "partnered",
            Self::Engaged => "engaged",
            Self::Married => "married",
            Self::Unspecified => "",
        };
        write!(f, "{s}")
    }
}

/// The single persisted record describing one user's progress through the
/// multi-step intake form. Owned by one session; `last_updated` is stamped
/// on every mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnboardingRecord {
    pub name: String,
    pub age: String,
    pub location: String,
    pub relationship_status: RelationshipStatus,
    pub relationship_length: String,
    /// Deduplicated; insertion order is irrelevant.
    pub goals: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partner_email: Option<String>,
    /// Monotonically growing set of step identifiers.
    pub completed_steps: BTreeSet<String>,
    pub last_active_step: usize,
    pub started_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

impl OnboardingRecord {
    /// A fresh record with both timestamps set to now.
    pub fn fresh() -> Self {
        let now = Utc::now();
        Self {
            name: String::new(),
            age: String::new(),
            location: String::new(),
            relationship_status: RelationshipStatus::Unspecified,
            relationship_length: String::new(),
            goals: BTreeSet::new(),
            partner_email: None,
            completed_steps: BTreeSet::new(),
            last_active_step: 0,
            started_at: now,
            last_updated: now,
        }
    }

    /// Whether any user-visible field has been filled in. Gates auto-save
    /// so an all-blank record is never persisted.
    pub fn has_content(&self) -> bool {
        !self.name.is_empty()
            || !self.age.is_empty()
            || !self.location.is_empty()
            || self.relationship_status != RelationshipStatus::Unspecified
            || !self.goals.is_empty()
    }

    /// Apply one field update and stamp `last_updated`.
    pub fn apply(&mut self, update: FieldUpdate) {
        match update {
            FieldUpdate::Name(v) => self.name = v,
            FieldUpdate::Age(v) => self.age = v,
            FieldUpdate::Location(v) => self.location = v,
            FieldUpdate::RelationshipStatus(v) => self.relationship_status = v,
            FieldUpdate::RelationshipLength(v) => self.relationship_length = v,
            FieldUpdate::PartnerEmail(v) => self.partner_email = Some(v),
            FieldUpdate::Goals(v) => self.goals = v.into_iter().collect(),
        }
        self.last_updated = Utc::now();
    }
}

impl Default for OnboardingRecord {
    fn default() -> Self {
        Self::fresh()
    }
}

/// A typed update to one record field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldUpdate {
    Name(String),
    Age(String),
    Location(String),
    RelationshipStatus(RelationshipStatus),
    RelationshipLength(String),
    PartnerEmail(String),
    Goals(Vec<String>),
}
