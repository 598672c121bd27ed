//! Onboarding state machine — tracks which stage a new user is in.

use serde::{Deserialize, Serialize};

/// The stages of the onboarding dialogue.
///
/// Progresses linearly: Intro → Name → Age → Location. Completion is not a
/// stage of its own; it is the session leaving the onboarding phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OnboardingStage {
    #[default]
    Intro,
    Name,
    Age,
    Location,
}

/// The profile field a stage is collecting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileField {
    Name,
    Age,
    Location,
}

impl OnboardingStage {
    /// Check if a transition from `self` to `target` is valid.
    pub fn can_transition_to(&self, target: OnboardingStage) -> bool {
        use OnboardingStage::*;
        matches!((self, target), (Intro, Name) | (Name, Age) | (Age, Location))
    }

    /// Get the next stage, or `None` when this is the final stage.
    pub fn next(&self) -> Option<OnboardingStage> {
        use OnboardingStage::*;
        match self {
            Intro => Some(Name),
            Name => Some(Age),
            Age => Some(Location),
            Location => None,
        }
    }

    /// Whether succeeding at this stage finishes onboarding.
    pub fn is_final(&self) -> bool {
        self.next().is_none()
    }

    /// Field extracted at this stage. The intro stage extracts nothing.
    pub fn target_field(&self) -> Option<ProfileField> {
        match self {
            Self::Intro => None,
            Self::Name => Some(ProfileField::Name),
            Self::Age => Some(ProfileField::Age),
            Self::Location => Some(ProfileField::Location),
        }
    }
}

impl std::fmt::Display for OnboardingStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Intro => "intro",
            Self::Name => "name",
            Self::Age => "age",
            Self::Location => "location",
        };
        write!(f, "{s}")
    }
}
