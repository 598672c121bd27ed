//! Mood taxonomy and journal entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::onboarding::Profile;

/// The closed set of moods the classifier may return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mood {
    Happy,
    Sad,
    Stressed,
    Anxious,
    Frustrated,
    Angry,
    Calm,
    Excited,
    Neutral,
}

impl Mood {
    /// Every label, in the order presented to the classifier.
    pub const ALL: [Mood; 9] = [
        Mood::Happy,
        Mood::Sad,
        Mood::Stressed,
        Mood::Anxious,
        Mood::Frustrated,
        Mood::Angry,
        Mood::Calm,
        Mood::Excited,
        Mood::Neutral,
    ];

    /// Moods after which exercises are offered directly.
    pub fn is_negative(&self) -> bool {
        matches!(
            self,
            Self::Sad | Self::Stressed | Self::Anxious | Self::Frustrated | Self::Angry
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Happy => "Happy",
            Self::Sad => "Sad",
            Self::Stressed => "Stressed",
            Self::Anxious => "Anxious",
            Self::Frustrated => "Frustrated",
            Self::Angry => "Angry",
            Self::Calm => "Calm",
            Self::Excited => "Excited",
            Self::Neutral => "Neutral",
        }
    }

    /// Comma-separated label list for prompts.
    pub fn taxonomy() -> String {
        Self::ALL
            .iter()
            .map(Mood::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl std::fmt::Display for Mood {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Mood {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| wanted.to_string())
    }
}

/// One mood journal record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoodJournalEntry {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub name: Option<String>,
    pub age: Option<u32>,
    pub location: Option<String>,
    pub mood: Mood,
    pub synthesis: String,
}

impl MoodJournalEntry {
    pub fn new(profile: &Profile, mood: Mood, synthesis: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            name: profile.name.clone(),
            age: profile.age,
            location: profile.location.clone(),
            mood,
            synthesis: synthesis.into(),
        }
    }
}
