//! Per-user session: profile, conversation phase, counters and log.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::journal::ConversationLog;
use crate::onboarding::{OnboardingStage, Profile};

/// Where a user is in the conversation.
///
/// Exactly one phase is active at a time, so "awaiting a journal answer" and
/// "awaiting an exercise answer" can never both hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "phase", content = "stage", rename_all = "snake_case")]
pub enum SessionPhase {
    /// Still collecting the profile.
    Onboarding(OnboardingStage),
    /// Normal conversation.
    Idle,
    /// The bot asked whether to log the user's mood.
    AwaitingJournal,
    /// The bot asked whether the user wants exercises.
    AwaitingExercise,
}

impl std::fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Onboarding(stage) => write!(f, "onboarding:{stage}"),
            Self::Idle => f.write_str("idle"),
            Self::AwaitingJournal => f.write_str("awaiting_journal"),
            Self::AwaitingExercise => f.write_str("awaiting_exercise"),
        }
    }
}

/// Snapshot of a fully onboarded user's routing state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UserState {
    pub message_count: u64,
    pub awaiting_mood_journal: bool,
    pub awaiting_exercise_decision: bool,
}

/// Everything the companion keeps about one user.
#[derive(Debug, Clone)]
pub struct UserSession {
    pub user_id: String,
    pub profile: Profile,
    pub phase: SessionPhase,
    /// Normal-flow messages since onboarding completed.
    pub message_count: u64,
    pub log: ConversationLog,
    pub created_at: DateTime<Utc>,
    pub last_active: DateTime<Utc>,
}

impl UserSession {
    /// A brand-new user, about to see the intro.
    pub fn new(user_id: impl Into<String>, max_history_turns: usize) -> Self {
        let now = Utc::now();
        Self {
            user_id: user_id.into(),
            profile: Profile::default(),
            phase: SessionPhase::Onboarding(OnboardingStage::Intro),
            message_count: 0,
            log: ConversationLog::new(max_history_turns),
            created_at: now,
            last_active: now,
        }
    }

    pub fn needs_onboarding(&self) -> bool {
        matches!(self.phase, SessionPhase::Onboarding(_))
    }

    /// Current onboarding stage, if still onboarding.
    pub fn onboarding_stage(&self) -> Option<OnboardingStage> {
        match self.phase {
            SessionPhase::Onboarding(stage) => Some(stage),
            _ => None,
        }
    }

    /// Routing state; `None` until onboarding has completed.
    pub fn user_state(&self) -> Option<UserState> {
        let (journal, exercise) = match self.phase {
            SessionPhase::Onboarding(_) => return None,
            SessionPhase::Idle => (false, false),
            SessionPhase::AwaitingJournal => (true, false),
            SessionPhase::AwaitingExercise => (false, true),
        };
        Some(UserState {
            message_count: self.message_count,
            awaiting_mood_journal: journal,
            awaiting_exercise_decision: exercise,
        })
    }

    /// The onboarded transition: store the finished profile, reset counters
    /// and the log, and leave the onboarding phase, all under one borrow.
    pub fn complete_onboarding(&mut self, profile: Profile) {
        self.profile = profile;
        self.message_count = 0;
        self.log.clear();
        self.phase = SessionPhase::Idle;
    }

    pub fn touch(&mut self) {
        self.last_active = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete_profile() -> Profile {
        Profile {
            name: Some("Sophie".into()),
            age: Some(20),
            location: Some("Paris".into()),
        }
    }

    #[test]
    fn new_session_starts_at_intro() {
        let session = UserSession::new("u1", 10);
        assert!(session.needs_onboarding());
        assert_eq!(session.onboarding_stage(), Some(OnboardingStage::Intro));
        assert!(session.user_state().is_none());
    }

    #[test]
    fn completing_onboarding_resets_state() {
        let mut session = UserSession::new("u1", 10);
        session.log.append("stray", "entry");
        session.message_count = 7;
        session.complete_onboarding(complete_profile());

        assert!(!session.needs_onboarding());
        assert!(session.log.is_empty());
        assert_eq!(
            session.user_state(),
            Some(UserState {
                message_count: 0,
                awaiting_mood_journal: false,
                awaiting_exercise_decision: false,
            })
        );
    }

    #[test]
    fn awaiting_flags_follow_phase() {
        let mut session = UserSession::new("u1", 10);
        session.complete_onboarding(complete_profile());

        session.phase = SessionPhase::AwaitingJournal;
        let state = session.user_state().unwrap();
        assert!(state.awaiting_mood_journal && !state.awaiting_exercise_decision);

        session.phase = SessionPhase::AwaitingExercise;
        let state = session.user_state().unwrap();
        assert!(!state.awaiting_mood_journal && state.awaiting_exercise_decision);
    }

    #[test]
    fn phase_display() {
        assert_eq!(
            SessionPhase::Onboarding(OnboardingStage::Age).to_string(),
            "onboarding:age"
        );
        assert_eq!(SessionPhase::AwaitingJournal.to_string(), "awaiting_journal");
    }

    #[test]
    fn phase_serializes_with_tag() {
        let json = serde_json::to_value(SessionPhase::Onboarding(OnboardingStage::Name)).unwrap();
        assert_eq!(json, serde_json::json!({"phase": "onboarding", "stage": "name"}));
        let json = serde_json::to_value(SessionPhase::Idle).unwrap();
        assert_eq!(json, serde_json::json!({"phase": "idle"}));
    }
}
