//! ConversationRouter — per-message dispatch over the user's session phase.
//!
//! Every non-command message lands here. The user's session lock is held for
//! the whole turn, so two messages from the same user are handled one after
//! the other while different users proceed independently.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::channels::OutgoingResponse;
use crate::config::CompanionConfig;
use crate::error::JournalError;
use crate::journal::{MoodJournalEntry, MoodPipeline};
use crate::llm::CompletionClient;
use crate::onboarding::OnboardingManager;
use crate::safety::SafetyLayer;
use crate::store::{ProfileStore, SessionPhase, UserSession};

use super::exercises::ExerciseGuide;
use super::therapy::TherapyResponder;

pub const JOURNAL_OFFER: &str = "Would you like to log your mood in the journal? (yes/no)";
pub const EXERCISE_OFFER: &str = "Would you like to try some exercises? (yes/no)";
pub const CONTINUE_OR_EXERCISE: &str =
    "Would you like to continue our conversation or try exercises? (continue/exercises)";
pub const EXERCISE_MENU_INTRO: &str = "Here's a menu of helpful exercises 🌸";
pub const EXERCISE_DECLINED: &str = "No problem! I'm here whenever you need me 😊";
pub const JOURNAL_FAILED: &str =
    "I couldn't log your mood right now, sorry about that. Let's keep talking, and I'll offer again later 💛";

const JOURNAL_CONFIRM: &[&str] = &["yes", "y"];
const EXERCISE_CONFIRM: &[&str] = &["yes", "exercises"];

fn is_affirmative(text: &str, accepted: &[&str]) -> bool {
    let normalized = text.trim().to_lowercase();
    accepted.contains(&normalized.as_str())
}

/// The summary sent after a mood entry is logged.
pub fn logged_message(entry: &MoodJournalEntry) -> String {
    format!(
        "📓 Mood logged!\nUser: {} | {} | {}\nMood: {}\nSummary: {}",
        entry.name.as_deref().unwrap_or("?"),
        entry.age.map(|a| a.to_string()).unwrap_or_else(|| "?".into()),
        entry.location.as_deref().unwrap_or("?"),
        entry.mood,
        entry.synthesis,
    )
}

/// Decides what happens to each inbound message.
pub struct ConversationRouter {
    store: Arc<ProfileStore>,
    onboarding: OnboardingManager,
    journal: MoodPipeline,
    therapy: TherapyResponder,
    safety: Arc<SafetyLayer>,
    journal_offer_interval: u64,
}

impl ConversationRouter {
    pub fn new(
        store: Arc<ProfileStore>,
        client: CompletionClient,
        safety: Arc<SafetyLayer>,
        config: &CompanionConfig,
    ) -> Self {
        Self {
            store,
            onboarding: OnboardingManager::new(client.clone()),
            journal: MoodPipeline::new(client.clone()),
            therapy: TherapyResponder::new(client, config.system_prompt.clone()),
            safety,
            journal_offer_interval: config.journal_offer_interval.max(1),
        }
    }

    pub fn store(&self) -> &Arc<ProfileStore> {
        &self.store
    }

    /// Handle one message from `user_id`. An empty result means no reply.
    pub async fn route(&self, user_id: &str, text: &str) -> Vec<OutgoingResponse> {
        let session = self.store.session(user_id).await;
        let mut session = session.lock().await;
        session.touch();

        let phase = session.phase;
        debug!(user_id = %user_id, phase = %phase, "Routing message");

        match phase {
            SessionPhase::Onboarding(_) => {
                let reply = self.onboarding.handle_onboarding(&mut session, text).await;
                vec![OutgoingResponse::text(reply.message)]
            }
            SessionPhase::AwaitingJournal => self.on_journal_answer(&mut session, text).await,
            SessionPhase::AwaitingExercise => self.on_exercise_answer(&mut session, text),
            SessionPhase::Idle => self.on_conversation(&mut session, text).await,
        }
    }

    /// Reply to "log your mood?". Anything but yes leaves the question open.
    async fn on_journal_answer(
        &self,
        session: &mut UserSession,
        text: &str,
    ) -> Vec<OutgoingResponse> {
        if !is_affirmative(text, JOURNAL_CONFIRM) {
            debug!(user_id = %session.user_id, "Journal offer still pending");
            return Vec::new();
        }

        match self.log_mood(session).await {
            Ok(entry) => {
                let follow_up = if entry.mood.is_negative() {
                    EXERCISE_OFFER
                } else {
                    CONTINUE_OR_EXERCISE
                };
                session.phase = SessionPhase::AwaitingExercise;
                vec![
                    OutgoingResponse::text(logged_message(&entry)),
                    OutgoingResponse::text(follow_up),
                ]
            }
            Err(e) => {
                warn!(user_id = %session.user_id, error = %e, "Mood journaling failed");
                session.phase = SessionPhase::Idle;
                vec![OutgoingResponse::text(JOURNAL_FAILED)]
            }
        }
    }

    async fn log_mood(&self, session: &mut UserSession) -> Result<MoodJournalEntry, JournalError> {
        let mood = self.journal.classify_mood(&session.log).await?;
        let synthesis = self.journal.synthesize(&session.log).await?;
        let entry = MoodJournalEntry::new(&session.profile, mood, synthesis);
        session.log.record_mood(entry.clone());
        info!(user_id = %session.user_id, mood = %entry.mood, "Mood logged");
        Ok(entry)
    }

    /// Reply to "want exercises?". The question is closed either way.
    fn on_exercise_answer(&self, session: &mut UserSession, text: &str) -> Vec<OutgoingResponse> {
        session.phase = SessionPhase::Idle;
        if is_affirmative(text, EXERCISE_CONFIRM) {
            vec![ExerciseGuide::menu(EXERCISE_MENU_INTRO)]
        } else {
            vec![OutgoingResponse::text(EXERCISE_DECLINED)]
        }
    }

    /// Normal flow: count the message, offer journaling on every Nth,
    /// otherwise reply and log the exchange.
    async fn on_conversation(
        &self,
        session: &mut UserSession,
        text: &str,
    ) -> Vec<OutgoingResponse> {
        session.message_count += 1;

        if session.message_count % self.journal_offer_interval == 0 {
            session.phase = SessionPhase::AwaitingJournal;
            debug!(
                user_id = %session.user_id,
                count = session.message_count,
                "Offering mood journal"
            );
            let offer = self.safety.annotate(text, JOURNAL_OFFER.to_string());
            return vec![OutgoingResponse::text(offer)];
        }

        let reply = self.therapy.respond(text).await;
        session.log.append(text, reply.as_str());
        vec![OutgoingResponse::text(self.safety.annotate(text, reply))]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::journal::Mood;
    use crate::llm::testing::ScriptedLlm;
    use crate::onboarding::Profile;

    fn router(replies: Vec<Option<&str>>) -> (ConversationRouter, Arc<ScriptedLlm>) {
        let llm = ScriptedLlm::new(replies);
        let router = ConversationRouter::new(
            Arc::new(ProfileStore::new(10)),
            llm.client(),
            Arc::new(SafetyLayer::new()),
            &CompanionConfig::default(),
        );
        (router, llm)
    }

    async fn onboarded(router: &ConversationRouter, user_id: &str) {
        let session = router.store().session(user_id).await;
        session.lock().await.complete_onboarding(Profile {
            name: Some("Sophie".into()),
            age: Some(20),
            location: Some("Paris".into()),
        });
    }

    async fn phase(router: &ConversationRouter, user_id: &str) -> SessionPhase {
        router.store().session(user_id).await.lock().await.phase
    }

    #[test]
    fn affirmative_matching_is_case_insensitive_and_exact() {
        assert!(is_affirmative("YES", JOURNAL_CONFIRM));
        assert!(is_affirmative(" y ", JOURNAL_CONFIRM));
        assert!(!is_affirmative("yeah", JOURNAL_CONFIRM));
        assert!(is_affirmative("Exercises", EXERCISE_CONFIRM));
        assert!(!is_affirmative("y", EXERCISE_CONFIRM));
    }

    #[test]
    fn logged_message_format() {
        let profile = Profile {
            name: Some("Sophie".into()),
            age: Some(20),
            location: Some("Paris".into()),
        };
        let entry = MoodJournalEntry::new(&profile, Mood::Calm, "You relaxed.");
        assert_eq!(
            logged_message(&entry),
            "📓 Mood logged!\nUser: Sophie | 20 | Paris\nMood: Calm\nSummary: You relaxed."
        );
    }

    #[tokio::test]
    async fn new_user_is_onboarded_first() {
        let (router, llm) = router(vec![]);
        let out = router.route("u1", "hello").await;
        assert_eq!(out.len(), 1);
        assert!(out[0].content.contains("What's your name?"));
        assert_eq!(llm.calls(), 0);
    }

    #[tokio::test]
    async fn non_affirmative_journal_answer_is_sticky() {
        let (router, llm) = router(vec![]);
        onboarded(&router, "u1").await;
        router.store().session("u1").await.lock().await.phase = SessionPhase::AwaitingJournal;

        assert!(router.route("u1", "maybe later").await.is_empty());
        assert!(router.route("u1", "no").await.is_empty());
        assert_eq!(phase(&router, "u1").await, SessionPhase::AwaitingJournal);
        assert_eq!(llm.calls(), 0);
    }

    #[tokio::test]
    async fn positive_mood_offers_continue_or_exercises() {
        let (router, _llm) = router(vec![Some(r#"{"mood": "Happy"}"#), Some("You had fun.")]);
        onboarded(&router, "u1").await;
        router.store().session("u1").await.lock().await.phase = SessionPhase::AwaitingJournal;

        let out = router.route("u1", "Y").await;
        assert_eq!(out.len(), 2);
        assert!(out[0].content.contains("Mood: Happy"));
        assert_eq!(out[1].content, CONTINUE_OR_EXERCISE);
        assert_eq!(phase(&router, "u1").await, SessionPhase::AwaitingExercise);
    }

    #[tokio::test]
    async fn journal_failure_apologises_and_returns_to_idle() {
        let (router, _llm) = router(vec![Some(r#"{"mood": "Melancholy"}"#)]);
        onboarded(&router, "u1").await;
        router.store().session("u1").await.lock().await.phase = SessionPhase::AwaitingJournal;

        let out = router.route("u1", "yes").await;
        assert_eq!(out, vec![OutgoingResponse::text(JOURNAL_FAILED)]);
        assert_eq!(phase(&router, "u1").await, SessionPhase::Idle);
        assert!(router.store().mood_journal("u1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn synthesis_failure_records_nothing() {
        let (router, llm) = router(vec![Some(r#"{"mood": "Sad"}"#), None]);
        onboarded(&router, "u1").await;
        router.store().session("u1").await.lock().await.phase = SessionPhase::AwaitingJournal;

        let out = router.route("u1", "yes").await;
        assert_eq!(out, vec![OutgoingResponse::text(JOURNAL_FAILED)]);
        assert_eq!(llm.calls(), 2);
        assert_eq!(phase(&router, "u1").await, SessionPhase::Idle);
        assert!(router.store().mood_journal("u1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn exercise_answer_closes_question_either_way() {
        let (router, _llm) = router(vec![]);
        onboarded(&router, "u1").await;

        router.store().session("u1").await.lock().await.phase = SessionPhase::AwaitingExercise;
        let out = router.route("u1", "exercises").await;
        assert_eq!(out[0].content, EXERCISE_MENU_INTRO);
        assert!(!out[0].buttons.is_empty());
        assert_eq!(phase(&router, "u1").await, SessionPhase::Idle);

        router.store().session("u1").await.lock().await.phase = SessionPhase::AwaitingExercise;
        let out = router.route("u1", "continue").await;
        assert_eq!(out, vec![OutgoingResponse::text(EXERCISE_DECLINED)]);
        assert_eq!(phase(&router, "u1").await, SessionPhase::Idle);
    }

    #[tokio::test]
    async fn therapy_failure_sends_and_logs_fallback() {
        let (router, _llm) = router(vec![None]);
        onboarded(&router, "u1").await;

        let out = router.route("u1", "hi").await;
        assert_eq!(out[0].content, crate::agent::therapy::FALLBACK_AFFIRMATION);
        let transcript = router.store().transcript("u1").await;
        assert_eq!(transcript.len(), 1);
        assert!(transcript[0].contains("Bot: 🌟"));
    }

    #[tokio::test]
    async fn crisis_language_gets_hotline_hint_but_log_stays_clean() {
        let (router, _llm) = router(vec![Some("I'm here with you.")]);
        onboarded(&router, "u1").await;

        let out = router.route("u1", "I want to die").await;
        assert!(out[0].content.starts_with("I'm here with you."));
        assert!(out[0].content.contains("988"));
        let transcript = router.store().transcript("u1").await;
        assert_eq!(transcript[0], "User: I want to die\nBot: I'm here with you.");
    }

    #[tokio::test]
    async fn custom_offer_interval() {
        let llm = ScriptedLlm::new([Some("ok")]);
        let config = CompanionConfig {
            journal_offer_interval: 2,
            ..CompanionConfig::default()
        };
        let router = ConversationRouter::new(
            Arc::new(ProfileStore::new(10)),
            llm.client(),
            Arc::new(SafetyLayer::new()),
            &config,
        );
        onboarded(&router, "u1").await;

        assert_eq!(router.route("u1", "one").await[0].content, "ok");
        assert_eq!(router.route("u1", "two").await[0].content, JOURNAL_OFFER);
    }
}
