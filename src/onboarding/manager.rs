//! OnboardingManager — drives a new user through the onboarding stages,
//! extracting one profile field per turn via the completion service.

use tracing::{debug, info, warn};

use crate::llm::CompletionClient;
use crate::store::{SessionPhase, UserSession};

use super::extract::ExtractedFields;
use super::prompts::{
    EXTRACTION_INSTRUCTION, completion_message, reprompt, stage_question, welcome_message,
};
use super::state::OnboardingStage;

/// Result of handling one onboarding turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OnboardingReply {
    /// Text to send back to the user.
    pub message: String,
    /// Stage after this turn, or `None` once onboarding has completed.
    pub stage: Option<OnboardingStage>,
    /// Whether the stage advanced this turn.
    pub advanced: bool,
}

impl OnboardingReply {
    pub fn completed(&self) -> bool {
        self.stage.is_none()
    }
}

/// Coordinates onboarding: stage tracking, LLM extraction, and profile building.
#[derive(Clone)]
pub struct OnboardingManager {
    client: CompletionClient,
}

impl OnboardingManager {
    pub fn new(client: CompletionClient) -> Self {
        Self { client }
    }

    /// Whether the session still has to go through onboarding.
    pub fn needs_onboarding(session: &UserSession) -> bool {
        session.needs_onboarding()
    }

    /// Handle one inbound message for a user who is still onboarding.
    ///
    /// The intro stage ignores the text. Every other stage extracts its field;
    /// when the field is missing (or extraction fails) the stage is repeated.
    pub async fn handle_onboarding(
        &self,
        session: &mut UserSession,
        raw_text: &str,
    ) -> OnboardingReply {
        let Some(stage) = session.onboarding_stage() else {
            warn!(user_id = %session.user_id, "Onboarding requested for an onboarded user");
            return OnboardingReply {
                message: completion_message(&session.profile),
                stage: None,
                advanced: false,
            };
        };

        let Some(field) = stage.target_field() else {
            // Intro: greet and move on to asking for the name.
            let next = OnboardingStage::Name;
            session.phase = SessionPhase::Onboarding(next);
            info!(user_id = %session.user_id, "Onboarding started");
            return OnboardingReply {
                message: welcome_message(),
                stage: Some(next),
                advanced: true,
            };
        };

        let extracted = self.extract(&session.user_id, stage, raw_text).await;

        let mut profile = session.profile.clone();
        if !profile.apply(field, &extracted) {
            debug!(user_id = %session.user_id, stage = %stage, "Field not found, re-prompting");
            return OnboardingReply {
                message: reprompt(stage),
                stage: Some(stage),
                advanced: false,
            };
        }

        match stage.next() {
            Some(next) => {
                debug_assert!(stage.can_transition_to(next));
                session.profile = profile;
                session.phase = SessionPhase::Onboarding(next);
                debug!(
                    user_id = %session.user_id,
                    from = %stage,
                    to = %next,
                    "Onboarding advanced"
                );
                OnboardingReply {
                    message: stage_question(next, &session.profile),
                    stage: Some(next),
                    advanced: true,
                }
            }
            None => {
                session.complete_onboarding(profile);
                info!(user_id = %session.user_id, "Onboarding complete");
                OnboardingReply {
                    message: completion_message(&session.profile),
                    stage: None,
                    advanced: true,
                }
            }
        }
    }

    /// Run extraction. Failures and malformed output count as "nothing found".
    async fn extract(
        &self,
        user_id: &str,
        stage: OnboardingStage,
        raw_text: &str,
    ) -> ExtractedFields {
        match self.client.complete_json(EXTRACTION_INSTRUCTION, raw_text).await {
            Ok(map) => ExtractedFields::from_json(&map),
            Err(e) => {
                warn!(
                    user_id = %user_id,
                    stage = %stage,
                    error = %e,
                    "Onboarding extraction failed"
                );
                ExtractedFields::default()
            }
        }
    }
}
