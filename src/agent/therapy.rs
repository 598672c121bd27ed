//! TherapyResponder — the general-conversation reply.

use tracing::warn;

use crate::error::LlmError;
use crate::llm::CompletionClient;

/// Sent when the completion service can't produce a reply.
pub const FALLBACK_AFFIRMATION: &str = "🌟 Daily Affirmation: You are capable and enough!";

/// Wraps the completion client with the companion's persona.
///
/// Each reply sees only the persona instruction and the current message,
/// never the accumulated transcript, so prompt size stays bounded.
#[derive(Clone)]
pub struct TherapyResponder {
    client: CompletionClient,
    system_prompt: String,
}

impl TherapyResponder {
    pub fn new(client: CompletionClient, system_prompt: impl Into<String>) -> Self {
        Self {
            client,
            system_prompt: system_prompt.into(),
        }
    }

    pub async fn try_respond(&self, user_text: &str) -> Result<String, LlmError> {
        let reply = self.client.complete(&self.system_prompt, user_text).await?;
        if reply.is_empty() {
            return Err(LlmError::InvalidResponse {
                provider: self.client.model_name().to_string(),
                reason: "empty reply".to_string(),
            });
        }
        Ok(reply)
    }

    /// Reply to `user_text`, degrading to [`FALLBACK_AFFIRMATION`].
    pub async fn respond(&self, user_text: &str) -> String {
        match self.try_respond(user_text).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(error = %e, "Therapy reply failed, using fallback affirmation");
                FALLBACK_AFFIRMATION.to_string()
            }
        }
    }
}
