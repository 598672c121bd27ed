//! Mood classification and conversation synthesis.

use serde_json::Value;
use tracing::{debug, info};

use crate::error::JournalError;
use crate::llm::CompletionClient;

use super::log::ConversationLog;
use super::mood::Mood;

/// Stand-in transcript when the user has not chatted yet.
pub const EMPTY_TRANSCRIPT: &str = "(no conversation yet)";

const SYNTHESIS_INSTRUCTION: &str = "\
You summarize conversations between a user and a supportive companion for the user's private mood journal.
Write exactly two sentences in the second person (\"You talked about...\").
Focus on what the user shared and how they seemed to feel. No advice, no lists, no preamble.";

fn classification_instruction() -> String {
    format!(
        "You classify the overall emotional state of the user in a conversation with a supportive companion.\n\
         Choose exactly one label from this list: {labels}.\n\
         Return a JSON object of the form {{\"mood\": \"<label>\"}}.",
        labels = Mood::taxonomy()
    )
}

fn transcript_or_placeholder(log: &ConversationLog) -> String {
    if log.is_empty() {
        EMPTY_TRANSCRIPT.to_string()
    } else {
        log.transcript_text()
    }
}

/// Classifies mood and writes journal summaries from a conversation log.
#[derive(Clone)]
pub struct MoodPipeline {
    client: CompletionClient,
}

impl MoodPipeline {
    pub fn new(client: CompletionClient) -> Self {
        Self { client }
    }

    /// Classify the user's mood from the whole transcript.
    pub async fn classify_mood(&self, log: &ConversationLog) -> Result<Mood, JournalError> {
        let transcript = transcript_or_placeholder(log);
        let object = self
            .client
            .complete_json(&classification_instruction(), &transcript)
            .await
            .map_err(JournalError::Classification)?;

        let label = match object.get("mood") {
            Some(Value::String(label)) => label,
            _ => return Err(JournalError::MissingMood),
        };
        let mood = label
            .parse::<Mood>()
            .map_err(JournalError::UnknownMood)?;

        debug!(mood = %mood, turns = log.len(), "Mood classified");
        Ok(mood)
    }

    /// Two-sentence summary of the transcript.
    pub async fn synthesize(&self, log: &ConversationLog) -> Result<String, JournalError> {
        let transcript = transcript_or_placeholder(log);
        let summary = self
            .client
            .complete(SYNTHESIS_INSTRUCTION, &transcript)
            .await
            .map_err(JournalError::Synthesis)?;

        if summary.is_empty() {
            return Err(JournalError::EmptySynthesis);
        }
        info!(turns = log.len(), chars = summary.len(), "Conversation synthesized");
        Ok(summary)
    }
}
