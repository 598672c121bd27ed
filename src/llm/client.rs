//! Completion client: one system instruction plus one user message in,
//! free text or a flat JSON object out.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::LlmError;
use crate::llm::costs;
use crate::llm::provider::{ChatMessage, CompletionRequest, LlmProvider};

/// Default per-call timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Thin wrapper over an [`LlmProvider`] used by every conversational component.
#[derive(Clone)]
pub struct CompletionClient {
    llm: Arc<dyn LlmProvider>,
    timeout: Duration,
}

impl CompletionClient {
    pub fn new(llm: Arc<dyn LlmProvider>) -> Self {
        Self {
            llm,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn model_name(&self) -> &str {
        self.llm.model_name()
    }

    /// Free-text completion.
    pub async fn complete(&self, system: &str, user: &str) -> Result<String, LlmError> {
        let request = CompletionRequest::new(vec![
            ChatMessage::system(system),
            ChatMessage::user(user),
        ]);
        self.run(request).await
    }

    /// Structured completion. The response must contain a single JSON object.
    pub async fn complete_json(
        &self,
        system: &str,
        user: &str,
    ) -> Result<Map<String, Value>, LlmError> {
        let system = format!(
            "{system}\n\nRespond with ONLY a single valid JSON object, no explanation or markdown formatting."
        );
        let request = CompletionRequest::new(vec![
            ChatMessage::system(system),
            ChatMessage::user(user),
        ])
        .with_temperature(0.0)
        .with_max_tokens(256);

        let raw = self.run(request).await?;
        let json_text = extract_json_object(&raw);
        match serde_json::from_str::<Value>(json_text)? {
            Value::Object(map) => Ok(map),
            other => {
                warn!(response = %raw, "Structured completion was not a JSON object");
                Err(LlmError::InvalidResponse {
                    provider: self.llm.model_name().to_string(),
                    reason: format!("expected a JSON object, got {}", json_kind(&other)),
                })
            }
        }
    }

    async fn run(&self, request: CompletionRequest) -> Result<String, LlmError> {
        let response = tokio::time::timeout(self.timeout, self.llm.complete(request))
            .await
            .map_err(|_| LlmError::Timeout {
                provider: self.llm.model_name().to_string(),
                timeout: self.timeout,
            })??;

        debug!(
            model = self.llm.model_name(),
            input_tokens = response.input_tokens,
            output_tokens = response.output_tokens,
            cost_usd = %costs::estimate(
                self.llm.cost_per_token(),
                response.input_tokens,
                response.output_tokens,
            ),
            "Completion finished"
        );

        Ok(response.content.trim().to_string())
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Extract a JSON object from LLM output that might contain markdown or extra text.
///
/// Uses the span from the first `{` to the last `}`; without one, the trimmed
/// text is returned as is.
pub fn extract_json_object(text: &str) -> &str {
    let trimmed = text.trim();

    if let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}'))
        && end > start
    {
        return &trimmed[start..=end];
    }

    trimmed
}
