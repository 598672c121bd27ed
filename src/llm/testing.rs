//! Scripted provider for unit tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::error::LlmError;
use crate::llm::client::CompletionClient;
use crate::llm::provider::{
    CompletionRequest, CompletionResponse, FinishReason, LlmProvider, Role,
};

/// Replays queued replies in order; `None` entries simulate a failed call.
pub struct ScriptedLlm {
    replies: Mutex<VecDeque<Option<String>>>,
    prompts: Mutex<Vec<(String, String)>>,
}

impl ScriptedLlm {
    pub fn new<I, S>(replies: I) -> Arc<Self>
    where
        I: IntoIterator<Item = Option<S>>,
        S: Into<String>,
    {
        Arc::new(Self {
            replies: Mutex::new(replies.into_iter().map(|r| r.map(Into::into)).collect()),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn client(self: &Arc<Self>) -> CompletionClient {
        CompletionClient::new(Arc::clone(self) as Arc<dyn LlmProvider>)
    }

    /// (system, user) pairs seen so far.
    pub fn prompts(&self) -> Vec<(String, String)> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait]
impl LlmProvider for ScriptedLlm {
    fn model_name(&self) -> &str {
        "scripted"
    }

    fn cost_per_token(&self) -> (Decimal, Decimal) {
        (Decimal::ZERO, Decimal::ZERO)
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let system = request.system_preamble().unwrap_or_default();
        let user = request
            .messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.clone())
            .unwrap_or_default();
        self.prompts.lock().unwrap().push((system, user));

        match self.replies.lock().unwrap().pop_front() {
            Some(Some(content)) => Ok(CompletionResponse {
                content,
                input_tokens: 10,
                output_tokens: 5,
                finish_reason: FinishReason::Stop,
                response_id: None,
            }),
            _ => Err(LlmError::RequestFailed {
                provider: "scripted".to_string(),
                reason: "scripted failure".to_string(),
            }),
        }
    }
}
