//! Configuration types and environment loading.

use std::time::Duration;

use crate::error::ConfigError;
use crate::llm::{LlmBackend, LlmConfig};

/// Persona instruction for the general-conversation reply.
pub const DEFAULT_SYSTEM_PROMPT: &str = "\
You are Kindred, a warm and compassionate companion who listens like a good therapist.
Respond with empathy, without judgement, and keep replies short (2-4 sentences).
Reflect back what the person shares, validate their feelings, and gently invite them to say more.
Never give medical advice or diagnoses.

Examples:
User: \"Nothing went right today.\"
Reply: \"I'm sorry, that sounds like a really draining day. Do you want to tell me what happened?\"

User: \"Work has me so stressed.\"
Reply: \"That sounds heavy to carry. Have you had any moment today to step away and breathe?\"

User: \"I finally passed my driving test!\"
Reply: \"Congratulations, that's a big deal! How does it feel now that it's done?\"";

/// Runtime configuration for the companion.
#[derive(Debug, Clone)]
pub struct CompanionConfig {
    /// Bot name used in logs.
    pub name: String,
    /// Persona instruction for the therapy responder.
    pub system_prompt: String,
    /// Offer mood journaling every N normal-flow messages.
    pub journal_offer_interval: u64,
    /// Maximum conversation exchanges retained per user.
    pub max_history_turns: usize,
    /// Per-call timeout for the completion service.
    pub llm_timeout: Duration,
    /// Messages starting with this prefix are commands, not conversation.
    pub command_prefix: String,
    /// Port for the read-only status API, if enabled.
    pub http_port: Option<u16>,
}

impl Default for CompanionConfig {
    fn default() -> Self {
        Self {
            name: "kindred".to_string(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            journal_offer_interval: 3,
            max_history_turns: 50,
            llm_timeout: Duration::from_secs(60),
            command_prefix: "!".to_string(),
            http_port: None,
        }
    }
}

impl CompanionConfig {
    /// Load from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup (used by tests).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let journal_offer_interval =
            parse_positive(&lookup, "KINDRED_JOURNAL_INTERVAL")?
                .unwrap_or(defaults.journal_offer_interval);
        let max_history_turns = parse_positive(&lookup, "KINDRED_MAX_HISTORY")?
            .map(|v| v as usize)
            .unwrap_or(defaults.max_history_turns);
        let llm_timeout = parse_positive(&lookup, "KINDRED_LLM_TIMEOUT_SECS")?
            .map(Duration::from_secs)
            .unwrap_or(defaults.llm_timeout);

        let http_port = match lookup("KINDRED_HTTP_PORT") {
            Some(raw) => Some(raw.trim().parse::<u16>().map_err(|e| {
                ConfigError::InvalidValue {
                    key: "KINDRED_HTTP_PORT".to_string(),
                    message: e.to_string(),
                }
            })?),
            None => None,
        };

        let system_prompt = lookup("KINDRED_SYSTEM_PROMPT")
            .filter(|p| !p.trim().is_empty())
            .unwrap_or(defaults.system_prompt);

        Ok(Self {
            system_prompt,
            journal_offer_interval,
            max_history_turns,
            llm_timeout,
            http_port,
            ..defaults
        })
    }
}

/// LLM provider settings.
#[derive(Debug, Clone)]
pub struct LlmSettings;

impl LlmSettings {
    /// Build an [`LlmConfig`] from process environment variables.
    pub fn from_env() -> Result<LlmConfig, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<LlmConfig, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let backend = match lookup("KINDRED_LLM_BACKEND") {
            Some(raw) => raw
                .parse::<LlmBackend>()
                .map_err(|message| ConfigError::InvalidValue {
                    key: "KINDRED_LLM_BACKEND".to_string(),
                    message,
                })?,
            None => LlmBackend::Anthropic,
        };

        let key_var = backend.api_key_var();
        let api_key = lookup(key_var)
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingRequired {
                key: key_var.to_string(),
                hint: format!("export {key_var}=... before starting the bot"),
            })?;

        let model = lookup("KINDRED_MODEL")
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| backend.default_model().to_string());

        Ok(LlmConfig {
            backend,
            api_key: secrecy::SecretString::from(api_key),
            model,
        })
    }
}

/// Telegram channel settings; present only when a bot token is configured.
#[derive(Debug, Clone)]
pub struct TelegramConfig {
    pub bot_token: secrecy::SecretString,
    /// Usernames or numeric ids allowed to talk to the bot; `*` allows everyone.
    pub allowed_users: Vec<String>,
}

impl TelegramConfig {
    pub fn from_env() -> Option<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Option<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let token = lookup("TELEGRAM_BOT_TOKEN").filter(|t| !t.trim().is_empty())?;
        let allowed_users = lookup("TELEGRAM_ALLOWED_USERS")
            .unwrap_or_else(|| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        Some(Self {
            bot_token: secrecy::SecretString::from(token.trim().to_string()),
            allowed_users,
        })
    }

    pub fn allows_everyone(&self) -> bool {
        self.allowed_users.iter().any(|u| u == "*")
    }
}

fn parse_positive<F>(lookup: &F, key: &str) -> Result<Option<u64>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(key) else {
        return Ok(None);
    };
    match raw.trim().parse::<u64>() {
        Ok(0) => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: "must be at least 1".to_string(),
        }),
        Ok(value) => Ok(Some(value)),
        Err(e) => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        }),
    }
}
