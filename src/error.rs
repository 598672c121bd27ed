//! Error types for Kindred.

use std::time::Duration;

/// Top-level error type for the companion.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required configuration: {key}. {hint}")]
    MissingRequired { key: String, hint: String },

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Channel-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("Channel {name} failed to start: {reason}")]
    StartupFailed { name: String, reason: String },

    #[error("Failed to send response on channel {name}: {reason}")]
    SendFailed { name: String, reason: String },

    #[error("No channel registered under name {0}")]
    UnknownChannel(String),
}

/// LLM provider errors.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Provider {provider} request failed: {reason}")]
    RequestFailed { provider: String, reason: String },

    #[error("Invalid response from {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },

    #[error("Provider {provider} did not answer within {timeout:?}")]
    Timeout { provider: String, timeout: Duration },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Mood classification and synthesis errors.
#[derive(Debug, thiserror::Error)]
pub enum JournalError {
    #[error("Mood classification failed: {0}")]
    Classification(#[source] LlmError),

    #[error("Mood classification response had no \"mood\" field")]
    MissingMood,

    #[error("Mood label {0:?} is not part of the taxonomy")]
    UnknownMood(String),

    #[error("Conversation synthesis failed: {0}")]
    Synthesis(#[source] LlmError),

    #[error("Conversation synthesis came back empty")]
    EmptySynthesis,
}
