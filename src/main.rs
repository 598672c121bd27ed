use std::sync::Arc;

use anyhow::Context;
use secrecy::ExposeSecret;

use kindred::agent::{CommandParser, Companion, ConversationRouter, ExerciseGuide};
use kindred::api::{ApiState, api_routes};
use kindred::channels::{ChannelManager, CliChannel, TelegramChannel};
use kindred::config::{CompanionConfig, LlmSettings, TelegramConfig};
use kindred::llm::{CompletionClient, create_provider};
use kindred::safety::SafetyLayer;
use kindred::store::ProfileStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = CompanionConfig::from_env().context("invalid companion configuration")?;
    let llm_config = LlmSettings::from_env().context("invalid LLM configuration")?;

    eprintln!("🌱 Kindred v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Model: {}", llm_config.model);
    eprintln!(
        "   Journal offer: every {} messages",
        config.journal_offer_interval
    );

    let llm = create_provider(&llm_config).context("failed to create LLM provider")?;
    let client = CompletionClient::new(llm).with_timeout(config.llm_timeout);

    let store = Arc::new(ProfileStore::new(config.max_history_turns));
    let safety = Arc::new(SafetyLayer::new());
    let router = ConversationRouter::new(Arc::clone(&store), client.clone(), safety, &config);
    let exercises = ExerciseGuide::new(client);

    // ── HTTP status API ─────────────────────────────────────────────────
    if let Some(port) = config.http_port {
        let app = api_routes(ApiState {
            store: Arc::clone(&store),
        });
        let listener = tokio::net::TcpListener::bind(("0.0.0.0", port))
            .await
            .with_context(|| format!("failed to bind status API on port {port}"))?;
        eprintln!("   Status API: http://0.0.0.0:{port}/api/health");
        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!(error = %e, "Status API server stopped");
            }
        });
    }

    // ── Channels ────────────────────────────────────────────────────────
    let mut channels = ChannelManager::new();
    channels.add(Box::new(CliChannel::new(config.command_prefix.clone())));

    if let Some(telegram) = TelegramConfig::from_env() {
        eprintln!(
            "   Telegram: enabled (allowed: {})",
            if telegram.allows_everyone() {
                "everyone".to_string()
            } else {
                telegram.allowed_users.join(", ")
            }
        );
        let channel = TelegramChannel::new(
            telegram.bot_token.expose_secret().to_string(),
            telegram.allowed_users,
        )
        .with_command_prefix(config.command_prefix.clone());
        channels.add(Box::new(channel));
    }

    eprintln!("   Channels: {}", channels.channel_names().join(", "));
    for (name, health) in channels.health_check_all().await {
        if let Err(e) = health {
            tracing::warn!(channel = %name, error = %e, "Channel health check failed");
        }
    }
    eprintln!(
        "   Type a message and press Enter. {}menu for exercises, Ctrl+C to exit.\n",
        config.command_prefix
    );

    let companion = Companion::new(
        config.name.clone(),
        channels,
        router,
        exercises,
        CommandParser::new(config.command_prefix.clone()),
    );
    companion.run().await?;

    Ok(())
}
