//! Telegram channel — long-polls the Bot API for updates.
//!
//! Text messages become [`IncomingMessage`]s. Reply buttons are rendered as
//! an inline keyboard; when one is pressed the callback query is answered
//! right away (so the client stops its spinner) and the button's command is
//! delivered as a normal prefixed command message.

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::channels::{
    Channel, IncomingMessage, MessageStream, OutgoingResponse, ReplyButton, StatusUpdate,
};
use crate::error::ChannelError;

/// Maximum message length for Telegram's sendMessage API.
const TELEGRAM_MAX_MESSAGE_LENGTH: usize = 4096;

/// Telegram channel — connects to the Bot API via long-polling.
pub struct TelegramChannel {
    bot_token: String,
    allowed_users: Vec<String>,
    command_prefix: String,
    client: reqwest::Client,
}

/// What a single `getUpdates` entry turned into.
#[derive(Debug)]
enum ParsedUpdate {
    Message(IncomingMessage),
    /// A button press: acknowledge `callback_id`, then deliver `message`.
    Callback {
        callback_id: String,
        message: IncomingMessage,
    },
    Ignored,
}

impl TelegramChannel {
    pub fn new(bot_token: String, allowed_users: Vec<String>) -> Self {
        Self {
            bot_token,
            allowed_users,
            command_prefix: "!".to_string(),
            client: reqwest::Client::new(),
        }
    }

    pub fn with_command_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.command_prefix = prefix.into();
        self
    }

    fn api_url(&self, method: &str) -> String {
        api_url(&self.bot_token, method)
    }

    /// Check if a username is in the allowed list.
    pub fn is_user_allowed(&self, username: &str) -> bool {
        self.allowed_users.iter().any(|u| u == "*" || u == username)
    }

    /// Check if any of the provided identities is allowed.
    pub fn is_any_user_allowed<'a, I>(&self, identities: I) -> bool
    where
        I: IntoIterator<Item = &'a str>,
    {
        check_user_allowed(&self.allowed_users, identities)
    }

    /// Send a text message, splitting it to fit Telegram's limit. The
    /// keyboard (if any) is attached to the last chunk.
    async fn send_message(
        &self,
        chat_id: &str,
        text: &str,
        buttons: &[ReplyButton],
    ) -> Result<(), ChannelError> {
        let chunks = split_message(text, TELEGRAM_MAX_MESSAGE_LENGTH);
        let last = chunks.len().saturating_sub(1);

        for (i, chunk) in chunks.iter().enumerate() {
            let keyboard: &[ReplyButton] = if i == last { buttons } else { &[] };
            self.send_message_chunk(chat_id, chunk, keyboard).await?;
        }
        Ok(())
    }

    async fn send_message_chunk(
        &self,
        chat_id: &str,
        text: &str,
        buttons: &[ReplyButton],
    ) -> Result<(), ChannelError> {
        let body = message_body(chat_id, text, buttons);

        let resp = self
            .client
            .post(self.api_url("sendMessage"))
            .json(&body)
            .send()
            .await
            .map_err(|e| ChannelError::SendFailed {
                name: "telegram".into(),
                reason: e.to_string(),
            })?;

        if !resp.status().is_success() {
            let status = resp.status();
            let err = resp.text().await.unwrap_or_default();
            return Err(ChannelError::SendFailed {
                name: "telegram".into(),
                reason: format!("sendMessage returned {status}: {err}"),
            });
        }

        Ok(())
    }
}

// ── Channel trait implementation ────────────────────────────────────

#[async_trait]
impl Channel for TelegramChannel {
    fn name(&self) -> &str {
        "telegram"
    }

    async fn start(&self) -> Result<MessageStream, ChannelError> {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        let bot_token = self.bot_token.clone();
        let allowed_users = self.allowed_users.clone();
        let prefix = self.command_prefix.clone();
        let client = self.client.clone();

        tokio::spawn(async move {
            let mut offset: i64 = 0;

            tracing::info!("Telegram channel listening for messages...");

            loop {
                let body = json!({
                    "offset": offset,
                    "timeout": 30,
                    "allowed_updates": ["message", "callback_query"]
                });

                let resp = match client
                    .post(api_url(&bot_token, "getUpdates"))
                    .json(&body)
                    .send()
                    .await
                {
                    Ok(r) => r,
                    Err(e) => {
                        tracing::warn!(error = %e, "Telegram poll error");
                        tokio::time::sleep(std::time::Duration::from_secs(5)).await;
                        continue;
                    }
                };

                let data: Value = match resp.json().await {
                    Ok(d) => d,
                    Err(e) => {
                        tracing::warn!(error = %e, "Telegram parse error");
                        tokio::time::sleep(std::time::Duration::from_secs(5)).await;
                        continue;
                    }
                };

                let Some(results) = data.get("result").and_then(Value::as_array) else {
                    continue;
                };

                for update in results {
                    if let Some(uid) = update.get("update_id").and_then(Value::as_i64) {
                        offset = uid + 1;
                    }

                    let incoming = match parse_update(update, &allowed_users, &prefix) {
                        ParsedUpdate::Message(m) => m,
                        ParsedUpdate::Callback {
                            callback_id,
                            message,
                        } => {
                            // Deferred ack; the real answer follows as a message.
                            let ack = client
                                .post(api_url(&bot_token, "answerCallbackQuery"))
                                .json(&json!({ "callback_query_id": callback_id }))
                                .send()
                                .await;
                            if let Err(e) = ack {
                                tracing::warn!(error = %e, "Telegram answerCallbackQuery failed");
                            }
                            message
                        }
                        ParsedUpdate::Ignored => continue,
                    };

                    if tx.send(incoming).is_err() {
                        tracing::info!("Telegram listener channel closed");
                        return;
                    }
                }
            }
        });

        let stream = futures::stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|msg| (msg, rx))
        });

        Ok(Box::pin(stream))
    }

    async fn respond(
        &self,
        msg: &IncomingMessage,
        response: OutgoingResponse,
    ) -> Result<(), ChannelError> {
        let chat_id = msg
            .metadata
            .get("chat_id")
            .and_then(|v| v.as_str())
            .ok_or_else(|| ChannelError::SendFailed {
                name: "telegram".into(),
                reason: "No chat_id in message metadata".into(),
            })?;

        self.send_message(chat_id, &response.content, &response.buttons)
            .await
    }

    async fn send_status(
        &self,
        status: StatusUpdate,
        metadata: &Value,
    ) -> Result<(), ChannelError> {
        let Some(chat_id) = metadata.get("chat_id").and_then(|v| v.as_str()) else {
            return Ok(());
        };
        match status {
            StatusUpdate::Thinking(_) => {
                let _ = self
                    .client
                    .post(self.api_url("sendChatAction"))
                    .json(&json!({
                        "chat_id": chat_id,
                        "action": "typing"
                    }))
                    .send()
                    .await;
            }
            StatusUpdate::Status(ref msg) if !msg.is_empty() => {
                let _ = self.send_message(chat_id, &format!("ℹ️ {msg}"), &[]).await;
            }
            StatusUpdate::Status(_) => {}
        }
        Ok(())
    }

    async fn health_check(&self) -> Result<(), ChannelError> {
        let resp = self
            .client
            .get(self.api_url("getMe"))
            .send()
            .await
            .map_err(|e| ChannelError::StartupFailed {
                name: "telegram".into(),
                reason: e.to_string(),
            })?;

        if resp.status().is_success() {
            Ok(())
        } else {
            Err(ChannelError::StartupFailed {
                name: "telegram".into(),
                reason: format!("getMe returned {}", resp.status()),
            })
        }
    }

    async fn shutdown(&self) -> Result<(), ChannelError> {
        tracing::info!("Telegram channel shutting down");
        Ok(())
    }
}

// ── Helpers ─────────────────────────────────────────────────────────

fn api_url(bot_token: &str, method: &str) -> String {
    format!("https://api.telegram.org/bot{bot_token}/{method}")
}

/// Check if any identity in the iterator matches the allowed users list.
fn check_user_allowed<'a>(
    allowed_users: &[String],
    identities: impl IntoIterator<Item = &'a str>,
) -> bool {
    let ids: Vec<&str> = identities.into_iter().collect();
    allowed_users
        .iter()
        .any(|u| u == "*" || ids.contains(&u.as_str()))
}

/// `sendMessage` payload, with an inline keyboard when buttons are present.
fn message_body(chat_id: &str, text: &str, buttons: &[ReplyButton]) -> Value {
    let mut body = json!({
        "chat_id": chat_id,
        "text": text,
    });
    if !buttons.is_empty() {
        // Two buttons per row.
        let rows: Vec<Vec<Value>> = buttons
            .chunks(2)
            .map(|row| {
                row.iter()
                    .map(|b| json!({ "text": b.label, "callback_data": b.command }))
                    .collect()
            })
            .collect();
        body["reply_markup"] = json!({ "inline_keyboard": rows });
    }
    body
}

/// Turn one update into an inbound message, applying the allowlist.
fn parse_update(update: &Value, allowed_users: &[String], prefix: &str) -> ParsedUpdate {
    if let Some(message) = update.get("message") {
        let Some(text) = message.get("text").and_then(Value::as_str) else {
            return ParsedUpdate::Ignored;
        };
        let chat_id = message.get("chat").and_then(|c| c.get("id"));
        return match build_incoming(message.get("from"), chat_id, text, allowed_users) {
            Some(m) => ParsedUpdate::Message(m),
            None => ParsedUpdate::Ignored,
        };
    }

    if let Some(query) = update.get("callback_query") {
        let Some(callback_id) = query.get("id").and_then(Value::as_str) else {
            return ParsedUpdate::Ignored;
        };
        let Some(data) = query.get("data").and_then(Value::as_str) else {
            return ParsedUpdate::Ignored;
        };
        let chat_id = query
            .get("message")
            .and_then(|m| m.get("chat"))
            .and_then(|c| c.get("id"));
        let content = format!("{prefix}{data}");
        return match build_incoming(query.get("from"), chat_id, &content, allowed_users) {
            Some(mut m) => {
                if let Some(meta) = m.metadata.as_object_mut() {
                    meta.insert("callback_query_id".into(), json!(callback_id));
                }
                ParsedUpdate::Callback {
                    callback_id: callback_id.to_string(),
                    message: m,
                }
            }
            None => ParsedUpdate::Ignored,
        };
    }

    ParsedUpdate::Ignored
}

fn build_incoming(
    from: Option<&Value>,
    chat_id: Option<&Value>,
    content: &str,
    allowed_users: &[String],
) -> Option<IncomingMessage> {
    let username = from
        .and_then(|f| f.get("username"))
        .and_then(Value::as_str)
        .unwrap_or("unknown");
    let user_id = from
        .and_then(|f| f.get("id"))
        .and_then(Value::as_i64)
        .map(|id| id.to_string());

    let mut identities = vec![username];
    if let Some(ref id) = user_id {
        identities.push(id.as_str());
    }
    if !check_user_allowed(allowed_users, identities) {
        tracing::warn!(
            username = %username,
            user_id = user_id.as_deref().unwrap_or("unknown"),
            "Telegram: ignoring message from unauthorized user"
        );
        return None;
    }

    let chat_id = chat_id
        .and_then(Value::as_i64)
        .map(|id| id.to_string())
        .unwrap_or_default();
    let first_name = from
        .and_then(|f| f.get("first_name"))
        .and_then(Value::as_str)
        .unwrap_or(username);

    Some(
        IncomingMessage::new("telegram", user_id.as_deref().unwrap_or(username), content)
            .with_metadata(json!({
                "chat_id": chat_id,
                "username": username,
            }))
            .with_user_name(first_name),
    )
}

/// Largest char boundary in `s` that is `<= index`.
fn floor_boundary(s: &str, index: usize) -> usize {
    let mut i = index.min(s.len());
    while !s.is_char_boundary(i) {
        i -= 1;
    }
    i
}

/// Split a message into chunks that fit Telegram's character limit.
/// Tries to split on newlines, then spaces, then hard-cuts.
fn split_message(text: &str, max_len: usize) -> Vec<String> {
    if text.len() <= max_len {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut remaining = text;

    while !remaining.is_empty() {
        if remaining.len() <= max_len {
            chunks.push(remaining.to_string());
            break;
        }

        let hard = floor_boundary(remaining, max_len);
        let chunk = &remaining[..hard];
        let split_at = chunk
            .rfind('\n')
            .or_else(|| chunk.rfind(' '))
            .filter(|&i| i > 0)
            .unwrap_or(hard);

        chunks.push(remaining[..split_at].to_string());
        remaining = remaining[split_at..].trim_start();
    }

    chunks
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn allow_all() -> Vec<String> {
        vec!["*".into()]
    }

    #[test]
    fn telegram_channel_name() {
        let ch = TelegramChannel::new("fake-token".into(), allow_all());
        assert_eq!(ch.name(), "telegram");
    }

    #[test]
    fn telegram_api_url() {
        let ch = TelegramChannel::new("123:ABC".into(), vec![]);
        assert_eq!(
            ch.api_url("answerCallbackQuery"),
            "https://api.telegram.org/bot123:ABC/answerCallbackQuery"
        );
    }

    // ── Allowlist ───────────────────────────────────────────────────

    #[test]
    fn telegram_user_allowed_wildcard() {
        let ch = TelegramChannel::new("t".into(), allow_all());
        assert!(ch.is_user_allowed("anyone"));
    }

    #[test]
    fn telegram_user_exact_match_not_substring() {
        let ch = TelegramChannel::new("t".into(), vec!["alice".into()]);
        assert!(ch.is_user_allowed("alice"));
        assert!(!ch.is_user_allowed("alice_bot"));
        assert!(!ch.is_user_allowed("malice"));
    }

    #[test]
    fn telegram_user_denied_empty() {
        let ch = TelegramChannel::new("t".into(), vec![]);
        assert!(!ch.is_user_allowed("anyone"));
    }

    #[test]
    fn telegram_user_allowed_by_numeric_id_identity() {
        let ch = TelegramChannel::new("t".into(), vec!["123456789".into()]);
        assert!(ch.is_any_user_allowed(["unknown", "123456789"]));
        assert!(!ch.is_any_user_allowed(["unknown", "42"]));
    }

    // ── Update parsing ──────────────────────────────────────────────

    fn text_update(text: &str) -> Value {
        json!({
            "update_id": 10,
            "message": {
                "text": text,
                "from": {"id": 42, "username": "sophie", "first_name": "Sophie"},
                "chat": {"id": 4242}
            }
        })
    }

    #[test]
    fn parses_text_message() {
        let ParsedUpdate::Message(msg) = parse_update(&text_update("hello"), &allow_all(), "!")
        else {
            panic!("expected a message");
        };
        assert_eq!(msg.user_id, "42");
        assert_eq!(msg.content, "hello");
        assert_eq!(msg.user_name.as_deref(), Some("Sophie"));
        assert_eq!(msg.metadata["chat_id"], "4242");
    }

    #[test]
    fn unauthorized_user_is_ignored() {
        let parsed = parse_update(&text_update("hello"), &["alice".to_string()], "!");
        assert!(matches!(parsed, ParsedUpdate::Ignored));
    }

    #[test]
    fn non_text_message_is_ignored() {
        let update = json!({"update_id": 1, "message": {"sticker": {}, "chat": {"id": 1}}});
        assert!(matches!(
            parse_update(&update, &allow_all(), "!"),
            ParsedUpdate::Ignored
        ));
    }

    #[test]
    fn callback_becomes_prefixed_command() {
        let update = json!({
            "update_id": 11,
            "callback_query": {
                "id": "cb-1",
                "data": "breathe",
                "from": {"id": 42, "username": "sophie"},
                "message": {"chat": {"id": 4242}}
            }
        });
        let ParsedUpdate::Callback {
            callback_id,
            message,
        } = parse_update(&update, &allow_all(), "!")
        else {
            panic!("expected a callback");
        };
        assert_eq!(callback_id, "cb-1");
        assert_eq!(message.content, "!breathe");
        assert_eq!(message.metadata["chat_id"], "4242");
        assert_eq!(message.metadata["callback_query_id"], "cb-1");
    }

    // ── Outgoing payloads ───────────────────────────────────────────

    #[test]
    fn message_body_without_buttons_has_no_markup() {
        let body = message_body("1", "hi", &[]);
        assert!(body.get("reply_markup").is_none());
    }

    #[test]
    fn message_body_lays_out_keyboard_in_rows_of_two() {
        let buttons = vec![
            ReplyButton::new("A", "a"),
            ReplyButton::new("B", "b"),
            ReplyButton::new("C", "c"),
        ];
        let body = message_body("1", "pick", &buttons);
        let rows = body["reply_markup"]["inline_keyboard"].as_array().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0][1]["callback_data"], "b");
        assert_eq!(rows[1][0]["text"], "C");
    }

    // ── Message splitting ───────────────────────────────────────────

    #[test]
    fn split_message_short() {
        assert_eq!(split_message("Hello", 4096), vec!["Hello"]);
    }

    #[test]
    fn split_message_over_limit_on_newline() {
        let msg = format!("{}\n{}", "a".repeat(2000), "b".repeat(3000));
        let chunks = split_message(&msg, 4096);
        assert_eq!(chunks, vec!["a".repeat(2000), "b".repeat(3000)]);
    }

    #[test]
    fn split_message_no_good_split_point() {
        let msg = "a".repeat(5000);
        let chunks = split_message(&msg, 4096);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].len(), 4096);
        assert_eq!(chunks[1].len(), 904);
    }

    #[test]
    fn split_message_respects_char_boundaries() {
        let msg = "🌱".repeat(10); // 4 bytes each
        let chunks = split_message(&msg, 10);
        assert!(chunks.iter().all(|c| c.len() <= 10));
        assert_eq!(chunks.concat(), msg);
    }
}
