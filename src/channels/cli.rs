//! CLI channel — stdin/stdout REPL for local testing.

use async_trait::async_trait;
use futures::stream;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::channels::{
    Channel, IncomingMessage, MessageStream, OutgoingResponse, ReplyButton, StatusUpdate,
};
use crate::error::ChannelError;

/// A simple CLI channel that reads from stdin and writes to stdout.
///
/// Buttons can't be pressed here, so they are printed with the command to
/// type instead.
pub struct CliChannel {
    command_prefix: String,
}

impl CliChannel {
    pub fn new(command_prefix: impl Into<String>) -> Self {
        Self {
            command_prefix: command_prefix.into(),
        }
    }

    fn render(&self, response: &OutgoingResponse) -> String {
        let mut out = response.content.clone();
        if !response.buttons.is_empty() {
            out.push('\n');
            for ReplyButton { label, command } in &response.buttons {
                out.push_str(&format!("\n  [{label}] → {}{command}", self.command_prefix));
            }
        }
        out
    }
}

impl Default for CliChannel {
    fn default() -> Self {
        Self::new("!")
    }
}

#[async_trait]
impl Channel for CliChannel {
    fn name(&self) -> &str {
        "cli"
    }

    async fn start(&self) -> Result<MessageStream, ChannelError> {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();

        tokio::spawn(async move {
            let stdin = tokio::io::stdin();
            let reader = BufReader::new(stdin);
            let mut lines = reader.lines();

            eprint!("> ");

            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        let line = line.trim().to_string();
                        if line.is_empty() {
                            eprint!("> ");
                            continue;
                        }
                        let msg = IncomingMessage::new("cli", "local-user", &line)
                            .with_user_name("you");
                        if tx.send(msg).is_err() {
                            break;
                        }
                    }
                    Ok(None) => break, // EOF
                    Err(e) => {
                        tracing::error!(error = %e, "Error reading stdin");
                        break;
                    }
                }
            }
        });

        let stream = stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|msg| (msg, rx))
        });

        Ok(Box::pin(stream))
    }

    async fn respond(
        &self,
        _msg: &IncomingMessage,
        response: OutgoingResponse,
    ) -> Result<(), ChannelError> {
        println!("\n{}\n", self.render(&response));
        eprint!("> ");
        Ok(())
    }

    async fn send_status(
        &self,
        status: StatusUpdate,
        _metadata: &serde_json::Value,
    ) -> Result<(), ChannelError> {
        match status {
            StatusUpdate::Thinking(msg) => eprintln!("⏳ {msg}"),
            StatusUpdate::Status(msg) => eprintln!("ℹ️  {msg}"),
        }
        Ok(())
    }

    async fn health_check(&self) -> Result<(), ChannelError> {
        Ok(())
    }

    async fn shutdown(&self) -> Result<(), ChannelError> {
        Ok(())
    }
}
