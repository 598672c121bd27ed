//! Main companion loop.
//!
//! Pulls messages from every channel, queues them per user, and sends back
//! whatever the commands or the conversation router produce.

use std::collections::HashMap;
use std::sync::Arc;

use futures::StreamExt;
use tokio::sync::mpsc;
use tokio::task::JoinSet;

use crate::channels::{ChannelManager, IncomingMessage, OutgoingResponse, StatusUpdate};
use crate::error::Error;

use super::commands::{Command, CommandParser};
use super::exercises::{ExerciseGuide, MENU_TEXT};
use super::router::ConversationRouter;

/// Sent when handling a message panics or otherwise dies.
pub const GENERIC_APOLOGY: &str =
    "Sorry, something went wrong on my side. Could you say that again? 🙏";

/// Collapse `text` to one line of at most `max_chars` characters for logs.
pub fn truncate_for_log(text: &str, max_chars: usize) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    match collapsed.char_indices().nth(max_chars) {
        Some((byte_offset, _)) => format!("{}...", &collapsed[..byte_offset]),
        None => collapsed,
    }
}

/// One inbox per user, each drained by its own worker task.
///
/// A user's messages are handled one at a time in arrival order; different
/// users are handled concurrently.
#[derive(Default)]
struct UserQueues {
    inboxes: HashMap<String, mpsc::UnboundedSender<IncomingMessage>>,
}

impl UserQueues {
    fn enqueue(
        &mut self,
        companion: &Companion,
        tasks: &mut JoinSet<()>,
        message: IncomingMessage,
    ) {
        let message = match self.inboxes.get(&message.user_id) {
            Some(inbox) => match inbox.send(message) {
                Ok(()) => return,
                // Worker is gone; start a fresh one below.
                Err(mpsc::error::SendError(message)) => message,
            },
            None => message,
        };

        let (inbox, rx) = mpsc::unbounded_channel();
        let user_id = message.user_id.clone();
        if inbox.send(message).is_err() {
            return;
        }
        tracing::debug!(user_id = %user_id, "Starting user worker");
        self.inboxes.insert(user_id, inbox);
        tasks.spawn(companion.clone().drain(rx));
    }
}

/// Ties channels, commands and the conversation router together.
#[derive(Clone)]
pub struct Companion {
    name: String,
    channels: Arc<ChannelManager>,
    router: Arc<ConversationRouter>,
    exercises: Arc<ExerciseGuide>,
    commands: CommandParser,
}

impl Companion {
    pub fn new(
        name: impl Into<String>,
        channels: ChannelManager,
        router: ConversationRouter,
        exercises: ExerciseGuide,
        commands: CommandParser,
    ) -> Self {
        Self {
            name: name.into(),
            channels: Arc::new(channels),
            router: Arc::new(router),
            exercises: Arc::new(exercises),
            commands,
        }
    }

    pub fn router(&self) -> &Arc<ConversationRouter> {
        &self.router
    }

    /// Run until Ctrl+C or until every channel stream ends.
    ///
    /// On Ctrl+C in-flight turns are aborted; when the streams end, queued
    /// messages are still answered before channels shut down.
    pub async fn run(self) -> Result<(), Error> {
        let mut message_stream = self.channels.start_all().await?;
        let mut queues = UserQueues::default();
        let mut tasks = JoinSet::new();

        tracing::info!("Companion {} ready and listening", self.name);

        let interrupted = loop {
            let message = tokio::select! {
                biased;
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Ctrl+C received, shutting down...");
                    break true;
                }
                msg = message_stream.next() => {
                    match msg {
                        Some(m) => m,
                        None => {
                            tracing::info!("All channel streams ended, shutting down...");
                            break false;
                        }
                    }
                }
            };

            // Reap workers that exited early.
            while let Some(done) = tasks.try_join_next() {
                if let Err(e) = done {
                    tracing::error!(error = %e, "User worker failed");
                }
            }

            queues.enqueue(&self, &mut tasks, message);
        };

        tracing::info!("Companion shutting down...");
        drop(queues);
        if interrupted {
            tasks.shutdown().await;
        } else {
            while let Some(done) = tasks.join_next().await {
                if let Err(e) = done {
                    tracing::error!(error = %e, "User worker failed");
                }
            }
        }
        self.channels.shutdown_all().await?;

        Ok(())
    }

    /// Answer one user's messages strictly in the order they arrived.
    async fn drain(self, mut inbox: mpsc::UnboundedReceiver<IncomingMessage>) {
        while let Some(message) = inbox.recv().await {
            self.process(message).await;
        }
    }

    /// Handle one message end to end, including delivery.
    async fn process(&self, message: IncomingMessage) {
        let channels = Arc::clone(&self.channels);
        let companion = self.clone();
        let msg = message.clone();

        // Run the turn in its own task so a panic is reported to the user.
        let turn = tokio::spawn(async move { companion.dispatch(&msg).await });
        let responses = match turn.await {
            Ok(responses) => responses,
            Err(e) => {
                tracing::error!(user_id = %message.user_id, error = %e, "Error handling message");
                vec![OutgoingResponse::text(GENERIC_APOLOGY)]
            }
        };

        for mut response in responses {
            if let Some(delay) = response.delay.take() {
                tokio::time::sleep(delay).await;
            }
            if let Err(e) = channels.respond(&message, response).await {
                tracing::warn!(
                    channel = %message.channel,
                    user_id = %message.user_id,
                    error = %e,
                    "Failed to send response"
                );
            }
        }
    }

    /// Decide the replies to one message without sending them.
    pub async fn dispatch(&self, message: &IncomingMessage) -> Vec<OutgoingResponse> {
        let content = message.content.trim();
        if content.is_empty() {
            return Vec::new();
        }

        tracing::debug!(
            channel = %message.channel,
            user_id = %message.user_id,
            text = %truncate_for_log(content, 100),
            "Received message"
        );

        if let Some(command) = self.commands.parse(content) {
            return self.run_command(command).await;
        }

        let _ = self
            .channels
            .send_status(
                &message.channel,
                StatusUpdate::Thinking("Thinking...".into()),
                &message.metadata,
            )
            .await;

        self.router.route(&message.user_id, content).await
    }

    async fn run_command(&self, command: Command) -> Vec<OutgoingResponse> {
        match command {
            Command::Menu => vec![ExerciseGuide::menu(MENU_TEXT)],
            Command::Help => vec![OutgoingResponse::text(self.commands.help_text())],
            Command::Exercise(exercise) => self.exercises.run(exercise).await,
            Command::Unknown(name) => vec![OutgoingResponse::text(format!(
                "Unknown command: {}{name}. Type {}help to see what I can do.",
                self.commands.prefix(),
                self.commands.prefix()
            ))],
        }
    }
}
