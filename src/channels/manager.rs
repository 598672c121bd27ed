//! ChannelManager — owns every configured channel and merges their streams.

use std::collections::HashMap;
use std::sync::Arc;

use futures::stream;

use crate::channels::{Channel, IncomingMessage, MessageStream, OutgoingResponse, StatusUpdate};
use crate::error::ChannelError;

pub struct ChannelManager {
    channels: HashMap<String, Arc<dyn Channel>>,
}

impl ChannelManager {
    pub fn new() -> Self {
        Self {
            channels: HashMap::new(),
        }
    }

    /// Register a channel. A channel with the same name is replaced.
    pub fn add(&mut self, channel: Box<dyn Channel>) {
        let name = channel.name().to_string();
        tracing::debug!(channel = %name, "Registering channel");
        self.channels.insert(name, Arc::from(channel));
    }

    pub fn channel_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.channels.keys().cloned().collect();
        names.sort();
        names
    }

    /// Start every channel and merge their message streams.
    ///
    /// Channels that fail to start are logged and skipped; it is an error
    /// only when none start.
    pub async fn start_all(&self) -> Result<MessageStream, ChannelError> {
        let mut streams = Vec::with_capacity(self.channels.len());

        for (name, channel) in &self.channels {
            match channel.start().await {
                Ok(s) => {
                    tracing::info!(channel = %name, "Channel started");
                    streams.push(s);
                }
                Err(e) => tracing::error!(channel = %name, error = %e, "Channel failed to start"),
            }
        }

        if streams.is_empty() {
            return Err(ChannelError::StartupFailed {
                name: "all".into(),
                reason: "no channel could be started".into(),
            });
        }

        Ok(Box::pin(stream::select_all(streams)))
    }

    fn lookup(&self, name: &str) -> Result<&Arc<dyn Channel>, ChannelError> {
        self.channels
            .get(name)
            .ok_or_else(|| ChannelError::UnknownChannel(name.to_string()))
    }

    /// Send a reply on the channel `msg` arrived on.
    pub async fn respond(
        &self,
        msg: &IncomingMessage,
        response: OutgoingResponse,
    ) -> Result<(), ChannelError> {
        self.lookup(&msg.channel)?.respond(msg, response).await
    }

    pub async fn send_status(
        &self,
        channel_name: &str,
        status: StatusUpdate,
        metadata: &serde_json::Value,
    ) -> Result<(), ChannelError> {
        self.lookup(channel_name)?
            .send_status(status, metadata)
            .await
    }

    pub async fn health_check_all(&self) -> HashMap<String, Result<(), ChannelError>> {
        let mut results = HashMap::new();
        for (name, channel) in &self.channels {
            results.insert(name.clone(), channel.health_check().await);
        }
        results
    }

    pub async fn shutdown_all(&self) -> Result<(), ChannelError> {
        for (name, channel) in &self.channels {
            if let Err(e) = channel.shutdown().await {
                tracing::warn!(channel = %name, error = %e, "Channel shutdown failed");
            }
        }
        Ok(())
    }
}

impl Default for ChannelManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use futures::StreamExt;

    use super::*;

    type Sent = Arc<Mutex<Vec<String>>>;

    /// Emits a fixed set of messages and records replies.
    struct FakeChannel {
        name: &'static str,
        inbound: Vec<&'static str>,
        sent: Sent,
    }

    impl FakeChannel {
        fn boxed(name: &'static str, inbound: Vec<&'static str>) -> (Box<dyn Channel>, Sent) {
            let sent = Sent::default();
            let channel = Self {
                name,
                inbound,
                sent: Arc::clone(&sent),
            };
            (Box::new(channel), sent)
        }
    }

    #[async_trait]
    impl Channel for FakeChannel {
        fn name(&self) -> &str {
            self.name
        }

        async fn start(&self) -> Result<MessageStream, ChannelError> {
            let msgs: Vec<IncomingMessage> = self
                .inbound
                .iter()
                .map(|text| IncomingMessage::new(self.name, "u1", *text))
                .collect();
            Ok(Box::pin(stream::iter(msgs)))
        }

        async fn respond(
            &self,
            _msg: &IncomingMessage,
            response: OutgoingResponse,
        ) -> Result<(), ChannelError> {
            self.sent.lock().unwrap().push(response.content);
            Ok(())
        }

        async fn send_status(
            &self,
            _status: StatusUpdate,
            _metadata: &serde_json::Value,
        ) -> Result<(), ChannelError> {
            Ok(())
        }

        async fn health_check(&self) -> Result<(), ChannelError> {
            Ok(())
        }

        async fn shutdown(&self) -> Result<(), ChannelError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn start_all_merges_streams() {
        let mut manager = ChannelManager::new();
        manager.add(FakeChannel::boxed("a", vec!["one", "two"]).0);
        manager.add(FakeChannel::boxed("b", vec!["three"]).0);

        let stream = manager.start_all().await.unwrap();
        let mut contents: Vec<String> = stream.map(|m| m.content).collect().await;
        contents.sort();
        assert_eq!(contents, vec!["one", "three", "two"]);
    }

    #[tokio::test]
    async fn start_all_without_channels_fails() {
        let manager = ChannelManager::new();
        assert!(manager.start_all().await.is_err());
    }

    #[tokio::test]
    async fn respond_routes_by_channel_name() {
        let mut manager = ChannelManager::new();
        let (a, sent_a) = FakeChannel::boxed("a", vec![]);
        let (b, sent_b) = FakeChannel::boxed("b", vec![]);
        manager.add(a);
        manager.add(b);

        let msg = IncomingMessage::new("b", "u1", "hi");
        manager.respond(&msg, OutgoingResponse::text("hello")).await.unwrap();

        assert!(sent_a.lock().unwrap().is_empty());
        assert_eq!(*sent_b.lock().unwrap(), vec!["hello".to_string()]);
    }

    #[tokio::test]
    async fn respond_to_unknown_channel_errors() {
        let manager = ChannelManager::new();
        let msg = IncomingMessage::new("nowhere", "u1", "hi");
        let err = manager
            .respond(&msg, OutgoingResponse::text("x"))
            .await
            .unwrap_err();
        assert!(matches!(err, ChannelError::UnknownChannel(name) if name == "nowhere"));
    }

    #[test]
    fn channel_names_are_sorted() {
        let mut manager = ChannelManager::new();
        manager.add(FakeChannel::boxed("telegram", vec![]).0);
        manager.add(FakeChannel::boxed("cli", vec![]).0);
        assert_eq!(manager.channel_names(), vec!["cli", "telegram"]);
    }
}
