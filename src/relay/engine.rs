//! Relay engine - serializes inbound events against the shared conversation.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::openai::{Completer, Error as CompletionError};
use crate::relay::command::{Command, Event};
use crate::relay::conversation::Conversation;
use crate::relay::prompt;

/// Sent to the chat whenever the completion call fails.
pub const FAILURE_NOTICE: &str = "[Failed to generate response]";

/// A text message as delivered by the transport.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    pub speaker: String,
    pub text: String,
    pub channel_id: i64,
}

#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Only this chat is served when set.
    pub channel_id: Option<i64>,
    pub completion_timeout: Duration,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            channel_id: None,
            completion_timeout: Duration::from_secs(30),
        }
    }
}

pub struct RelayEngine {
    config: RelayConfig,
    conversation: Mutex<Conversation>,
    completer: Arc<dyn Completer>,
}

impl RelayEngine {
    pub fn new(config: RelayConfig, completer: Arc<dyn Completer>) -> Self {
        Self {
            config,
            conversation: Mutex::new(Conversation::new()),
            completer,
        }
    }

    /// Whether events from this chat are handled at all.
    pub fn accepts(&self, channel_id: i64) -> bool {
        self.config.channel_id.is_none_or(|id| id == channel_id)
    }

    /// Snapshot of the current state.
    pub async fn conversation(&self) -> Conversation {
        self.conversation.lock().await.clone()
    }

    /// Handle one inbound message and return the reply, if any.
    ///
    /// The conversation lock is held for the whole call, completion
    /// included, so concurrent events never interleave.
    pub async fn handle(&self, msg: InboundMessage) -> Option<String> {
        if !self.accepts(msg.channel_id) {
            debug!("Ignoring message from chat {}", msg.channel_id);
            return None;
        }

        let event = match Event::parse(&msg.speaker, &msg.text) {
            Ok(event) => event,
            Err(e) => {
                info!("Rejected command from {}: {e}", msg.speaker);
                return Some(e.to_string());
            }
        };

        let mut conversation = self.conversation.lock().await;

        let reply = match event {
            Event::Command { command, argument } => {
                let result = Command::from_token(&command)
                    .and_then(|cmd| conversation.apply(cmd, &argument));
                match result {
                    Ok(confirmation) => {
                        info!("⚙️ {} ran {command}", msg.speaker);
                        confirmation
                    }
                    Err(e) => {
                        info!("Command {command} from {} failed: {e}", msg.speaker);
                        e.to_string()
                    }
                }
            }
            Event::Chat { speaker, text } => self.converse(&mut conversation, &speaker, &text).await,
        };

        Some(reply)
    }

    async fn converse(&self, conversation: &mut Conversation, speaker: &str, text: &str) -> String {
        if let Err(reason) = conversation.check_eligible(speaker) {
            debug!("Not forwarding message from {speaker}: {reason:?}");
            return reason.to_string();
        }

        conversation.record(speaker, text);

        let prompt = prompt::render(&conversation.bot_name, &conversation.identity, &conversation.transcript);
        let stop = prompt::stop_sequences(&conversation.participants);
        info!(
            "🤖 Completing for {speaker}: {} chars, {} transcript line(s)",
            prompt.len(),
            conversation.transcript.len()
        );

        match self.complete(&prompt, &stop).await {
            Ok(reply) => {
                let bot_name = conversation.bot_name.clone();
                conversation.record(&bot_name, &reply);
                reply
            }
            Err(e) => {
                warn!("Completion failed: {e}");
                FAILURE_NOTICE.to_string()
            }
        }
    }

    async fn complete(&self, prompt: &str, stop: &[String]) -> Result<String, CompletionError> {
        tokio::time::timeout(self.config.completion_timeout, self.completer.complete(prompt, stop))
            .await
            .map_err(|_| CompletionError::Timeout)?
    }
}
