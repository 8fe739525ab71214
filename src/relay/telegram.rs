//! Telegram client using teloxide.

use teloxide::prelude::*;
use teloxide::types::{ChatAction, Message as TgMessage};
use tracing::warn;

use crate::relay::engine::InboundMessage;

/// Telegram API client.
pub struct TelegramClient {
    bot: Bot,
}

impl TelegramClient {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }

    /// Send plain text; user-supplied names and replies are not escaped.
    pub async fn send_message(&self, chat_id: i64, text: &str) -> Result<i64, String> {
        self.bot
            .send_message(ChatId(chat_id), text)
            .await
            .map(|msg| msg.id.0 as i64)
            .map_err(|e| {
                let msg = format!("Failed to send: {e}");
                warn!("{}", msg);
                msg
            })
    }

    /// Show the "typing..." indicator while a reply is produced.
    pub async fn send_typing(&self, chat_id: i64) -> Result<(), String> {
        self.bot
            .send_chat_action(ChatId(chat_id), ChatAction::Typing)
            .await
            .map(|_| ())
            .map_err(|e| {
                let msg = format!("Failed to send typing action: {e}");
                warn!("{}", msg);
                msg
            })
    }
}

/// Convert a Telegram message into an inbound event. Returns `None` for
/// messages without a sender or without text.
pub fn to_inbound(msg: &TgMessage) -> Option<InboundMessage> {
    let user = msg.from.as_ref()?;
    let text = msg.text()?;

    let speaker = user
        .username
        .clone()
        .unwrap_or_else(|| user.first_name.clone());

    Some(InboundMessage {
        speaker,
        text: text.to_string(),
        channel_id: msg.chat.id.0,
    })
}
