//! Relay module - conversation state, prompt building and Telegram glue.

pub mod command;
pub mod conversation;
pub mod engine;
pub mod prompt;
pub mod telegram;


pub use engine::{InboundMessage, RelayConfig, RelayEngine};
pub use telegram::TelegramClient;
