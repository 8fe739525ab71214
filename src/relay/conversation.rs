//! Conversation state: persona, participant allow-list and transcript.

use std::fmt;

use crate::relay::command::{Command, CommandError};

/// Hard cap on participants; the completion API accepts at most four stop
/// sequences and each participant needs one.
pub const MAX_PARTICIPANTS: usize = 4;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Conversation {
    pub bot_name: String,
    pub identity: String,
    pub participants: Vec<String>,
    pub transcript: Vec<String>,
}

/// Why a chat message was not forwarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ineligible {
    NotParticipant,
    NoName,
    NoIdentity,
}

impl fmt::Display for Ineligible {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotParticipant => write!(
                f,
                "You are not set as a conversation partner, please use the command below to join the conversation:\n!adduser [user name]"
            ),
            Self::NoName => write!(
                f,
                "The bot has no name, please use the command below:\n!setname [name]"
            ),
            Self::NoIdentity => write!(
                f,
                "The bot has no identity, please use the command below:\n!setidentity [story]"
            ),
        }
    }
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a command and return the confirmation for the chat.
    pub fn apply(&mut self, command: Command, argument: &str) -> Result<String, CommandError> {
        match command {
            Command::SetName => {
                self.bot_name = argument.to_string();
                Ok(format!("New bot name: {}", self.bot_name))
            }
            Command::SetIdentity => {
                self.identity = argument.to_string();
                Ok(format!("New identity: {}", self.identity))
            }
            Command::AddParticipant => {
                if self.participants.len() >= MAX_PARTICIPANTS {
                    return Err(CommandError::ParticipantLimit(MAX_PARTICIPANTS));
                }
                self.participants.push(argument.to_string());
                Ok(format!("New conversation partner added: {argument}"))
            }
            Command::RemoveParticipant => {
                let idx = self
                    .participants
                    .iter()
                    .position(|p| p == argument)
                    .ok_or_else(|| CommandError::ParticipantNotFound(argument.to_string()))?;
                self.participants.swap_remove(idx);
                Ok(format!("Conversation partner removed: {argument}"))
            }
            Command::Clear => {
                *self = Self::default();
                Ok("All parameters (name, identity, chat log, participants) are cleared".to_string())
            }
            Command::ClearLogs => {
                self.transcript.clear();
                Ok("Cleared chat logs".to_string())
            }
            Command::ClearIdentity => {
                self.identity.clear();
                self.transcript.clear();
                Ok("Cleared identity and former chat logs".to_string())
            }
        }
    }

    /// Check whether `speaker` may talk to the bot right now.
    ///
    /// Membership is checked first, so an empty allow-list always reports
    /// `NotParticipant`.
    pub fn check_eligible(&self, speaker: &str) -> Result<(), Ineligible> {
        if !self.participants.iter().any(|p| p == speaker) {
            return Err(Ineligible::NotParticipant);
        }
        if self.bot_name.is_empty() {
            return Err(Ineligible::NoName);
        }
        if self.identity.is_empty() {
            return Err(Ineligible::NoIdentity);
        }
        Ok(())
    }

    pub fn record(&mut self, speaker: &str, text: &str) {
        self.transcript.push(format!("{speaker}: {text}"));
    }
}
