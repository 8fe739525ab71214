//! Command recognition for inbound chat lines.

use std::fmt;

/// Lines starting with this character are commands.
pub const COMMAND_PREFIX: char = '!';

/// A classified inbound line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// `command` keeps the prefix, e.g. `!setname`.
    Command { command: String, argument: String },
    Chat { speaker: String, text: String },
}

impl Event {
    /// Classify a line. Commands must carry an argument after the first
    /// whitespace, even the ones that ignore it.
    pub fn parse(speaker: &str, text: &str) -> Result<Self, CommandError> {
        if !text.starts_with(COMMAND_PREFIX) {
            return Ok(Event::Chat {
                speaker: speaker.to_string(),
                text: text.to_string(),
            });
        }

        let (command, argument) = text
            .split_once(char::is_whitespace)
            .ok_or(CommandError::MissingArgument)?;
        let argument = argument.trim();
        if argument.is_empty() {
            return Err(CommandError::MissingArgument);
        }

        Ok(Event::Command {
            command: command.to_string(),
            argument: argument.to_string(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    SetName,
    SetIdentity,
    AddParticipant,
    RemoveParticipant,
    Clear,
    ClearLogs,
    ClearIdentity,
}

impl Command {
    pub fn from_token(token: &str) -> Result<Self, CommandError> {
        match token {
            "!setname" => Ok(Command::SetName),
            "!setidentity" => Ok(Command::SetIdentity),
            "!adduser" => Ok(Command::AddParticipant),
            "!removeuser" => Ok(Command::RemoveParticipant),
            "!clear" => Ok(Command::Clear),
            "!clearlogs" => Ok(Command::ClearLogs),
            "!clearidentity" => Ok(Command::ClearIdentity),
            other => Err(CommandError::UnknownCommand(other.to_string())),
        }
    }
}

/// Command failures. All are reported back to the chat; none mutate state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    MissingArgument,
    UnknownCommand(String),
    ParticipantLimit(usize),
    ParticipantNotFound(String),
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingArgument => write!(f, "Argument for command not found"),
            Self::UnknownCommand(token) => write!(f, "Unknown command: {token}"),
            Self::ParticipantLimit(max) => write!(f, "Conversation partner limit ({max}) reached"),
            Self::ParticipantNotFound(name) => write!(f, "Conversation partner not found: {name}"),
        }
    }
}

impl std::error::Error for CommandError {}
