//! Line input parsing.
//!
//! Lines starting with `/` are commands; anything else is a chat message.
//! A leading `//` sends the rest of the line literally, starting with `/`.

use belay_proto::RoomId;
use thiserror::Error;

/// Parsed line of user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Send text to the mounted room.
    Say(String),
    /// Switch to another room (`/room <id>`).
    Room(RoomId),
    /// Unmount the current room (`/leave`).
    Leave,
    /// Exit (`/quit`).
    Quit,
    /// Show usage (`/help`).
    Help,
}

/// Input that could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    /// Unrecognized `/command`.
    #[error("unknown command: /{0}")]
    UnknownCommand(String),

    /// `/room` without a positive integer argument.
    #[error("usage: /room <id>, got {0:?}")]
    InvalidRoom(String),
}

/// One-line usage summary.
pub const HELP: &str = "/room <id> switch room, /leave close room, /quit exit, //text sends /text";

impl Command {
    /// Parse a submitted line.
    pub fn parse(line: &str) -> Result<Self, InputError> {
        let line = line.trim_end_matches(['\r', '\n']);

        if let Some(literal) = line.strip_prefix("//") {
            return Ok(Self::Say(format!("/{literal}")));
        }

        let Some(rest) = line.strip_prefix('/') else {
            return Ok(Self::Say(line.to_string()));
        };

        let mut parts = rest.split_whitespace();
        let name = parts.next().unwrap_or_default();
        let argument = parts.next().unwrap_or_default();

        match name {
            "room" | "r" => match argument.parse::<RoomId>() {
                Ok(room_id) if room_id > 0 => Ok(Self::Room(room_id)),
                _ => Err(InputError::InvalidRoom(argument.to_string())),
            },
            "leave" => Ok(Self::Leave),
            "quit" | "q" => Ok(Self::Quit),
            "help" | "h" => Ok(Self::Help),
            other => Err(InputError::UnknownCommand(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_said() {
        assert_eq!(Command::parse("hello there\n"), Ok(Command::Say("hello there".to_string())));
    }

    #[test]
    fn room_switch() {
        assert_eq!(Command::parse("/room 42"), Ok(Command::Room(42)));
        assert_eq!(Command::parse("/r 7"), Ok(Command::Room(7)));
    }

    #[test]
    fn room_zero_and_garbage_are_rejected() {
        assert_eq!(Command::parse("/room 0"), Err(InputError::InvalidRoom("0".to_string())));
        assert_eq!(Command::parse("/room"), Err(InputError::InvalidRoom(String::new())));
        assert_eq!(Command::parse("/room abc"), Err(InputError::InvalidRoom("abc".to_string())));
    }

    #[test]
    fn double_slash_escapes() {
        assert_eq!(Command::parse("//shrug"), Ok(Command::Say("/shrug".to_string())));
    }

    #[test]
    fn unknown_command() {
        assert_eq!(
            Command::parse("/dance"),
            Err(InputError::UnknownCommand("dance".to_string()))
        );
    }
}
