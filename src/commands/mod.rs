pub mod executable;
pub mod get;
pub mod ping;
pub mod set;

use bytes::Bytes;
use std::vec;
use thiserror::Error as ThisError;

use crate::commands::executable::Executable;
use crate::frame::Frame;
use crate::store::Store;

use get::Get;
use ping::Ping;
use set::Set;

#[derive(Debug, PartialEq)]
pub enum Command {
    Get(Get),
    Ping(Ping),
    Set(Set),
}

impl Executable for Command {
    fn exec(self, store: &Store) -> Frame {
        match self {
            Command::Get(cmd) => cmd.exec(store),
            Command::Ping(cmd) => cmd.exec(store),
            Command::Set(cmd) => cmd.exec(store),
        }
    }
}

impl TryFrom<Frame> for Command {
    type Error = CommandParserError;

    fn try_from(frame: Frame) -> Result<Self, Self::Error> {
        // Clients send commands to the server as RESP arrays.
        let frames = match frame {
            Frame::Array(array) => array,
            frame => {
                return Err(CommandParserError::InvalidFrame {
                    expected: "array".to_string(),
                    actual: frame,
                })
            }
        };

        let mut parts = frames.into_iter();
        let command_name = match parts.next() {
            Some(frame) => parse_command_name(frame)?,
            None => return Err(CommandParserError::EmptyCommand),
        };

        let parser = &mut CommandParser {
            command: command_name.to_lowercase(),
            parts,
        };

        match &command_name[..] {
            "GET" => Get::try_from(parser).map(Command::Get),
            "PING" => Ping::try_from(parser).map(Command::Ping),
            "SET" => Set::try_from(parser).map(Command::Set),
            _ => Err(CommandParserError::UnknownCommand {
                command: command_name,
            }),
        }
    }
}

/// Turns one decoded frame into the reply to send back, if any.
///
/// Arity and unknown command problems become error replies. A frame without any arguments gets
/// no reply at all.
pub fn dispatch(frame: Frame, store: &Store) -> Option<Frame> {
    match Command::try_from(frame) {
        Ok(cmd) => Some(cmd.exec(store)),
        Err(CommandParserError::EmptyCommand) => None,
        Err(err) => Some(Frame::Error(err.to_string())),
    }
}

/// Command names are matched case-insensitively, normalized to upper case.
fn parse_command_name(frame: Frame) -> Result<String, CommandParserError> {
    match frame {
        Frame::Bulk(bytes) => Ok(String::from_utf8_lossy(&bytes).to_uppercase()),
        frame => Err(CommandParserError::InvalidFrame {
            expected: "bulk string".to_string(),
            actual: frame,
        }),
    }
}

pub struct CommandParser {
    // Lower case name, used in error messages.
    command: String,
    parts: vec::IntoIter<Frame>,
}

impl CommandParser {
    fn next_bytes(&mut self) -> Result<Bytes, CommandParserError> {
        let frame = self.parts.next().ok_or_else(|| self.wrong_arity())?;

        match frame {
            Frame::Bulk(bytes) => Ok(bytes),
            frame => Err(CommandParserError::InvalidFrame {
                expected: "bulk string".to_string(),
                actual: frame,
            }),
        }
    }

    /// Fails if there are arguments left over.
    fn finish(&mut self) -> Result<(), CommandParserError> {
        match self.parts.next() {
            Some(_) => Err(self.wrong_arity()),
            None => Ok(()),
        }
    }

    fn wrong_arity(&self) -> CommandParserError {
        CommandParserError::WrongArity {
            command: self.command.clone(),
        }
    }
}

#[derive(Debug, ThisError, PartialEq)]
pub enum CommandParserError {
    #[error("ERR protocol error; invalid frame, expected {expected}, got {actual:?}")]
    InvalidFrame { expected: String, actual: Frame },
    #[error("ERR unknown command '{command}'")]
    UnknownCommand { command: String },
    #[error("ERR wrong number of arguments for '{command}' command")]
    WrongArity { command: String },
    #[error("ERR empty command")]
    EmptyCommand,
}
