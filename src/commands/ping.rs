use crate::commands::executable::Executable;
use crate::commands::{CommandParser, CommandParserError};
use crate::frame::Frame;
use crate::store::Store;

/// Returns PONG. Any arguments are ignored.
///
/// Ref: <https://redis.io/docs/latest/commands/ping>
#[derive(Debug, PartialEq)]
pub struct Ping;

impl Executable for Ping {
    fn exec(self, _store: &Store) -> Frame {
        Frame::Simple("PONG".to_string())
    }
}

impl TryFrom<&mut CommandParser> for Ping {
    type Error = CommandParserError;

    fn try_from(_parser: &mut CommandParser) -> Result<Self, Self::Error> {
        Ok(Self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::Command;

    #[test]
    fn without_arguments() {
        let frame = Frame::command(["PING"]);
        let cmd = Command::try_from(frame).unwrap();

        assert_eq!(cmd, Command::Ping(Ping));
        assert_eq!(
            cmd.exec(&Store::new()),
            Frame::Simple("PONG".to_string())
        );
    }

    #[test]
    fn extra_arguments_are_ignored() {
        let frame = Frame::command(["ping", "hello", "world"]);
        let cmd = Command::try_from(frame).unwrap();

        assert_eq!(
            cmd.exec(&Store::new()),
            Frame::Simple("PONG".to_string())
        );
    }
}
