use bytes::Bytes;

use crate::commands::executable::Executable;
use crate::commands::{CommandParser, CommandParserError};
use crate::frame::Frame;
use crate::store::Store;

/// Set `key` to hold `value`, overwriting whatever it held before.
///
/// Ref: <https://redis.io/docs/latest/commands/set/>
#[derive(Debug, PartialEq)]
pub struct Set {
    pub key: Bytes,
    pub value: Bytes,
}

impl Executable for Set {
    fn exec(self, store: &Store) -> Frame {
        store.set(self.key, self.value);

        Frame::Simple("OK".to_string())
    }
}

impl TryFrom<&mut CommandParser> for Set {
    type Error = CommandParserError;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_bytes()?;
        let value = parser.next_bytes()?;
        parser.finish()?;

        Ok(Self { key, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::Command;

    #[test]
    fn parse_set_command() {
        let set_frame = Frame::command(["SET", "foo", "baz"]);

        let set_command = Command::try_from(set_frame).unwrap();

        assert_eq!(
            set_command,
            Command::Set(Set {
                key: Bytes::from("foo"),
                value: Bytes::from("baz")
            })
        );
    }

    #[test]
    fn overwrites_existing_value() {
        let store = Store::new();

        let res = Command::try_from(Frame::command(["SET", "foo", "v1"]))
            .unwrap()
            .exec(&store);
        assert_eq!(res, Frame::Simple("OK".to_string()));

        Command::try_from(Frame::command(["SET", "foo", "v2"]))
            .unwrap()
            .exec(&store);

        assert_eq!(store.get(b"foo"), Some(Bytes::from("v2")));
    }

    #[test]
    fn wrong_number_of_arguments() {
        for frame in [
            Frame::command(["SET"]),
            Frame::command(["SET", "foo"]),
            Frame::command(["SET", "foo", "bar", "EX"]),
        ] {
            let err = Command::try_from(frame).unwrap_err();
            assert_eq!(
                err,
                CommandParserError::WrongArity {
                    command: "set".to_string()
                }
            );
        }
    }
}
