use bytes::Bytes;

use crate::commands::executable::Executable;
use crate::commands::CommandParser;
use crate::frame::Frame;
use crate::glob;
use crate::server::State;
use crate::session::Session;
use crate::Error;

// https://redis.io/commands/keys
#[derive(Debug, PartialEq)]
pub struct Keys {
    pub pattern: String,
}

impl Executable for Keys {
    fn exec(self, state: &State, session: &mut Session) -> Result<Frame, Error> {
        let store = state.store.lock();

        let keys = store
            .db(session.db)
            .keys()
            .filter(|key| glob::matches(key, &self.pattern))
            .map(|key| Bytes::from(key.clone()));

        Ok(Frame::bulks(keys))
    }
}

impl TryFrom<&mut CommandParser> for Keys {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let pattern = parser.next_string()?;
        Ok(Self { pattern })
    }
}

#[cfg(test)]
mod tests {
    use crate::commands::testing::{connect, run};
    use crate::commands::{Command, CommandParserError};

    use super::*;

    fn sorted(frame: Frame) -> Vec<Frame> {
        match frame {
            Frame::Array(mut items) => {
                items.sort_by_key(|item| item.to_string());
                items
            }
            frame => panic!("expected array, got {frame}"),
        }
    }

    #[test]
    fn with_wildcard_pattern() {
        let frame = Frame::Array(vec![
            Frame::Bulk(Bytes::from("KEYS")),
            Frame::Bulk(Bytes::from("*")),
        ]);
        let cmd = Command::try_from(frame).unwrap();
        assert_eq!(
            cmd,
            Command::Keys(Keys {
                pattern: String::from("*")
            })
        );

        let state = State::default();
        let (mut session, _rx) = connect(&state);
        run(&state, &mut session, &["SET", "one", "1"]);
        run(&state, &mut session, &["SADD", "two", "2"]);

        let result = cmd.exec(&state, &mut session).unwrap();

        assert_eq!(
            sorted(result),
            vec![
                Frame::Bulk(Bytes::from("one")),
                Frame::Bulk(Bytes::from("two"))
            ]
        );
    }

    #[test]
    fn with_pattern() {
        let state = State::default();
        let (mut session, _rx) = connect(&state);
        for key in ["user:1", "user:2", "user:10", "session:1"] {
            run(&state, &mut session, &["SET", key, "x"]);
        }

        let result = run(&state, &mut session, &["KEYS", "user:?"]);

        assert_eq!(
            sorted(result),
            vec![
                Frame::Bulk(Bytes::from("user:1")),
                Frame::Bulk(Bytes::from("user:2"))
            ]
        );
    }

    #[test]
    fn invalid_frame() {
        let frame = Frame::Array(vec![Frame::Bulk(Bytes::from("KEYS")), Frame::Null]);
        let err = Command::try_from(frame).err().unwrap();
        let err = err.downcast_ref::<CommandParserError>().unwrap();

        assert_eq!(
            *err,
            CommandParserError::InvalidFrame {
                expected: "simple or bulk string".to_string(),
                actual: Frame::Null
            }
        );
    }
}
