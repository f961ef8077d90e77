use bytes::Bytes;

use crate::commands::executable::Executable;
use crate::commands::CommandParser;
use crate::frame::Frame;
use crate::server::State;
use crate::session::Session;
use crate::Error;

/// Sets the specified fields to their respective values in the hash stored at `key`. Returns
/// the number of fields that were added.
///
/// Ref: <https://redis.io/docs/latest/commands/hset/>
#[derive(Debug, PartialEq)]
pub struct Hset {
    pub key: String,
    pub pairs: Vec<(Bytes, Bytes)>,
}

impl Executable for Hset {
    fn exec(self, state: &State, session: &mut Session) -> Result<Frame, Error> {
        let mut store = state.store.lock();

        let res = match store.write(session.db, |db| db.hset(&self.key, self.pairs)) {
            Ok(added) => Frame::Integer(added as i64),
            Err(e) => e.into(),
        };

        Ok(res)
    }
}

impl TryFrom<&mut CommandParser> for Hset {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_string()?;
        let pairs = parser.rest_pairs()?;

        Ok(Self { key, pairs })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::{connect, frame, run};
    use crate::commands::{Command, CommandParserError};

    #[test]
    fn new_and_existing_fields() {
        let state = State::default();
        let (mut session, _rx) = connect(&state);

        assert_eq!(
            run(&state, &mut session, &["HSET", "key1", "var1", "toto"]),
            Frame::Integer(1)
        );
        assert_eq!(run(&state, &mut session, &["HLEN", "key1"]), Frame::Integer(1));
        assert_eq!(
            run(&state, &mut session, &["HSET", "key1", "var1", "toto"]),
            Frame::Integer(0)
        );
        assert_eq!(run(&state, &mut session, &["HLEN", "key1"]), Frame::Integer(1));
    }

    #[test]
    fn multiple_pairs() {
        let cmd = Command::try_from(frame(&["HSET", "h", "a", "1", "b", "2"])).unwrap();
        assert_eq!(
            cmd,
            Command::Hset(Hset {
                key: "h".to_string(),
                pairs: vec![
                    (Bytes::from("a"), Bytes::from("1")),
                    (Bytes::from("b"), Bytes::from("2")),
                ]
            })
        );

        let state = State::default();
        let (mut session, _rx) = connect(&state);

        assert_eq!(cmd.exec(&state, &mut session).unwrap(), Frame::Integer(2));
    }

    #[test]
    fn odd_number_of_arguments() {
        let err = Command::try_from(frame(&["HSET", "h", "a", "1", "b"]))
            .err()
            .unwrap();
        let err = err.downcast_ref::<CommandParserError>().unwrap();

        assert_eq!(
            *err,
            CommandParserError::WrongArgCount {
                command: "hset".to_string()
            }
        );
    }
}
