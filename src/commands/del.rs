use crate::commands::executable::Executable;
use crate::commands::CommandParser;
use crate::frame::Frame;
use crate::server::State;
use crate::session::Session;
use crate::Error;

/// Removes the specified keys. A key is ignored if it does not exist.
///
/// Ref: <https://redis.io/docs/latest/commands/del/>
#[derive(Debug, PartialEq)]
pub struct Del {
    pub keys: Vec<String>,
}

impl Executable for Del {
    fn exec(self, state: &State, session: &mut Session) -> Result<Frame, Error> {
        let count = state.store.lock().write(session.db, |db| {
            self.keys
                .iter()
                .filter(|key| db.remove(key).is_some())
                .count()
        });

        Ok(Frame::Integer(count as i64))
    }
}

impl TryFrom<&mut CommandParser> for Del {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let keys = parser.rest_strings()?;
        Ok(Self { keys })
    }
}

#[cfg(test)]
mod tests {
    use crate::commands::testing::{connect, frame, run};
    use crate::commands::{Command, CommandParserError};

    use super::*;

    #[test]
    fn removes_keys_of_any_type() {
        let cmd = Command::try_from(frame(&["DEL", "str", "set", "missing", "str"])).unwrap();
        assert_eq!(
            cmd,
            Command::Del(Del {
                keys: vec![
                    "str".to_string(),
                    "set".to_string(),
                    "missing".to_string(),
                    "str".to_string()
                ]
            })
        );

        let state = State::default();
        let (mut session, _rx) = connect(&state);
        run(&state, &mut session, &["SET", "str", "1"]);
        run(&state, &mut session, &["SADD", "set", "m"]);

        // A key repeated in the same call is only counted once.
        assert_eq!(cmd.exec(&state, &mut session).unwrap(), Frame::Integer(2));
        assert_eq!(run(&state, &mut session, &["DBSIZE"]), Frame::Integer(0));
    }

    #[test]
    fn only_touches_the_selected_database() {
        let state = State::default();
        let (mut session, _rx) = connect(&state);
        run(&state, &mut session, &["SET", "key", "1"]);
        run(&state, &mut session, &["SELECT", "3"]);

        assert_eq!(run(&state, &mut session, &["DEL", "key"]), Frame::Integer(0));

        run(&state, &mut session, &["SELECT", "0"]);
        assert_eq!(run(&state, &mut session, &["EXISTS", "key"]), Frame::Integer(1));
    }

    #[test]
    fn zero_keys() {
        let err = Command::try_from(frame(&["DEL"])).err().unwrap();
        let err = err.downcast_ref::<CommandParserError>().unwrap();

        assert_eq!(
            *err,
            CommandParserError::WrongArgCount {
                command: "del".to_string()
            }
        );
    }
}
