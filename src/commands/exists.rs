use crate::commands::executable::Executable;
use crate::commands::CommandParser;
use crate::frame::Frame;
use crate::server::State;
use crate::session::Session;
use crate::Error;

/// Returns how many of the given keys exist. A key given several times is counted each time.
///
/// Ref: <https://redis.io/docs/latest/commands/exists/>
#[derive(Debug, PartialEq)]
pub struct Exists {
    pub keys: Vec<String>,
}

impl Executable for Exists {
    fn exec(self, state: &State, session: &mut Session) -> Result<Frame, Error> {
        let store = state.store.lock();
        let db = store.db(session.db);

        let count = self.keys.iter().filter(|key| db.exists(key)).count();

        Ok(Frame::Integer(count as i64))
    }
}

impl TryFrom<&mut CommandParser> for Exists {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let keys = parser.rest_strings()?;
        Ok(Self { keys })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::{connect, run};

    #[test]
    fn counts_existing_keys() {
        let state = State::default();
        let (mut session, _rx) = connect(&state);
        run(&state, &mut session, &["SET", "a", "1"]);
        run(&state, &mut session, &["HSET", "b", "f", "v"]);

        assert_eq!(
            run(&state, &mut session, &["EXISTS", "a", "b", "c", "a"]),
            Frame::Integer(3)
        );
        assert_eq!(run(&state, &mut session, &["EXISTS", "c"]), Frame::Integer(0));
    }
}
