use crate::commands::executable::Executable;
use crate::commands::CommandParser;
use crate::frame::Frame;
use crate::server::State;
use crate::session::Session;
use crate::Error;

/// Returns the cardinality of the set stored at `key`, 0 if the key does not exist.
///
/// Ref: <https://redis.io/docs/latest/commands/scard/>
#[derive(Debug, PartialEq)]
pub struct Scard {
    pub key: String,
}

impl Executable for Scard {
    fn exec(self, state: &State, session: &mut Session) -> Result<Frame, Error> {
        let store = state.store.lock();

        let res = match store.db(session.db).scard(&self.key) {
            Ok(len) => Frame::Integer(len as i64),
            Err(e) => e.into(),
        };

        Ok(res)
    }
}

impl TryFrom<&mut CommandParser> for Scard {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_string()?;
        Ok(Self { key })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::{connect, run};

    #[test]
    fn cardinality() {
        let state = State::default();
        let (mut session, _rx) = connect(&state);

        assert_eq!(run(&state, &mut session, &["SCARD", "set1"]), Frame::Integer(0));
        run(&state, &mut session, &["SADD", "set1", "a", "b", "a"]);
        assert_eq!(run(&state, &mut session, &["SCARD", "set1"]), Frame::Integer(2));
    }
}
