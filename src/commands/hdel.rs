use bytes::Bytes;

use crate::commands::executable::Executable;
use crate::commands::CommandParser;
use crate::frame::Frame;
use crate::server::State;
use crate::session::Session;
use crate::Error;

/// Removes the specified fields from the hash stored at `key`. Returns the number of fields
/// that were removed.
///
/// Ref: <https://redis.io/docs/latest/commands/hdel/>
#[derive(Debug, PartialEq)]
pub struct Hdel {
    pub key: String,
    pub fields: Vec<Bytes>,
}

impl Executable for Hdel {
    fn exec(self, state: &State, session: &mut Session) -> Result<Frame, Error> {
        let mut store = state.store.lock();

        let res = match store.write(session.db, |db| db.hdel(&self.key, &self.fields)) {
            Ok(removed) => Frame::Integer(removed as i64),
            Err(e) => e.into(),
        };

        Ok(res)
    }
}

impl TryFrom<&mut CommandParser> for Hdel {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_string()?;
        let fields = parser.rest_bytes()?;

        Ok(Self { key, fields })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::{connect, run};

    #[test]
    fn removes_fields() {
        let state = State::default();
        let (mut session, _rx) = connect(&state);
        run(&state, &mut session, &["HSET", "key1", "var1", "toto", "var2", "tutu"]);

        assert_eq!(
            run(&state, &mut session, &["HDEL", "key1", "var10"]),
            Frame::Integer(0)
        );
        assert_eq!(
            run(&state, &mut session, &["HDEL", "key10", "var1"]),
            Frame::Integer(0)
        );
        assert_eq!(
            run(&state, &mut session, &["HDEL", "key1", "var1", "var2"]),
            Frame::Integer(2)
        );
        assert_eq!(run(&state, &mut session, &["EXISTS", "key1"]), Frame::Integer(0));
    }
}
