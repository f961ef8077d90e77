use crate::commands::executable::Executable;
use crate::commands::CommandParser;
use crate::frame::Frame;
use crate::server::State;
use crate::session::Session;
use crate::Error;

/// Returns all field names in the hash stored at `key`.
///
/// Ref: <https://redis.io/docs/latest/commands/hkeys/>
#[derive(Debug, PartialEq)]
pub struct Hkeys {
    pub key: String,
}

impl Executable for Hkeys {
    fn exec(self, state: &State, session: &mut Session) -> Result<Frame, Error> {
        let store = state.store.lock();

        let res = match store.db(session.db).hkeys(&self.key) {
            Ok(fields) => Frame::bulks(fields),
            Err(e) => e.into(),
        };

        Ok(res)
    }
}

impl TryFrom<&mut CommandParser> for Hkeys {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_string()?;
        Ok(Self { key })
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;
    use crate::commands::testing::{connect, run};

    #[test]
    fn field_names() {
        let state = State::default();
        let (mut session, _rx) = connect(&state);
        run(&state, &mut session, &["HSET", "key1", "var1", "toto"]);

        assert_eq!(
            run(&state, &mut session, &["HKEYS", "key1"]),
            Frame::Array(vec![Frame::Bulk(Bytes::from("var1"))])
        );
        assert_eq!(
            run(&state, &mut session, &["HKEYS", "key10"]),
            Frame::Array(vec![])
        );
    }
}
