use bytes::Bytes;

use crate::commands::executable::Executable;
use crate::commands::CommandParser;
use crate::frame::Frame;
use crate::server::State;
use crate::session::Session;
use crate::Error;

/// Returns the values associated with the specified fields in the hash stored at `key`, nil for
/// every field that does not exist.
///
/// Ref: <https://redis.io/docs/latest/commands/hmget/>
#[derive(Debug, PartialEq)]
pub struct Hmget {
    pub key: String,
    pub fields: Vec<Bytes>,
}

impl Executable for Hmget {
    fn exec(self, state: &State, session: &mut Session) -> Result<Frame, Error> {
        let store = state.store.lock();

        let res = match store.db(session.db).hmget(&self.key, &self.fields) {
            Ok(values) => Frame::Array(
                values
                    .into_iter()
                    .map(|value| value.map_or(Frame::Null, Frame::Bulk))
                    .collect(),
            ),
            Err(e) => e.into(),
        };

        Ok(res)
    }
}

impl TryFrom<&mut CommandParser> for Hmget {
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
    fn present_and_missing_fields() {
        let state = State::default();
        let (mut session, _rx) = connect(&state);
        run(&state, &mut session, &["HSET", "key3", "var1", "toto"]);

        assert_eq!(
            run(&state, &mut session, &["HMGET", "key3", "var1", "var2"]),
            Frame::Array(vec![Frame::Bulk(Bytes::from("toto")), Frame::Null])
        );
        assert_eq!(
            run(&state, &mut session, &["HMGET", "key10", "var1"]),
            Frame::Array(vec![Frame::Null])
        );
    }
}
