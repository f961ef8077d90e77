use bytes::Bytes;

use crate::commands::executable::Executable;
use crate::commands::CommandParser;
use crate::frame::Frame;
use crate::server::State;
use crate::session::Session;
use crate::Error;

/// Sets `field` in the hash stored at `key` to `value`, only if `field` does not yet exist.
///
/// Ref: <https://redis.io/docs/latest/commands/hsetnx/>
#[derive(Debug, PartialEq)]
pub struct Hsetnx {
    pub key: String,
    pub field: Bytes,
    pub value: Bytes,
}

impl Executable for Hsetnx {
    fn exec(self, state: &State, session: &mut Session) -> Result<Frame, Error> {
        let mut store = state.store.lock();

        let res = match store.write(session.db, |db| {
            db.hsetnx(&self.key, self.field, self.value)
        }) {
            Ok(set) => Frame::Integer(set as i64),
            Err(e) => e.into(),
        };

        Ok(res)
    }
}

impl TryFrom<&mut CommandParser> for Hsetnx {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_string()?;
        let field = parser.next_bytes()?;
        let value = parser.next_bytes()?;

        Ok(Self { key, field, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::{connect, run};

    #[test]
    fn only_sets_missing_fields() {
        let state = State::default();
        let (mut session, _rx) = connect(&state);

        assert_eq!(
            run(&state, &mut session, &["HSETNX", "key4", "var1", "toto"]),
            Frame::Integer(1)
        );
        assert_eq!(
            run(&state, &mut session, &["HSETNX", "key4", "var1", "titi"]),
            Frame::Integer(0)
        );
        assert_eq!(
            run(&state, &mut session, &["HGET", "key4", "var1"]),
            Frame::Bulk(Bytes::from("toto"))
        );
    }
}
