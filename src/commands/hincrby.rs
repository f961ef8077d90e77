use bytes::Bytes;

use crate::commands::executable::Executable;
use crate::commands::CommandParser;
use crate::frame::Frame;
use crate::server::State;
use crate::session::Session;
use crate::Error;

/// Increments the number stored at `field` in the hash stored at `key` by `increment`. A
/// missing field is set to 0 before the operation.
///
/// Ref: <https://redis.io/docs/latest/commands/hincrby/>
#[derive(Debug, PartialEq)]
pub struct HincrBy {
    pub key: String,
    pub field: Bytes,
    pub increment: i64,
}

impl Executable for HincrBy {
    fn exec(self, state: &State, session: &mut Session) -> Result<Frame, Error> {
        let mut store = state.store.lock();

        let res = match store.write(session.db, |db| {
            db.hincrby(&self.key, self.field, self.increment)
        }) {
            Ok(value) => Frame::Integer(value),
            Err(e) => e.into(),
        };

        Ok(res)
    }
}

impl TryFrom<&mut CommandParser> for HincrBy {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_string()?;
        let field = parser.next_bytes()?;
        let increment = parser.next_integer()?;

        Ok(Self {
            key,
            field,
            increment,
        })
    }
}
