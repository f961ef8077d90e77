use bytes::Bytes;

use crate::commands::executable::Executable;
use crate::commands::CommandParser;
use crate::frame::Frame;
use crate::server::State;
use crate::session::Session;
use crate::Error;

/// Insert all the specified values at the head of the list stored at `key`, one after the
/// other, so `LPUSH mylist a b c` results in a list starting with `c`. Returns the length of
/// the list after the push.
///
/// Ref: <https://redis.io/docs/latest/commands/lpush/>
#[derive(Debug, PartialEq)]
pub struct Lpush {
    pub key: String,
    pub values: Vec<Bytes>,
}

impl Executable for Lpush {
    fn exec(self, state: &State, session: &mut Session) -> Result<Frame, Error> {
        let mut store = state.store.lock();

        let res = match store.write(session.db, |db| db.lpush(&self.key, self.values)) {
            Ok(len) => Frame::Integer(len as i64),
            Err(e) => e.into(),
        };

        Ok(res)
    }
}

impl TryFrom<&mut CommandParser> for Lpush {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_string()?;
        let values = parser.rest_bytes()?;

        Ok(Self { key, values })
    }
}
