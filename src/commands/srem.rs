use bytes::Bytes;

use crate::commands::executable::Executable;
use crate::commands::CommandParser;
use crate::frame::Frame;
use crate::server::State;
use crate::session::Session;
use crate::Error;

/// Remove the specified members from the set stored at `key`. Returns the number of members
/// that were removed. The key is deleted once the set is empty.
///
/// Ref: <https://redis.io/docs/latest/commands/srem/>
#[derive(Debug, PartialEq)]
pub struct Srem {
    pub key: String,
    pub members: Vec<Bytes>,
}

impl Executable for Srem {
    fn exec(self, state: &State, session: &mut Session) -> Result<Frame, Error> {
        let mut store = state.store.lock();

        let res = match store.write(session.db, |db| db.srem(&self.key, self.members)) {
            Ok(removed) => Frame::Integer(removed as i64),
            Err(e) => e.into(),
        };

        Ok(res)
    }
}

impl TryFrom<&mut CommandParser> for Srem {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_string()?;
        let members = parser.rest_bytes()?;

        Ok(Self { key, members })
    }
}
