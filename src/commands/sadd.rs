use bytes::Bytes;

use crate::commands::executable::Executable;
use crate::commands::CommandParser;
use crate::frame::Frame;
use crate::server::State;
use crate::session::Session;
use crate::Error;

/// Add the specified members to the set stored at `key`. Members already in the set are
/// ignored. Returns the number of members that were added.
///
/// Ref: <https://redis.io/docs/latest/commands/sadd/>
#[derive(Debug, PartialEq)]
pub struct Sadd {
    pub key: String,
    pub members: Vec<Bytes>,
}

impl Executable for Sadd {
    fn exec(self, state: &State, session: &mut Session) -> Result<Frame, Error> {
        let mut store = state.store.lock();

        let res = match store.write(session.db, |db| db.sadd(&self.key, self.members)) {
            Ok(added) => Frame::Integer(added as i64),
            Err(e) => e.into(),
        };

        Ok(res)
    }
}

impl TryFrom<&mut CommandParser> for Sadd {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_string()?;
        let members = parser.rest_bytes()?;

        Ok(Self { key, members })
    }
}
