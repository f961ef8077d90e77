use bytes::Bytes;

use crate::commands::executable::Executable;
use crate::commands::CommandParser;
use crate::frame::Frame;
use crate::server::State;
use crate::session::Session;
use crate::Error;

/// Same as `HSET`, replying with `OK` instead of the number of added fields.
///
/// Ref: <https://redis.io/docs/latest/commands/hmset/>
#[derive(Debug, PartialEq)]
pub struct Hmset {
    pub key: String,
    pub pairs: Vec<(Bytes, Bytes)>,
}

impl Executable for Hmset {
    fn exec(self, state: &State, session: &mut Session) -> Result<Frame, Error> {
        let mut store = state.store.lock();

        let res = match store.write(session.db, |db| db.hset(&self.key, self.pairs)) {
            Ok(_) => Frame::ok(),
            Err(e) => e.into(),
        };

        Ok(res)
    }
}

impl TryFrom<&mut CommandParser> for Hmset {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_string()?;
        let pairs = parser.rest_pairs()?;

        Ok(Self { key, pairs })
    }
}
