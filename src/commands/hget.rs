use bytes::Bytes;

use crate::commands::executable::Executable;
use crate::commands::CommandParser;
use crate::frame::Frame;
use crate::server::State;
use crate::session::Session;
use crate::Error;

/// Returns the value associated with `field` in the hash stored at `key`, or nil when the field
/// or the key does not exist.
///
/// Ref: <https://redis.io/docs/latest/commands/hget/>
#[derive(Debug, PartialEq)]
pub struct Hget {
    pub key: String,
    pub field: Bytes,
}

impl Executable for Hget {
    fn exec(self, state: &State, session: &mut Session) -> Result<Frame, Error> {
        let store = state.store.lock();

        let res = match store.db(session.db).hget(&self.key, &self.field) {
            Ok(Some(value)) => Frame::Bulk(value),
            Ok(None) => Frame::Null,
            Err(e) => e.into(),
        };

        Ok(res)
    }
}

impl TryFrom<&mut CommandParser> for Hget {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_string()?;
        let field = parser.next_bytes()?;

        Ok(Self { key, field })
    }
}
