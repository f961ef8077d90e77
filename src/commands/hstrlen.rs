use bytes::Bytes;

use crate::commands::executable::Executable;
use crate::commands::CommandParser;
use crate::frame::Frame;
use crate::server::State;
use crate::session::Session;
use crate::Error;

/// Returns the string length of the value associated with `field` in the hash stored at `key`.
///
/// Ref: <https://redis.io/docs/latest/commands/hstrlen/>
#[derive(Debug, PartialEq)]
pub struct Hstrlen {
    pub key: String,
    pub field: Bytes,
}

impl Executable for Hstrlen {
    fn exec(self, state: &State, session: &mut Session) -> Result<Frame, Error> {
        let store = state.store.lock();

        let res = match store.db(session.db).hstrlen(&self.key, &self.field) {
            Ok(len) => Frame::Integer(len as i64),
            Err(e) => e.into(),
        };

        Ok(res)
    }
}

impl TryFrom<&mut CommandParser> for Hstrlen {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_string()?;
        let field = parser.next_bytes()?;

        Ok(Self { key, field })
    }
}
