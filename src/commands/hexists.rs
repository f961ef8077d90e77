use bytes::Bytes;

use crate::commands::executable::Executable;
use crate::commands::CommandParser;
use crate::frame::Frame;
use crate::server::State;
use crate::session::Session;
use crate::Error;

/// Returns if `field` is an existing field in the hash stored at `key`.
///
/// Ref: <https://redis.io/docs/latest/commands/hexists/>
#[derive(Debug, PartialEq)]
pub struct Hexists {
    pub key: String,
    pub field: Bytes,
}

impl Executable for Hexists {
    fn exec(self, state: &State, session: &mut Session) -> Result<Frame, Error> {
        let store = state.store.lock();

        let res = match store.db(session.db).hexists(&self.key, &self.field) {
            Ok(found) => Frame::Integer(found as i64),
            Err(e) => e.into(),
        };

        Ok(res)
    }
}

impl TryFrom<&mut CommandParser> for Hexists {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_string()?;
        let field = parser.next_bytes()?;

        Ok(Self { key, field })
    }
}
