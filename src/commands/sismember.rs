use bytes::Bytes;

use crate::commands::executable::Executable;
use crate::commands::CommandParser;
use crate::frame::Frame;
use crate::server::State;
use crate::session::Session;
use crate::Error;

/// Returns 1 if `member` is a member of the set stored at `key`, 0 otherwise.
///
/// Ref: <https://redis.io/docs/latest/commands/sismember/>
#[derive(Debug, PartialEq)]
pub struct Sismember {
    pub key: String,
    pub member: Bytes,
}

impl Executable for Sismember {
    fn exec(self, state: &State, session: &mut Session) -> Result<Frame, Error> {
        let store = state.store.lock();

        let res = match store.db(session.db).sismember(&self.key, &self.member) {
            Ok(found) => Frame::Integer(found as i64),
            Err(e) => e.into(),
        };

        Ok(res)
    }
}

impl TryFrom<&mut CommandParser> for Sismember {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_string()?;
        let member = parser.next_bytes()?;

        Ok(Self { key, member })
    }
}
