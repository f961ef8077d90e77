use bytes::Bytes;

use crate::commands::executable::Executable;
use crate::commands::CommandParser;
use crate::frame::Frame;
use crate::server::State;
use crate::session::Session;
use crate::Error;

/// Increment the number stored at `field` in the hash stored at `key` by the floating point
/// `increment`, returning the new value as a bulk string.
///
/// Ref: <https://redis.io/docs/latest/commands/hincrbyfloat/>
#[derive(Debug, PartialEq)]
pub struct HincrByFloat {
    pub key: String,
    pub field: Bytes,
    pub increment: f64,
}

impl Executable for HincrByFloat {
    fn exec(self, state: &State, session: &mut Session) -> Result<Frame, Error> {
        let mut store = state.store.lock();

        let res = match store.write(session.db, |db| {
            db.hincrbyfloat(&self.key, self.field, self.increment)
        }) {
            Ok(value) => Frame::Bulk(Bytes::from(value.to_string())),
            Err(e) => e.into(),
        };

        Ok(res)
    }
}

impl TryFrom<&mut CommandParser> for HincrByFloat {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_string()?;
        let field = parser.next_bytes()?;
        let increment = parser.next_float()?;

        Ok(Self {
            key,
            field,
            increment,
        })
    }
}
