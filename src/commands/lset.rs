use bytes::Bytes;

use crate::commands::executable::Executable;
use crate::commands::CommandParser;
use crate::frame::Frame;
use crate::server::State;
use crate::session::Session;
use crate::Error;

/// Sets the list element at `index` to `value`. An out of range index is an error, as is a key
/// that does not exist.
///
/// Ref: <https://redis.io/docs/latest/commands/lset/>
#[derive(Debug, PartialEq)]
pub struct Lset {
    pub key: String,
    pub index: i64,
    pub value: Bytes,
}

impl Executable for Lset {
    fn exec(self, state: &State, session: &mut Session) -> Result<Frame, Error> {
        let mut store = state.store.lock();

        let res = match store.write(session.db, |db| db.lset(&self.key, self.index, self.value)) {
            Ok(()) => Frame::ok(),
            Err(e) => e.into(),
        };

        Ok(res)
    }
}

impl TryFrom<&mut CommandParser> for Lset {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_string()?;
        let index = parser.next_integer()?;
        let value = parser.next_bytes()?;

        Ok(Self { key, index, value })
    }
}
