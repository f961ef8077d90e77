use bytes::Bytes;

use crate::commands::executable::Executable;
use crate::commands::{CommandParser, CommandParserError};
use crate::frame::Frame;
use crate::server::State;
use crate::session::Session;
use crate::store::Position;
use crate::Error;

/// Inserts `value` in the list stored at `key` either before or after the first element equal
/// to `pivot`. Returns the list length after the insert, or -1 when the key does not exist or
/// the pivot was not found.
///
/// Ref: <https://redis.io/docs/latest/commands/linsert/>
#[derive(Debug, PartialEq)]
pub struct Linsert {
    pub key: String,
    pub position: Position,
    pub pivot: Bytes,
    pub value: Bytes,
}

impl Executable for Linsert {
    fn exec(self, state: &State, session: &mut Session) -> Result<Frame, Error> {
        let mut store = state.store.lock();

        let res = match store.write(session.db, |db| {
            db.linsert(&self.key, self.position, &self.pivot, self.value)
        }) {
            Ok(len) => Frame::Integer(len),
            Err(e) => e.into(),
        };

        Ok(res)
    }
}

impl TryFrom<&mut CommandParser> for Linsert {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_string()?;
        let position = parser
            .next_string()?
            .parse::<Position>()
            .map_err(|_| CommandParserError::Syntax)?;
        let pivot = parser.next_bytes()?;
        let value = parser.next_bytes()?;

        Ok(Self {
            key,
            position,
            pivot,
            value,
        })
    }
}
