use crate::commands::executable::Executable;
use crate::commands::CommandParser;
use crate::frame::Frame;
use crate::server::State;
use crate::session::Session;
use crate::Error;

/// Returns the element at `index` in the list stored at `key`. Negative indices count from the
/// tail. Returns nil when the index is out of range.
///
/// Ref: <https://redis.io/docs/latest/commands/lindex/>
#[derive(Debug, PartialEq)]
pub struct Lindex {
    pub key: String,
    pub index: i64,
}

impl Executable for Lindex {
    fn exec(self, state: &State, session: &mut Session) -> Result<Frame, Error> {
        let store = state.store.lock();

        let res = match store.db(session.db).lindex(&self.key, self.index) {
            Ok(value) => value.map_or(Frame::Null, Frame::Bulk),
            Err(e) => e.into(),
        };

        Ok(res)
    }
}

impl TryFrom<&mut CommandParser> for Lindex {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_string()?;
        let index = parser.next_integer()?;

        Ok(Self { key, index })
    }
}
