use crate::commands::executable::Executable;
use crate::commands::{CommandParser, CommandParserError};
use crate::frame::Frame;
use crate::server::State;
use crate::session::Session;
use crate::Error;

/// Removes and returns up to `count` random members from the set stored at `key`. The reply is
/// always an array, or nil when the key does not exist.
///
/// Ref: <https://redis.io/docs/latest/commands/spop/>
#[derive(Debug, PartialEq)]
pub struct Spop {
    pub key: String,
    pub count: usize,
}

impl Executable for Spop {
    fn exec(self, state: &State, session: &mut Session) -> Result<Frame, Error> {
        let mut store = state.store.lock();

        let res = match store.write(session.db, |db| db.spop(&self.key, self.count)) {
            Ok(Some(members)) => Frame::bulks(members),
            Ok(None) => Frame::Null,
            Err(e) => e.into(),
        };

        Ok(res)
    }
}

impl TryFrom<&mut CommandParser> for Spop {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_string()?;

        let count = match parser.next_integer() {
            Ok(count) => usize::try_from(count).map_err(|_| CommandParserError::NotPositive)?,
            Err(CommandParserError::EndOfStream) => 1,
            Err(e) => return Err(e.into()),
        };

        Ok(Self { key, count })
    }
}
