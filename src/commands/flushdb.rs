use crate::commands::executable::Executable;
use crate::commands::CommandParser;
use crate::frame::Frame;
use crate::server::State;
use crate::session::Session;
use crate::Error;

/// Delete all the keys of the currently selected database.
///
/// Ref: <https://redis.io/docs/latest/commands/flushdb/>
#[derive(Debug, PartialEq)]
pub struct FlushDb;

impl Executable for FlushDb {
    fn exec(self, state: &State, session: &mut Session) -> Result<Frame, Error> {
        state.store.lock().write(session.db, |db| db.clear());
        Ok(Frame::ok())
    }
}

impl TryFrom<&mut CommandParser> for FlushDb {
    type Error = Error;

    fn try_from(_parser: &mut CommandParser) -> Result<Self, Self::Error> {
        Ok(Self)
    }
}
