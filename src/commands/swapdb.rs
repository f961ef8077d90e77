use crate::commands::executable::Executable;
use crate::commands::CommandParser;
use crate::frame::Frame;
use crate::server::State;
use crate::session::Session;
use crate::store::DbIndex;
use crate::Error;

/// Swaps two logical databases, so that clients connected to a given database see the data of
/// the other one.
///
/// Ref: <https://redis.io/docs/latest/commands/swapdb/>
#[derive(Debug, PartialEq)]
pub struct Swapdb {
    pub index1: DbIndex,
    pub index2: DbIndex,
}

impl Executable for Swapdb {
    fn exec(self, state: &State, _session: &mut Session) -> Result<Frame, Error> {
        state.store.lock().swap(self.index1, self.index2);
        Ok(Frame::ok())
    }
}

impl TryFrom<&mut CommandParser> for Swapdb {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let index1 = parser.next_integer()?;
        let index2 = parser.next_integer()?;
        Ok(Self { index1, index2 })
    }
}
