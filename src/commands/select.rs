use crate::commands::executable::Executable;
use crate::commands::CommandParser;
use crate::frame::Frame;
use crate::server::State;
use crate::session::Session;
use crate::store::DbIndex;
use crate::Error;

/// Select the logical database having the specified numeric index. New connections always use
/// the database 0. Any index is accepted; databases are created on first use.
///
/// Ref: <https://redis.io/docs/latest/commands/select>
#[derive(Debug, PartialEq)]
pub struct Select {
    pub index: DbIndex,
}

impl Executable for Select {
    fn exec(self, _state: &State, session: &mut Session) -> Result<Frame, Error> {
        session.db = self.index;
        Ok(Frame::ok())
    }
}

impl TryFrom<&mut CommandParser> for Select {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let index = parser.next_integer()?;
        Ok(Self { index })
    }
}
