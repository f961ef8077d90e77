use crate::commands::executable::Executable;
use crate::commands::CommandParser;
use crate::frame::Frame;
use crate::server::State;
use crate::session::Session;
use crate::Error;

/// Asks the server to close the connection. The reply is written before the connection closes.
///
/// Ref: <https://redis.io/docs/latest/commands/quit/>
#[derive(Debug, PartialEq)]
pub struct Quit;

impl Executable for Quit {
    fn exec(self, _state: &State, session: &mut Session) -> Result<Frame, Error> {
        session.close();
        Ok(Frame::ok())
    }
}

impl TryFrom<&mut CommandParser> for Quit {
    type Error = Error;

    fn try_from(_parser: &mut CommandParser) -> Result<Self, Self::Error> {
        Ok(Self)
    }
}
