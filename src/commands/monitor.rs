use crate::commands::executable::Executable;
use crate::commands::CommandParser;
use crate::frame::Frame;
use crate::server::State;
use crate::session::Session;
use crate::Error;

/// Puts the connection in monitor mode: from now on it receives a trace line for every command
/// processed by the server.
///
/// Ref: <https://redis.io/docs/latest/commands/monitor/>
#[derive(Debug, PartialEq)]
pub struct Monitor;

impl Executable for Monitor {
    fn exec(self, state: &State, session: &mut Session) -> Result<Frame, Error> {
        state.clients.enter_monitor(session);
        Ok(Frame::ok())
    }
}

impl TryFrom<&mut CommandParser> for Monitor {
    type Error = Error;

    fn try_from(_parser: &mut CommandParser) -> Result<Self, Self::Error> {
        Ok(Self)
    }
}
