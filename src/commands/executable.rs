use crate::frame::Frame;
use crate::server::State;
use crate::session::Session;
use crate::Error;

/// A parsed command that can be run against the shared server state on behalf of a session.
pub trait Executable {
    fn exec(self, state: &State, session: &mut Session) -> Result<Frame, Error>;
}
