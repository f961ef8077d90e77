use crate::commands::executable::Executable;
use crate::commands::{multi_reply, CommandParser};
use crate::frame::Frame;
use crate::server::State;
use crate::session::Session;
use crate::Error;

/// Unsubscribes the client from the given channels, or from all of them if none is given.
///
/// Ref: <https://redis.io/docs/latest/commands/unsubscribe/>
#[derive(Debug, PartialEq)]
pub struct Unsubscribe {
    pub channels: Vec<String>,
}

impl Executable for Unsubscribe {
    fn exec(self, state: &State, session: &mut Session) -> Result<Frame, Error> {
        let acks = state.pubsub.unsubscribe(session.id, self.channels);
        Ok(multi_reply(session, acks))
    }
}

impl TryFrom<&mut CommandParser> for Unsubscribe {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let channels = parser.rest_strings()?;
        Ok(Self { channels })
    }
}
