use crate::commands::executable::Executable;
use crate::commands::{multi_reply, CommandParser};
use crate::frame::Frame;
use crate::server::State;
use crate::session::Session;
use crate::Error;

/// Subscribes the client to the given glob-style patterns.
///
/// Ref: <https://redis.io/docs/latest/commands/psubscribe/>
#[derive(Debug, PartialEq)]
pub struct Psubscribe {
    pub patterns: Vec<String>,
}

impl Executable for Psubscribe {
    fn exec(self, state: &State, session: &mut Session) -> Result<Frame, Error> {
        let acks = state.pubsub.psubscribe(session.id, self.patterns);
        Ok(multi_reply(session, acks))
    }
}

impl TryFrom<&mut CommandParser> for Psubscribe {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let patterns = parser.rest_strings()?;
        Ok(Self { patterns })
    }
}
