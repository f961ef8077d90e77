use crate::commands::executable::Executable;
use crate::commands::{multi_reply, CommandParser};
use crate::frame::Frame;
use crate::server::State;
use crate::session::Session;
use crate::Error;

/// Unsubscribes the client from the given patterns, or from all of them if none is given.
///
/// Ref: <https://redis.io/docs/latest/commands/punsubscribe/>
#[derive(Debug, PartialEq)]
pub struct Punsubscribe {
    pub patterns: Vec<String>,
}

impl Executable for Punsubscribe {
    fn exec(self, state: &State, session: &mut Session) -> Result<Frame, Error> {
        let acks = state.pubsub.punsubscribe(session.id, self.patterns);
        Ok(multi_reply(session, acks))
    }
}

impl TryFrom<&mut CommandParser> for Punsubscribe {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let patterns = parser.rest_strings()?;
        Ok(Self { patterns })
    }
}
