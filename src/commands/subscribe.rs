use crate::commands::executable::Executable;
use crate::commands::{multi_reply, CommandParser};
use crate::frame::Frame;
use crate::server::State;
use crate::session::Session;
use crate::Error;

/// Subscribes the client to the specified channels. One `subscribe` acknowledgement is sent per
/// channel, carrying the number of channels and patterns the client is subscribed to.
///
/// Ref: <https://redis.io/docs/latest/commands/subscribe/>
#[derive(Debug, PartialEq)]
pub struct Subscribe {
    pub channels: Vec<String>,
}

impl Executable for Subscribe {
    fn exec(self, state: &State, session: &mut Session) -> Result<Frame, Error> {
        let acks = state.pubsub.subscribe(session.id, self.channels);
        Ok(multi_reply(session, acks))
    }
}

impl TryFrom<&mut CommandParser> for Subscribe {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let channels = parser.rest_strings()?;
        Ok(Self { channels })
    }
}
