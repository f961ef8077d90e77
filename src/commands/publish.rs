use bytes::Bytes;

use crate::commands::executable::Executable;
use crate::commands::CommandParser;
use crate::frame::Frame;
use crate::server::State;
use crate::session::Session;
use crate::Error;

/// Posts a message to the given channel. Returns the number of clients that received it.
///
/// Ref: <https://redis.io/docs/latest/commands/publish/>
#[derive(Debug, PartialEq)]
pub struct Publish {
    pub channel: String,
    pub message: Bytes,
}

impl Executable for Publish {
    fn exec(self, state: &State, _session: &mut Session) -> Result<Frame, Error> {
        let delivered = state
            .pubsub
            .publish(&state.clients, &self.channel, &self.message);

        Ok(Frame::Integer(delivered as i64))
    }
}

impl TryFrom<&mut CommandParser> for Publish {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let channel = parser.next_string()?;
        let message = parser.next_bytes()?;

        Ok(Self { channel, message })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::{connect, frame, run};
    use crate::commands::Command;

    #[test]
    fn without_subscribers() {
        let cmd = Command::try_from(frame(&["PUBLISH", "news", "hello"])).unwrap();
        assert_eq!(
            cmd,
            Command::Publish(Publish {
                channel: "news".to_string(),
                message: Bytes::from("hello")
            })
        );

        let state = State::default();
        let (mut session, _rx) = connect(&state);

        assert_eq!(cmd.exec(&state, &mut session).unwrap(), Frame::Integer(0));
    }

    #[test]
    fn delivered_once_per_subscriber() {
        let state = State::default();
        let (mut subscriber, mut rx) = connect(&state);
        let (mut publisher, _rx) = connect(&state);
        run(&state, &mut subscriber, &["SUBSCRIBE", "news"]);
        run(&state, &mut subscriber, &["PSUBSCRIBE", "n*"]);

        assert_eq!(
            run(&state, &mut publisher, &["PUBLISH", "news", "hello"]),
            Frame::Integer(1)
        );
        assert!(rx.try_recv().is_ok());
        assert!(rx.try_recv().is_err());
    }
}
