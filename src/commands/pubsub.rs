use bytes::Bytes;

use crate::commands::executable::Executable;
use crate::commands::{CommandParser, CommandParserError};
use crate::frame::Frame;
use crate::server::State;
use crate::session::Session;
use crate::Error;

/// Introspection of the pub/sub subsystem.
///
/// Ref: <https://redis.io/docs/latest/commands/pubsub/>
#[derive(Debug, PartialEq)]
pub enum Pubsub {
    /// Active channels, optionally only those matching a pattern.
    Channels(Option<String>),
    /// Subscriber count of each channel. Pattern subscriptions are not counted.
    Numsub(Vec<String>),
    /// Number of patterns subscribed to.
    Numpat,
}

impl Executable for Pubsub {
    fn exec(self, state: &State, _session: &mut Session) -> Result<Frame, Error> {
        let res = match self {
            Pubsub::Channels(pattern) => {
                Frame::bulks(state.pubsub.channels(pattern.as_deref()).into_iter().map(Bytes::from))
            }
            Pubsub::Numsub(channels) => Frame::Array(
                state
                    .pubsub
                    .numsub(&channels)
                    .into_iter()
                    .flat_map(|(channel, count)| {
                        [Frame::Bulk(Bytes::from(channel)), Frame::Integer(count as i64)]
                    })
                    .collect(),
            ),
            Pubsub::Numpat => Frame::Integer(state.pubsub.numpat() as i64),
        };

        Ok(res)
    }
}

impl TryFrom<&mut CommandParser> for Pubsub {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let subcommand = parser.next_string()?;

        let pubsub = match subcommand.to_lowercase().as_str() {
            "channels" => match parser.next_string() {
                Ok(pattern) => Pubsub::Channels(Some(pattern)),
                Err(CommandParserError::EndOfStream) => Pubsub::Channels(None),
                Err(e) => return Err(e.into()),
            },
            "numsub" => Pubsub::Numsub(parser.rest_strings()?),
            "numpat" => Pubsub::Numpat,
            _ => {
                return Err(CommandParserError::UnknownSubcommand {
                    command: "PUBSUB".to_string(),
                    subcommand,
                }
                .into())
            }
        };

        Ok(pubsub)
    }
}
