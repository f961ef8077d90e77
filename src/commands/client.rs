use bytes::Bytes;

use crate::commands::executable::Executable;
use crate::commands::CommandParser;
use crate::frame::Frame;
use crate::server::State;
use crate::session::Session;
use crate::Error;

/// Connection management subcommands. Only the subset client libraries send during their
/// handshake is implemented; other subcommands are acknowledged and ignored.
///
/// Ref: <https://redis.io/docs/latest/commands/client/>
#[derive(Debug, PartialEq)]
pub enum Client {
    SetName(String),
    GetName,
    Id,
    SetInfo { attribute: String, value: Bytes },
    Other(String),
}

impl Executable for Client {
    fn exec(self, _state: &State, session: &mut Session) -> Result<Frame, Error> {
        let res = match self {
            Client::SetName(name) => {
                session.name = Some(name).filter(|name| !name.is_empty());
                Frame::ok()
            }
            Client::GetName => session
                .name
                .as_ref()
                .map_or(Frame::Null, |name| Frame::Bulk(Bytes::from(name.clone()))),
            Client::Id => Frame::Bulk(Bytes::from(session.id.to_string())),
            Client::SetInfo { .. } | Client::Other(_) => Frame::ok(),
        };

        Ok(res)
    }
}

impl TryFrom<&mut CommandParser> for Client {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let subcommand = parser.next_string()?.to_lowercase();

        let client = match subcommand.as_str() {
            "setname" => Client::SetName(parser.next_string()?),
            "getname" => Client::GetName,
            "id" => Client::Id,
            "setinfo" => Client::SetInfo {
                attribute: parser.next_string()?,
                value: parser.next_bytes()?,
            },
            _ => {
                parser.rest_bytes()?;
                Client::Other(subcommand)
            }
        };

        Ok(client)
    }
}
