use bytes::Bytes;

use crate::commands::executable::Executable;
use crate::commands::{arity, registry, Arity, CommandParser};
use crate::frame::Frame;
use crate::server::State;
use crate::session::Session;
use crate::Error;

/// Command introspection.
///
/// Ref: <https://redis.io/docs/latest/commands/command/>
#[derive(Debug, PartialEq)]
pub enum Command {
    /// `COMMAND` and any subcommand besides `COUNT` and `INFO`. Replies with an empty array.
    List,
    Count,
    Info(Vec<String>),
}

impl Executable for Command {
    fn exec(self, _state: &State, _session: &mut Session) -> Result<Frame, Error> {
        let res = match self {
            Command::List => Frame::Array(vec![]),
            Command::Count => Frame::Integer(registry().len() as i64),
            Command::Info(names) => Frame::Array(names.into_iter().map(describe).collect()),
        };

        Ok(res)
    }
}

/// `[name, arity]`, where the arity counts the command name and is negative for variadic
/// commands.
fn describe(name: String) -> Frame {
    let Some(arity) = arity(&name) else {
        return Frame::Null;
    };

    let arity = match arity {
        Arity::Exact(n) => n as i64 + 1,
        Arity::AtLeast(n) => -(n as i64 + 1),
    };

    Frame::Array(vec![
        Frame::Bulk(Bytes::from(name.to_lowercase())),
        Frame::Integer(arity),
    ])
}

impl TryFrom<&mut CommandParser> for Command {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        if parser.remaining() == 0 {
            return Ok(Command::List);
        }

        let subcommand = parser.next_string()?.to_lowercase();

        let command = match subcommand.as_str() {
            "count" => Command::Count,
            "info" => Command::Info(parser.rest_strings()?),
            _ => {
                parser.rest_bytes()?;
                Command::List
            }
        };

        Ok(command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::{connect, run};

    #[test]
    fn bare_command_and_docs() {
        let state = State::default();
        let (mut session, _rx) = connect(&state);

        assert_eq!(run(&state, &mut session, &["COMMAND"]), Frame::Array(vec![]));
        assert_eq!(
            run(&state, &mut session, &["COMMAND", "DOCS"]),
            Frame::Array(vec![])
        );
    }

    #[test]
    fn count_and_info() {
        let state = State::default();
        let (mut session, _rx) = connect(&state);

        assert_eq!(
            run(&state, &mut session, &["COMMAND", "COUNT"]),
            Frame::Integer(registry().len() as i64)
        );
        assert_eq!(
            run(&state, &mut session, &["COMMAND", "INFO", "GET", "SADD", "NOPE"]),
            Frame::Array(vec![
                Frame::Array(vec![Frame::Bulk(Bytes::from("get")), Frame::Integer(2)]),
                Frame::Array(vec![Frame::Bulk(Bytes::from("sadd")), Frame::Integer(-3)]),
                Frame::Null,
            ])
        );
    }
}
