use bytes::Bytes;

use crate::commands::executable::Executable;
use crate::commands::CommandParser;
use crate::frame::Frame;
use crate::server::State;
use crate::session::Session;
use crate::Error;

/// Accepts any password. Credentials are not checked.
///
/// Ref: <https://redis.io/docs/latest/commands/auth/>
#[derive(Debug, PartialEq)]
pub struct Auth {
    pub password: Bytes,
}

impl Executable for Auth {
    fn exec(self, _state: &State, _session: &mut Session) -> Result<Frame, Error> {
        Ok(Frame::ok())
    }
}

impl TryFrom<&mut CommandParser> for Auth {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let password = parser.next_bytes()?;
        Ok(Self { password })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::{connect, run};

    #[test]
    fn any_password_is_accepted() {
        let state = State::default();
        let (mut session, _rx) = connect(&state);

        assert_eq!(run(&state, &mut session, &["AUTH", "secret"]), Frame::ok());
        assert_eq!(run(&state, &mut session, &["AUTH", ""]), Frame::ok());
    }
}
