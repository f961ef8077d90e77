use crate::commands::executable::Executable;
use crate::commands::CommandParser;
use crate::frame::Frame;
use crate::server::State;
use crate::session::Session;
use crate::Error;

/// Returns the number of fields contained in the hash stored at `key`.
///
/// Ref: <https://redis.io/docs/latest/commands/hlen/>
#[derive(Debug, PartialEq)]
pub struct Hlen {
    pub key: String,
}

impl Executable for Hlen {
    fn exec(self, state: &State, session: &mut Session) -> Result<Frame, Error> {
        let store = state.store.lock();

        let res = match store.db(session.db).hlen(&self.key) {
            Ok(len) => Frame::Integer(len as i64),
            Err(e) => e.into(),
        };

        Ok(res)
    }
}

impl TryFrom<&mut CommandParser> for Hlen {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_string()?;
        Ok(Self { key })
    }
}
