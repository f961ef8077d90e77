use crate::commands::executable::Executable;
use crate::commands::CommandParser;
use crate::frame::Frame;
use crate::server::State;
use crate::session::Session;
use crate::Error;

/// Returns the members of the set resulting from the union of all the given sets. Keys that do
/// not exist are considered to be empty sets.
///
/// Ref: <https://redis.io/docs/latest/commands/sunion/>
#[derive(Debug, PartialEq)]
pub struct Sunion {
    pub keys: Vec<String>,
}

impl Executable for Sunion {
    fn exec(self, state: &State, session: &mut Session) -> Result<Frame, Error> {
        let store = state.store.lock();

        let res = match store.db(session.db).sunion(&self.keys) {
            Ok(members) => Frame::bulks(members),
            Err(e) => e.into(),
        };

        Ok(res)
    }
}

impl TryFrom<&mut CommandParser> for Sunion {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let keys = parser.rest_strings()?;
        Ok(Self { keys })
    }
}
