use crate::commands::executable::Executable;
use crate::commands::CommandParser;
use crate::frame::Frame;
use crate::server::State;
use crate::session::Session;
use crate::Error;

/// Returns the string representation of the type of the value stored at `key`: `string`,
/// `list`, `set` or `hash`. If the key does not exist, `none` is returned.
///
/// Ref: <https://redis.io/docs/latest/commands/type/>
#[derive(Debug, PartialEq)]
pub struct Type {
    pub key: String,
}

impl Executable for Type {
    fn exec(self, state: &State, session: &mut Session) -> Result<Frame, Error> {
        let store = state.store.lock();
        let type_ = store.db(session.db).type_of(&self.key).unwrap_or("none");

        Ok(Frame::Simple(type_.to_string()))
    }
}

impl TryFrom<&mut CommandParser> for Type {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_string()?;
        Ok(Self { key })
    }
}
