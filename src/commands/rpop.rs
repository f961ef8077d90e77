use crate::commands::executable::Executable;
use crate::commands::CommandParser;
use crate::frame::Frame;
use crate::server::State;
use crate::session::Session;
use crate::Error;

/// Removes and returns the last element of the list stored at `key`.
///
/// Ref: <https://redis.io/docs/latest/commands/rpop/>
#[derive(Debug, PartialEq)]
pub struct Rpop {
    pub key: String,
}

impl Executable for Rpop {
    fn exec(self, state: &State, session: &mut Session) -> Result<Frame, Error> {
        let mut store = state.store.lock();

        let res = match store.write(session.db, |db| db.rpop(&self.key)) {
            Ok(value) => value.map_or(Frame::Null, Frame::Bulk),
            Err(e) => e.into(),
        };

        Ok(res)
    }
}

impl TryFrom<&mut CommandParser> for Rpop {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_string()?;
        Ok(Self { key })
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;
    use crate::commands::testing::{connect, run};

    #[test]
    fn pops_from_tail_and_removes_empty_list() {
        let state = State::default();
        let (mut session, _rx) = connect(&state);
        run(&state, &mut session, &["LPUSH", "list1", "var2", "var1"]);

        assert_eq!(
            run(&state, &mut session, &["RPOP", "list1"]),
            Frame::Bulk(Bytes::from("var2"))
        );
        assert_eq!(
            run(&state, &mut session, &["RPOP", "list1"]),
            Frame::Bulk(Bytes::from("var1"))
        );
        assert_eq!(run(&state, &mut session, &["RPOP", "list1"]), Frame::Null);
        assert_eq!(
            run(&state, &mut session, &["TYPE", "list1"]),
            Frame::Simple("none".to_string())
        );
    }
}
