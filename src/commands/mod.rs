pub mod auth;
pub mod client;
pub mod command;
pub mod dbsize;
pub mod del;
pub mod echo;
pub mod executable;
pub mod exists;
pub mod flushdb;
pub mod get;
pub mod hdel;
pub mod hexists;
pub mod hget;
pub mod hgetall;
pub mod hincrby;
pub mod hincrbyfloat;
pub mod hkeys;
pub mod hlen;
pub mod hmget;
pub mod hmset;
pub mod hset;
pub mod hsetnx;
pub mod hstrlen;
pub mod hvals;
pub mod keys;
pub mod lindex;
pub mod linsert;
pub mod llen;
pub mod lpop;
pub mod lpush;
pub mod lset;
pub mod monitor;
pub mod ping;
pub mod psubscribe;
pub mod publish;
pub mod pubsub;
pub mod punsubscribe;
pub mod quit;
pub mod rpop;
pub mod rpush;
pub mod sadd;
pub mod scard;
pub mod select;
pub mod set;
pub mod sismember;
pub mod smembers;
pub mod spop;
pub mod srem;
pub mod subscribe;
pub mod sunion;
pub mod swapdb;
pub mod type_;
pub mod unsubscribe;

use bytes::Bytes;
use std::collections::HashMap;
use std::sync::OnceLock;
use std::{str, vec};
use thiserror::Error as ThisError;

use crate::commands::executable::Executable;
use crate::frame::Frame;
use crate::server::State;
use crate::session::Session;
use crate::Error;

use auth::Auth;
use client::Client;
use command::Command as Command_;
use dbsize::DBSize;
use del::Del;
use echo::Echo;
use exists::Exists;
use flushdb::FlushDb;
use get::Get;
use hdel::Hdel;
use hexists::Hexists;
use hget::Hget;
use hgetall::Hgetall;
use hincrby::HincrBy;
use hincrbyfloat::HincrByFloat;
use hkeys::Hkeys;
use hlen::Hlen;
use hmget::Hmget;
use hmset::Hmset;
use hset::Hset;
use hsetnx::Hsetnx;
use hstrlen::Hstrlen;
use hvals::Hvals;
use keys::Keys;
use lindex::Lindex;
use linsert::Linsert;
use llen::Llen;
use lpop::Lpop;
use lpush::Lpush;
use lset::Lset;
use monitor::Monitor;
use ping::Ping;
use psubscribe::Psubscribe;
use publish::Publish;
use pubsub::Pubsub;
use punsubscribe::Punsubscribe;
use quit::Quit;
use rpop::Rpop;
use rpush::Rpush;
use sadd::Sadd;
use scard::Scard;
use select::Select;
use set::Set;
use sismember::Sismember;
use smembers::Smembers;
use spop::Spop;
use srem::Srem;
use subscribe::Subscribe;
use sunion::Sunion;
use swapdb::Swapdb;
use type_::Type;
use unsubscribe::Unsubscribe;

#[derive(Debug, PartialEq)]
pub enum Command {
    Auth(Auth),
    Client(Client),
    Command(Command_),
    Echo(Echo),
    Monitor(Monitor),
    Ping(Ping),
    Quit(Quit),
    Select(Select),
    Swapdb(Swapdb),

    DBSize(DBSize),
    Del(Del),
    Exists(Exists),
    FlushDb(FlushDb),
    Get(Get),
    Keys(Keys),
    Set(Set),
    Type(Type),

    Sadd(Sadd),
    Scard(Scard),
    Sismember(Sismember),
    Smembers(Smembers),
    Spop(Spop),
    Srem(Srem),
    Sunion(Sunion),

    Hdel(Hdel),
    Hexists(Hexists),
    Hget(Hget),
    Hgetall(Hgetall),
    HincrBy(HincrBy),
    HincrByFloat(HincrByFloat),
    Hkeys(Hkeys),
    Hlen(Hlen),
    Hmget(Hmget),
    Hmset(Hmset),
    Hset(Hset),
    Hsetnx(Hsetnx),
    Hstrlen(Hstrlen),
    Hvals(Hvals),

    Lindex(Lindex),
    Linsert(Linsert),
    Llen(Llen),
    Lpop(Lpop),
    Lpush(Lpush),
    Lset(Lset),
    Rpop(Rpop),
    Rpush(Rpush),

    Psubscribe(Psubscribe),
    Publish(Publish),
    Pubsub(Pubsub),
    Punsubscribe(Punsubscribe),
    Subscribe(Subscribe),
    Unsubscribe(Unsubscribe),
}

impl Executable for Command {
    fn exec(self, state: &State, session: &mut Session) -> Result<Frame, Error> {
        match self {
            Command::Auth(cmd) => cmd.exec(state, session),
            Command::Client(cmd) => cmd.exec(state, session),
            Command::Command(cmd) => cmd.exec(state, session),
            Command::Echo(cmd) => cmd.exec(state, session),
            Command::Monitor(cmd) => cmd.exec(state, session),
            Command::Ping(cmd) => cmd.exec(state, session),
            Command::Quit(cmd) => cmd.exec(state, session),
            Command::Select(cmd) => cmd.exec(state, session),
            Command::Swapdb(cmd) => cmd.exec(state, session),
            Command::DBSize(cmd) => cmd.exec(state, session),
            Command::Del(cmd) => cmd.exec(state, session),
            Command::Exists(cmd) => cmd.exec(state, session),
            Command::FlushDb(cmd) => cmd.exec(state, session),
            Command::Get(cmd) => cmd.exec(state, session),
            Command::Keys(cmd) => cmd.exec(state, session),
            Command::Set(cmd) => cmd.exec(state, session),
            Command::Type(cmd) => cmd.exec(state, session),
            Command::Sadd(cmd) => cmd.exec(state, session),
            Command::Scard(cmd) => cmd.exec(state, session),
            Command::Sismember(cmd) => cmd.exec(state, session),
            Command::Smembers(cmd) => cmd.exec(state, session),
            Command::Spop(cmd) => cmd.exec(state, session),
            Command::Srem(cmd) => cmd.exec(state, session),
            Command::Sunion(cmd) => cmd.exec(state, session),
            Command::Hdel(cmd) => cmd.exec(state, session),
            Command::Hexists(cmd) => cmd.exec(state, session),
            Command::Hget(cmd) => cmd.exec(state, session),
            Command::Hgetall(cmd) => cmd.exec(state, session),
            Command::HincrBy(cmd) => cmd.exec(state, session),
            Command::HincrByFloat(cmd) => cmd.exec(state, session),
            Command::Hkeys(cmd) => cmd.exec(state, session),
            Command::Hlen(cmd) => cmd.exec(state, session),
            Command::Hmget(cmd) => cmd.exec(state, session),
            Command::Hmset(cmd) => cmd.exec(state, session),
            Command::Hset(cmd) => cmd.exec(state, session),
            Command::Hsetnx(cmd) => cmd.exec(state, session),
            Command::Hstrlen(cmd) => cmd.exec(state, session),
            Command::Hvals(cmd) => cmd.exec(state, session),
            Command::Lindex(cmd) => cmd.exec(state, session),
            Command::Linsert(cmd) => cmd.exec(state, session),
            Command::Llen(cmd) => cmd.exec(state, session),
            Command::Lpop(cmd) => cmd.exec(state, session),
            Command::Lpush(cmd) => cmd.exec(state, session),
            Command::Lset(cmd) => cmd.exec(state, session),
            Command::Rpop(cmd) => cmd.exec(state, session),
            Command::Rpush(cmd) => cmd.exec(state, session),
            Command::Psubscribe(cmd) => cmd.exec(state, session),
            Command::Publish(cmd) => cmd.exec(state, session),
            Command::Pubsub(cmd) => cmd.exec(state, session),
            Command::Punsubscribe(cmd) => cmd.exec(state, session),
            Command::Subscribe(cmd) => cmd.exec(state, session),
            Command::Unsubscribe(cmd) => cmd.exec(state, session),
        }
    }
}

impl TryFrom<Frame> for Command {
    type Error = Error;

    fn try_from(frame: Frame) -> Result<Self, Self::Error> {
        // Clients send commands to the server as RESP arrays.
        let frames = match frame {
            Frame::Array(array) => array,
            frame => {
                return Err(CommandParserError::InvalidFrame {
                    expected: "array".to_string(),
                    actual: frame,
                }
                .into())
            }
        };

        let parser = &mut CommandParser {
            command: String::new(),
            parts: frames.into_iter(),
        };

        let command_name = parser.parse_command_name()?;

        let Some(entry) = registry().get(command_name.as_str()) else {
            return Err(CommandParserError::UnknownCommand {
                command: command_name,
            }
            .into());
        };

        if !entry.arity.accepts(parser.remaining()) {
            return Err(parser.wrong_arg_count().into());
        }

        let command = (entry.parse)(parser)?;
        parser.finish()?;

        Ok(command)
    }
}

/// Number of arguments a command accepts, not counting the command name itself.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Arity {
    Exact(usize),
    AtLeast(usize),
}

impl Arity {
    pub fn accepts(self, count: usize) -> bool {
        match self {
            Arity::Exact(n) => count == n,
            Arity::AtLeast(n) => count >= n,
        }
    }
}

type Parse = fn(&mut CommandParser) -> Result<Command, Error>;

struct Entry {
    arity: Arity,
    parse: Parse,
}

fn entry(arity: Arity, parse: Parse) -> Entry {
    Entry { arity, parse }
}

/// Every supported command, keyed by its lowercase name.
fn registry() -> &'static HashMap<&'static str, Entry> {
    use Arity::{AtLeast, Exact};

    static REGISTRY: OnceLock<HashMap<&'static str, Entry>> = OnceLock::new();

    REGISTRY.get_or_init(|| {
        HashMap::from([
            // Connection
            ("auth", entry(Exact(1), |p| Auth::try_from(p).map(Command::Auth))),
            ("client", entry(AtLeast(1), |p| Client::try_from(p).map(Command::Client))),
            ("command", entry(AtLeast(0), |p| Command_::try_from(p).map(Command::Command))),
            ("echo", entry(Exact(1), |p| Echo::try_from(p).map(Command::Echo))),
            ("monitor", entry(Exact(0), |p| Monitor::try_from(p).map(Command::Monitor))),
            ("ping", entry(AtLeast(0), |p| Ping::try_from(p).map(Command::Ping))),
            ("quit", entry(Exact(0), |p| Quit::try_from(p).map(Command::Quit))),
            ("select", entry(Exact(1), |p| Select::try_from(p).map(Command::Select))),
            ("swapdb", entry(Exact(2), |p| Swapdb::try_from(p).map(Command::Swapdb))),
            // Keyspace
            ("dbsize", entry(Exact(0), |p| DBSize::try_from(p).map(Command::DBSize))),
            ("del", entry(AtLeast(1), |p| Del::try_from(p).map(Command::Del))),
            ("exists", entry(AtLeast(1), |p| Exists::try_from(p).map(Command::Exists))),
            ("flushdb", entry(Exact(0), |p| FlushDb::try_from(p).map(Command::FlushDb))),
            ("get", entry(Exact(1), |p| Get::try_from(p).map(Command::Get))),
            ("keys", entry(Exact(1), |p| Keys::try_from(p).map(Command::Keys))),
            ("set", entry(Exact(2), |p| Set::try_from(p).map(Command::Set))),
            ("type", entry(Exact(1), |p| Type::try_from(p).map(Command::Type))),
            // Sets
            ("sadd", entry(AtLeast(2), |p| Sadd::try_from(p).map(Command::Sadd))),
            ("scard", entry(Exact(1), |p| Scard::try_from(p).map(Command::Scard))),
            ("sismember", entry(Exact(2), |p| Sismember::try_from(p).map(Command::Sismember))),
            ("smembers", entry(Exact(1), |p| Smembers::try_from(p).map(Command::Smembers))),
            ("spop", entry(AtLeast(1), |p| Spop::try_from(p).map(Command::Spop))),
            ("srem", entry(AtLeast(2), |p| Srem::try_from(p).map(Command::Srem))),
            ("sunion", entry(AtLeast(1), |p| Sunion::try_from(p).map(Command::Sunion))),
            // Hashes
            ("hdel", entry(AtLeast(2), |p| Hdel::try_from(p).map(Command::Hdel))),
            ("hexists", entry(Exact(2), |p| Hexists::try_from(p).map(Command::Hexists))),
            ("hget", entry(Exact(2), |p| Hget::try_from(p).map(Command::Hget))),
            ("hgetall", entry(Exact(1), |p| Hgetall::try_from(p).map(Command::Hgetall))),
            ("hincrby", entry(Exact(3), |p| HincrBy::try_from(p).map(Command::HincrBy))),
            (
                "hincrbyfloat",
                entry(Exact(3), |p| HincrByFloat::try_from(p).map(Command::HincrByFloat)),
            ),
            ("hkeys", entry(Exact(1), |p| Hkeys::try_from(p).map(Command::Hkeys))),
            ("hlen", entry(Exact(1), |p| Hlen::try_from(p).map(Command::Hlen))),
            ("hmget", entry(AtLeast(2), |p| Hmget::try_from(p).map(Command::Hmget))),
            ("hmset", entry(AtLeast(3), |p| Hmset::try_from(p).map(Command::Hmset))),
            ("hset", entry(AtLeast(3), |p| Hset::try_from(p).map(Command::Hset))),
            ("hsetnx", entry(Exact(3), |p| Hsetnx::try_from(p).map(Command::Hsetnx))),
            ("hstrlen", entry(Exact(2), |p| Hstrlen::try_from(p).map(Command::Hstrlen))),
            ("hvals", entry(Exact(1), |p| Hvals::try_from(p).map(Command::Hvals))),
            // Lists
            ("lindex", entry(Exact(2), |p| Lindex::try_from(p).map(Command::Lindex))),
            ("linsert", entry(Exact(4), |p| Linsert::try_from(p).map(Command::Linsert))),
            ("llen", entry(Exact(1), |p| Llen::try_from(p).map(Command::Llen))),
            ("lpop", entry(Exact(1), |p| Lpop::try_from(p).map(Command::Lpop))),
            ("lpush", entry(AtLeast(2), |p| Lpush::try_from(p).map(Command::Lpush))),
            ("lset", entry(Exact(3), |p| Lset::try_from(p).map(Command::Lset))),
            ("rpop", entry(Exact(1), |p| Rpop::try_from(p).map(Command::Rpop))),
            ("rpush", entry(AtLeast(2), |p| Rpush::try_from(p).map(Command::Rpush))),
            // Pub/sub
            ("psubscribe", entry(AtLeast(1), |p| Psubscribe::try_from(p).map(Command::Psubscribe))),
            ("publish", entry(Exact(2), |p| Publish::try_from(p).map(Command::Publish))),
            ("pubsub", entry(AtLeast(1), |p| Pubsub::try_from(p).map(Command::Pubsub))),
            (
                "punsubscribe",
                entry(AtLeast(0), |p| Punsubscribe::try_from(p).map(Command::Punsubscribe)),
            ),
            ("subscribe", entry(AtLeast(1), |p| Subscribe::try_from(p).map(Command::Subscribe))),
            (
                "unsubscribe",
                entry(AtLeast(0), |p| Unsubscribe::try_from(p).map(Command::Unsubscribe)),
            ),
        ])
    })
}

/// Replies with several frames: all but the last are queued on the session and written ahead of
/// the returned one.
fn multi_reply(session: &mut Session, mut frames: Vec<Frame>) -> Frame {
    let last = frames.pop().unwrap_or(Frame::Array(vec![]));
    for frame in frames {
        session.push_reply(frame);
    }
    last
}

/// Returns the declared arity of a command, if it is known.
pub fn arity(name: &str) -> Option<Arity> {
    registry()
        .get(name.to_lowercase().as_str())
        .map(|entry| entry.arity)
}

pub struct CommandParser {
    command: String,
    parts: vec::IntoIter<Frame>,
}

impl CommandParser {
    fn parse_command_name(&mut self) -> Result<String, CommandParserError> {
        let command_name = self
            .parts
            .next()
            .ok_or_else(|| CommandParserError::EndOfStream)?;

        let name = match command_name {
            Frame::Simple(s) => s.to_lowercase(),
            Frame::Bulk(bytes) => str::from_utf8(&bytes[..])
                .map(|s| s.to_lowercase())
                .map_err(CommandParserError::InvalidUTF8String)?,
            frame => {
                return Err(CommandParserError::InvalidFrame {
                    expected: "simple or bulk string".to_string(),
                    actual: frame,
                })
            }
        };

        self.command = name.clone();
        Ok(name)
    }

    /// Number of arguments not consumed yet.
    fn remaining(&self) -> usize {
        self.parts.len()
    }

    fn next_string(&mut self) -> Result<String, CommandParserError> {
        let frame = self
            .parts
            .next()
            .ok_or_else(|| CommandParserError::EndOfStream)?;

        match frame {
            // Both `Simple` and `Bulk` representation may be strings. Strings are parsed to UTF-8.
            // While errors are stored as strings, they are considered separate types.
            Frame::Simple(s) => Ok(s),
            Frame::Bulk(bytes) => str::from_utf8(&bytes[..])
                .map(|s| s.to_string())
                .map_err(CommandParserError::InvalidUTF8String),
            frame => Err(CommandParserError::InvalidFrame {
                expected: "simple or bulk string".to_string(),
                actual: frame,
            }),
        }
    }

    fn next_integer(&mut self) -> Result<i64, CommandParserError> {
        let frame = self
            .parts
            .next()
            .ok_or_else(|| CommandParserError::EndOfStream)?;

        match frame {
            Frame::Integer(i) => Ok(i),
            Frame::Simple(string) => string
                .parse::<i64>()
                .map_err(|_| CommandParserError::InvalidInteger),
            Frame::Bulk(bytes) => str::from_utf8(&bytes[..])
                .map_err(|_| CommandParserError::InvalidInteger)?
                .parse::<i64>()
                .map_err(|_| CommandParserError::InvalidInteger),
            frame => Err(CommandParserError::InvalidFrame {
                expected: "integer".to_string(),
                actual: frame,
            }),
        }
    }

    fn next_float(&mut self) -> Result<f64, CommandParserError> {
        let frame = self
            .parts
            .next()
            .ok_or_else(|| CommandParserError::EndOfStream)?;

        let float = match frame {
            Frame::Integer(i) => i as f64,
            Frame::Simple(string) => string
                .parse::<f64>()
                .map_err(|_| CommandParserError::InvalidFloat)?,
            Frame::Bulk(bytes) => str::from_utf8(&bytes[..])
                .map_err(|_| CommandParserError::InvalidFloat)?
                .parse::<f64>()
                .map_err(|_| CommandParserError::InvalidFloat)?,
            frame => {
                return Err(CommandParserError::InvalidFrame {
                    expected: "float".to_string(),
                    actual: frame,
                })
            }
        };

        if float.is_nan() {
            return Err(CommandParserError::InvalidFloat);
        }

        Ok(float)
    }

    fn next_bytes(&mut self) -> Result<Bytes, CommandParserError> {
        let frame = self
            .parts
            .next()
            .ok_or_else(|| CommandParserError::EndOfStream)?;

        match frame {
            Frame::Simple(s) => Ok(Bytes::from(s)),
            Frame::Bulk(bytes) => Ok(bytes),
            Frame::Integer(i) => Ok(Bytes::from(i.to_string())),
            frame => Err(CommandParserError::InvalidFrame {
                expected: "simple or bulk string".to_string(),
                actual: frame,
            }),
        }
    }

    /// Consumes every remaining argument as a string.
    fn rest_strings(&mut self) -> Result<Vec<String>, CommandParserError> {
        let mut strings = Vec::with_capacity(self.remaining());
        while self.remaining() > 0 {
            strings.push(self.next_string()?);
        }
        Ok(strings)
    }

    /// Consumes every remaining argument as raw bytes.
    fn rest_bytes(&mut self) -> Result<Vec<Bytes>, CommandParserError> {
        let mut values = Vec::with_capacity(self.remaining());
        while self.remaining() > 0 {
            values.push(self.next_bytes()?);
        }
        Ok(values)
    }

    /// Consumes the remaining arguments as field/value pairs. An odd count is an arity error.
    fn rest_pairs(&mut self) -> Result<Vec<(Bytes, Bytes)>, CommandParserError> {
        if self.remaining() % 2 != 0 {
            return Err(self.wrong_arg_count());
        }

        let mut pairs = Vec::with_capacity(self.remaining() / 2);
        while self.remaining() > 0 {
            pairs.push((self.next_bytes()?, self.next_bytes()?));
        }
        Ok(pairs)
    }

    /// Fails if arguments are left once the command has parsed what it accepts.
    fn finish(&mut self) -> Result<(), CommandParserError> {
        match self.parts.len() {
            0 => Ok(()),
            _ => Err(self.wrong_arg_count()),
        }
    }

    fn wrong_arg_count(&self) -> CommandParserError {
        CommandParserError::WrongArgCount {
            command: self.command.clone(),
        }
    }
}

#[derive(Debug, ThisError, PartialEq)]
pub enum CommandParserError {
    #[error("ERR Protocol error: invalid frame, expected {expected}, got {actual}")]
    InvalidFrame { expected: String, actual: Frame },
    #[error("ERR unknown command '{command}'")]
    UnknownCommand { command: String },
    #[error("ERR wrong number of arguments for '{command}' command")]
    WrongArgCount { command: String },
    #[error("ERR unknown subcommand '{subcommand}'. Try {command} HELP.")]
    UnknownSubcommand { command: String, subcommand: String },
    #[error("ERR value is not an integer or out of range")]
    InvalidInteger,
    #[error("ERR value is not a valid float")]
    InvalidFloat,
    #[error("ERR value is out of range, must be positive")]
    NotPositive,
    #[error("ERR syntax error")]
    Syntax,
    #[error("ERR Protocol error: invalid UTF-8 string")]
    InvalidUTF8String(#[from] str::Utf8Error),
    #[error("ERR Protocol error: unexpected end of command arguments")]
    EndOfStream,
}
