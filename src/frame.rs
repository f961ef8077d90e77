// https://redis.io/docs/reference/protocol-spec

use std::fmt;

use bytes::{Buf, BufMut, Bytes, BytesMut};
use std::io::Cursor;
use std::string::FromUtf8Error;
use thiserror::Error as ThisError;

static CRLF: &[u8; 2] = b"\r\n";

/// Deepest array nesting accepted. Requests are flat arrays; replies nest at most one level more.
const MAX_DEPTH: usize = 32;

/// The leading byte of every serialized value.
mod tag {
    pub const SIMPLE: u8 = b'+';
    pub const ERROR: u8 = b'-';
    pub const INTEGER: u8 = b':';
    pub const BULK: u8 = b'$';
    pub const BULK_ERROR: u8 = b'!';
    pub const ARRAY: u8 = b'*';
    pub const NULL: u8 = b'_';
}

#[derive(Debug, ThisError)]
pub enum Error {
    #[error("not enough data is available to parse an entire frame")]
    Incomplete,
    /// Like `Incomplete`, but the buffer must hold at least `needed` bytes before the frame can
    /// be parsed.
    #[error("frame needs {needed} bytes")]
    Partial { needed: usize },
    #[error("invalid frame data type: {0}")]
    InvalidDataType(u8),
    /// A RESP3 type that requests never carry.
    #[error("unsupported frame data type: {0:?}")]
    UnsupportedDataType(char),
    #[error("{0}")]
    Other(crate::Error),
}

/// A single protocol value. Requests arrive as arrays of bulk strings; command handlers build
/// replies out of these variants and never deal with bytes on the wire.
#[derive(Clone, Debug, PartialEq)]
pub enum Frame {
    Simple(String),
    Error(String),
    Integer(i64),
    Bulk(Bytes),
    Null,
    Array(Vec<Frame>),
}

impl Frame {
    /// Parses one complete value starting at the cursor position. Returns
    /// [`Error::Incomplete`] when the buffer ends before the value does; the cursor position is
    /// meaningless in that case.
    pub fn parse(src: &mut Cursor<&[u8]>) -> Result<Self, Error> {
        Self::parse_nested(src, 0)
    }

    fn parse_nested(src: &mut Cursor<&[u8]>, depth: usize) -> Result<Self, Error> {
        match get_byte(src)? {
            tag::SIMPLE => Ok(Frame::Simple(get_text(src)?)),
            tag::ERROR => Ok(Frame::Error(get_text(src)?)),
            tag::INTEGER => Ok(Frame::Integer(get_decimal(src)?)),
            // $<length>\r\n<data>\r\n, or $-1\r\n for the RESP2 null.
            tag::BULK => match get_decimal(src)? {
                -1 => Ok(Frame::Null),
                length => Ok(Frame::Bulk(Bytes::copy_from_slice(get_exact(src, length)?))),
            },
            tag::BULK_ERROR => {
                let length = get_decimal(src)?;
                let message = get_exact(src, length)?.to_vec();
                Ok(Frame::Error(String::from_utf8(message)?))
            }
            // *<number-of-elements>\r\n<element-1>...<element-n>
            tag::ARRAY => {
                if depth >= MAX_DEPTH {
                    return Err("protocol error; nesting too deep".into());
                }

                let length = match get_decimal(src)? {
                    -1 => return Ok(Frame::Null),
                    length => usize::try_from(length)
                        .map_err(|_| Error::from("protocol error; invalid array length"))?,
                };

                // The declared length is untrusted until the elements actually arrive.
                let mut frames = Vec::with_capacity(length.min(1024));
                for _ in 0..length {
                    frames.push(Self::parse_nested(src, depth + 1)?);
                }

                Ok(Frame::Array(frames))
            }
            tag::NULL => {
                get_line(src)?;
                Ok(Frame::Null)
            }
            byte @ (b'#' | b',' | b'(' | b'=' | b'%' | b'~' | b'>') => {
                Err(Error::UnsupportedDataType(byte as char))
            }
            byte => Err(Error::InvalidDataType(byte)),
        }
    }

    /// Appends the wire representation of the frame to `dst`.
    pub fn encode(&self, dst: &mut BytesMut) {
        match self {
            Frame::Simple(s) => put_line(dst, tag::SIMPLE, s.as_bytes()),
            Frame::Error(s) => put_line(dst, tag::ERROR, s.as_bytes()),
            Frame::Integer(i) => put_line(dst, tag::INTEGER, i.to_string().as_bytes()),
            Frame::Bulk(bytes) => {
                put_line(dst, tag::BULK, bytes.len().to_string().as_bytes());
                dst.put_slice(bytes);
                dst.put_slice(CRLF);
            }
            // RESP2 null bulk string. Every client understands it, unlike the RESP3 `_` null.
            Frame::Null => put_line(dst, tag::BULK, b"-1"),
            Frame::Array(frames) => {
                put_line(dst, tag::ARRAY, frames.len().to_string().as_bytes());
                for frame in frames {
                    frame.encode(dst);
                }
            }
        }
    }

    pub fn serialize(&self) -> Vec<u8> {
        let mut buf = BytesMut::new();
        self.encode(&mut buf);
        buf.to_vec()
    }

    /// Shorthand for the `+OK` status reply.
    pub fn ok() -> Frame {
        Frame::Simple("OK".to_string())
    }

    /// Builds an array of bulk strings.
    pub fn bulks<I>(items: I) -> Frame
    where
        I: IntoIterator<Item = Bytes>,
    {
        Frame::Array(items.into_iter().map(Frame::Bulk).collect())
    }

    /// Returns the textual content of a string-like frame.
    pub fn as_text(&self) -> Option<String> {
        match self {
            Frame::Simple(s) => Some(s.clone()),
            Frame::Bulk(bytes) => Some(String::from_utf8_lossy(bytes).into_owned()),
            Frame::Integer(i) => Some(i.to_string()),
            _ => None,
        }
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Frame::Simple(s) => write!(f, "+{}", s),
            Frame::Error(s) => write!(f, "-{}", s),
            Frame::Integer(i) => write!(f, ":{}", i),
            Frame::Bulk(bytes) => write!(f, "${}", String::from_utf8_lossy(bytes)),
            Frame::Null => write!(f, "$-1"),
            Frame::Array(frames) => {
                write!(f, "*{}", frames.len())?;
                for frame in frames {
                    write!(f, " {}", frame)?;
                }
                Ok(())
            }
        }
    }
}

fn put_line(dst: &mut BytesMut, tag: u8, content: &[u8]) {
    dst.put_u8(tag);
    dst.put_slice(content);
    dst.put_slice(CRLF);
}

/// Returns the bytes up to the next CRLF and moves the cursor past it.
fn get_line<'a>(src: &mut Cursor<&'a [u8]>) -> Result<&'a [u8], Error> {
    let start = src.position() as usize;
    let buf = *src.get_ref();

    let line_end = buf[start..]
        .windows(2)
        .position(|window| window == CRLF)
        .map(|index| start + index)
        .ok_or(Error::Incomplete)?;

    src.set_position((line_end + CRLF.len()) as u64);

    Ok(&buf[start..line_end])
}

fn get_text(src: &mut Cursor<&[u8]>) -> Result<String, Error> {
    Ok(String::from_utf8(get_line(src)?.to_vec())?)
}

/// Reads a `length` bytes payload followed by CRLF. Bulk payloads may themselves contain CRLF,
/// so they cannot be read line by line.
fn get_exact<'a>(src: &mut Cursor<&'a [u8]>, length: i64) -> Result<&'a [u8], Error> {
    let length = usize::try_from(length)
        .map_err(|_| Error::from("protocol error; invalid bulk length"))?;
    let start = src.position() as usize;
    let buf = *src.get_ref();

    let (end, needed) = start
        .checked_add(length)
        .and_then(|end| Some((end, end.checked_add(CRLF.len())?)))
        .ok_or_else(|| Error::from("protocol error; invalid bulk length"))?;

    if buf.len() < needed {
        return Err(Error::Partial { needed });
    }

    if &buf[end..end + CRLF.len()] != CRLF {
        return Err("protocol error; bulk payload is not terminated by CRLF".into());
    }

    src.set_position((end + CRLF.len()) as u64);

    Ok(&buf[start..end])
}

fn get_decimal(src: &mut Cursor<&[u8]>) -> Result<i64, Error> {
    let line = get_line(src)?;

    std::str::from_utf8(line)
        .ok()
        .and_then(|line| line.parse::<i64>().ok())
        .ok_or_else(|| Error::from("protocol error; invalid number"))
}

fn get_byte(src: &mut Cursor<&[u8]>) -> Result<u8, Error> {
    if !src.has_remaining() {
        return Err(Error::Incomplete);
    }
    Ok(src.get_u8())
}

impl From<FromUtf8Error> for Error {
    fn from(_src: FromUtf8Error) -> Error {
        "protocol error; invalid frame format".into()
    }
}

impl From<&str> for Error {
    fn from(src: &str) -> Error {
        Error::Other(src.into())
    }
}
