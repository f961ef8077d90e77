use bytes::{Buf, BytesMut};
use std::io::Cursor;
use tokio_util::codec::{Decoder, Encoder};

use crate::frame::{self, Frame};
use crate::Error;

/// Default limit for a single buffered frame.
pub const DEFAULT_MAX_FRAME_SIZE: usize = 512 * 1024 * 1024;

pub struct FrameCodec {
    max_frame_size: usize,
    /// Buffer length below which the pending frame cannot be complete. Avoids re-parsing a
    /// large bulk string each time a few more bytes of it arrive.
    wanted: usize,
}

impl FrameCodec {
    pub fn new(max_frame_size: usize) -> FrameCodec {
        FrameCodec {
            max_frame_size,
            wanted: 0,
        }
    }
}

impl Default for FrameCodec {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FRAME_SIZE)
    }
}

impl Decoder for FrameCodec {
    type Item = Frame;
    type Error = Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        // Check if the frame size exceeds a certain limit to prevent DoS attacks
        if src.len() > self.max_frame_size {
            return Err("frame size exceeds limit".into());
        }

        if src.len() < self.wanted {
            return Ok(None);
        }

        let mut cursor = Cursor::new(&src[..]);
        let frame = match Frame::parse(&mut cursor) {
            Ok(frame) => frame,
            Err(frame::Error::Incomplete) => return Ok(None), // Not enough data to parse a frame.
            Err(frame::Error::Partial { needed }) => {
                if needed > self.max_frame_size {
                    return Err("frame size exceeds limit".into());
                }

                self.wanted = needed;
                src.reserve(needed - src.len());
                return Ok(None);
            }
            Err(err) => return Err(err.into()),
        };
        self.wanted = 0;

        let position = usize::try_from(cursor.position())?;

        // Remove the parsed frame from the buffer.
        src.advance(position);

        Ok(Some(frame))
    }
}

impl Encoder<Frame> for FrameCodec {
    type Error = Error;

    fn encode(&mut self, frame: Frame, dst: &mut BytesMut) -> Result<(), Self::Error> {
        frame.encode(dst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    #[test]
    fn decode_leaves_partial_frames_in_buffer() {
        let mut codec = FrameCodec::default();
        let mut buf = BytesMut::from(&b"*2\r\n$4\r\nECHO\r\n$2\r\nhi\r\n*1\r\n$4\r\nPI"[..]);

        let frame = codec.decode(&mut buf).unwrap();
        assert_eq!(
            frame,
            Some(Frame::Array(vec![
                Frame::Bulk(Bytes::from("ECHO")),
                Frame::Bulk(Bytes::from("hi")),
            ]))
        );

        assert_eq!(codec.decode(&mut buf).unwrap(), None);
        assert_eq!(&buf[..], b"*1\r\n$4\r\nPI");

        buf.extend_from_slice(b"NG\r\n");
        assert_eq!(
            codec.decode(&mut buf).unwrap(),
            Some(Frame::Array(vec![Frame::Bulk(Bytes::from("PING"))]))
        );
        assert!(buf.is_empty());
    }

    #[test]
    fn decode_rejects_oversized_buffer() {
        let mut codec = FrameCodec::new(8);
        let mut buf = BytesMut::from(&b"$10\r\n0123456789\r\n"[..]);

        assert!(codec.decode(&mut buf).is_err());
    }

    #[test]
    fn decode_waits_for_declared_bulk_length() {
        let mut codec = FrameCodec::default();
        let mut buf = BytesMut::from(&b"*2\r\n$4\r\nECHO\r\n$10\r\n01"[..]);

        assert_eq!(codec.decode(&mut buf).unwrap(), None);
        assert_eq!(codec.wanted, 31);
        assert!(buf.capacity() >= 31);

        for byte in b"23456789\r" {
            buf.extend_from_slice(&[*byte]);
            assert_eq!(codec.decode(&mut buf).unwrap(), None);
        }

        buf.extend_from_slice(b"\n+next\r\n");
        assert_eq!(
            codec.decode(&mut buf).unwrap(),
            Some(Frame::Array(vec![
                Frame::Bulk(Bytes::from("ECHO")),
                Frame::Bulk(Bytes::from("0123456789")),
            ]))
        );
        assert_eq!(codec.wanted, 0);
        assert_eq!(
            codec.decode(&mut buf).unwrap(),
            Some(Frame::Simple("next".to_string()))
        );
    }

    #[test]
    fn decode_rejects_declared_length_over_limit() {
        let mut codec = FrameCodec::new(64);
        let mut buf = BytesMut::from(&b"$1000\r\n"[..]);

        assert!(codec.decode(&mut buf).is_err());
    }

    #[test]
    fn decode_rejects_deeply_nested_arrays() {
        let mut codec = FrameCodec::default();
        let mut buf = BytesMut::from(&b"*1\r\n".repeat(200_000)[..]);

        assert!(codec.decode(&mut buf).is_err());
    }

    #[test]
    fn encode_writes_wire_format() {
        let mut codec = FrameCodec::default();
        let mut buf = BytesMut::new();

        codec.encode(Frame::Integer(42), &mut buf).unwrap();
        codec.encode(Frame::Null, &mut buf).unwrap();

        assert_eq!(&buf[..], b":42\r\n$-1\r\n");
    }
}
