use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_util::codec::Framed;

use crate::codec::FrameCodec;
use crate::frame::Frame;
use crate::Error;

/// Frame-level transport over a TCP stream.
///
/// Data is read from the socket into the codec's read buffer; when a frame is parsed the
/// corresponding bytes are removed from it. Writes are encoded into the write buffer and flushed
/// before returning, so a reply is on the wire before the next request is read.
pub struct Connection {
    framed: Framed<TcpStream, FrameCodec>,
}

impl Connection {
    pub fn new(stream: TcpStream) -> Connection {
        Self::with_codec(stream, FrameCodec::default())
    }

    pub fn with_codec(stream: TcpStream, codec: FrameCodec) -> Connection {
        Connection {
            framed: Framed::new(stream, codec),
        }
    }

    /// Reads a single frame from the stream. Returns `None` once the peer has closed the
    /// connection cleanly.
    ///
    /// Cancel safe: a partially received frame stays buffered for the next call.
    pub async fn read_frame(&mut self) -> Result<Option<Frame>, Error> {
        self.framed.next().await.transpose()
    }

    pub async fn write_frame(&mut self, frame: Frame) -> Result<(), Error> {
        self.framed.send(frame).await
    }

    /// Writes several frames with a single flush at the end.
    pub async fn write_frames<I>(&mut self, frames: I) -> Result<(), Error>
    where
        I: IntoIterator<Item = Frame>,
    {
        for frame in frames {
            self.framed.feed(frame).await?;
        }
        self.framed.flush().await
    }

    /// Flushes pending writes and shuts down the write half of the socket.
    pub async fn shutdown(&mut self) -> Result<(), Error> {
        SinkExt::<Frame>::close(&mut self.framed).await
    }
}
