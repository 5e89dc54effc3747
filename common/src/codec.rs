//! Length-prefixed framing for [`Message`]s
//!
//! Frames are a 4-byte big-endian length followed by a bincode body, built on
//! `tokio_util`'s `LengthDelimitedCodec`. A clean end of stream between frames
//! surfaces as `Ok(None)`; a stream that ends inside a frame, or a frame whose
//! body does not decode, is a [`ProtocolError`].

use crate::error::{ProtocolError, Result};
use crate::protocol::Message;
use bytes::{Bytes, BytesMut};
use futures::{SinkExt, StreamExt};
use std::net::SocketAddr;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::{TcpStream, ToSocketAddrs};
use tokio_util::codec::{Decoder, Encoder, Framed, LengthDelimitedCodec};
use tracing::trace;

/// Default upper bound on a single frame body.
pub const DEFAULT_MAX_FRAME_LENGTH: usize = 8 * 1024 * 1024;

/// Codec turning a byte stream into [`Message`]s and back.
#[derive(Debug)]
pub struct MessageCodec {
    inner: LengthDelimitedCodec,
}

impl MessageCodec {
    pub fn new() -> Self {
        Self::with_max_frame_length(DEFAULT_MAX_FRAME_LENGTH)
    }

    pub fn with_max_frame_length(max_frame_length: usize) -> Self {
        Self {
            inner: LengthDelimitedCodec::builder()
                .length_field_length(4)
                .max_frame_length(max_frame_length)
                .new_codec(),
        }
    }
}

impl Default for MessageCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for MessageCodec {
    type Item = Message;
    type Error = ProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Message>> {
        match self.inner.decode(src)? {
            Some(body) => Message::from_frame(&body).map(Some),
            None => Ok(None),
        }
    }
}

impl Encoder<Message> for MessageCodec {
    type Error = ProtocolError;

    fn encode(&mut self, item: Message, dst: &mut BytesMut) -> Result<()> {
        let body = item.to_frame()?;
        self.inner.encode(Bytes::from(body), dst)?;
        Ok(())
    }
}

/// A framed, message-oriented connection.
///
/// Generic over the transport so the same framing is used for TCP sockets and
/// for in-memory pipes in tests.
#[derive(Debug)]
pub struct Connection<T = TcpStream> {
    framed: Framed<T, MessageCodec>,
    peer: Option<SocketAddr>,
}

impl Connection<TcpStream> {
    /// Wrap an accepted or connected TCP stream.
    pub fn new(stream: TcpStream) -> Self {
        Self::with_max_frame_length(stream, DEFAULT_MAX_FRAME_LENGTH)
    }

    pub fn with_max_frame_length(stream: TcpStream, max_frame_length: usize) -> Self {
        let peer = stream.peer_addr().ok();
        if let Err(e) = stream.set_nodelay(true) {
            trace!("set_nodelay failed: {}", e);
        }
        Self {
            framed: Framed::new(stream, MessageCodec::with_max_frame_length(max_frame_length)),
            peer,
        }
    }

    /// Open a TCP connection to `addr`.
    pub async fn connect<A: ToSocketAddrs>(addr: A) -> Result<Self> {
        let stream = TcpStream::connect(addr).await?;
        Ok(Self::new(stream))
    }
}

impl<T> Connection<T>
where
    T: AsyncRead + AsyncWrite + Unpin,
{
    /// Wrap an arbitrary byte stream.
    pub fn from_stream(stream: T) -> Self {
        Self {
            framed: Framed::new(stream, MessageCodec::new()),
            peer: None,
        }
    }

    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.peer
    }

    /// Write one message and flush it.
    pub async fn send<M: Into<Message>>(&mut self, message: M) -> Result<()> {
        let message = message.into();
        trace!(kind = message.kind(), "sending frame");
        self.framed.send(message).await
    }

    /// Read the next message. `Ok(None)` means the peer closed cleanly.
    pub async fn recv(&mut self) -> Result<Option<Message>> {
        self.framed.next().await.transpose()
    }
}
