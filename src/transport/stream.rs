//! Framed byte stream over any tokio reader/writer.
//!
//! `PacketStream` joins an external byte source to a [`StreamFramer`]: reads
//! arrive in chunks of arbitrary size, frames come out whole.
//!
//! # Example
//!
//! ```ignore
//! use packet_stream::protocol::{Strategy, StreamFramer};
//! use packet_stream::transport::PacketStream;
//!
//! let framer = StreamFramer::with_strategy(Strategy::delimiter(b"\r\n"));
//! let mut stream = PacketStream::connect("127.0.0.1:8080", framer).await?;
//! stream.send_bytes(b"GET / HTTP/1.1\r\nHost: localhost\r\n\r\n").await?;
//!
//! while let Some(line) = stream.next_frame().await? {
//!     println!("{:?}", line);
//! }
//! ```

use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::{TcpStream, ToSocketAddrs};

use crate::error::Result;
use crate::packet::Packet;
use crate::protocol::StreamFramer;

/// Size of each read from the underlying source (64KB).
pub const READ_CHUNK_SIZE: usize = 64 * 1024;

/// A byte stream with a framer on its read side.
#[derive(Debug)]
pub struct PacketStream<S> {
    io: S,
    framer: StreamFramer,
    read_buf: Vec<u8>,
}

impl<S> PacketStream<S> {
    /// Wrap `io`, framing its reads with `framer`.
    pub fn new(io: S, framer: StreamFramer) -> Self {
        Self {
            io,
            framer,
            read_buf: vec![0u8; READ_CHUNK_SIZE],
        }
    }

    /// The framer.
    pub fn framer(&self) -> &StreamFramer {
        &self.framer
    }

    /// Mutable access to the framer, e.g. to switch strategy mid-stream.
    pub fn framer_mut(&mut self) -> &mut StreamFramer {
        &mut self.framer
    }

    /// Get a reference to the underlying stream.
    pub fn get_ref(&self) -> &S {
        &self.io
    }

    /// Get a mutable reference to the underlying stream.
    pub fn get_mut(&mut self) -> &mut S {
        &mut self.io
    }

    /// Unwrap into the underlying stream and framer.
    pub fn into_inner(self) -> (S, StreamFramer) {
        (self.io, self.framer)
    }
}

impl PacketStream<TcpStream> {
    /// Open a TCP connection and frame it with `framer`.
    pub async fn connect<A: ToSocketAddrs>(addr: A, framer: StreamFramer) -> Result<Self> {
        let io = TcpStream::connect(addr).await?;
        tracing::debug!(peer = ?io.peer_addr().ok(), "connected");
        Ok(Self::new(io, framer))
    }
}

impl<S: AsyncRead + Unpin> PacketStream<S> {
    /// Read until the next complete frame.
    ///
    /// Returns `Ok(None)` at end of stream. A partial frame still buffered at
    /// that point is discarded.
    pub async fn next_frame(&mut self) -> Result<Option<Bytes>> {
        loop {
            if let Some(frame) = self.framer.try_extract_frame()? {
                return Ok(Some(frame));
            }

            let n = self.io.read(&mut self.read_buf).await?;
            if n == 0 {
                if !self.framer.is_empty() {
                    let partial = self.framer.take_remaining();
                    tracing::debug!(
                        discarded = partial.len(),
                        "stream closed with partial frame"
                    );
                }
                return Ok(None);
            }

            self.framer.feed(&self.read_buf[..n]);
        }
    }
}

impl<S: AsyncWrite + Unpin> PacketStream<S> {
    /// Write the whole packet and flush.
    pub async fn send(&mut self, packet: &Packet) -> Result<()> {
        self.send_bytes(packet.as_slice()).await
    }

    /// Write raw bytes and flush.
    pub async fn send_bytes(&mut self, data: &[u8]) -> Result<()> {
        self.io.write_all(data).await?;
        self.io.flush().await?;
        tracing::trace!(len = data.len(), "sent");
        Ok(())
    }

    /// Shut down the write side.
    pub async fn shutdown(&mut self) -> Result<()> {
        self.io.shutdown().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PacketError;
    use crate::protocol::{LengthWidth, Strategy};
    use tokio::io::duplex;

    #[tokio::test]
    async fn test_next_frame_across_chunks() {
        let (client, mut server) = duplex(64);
        let framer = StreamFramer::with_strategy(Strategy::delimiter(b"\r\n"));
        let mut stream = PacketStream::new(client, framer);

        tokio::spawn(async move {
            server.write_all(b"HTTP/1.1 200 OK\r").await.unwrap();
            server.write_all(b"\nContent-Length: 0\r\n\r\n").await.unwrap();
        });

        assert_eq!(
            &stream.next_frame().await.unwrap().unwrap()[..],
            b"HTTP/1.1 200 OK\r\n"
        );
        assert_eq!(
            &stream.next_frame().await.unwrap().unwrap()[..],
            b"Content-Length: 0\r\n"
        );
        assert_eq!(&stream.next_frame().await.unwrap().unwrap()[..], b"\r\n");
        assert!(stream.next_frame().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_eof_discards_partial_frame() {
        let (client, mut server) = duplex(64);
        let framer = StreamFramer::with_strategy(Strategy::fixed_length(4));
        let mut stream = PacketStream::new(client, framer);

        server.write_all(b"abcdef").await.unwrap();
        drop(server);

        assert_eq!(&stream.next_frame().await.unwrap().unwrap()[..], b"abcd");
        assert!(stream.next_frame().await.unwrap().is_none());
        assert!(stream.framer().is_empty());
    }

    #[tokio::test]
    async fn test_send_packet_round_trip() {
        let (client, server) = duplex(256);
        let mut sender = PacketStream::new(client, StreamFramer::new());
        let framer = StreamFramer::with_strategy(Strategy::length_prefixed(LengthWidth::U32));
        let mut receiver = PacketStream::new(server, framer);

        let mut packet = Packet::new();
        packet.put_uint32(5);
        packet.fill("hello").unwrap();
        sender.send(&packet).await.unwrap();

        let mut frame = Packet::from(receiver.next_frame().await.unwrap().unwrap());
        assert_eq!(frame.shift_uint32().unwrap(), 5);
        assert_eq!(frame.as_slice(), b"hello");
    }

    #[tokio::test]
    async fn test_missing_strategy_surfaces_error() {
        let (client, _server) = duplex(16);
        let mut stream = PacketStream::new(client, StreamFramer::new());
        let err = stream.next_frame().await.unwrap_err();
        assert!(matches!(err, PacketError::StrategyMisconfigured(_)));
    }

    #[tokio::test]
    async fn test_switch_strategy_mid_stream() {
        let (client, mut server) = duplex(64);
        let framer = StreamFramer::with_strategy(Strategy::delimiter(b"\n"));
        let mut stream = PacketStream::new(client, framer);

        server.write_all(b"LEN\n\x00\x03abc").await.unwrap();
        drop(server);

        assert_eq!(&stream.next_frame().await.unwrap().unwrap()[..], b"LEN\n");
        stream
            .framer_mut()
            .set_strategy(Strategy::length_prefixed(LengthWidth::U16));
        assert_eq!(
            &stream.next_frame().await.unwrap().unwrap()[..],
            b"\x00\x03abc"
        );
    }

    #[tokio::test]
    async fn test_tcp_connect_and_frame() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = vec![0u8; 18];
            socket.read_exact(&mut request).await.unwrap();
            assert_eq!(&request[..], b"GET / HTTP/1.1\r\n\r\n");
            socket.write_all(b"pong\r\n").await.unwrap();
        });

        let framer = StreamFramer::with_strategy(Strategy::delimiter(b"\r\n"));
        let mut stream = PacketStream::connect(addr, framer).await.unwrap();
        stream
            .send(&Packet::from_text("GET / HTTP/1.1\r\n\r\n"))
            .await
            .unwrap();

        assert_eq!(&stream.next_frame().await.unwrap().unwrap()[..], b"pong\r\n");
        assert!(stream.next_frame().await.unwrap().is_none());
    }
}
