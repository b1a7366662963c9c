use bytes::BytesMut;
use futures::StreamExt;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, ReadHalf, WriteHalf};
use tokio_util::codec::FramedRead;
use tracing::{debug, warn};

use crate::core::codec::TransmissionCodec;
use crate::error::{ProtocolError, Result};
use crate::protocol::exchange::ProtocolStep;
use crate::protocol::message::Message;
use crate::utils::timeout::with_optional_timeout;

/// One protocol exchange over a byte stream.
///
/// Reads go through [`TransmissionCodec`], so each received item is at most
/// one transmission unit. Writes are single calls: a short write is logged and
/// the caller's accumulation loop sends the remainder.
pub struct Connection<S> {
    reader: FramedRead<ReadHalf<S>, TransmissionCodec>,
    writer: WriteHalf<S>,
    chunk_limit: usize,
    io_timeout: Option<Duration>,
    step: ProtocolStep,
    port: u16,
}

impl<S> Connection<S> {
    /// Current position in the exchange
    pub fn step(&self) -> ProtocolStep {
        self.step
    }

    /// Service port this connection talks to
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Largest number of bytes a single read or write moves
    pub fn chunk_limit(&self) -> usize {
        self.chunk_limit
    }

    /// Move the step cursor forward
    pub fn advance(&mut self, step: ProtocolStep) {
        debug!(from = %self.step, to = %step, "Protocol step");
        self.step = step;
    }
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite,
{
    /// Wrap `stream`. `port` is the service port, used for error context.
    pub fn new(stream: S, transmission_unit: usize, port: u16) -> Self {
        let codec = TransmissionCodec::new(transmission_unit);
        let (read_half, write_half) = tokio::io::split(stream);
        Self {
            reader: FramedRead::new(read_half, codec),
            writer: write_half,
            chunk_limit: codec.chunk_limit(),
            io_timeout: None,
            step: ProtocolStep::Connected,
            port,
        }
    }

    /// Apply a timeout to every subsequent read and write
    pub fn with_io_timeout(mut self, io_timeout: Option<Duration>) -> Self {
        self.io_timeout = io_timeout;
        self
    }

    /// Receive the next run of bytes from the peer.
    ///
    /// End of stream is reported as [`ProtocolError::ConnectionClosed`]
    /// rather than retried.
    pub async fn recv_chunk(&mut self) -> Result<BytesMut> {
        let reader = &mut self.reader;
        with_optional_timeout(
            async {
                match reader.next().await {
                    Some(chunk) => chunk,
                    None => Err(ProtocolError::ConnectionClosed),
                }
            },
            self.io_timeout,
        )
        .await
    }

    /// Write up to one chunk of `data` with a single write call and return
    /// how many bytes went out.
    pub async fn write_chunk(&mut self, data: &[u8]) -> Result<usize> {
        let len = data.len().min(self.chunk_limit);
        let writer = &mut self.writer;
        let written = with_optional_timeout(
            async {
                let written = writer.write(&data[..len]).await?;
                writer.flush().await?;
                Ok(written)
            },
            self.io_timeout,
        )
        .await?;

        if written == 0 && len > 0 {
            return Err(ProtocolError::ConnectionClosed);
        }
        if written < len {
            warn!(
                requested = len,
                written,
                step = %self.step,
                "Not all data written to socket"
            );
        }

        Ok(written)
    }

    /// Write all of `data`, one chunk per call, until every byte is out.
    pub async fn write_stream(&mut self, data: &[u8]) -> Result<usize> {
        let mut sent = 0;
        while sent < data.len() {
            sent += self.write_chunk(&data[sent..]).await?;
        }
        Ok(sent)
    }

    /// Send a control message
    pub async fn send_message(&mut self, message: Message) -> Result<()> {
        debug!(message = %message, step = %self.step, "Sending");
        self.write_chunk(&message.encode()).await?;
        Ok(())
    }

    /// Close the write side of the stream
    pub async fn shutdown(&mut self) -> Result<()> {
        self.writer.shutdown().await?;
        self.advance(ProtocolStep::Closed);
        Ok(())
    }
}
