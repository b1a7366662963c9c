use bytes::BytesMut;
use tokio_util::codec::Decoder;

use crate::error::{ProtocolError, Result};

/// Fixed capacity of a transmission unit in bytes.
pub const TRANSMISSION_UNIT: usize = 1024;

/// Decoder that hands out whatever bytes have arrived, at most one
/// transmission unit minus one byte at a time.
///
/// The protocol carries no framing, so a decoded item is just the next run of
/// bytes from the stream. Message boundaries come from the lock-step order of
/// the exchange, never from the codec.
#[derive(Debug, Clone, Copy)]
pub struct TransmissionCodec {
    chunk_limit: usize,
}

impl TransmissionCodec {
    /// Codec for a given transmission unit size. One byte of every unit is
    /// kept free, matching peers that terminate their receive buffer.
    pub fn new(transmission_unit: usize) -> Self {
        Self {
            chunk_limit: transmission_unit.saturating_sub(1).max(1),
        }
    }

    /// Largest number of bytes moved by a single read or write.
    pub fn chunk_limit(&self) -> usize {
        self.chunk_limit
    }
}

impl Default for TransmissionCodec {
    fn default() -> Self {
        Self::new(TRANSMISSION_UNIT)
    }
}

impl Decoder for TransmissionCodec {
    type Item = BytesMut;
    type Error = ProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        if src.is_empty() {
            return Ok(None);
        }

        let take = src.len().min(self.chunk_limit);
        Ok(Some(src.split_to(take)))
    }
}
