//! Chunked payload transfer.
//!
//! Text payloads go out as newline-stripped line chunks; the receiver knows
//! only the negotiated length and keeps reading until it has at least that
//! many bytes. The result goes back as raw chunks with no line handling.

use crate::error::{ProtocolError, Result};
use crate::transport::Connection;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, trace};

/// Split `data` into lines without their `\n`, then cut each line into
/// pieces of at most `limit` bytes. Empty lines produce nothing.
pub fn line_chunks(data: &[u8], limit: usize) -> impl Iterator<Item = &[u8]> {
    let limit = limit.max(1);
    data.split(|&b| b == b'\n')
        .flat_map(move |line| line.chunks(limit))
}

/// Send line chunks of `data` until at least `target` bytes are out.
///
/// # Errors
/// [`ProtocolError::InvalidLength`] if `data` runs out of symbols before
/// `target` is reached.
pub async fn send_payload<S>(conn: &mut Connection<S>, data: &[u8], target: usize) -> Result<usize>
where
    S: AsyncRead + AsyncWrite,
{
    let limit = conn.chunk_limit();
    let mut sent = 0;

    for chunk in line_chunks(data, limit) {
        if sent >= target {
            break;
        }
        sent += conn.write_stream(chunk).await?;
        trace!(sent, target, "Payload chunk sent");
    }

    if sent < target {
        return Err(ProtocolError::InvalidLength(sent));
    }

    Ok(sent)
}

/// Accumulate received chunks until at least `target` bytes have arrived and
/// return the first `target` of them.
///
/// `capacity` only bounds the initial allocation.
pub async fn receive_payload<S>(
    conn: &mut Connection<S>,
    target: usize,
    capacity: usize,
) -> Result<Vec<u8>>
where
    S: AsyncRead + AsyncWrite,
{
    let mut buffer = Vec::with_capacity(target.min(capacity));

    while buffer.len() < target {
        let chunk = conn.recv_chunk().await?;
        trace!(
            bytes = chunk.len(),
            total = buffer.len() + chunk.len(),
            target,
            "Payload chunk received"
        );
        buffer.extend_from_slice(&chunk);
    }

    if buffer.len() > target {
        debug!(
            excess = buffer.len() - target,
            "Discarding bytes beyond the negotiated length"
        );
        buffer.truncate(target);
    }

    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_chunks_strip_newlines() {
        let chunks: Vec<&[u8]> = line_chunks(b"HELLO\nWORLD\n", 1023).collect();
        assert_eq!(chunks, vec![&b"HELLO"[..], &b"WORLD"[..]]);
    }

    #[test]
    fn test_line_chunks_split_long_lines() {
        let data = vec![b'A'; 2050];
        let sizes: Vec<usize> = line_chunks(&data, 1023).map(<[u8]>::len).collect();
        assert_eq!(sizes, vec![1023, 1023, 4]);
    }

    #[test]
    fn test_line_chunks_of_empty_input() {
        assert_eq!(line_chunks(b"", 10).count(), 0);
        assert_eq!(line_chunks(b"\n\n", 10).count(), 0);
    }
}
