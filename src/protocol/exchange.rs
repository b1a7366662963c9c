//! The full request/response sequence, for both roles.
//!
//! ```text
//! client                                   service
//!   | -- "enc_server" / "dec_server" ------> |  IdentityCheck
//!   | <------------- "confirmed" / "denied" - |
//!   | -- "<N>" ----------------------------> |  LengthNegotiation
//!   | <------------------------- "continue" - |
//!   | -- primary payload (line chunks) ----> |  PrimaryTransfer
//!   | <--- "Plaintext/Ciphertext Received" -- |  PrimaryAck
//!   | -- first N key symbols --------------> |  SecondaryTransfer
//!   | <--------------------- "Key Received" - |  SecondaryAck
//!   | -- "Waiting for ciphertext.." -------> |  ReadyBarrier
//!   | <------------- N result bytes (raw) --- |  ResultTransfer
//! ```

use crate::core::cipher;
use crate::error::{ProtocolError, Result};
use crate::protocol::handshake::{
    client_identify, client_negotiate_length, expect_reply, server_identity_check,
    server_negotiate_length, IdentityCheck,
};
use crate::protocol::message::Message;
use crate::protocol::role::ServiceRole;
use crate::protocol::transfer::{receive_payload, send_payload};
use crate::transport::Connection;
use std::fmt;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, instrument};

/// Position of a connection in the exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ProtocolStep {
    Connected,
    IdentityCheck,
    LengthNegotiation,
    PrimaryTransfer,
    PrimaryAck,
    SecondaryTransfer,
    SecondaryAck,
    ReadyBarrier,
    ResultTransfer,
    Closed,
}

impl fmt::Display for ProtocolStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProtocolStep::Connected => "connected",
            ProtocolStep::IdentityCheck => "identity check",
            ProtocolStep::LengthNegotiation => "length negotiation",
            ProtocolStep::PrimaryTransfer => "primary transfer",
            ProtocolStep::PrimaryAck => "primary acknowledgement",
            ProtocolStep::SecondaryTransfer => "key transfer",
            ProtocolStep::SecondaryAck => "key acknowledgement",
            ProtocolStep::ReadyBarrier => "ready barrier",
            ProtocolStep::ResultTransfer => "result transfer",
            ProtocolStep::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// How a service-side exchange ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExchangeOutcome {
    /// The result was sent back; `symbols` is the negotiated length
    Completed { symbols: usize },
    /// The client asked for another role and was denied
    Rejected { offered: String },
}

/// Run the service role of the exchange to completion.
///
/// `capacity` is the nominal message capacity. It is advisory: the announced
/// length is honoured even when it exceeds it.
#[instrument(skip(conn), fields(port = conn.port()))]
pub async fn serve_request<S>(
    conn: &mut Connection<S>,
    role: ServiceRole,
    capacity: usize,
) -> Result<ExchangeOutcome>
where
    S: AsyncRead + AsyncWrite,
{
    if let IdentityCheck::Denied { offered } = server_identity_check(conn, role).await? {
        close(conn).await;
        return Ok(ExchangeOutcome::Rejected { offered });
    }

    let length = server_negotiate_length(conn, capacity).await?;

    conn.advance(ProtocolStep::PrimaryTransfer);
    let primary = receive_payload(conn, length, capacity).await?;
    conn.advance(ProtocolStep::PrimaryAck);
    conn.send_message(Message::PayloadReceived(role.payload_kind()))
        .await?;

    conn.advance(ProtocolStep::SecondaryTransfer);
    let key = receive_payload(conn, length, capacity).await?;
    conn.advance(ProtocolStep::SecondaryAck);
    conn.send_message(Message::KeyReceived).await?;

    // Barrier: content is irrelevant
    conn.advance(ProtocolStep::ReadyBarrier);
    let _ = conn.recv_chunk().await?;

    conn.advance(ProtocolStep::ResultTransfer);
    let output = cipher::transform(role.cipher_op(), &primary, &key)?;
    let written = conn.write_stream(&output).await?;
    debug!(symbols = written, op = %role.cipher_op(), "Result sent");

    close(conn).await;
    Ok(ExchangeOutcome::Completed { symbols: length })
}

/// Run the client role of the exchange and return the service's result.
///
/// The length announced is `primary.len()`; only that many key symbols are
/// transmitted.
///
/// # Errors
/// [`ProtocolError::KeyTooShort`] before any I/O if the key is shorter than
/// the primary payload; protocol errors on any unexpected reply.
#[instrument(skip(conn, primary, key), fields(port = conn.port(), length = primary.len()))]
pub async fn request<S>(
    conn: &mut Connection<S>,
    role: ServiceRole,
    primary: &[u8],
    key: &[u8],
) -> Result<Vec<u8>>
where
    S: AsyncRead + AsyncWrite,
{
    let length = primary.len();
    if key.len() < length {
        return Err(ProtocolError::KeyTooShort {
            key_len: key.len(),
            required: length,
        });
    }

    client_identify(conn, role).await?;
    client_negotiate_length(conn, length).await?;

    conn.advance(ProtocolStep::PrimaryTransfer);
    send_payload(conn, primary, length).await?;
    conn.advance(ProtocolStep::PrimaryAck);
    expect_reply(conn, Message::PayloadReceived(role.payload_kind())).await?;

    conn.advance(ProtocolStep::SecondaryTransfer);
    send_payload(conn, &key[..length], length).await?;
    conn.advance(ProtocolStep::SecondaryAck);
    expect_reply(conn, Message::KeyReceived).await?;

    conn.advance(ProtocolStep::ReadyBarrier);
    conn.send_message(Message::Ready).await?;

    conn.advance(ProtocolStep::ResultTransfer);
    let output = receive_payload(conn, length, length).await?;

    close(conn).await;
    Ok(output)
}

/// Best-effort close once the exchange is over; the peer may already be gone.
async fn close<S>(conn: &mut Connection<S>)
where
    S: AsyncRead + AsyncWrite,
{
    if let Err(e) = conn.shutdown().await {
        debug!(error = %e, "Shutdown after exchange failed");
    }
}
