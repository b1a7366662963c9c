//! Identity check and length negotiation, the first two steps of every
//! exchange.
//!
//! The identity tag doubles as role selector: a client that reaches the wrong
//! service is told `denied` and must stop there. Length negotiation is
//! permissive on the service side; whatever the client announces is answered
//! with `continue`.

use crate::error::{ProtocolError, Result};
use crate::protocol::exchange::ProtocolStep;
use crate::protocol::message::{parse_length_lenient, Message};
use crate::protocol::role::ServiceRole;
use crate::transport::Connection;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, instrument, warn};

/// Result of the service-side identity check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityCheck {
    /// The tag matched this service's role
    Confirmed,
    /// The tag named another role or was not a tag at all
    Denied { offered: String },
}

/// Service side of step 1: read the client's tag and confirm or deny it.
#[instrument(skip(conn), fields(port = conn.port()))]
pub async fn server_identity_check<S>(
    conn: &mut Connection<S>,
    role: ServiceRole,
) -> Result<IdentityCheck>
where
    S: AsyncRead + AsyncWrite,
{
    conn.advance(ProtocolStep::IdentityCheck);
    let tag = conn.recv_chunk().await?;

    if matches!(Message::parse(&tag), Ok(Message::Identify(offered)) if offered == role) {
        conn.send_message(Message::Confirmed).await?;
        Ok(IdentityCheck::Confirmed)
    } else {
        let offered = String::from_utf8_lossy(&tag).into_owned();
        debug!(offered = %offered, "Identity tag rejected");
        conn.send_message(Message::Denied).await?;
        Ok(IdentityCheck::Denied { offered })
    }
}

/// Service side of step 2: read the announced length and always answer
/// `continue`.
///
/// The announced value is not checked against `capacity` or against the key
/// the client will send; out-of-range values are only logged.
#[instrument(skip(conn), fields(port = conn.port()))]
pub async fn server_negotiate_length<S>(conn: &mut Connection<S>, capacity: usize) -> Result<usize>
where
    S: AsyncRead + AsyncWrite,
{
    conn.advance(ProtocolStep::LengthNegotiation);
    let announced = conn.recv_chunk().await?;
    let length = parse_length_lenient(&announced);

    if length == 0 {
        warn!(
            announced = %String::from_utf8_lossy(&announced),
            "Client announced an empty or unparseable length"
        );
    } else if length > capacity {
        warn!(length, capacity, "Client announced a length above capacity");
    }

    conn.send_message(Message::Continue).await?;
    Ok(length)
}

/// Client side of step 1.
///
/// # Errors
/// [`ProtocolError::IdentityDenied`] when the service answers `denied`, and
/// [`ProtocolError::UnexpectedAck`] for any other reply than `confirmed`.
#[instrument(skip(conn), fields(port = conn.port()))]
pub async fn client_identify<S>(conn: &mut Connection<S>, role: ServiceRole) -> Result<()>
where
    S: AsyncRead + AsyncWrite,
{
    conn.advance(ProtocolStep::IdentityCheck);
    conn.send_message(Message::Identify(role)).await?;

    let reply = conn.recv_chunk().await?;
    match Message::parse(&reply) {
        Ok(Message::Confirmed) => Ok(()),
        Ok(Message::Denied) => Err(ProtocolError::IdentityDenied {
            role,
            port: conn.port(),
        }),
        _ => Err(unexpected_reply(conn, Message::Confirmed, &reply)),
    }
}

/// Client side of step 2.
#[instrument(skip(conn), fields(port = conn.port()))]
pub async fn client_negotiate_length<S>(conn: &mut Connection<S>, length: usize) -> Result<()>
where
    S: AsyncRead + AsyncWrite,
{
    conn.advance(ProtocolStep::LengthNegotiation);
    conn.send_message(Message::Length(length)).await?;
    expect_reply(conn, Message::Continue).await
}

/// Receive one control message and require it to be `expected`.
pub(crate) async fn expect_reply<S>(conn: &mut Connection<S>, expected: Message) -> Result<()>
where
    S: AsyncRead + AsyncWrite,
{
    let reply = conn.recv_chunk().await?;
    match Message::parse(&reply) {
        Ok(message) if message == expected => Ok(()),
        _ => Err(unexpected_reply(conn, expected, &reply)),
    }
}

fn unexpected_reply<S>(
    conn: &Connection<S>,
    expected: Message,
    received: &[u8],
) -> ProtocolError {
    ProtocolError::UnexpectedAck {
        step: conn.step(),
        expected: expected.to_string(),
        received: String::from_utf8_lossy(received).into_owned(),
        port: conn.port(),
    }
}
