use crate::error::{ProtocolError, Result};
use crate::protocol::role::{PayloadKind, ServiceRole};
use std::fmt;

/// Reply to a matching identity tag
pub const CONFIRMED: &str = "confirmed";
/// Reply to a mismatched identity tag
pub const DENIED: &str = "denied";
/// Reply to a length announcement
pub const CONTINUE: &str = "continue";
/// Reply once the key has been received
pub const KEY_RECEIVED: &str = "Key Received";
/// Barrier sent by the client before the result transfer
pub const READY: &str = "Waiting for ciphertext..";

/// Control messages exchanged between a requester and a service.
///
/// Messages travel as bare ASCII with no framing; see [`Message::encode`] for
/// the exact bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Message {
    /// Client names the service it expects
    Identify(ServiceRole),
    Confirmed,
    Denied,
    /// Client announces the payload length in symbols
    Length(usize),
    Continue,
    PayloadReceived(PayloadKind),
    KeyReceived,
    Ready,
}

impl Message {
    /// Wire bytes of this message.
    pub fn encode(&self) -> Vec<u8> {
        match self {
            Message::Identify(role) => role.tag().as_bytes().to_vec(),
            Message::Confirmed => CONFIRMED.as_bytes().to_vec(),
            Message::Denied => DENIED.as_bytes().to_vec(),
            Message::Length(n) => n.to_string().into_bytes(),
            Message::Continue => CONTINUE.as_bytes().to_vec(),
            Message::PayloadReceived(kind) => kind.ack_literal().as_bytes().to_vec(),
            Message::KeyReceived => KEY_RECEIVED.as_bytes().to_vec(),
            Message::Ready => READY.as_bytes().to_vec(),
        }
    }

    /// Recognise a message from the bytes of one read.
    ///
    /// Trailing NUL bytes, as sent by peers that transmit their C string
    /// terminator, are ignored.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let bytes = trim_nul(bytes);

        if let Some(role) = ServiceRole::from_tag(bytes) {
            return Ok(Message::Identify(role));
        }

        let message = match bytes {
            b"confirmed" => Message::Confirmed,
            b"denied" => Message::Denied,
            b"continue" => Message::Continue,
            b"Plaintext Received" => Message::PayloadReceived(PayloadKind::Plaintext),
            b"Ciphertext Received" => Message::PayloadReceived(PayloadKind::Ciphertext),
            b"Key Received" => Message::KeyReceived,
            b"Waiting for ciphertext.." => Message::Ready,
            digits if !digits.is_empty() && digits.iter().all(u8::is_ascii_digit) => {
                let text = String::from_utf8_lossy(digits);
                let n = text
                    .parse::<usize>()
                    .map_err(|_| ProtocolError::UnexpectedMessage(text.to_string()))?;
                Message::Length(n)
            }
            other => {
                return Err(ProtocolError::UnexpectedMessage(
                    String::from_utf8_lossy(other).into_owned(),
                ))
            }
        };

        Ok(message)
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.encode()))
    }
}

/// Interpret a length announcement the way C `atoi` does: optional leading
/// whitespace and sign, then as many digits as follow. Anything unparseable,
/// or negative, is 0. Values too large for `usize` saturate.
pub fn parse_length_lenient(bytes: &[u8]) -> usize {
    let bytes = trim_nul(bytes);
    let start = bytes
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(bytes.len());
    let mut rest = &bytes[start..];

    let negative = match rest.first() {
        Some(b'-') => {
            rest = &rest[1..];
            true
        }
        Some(b'+') => {
            rest = &rest[1..];
            false
        }
        _ => false,
    };

    let value = rest
        .iter()
        .take_while(|b| b.is_ascii_digit())
        .fold(0usize, |acc, &d| {
            acc.saturating_mul(10).saturating_add(usize::from(d - b'0'))
        });

    if negative {
        0
    } else {
        value
    }
}

fn trim_nul(bytes: &[u8]) -> &[u8] {
    let end = bytes
        .iter()
        .rposition(|&b| b != 0)
        .map_or(0, |last| last + 1);
    &bytes[..end]
}
