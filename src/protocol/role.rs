//! Service roles and the payload each one consumes.

use crate::core::cipher::CipherOp;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which service a listener provides or a requester expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceRole {
    Encryption,
    Decryption,
}

/// The kind of primary payload a role receives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PayloadKind {
    Plaintext,
    Ciphertext,
}

impl ServiceRole {
    /// Identity tag a client sends to select this role.
    pub const fn tag(self) -> &'static str {
        match self {
            ServiceRole::Encryption => "enc_server",
            ServiceRole::Decryption => "dec_server",
        }
    }

    /// Role named by an identity tag, if the tag is known.
    pub fn from_tag(tag: &[u8]) -> Option<Self> {
        match tag {
            b"enc_server" => Some(ServiceRole::Encryption),
            b"dec_server" => Some(ServiceRole::Decryption),
            _ => None,
        }
    }

    /// Primary payload this role receives.
    pub const fn payload_kind(self) -> PayloadKind {
        match self {
            ServiceRole::Encryption => PayloadKind::Plaintext,
            ServiceRole::Decryption => PayloadKind::Ciphertext,
        }
    }

    /// Cipher direction this role applies.
    pub const fn cipher_op(self) -> CipherOp {
        match self {
            ServiceRole::Encryption => CipherOp::Encrypt,
            ServiceRole::Decryption => CipherOp::Decrypt,
        }
    }

    /// Short program-name prefix ("enc" / "dec").
    pub const fn short_name(self) -> &'static str {
        match self {
            ServiceRole::Encryption => "enc",
            ServiceRole::Decryption => "dec",
        }
    }
}

impl fmt::Display for ServiceRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

impl PayloadKind {
    /// Acknowledgement literal sent once this payload has been received.
    pub const fn ack_literal(self) -> &'static str {
        match self {
            PayloadKind::Plaintext => "Plaintext Received",
            PayloadKind::Ciphertext => "Ciphertext Received",
        }
    }
}

impl fmt::Display for PayloadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PayloadKind::Plaintext => f.write_str("plaintext"),
            PayloadKind::Ciphertext => f.write_str("ciphertext"),
        }
    }
}
