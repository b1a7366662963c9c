//! # Error Types
//!
//! Error handling for the one-time-pad services and their command-line programs.
//!
//! Every failure the crate can report is a variant of [`ProtocolError`]. The
//! variants fall into a small taxonomy ([`ErrorCategory`]) that decides how a
//! program exits:
//!
//! - **Usage**: bad command-line arguments
//! - **Validation**: missing input files, symbols outside the alphabet, a key
//!   shorter than the message. Always raised before any network I/O.
//! - **Network**: socket create/bind/connect/accept failures, a peer closing
//!   the connection mid-exchange, an expired I/O timeout
//! - **Protocol**: identity rejection and acknowledgement mismatches
//! - **Config**: unreadable or invalid configuration
//!
//! ## Example Usage
//! ```rust
//! use otp_protocol::error::{ErrorCategory, ProtocolError};
//!
//! let err = ProtocolError::KeyTooShort { key_len: 3, required: 11 };
//! assert_eq!(err.category(), ErrorCategory::Validation);
//! assert_eq!(err.exit_code(), 1);
//! ```

use crate::protocol::exchange::ProtocolStep;
use crate::protocol::role::ServiceRole;
use std::io;
use thiserror::Error;

/// Error message constants to reduce allocations in error paths.
pub mod constants {
    /// Connection errors
    pub const ERR_CONNECTION_CLOSED: &str = "Connection closed by peer";
    pub const ERR_TIMEOUT: &str = "Operation timed out";

    /// Input errors
    pub const ERR_EMPTY_MESSAGE: &str = "Message must contain at least one symbol";

    /// Configuration errors
    pub const ERR_CONFIG_OPEN: &str = "Failed to open config file";
    pub const ERR_CONFIG_PARSE: &str = "Failed to parse TOML";

    /// Listener errors
    pub const ERR_WORKER_PANICKED: &str = "Worker task panicked";
}

/// Coarse classification of an error, used to pick a process exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Usage,
    Validation,
    Network,
    Protocol,
    Config,
}

// ProtocolError is the primary error type for all operations
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("Usage: {0}")]
    Usage(String),

    #[error("Invalid file: '{path}' not found")]
    InputNotFound { path: String },

    #[error("'{source_name}' contains invalid character {symbol:?} at position {position}")]
    InvalidSymbol {
        source_name: String,
        symbol: char,
        position: usize,
    },

    #[error("Key is too short: {key_len} symbols for a {required}-symbol message")]
    KeyTooShort { key_len: usize, required: usize },

    #[error("Invalid message length: {0}")]
    InvalidLength(usize),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Could not bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("Could not contact server at {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("{}", constants::ERR_CONNECTION_CLOSED)]
    ConnectionClosed,

    #[error("{}", constants::ERR_TIMEOUT)]
    Timeout,

    #[error("{role} client cannot use the server on port {port}: identity denied")]
    IdentityDenied { role: ServiceRole, port: u16 },

    #[error("Unexpected reply during {step} on port {port}: expected {expected:?}, received {received:?}")]
    UnexpectedAck {
        step: ProtocolStep,
        expected: String,
        received: String,
        port: u16,
    },

    #[error("Unexpected message: {0:?}")]
    UnexpectedMessage(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl ProtocolError {
    /// Classify this error.
    pub fn category(&self) -> ErrorCategory {
        match self {
            ProtocolError::Usage(_) => ErrorCategory::Usage,
            ProtocolError::InputNotFound { .. }
            | ProtocolError::InvalidSymbol { .. }
            | ProtocolError::KeyTooShort { .. }
            | ProtocolError::InvalidLength(_) => ErrorCategory::Validation,
            ProtocolError::Io(_)
            | ProtocolError::Bind { .. }
            | ProtocolError::Connect { .. }
            | ProtocolError::ConnectionClosed
            | ProtocolError::Timeout => ErrorCategory::Network,
            ProtocolError::IdentityDenied { .. }
            | ProtocolError::UnexpectedAck { .. }
            | ProtocolError::UnexpectedMessage(_) => ErrorCategory::Protocol,
            ProtocolError::ConfigError(_) => ErrorCategory::Config,
        }
    }

    /// Process exit code for a requester that failed with this error.
    ///
    /// Usage, validation and configuration problems exit with 1; anything that
    /// went wrong on the network or in the exchange exits with 2.
    pub fn exit_code(&self) -> i32 {
        match self.category() {
            ErrorCategory::Usage | ErrorCategory::Validation | ErrorCategory::Config => 1,
            ErrorCategory::Network | ErrorCategory::Protocol => 2,
        }
    }
}

/// Type alias for Results using ProtocolError
pub type Result<T> = std::result::Result<T, ProtocolError>;
