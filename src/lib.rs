//! # OTP Protocol
//!
//! One-time-pad encryption and decryption services over a small lock-step
//! TCP protocol, with the matching requesters and a key generator.
//!
//! ## Modules
//! - [`core`]: the 27-symbol alphabet, the cipher and the transmission codec
//! - [`protocol`]: control messages, identity check, length negotiation and
//!   chunked transfer
//! - [`transport`]: a connection wrapper that enforces single-call reads and writes
//! - [`service`]: the concurrent listener and the client requester
//! - [`config`], [`error`], [`utils`]: configuration, error taxonomy, logging and metrics
//! - [`input`], [`keygen`], [`cli`]: what the command-line programs are built from
//!
//! ## Example
//! ```rust
//! use otp_protocol::core::cipher::{decrypt, encrypt};
//!
//! let cipher = encrypt(b"HELLO WORLD", b"XMCKLQWERTY").unwrap();
//! assert_eq!(decrypt(&cipher, b"XMCKLQWERTY").unwrap(), b"HELLO WORLD");
//! ```

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod input;
pub mod keygen;
pub mod protocol;
pub mod service;
pub mod transport;
pub mod utils;

pub use config::ServiceConfig;
pub use error::{ProtocolError, Result};
pub use protocol::role::ServiceRole;
pub use service::{ClientRequester, ServiceListener};
