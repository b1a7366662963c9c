//! # Protocol
//!
//! The message vocabulary and step sequence shared by the services and their
//! clients.
//!
//! ## Components
//! - **Role**: encryption or decryption, and everything that depends on it
//! - **Message**: typed control messages and their wire literals
//! - **Handshake**: identity check and length negotiation
//! - **Transfer**: chunked payload and result transfer
//! - **Exchange**: the complete service and client sequences

pub mod exchange;
pub mod handshake;
pub mod message;
pub mod role;
pub mod transfer;
