//! # Core Components
//!
//! The cipher and the byte-level plumbing the protocol is built on.
//!
//! ## Components
//! - **Alphabet**: the 27-symbol alphabet (`A`-`Z` plus space) and its index mapping
//! - **Cipher**: the one-time-pad transform over that alphabet
//! - **Codec**: Tokio codec that slices an unframed byte stream into transmission units
//!
//! ## Wire Format
//! There is no framing. Control messages are bare ASCII literals, payloads are
//! raw alphabet bytes, and each individual read or write moves at most one
//! transmission unit minus one byte:
//! ```text
//! [chunk <= 1023 bytes] [chunk <= 1023 bytes] ...
//! ```

pub mod alphabet;
pub mod cipher;
pub mod codec;
