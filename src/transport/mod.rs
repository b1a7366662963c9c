//! # Transport Layer
//!
//! Byte-stream plumbing for a single exchange. [`Connection`] is generic over
//! any `AsyncRead + AsyncWrite` stream; the services use `TcpStream`, tests
//! may use in-memory duplex pipes.

pub mod connection;

pub use connection::Connection;
