//! # Services
//!
//! The two network-facing halves of the system.
//!
//! - [`ServiceListener`] accepts connections and runs the service role of the
//!   exchange for each, under an admission ceiling.
//! - [`ClientRequester`] connects to a service and runs the client role.

pub mod client;
pub mod listener;

pub use client::ClientRequester;
pub use listener::ServiceListener;
