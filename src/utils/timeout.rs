//! Timeout helpers for socket I/O.
//!
//! Reads and writes block without limit unless a timeout is configured.

use crate::error::{ProtocolError, Result};
use std::future::Future;
use std::time::Duration;

/// Default timeout for establishing an outbound connection
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// How long a stopping listener waits for in-flight workers
pub const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

/// Await `fut`, failing with [`ProtocolError::Timeout`] if `limit` elapses
/// first. `None` waits forever.
pub async fn with_optional_timeout<F, T>(fut: F, limit: Option<Duration>) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match limit {
        Some(duration) => tokio::time::timeout(duration, fut)
            .await
            .map_err(|_| ProtocolError::Timeout)?,
        None => fut.await,
    }
}
