use std::time::Duration;

use tokio::net::TcpStream;
use tracing::{debug, instrument};

use crate::config::ServiceConfig;
use crate::error::{constants, ProtocolError, Result};
use crate::protocol::exchange;
use crate::protocol::role::ServiceRole;
use crate::transport::Connection;
use crate::utils::metrics::Timer;

/// Client for one of the services.
///
/// A requester is cheap to build and holds no connection; every call to
/// [`ClientRequester::request`] opens its own.
#[derive(Debug, Clone)]
pub struct ClientRequester {
    role: ServiceRole,
    host: String,
    port: u16,
    transmission_unit: usize,
    capacity: usize,
    connect_timeout: Duration,
    io_timeout: Option<Duration>,
}

impl ClientRequester {
    /// Requester for the `role` service listening on `port`
    pub fn new(role: ServiceRole, port: u16, config: &ServiceConfig) -> Self {
        Self {
            role,
            host: config.client.host.clone(),
            port,
            transmission_unit: config.transport.transmission_unit,
            capacity: config.transport.max_message_size,
            connect_timeout: config.client.connect_timeout,
            io_timeout: config.client.io_timeout(),
        }
    }

    /// Role this requester asks for
    pub fn role(&self) -> ServiceRole {
        self.role
    }

    /// Address this requester connects to
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Send `primary` and `key` to the service and return its result.
    ///
    /// Both buffers must already be alphabet-validated. The message length
    /// is checked against the configured capacity and the key length before
    /// any connection is made.
    ///
    /// # Errors
    /// Validation errors for an empty, oversized or under-keyed message;
    /// [`ProtocolError::Connect`] if the service cannot be reached; protocol
    /// errors if the service replies out of turn.
    #[instrument(skip(self, primary, key), fields(role = %self.role, address = %self.address(), length = primary.len()))]
    pub async fn request(&self, primary: &[u8], key: &[u8]) -> Result<Vec<u8>> {
        if primary.is_empty() {
            debug!("{}", constants::ERR_EMPTY_MESSAGE);
            return Err(ProtocolError::InvalidLength(0));
        }
        if primary.len() > self.capacity {
            return Err(ProtocolError::InvalidLength(primary.len()));
        }
        if key.len() < primary.len() {
            return Err(ProtocolError::KeyTooShort {
                key_len: key.len(),
                required: primary.len(),
            });
        }

        let _timer = Timer::start("request");
        let stream = self.connect().await?;
        let mut conn = Connection::new(stream, self.transmission_unit, self.port)
            .with_io_timeout(self.io_timeout);

        exchange::request(&mut conn, self.role, primary, key).await
    }

    async fn connect(&self) -> Result<TcpStream> {
        let addr = self.address();
        let connect_error = |source: std::io::Error| ProtocolError::Connect {
            addr: addr.clone(),
            source,
        };

        let stream = tokio::time::timeout(self.connect_timeout, TcpStream::connect(&addr))
            .await
            .map_err(|_| {
                connect_error(std::io::Error::new(
                    std::io::ErrorKind::TimedOut,
                    constants::ERR_TIMEOUT,
                ))
            })?
            .map_err(connect_error)?;

        debug!(address = %addr, "Connected");
        Ok(stream)
    }
}
