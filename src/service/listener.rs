use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::net::{TcpListener, TcpSocket, TcpStream};
use tokio::sync::{mpsc, watch};
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, error, info, instrument, warn, Instrument};

use crate::config::{AdmissionPolicy, ServiceConfig};
use crate::error::{constants, ProtocolError, Result};
use crate::protocol::exchange::{serve_request, ExchangeOutcome};
use crate::protocol::role::ServiceRole;
use crate::transport::Connection;
use crate::utils::metrics::{MetricsSnapshot, ServiceMetrics};

/// Everything a worker needs, copied into each task so workers share nothing.
#[derive(Debug, Clone, Copy)]
struct WorkerSettings {
    role: ServiceRole,
    port: u16,
    transmission_unit: usize,
    capacity: usize,
    io_timeout: Option<Duration>,
}

/// What a worker hands back to the control loop when it is reaped
#[derive(Debug)]
struct WorkerReport {
    peer: SocketAddr,
    outcome: Result<ExchangeOutcome>,
    elapsed: Duration,
}

/// A TCP listener serving one role of the protocol.
///
/// Each accepted connection runs in its own task. The number of running
/// workers is tracked by the control loop alone and compared against the
/// admission ceiling before every accept; connections that arrive while the
/// ceiling is reached wait in the OS backlog.
pub struct ServiceListener {
    listener: TcpListener,
    role: ServiceRole,
    local_addr: SocketAddr,
    max_connections: usize,
    admission_policy: AdmissionPolicy,
    shutdown_timeout: Duration,
    settings: WorkerSettings,
    metrics: Arc<ServiceMetrics>,
    admission_tx: watch::Sender<usize>,
}

impl ServiceListener {
    /// Bind `port` on the configured interface and start listening.
    ///
    /// # Errors
    /// [`ProtocolError::Bind`] if the socket cannot be created, bound or put
    /// into listening state.
    #[instrument(skip(config))]
    pub fn bind(role: ServiceRole, port: u16, config: &ServiceConfig) -> Result<Self> {
        let addr_text = format!("{}:{}", config.server.bind_address, port);
        let bind_error = |source: std::io::Error| ProtocolError::Bind {
            addr: addr_text.clone(),
            source,
        };

        let addr: SocketAddr = addr_text.parse().map_err(|_| {
            ProtocolError::ConfigError(format!("Invalid bind address: {addr_text}"))
        })?;

        let socket = if addr.is_ipv4() {
            TcpSocket::new_v4()
        } else {
            TcpSocket::new_v6()
        }
        .map_err(bind_error)?;

        #[cfg(unix)]
        socket.set_reuseaddr(true).map_err(bind_error)?;

        socket.bind(addr).map_err(bind_error)?;
        let listener = socket.listen(config.server.backlog).map_err(bind_error)?;
        let local_addr = listener.local_addr().map_err(bind_error)?;

        info!(
            role = %role,
            address = %local_addr,
            ceiling = config
                .server
                .admission_policy
                .effective_ceiling(config.server.max_connections),
            "Listening"
        );

        let (admission_tx, _) = watch::channel(0);

        Ok(Self {
            listener,
            role,
            local_addr,
            max_connections: config.server.max_connections,
            admission_policy: config.server.admission_policy,
            shutdown_timeout: config.server.shutdown_timeout,
            settings: WorkerSettings {
                role,
                port: local_addr.port(),
                transmission_unit: config.transport.transmission_unit,
                capacity: config.transport.max_message_size,
                io_timeout: config.server.io_timeout(),
            },
            metrics: Arc::new(ServiceMetrics::new()),
            admission_tx,
        })
    }

    /// Address the listener is bound to
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Role this listener serves
    pub fn role(&self) -> ServiceRole {
        self.role
    }

    /// Watch the number of active workers as the control loop updates it
    pub fn admission(&self) -> watch::Receiver<usize> {
        self.admission_tx.subscribe()
    }

    /// Shared handle to the listener's counters
    pub fn metrics(&self) -> Arc<ServiceMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Current metrics
    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Serve until Ctrl-C.
    pub async fn run(self) -> Result<()> {
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>(1);

        tokio::spawn(async move {
            if let Ok(()) = tokio::signal::ctrl_c().await {
                info!("Received CTRL+C signal, shutting down");
                let _ = shutdown_tx.send(()).await;
            }
        });

        self.run_with_shutdown(shutdown_rx).await
    }

    /// Serve until a message arrives on `shutdown_rx` or every sender is dropped.
    #[instrument(skip(self, shutdown_rx), fields(role = %self.role, address = %self.local_addr))]
    pub async fn run_with_shutdown(self, mut shutdown_rx: mpsc::Receiver<()>) -> Result<()> {
        let mut workers: JoinSet<WorkerReport> = JoinSet::new();
        let mut active: usize = 0;

        loop {
            let admitting = self.admission_policy.admits(active, self.max_connections);

            tokio::select! {
                biased;

                _ = shutdown_rx.recv() => {
                    info!(active, "Shutting down listener");
                    break;
                }

                // Reap finished workers before considering new work
                Some(joined) = workers.join_next(), if !workers.is_empty() => {
                    active = active.saturating_sub(1);
                    self.admission_tx.send_replace(active);
                    self.record(joined);
                }

                accepted = self.listener.accept(), if admitting => {
                    match accepted {
                        Ok((stream, peer)) => {
                            self.dispatch(&mut workers, stream, peer);
                            active += 1;
                            self.admission_tx.send_replace(active);
                            self.metrics.connection_accepted(active);
                            debug!(peer = %peer, active, "Connection admitted");
                        }
                        Err(e) => {
                            error!(error = %e, "Error accepting connection");
                        }
                    }
                }
            }
        }

        self.drain(workers).await;
        self.metrics.log_summary();
        Ok(())
    }

    fn dispatch(&self, workers: &mut JoinSet<WorkerReport>, stream: TcpStream, peer: SocketAddr) {
        let settings = self.settings;
        let span = tracing::info_span!("worker", peer = %peer, role = %settings.role);

        workers.spawn(
            async move {
                let started = Instant::now();
                let mut conn = Connection::new(stream, settings.transmission_unit, settings.port)
                    .with_io_timeout(settings.io_timeout);
                let outcome = serve_request(&mut conn, settings.role, settings.capacity).await;

                WorkerReport {
                    peer,
                    outcome,
                    elapsed: started.elapsed(),
                }
            }
            .instrument(span),
        );
    }

    fn record(&self, joined: std::result::Result<WorkerReport, JoinError>) {
        match joined {
            Ok(WorkerReport {
                peer,
                outcome,
                elapsed,
            }) => match outcome {
                Ok(ExchangeOutcome::Completed { symbols }) => {
                    self.metrics.request_completed(symbols);
                    info!(
                        peer = %peer,
                        symbols,
                        elapsed_ms = elapsed.as_millis() as u64,
                        "Request completed"
                    );
                }
                Ok(ExchangeOutcome::Rejected { offered }) => {
                    self.metrics.identity_rejected();
                    warn!(peer = %peer, offered = %offered, expected = self.role.tag(), "Client denied");
                }
                Err(e) => {
                    self.metrics.request_failed();
                    error!(peer = %peer, error = %e, "Request failed");
                }
            },
            Err(e) => {
                self.metrics.worker_panicked();
                error!(error = %e, "{}", constants::ERR_WORKER_PANICKED);
            }
        }
    }

    /// Wait for in-flight workers, up to the shutdown timeout, then abort the rest.
    async fn drain(&self, mut workers: JoinSet<WorkerReport>) {
        if workers.is_empty() {
            return;
        }

        let deadline = tokio::time::sleep(self.shutdown_timeout);
        tokio::pin!(deadline);

        loop {
            tokio::select! {
                _ = &mut deadline => {
                    warn!(remaining = workers.len(), "Shutdown timeout reached, aborting workers");
                    workers.abort_all();
                    break;
                }
                joined = workers.join_next() => match joined {
                    Some(joined) => {
                        self.admission_tx.send_replace(workers.len());
                        self.record(joined);
                    }
                    None => break,
                },
            }
        }

        self.admission_tx.send_replace(0);
    }
}
