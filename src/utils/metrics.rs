//! Observability and Metrics
//!
//! Counters describing what a listener has done since it started.
//!
//! Only the listener's control loop records into a [`ServiceMetrics`]; workers
//! report their outcome when they are reaped and never touch the counters
//! themselves. Observers read through [`ServiceMetrics::snapshot`].

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::{debug, info};

/// Metrics collector for one listener
#[derive(Debug)]
pub struct ServiceMetrics {
    /// Connections accepted and dispatched to a worker
    pub connections_accepted: AtomicU64,
    /// Requests that ran to the end of the exchange
    pub requests_completed: AtomicU64,
    /// Requests that ended with an error
    pub requests_failed: AtomicU64,
    /// Clients turned away at the identity check
    pub identity_rejections: AtomicU64,
    /// Workers that panicked
    pub worker_panics: AtomicU64,
    /// Symbols run through the cipher
    pub symbols_transformed: AtomicU64,
    /// Highest number of simultaneously active workers
    pub peak_active_workers: AtomicU64,
    start_time: Instant,
}

impl ServiceMetrics {
    /// Create a new metrics collector
    pub fn new() -> Self {
        Self {
            connections_accepted: AtomicU64::new(0),
            requests_completed: AtomicU64::new(0),
            requests_failed: AtomicU64::new(0),
            identity_rejections: AtomicU64::new(0),
            worker_panics: AtomicU64::new(0),
            symbols_transformed: AtomicU64::new(0),
            peak_active_workers: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    /// Record a dispatched connection and the worker count after dispatch
    pub fn connection_accepted(&self, active_workers: usize) {
        self.connections_accepted.fetch_add(1, Ordering::Relaxed);
        self.peak_active_workers
            .fetch_max(active_workers as u64, Ordering::Relaxed);
    }

    /// Record a completed request
    pub fn request_completed(&self, symbols: usize) {
        self.requests_completed.fetch_add(1, Ordering::Relaxed);
        self.symbols_transformed
            .fetch_add(symbols as u64, Ordering::Relaxed);
    }

    /// Record a failed request
    pub fn request_failed(&self) {
        self.requests_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an identity rejection
    pub fn identity_rejected(&self) {
        self.identity_rejections.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a worker panic
    pub fn worker_panicked(&self) {
        self.worker_panics.fetch_add(1, Ordering::Relaxed);
    }

    /// Get current metrics snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            connections_accepted: self.connections_accepted.load(Ordering::Relaxed),
            requests_completed: self.requests_completed.load(Ordering::Relaxed),
            requests_failed: self.requests_failed.load(Ordering::Relaxed),
            identity_rejections: self.identity_rejections.load(Ordering::Relaxed),
            worker_panics: self.worker_panics.load(Ordering::Relaxed),
            symbols_transformed: self.symbols_transformed.load(Ordering::Relaxed),
            peak_active_workers: self.peak_active_workers.load(Ordering::Relaxed),
            uptime_seconds: self.start_time.elapsed().as_secs(),
        }
    }

    /// Log current metrics
    pub fn log_summary(&self) {
        let snapshot = self.snapshot();
        info!(
            connections_accepted = snapshot.connections_accepted,
            requests_completed = snapshot.requests_completed,
            requests_failed = snapshot.requests_failed,
            identity_rejections = snapshot.identity_rejections,
            worker_panics = snapshot.worker_panics,
            symbols_transformed = snapshot.symbols_transformed,
            peak_active_workers = snapshot.peak_active_workers,
            uptime_seconds = snapshot.uptime_seconds,
            "Service metrics snapshot"
        );
    }
}

impl Default for ServiceMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of metrics at a point in time
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub connections_accepted: u64,
    pub requests_completed: u64,
    pub requests_failed: u64,
    pub identity_rejections: u64,
    pub worker_panics: u64,
    pub symbols_transformed: u64,
    pub peak_active_workers: u64,
    pub uptime_seconds: u64,
}

/// Timer for measuring operation duration
pub struct Timer {
    start: Instant,
    operation: &'static str,
}

impl Timer {
    /// Start timing an operation
    pub fn start(operation: &'static str) -> Self {
        Self {
            start: Instant::now(),
            operation,
        }
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        let duration = self.start.elapsed();
        debug!(
            operation = self.operation,
            duration_ms = duration.as_millis(),
            "Operation completed"
        );
    }
}
