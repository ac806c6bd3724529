//! Per-direction timing and volume tracking for a connection.
//!
//! One `Metric` tracks the receive side, another the send side, of every
//! `HttpConnection` (§3). Both are updated by the I/O operations in
//! [`crate::server::connection`] after each completed `recv_request` /
//! `send_response` call, never mid-transfer.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Timestamps and byte counters for one direction (recv or send) of a
/// connection, aggregated across every request handled on it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Metric {
    first_byte: Option<Instant>,
    last_byte: Option<Instant>,
    elapsed: Duration,
    total_bytes: u64,
    samples: u64,
}

impl Metric {
    #[inline(always)]
    pub(crate) const fn new() -> Self {
        Self {
            first_byte: None,
            last_byte: None,
            elapsed: Duration::ZERO,
            total_bytes: 0,
            samples: 0,
        }
    }

    /// Records one completed I/O operation. `start` and `stop` are the
    /// instants the operation began and ended (from the timeout
    /// combinator in [`crate::timeout`]); `bytes` is how many bytes it
    /// moved.
    ///
    /// `elapsed` is always `stop.saturating_duration_since(start)` —
    /// non-negative by construction, unlike a naive
    /// `stop - start` that can underflow if the two instants are ever
    /// compared out of order.
    #[inline(always)]
    pub(crate) fn record(&mut self, start: Instant, stop: Instant, bytes: usize) {
        if self.first_byte.is_none() {
            self.first_byte = Some(start);
        }
        self.last_byte = Some(stop);
        self.elapsed += stop.saturating_duration_since(start);
        self.total_bytes += bytes as u64;
        self.samples += 1;
    }

    #[inline(always)]
    pub(crate) fn reset(&mut self) {
        *self = Self::new();
    }

    #[inline(always)]
    pub(crate) fn elapsed(&self) -> Duration {
        self.elapsed
    }

    #[inline(always)]
    pub(crate) fn total_bytes(&self) -> u64 {
        self.total_bytes
    }

    #[inline(always)]
    pub(crate) fn samples(&self) -> u64 {
        self.samples
    }
}

impl Default for Metric {
    fn default() -> Self {
        Self::new()
    }
}

/// Server-wide counters aggregated across every connection (§5, "Shared
/// resources"). One instance is shared (via `Arc`) by every spawned
/// connection task; updates are plain atomic adds since each connection
/// only ever adds to its own total, never reads another's in-flight
/// state.
///
/// Accessible from outside `launch()` via [`crate::Server::metrics`], so
/// a caller can poll it from a separate task while the server runs.
#[derive(Debug, Default)]
pub struct ServerMetrics {
    total_recv_size: AtomicU64,
    total_send_size: AtomicU64,
    total_requests: AtomicU64,
}

impl ServerMetrics {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Adds one completed request's received byte count (§8 invariant 4:
    /// the sum across all requests must equal this total).
    #[inline(always)]
    pub(crate) fn add_recv(&self, bytes: u64) {
        self.total_recv_size.fetch_add(bytes, Ordering::Relaxed);
    }

    #[inline(always)]
    pub(crate) fn add_send(&self, bytes: u64) {
        self.total_send_size.fetch_add(bytes, Ordering::Relaxed);
    }

    #[inline(always)]
    pub(crate) fn add_request(&self) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
    }

    /// Total bytes received across every completed request on every
    /// connection this server has served.
    #[inline(always)]
    pub fn total_recv_size(&self) -> u64 {
        self.total_recv_size.load(Ordering::Relaxed)
    }

    /// Total bytes sent across every completed response.
    #[inline(always)]
    pub fn total_send_size(&self) -> u64 {
        self.total_send_size.load(Ordering::Relaxed)
    }

    /// Total number of requests completed (parsed, dispatched, and
    /// answered) across every connection.
    #[inline(always)]
    pub fn total_requests(&self) -> u64 {
        self.total_requests.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod server_metrics_tests {
    use super::*;

    #[test]
    fn aggregates_across_several_adds() {
        let metrics = ServerMetrics::new();
        metrics.add_recv(100);
        metrics.add_recv(50);
        metrics.add_send(30);
        metrics.add_request();
        metrics.add_request();

        assert_eq!(metrics.total_recv_size(), 150);
        assert_eq!(metrics.total_send_size(), 30);
        assert_eq!(metrics.total_requests(), 2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_accumulates_bytes_and_samples() {
        let mut m = Metric::new();
        let t0 = Instant::now();
        m.record(t0, t0 + Duration::from_millis(5), 100);
        m.record(t0, t0 + Duration::from_millis(3), 50);

        assert_eq!(m.total_bytes(), 150);
        assert_eq!(m.samples(), 2);
        assert_eq!(m.elapsed(), Duration::from_millis(8));
    }

    #[test]
    fn elapsed_never_goes_negative() {
        let mut m = Metric::new();
        let t0 = Instant::now();
        // stop before start would underflow a plain subtraction.
        m.record(t0 + Duration::from_millis(5), t0, 10);
        assert_eq!(m.elapsed(), Duration::ZERO);
    }
}
