//! Observability and Metrics
//!
//! Codec counters for monitoring push/pull traffic.
//!
//! Uses atomic counters for thread-safe metrics collection.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::{debug, info};

/// Global metrics collector for codec operations
#[derive(Debug)]
pub struct CodecMetrics {
    /// Collections written by the list codec
    pub collections_encoded: AtomicU64,
    /// Collections read by the list codec
    pub collections_decoded: AtomicU64,
    /// Total bytes encoded
    pub bytes_encoded: AtomicU64,
    /// Total bytes decoded
    pub bytes_decoded: AtomicU64,
    /// Collections rejected before encoding
    pub validation_failures: AtomicU64,
    /// Size computations above the 32-bit ceiling
    pub size_overflows: AtomicU64,
    /// Buffers rejected by the decoder
    pub malformed_inputs: AtomicU64,
    /// Matrix read pins taken
    pub matrix_pins: AtomicU64,
    /// Start time for uptime calculation
    start_time: Instant,
}

impl CodecMetrics {
    /// Create a new metrics collector
    pub fn new() -> Self {
        Self {
            collections_encoded: AtomicU64::new(0),
            collections_decoded: AtomicU64::new(0),
            bytes_encoded: AtomicU64::new(0),
            bytes_decoded: AtomicU64::new(0),
            validation_failures: AtomicU64::new(0),
            size_overflows: AtomicU64::new(0),
            malformed_inputs: AtomicU64::new(0),
            matrix_pins: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    /// Record an encoded collection
    pub fn collection_encoded(&self, byte_count: u64) {
        self.collections_encoded.fetch_add(1, Ordering::Relaxed);
        self.bytes_encoded.fetch_add(byte_count, Ordering::Relaxed);
    }

    /// Record a decoded collection
    pub fn collection_decoded(&self, byte_count: u64) {
        self.collections_decoded.fetch_add(1, Ordering::Relaxed);
        self.bytes_decoded.fetch_add(byte_count, Ordering::Relaxed);
    }

    pub fn validation_failure(&self) {
        self.validation_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn size_overflow(&self) {
        self.size_overflows.fetch_add(1, Ordering::Relaxed);
    }

    pub fn malformed_input(&self) {
        self.malformed_inputs.fetch_add(1, Ordering::Relaxed);
    }

    pub fn matrix_pinned(&self) {
        self.matrix_pins.fetch_add(1, Ordering::Relaxed);
    }

    /// Get current metrics snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            collections_encoded: self.collections_encoded.load(Ordering::Relaxed),
            collections_decoded: self.collections_decoded.load(Ordering::Relaxed),
            bytes_encoded: self.bytes_encoded.load(Ordering::Relaxed),
            bytes_decoded: self.bytes_decoded.load(Ordering::Relaxed),
            validation_failures: self.validation_failures.load(Ordering::Relaxed),
            size_overflows: self.size_overflows.load(Ordering::Relaxed),
            malformed_inputs: self.malformed_inputs.load(Ordering::Relaxed),
            matrix_pins: self.matrix_pins.load(Ordering::Relaxed),
            uptime_seconds: self.start_time.elapsed().as_secs(),
        }
    }

    /// Log current metrics
    pub fn log_metrics(&self) {
        let snapshot = self.snapshot();
        info!(
            collections_encoded = snapshot.collections_encoded,
            collections_decoded = snapshot.collections_decoded,
            bytes_encoded = snapshot.bytes_encoded,
            bytes_decoded = snapshot.bytes_decoded,
            validation_failures = snapshot.validation_failures,
            size_overflows = snapshot.size_overflows,
            malformed_inputs = snapshot.malformed_inputs,
            matrix_pins = snapshot.matrix_pins,
            uptime_seconds = snapshot.uptime_seconds,
            "Codec metrics snapshot"
        );
    }
}

impl Default for CodecMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of metrics at a point in time
#[derive(Debug, Clone)]
pub struct MetricsSnapshot {
    pub collections_encoded: u64,
    pub collections_decoded: u64,
    pub bytes_encoded: u64,
    pub bytes_decoded: u64,
    pub validation_failures: u64,
    pub size_overflows: u64,
    pub malformed_inputs: u64,
    pub matrix_pins: u64,
    pub uptime_seconds: u64,
}

static METRICS: once_cell::sync::Lazy<CodecMetrics> = once_cell::sync::Lazy::new(CodecMetrics::new);

/// Get the global metrics instance
pub fn global_metrics() -> &'static CodecMetrics {
    &METRICS
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
            duration_us = duration.as_micros() as u64,
            "Operation completed"
        );
    }
}
