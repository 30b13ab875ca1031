//! Lock-free sync metrics and periodic reporting
//!
//! Counters are plain atomics with Relaxed ordering; they are statistics
//! only and must not drive any decision.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::info;

/// Update an atomic max value using compare-and-swap loop
#[inline]
fn update_atomic_max(atomic_max: &AtomicU64, new_value: u64) {
    let mut current_max = atomic_max.load(Ordering::Relaxed);
    while new_value > current_max {
        match atomic_max.compare_exchange_weak(
            current_max,
            new_value,
            Ordering::Relaxed,
            Ordering::Relaxed,
        ) {
            Ok(_) => break,
            Err(actual) => current_max = actual,
        }
    }
}

/// Add to an atomic counter, saturating at `u64::MAX`
#[inline]
fn saturating_atomic_add(atomic: &AtomicU64, value: u64) {
    let mut current = atomic.load(Ordering::Relaxed);
    loop {
        match atomic.compare_exchange_weak(
            current,
            current.saturating_add(value),
            Ordering::Relaxed,
            Ordering::Relaxed,
        ) {
            Ok(_) => break,
            Err(actual) => current = actual,
        }
    }
}

pub struct Metrics {
    /// Completed passes (monotonic)
    passes_total: AtomicU64,
    /// Passes aborted by a source read error (monotonic)
    passes_failed_total: AtomicU64,
    /// Devices published (monotonic)
    published_total: AtomicU64,
    /// Devices skipped because their marker was unchanged (monotonic)
    suppressed_total: AtomicU64,
    /// Records without a usable name (monotonic)
    skipped_total: AtomicU64,
    /// Publications the transport refused (monotonic)
    publish_errors_total: AtomicU64,
    /// Passes since last report (reset on report)
    passes_since_report: AtomicU64,
    /// Sum of pass durations in microseconds (reset on report)
    pass_duration_sum_us: AtomicU64,
    /// Longest pass in microseconds (reset on report)
    pass_duration_max_us: AtomicU64,
    last_report_time: Mutex<Instant>,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            passes_total: AtomicU64::new(0),
            passes_failed_total: AtomicU64::new(0),
            published_total: AtomicU64::new(0),
            suppressed_total: AtomicU64::new(0),
            skipped_total: AtomicU64::new(0),
            publish_errors_total: AtomicU64::new(0),
            passes_since_report: AtomicU64::new(0),
            pass_duration_sum_us: AtomicU64::new(0),
            pass_duration_max_us: AtomicU64::new(0),
            last_report_time: Mutex::new(Instant::now()),
        }
    }

    /// Record a finished pass (successful or not) and its duration
    pub fn record_pass(&self, duration_us: u64, failed: bool) {
        self.passes_total.fetch_add(1, Ordering::Relaxed);
        if failed {
            self.passes_failed_total.fetch_add(1, Ordering::Relaxed);
        }
        self.passes_since_report.fetch_add(1, Ordering::Relaxed);
        saturating_atomic_add(&self.pass_duration_sum_us, duration_us);
        update_atomic_max(&self.pass_duration_max_us, duration_us);
    }

    #[inline]
    pub fn record_published(&self) {
        self.published_total.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_suppressed(&self) {
        self.suppressed_total.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_skipped(&self) {
        self.skipped_total.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_publish_error(&self) {
        self.publish_errors_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn passes_total(&self) -> u64 {
        self.passes_total.load(Ordering::Relaxed)
    }

    pub fn published_total(&self) -> u64 {
        self.published_total.load(Ordering::Relaxed)
    }

    pub fn suppressed_total(&self) -> u64 {
        self.suppressed_total.load(Ordering::Relaxed)
    }

    /// Snapshot counters and reset the periodic ones
    pub fn report(&self, known_devices: usize) -> MetricsSummary {
        let passes = self.passes_since_report.swap(0, Ordering::Relaxed);
        let duration_sum = self.pass_duration_sum_us.swap(0, Ordering::Relaxed);
        let duration_max = self.pass_duration_max_us.swap(0, Ordering::Relaxed);

        let elapsed = {
            let mut last = self.last_report_time.lock();
            let elapsed = last.elapsed();
            *last = Instant::now();
            elapsed
        };

        MetricsSummary {
            passes_total: self.passes_total.load(Ordering::Relaxed),
            passes_failed_total: self.passes_failed_total.load(Ordering::Relaxed),
            published_total: self.published_total.load(Ordering::Relaxed),
            suppressed_total: self.suppressed_total.load(Ordering::Relaxed),
            skipped_total: self.skipped_total.load(Ordering::Relaxed),
            publish_errors_total: self.publish_errors_total.load(Ordering::Relaxed),
            passes_since_report: passes,
            avg_pass_us: if passes > 0 { duration_sum / passes } else { 0 },
            max_pass_us: duration_max,
            report_interval_secs: elapsed.as_secs_f64(),
            known_devices,
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone)]
pub struct MetricsSummary {
    pub passes_total: u64,
    pub passes_failed_total: u64,
    pub published_total: u64,
    pub suppressed_total: u64,
    pub skipped_total: u64,
    pub publish_errors_total: u64,
    pub passes_since_report: u64,
    pub avg_pass_us: u64,
    pub max_pass_us: u64,
    pub report_interval_secs: f64,
    pub known_devices: usize,
}

impl MetricsSummary {
    pub fn log(&self) {
        info!(
            passes_total = %self.passes_total,
            passes_failed = %self.passes_failed_total,
            published_total = %self.published_total,
            suppressed_total = %self.suppressed_total,
            skipped_total = %self.skipped_total,
            publish_errors = %self.publish_errors_total,
            passes = %self.passes_since_report,
            avg_pass_us = %self.avg_pass_us,
            max_pass_us = %self.max_pass_us,
            interval_secs = format!("{:.0}", self.report_interval_secs),
            known_devices = %self.known_devices,
            "metrics"
        );
    }
}
