//! Metrics collection using metrics-rs.

use metrics::{Counter, Gauge, Histogram, Unit, counter, gauge, histogram};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Whether metrics have been described.
static METRICS_INITIALIZED: AtomicBool = AtomicBool::new(false);

const FRAMES_CONVERTED: &str = "dsp_colorspace_frames_converted";
const FRAMES_DROPPED: &str = "dsp_colorspace_frames_dropped";
const CONVERSION_FAILURES: &str = "dsp_colorspace_conversion_failures";
const INPUTS_STAGED: &str = "dsp_colorspace_inputs_staged";
const BYTES_CONVERTED: &str = "dsp_colorspace_bytes_converted";
const PROCESSING_TIME_NS: &str = "dsp_colorspace_processing_time_ns";
const POOL_FRAMES_AVAILABLE: &str = "dsp_colorspace_pool_frames_available";

/// Describe the crate's metrics to the installed recorder.
///
/// Safe to call multiple times (subsequent calls are no-ops).
pub fn init_metrics() {
    if METRICS_INITIALIZED.swap(true, Ordering::SeqCst) {
        return;
    }

    metrics::describe_counter!(FRAMES_CONVERTED, Unit::Count, "Frames converted to RGB565");
    metrics::describe_counter!(
        FRAMES_DROPPED,
        Unit::Count,
        "Frames dropped because no output frame was free"
    );
    metrics::describe_counter!(
        CONVERSION_FAILURES,
        Unit::Count,
        "Conversions rejected by the accelerator"
    );
    metrics::describe_counter!(
        INPUTS_STAGED,
        Unit::Count,
        "Inputs copied into accelerator memory before conversion"
    );
    metrics::describe_counter!(BYTES_CONVERTED, Unit::Bytes, "Output bytes produced");
    metrics::describe_histogram!(
        PROCESSING_TIME_NS,
        Unit::Nanoseconds,
        "Time to convert a single frame"
    );
    metrics::describe_gauge!(
        POOL_FRAMES_AVAILABLE,
        Unit::Count,
        "Free frames in the output pool"
    );
}

/// Metric handles for one element instance, labelled by element name.
#[derive(Clone)]
pub struct ElementMetrics {
    element: String,
    converted: Counter,
    dropped: Counter,
    failures: Counter,
    staged: Counter,
    bytes: Counter,
    pool_available: Gauge,
    processing_time: Histogram,
}

impl ElementMetrics {
    /// Register handles for `element`.
    pub fn new(element: &str) -> Self {
        let label = element.to_string();
        Self {
            element: label.clone(),
            converted: counter!(FRAMES_CONVERTED, "element" => label.clone()),
            dropped: counter!(FRAMES_DROPPED, "element" => label.clone()),
            failures: counter!(CONVERSION_FAILURES, "element" => label.clone()),
            staged: counter!(INPUTS_STAGED, "element" => label.clone()),
            bytes: counter!(BYTES_CONVERTED, "element" => label.clone()),
            pool_available: gauge!(POOL_FRAMES_AVAILABLE, "element" => label.clone()),
            processing_time: histogram!(PROCESSING_TIME_NS, "element" => label),
        }
    }

    /// Record a converted frame of `bytes` output bytes.
    #[inline]
    pub fn record_converted(&self, bytes: usize, staged: bool) {
        self.converted.increment(1);
        self.bytes.increment(bytes as u64);
        if staged {
            self.staged.increment(1);
        }
    }

    /// Record a dropped frame.
    #[inline]
    pub fn record_dropped(&self) {
        self.dropped.increment(1);
    }

    /// Record a failed conversion.
    #[inline]
    pub fn record_failure(&self) {
        self.failures.increment(1);
    }

    /// Record the number of free output frames.
    #[inline]
    pub fn record_pool_available(&self, available: usize) {
        self.pool_available.set(available as f64);
    }

    /// Record processing time.
    #[inline]
    pub fn record_time(&self, duration: Duration) {
        self.processing_time.record(duration.as_nanos() as f64);
    }

    /// Start a timer and return a guard that records on drop.
    pub fn start_timer(&self) -> TimerGuard<'_> {
        TimerGuard {
            start: Instant::now(),
            metrics: self,
        }
    }

    /// Element label.
    pub fn element(&self) -> &str {
        &self.element
    }
}

impl std::fmt::Debug for ElementMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ElementMetrics")
            .field("element", &self.element)
            .finish_non_exhaustive()
    }
}

/// Guard that records processing time when dropped.
pub struct TimerGuard<'a> {
    start: Instant,
    metrics: &'a ElementMetrics,
}

impl Drop for TimerGuard<'_> {
    fn drop(&mut self) {
        self.metrics.record_time(self.start.elapsed());
    }
}
