//! Observability: tracing spans and metrics.
//!
//! The element emits `tracing` events at every stage (caps, session setup,
//! per frame, teardown) and publishes counters through the `metrics` facade:
//!
//! | Metric | Type | Description |
//! |--------|------|-------------|
//! | `dsp_colorspace_frames_converted` | Counter | Frames converted |
//! | `dsp_colorspace_frames_dropped` | Counter | Frames dropped on pool exhaustion |
//! | `dsp_colorspace_conversion_failures` | Counter | Accelerator failures |
//! | `dsp_colorspace_inputs_staged` | Counter | Inputs copied into accelerator memory |
//! | `dsp_colorspace_bytes_converted` | Counter | Output bytes produced |
//! | `dsp_colorspace_processing_time_ns` | Histogram | Conversion time per frame |
//! | `dsp_colorspace_pool_frames_available` | Gauge | Free output frames |
//!
//! Nothing is recorded until the host installs a `metrics` recorder or a
//! `tracing` subscriber.

mod metrics;
mod tracing_support;

pub use self::metrics::{ElementMetrics, TimerGuard, init_metrics};
pub use tracing_support::{
    instrument_frame, span_element, span_frame, trace_error, trace_frame_converted,
    trace_frame_dropped, trace_state_change,
};
