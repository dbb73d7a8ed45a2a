//! Spans and structured log helpers.

use tracing::{Level, Span, span};

/// Create a span for the element's lifetime operations (caps, teardown).
///
/// # Example
///
/// ```rust
/// use dsp_colorspace::observability::span_element;
///
/// let span = span_element("dspcolorspace0");
/// let _guard = span.enter();
/// ```
#[inline]
pub fn span_element(element: &str) -> Span {
    span!(Level::DEBUG, "element", element = %element)
}

/// Create a span for converting one frame.
#[inline]
pub fn span_frame(element: &str, sequence: u64) -> Span {
    span!(Level::TRACE, "frame", element = %element, sequence = sequence)
}

/// Enter the per-frame span; the guard exits it on drop.
pub fn instrument_frame(element: &str, sequence: u64) -> tracing::span::EnteredSpan {
    span_frame(element, sequence).entered()
}

/// Log a converted frame.
#[inline]
pub fn trace_frame_converted(element: &str, size: usize, zero_copy: bool) {
    tracing::trace!(
        element = %element,
        size = size,
        zero_copy = zero_copy,
        "frame converted"
    );
}

/// Log a frame dropped because no output frame was free.
#[inline]
pub fn trace_frame_dropped(element: &str, available: usize, capacity: usize) {
    tracing::warn!(
        element = %element,
        available = available,
        capacity = capacity,
        "no free output frame, dropping frame"
    );
}

/// Log a per-frame error.
#[inline]
pub fn trace_error(element: &str, error: &dyn std::error::Error) {
    tracing::error!(
        element = %element,
        error = %error,
        "processing error"
    );
}

/// Log an element state change.
#[inline]
pub fn trace_state_change(element: &str, from: &str, to: &str) {
    tracing::debug!(
        element = %element,
        from = %from,
        to = %to,
        "element state changed"
    );
}
