//! The single-input, single-output transform interface.

use crate::error::Result;
use crate::format::VideoCaps;
use crate::memory::{InputFrame, PooledFrame};
use crate::negotiation::PadDirection;

/// Lifecycle of a transform element.
///
/// ```text
/// Uninitialized ─set_caps─▶ Negotiated ─first frame─▶ AcceleratorOpen ─ok─▶ Streaming
///        │                      │                          │                  │
///        └──────────────────────┴────────── stop ──────────┴──────────────────┴─▶ Closed
/// ```
///
/// `Closed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ElementState {
    /// No caps yet.
    #[default]
    Uninitialized,
    /// Caps set and output pool allocated; accelerator not open.
    Negotiated,
    /// Accelerator open; no frame converted since.
    AcceleratorOpen,
    /// At least one frame converted.
    Streaming,
    /// Torn down.
    Closed,
}

impl ElementState {
    /// State name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Uninitialized => "Uninitialized",
            Self::Negotiated => "Negotiated",
            Self::AcceleratorOpen => "AcceleratorOpen",
            Self::Streaming => "Streaming",
            Self::Closed => "Closed",
        }
    }
}

impl std::fmt::Display for ElementState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A transform element driven by an external pipeline.
///
/// The pipeline negotiates caps through [`transform_caps`](Self::transform_caps),
/// [`fixate_caps`](Self::fixate_caps) and [`set_caps`](Self::set_caps), then
/// for every input frame calls [`prepare_output_buffer`](Self::prepare_output_buffer)
/// followed by [`transform`](Self::transform), and finally [`stop`](Self::stop).
///
/// # Example
///
/// ```rust,ignore
/// let mut output = element.prepare_output_buffer(&input)?;
/// element.transform(input, &mut output)?;
/// downstream.push(output); // returns to the pool when dropped
/// ```
pub trait BaseTransform: Send {
    /// Get the name of this element (for debugging/logging).
    fn name(&self) -> &str;

    /// Caps allowed on the opposite pad given `caps` on the `direction` pad.
    fn transform_caps(&self, direction: PadDirection, caps: &VideoCaps) -> VideoCaps;

    /// Fixate `other` (opposite pad) towards the fixed `caps`.
    fn fixate_caps(
        &self,
        direction: PadDirection,
        caps: &VideoCaps,
        other: &VideoCaps,
    ) -> Result<VideoCaps>;

    /// Accept a confirmed input/output caps pair.
    fn set_caps(&mut self, input: &VideoCaps, output: &VideoCaps) -> Result<()>;

    /// Size of the opposite pad's frame, if computable.
    fn transform_size(&self, direction: PadDirection, caps: &VideoCaps, size: usize)
    -> Option<usize>;

    /// Obtain the frame `transform` will write into.
    fn prepare_output_buffer(&mut self, input: &InputFrame<'_>) -> Result<PooledFrame>;

    /// Convert `input` into `output`.
    fn transform(&mut self, input: InputFrame<'_>, output: &mut PooledFrame) -> Result<()>;

    /// Release every resource. Further calls are no-ops.
    fn stop(&mut self);
}
