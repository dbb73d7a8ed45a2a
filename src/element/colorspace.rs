//! The DSP colorspace element.

use super::{BaseTransform, ElementState};
use crate::accel::{AcceleratorSession, EngineRegistry};
use crate::config::{ColorspaceConfig, PropertyValue};
use crate::error::{Error, FormatError, Result};
use crate::format::VideoCaps;
use crate::memory::{FramePool, InputFrame, PoolSignal, PooledFrame};
use crate::negotiation::{FormatNegotiator, NegotiatedFormat, PadDirection};
use crate::observability::{
    ElementMetrics, instrument_frame, span_element, trace_error, trace_frame_converted,
    trace_frame_dropped, trace_state_change,
};
use crate::transform::FrameTransformer;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Global counter for instance names.
static INSTANCE_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Per-element counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ColorspaceStats {
    /// Frames converted.
    pub frames_converted: u64,
    /// Inputs that were already in accelerator memory.
    pub zero_copy_inputs: u64,
    /// Inputs copied into a scratch frame.
    pub staged_inputs: u64,
    /// Conversions the accelerator rejected.
    pub conversion_failures: u64,
    /// Frames dropped because no output frame was free.
    pub dropped_frames: u64,
}

/// I420 to RGB565 converter backed by a DSP accelerator.
///
/// Owns the negotiated format, the output [`FramePool`], its [`PoolSignal`]
/// and a [`FrameTransformer`] whose accelerator session opens on the first
/// frame.
///
/// # Example
///
/// ```rust
/// use dsp_colorspace::element::{BaseTransform, DspColorspace};
/// use dsp_colorspace::format::VideoCaps;
/// use dsp_colorspace::memory::InputFrame;
///
/// let mut element = DspColorspace::from_description("dspcolorspace numOutputBufs=2").unwrap();
/// let input: VideoCaps = "video/x-raw-yuv, format=I420, width=16, height=16".parse().unwrap();
/// let output: VideoCaps = "video/x-raw-rgb, bpp=16".parse().unwrap();
/// element.set_caps(&input, &output).unwrap();
///
/// let i420 = vec![128u8; 16 * 16 * 3 / 2];
/// let rgb = element.process(InputFrame::from(&i420)).unwrap();
/// assert_eq!(rgb.size(), 16 * 16 * 2);
/// ```
pub struct DspColorspace {
    name: String,
    config: ColorspaceConfig,
    state: ElementState,
    format: Option<NegotiatedFormat>,
    transformer: FrameTransformer,
    pool: Option<Arc<FramePool>>,
    signal: Option<Arc<PoolSignal>>,
    dropped: u64,
    sequence: u64,
    metrics: ElementMetrics,
}

impl DspColorspace {
    /// Create an element with the default configuration and engines.
    pub fn new() -> Self {
        Self::with_config(ColorspaceConfig::default())
    }

    /// Create an element with `config` and the default engines.
    pub fn with_config(config: ColorspaceConfig) -> Self {
        Self::with_registry(config, Arc::new(EngineRegistry::new()))
    }

    /// Create an element that opens engines from `registry`.
    pub fn with_registry(config: ColorspaceConfig, registry: Arc<EngineRegistry>) -> Self {
        let name = format!(
            "{}{}",
            crate::config::ELEMENT_NAME,
            INSTANCE_COUNTER.fetch_add(1, Ordering::Relaxed)
        );
        tracing::debug!(element = %name, engine = %config.engine_name, "created element");

        Self {
            metrics: ElementMetrics::new(&name),
            name,
            config,
            state: ElementState::Uninitialized,
            format: None,
            transformer: FrameTransformer::new(registry),
            pool: None,
            signal: None,
            dropped: 0,
            sequence: 0,
        }
    }

    /// Create an element from a `dspcolorspace key=value ...` description.
    pub fn from_description(description: &str) -> Result<Self> {
        ColorspaceConfig::from_description(description).map(Self::with_config)
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ElementState {
        self.state
    }

    /// Current configuration.
    pub fn config(&self) -> &ColorspaceConfig {
        &self.config
    }

    /// Engine the accelerator session opens (or has opened).
    pub fn engine_name(&self) -> &str {
        &self.config.engine_name
    }

    /// Change the engine. Only allowed until the accelerator session opens.
    pub fn set_engine_name(&mut self, name: impl Into<String>) -> Result<()> {
        self.ensure_not_closed()?;
        if self.transformer.session().is_open() {
            return Err(Error::InvalidState(
                "engineName cannot change while the accelerator is open".into(),
            ));
        }
        let mut config = self.config.clone();
        config.set_property("engineName", &PropertyValue::String(name.into()))?;
        self.config = config;
        Ok(())
    }

    /// Change the pool capacity; applied at the next negotiation.
    pub fn set_num_output_bufs(&mut self, count: usize) {
        self.config.num_output_bufs = count;
    }

    /// Apply one property by name.
    pub fn set_property(&mut self, name: &str, value: &PropertyValue) -> Result<()> {
        match name {
            "engineName" | "engine-name" | "engine_name" => self.set_engine_name(value.as_string()),
            _ => self.config.set_property(name, value),
        }
    }

    /// The negotiated format, once caps are set.
    pub fn negotiated_format(&self) -> Option<&NegotiatedFormat> {
        self.format.as_ref()
    }

    /// The output pool, once caps are set.
    pub fn pool(&self) -> Option<&Arc<FramePool>> {
        self.pool.as_ref()
    }

    /// The pool state-change signal, once caps are set.
    pub fn signal(&self) -> Option<&Arc<PoolSignal>> {
        self.signal.as_ref()
    }

    /// The accelerator session.
    pub fn session(&self) -> &AcceleratorSession {
        self.transformer.session()
    }

    /// Element counters.
    pub fn stats(&self) -> ColorspaceStats {
        let transform = self.transformer.stats();
        ColorspaceStats {
            frames_converted: transform.frames_converted,
            zero_copy_inputs: transform.zero_copy_inputs,
            staged_inputs: transform.staged_inputs,
            conversion_failures: transform.conversion_failures,
            dropped_frames: self.dropped,
        }
    }

    /// Prepare an output frame and convert `input` into it.
    pub fn process(&mut self, input: InputFrame<'_>) -> Result<PooledFrame> {
        let mut output = self.prepare_output_buffer(&input)?;
        self.transform(input, &mut output)?;
        Ok(output)
    }

    fn ensure_not_closed(&self) -> Result<()> {
        if self.state == ElementState::Closed {
            return Err(Error::InvalidState(format!("element {} is closed", self.name)));
        }
        Ok(())
    }

    fn set_state(&mut self, state: ElementState) {
        if self.state != state {
            trace_state_change(&self.name, self.state.name(), state.name());
            self.state = state;
        }
    }
}

impl BaseTransform for DspColorspace {
    fn name(&self) -> &str {
        &self.name
    }

    fn transform_caps(&self, direction: PadDirection, caps: &VideoCaps) -> VideoCaps {
        FormatNegotiator::transform_caps(direction, caps)
    }

    fn fixate_caps(
        &self,
        direction: PadDirection,
        caps: &VideoCaps,
        other: &VideoCaps,
    ) -> Result<VideoCaps> {
        Ok(FormatNegotiator::fixate_caps(direction, caps, other)?)
    }

    fn set_caps(&mut self, input: &VideoCaps, output: &VideoCaps) -> Result<()> {
        let _span = span_element(&self.name).entered();
        self.ensure_not_closed()?;

        let format = FormatNegotiator::negotiate(input, output).inspect_err(|e| {
            tracing::error!(element = %self.name, error = %e, "caps negotiation failed");
        })?;

        // One signal per pool; frames of an older pool never raise it
        let signal = Arc::new(PoolSignal::new());
        let pool = FramePool::new(format.output_info(), self.config.pool_capacity(), signal.clone())?;

        tracing::info!(
            element = %self.name,
            width = format.input_width,
            height = format.input_height,
            output_frame_size = format.output_frame_size,
            capacity = pool.capacity(),
            "caps set"
        );

        self.metrics.record_pool_available(pool.available());
        self.format = Some(format);
        self.pool = Some(pool);
        self.signal = Some(signal);

        let state = if self.transformer.session().is_open() {
            ElementState::AcceleratorOpen
        } else {
            ElementState::Negotiated
        };
        self.set_state(state);
        Ok(())
    }

    fn transform_size(
        &self,
        direction: PadDirection,
        caps: &VideoCaps,
        size: usize,
    ) -> Option<usize> {
        FormatNegotiator::transform_size(direction, caps, size)
    }

    fn prepare_output_buffer(&mut self, _input: &InputFrame<'_>) -> Result<PooledFrame> {
        self.ensure_not_closed()?;
        let pool = self.pool.as_ref().ok_or(FormatError::NotNegotiated)?;

        match pool.acquire() {
            Ok(frame) => {
                if let Some(signal) = &self.signal {
                    signal.reset();
                }
                self.metrics.record_pool_available(pool.available());
                Ok(frame)
            }
            Err(e) => {
                if e.is_droppable() {
                    self.dropped += 1;
                    self.metrics.record_dropped();
                    trace_frame_dropped(&self.name, pool.available(), pool.capacity());
                }
                Err(e)
            }
        }
    }

    fn transform(&mut self, input: InputFrame<'_>, output: &mut PooledFrame) -> Result<()> {
        self.ensure_not_closed()?;
        let format = self.format.ok_or(FormatError::NotNegotiated)?;

        self.sequence += 1;
        let _span = instrument_frame(&self.name, self.sequence);
        let timer = self.metrics.start_timer();

        let result =
            self.transformer
                .transform(&self.config.engine_name, &format, input, output);
        drop(timer);

        if self.transformer.session().is_open() && self.state == ElementState::Negotiated {
            self.set_state(ElementState::AcceleratorOpen);
        }

        match &result {
            Ok(()) => {
                self.metrics
                    .record_converted(output.size(), !input.is_contiguous());
                trace_frame_converted(&self.name, output.size(), input.is_contiguous());
                self.set_state(ElementState::Streaming);
            }
            Err(e) => {
                if matches!(e, Error::ConversionFailed(_)) {
                    self.metrics.record_failure();
                }
                trace_error(&self.name, e);
            }
        }
        result
    }

    fn stop(&mut self) {
        if self.state == ElementState::Closed {
            return;
        }
        let _span = span_element(&self.name).entered();

        self.transformer.close();
        if let Some(pool) = self.pool.take() {
            tracing::debug!(element = %self.name, issued = pool.issued(), "freeing output frames");
        }
        self.signal = None;
        self.format = None;

        let stats = self.stats();
        tracing::info!(
            element = %self.name,
            converted = stats.frames_converted,
            dropped = stats.dropped_frames,
            failures = stats.conversion_failures,
            "element stopped"
        );
        self.set_state(ElementState::Closed);
    }
}

impl Default for DspColorspace {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for DspColorspace {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for DspColorspace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DspColorspace")
            .field("name", &self.name)
            .field("state", &self.state)
            .field("config", &self.config)
            .field("format", &self.format)
            .finish_non_exhaustive()
    }
}
