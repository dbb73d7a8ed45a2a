//! Caps negotiation for the I420 to RGB565 converter.
//!
//! The element has one sink pad (I420, any size and rate) and one src pad
//! (RGB565, any size and rate). Negotiation turns a confirmed pair of caps
//! into a [`NegotiatedFormat`], which fixes the input geometry and the size
//! of every output frame for the rest of the session.
//!
//! Every function here is pure: the same caps always give the same answer.

use crate::error::FormatError;
use crate::format::{CapsValue, Framerate, PixelFormat, VideoCaps};
use crate::memory::FrameInfo;

/// The pixel format accepted on the sink pad.
pub const SINK_FORMAT: PixelFormat = PixelFormat::I420;

/// The pixel format produced on the src pad.
pub const SRC_FORMAT: PixelFormat = PixelFormat::Rgb565;

/// Which pad a set of caps belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PadDirection {
    /// The input pad (receives I420 from upstream).
    Sink,
    /// The output pad (sends RGB565 downstream).
    Src,
}

impl PadDirection {
    /// The pad on the other side of the element.
    pub const fn opposite(self) -> Self {
        match self {
            Self::Sink => Self::Src,
            Self::Src => Self::Sink,
        }
    }

    /// The only pixel format this pad carries.
    pub const fn pixel_format(self) -> PixelFormat {
        match self {
            Self::Sink => SINK_FORMAT,
            Self::Src => SRC_FORMAT,
        }
    }
}

/// The format pair fixed for one streaming session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NegotiatedFormat {
    /// Input (and output) width in pixels.
    pub input_width: u32,
    /// Input (and output) height in pixels.
    pub input_height: u32,
    /// Pixel format on the sink pad.
    pub source_format: PixelFormat,
    /// Pixel format on the src pad.
    pub dest_format: PixelFormat,
    /// Byte size of every output frame.
    pub output_frame_size: usize,
    /// Input framerate, when the caps carried one.
    pub framerate: Option<Framerate>,
}

impl NegotiatedFormat {
    /// Expected byte size of a tightly packed input frame.
    pub const fn input_frame_size(&self) -> usize {
        self.source_format.frame_size(self.input_width, self.input_height)
    }

    /// Frame info for staged input frames.
    pub const fn input_info(&self) -> FrameInfo {
        FrameInfo::new(self.input_width, self.input_height, self.source_format)
    }

    /// Frame info for pooled output frames.
    pub const fn output_info(&self) -> FrameInfo {
        FrameInfo::new(self.input_width, self.input_height, self.dest_format)
            .with_size(self.output_frame_size)
    }
}

/// Stateless caps logic for the converter's two pads.
#[derive(Debug, Clone, Copy, Default)]
pub struct FormatNegotiator;

impl FormatNegotiator {
    /// Template caps of the sink pad.
    pub fn sink_template() -> VideoCaps {
        VideoCaps::with_format(SINK_FORMAT)
    }

    /// Template caps of the src pad.
    pub fn src_template() -> VideoCaps {
        VideoCaps::with_format(SRC_FORMAT)
    }

    /// Template caps of the pad in `direction`.
    pub fn template(direction: PadDirection) -> VideoCaps {
        match direction {
            PadDirection::Sink => Self::sink_template(),
            PadDirection::Src => Self::src_template(),
        }
    }

    /// Extract width, height and pixel format from fixed caps.
    pub fn parse_caps(caps: &VideoCaps) -> Result<(u32, u32, PixelFormat), FormatError> {
        let width = *caps
            .width
            .as_fixed()
            .ok_or(FormatError::MissingField("width"))?;
        let height = *caps
            .height
            .as_fixed()
            .ok_or(FormatError::MissingField("height"))?;
        let pixel_format = *caps
            .pixel_format
            .as_fixed()
            .ok_or(FormatError::MissingField("format"))?;
        Ok((width, height, pixel_format))
    }

    /// Byte size of one frame of `pixel_format` at the given dimensions.
    ///
    /// Rows are padded to the 32-byte line length the accelerator expects.
    pub const fn output_size(width: u32, height: u32, pixel_format: PixelFormat) -> usize {
        pixel_format.line_length(width) * height as usize
    }

    /// Resolve a confirmed input/output caps pair.
    pub fn negotiate(input: &VideoCaps, output: &VideoCaps) -> Result<NegotiatedFormat, FormatError> {
        let (width, height, source_format) = Self::parse_caps(input)?;

        if source_format != SINK_FORMAT {
            return Err(FormatError::UnsupportedInput(source_format));
        }
        if width == 0 || height == 0 || width % 2 != 0 || height % 2 != 0 {
            return Err(FormatError::InvalidDimensions { width, height });
        }
        if !output.pixel_format.accepts(&SRC_FORMAT) {
            let requested = output.pixel_format.fixate().unwrap_or(SRC_FORMAT);
            return Err(FormatError::UnsupportedOutput(requested));
        }
        if !output.width.accepts(&width) || !output.height.accepts(&height) {
            tracing::warn!(
                %output,
                width,
                height,
                "output caps request a different size, converting at input size"
            );
        }

        let negotiated = NegotiatedFormat {
            input_width: width,
            input_height: height,
            source_format,
            dest_format: SRC_FORMAT,
            output_frame_size: Self::output_size(width, height, SRC_FORMAT),
            framerate: input.framerate.as_fixed().copied(),
        };

        tracing::debug!(
            width,
            height,
            output_frame_size = negotiated.output_frame_size,
            "negotiated {} -> {}",
            negotiated.source_format,
            negotiated.dest_format
        );

        Ok(negotiated)
    }

    /// Caps allowed on the opposite pad given `caps` on the `direction` pad.
    ///
    /// Always the opposite pad's template; the element never scales.
    pub fn transform_caps(direction: PadDirection, _caps: &VideoCaps) -> VideoCaps {
        Self::template(direction.opposite())
    }

    /// Fixate `other` towards the fixed `caps` on the `direction` pad.
    ///
    /// `other` is first narrowed to the opposite pad's template, so an
    /// unfixed pixel format becomes that pad's format. Width, height and
    /// framerate are then each resolved to the value nearest to the one in
    /// `caps`.
    pub fn fixate_caps(
        direction: PadDirection,
        caps: &VideoCaps,
        other: &VideoCaps,
    ) -> Result<VideoCaps, FormatError> {
        let width = caps
            .width
            .as_fixed()
            .ok_or(FormatError::MissingField("width"))?;
        let height = caps
            .height
            .as_fixed()
            .ok_or(FormatError::MissingField("height"))?;

        let template = Self::template(direction.opposite());
        let mut fixated = other.intersect(&template).ok_or_else(|| {
            let requested = other
                .pixel_format
                .fixate()
                .unwrap_or(direction.opposite().pixel_format());
            match direction {
                PadDirection::Sink => FormatError::UnsupportedOutput(requested),
                PadDirection::Src => FormatError::UnsupportedInput(requested),
            }
        })?;
        fixated.width = CapsValue::Fixed(other.width.fixate_nearest(width));
        fixated.height = CapsValue::Fixed(other.height.fixate_nearest(height));
        if let Some(framerate) = caps.framerate.as_fixed() {
            fixated.framerate = CapsValue::Fixed(other.framerate.fixate_nearest(framerate));
        }

        tracing::trace!(%caps, %fixated, "fixated caps");
        Ok(fixated)
    }

    /// Size of the frame on the opposite pad for a `size`-byte frame on the
    /// `direction` pad.
    ///
    /// Only computable for the sink direction; returns `None` otherwise or
    /// when `caps` lack a fixed size.
    pub fn transform_size(direction: PadDirection, caps: &VideoCaps, _size: usize) -> Option<usize> {
        match direction {
            PadDirection::Sink => {
                let width = *caps.width.as_fixed()?;
                let height = *caps.height.as_fixed()?;
                Some(Self::output_size(width, height, SRC_FORMAT))
            }
            PadDirection::Src => None,
        }
    }
}
