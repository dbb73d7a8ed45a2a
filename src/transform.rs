//! Per-frame conversion dispatch.
//!
//! [`FrameTransformer`] owns the accelerator session and runs one I420 to
//! RGB565 conversion per call:
//!
//! 1. Open the session on first use.
//! 2. Use contiguous input in place; stage system-memory input into a
//!    scratch frame that is freed on every exit path.
//! 3. Split the input at 2/3 and 5/6 of its size into Y, Cb and Cr.
//! 4. Convert into the output frame.

use crate::accel::{AcceleratorSession, EngineRegistry};
use crate::error::{Error, Result};
use crate::memory::{Frame, InputFrame};
use crate::negotiation::NegotiatedFormat;
use std::sync::Arc;

/// Byte ranges of the three planes inside an I420 frame of `size` bytes.
///
/// Cb starts at 2/3 of the frame and Cr at 5/6.
#[inline]
pub const fn plane_offsets(size: usize) -> (usize, usize) {
    (size * 2 / 3, size * 5 / 6)
}

/// Counters kept by the transformer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransformStats {
    /// Successful conversions.
    pub frames_converted: u64,
    /// Inputs used in place.
    pub zero_copy_inputs: u64,
    /// Inputs copied into a scratch frame.
    pub staged_inputs: u64,
    /// Conversions the accelerator rejected.
    pub conversion_failures: u64,
}

/// Runs conversions on a lazily opened [`AcceleratorSession`].
#[derive(Debug)]
pub struct FrameTransformer {
    session: AcceleratorSession,
    stats: TransformStats,
}

impl FrameTransformer {
    /// Create a transformer whose session opens engines from `registry`.
    pub fn new(registry: Arc<EngineRegistry>) -> Self {
        Self {
            session: AcceleratorSession::new(registry),
            stats: TransformStats::default(),
        }
    }

    /// The accelerator session.
    pub fn session(&self) -> &AcceleratorSession {
        &self.session
    }

    /// Conversion counters.
    pub fn stats(&self) -> TransformStats {
        self.stats
    }

    /// Convert `input` into `output`.
    ///
    /// `output` must hold at least `width * height * 2` bytes, which every
    /// frame sized by negotiation does.
    pub fn transform(
        &mut self,
        engine_name: &str,
        format: &NegotiatedFormat,
        input: InputFrame<'_>,
        output: &mut Frame,
    ) -> Result<()> {
        self.session.ensure_open(engine_name)?;

        let scratch;
        let source = match input {
            InputFrame::Contiguous(frame) => {
                tracing::trace!(size = frame.size(), "using contiguous input in place");
                frame
            }
            InputFrame::System(bytes) => {
                tracing::trace!(size = bytes.len(), "staging system-memory input");
                scratch = Frame::from_bytes(format.input_info(), bytes).inspect_err(|e| {
                    tracing::error!(error = %e, "failed to allocate scratch input frame");
                })?;
                &scratch
            }
        };

        if source.size() != format.input_frame_size() {
            tracing::debug!(
                size = source.size(),
                expected = format.input_frame_size(),
                "input size differs from negotiated frame size"
            );
        }

        let data = source.data();
        let (cb_offset, cr_offset) = plane_offsets(data.len());
        let (y, chroma) = data.split_at(cb_offset);
        let (cb, cr) = chroma.split_at(cr_offset - cb_offset);

        let result = self.session.convert(
            source.height(),
            source.width(),
            y,
            cb,
            cr,
            output.data_mut(),
        );

        match result {
            Ok(()) => {
                self.stats.frames_converted += 1;
                if input.is_contiguous() {
                    self.stats.zero_copy_inputs += 1;
                } else {
                    self.stats.staged_inputs += 1;
                }
                Ok(())
            }
            Err(Error::ConversionFailed(code)) => {
                self.stats.conversion_failures += 1;
                tracing::error!(code, "colorspace conversion failed");
                Err(Error::ConversionFailed(code))
            }
            Err(e) => Err(e),
        }
    }

    /// Close the accelerator session.
    pub fn close(&mut self) {
        self.session.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accel::DEFAULT_ENGINE_NAME;
    use crate::format::{PixelFormat, VideoCaps};
    use crate::memory::FrameInfo;
    use crate::negotiation::FormatNegotiator;

    fn negotiated(width: u32, height: u32) -> NegotiatedFormat {
        FormatNegotiator::negotiate(
            &VideoCaps::with_format(PixelFormat::I420).with_size(width, height),
            &FormatNegotiator::src_template(),
        )
        .unwrap()
    }

    fn grey_i420(width: u32, height: u32) -> Vec<u8> {
        let luma = (width * height) as usize;
        let mut bytes = vec![144u8; luma];
        bytes.resize(luma * 3 / 2, 128);
        bytes
    }

    #[test]
    fn test_plane_offsets() {
        assert_eq!(plane_offsets(115_200), (76_800, 96_000));
        assert_eq!(plane_offsets(6), (4, 5));
    }

    #[test]
    fn test_staged_input() {
        let format = negotiated(16, 16);
        let mut transformer = FrameTransformer::new(Arc::new(EngineRegistry::new()));
        let mut output = Frame::alloc(format.output_info()).unwrap();

        let input = grey_i420(16, 16);
        transformer
            .transform(DEFAULT_ENGINE_NAME, &format, InputFrame::from(&input), &mut output)
            .unwrap();

        assert!(transformer.session().is_open());
        let expected = (((128u16 >> 3) << 11) | ((128 >> 2) << 5) | (128 >> 3)).to_le_bytes();
        assert!(output.data()[..16 * 16 * 2]
            .chunks_exact(2)
            .all(|p| p == expected));

        let stats = transformer.stats();
        assert_eq!(stats.frames_converted, 1);
        assert_eq!(stats.staged_inputs, 1);
        assert_eq!(stats.zero_copy_inputs, 0);
    }

    #[test]
    fn test_contiguous_input() {
        let format = negotiated(16, 16);
        let mut transformer = FrameTransformer::new(Arc::new(EngineRegistry::new()));
        let mut output = Frame::alloc(format.output_info()).unwrap();
        let input = Frame::from_bytes(
            FrameInfo::new(16, 16, PixelFormat::I420),
            &grey_i420(16, 16),
        )
        .unwrap();

        transformer
            .transform(DEFAULT_ENGINE_NAME, &format, InputFrame::from(&input), &mut output)
            .unwrap();

        assert_eq!(transformer.stats().zero_copy_inputs, 1);
        assert_eq!(transformer.stats().staged_inputs, 0);
    }

    #[test]
    fn test_short_input_fails_conversion() {
        let format = negotiated(16, 16);
        let mut transformer = FrameTransformer::new(Arc::new(EngineRegistry::new()));
        let mut output = Frame::alloc(format.output_info()).unwrap();

        let short = vec![0u8; 100];
        let err = transformer
            .transform(DEFAULT_ENGINE_NAME, &format, InputFrame::from(&short), &mut output)
            .unwrap_err();

        assert!(matches!(err, Error::ConversionFailed(_)));
        assert_eq!(transformer.stats().conversion_failures, 1);
        assert_eq!(transformer.stats().frames_converted, 0);
        // The session stays usable
        assert!(transformer.session().is_open());
    }

    #[test]
    fn test_unknown_engine() {
        let format = negotiated(16, 16);
        let mut transformer = FrameTransformer::new(Arc::new(EngineRegistry::new()));
        let mut output = Frame::alloc(format.output_info()).unwrap();

        let input = grey_i420(16, 16);
        let err = transformer
            .transform("bogus", &format, InputFrame::from(&input), &mut output)
            .unwrap_err();

        assert!(matches!(err, Error::AcceleratorInit(_)));
        assert!(!transformer.session().is_open());
    }
}
