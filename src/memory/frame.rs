//! Video frames in accelerator-addressable memory.

use super::ContiguousSegment;
use crate::error::{Error, Result};
use crate::format::PixelFormat;

/// Geometry and format tag carried by every frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameInfo {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Pixel format of the contents.
    pub pixel_format: PixelFormat,
    /// Valid payload size in bytes.
    pub size: usize,
}

impl FrameInfo {
    /// Frame info whose size follows from the format's size formula.
    pub const fn new(width: u32, height: u32, pixel_format: PixelFormat) -> Self {
        Self {
            width,
            height,
            pixel_format,
            size: pixel_format.frame_size(width, height),
        }
    }

    /// Same geometry with an explicit payload size.
    pub const fn with_size(mut self, size: usize) -> Self {
        self.size = size;
        self
    }

    /// Bytes per row as written by the converter.
    ///
    /// Rows are tightly packed: `width * bytes_per_pixel` for packed formats,
    /// and the luma row width for planar ones.
    pub const fn stride(&self) -> usize {
        match self.pixel_format.bytes_per_pixel() {
            Some(bpp) => self.width as usize * bpp,
            None => self.width as usize,
        }
    }

    /// Image bytes at the start of the payload.
    ///
    /// Anything in `image_size()..size` is alignment padding and carries no
    /// pixels.
    pub const fn image_size(&self) -> usize {
        let rows = self.stride() * self.height as usize;
        if self.pixel_format.is_yuv420() {
            rows * 3 / 2
        } else {
            rows
        }
    }
}

/// A frame resident in contiguous, accelerator-addressable memory.
///
/// The backing segment may be larger than [`FrameInfo::size`] because of
/// alignment padding; [`data`](Self::data) only exposes the payload.
#[derive(Debug)]
pub struct Frame {
    segment: ContiguousSegment,
    info: FrameInfo,
}

impl Frame {
    /// Allocate a zeroed frame for `info`.
    pub fn alloc(info: FrameInfo) -> Result<Self> {
        let segment = ContiguousSegment::with_name("dsp-colorspace-frame", info.size)?;
        Ok(Self { segment, info })
    }

    /// Allocate a frame and copy `bytes` into it.
    ///
    /// The payload size becomes `bytes.len()`; `info` supplies geometry.
    pub fn from_bytes(info: FrameInfo, bytes: &[u8]) -> Result<Self> {
        if bytes.is_empty() {
            return Err(Error::AllocationFailed("cannot stage an empty frame".into()));
        }
        let mut frame = Self::alloc(info.with_size(bytes.len()))?;
        frame.data_mut().copy_from_slice(bytes);
        Ok(frame)
    }

    /// Frame geometry and format.
    #[inline]
    pub fn info(&self) -> &FrameInfo {
        &self.info
    }

    /// Width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.info.width
    }

    /// Height in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.info.height
    }

    /// Pixel format.
    #[inline]
    pub fn pixel_format(&self) -> PixelFormat {
        self.info.pixel_format
    }

    /// Payload size in bytes.
    #[inline]
    pub fn size(&self) -> usize {
        self.info.size
    }

    /// Allocated size including alignment padding.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.segment.len()
    }

    /// Payload bytes.
    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.segment.as_slice()[..self.info.size]
    }

    /// Mutable payload bytes.
    #[inline]
    pub fn data_mut(&mut self) -> &mut [u8] {
        let size = self.info.size;
        &mut self.segment.as_mut_slice()[..size]
    }

    /// The backing segment.
    #[inline]
    pub fn segment(&self) -> &ContiguousSegment {
        &self.segment
    }
}

/// An input frame as handed to the transform.
///
/// Contiguous frames are passed to the accelerator as-is; system-memory
/// frames are staged into a scratch [`Frame`] first.
#[derive(Debug, Clone, Copy)]
pub enum InputFrame<'a> {
    /// Already resident in accelerator-addressable memory.
    Contiguous(&'a Frame),
    /// Ordinary process memory.
    System(&'a [u8]),
}

impl InputFrame<'_> {
    /// Whether the frame can be used without staging.
    #[inline]
    pub fn is_contiguous(&self) -> bool {
        matches!(self, Self::Contiguous(_))
    }

    /// Payload size in bytes.
    pub fn len(&self) -> usize {
        match self {
            Self::Contiguous(frame) => frame.size(),
            Self::System(bytes) => bytes.len(),
        }
    }

    /// Returns true if the payload is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Payload bytes.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Contiguous(frame) => frame.data(),
            Self::System(bytes) => bytes,
        }
    }
}

impl<'a> From<&'a Frame> for InputFrame<'a> {
    fn from(frame: &'a Frame) -> Self {
        Self::Contiguous(frame)
    }
}

impl<'a> From<&'a [u8]> for InputFrame<'a> {
    fn from(bytes: &'a [u8]) -> Self {
        Self::System(bytes)
    }
}

impl<'a> From<&'a Vec<u8>> for InputFrame<'a> {
    fn from(bytes: &'a Vec<u8>) -> Self {
        Self::System(bytes.as_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_alloc_pads_capacity() {
        let frame = Frame::alloc(FrameInfo::new(2, 2, PixelFormat::I420)).unwrap();
        assert_eq!(frame.size(), 6);
        assert_eq!(frame.data().len(), 6);
        assert_eq!(frame.capacity(), 128);
    }

    #[test]
    fn test_packed_rows_leave_padding() {
        // 100 * 2 bytes per row rounds up to 224
        let info = FrameInfo::new(100, 10, PixelFormat::Rgb565);
        assert_eq!(info.size, 2240);
        assert_eq!(info.stride(), 200);
        assert_eq!(info.image_size(), 2000);

        let aligned = FrameInfo::new(320, 240, PixelFormat::Rgb565);
        assert_eq!(aligned.image_size(), aligned.size);

        let planar = FrameInfo::new(4, 4, PixelFormat::I420);
        assert_eq!(planar.stride(), 4);
        assert_eq!(planar.image_size(), 24);
    }

    #[test]
    fn test_frame_from_bytes() {
        let bytes: Vec<u8> = (0..24u8).collect();
        let frame = Frame::from_bytes(FrameInfo::new(4, 4, PixelFormat::I420), &bytes).unwrap();
        assert_eq!(frame.data(), bytes.as_slice());
        assert_eq!(frame.width(), 4);
        assert_eq!(frame.pixel_format(), PixelFormat::I420);
    }

    #[test]
    fn test_frame_from_empty_bytes_fails() {
        let info = FrameInfo::new(4, 4, PixelFormat::I420);
        assert!(Frame::from_bytes(info, &[]).is_err());
    }

    #[test]
    fn test_input_frame_variants() {
        let frame = Frame::alloc(FrameInfo::new(4, 4, PixelFormat::I420)).unwrap();
        let contiguous = InputFrame::from(&frame);
        assert!(contiguous.is_contiguous());
        assert_eq!(contiguous.len(), 24);

        let bytes = vec![1u8; 24];
        let system = InputFrame::from(&bytes);
        assert!(!system.is_contiguous());
        assert_eq!(system.as_bytes(), bytes.as_slice());
    }
}
