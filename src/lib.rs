//! # dsp-colorspace
//!
//! A pipeline filter stage that converts planar I420 video frames into packed
//! RGB565 frames on a DSP accelerator.
//!
//! ## Features
//!
//! - **Caps negotiation**: I420 in, RGB565 out, with fixation and size queries
//! - **Pooled output**: Fixed-capacity pool of accelerator-addressable frames
//!   that return themselves when dropped, from any thread
//! - **Lazy accelerator session**: Engine, operation handle and coefficient
//!   table acquired on the first frame, released once at teardown
//! - **Zero-copy input**: Frames already in accelerator memory are used in place
//! - **Linux memory**: memfd_create + mmap segments shareable by fd
//!
//! ## Quick Start
//!
//! ```rust
//! use dsp_colorspace::prelude::*;
//!
//! let mut element = DspColorspace::new();
//!
//! let input: VideoCaps = "video/x-raw-yuv, format=I420, width=320, height=240".parse()?;
//! let output = element.transform_caps(PadDirection::Sink, &input);
//! let output = element.fixate_caps(PadDirection::Sink, &input, &output)?;
//! element.set_caps(&input, &output)?;
//!
//! let i420 = vec![16u8; 320 * 240 * 3 / 2];
//! let rgb = element.process(InputFrame::from(&i420))?;
//! assert_eq!(rgb.size(), 320 * 240 * 2);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_op_in_unsafe_fn)]

pub mod accel;
pub mod config;
pub mod element;
pub mod error;
pub mod format;
pub mod memory;
pub mod negotiation;
pub mod observability;
pub mod transform;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::accel::{AcceleratorSession, EngineRegistry};
    pub use crate::config::ColorspaceConfig;
    pub use crate::element::{BaseTransform, DspColorspace, ElementState};
    pub use crate::error::{Error, Result};
    pub use crate::format::{PixelFormat, VideoCaps};
    pub use crate::memory::{Frame, FrameInfo, FramePool, InputFrame, PooledFrame};
    pub use crate::negotiation::{FormatNegotiator, NegotiatedFormat, PadDirection};
}

pub use error::{Error, Result};
