//! Memory management for the colorspace element.
//!
//! Everything the accelerator reads or writes lives in contiguous memfd
//! mappings:
//!
//! - [`ContiguousSegment`]: One accelerator-addressable mapping
//! - [`Frame`]: A segment tagged with geometry and pixel format
//! - [`FramePool`]: Fixed-capacity pool of output frames
//! - [`PooledFrame`]: RAII loan that returns its frame to the pool on drop
//! - [`PoolSignal`]: Broadcast hint raised when an exhausted pool frees a frame

mod buffer_pool;
mod frame;
mod segment;
mod signal;

pub use buffer_pool::{FramePool, PoolStats, PooledFrame};
pub use frame::{Frame, FrameInfo, InputFrame};
pub use segment::ContiguousSegment;
pub use signal::PoolSignal;
