//! Fixed-capacity pool of accelerator-addressable output frames.
//!
//! The pool pre-allocates every output frame when caps are set and hands
//! them out as [`PooledFrame`]s. A pooled frame carries an `Arc`
//! back-reference to the pool that issued it, so whichever pipeline stage
//! finishes with it last returns it simply by dropping it, possibly on a
//! different thread than the one that acquired it.
//!
//! # Design
//!
//! - Capacity is fixed at construction; reconfiguring means building a new pool
//! - `acquire()` never blocks: an empty free list is `Error::PoolExhausted`
//! - The free list, issued count and statistics sit behind one mutex
//! - Going from fully issued to one free frame raises the shared [`PoolSignal`]
//!
//! # Example
//!
//! ```rust
//! use dsp_colorspace::format::PixelFormat;
//! use dsp_colorspace::memory::{FrameInfo, FramePool, PoolSignal};
//! use std::sync::Arc;
//!
//! let info = FrameInfo::new(320, 240, PixelFormat::Rgb565);
//! let pool = FramePool::new(info, 2, Arc::new(PoolSignal::new())).unwrap();
//!
//! let frame = pool.acquire().unwrap();
//! assert_eq!(frame.size(), 320 * 240 * 2);
//! assert_eq!(pool.available(), 1);
//!
//! // Returns to the pool
//! drop(frame);
//! assert_eq!(pool.available(), 2);
//! ```

use super::{Frame, FrameInfo, PoolSignal};
use crate::error::{Error, Result};
use std::mem::ManuallyDrop;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

/// Global counter for generating unique pool IDs.
static POOL_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Statistics about pool usage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Total frames in the pool.
    pub capacity: usize,
    /// Frames on the free list.
    pub available: usize,
    /// Frames on loan to consumers.
    pub issued: usize,
    /// Successful acquisitions.
    pub acquisitions: u64,
    /// Frames returned to the pool.
    pub releases: u64,
    /// Acquisitions that failed because the pool was empty.
    pub exhaustions: u64,
}

/// Shared pool state (referenced by both the pool and its issued frames).
struct PoolInner {
    /// Unique pool ID.
    id: u64,
    /// Geometry of every frame in the pool.
    frame_info: FrameInfo,
    /// Number of frames the pool owns.
    capacity: usize,
    /// Free list and counters.
    state: Mutex<PoolState>,
    /// Raised when a frame becomes free after exhaustion.
    signal: Arc<PoolSignal>,
}

struct PoolState {
    free: Vec<Frame>,
    issued: usize,
    acquisitions: u64,
    releases: u64,
    exhaustions: u64,
}

impl PoolInner {
    fn lock(&self) -> MutexGuard<'_, PoolState> {
        // Counters stay consistent even if a holder panicked
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn give_back(&self, frame: Frame) {
        let was_exhausted = {
            let mut state = self.lock();
            let was_exhausted = state.free.is_empty();
            state.free.push(frame);
            state.issued -= 1;
            state.releases += 1;
            was_exhausted
        };

        tracing::trace!(pool = self.id, "frame released");

        if was_exhausted {
            self.signal.raise();
        }
    }
}

/// A fixed-capacity pool of output frames.
pub struct FramePool {
    inner: Arc<PoolInner>,
}

impl FramePool {
    /// Allocate `capacity` frames described by `frame_info`.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if `capacity` is 0, or an allocation error if
    /// a frame cannot be created (already allocated frames are freed).
    pub fn new(frame_info: FrameInfo, capacity: usize, signal: Arc<PoolSignal>) -> Result<Arc<Self>> {
        if capacity == 0 {
            return Err(Error::Config("pool capacity must be at least 1".into()));
        }

        let free = (0..capacity)
            .map(|_| Frame::alloc(frame_info))
            .collect::<Result<Vec<_>>>()?;

        let id = POOL_ID_COUNTER.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(
            pool = id,
            capacity,
            frame_size = frame_info.size,
            "created frame pool"
        );

        Ok(Arc::new(Self {
            inner: Arc::new(PoolInner {
                id,
                frame_info,
                capacity,
                state: Mutex::new(PoolState {
                    free,
                    issued: 0,
                    acquisitions: 0,
                    releases: 0,
                    exhaustions: 0,
                }),
                signal,
            }),
        }))
    }

    /// Take a free frame without blocking.
    ///
    /// # Errors
    ///
    /// Returns `Error::PoolExhausted` when every frame is issued.
    pub fn acquire(&self) -> Result<PooledFrame> {
        let mut state = self.inner.lock();
        let Some(frame) = state.free.pop() else {
            state.exhaustions += 1;
            return Err(Error::PoolExhausted);
        };
        state.issued += 1;
        state.acquisitions += 1;
        debug_assert!(state.issued <= self.inner.capacity);
        drop(state);

        Ok(PooledFrame {
            frame: ManuallyDrop::new(frame),
            pool: self.inner.clone(),
        })
    }

    /// Return a frame to this pool.
    ///
    /// # Errors
    ///
    /// Returns `Error::ForeignFrame` if the frame was issued by another pool.
    /// The frame still goes back to the pool that issued it.
    pub fn release(&self, frame: PooledFrame) -> Result<()> {
        if !frame.belongs_to(self) {
            tracing::warn!(
                pool = self.inner.id,
                owner = frame.pool.id,
                "released frame does not belong to this pool"
            );
            return Err(Error::ForeignFrame);
        }
        drop(frame);
        Ok(())
    }

    /// Unique pool ID.
    pub fn id(&self) -> u64 {
        self.inner.id
    }

    /// Geometry of the pool's frames.
    pub fn frame_info(&self) -> FrameInfo {
        self.inner.frame_info
    }

    /// Total number of frames.
    pub fn capacity(&self) -> usize {
        self.inner.capacity
    }

    /// Frames currently on the free list.
    pub fn available(&self) -> usize {
        self.inner.lock().free.len()
    }

    /// Frames currently on loan.
    pub fn issued(&self) -> usize {
        self.inner.lock().issued
    }

    /// The pool's state-change signal.
    pub fn signal(&self) -> &Arc<PoolSignal> {
        &self.inner.signal
    }

    /// Snapshot of pool statistics.
    pub fn stats(&self) -> PoolStats {
        let state = self.inner.lock();
        PoolStats {
            capacity: self.inner.capacity,
            available: state.free.len(),
            issued: state.issued,
            acquisitions: state.acquisitions,
            releases: state.releases,
            exhaustions: state.exhaustions,
        }
    }
}

impl Drop for FramePool {
    fn drop(&mut self) {
        let issued = self.issued();
        if issued > 0 {
            // Outstanding frames keep the shared state alive until released
            tracing::debug!(pool = self.inner.id, issued, "pool dropped with frames on loan");
        }
    }
}

impl std::fmt::Debug for FramePool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FramePool")
            .field("id", &self.inner.id)
            .field("capacity", &self.inner.capacity)
            .field("frame_info", &self.inner.frame_info)
            .finish()
    }
}

/// An output frame on loan from a [`FramePool`].
///
/// Dropping the handle returns the frame to the pool that issued it, exactly
/// once, from whichever thread drops it.
pub struct PooledFrame {
    frame: ManuallyDrop<Frame>,
    pool: Arc<PoolInner>,
}

impl PooledFrame {
    /// ID of the pool that issued this frame.
    pub fn pool_id(&self) -> u64 {
        self.pool.id
    }

    /// Whether `pool` issued this frame.
    pub fn belongs_to(&self, pool: &FramePool) -> bool {
        Arc::ptr_eq(&self.pool, &pool.inner)
    }

    /// Return the frame to its pool now.
    pub fn release(self) {
        drop(self);
    }
}

impl Deref for PooledFrame {
    type Target = Frame;

    fn deref(&self) -> &Frame {
        &self.frame
    }
}

impl DerefMut for PooledFrame {
    fn deref_mut(&mut self) -> &mut Frame {
        &mut self.frame
    }
}

impl Drop for PooledFrame {
    fn drop(&mut self) {
        // SAFETY: `frame` is never touched again after this
        let frame = unsafe { ManuallyDrop::take(&mut self.frame) };
        self.pool.give_back(frame);
    }
}

impl std::fmt::Debug for PooledFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PooledFrame")
            .field("pool", &self.pool.id)
            .field("info", self.frame.info())
            .finish()
    }
}
