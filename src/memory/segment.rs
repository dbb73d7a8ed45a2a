//! Accelerator-addressable memory segments.
//!
//! The DSP reads and writes frames through physically shareable memory, so
//! every buffer it touches is backed by `memfd_create` + `mmap(MAP_SHARED)`.
//! The fd can be handed to another process or a device driver while the
//! mapping stays valid in this one.
//!
//! Segment lengths are rounded up to [`BUFFER_ALIGN`]; the mapping itself is
//! page aligned, which satisfies the accelerator's 128-byte requirement.

use crate::error::{Error, Result};
use crate::format::{BUFFER_ALIGN, round_up};
use rustix::fd::{AsFd, BorrowedFd, OwnedFd};
use rustix::mm::{MapFlags, ProtFlags};
use std::ffi::CString;
use std::os::unix::io::{AsRawFd, RawFd};
use std::ptr::NonNull;
use std::sync::atomic::{AtomicU64, Ordering};

/// Global counter for generating unique segment IDs.
static SEGMENT_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

fn next_segment_id() -> u64 {
    SEGMENT_ID_COUNTER.fetch_add(1, Ordering::Relaxed)
}

/// A contiguous, memfd-backed region the accelerator can address directly.
///
/// # Safety
///
/// The segment is `Send + Sync` because the mapping can be accessed from any
/// thread and the fd is reference-counted by the kernel. Mutable access goes
/// through `&mut self`, so Rust's borrow rules provide the synchronization.
pub struct ContiguousSegment {
    /// The memfd file descriptor.
    fd: OwnedFd,
    /// Pointer to the mmap'd region.
    ptr: NonNull<u8>,
    /// Mapped size in bytes (multiple of `BUFFER_ALIGN`).
    len: usize,
    /// Unique ID for this segment.
    id: u64,
}

impl ContiguousSegment {
    /// Allocate a zero-filled segment of at least `size` bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if `size` is 0 or if `memfd_create`, `ftruncate` or
    /// `mmap` fail.
    pub fn new(size: usize) -> Result<Self> {
        Self::with_name("dsp-colorspace", size)
    }

    /// Allocate a segment with a debug name (visible in `/proc/self/fd/`).
    pub fn with_name(name: &str, size: usize) -> Result<Self> {
        if size == 0 {
            return Err(Error::AllocationFailed(
                "size must be greater than 0".into(),
            ));
        }
        let len = round_up(size, BUFFER_ALIGN);

        let cname = CString::new(name).map_err(|e| Error::AllocationFailed(e.to_string()))?;
        let fd = rustix::fs::memfd_create(&cname, rustix::fs::MemfdFlags::CLOEXEC)?;
        rustix::fs::ftruncate(&fd, len as u64)?;

        // SAFETY: fresh mapping of a file we just sized; no aliasing exists yet
        let ptr = unsafe {
            rustix::mm::mmap(
                std::ptr::null_mut(),
                len,
                ProtFlags::READ | ProtFlags::WRITE,
                MapFlags::SHARED,
                &fd,
                0,
            )?
        };

        let ptr = NonNull::new(ptr.cast::<u8>())
            .ok_or_else(|| Error::AllocationFailed("mmap returned null".into()))?;

        Ok(Self {
            fd,
            ptr,
            len,
            id: next_segment_id(),
        })
    }

    /// Mapped length in bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Always false; zero-sized segments cannot be created.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Unique segment ID.
    #[inline]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Base address of the mapping.
    #[inline]
    pub fn as_ptr(&self) -> *const u8 {
        self.ptr.as_ptr()
    }

    /// File descriptor for sharing with another process or a driver.
    #[inline]
    pub fn fd(&self) -> BorrowedFd<'_> {
        self.fd.as_fd()
    }

    /// Raw file descriptor.
    #[inline]
    pub fn raw_fd(&self) -> RawFd {
        self.fd.as_raw_fd()
    }

    /// The whole mapping as a byte slice.
    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        // SAFETY: the mapping is valid for `len` bytes while `self` lives
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }

    /// The whole mapping as a mutable byte slice.
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        // SAFETY: `&mut self` guarantees exclusive access to the mapping
        unsafe { std::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
    }
}

impl Drop for ContiguousSegment {
    fn drop(&mut self) {
        // SAFETY: ptr/len describe the mapping created in `with_name`
        if let Err(e) = unsafe { rustix::mm::munmap(self.ptr.as_ptr().cast(), self.len) } {
            tracing::warn!(segment = self.id, error = %e, "munmap failed");
        }
    }
}

impl std::fmt::Debug for ContiguousSegment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContiguousSegment")
            .field("id", &self.id)
            .field("len", &self.len)
            .field("fd", &self.raw_fd())
            .finish()
    }
}

// SAFETY: see the type-level docs
unsafe impl Send for ContiguousSegment {}
unsafe impl Sync for ContiguousSegment {}
