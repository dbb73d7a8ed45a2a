//! Error types for dsp-colorspace.

use crate::format::PixelFormat;
use thiserror::Error;

/// Result type alias using the crate's Error.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for colorspace element operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Caps could not be negotiated.
    #[error("format error: {0}")]
    Format(#[from] FormatError),

    /// The accelerator session could not be opened.
    #[error("accelerator init failed: {0}")]
    AcceleratorInit(#[from] AcceleratorInitError),

    /// Output frame pool is exhausted (no free frames).
    #[error("frame pool exhausted: no free output frames")]
    PoolExhausted,

    /// The accelerator rejected or failed the conversion.
    #[error("colorspace conversion failed (accelerator returned {0})")]
    ConversionFailed(i32),

    /// Memory allocation failed.
    #[error("memory allocation failed: {0}")]
    AllocationFailed(String),

    /// A frame was released to a pool that did not issue it.
    #[error("frame does not belong to this pool")]
    ForeignFrame,

    /// Operation not valid in the element's current state.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// Invalid element configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// System call error (via rustix).
    #[error("system error: {0}")]
    System(#[from] rustix::io::Errno),
}

impl Error {
    /// Whether the pipeline may drop the current frame and keep streaming.
    ///
    /// Only pool exhaustion is a per-frame resource error; everything else
    /// surfaces as a hard stream error.
    pub fn is_droppable(&self) -> bool {
        matches!(self, Self::PoolExhausted)
    }
}

/// Caps negotiation failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    /// A required caps field is absent or not fixed.
    #[error("caps field '{0}' is missing or not fixed")]
    MissingField(&'static str),

    /// Input pixel format cannot be converted.
    #[error("unsupported input format {0:?} (only I420 is accepted)")]
    UnsupportedInput(PixelFormat),

    /// Output pixel format cannot be produced.
    #[error("unsupported output format {0:?} (only RGB565 is produced)")]
    UnsupportedOutput(PixelFormat),

    /// Dimensions are zero or not even.
    #[error("invalid dimensions {width}x{height}")]
    InvalidDimensions {
        /// Requested width.
        width: u32,
        /// Requested height.
        height: u32,
    },

    /// Caps string could not be parsed.
    #[error("caps parse error: {0}")]
    Parse(String),

    /// A frame arrived before caps were set.
    #[error("caps have not been negotiated")]
    NotNegotiated,
}

/// Accelerator session setup failures.
///
/// Each variant identifies the setup stage that failed; earlier stages have
/// already been rolled back when this is returned.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AcceleratorInitError {
    /// The engine could not be opened.
    #[error("failed to open engine '{engine}': {reason}")]
    EngineOpen {
        /// Engine name that was requested.
        engine: String,
        /// Backend-specific reason.
        reason: String,
    },

    /// The engine opened but the operation handle could not be created.
    #[error("failed to create accelerator operation on '{engine}': {reason}")]
    OperationCreate {
        /// Engine name that was requested.
        engine: String,
        /// Backend-specific reason.
        reason: String,
    },

    /// The coefficient table could not be allocated.
    #[error("failed to allocate coefficient table: {0}")]
    CoefficientAlloc(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_pool_exhaustion_is_droppable() {
        assert!(Error::PoolExhausted.is_droppable());
        assert!(!Error::ConversionFailed(-1).is_droppable());
        assert!(!Error::from(FormatError::NotNegotiated).is_droppable());
        assert!(
            !Error::from(AcceleratorInitError::CoefficientAlloc("oom".into())).is_droppable()
        );
    }

    #[test]
    fn test_error_messages() {
        let err = Error::from(AcceleratorInitError::EngineOpen {
            engine: "bogus".into(),
            reason: "unknown engine".into(),
        });
        assert_eq!(
            err.to_string(),
            "accelerator init failed: failed to open engine 'bogus': unknown engine"
        );
        assert_eq!(
            Error::ConversionFailed(-3).to_string(),
            "colorspace conversion failed (accelerator returned -3)"
        );
    }
}
