//! Accelerator access for the I420 to RGB565 conversion.
//!
//! ```text
//! EngineRegistry ──open(name)──▶ AcceleratorEngine
//!                                   │ create_operation()   ──▶ ColorConvertOp
//!                                   │ allocate_table(coeff) ──▶ CoefficientTable
//!                                   ▼
//!                          AcceleratorSession (all three, or none)
//! ```
//!
//! The crate ships [`SoftwareEngine`], a CPU implementation of the DSP
//! kernel, registered as [`DEFAULT_ENGINE_NAME`]. Hardware backends plug in
//! through [`EngineRegistry::register`].

mod coeff;
mod registry;
mod session;
mod software;
mod traits;

pub use coeff::{CoefficientTable, YUV2RGB_COEFF};
pub use registry::{DEFAULT_ENGINE_NAME, EngineRegistry};
pub use session::AcceleratorSession;
pub use software::{
    STATUS_BAD_COEFF, STATUS_BAD_DIMENSIONS, STATUS_SHORT_OUTPUT, STATUS_SHORT_PLANE,
    SoftwareConvert, SoftwareEngine,
};
pub use traits::{AccelStatus, AcceleratorEngine, ColorConvertOp, EngineProvider};
