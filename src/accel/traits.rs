//! Accelerator traits.
//!
//! These traits are the seam between the colorspace element and whatever
//! executes the conversion: a DSP behind a codec engine, or the CPU
//! reference engine shipped with this crate. An engine is opened by name,
//! creates one operation handle, and owns the memory the operation reads its
//! coefficients from.

use super::CoefficientTable;
use crate::error::Result;

/// Status code returned by an accelerator call. Negative means failure.
pub type AccelStatus = i32;

/// An open accelerator engine.
pub trait AcceleratorEngine: Send {
    /// Name the engine was opened under.
    fn name(&self) -> &str;

    /// Create the colour conversion operation handle.
    fn create_operation(&mut self) -> Result<Box<dyn ColorConvertOp>>;

    /// Allocate a coefficient table in memory the engine can address.
    fn allocate_table(&mut self, values: &[i16]) -> Result<CoefficientTable> {
        CoefficientTable::new(values)
    }

    /// Close the engine. Called once, after the operation is closed.
    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

/// A colour conversion operation created by an [`AcceleratorEngine`].
pub trait ColorConvertOp: Send {
    /// Convert one planar YUV 4:2:0 frame to packed RGB565.
    ///
    /// `y` holds `width * height` luma samples; `cb` and `cr` hold one
    /// sample per 2x2 block. `rgb` receives `width * height` little-endian
    /// 16-bit pixels, row after row.
    #[allow(clippy::too_many_arguments)]
    fn yuv420pl_to_rgb565(
        &mut self,
        coeff: &CoefficientTable,
        height: u32,
        width: u32,
        y: &[u8],
        cb: &[u8],
        cr: &[u8],
        rgb: &mut [u8],
    ) -> std::result::Result<(), AccelStatus>;

    /// Release the operation handle.
    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Opens engines by name.
pub trait EngineProvider: Send + Sync {
    /// Open the engine registered as `name`.
    fn open(&self, name: &str) -> Result<Box<dyn AcceleratorEngine>>;
}

impl<F> EngineProvider for F
where
    F: Fn(&str) -> Result<Box<dyn AcceleratorEngine>> + Send + Sync,
{
    fn open(&self, name: &str) -> Result<Box<dyn AcceleratorEngine>> {
        self(name)
    }
}
