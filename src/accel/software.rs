//! CPU reference engine.
//!
//! Runs the same Q13 fixed-point I420 to RGB565 kernel as the DSP imaging
//! library, so output from this engine and a real accelerator can be compared
//! bit for bit. Registered as [`DEFAULT_ENGINE_NAME`](super::DEFAULT_ENGINE_NAME).

use super::traits::{AccelStatus, AcceleratorEngine, ColorConvertOp};
use super::CoefficientTable;
use crate::error::Result;

/// Rejected geometry (zero or odd dimensions).
pub const STATUS_BAD_DIMENSIONS: AccelStatus = -1;
/// A plane is shorter than the geometry requires.
pub const STATUS_SHORT_PLANE: AccelStatus = -2;
/// The output is shorter than the geometry requires.
pub const STATUS_SHORT_OUTPUT: AccelStatus = -3;
/// The coefficient table has the wrong length.
pub const STATUS_BAD_COEFF: AccelStatus = -4;

/// Engine executing conversions on the CPU.
#[derive(Debug)]
pub struct SoftwareEngine {
    name: String,
}

impl SoftwareEngine {
    /// Create an engine reporting `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl AcceleratorEngine for SoftwareEngine {
    fn name(&self) -> &str {
        &self.name
    }

    fn create_operation(&mut self) -> Result<Box<dyn ColorConvertOp>> {
        Ok(Box::new(SoftwareConvert))
    }
}

/// The CPU conversion operation.
#[derive(Debug, Default)]
pub struct SoftwareConvert;

impl ColorConvertOp for SoftwareConvert {
    fn yuv420pl_to_rgb565(
        &mut self,
        coeff: &CoefficientTable,
        height: u32,
        width: u32,
        y: &[u8],
        cb: &[u8],
        cr: &[u8],
        rgb: &mut [u8],
    ) -> std::result::Result<(), AccelStatus> {
        let &[luma, cr2r, cb2g, cr2g, cb2b] = coeff.as_slice() else {
            return Err(STATUS_BAD_COEFF);
        };
        if width == 0 || height == 0 || width % 2 != 0 || height % 2 != 0 {
            return Err(STATUS_BAD_DIMENSIONS);
        }

        let w = width as usize;
        let h = height as usize;
        let chroma_len = (w / 2) * (h / 2);
        if y.len() < w * h || cb.len() < chroma_len || cr.len() < chroma_len {
            return Err(STATUS_SHORT_PLANE);
        }
        if rgb.len() < w * h * 2 {
            return Err(STATUS_SHORT_OUTPUT);
        }

        let coeff = Coefficients {
            luma: luma.into(),
            cr2r: cr2r.into(),
            cb2g: cb2g.into(),
            cr2g: cr2g.into(),
            cb2b: cb2b.into(),
        };

        for (row, (luma_row, out_row)) in y
            .chunks_exact(w)
            .zip(rgb.chunks_exact_mut(w * 2))
            .take(h)
            .enumerate()
        {
            let chroma_row = (row / 2) * (w / 2);
            for (col, (&luma_sample, out)) in
                luma_row.iter().zip(out_row.chunks_exact_mut(2)).enumerate()
            {
                let chroma = chroma_row + col / 2;
                let pixel = coeff.pixel(luma_sample, cb[chroma], cr[chroma]);
                out.copy_from_slice(&pixel.to_le_bytes());
            }
        }

        Ok(())
    }
}

struct Coefficients {
    luma: i32,
    cr2r: i32,
    cb2g: i32,
    cr2g: i32,
    cb2b: i32,
}

impl Coefficients {
    #[inline]
    fn pixel(&self, y: u8, cb: u8, cr: u8) -> u16 {
        let y = (i32::from(y) - 16) * self.luma;
        let cb = i32::from(cb) - 128;
        let cr = i32::from(cr) - 128;

        let r = saturate((y + self.cr2r * cr) >> 13);
        let g = saturate((y + self.cb2g * cb + self.cr2g * cr) >> 13);
        let b = saturate((y + self.cb2b * cb) >> 13);

        ((r >> 3) << 11) | ((g >> 2) << 5) | (b >> 3)
    }
}

#[inline]
fn saturate(value: i32) -> u16 {
    value.clamp(0, 255) as u16
}
