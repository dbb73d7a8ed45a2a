//! Colour conversion coefficient tables.

use crate::error::{Error, Result};
use crate::memory::ContiguousSegment;

/// Q13 fixed-point YCbCr to RGB coefficients.
///
/// Order: luma gain, Cr to R, Cb to G, Cr to G, Cb to B.
pub const YUV2RGB_COEFF: [i16; 5] = [0x2000, 0x2BDD, -0x0AC5, -0x1658, 0x3770];

/// Coefficients in accelerator-addressable memory.
///
/// Written once at allocation and immutable afterwards.
pub struct CoefficientTable {
    segment: ContiguousSegment,
    len: usize,
}

impl CoefficientTable {
    /// Copy `values` into a freshly allocated 128-byte aligned segment.
    pub fn new(values: &[i16]) -> Result<Self> {
        if values.is_empty() {
            return Err(Error::AllocationFailed("empty coefficient table".into()));
        }

        let mut segment =
            ContiguousSegment::with_name("dsp-colorspace-coeff", std::mem::size_of_val(values))?;
        for (chunk, value) in segment.as_mut_slice().chunks_exact_mut(2).zip(values) {
            chunk.copy_from_slice(&value.to_ne_bytes());
        }

        Ok(Self {
            segment,
            len: values.len(),
        })
    }

    /// The standard I420 to RGB565 table.
    pub fn yuv2rgb() -> Result<Self> {
        Self::new(&YUV2RGB_COEFF)
    }

    /// Number of coefficients.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Always false; empty tables cannot be created.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The coefficients.
    pub fn as_slice(&self) -> &[i16] {
        // SAFETY: the mapping is page aligned and holds `len` initialized
        // i16 values written in `new`; nothing mutates it afterwards.
        unsafe { std::slice::from_raw_parts(self.segment.as_ptr().cast::<i16>(), self.len) }
    }

    /// Raw coefficient bytes as the accelerator sees them.
    pub fn as_bytes(&self) -> &[u8] {
        &self.segment.as_slice()[..self.len * 2]
    }

    /// The backing segment.
    pub fn segment(&self) -> &ContiguousSegment {
        &self.segment
    }
}

impl std::fmt::Debug for CoefficientTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoefficientTable")
            .field("values", &self.as_slice())
            .field("segment", &self.segment.id())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::BUFFER_ALIGN;

    #[test]
    fn test_yuv2rgb_table() {
        let table = CoefficientTable::yuv2rgb().unwrap();
        assert_eq!(table.len(), 5);
        assert_eq!(table.as_slice(), &YUV2RGB_COEFF);
        assert_eq!(table.as_bytes().len(), 10);
        assert_eq!(table.segment().as_ptr() as usize % BUFFER_ALIGN, 0);
    }

    #[test]
    fn test_empty_table_rejected() {
        assert!(CoefficientTable::new(&[]).is_err());
    }
}
