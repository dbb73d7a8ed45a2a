//! Pipeline stage: the transform interface and the colorspace element.

mod colorspace;
mod traits;

pub use colorspace::{ColorspaceStats, DspColorspace};
pub use traits::{BaseTransform, ElementState};
