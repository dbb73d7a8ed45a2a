//! Video format and capabilities types.
//!
//! This module provides the type-safe format descriptions used during caps
//! negotiation and the frame size math the accelerator buffers depend on.
//!
//! # Caps Negotiation
//!
//! - [`CapsValue<T>`]: A value that can be fixed, range, list, or any
//! - [`VideoCaps`]: Video format with constraints, parseable from the usual
//!   textual caps notation
//!
//! ```rust
//! use dsp_colorspace::format::{PixelFormat, VideoCaps};
//!
//! let caps: VideoCaps = "video/x-raw-yuv, format=I420, width=320, height=240"
//!     .parse()
//!     .unwrap();
//! assert_eq!(caps.pixel_format.as_fixed(), Some(&PixelFormat::I420));
//! assert_eq!(caps.width.as_fixed(), Some(&320));
//! ```

use crate::error::FormatError;
use std::fmt;
use std::str::FromStr;
use winnow::Parser;
use winnow::ascii::{digit1, multispace0};
use winnow::combinator::{alt, delimited, opt, separated};
use winnow::error::ContextError;
use winnow::token::take_while;

type WResult<T> = std::result::Result<T, ContextError>;

/// Row stride alignment (bytes) required by the accelerator for packed formats.
pub const STRIDE_ALIGN: usize = 32;

/// Memory alignment (bytes) for accelerator-addressable buffers.
pub const BUFFER_ALIGN: usize = 128;

/// Round `value` up to the next multiple of `align` (a power of two).
#[inline]
pub const fn round_up(value: usize, align: usize) -> usize {
    (value + align - 1) & !(align - 1)
}

// ============================================================================
// CapsValue - constraint value for negotiation
// ============================================================================

/// A value that can be fixed, range, list, or any.
///
/// Used in caps negotiation to express constraints on format parameters.
///
/// # Examples
///
/// ```rust
/// use dsp_colorspace::format::CapsValue;
///
/// let range: CapsValue<u32> = CapsValue::Range { min: 16, max: 1920 };
/// assert_eq!(range.fixate_nearest(&4096), 1920);
///
/// let list: CapsValue<u32> = CapsValue::List(vec![176, 320, 640]);
/// assert_eq!(list.fixate_nearest(&300), 320);
/// ```
#[derive(Clone, Debug, PartialEq, Default)]
pub enum CapsValue<T> {
    /// Exact value (fully constrained).
    Fixed(T),
    /// Range of acceptable values (inclusive).
    Range {
        /// Minimum acceptable value.
        min: T,
        /// Maximum acceptable value.
        max: T,
    },
    /// List of acceptable values (ordered by preference, first is best).
    List(Vec<T>),
    /// Any value accepted (unconstrained).
    #[default]
    Any,
}

impl<T: Clone + Ord> CapsValue<T> {
    /// Check if a value is accepted by this constraint.
    pub fn accepts(&self, value: &T) -> bool {
        match self {
            Self::Fixed(v) => v == value,
            Self::Range { min, max } => value >= min && value <= max,
            Self::List(values) => values.contains(value),
            Self::Any => true,
        }
    }

    /// Intersect two constraints, finding common values.
    ///
    /// Returns `None` if there's no overlap.
    pub fn intersect(&self, other: &Self) -> Option<Self> {
        match (self, other) {
            (Self::Any, other) => Some(other.clone()),
            (self_, Self::Any) => Some(self_.clone()),

            (Self::Fixed(v), other) | (other, Self::Fixed(v)) => {
                other.accepts(v).then(|| Self::Fixed(v.clone()))
            }

            (
                Self::Range {
                    min: min1,
                    max: max1,
                },
                Self::Range {
                    min: min2,
                    max: max2,
                },
            ) => {
                let new_min = min1.max(min2);
                let new_max = max1.min(max2);
                if new_min > new_max {
                    None
                } else if new_min == new_max {
                    Some(Self::Fixed(new_min.clone()))
                } else {
                    Some(Self::Range {
                        min: new_min.clone(),
                        max: new_max.clone(),
                    })
                }
            }

            (range @ Self::Range { .. }, Self::List(list))
            | (Self::List(list), range @ Self::Range { .. }) => {
                Self::from_candidates(list.iter().filter(|v| range.accepts(v)).cloned())
            }

            (Self::List(list1), Self::List(list2)) => {
                Self::from_candidates(list1.iter().filter(|v| list2.contains(v)).cloned())
            }
        }
    }

    fn from_candidates(values: impl Iterator<Item = T>) -> Option<Self> {
        let mut values: Vec<T> = values.collect();
        match values.len() {
            0 => None,
            1 => values.pop().map(Self::Fixed),
            _ => Some(Self::List(values)),
        }
    }

    /// Fixate: choose a single value from the constraint.
    ///
    /// Returns the preferred value (first in list, min in range).
    /// Returns `None` for `Any` (cannot fixate without default).
    pub fn fixate(&self) -> Option<T> {
        match self {
            Self::Fixed(v) => Some(v.clone()),
            Self::Range { min, .. } => Some(min.clone()),
            Self::List(values) => values.first().cloned(),
            Self::Any => None,
        }
    }

    /// Check if this is a fixed value.
    #[inline]
    pub fn is_fixed(&self) -> bool {
        matches!(self, Self::Fixed(_))
    }

    /// Check if this accepts any value.
    #[inline]
    pub fn is_any(&self) -> bool {
        matches!(self, Self::Any)
    }

    /// Get the fixed value if this is fixed.
    #[inline]
    pub fn as_fixed(&self) -> Option<&T> {
        match self {
            Self::Fixed(v) => Some(v),
            _ => None,
        }
    }
}

/// Values that have a notion of closeness, used to fixate towards a target.
pub trait Nearest: Clone + Ord {
    /// Distance between two values (non-negative).
    fn distance(&self, other: &Self) -> f64;
}

impl Nearest for u32 {
    fn distance(&self, other: &Self) -> f64 {
        self.abs_diff(*other) as f64
    }
}

impl Nearest for Framerate {
    fn distance(&self, other: &Self) -> f64 {
        (self.fps() - other.fps()).abs()
    }
}

impl<T: Nearest> CapsValue<T> {
    /// Fixate to the accepted value nearest to `target`.
    ///
    /// Ranges clamp, lists pick the closest entry (earliest on ties) and
    /// `Any` takes the target itself.
    pub fn fixate_nearest(&self, target: &T) -> T {
        match self {
            Self::Fixed(v) => v.clone(),
            Self::Range { min, max } if min <= max => {
                target.clone().clamp(min.clone(), max.clone())
            }
            Self::Range { min, .. } => min.clone(),
            Self::List(values) => values
                .iter()
                .min_by(|a, b| a.distance(target).total_cmp(&b.distance(target)))
                .cloned()
                .unwrap_or_else(|| target.clone()),
            Self::Any => target.clone(),
        }
    }
}

impl<T: Clone + Ord> From<T> for CapsValue<T> {
    fn from(value: T) -> Self {
        Self::Fixed(value)
    }
}

impl<T: Clone + Ord> From<std::ops::RangeInclusive<T>> for CapsValue<T> {
    fn from(range: std::ops::RangeInclusive<T>) -> Self {
        let (min, max) = range.into_inner();
        Self::Range { min, max }
    }
}

impl<T: fmt::Display> fmt::Display for CapsValue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixed(v) => write!(f, "{v}"),
            Self::Range { min, max } => write!(f, "[ {min}, {max} ]"),
            Self::List(values) => {
                write!(f, "{{ ")?;
                for (i, v) in values.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{v}")?;
                }
                write!(f, " }}")
            }
            Self::Any => write!(f, "ANY"),
        }
    }
}

// ============================================================================
// Pixel formats
// ============================================================================

/// Pixel formats (color space and memory layout).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
#[repr(u8)]
pub enum PixelFormat {
    /// YUV 4:2:0 planar (Y plane, then Cb plane, then Cr plane).
    #[default]
    I420 = 0,
    /// YUV 4:2:0 semi-planar (Y plane, then interleaved CbCr plane).
    Nv12,
    /// YUV 4:2:2 packed (Y0 U Y1 V).
    Yuyv,
    /// YUV 4:2:2 packed (U Y0 V Y1).
    Uyvy,
    /// RGB 5:6:5 packed into 16 bits per pixel.
    Rgb565,
    /// RGB 8-bit per channel, packed (24 bits/pixel).
    Rgb24,
    /// RGBA 8-bit per channel, packed (32 bits/pixel).
    Rgba,
}

impl PixelFormat {
    /// Canonical caps name of the format.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::I420 => "I420",
            Self::Nv12 => "NV12",
            Self::Yuyv => "YUY2",
            Self::Uyvy => "UYVY",
            Self::Rgb565 => "RGB16",
            Self::Rgb24 => "RGB",
            Self::Rgba => "RGBA",
        }
    }

    /// Look a format up by its caps name (case-insensitive, common aliases).
    pub fn from_name(name: &str) -> Option<Self> {
        let format = match name.to_ascii_uppercase().as_str() {
            "I420" | "IYUV" | "YUV420P" => Self::I420,
            "NV12" => Self::Nv12,
            "YUY2" | "YUYV" => Self::Yuyv,
            "UYVY" => Self::Uyvy,
            "RGB16" | "RGB565" => Self::Rgb565,
            "RGB" | "RGB24" => Self::Rgb24,
            "RGBA" => Self::Rgba,
            _ => return None,
        };
        Some(format)
    }

    /// Whether this is a 4:2:0 planar or semi-planar YUV layout.
    #[inline]
    pub const fn is_yuv420(&self) -> bool {
        matches!(self, Self::I420 | Self::Nv12)
    }

    /// Bytes per pixel for packed formats, `None` for planar layouts.
    pub const fn bytes_per_pixel(&self) -> Option<usize> {
        match self {
            Self::I420 | Self::Nv12 => None,
            Self::Yuyv | Self::Uyvy | Self::Rgb565 => Some(2),
            Self::Rgb24 => Some(3),
            Self::Rgba => Some(4),
        }
    }

    /// Row stride in bytes.
    ///
    /// Packed rows are padded to [`STRIDE_ALIGN`]; the luma row of planar
    /// formats is one byte per pixel with no padding.
    pub const fn line_length(&self, width: u32) -> usize {
        match self.bytes_per_pixel() {
            Some(bpp) => round_up(width as usize * bpp, STRIDE_ALIGN),
            None => width as usize,
        }
    }

    /// Size in bytes of one frame of this format.
    pub const fn frame_size(&self, width: u32, height: u32) -> usize {
        let h = height as usize;
        if self.is_yuv420() {
            self.line_length(width) * h * 3 / 2
        } else {
            self.line_length(width) * h
        }
    }

    /// Caps media type the format is advertised under.
    pub const fn media_type(&self) -> &'static str {
        match self {
            Self::I420 | Self::Nv12 | Self::Yuyv | Self::Uyvy => "video/x-raw-yuv",
            Self::Rgb565 | Self::Rgb24 | Self::Rgba => "video/x-raw-rgb",
        }
    }
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// Framerate
// ============================================================================

/// Frame rate as numerator/denominator (8 bytes, Copy).
///
/// Equality, ordering and hashing go by value, so `60/2 == 30/1`.
#[derive(Clone, Copy, Debug)]
pub struct Framerate {
    /// Numerator (frames).
    pub num: u32,
    /// Denominator (time units).
    pub den: u32,
}

impl Framerate {
    /// Create a new framerate.
    pub const fn new(num: u32, den: u32) -> Self {
        Self { num, den }
    }

    /// 25 fps (PAL).
    pub const FPS_25: Self = Self::new(25, 1);
    /// 30 fps.
    pub const FPS_30: Self = Self::new(30, 1);
    /// 29.97 fps (NTSC).
    pub const FPS_29_97: Self = Self::new(30000, 1001);

    /// Get the framerate as a floating-point value.
    #[inline]
    pub fn fps(&self) -> f64 {
        self.num as f64 / self.den.max(1) as f64
    }

    /// The same rate with numerator and denominator divided by their GCD.
    pub const fn reduced(&self) -> Self {
        let (mut a, mut b) = (self.num, self.den);
        while b != 0 {
            let rem = a % b;
            a = b;
            b = rem;
        }
        if a == 0 {
            return *self;
        }
        Self::new(self.num / a, self.den / a)
    }
}

impl Default for Framerate {
    fn default() -> Self {
        Self::FPS_30
    }
}

impl PartialEq for Framerate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == std::cmp::Ordering::Equal
    }
}

impl Eq for Framerate {}

impl std::hash::Hash for Framerate {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        let reduced = self.reduced();
        reduced.num.hash(state);
        reduced.den.hash(state);
    }
}

impl PartialOrd for Framerate {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Framerate {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // a/b vs c/d => a*d vs c*b; 0/0 sorts below every other rate
        let lhs = (self.num as u64) * (other.den as u64);
        let rhs = (other.num as u64) * (self.den as u64);
        let undefined = |f: &Self| f.num == 0 && f.den == 0;
        lhs.cmp(&rhs)
            .then_with(|| undefined(other).cmp(&undefined(self)))
    }
}

impl fmt::Display for Framerate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.num, self.den)
    }
}

// ============================================================================
// VideoCaps - constraint-based video description
// ============================================================================

/// Video format with constraints for negotiation.
///
/// Each field can be fixed, a range, a list of options, or any value.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct VideoCaps {
    /// Width constraint.
    pub width: CapsValue<u32>,
    /// Height constraint.
    pub height: CapsValue<u32>,
    /// Pixel format constraint.
    pub pixel_format: CapsValue<PixelFormat>,
    /// Framerate constraint.
    pub framerate: CapsValue<Framerate>,
}

impl VideoCaps {
    /// Create caps that accept any video format.
    pub fn any() -> Self {
        Self::default()
    }

    /// Caps for one pixel format at any size and rate.
    pub fn with_format(pixel_format: PixelFormat) -> Self {
        Self {
            pixel_format: CapsValue::Fixed(pixel_format),
            ..Self::any()
        }
    }

    /// Set a specific size.
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = CapsValue::Fixed(width);
        self.height = CapsValue::Fixed(height);
        self
    }

    /// Set a specific framerate.
    pub fn with_framerate(mut self, framerate: Framerate) -> Self {
        self.framerate = CapsValue::Fixed(framerate);
        self
    }

    /// Intersect with another video caps.
    ///
    /// Returns `None` if any field has no common value.
    pub fn intersect(&self, other: &Self) -> Option<Self> {
        Some(Self {
            width: self.width.intersect(&other.width)?,
            height: self.height.intersect(&other.height)?,
            pixel_format: self.pixel_format.intersect(&other.pixel_format)?,
            framerate: self.framerate.intersect(&other.framerate)?,
        })
    }

    /// Check if fully fixed.
    pub fn is_fixed(&self) -> bool {
        self.width.is_fixed()
            && self.height.is_fixed()
            && self.pixel_format.is_fixed()
            && self.framerate.is_fixed()
    }
}

impl fmt::Display for VideoCaps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let media_type = match &self.pixel_format {
            CapsValue::Fixed(pf) => pf.media_type(),
            _ => "video/x-raw",
        };
        write!(f, "{media_type}")?;
        if !self.pixel_format.is_any() {
            write!(f, ", format={}", self.pixel_format)?;
        }
        if !self.width.is_any() {
            write!(f, ", width={}", self.width)?;
        }
        if !self.height.is_any() {
            write!(f, ", height={}", self.height)?;
        }
        if !self.framerate.is_any() {
            write!(f, ", framerate={}", self.framerate)?;
        }
        Ok(())
    }
}

impl FromStr for VideoCaps {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (media_type, fields) = caps_structure
            .parse(s.trim())
            .map_err(|e| FormatError::Parse(format!("{e}")))?;

        let mut caps = VideoCaps::any();
        let mut bpp = None;

        for (name, value) in fields {
            match name.as_str() {
                "width" => caps.width = value.to_u32_caps("width")?,
                "height" => caps.height = value.to_u32_caps("height")?,
                "framerate" => caps.framerate = value.to_framerate_caps()?,
                "format" => caps.pixel_format = value.to_format_caps()?,
                "bpp" => bpp = value.as_int(),
                // depth, endianness, masks and the like carry no extra information here
                _ => {}
            }
        }

        if caps.pixel_format.is_any() {
            caps.pixel_format = match (media_type.as_str(), bpp) {
                ("video/x-raw-rgb", Some(16)) => CapsValue::Fixed(PixelFormat::Rgb565),
                ("video/x-raw-rgb", Some(24)) => CapsValue::Fixed(PixelFormat::Rgb24),
                ("video/x-raw-rgb", Some(32)) => CapsValue::Fixed(PixelFormat::Rgba),
                ("video/x-raw-rgb", _) => CapsValue::List(vec![
                    PixelFormat::Rgb565,
                    PixelFormat::Rgb24,
                    PixelFormat::Rgba,
                ]),
                ("video/x-raw-yuv", _) => CapsValue::List(vec![
                    PixelFormat::I420,
                    PixelFormat::Nv12,
                    PixelFormat::Yuyv,
                    PixelFormat::Uyvy,
                ]),
                ("video/x-raw", _) => CapsValue::Any,
                (other, _) => {
                    return Err(FormatError::Parse(format!(
                        "unsupported media type '{other}'"
                    )));
                }
            };
        }

        Ok(caps)
    }
}

// ============================================================================
// Caps string parser
// ============================================================================

/// Raw field value before it is typed against its field name.
#[derive(Debug, Clone, PartialEq)]
enum RawValue {
    Int(i64),
    Fraction(u32, u32),
    Word(String),
    Range(Box<RawValue>, Box<RawValue>),
    List(Vec<RawValue>),
}

impl RawValue {
    fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    fn to_u32(&self, field: &'static str) -> Result<u32, FormatError> {
        match self {
            Self::Int(v) => u32::try_from(*v)
                .map_err(|_| FormatError::Parse(format!("{field} out of range: {v}"))),
            other => Err(FormatError::Parse(format!(
                "{field} must be an integer, got {other:?}"
            ))),
        }
    }

    fn to_framerate(&self) -> Result<Framerate, FormatError> {
        match self {
            Self::Fraction(num, den) => Ok(Framerate::new(*num, *den)),
            Self::Int(v) => u32::try_from(*v)
                .map(|num| Framerate::new(num, 1))
                .map_err(|_| FormatError::Parse(format!("framerate out of range: {v}"))),
            other => Err(FormatError::Parse(format!(
                "framerate must be a fraction, got {other:?}"
            ))),
        }
    }

    fn to_format(&self) -> Result<PixelFormat, FormatError> {
        match self {
            Self::Word(name) => PixelFormat::from_name(name)
                .ok_or_else(|| FormatError::Parse(format!("unknown pixel format '{name}'"))),
            other => Err(FormatError::Parse(format!(
                "format must be a name, got {other:?}"
            ))),
        }
    }

    fn to_caps<T, F>(&self, convert: F) -> Result<CapsValue<T>, FormatError>
    where
        T: Clone + Ord,
        F: Fn(&RawValue) -> Result<T, FormatError>,
    {
        Ok(match self {
            Self::Range(min, max) => CapsValue::Range {
                min: convert(min)?,
                max: convert(max)?,
            },
            Self::List(values) => CapsValue::List(
                values
                    .iter()
                    .map(&convert)
                    .collect::<Result<Vec<_>, _>>()?,
            ),
            scalar => CapsValue::Fixed(convert(scalar)?),
        })
    }

    fn to_u32_caps(&self, field: &'static str) -> Result<CapsValue<u32>, FormatError> {
        self.to_caps(|v| v.to_u32(field))
    }

    fn to_framerate_caps(&self) -> Result<CapsValue<Framerate>, FormatError> {
        self.to_caps(RawValue::to_framerate)
    }

    fn to_format_caps(&self) -> Result<CapsValue<PixelFormat>, FormatError> {
        self.to_caps(RawValue::to_format)
    }
}

/// Parse `media/type, field=value, ...`.
fn caps_structure(input: &mut &str) -> WResult<(String, Vec<(String, RawValue)>)> {
    let media_type: &str =
        take_while(1.., |c: char| c.is_alphanumeric() || matches!(c, '/' | '-' | '_'))
            .parse_next(input)?;
    let _ = multispace0.parse_next(input)?;

    let mut fields = Vec::new();
    while opt(separator).parse_next(input)?.is_some() {
        fields.push(field.parse_next(input)?);
        let _ = multispace0.parse_next(input)?;
    }

    Ok((media_type.to_string(), fields))
}

fn separator(input: &mut &str) -> WResult<()> {
    let _ = multispace0.parse_next(input)?;
    let _ = ','.parse_next(input)?;
    let _ = multispace0.parse_next(input)?;
    Ok(())
}

/// Parse `name=(type)value`; the type annotation is optional and ignored.
fn field(input: &mut &str) -> WResult<(String, RawValue)> {
    let name: &str = identifier.parse_next(input)?;
    let _ = multispace0.parse_next(input)?;
    let _ = '='.parse_next(input)?;
    let _ = multispace0.parse_next(input)?;
    let _ = opt(delimited('(', identifier, ')')).parse_next(input)?;
    let _ = multispace0.parse_next(input)?;
    let value = raw_value.parse_next(input)?;
    Ok((name.to_string(), value))
}

fn identifier<'a>(input: &mut &'a str) -> WResult<&'a str> {
    take_while(1.., |c: char| c.is_alphanumeric() || c == '_' || c == '-').parse_next(input)
}

fn raw_value(input: &mut &str) -> WResult<RawValue> {
    alt((range_value, list_value, scalar_value)).parse_next(input)
}

fn range_value(input: &mut &str) -> WResult<RawValue> {
    let _ = ('[', multispace0).parse_next(input)?;
    let min = scalar_value.parse_next(input)?;
    separator.parse_next(input)?;
    let max = scalar_value.parse_next(input)?;
    let _ = (multispace0, ']').parse_next(input)?;
    Ok(RawValue::Range(Box::new(min), Box::new(max)))
}

fn list_value(input: &mut &str) -> WResult<RawValue> {
    let _ = ('{', multispace0).parse_next(input)?;
    let values: Vec<RawValue> = separated(1.., scalar_value, separator).parse_next(input)?;
    let _ = (multispace0, '}').parse_next(input)?;
    Ok(RawValue::List(values))
}

fn scalar_value(input: &mut &str) -> WResult<RawValue> {
    alt((
        fraction.map(|(n, d)| RawValue::Fraction(n, d)),
        integer.map(RawValue::Int),
        identifier.map(|s: &str| RawValue::Word(s.to_string())),
    ))
    .parse_next(input)
}

fn fraction(input: &mut &str) -> WResult<(u32, u32)> {
    let num: &str = digit1.parse_next(input)?;
    let _ = '/'.parse_next(input)?;
    let den: &str = digit1.parse_next(input)?;
    let num = num.parse().map_err(|_| ContextError::new())?;
    let den = den.parse().map_err(|_| ContextError::new())?;
    Ok((num, den))
}

fn integer(input: &mut &str) -> WResult<i64> {
    let negative = opt('-').parse_next(input)?;
    let digits: &str = digit1.parse_next(input)?;
    // Identifiers such as "0x..." masks start with a digit
    if input.starts_with(|c: char| c.is_alphanumeric()) {
        return Err(ContextError::new());
    }
    let value: i64 = digits.parse().map_err(|_| ContextError::new())?;
    Ok(if negative.is_some() { -value } else { value })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rgb565_frame_size() {
        assert_eq!(PixelFormat::Rgb565.frame_size(320, 240), 320 * 240 * 2);
        // 100 px * 2 bytes = 200, padded to 224
        assert_eq!(PixelFormat::Rgb565.line_length(100), 224);
        assert_eq!(PixelFormat::Rgb565.frame_size(100, 10), 2240);
    }

    #[test]
    fn test_i420_frame_size() {
        assert_eq!(PixelFormat::I420.frame_size(320, 240), 320 * 240 * 3 / 2);
        assert_eq!(PixelFormat::I420.line_length(320), 320);
    }

    #[test]
    fn test_round_up() {
        assert_eq!(round_up(10, 128), 128);
        assert_eq!(round_up(128, 128), 128);
        assert_eq!(round_up(129, 128), 256);
        assert_eq!(round_up(0, 32), 0);
    }

    #[test]
    fn test_caps_value_intersect() {
        let fixed: CapsValue<u32> = CapsValue::Fixed(320);
        let range: CapsValue<u32> = CapsValue::Range { min: 16, max: 1920 };
        assert_eq!(fixed.intersect(&range), Some(CapsValue::Fixed(320)));

        let list = CapsValue::List(vec![176, 320, 4096]);
        assert_eq!(
            range.intersect(&list),
            Some(CapsValue::List(vec![176, 320]))
        );
        assert_eq!(CapsValue::Fixed(5u32).intersect(&range), None);
    }

    #[test]
    fn test_fixate_nearest() {
        let range: CapsValue<u32> = CapsValue::Range { min: 16, max: 720 };
        assert_eq!(range.fixate_nearest(&320), 320);
        assert_eq!(range.fixate_nearest(&8), 16);
        assert_eq!(range.fixate_nearest(&1080), 720);

        let list = CapsValue::List(vec![176u32, 352, 704]);
        assert_eq!(list.fixate_nearest(&320), 352);
        assert_eq!(CapsValue::<u32>::Any.fixate_nearest(&77), 77);
    }

    #[test]
    fn test_fixate_nearest_framerate() {
        let list = CapsValue::List(vec![Framerate::FPS_25, Framerate::FPS_30]);
        assert_eq!(list.fixate_nearest(&Framerate::FPS_29_97), Framerate::FPS_30);

        let range = CapsValue::Range {
            min: Framerate::new(1, 1),
            max: Framerate::FPS_25,
        };
        assert_eq!(range.fixate_nearest(&Framerate::FPS_30), Framerate::FPS_25);
    }

    #[test]
    fn test_framerate_equality_by_value() {
        use std::collections::HashSet;

        let doubled = Framerate::new(60, 2);
        assert_eq!(doubled, Framerate::FPS_30);
        assert_eq!(doubled.reduced(), Framerate::new(30, 1));
        assert_ne!(Framerate::new(0, 0), Framerate::new(0, 1));
        assert!(Framerate::new(0, 0) < Framerate::new(0, 1));

        let set: HashSet<Framerate> = [doubled, Framerate::FPS_30, Framerate::new(90, 3)]
            .into_iter()
            .collect();
        assert_eq!(set.len(), 1);

        assert!(CapsValue::Fixed(doubled).accepts(&Framerate::FPS_30));
        let a = CapsValue::Range {
            min: Framerate::new(15, 1),
            max: Framerate::new(60, 2),
        };
        let b = CapsValue::Range {
            min: Framerate::FPS_30,
            max: Framerate::new(60, 1),
        };
        assert!(matches!(a.intersect(&b), Some(CapsValue::Fixed(rate)) if rate == Framerate::FPS_30));
    }

    #[test]
    fn test_parse_fixed_yuv_caps() {
        let caps: VideoCaps =
            "video/x-raw-yuv, format=(fourcc)I420, width=(int)320, height=(int)240, framerate=(fraction)30/1"
                .parse()
                .unwrap();
        assert!(caps.is_fixed());
        assert_eq!(caps.pixel_format, CapsValue::Fixed(PixelFormat::I420));
        assert_eq!(caps.width, CapsValue::Fixed(320));
        assert_eq!(caps.height, CapsValue::Fixed(240));
        assert_eq!(caps.framerate, CapsValue::Fixed(Framerate::FPS_30));
    }

    #[test]
    fn test_parse_rgb16_caps_with_ranges() {
        let caps: VideoCaps =
            "video/x-raw-rgb, bpp=16, depth=16, width=[ 1, 2147483647 ], height=[1,2147483647], framerate={ 25/1, 30/1 }"
                .parse()
                .unwrap();
        assert_eq!(caps.pixel_format, CapsValue::Fixed(PixelFormat::Rgb565));
        assert_eq!(
            caps.width,
            CapsValue::Range {
                min: 1,
                max: 2147483647
            }
        );
        assert_eq!(
            caps.framerate,
            CapsValue::List(vec![Framerate::FPS_25, Framerate::FPS_30])
        );
    }

    #[test]
    fn test_parse_missing_fields_stay_any() {
        let caps: VideoCaps = "video/x-raw-yuv, format=I420".parse().unwrap();
        assert!(caps.width.is_any());
        assert!(caps.height.is_any());
        assert!(caps.framerate.is_any());
    }

    #[test]
    fn test_parse_rejects_unknown_format() {
        let err = "video/x-raw-yuv, format=ABCD".parse::<VideoCaps>().unwrap_err();
        assert!(matches!(err, FormatError::Parse(_)));
    }

    #[test]
    fn test_display_roundtrip() {
        let caps = VideoCaps::with_format(PixelFormat::Rgb565)
            .with_size(320, 240)
            .with_framerate(Framerate::FPS_30);
        let text = caps.to_string();
        assert_eq!(
            text,
            "video/x-raw-rgb, format=RGB16, width=320, height=240, framerate=30/1"
        );
        assert_eq!(text.parse::<VideoCaps>().unwrap(), caps);
    }
}
