//! Element configuration and description parsing.
//!
//! The element is configured through two properties, accepted under their
//! element names or kebab-case aliases:
//!
//! | Property | Alias | Default | Meaning |
//! |----------|-------|---------|---------|
//! | `engineName` | `engine-name` | `codecServer` | Engine opened on the first frame |
//! | `numOutputBufs` | `num-output-bufs` | `2` | Output pool capacity (`0` means default) |
//!
//! Properties usually arrive in an element description:
//!
//! ```text
//! dspcolorspace engineName=codecServer numOutputBufs=3
//! ```

use crate::accel::DEFAULT_ENGINE_NAME;
use crate::error::{Error, Result};
use winnow::Parser;
use winnow::ascii::{alpha1, digit1, multispace0};
use winnow::combinator::{alt, delimited, opt, repeat};
use winnow::error::ContextError;
use winnow::token::{take_till, take_while};

type WResult<T> = std::result::Result<T, ContextError>;

/// Factory name of the element.
pub const ELEMENT_NAME: &str = "dspcolorspace";

/// Output pool capacity used when none (or `0`) is configured.
pub const DEFAULT_NUM_OUTPUT_BUFS: usize = 2;

/// Configuration of a colorspace element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorspaceConfig {
    /// Accelerator engine to open.
    pub engine_name: String,
    /// Requested output pool capacity; `0` selects the default.
    pub num_output_bufs: usize,
}

impl Default for ColorspaceConfig {
    fn default() -> Self {
        Self {
            engine_name: DEFAULT_ENGINE_NAME.to_string(),
            num_output_bufs: DEFAULT_NUM_OUTPUT_BUFS,
        }
    }
}

impl ColorspaceConfig {
    /// Set the engine name.
    pub fn with_engine_name(mut self, name: impl Into<String>) -> Self {
        self.engine_name = name.into();
        self
    }

    /// Set the output pool capacity.
    pub fn with_num_output_bufs(mut self, count: usize) -> Self {
        self.num_output_bufs = count;
        self
    }

    /// Pool capacity to allocate, with `0` mapped to the default.
    pub fn pool_capacity(&self) -> usize {
        if self.num_output_bufs == 0 {
            DEFAULT_NUM_OUTPUT_BUFS
        } else {
            self.num_output_bufs
        }
    }

    /// Apply one property by name.
    pub fn set_property(&mut self, name: &str, value: &PropertyValue) -> Result<()> {
        match name {
            "engineName" | "engine-name" | "engine_name" => {
                let engine = value.as_string();
                if engine.is_empty() {
                    return Err(Error::Config("engineName must not be empty".into()));
                }
                tracing::debug!(engine = %engine, "setting engineName");
                self.engine_name = engine;
            }
            "numOutputBufs" | "num-output-bufs" | "num_output_bufs" => {
                let count = value
                    .as_u64()
                    .and_then(|v| usize::try_from(v).ok())
                    .ok_or_else(|| {
                        Error::Config(format!(
                            "numOutputBufs must be a non-negative integer, got '{}'",
                            value.as_string()
                        ))
                    })?;
                tracing::debug!(count, "setting numOutputBufs");
                self.num_output_bufs = count;
            }
            other => {
                return Err(Error::Config(format!("unknown property '{other}'")));
            }
        }
        Ok(())
    }

    /// Build a configuration from `(name, value)` pairs over the defaults.
    pub fn from_properties<'a, I>(properties: I) -> Result<Self>
    where
        I: IntoIterator<Item = &'a (String, PropertyValue)>,
    {
        let mut config = Self::default();
        for (name, value) in properties {
            config.set_property(name, value)?;
        }
        Ok(config)
    }

    /// Parse a `dspcolorspace key=value ...` description.
    pub fn from_description(description: &str) -> Result<Self> {
        let parsed = parse_element(description)?;
        if parsed.name != ELEMENT_NAME {
            return Err(Error::Config(format!(
                "expected element '{ELEMENT_NAME}', got '{}'",
                parsed.name
            )));
        }
        Self::from_properties(&parsed.properties)
    }
}

/// A property value in an element description.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    /// A string value (quoted or unquoted).
    String(String),
    /// An integer value.
    Integer(i64),
    /// A boolean value.
    Bool(bool),
}

impl PropertyValue {
    /// Get as a string, converting if necessary.
    pub fn as_string(&self) -> String {
        match self {
            PropertyValue::String(s) => s.clone(),
            PropertyValue::Integer(i) => i.to_string(),
            PropertyValue::Bool(b) => b.to_string(),
        }
    }

    /// Try to get as an integer.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            PropertyValue::Integer(i) => Some(*i),
            PropertyValue::String(s) => s.parse().ok(),
            PropertyValue::Bool(_) => None,
        }
    }

    /// Try to get as a u64.
    pub fn as_u64(&self) -> Option<u64> {
        self.as_i64().and_then(|i| u64::try_from(i).ok())
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

/// A parsed element with its name and properties.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedElement {
    /// The element factory name.
    pub name: String,
    /// Properties in the order given.
    pub properties: Vec<(String, PropertyValue)>,
}

/// Parse a single element description.
///
/// # Example
///
/// ```rust
/// use dsp_colorspace::config::{PropertyValue, parse_element};
///
/// let element = parse_element("dspcolorspace numOutputBufs=3").unwrap();
/// assert_eq!(element.name, "dspcolorspace");
/// assert_eq!(element.properties[0].1, PropertyValue::Integer(3));
/// ```
pub fn parse_element(input: &str) -> Result<ParsedElement> {
    element_description
        .parse(input.trim())
        .map_err(|e| Error::Config(format!("parse error: {e}")))
}

fn element_description(input: &mut &str) -> WResult<ParsedElement> {
    let name: &str = identifier.parse_next(input)?;
    let _ = multispace0.parse_next(input)?;
    let properties: Vec<(String, PropertyValue)> = repeat(0.., property).parse_next(input)?;

    Ok(ParsedElement {
        name: name.to_string(),
        properties,
    })
}

fn identifier<'a>(input: &mut &'a str) -> WResult<&'a str> {
    (
        alt((alpha1::<_, ContextError>, "_")),
        take_while(0.., |c: char| c.is_alphanumeric() || c == '_' || c == '-'),
    )
        .take()
        .parse_next(input)
}

fn property(input: &mut &str) -> WResult<(String, PropertyValue)> {
    let checkpoint = *input;

    let key: &str = identifier.parse_next(input)?;
    let _ = multispace0.parse_next(input)?;
    if !input.starts_with('=') {
        *input = checkpoint;
        return Err(ContextError::new());
    }
    let _ = '='.parse_next(input)?;
    let _ = multispace0.parse_next(input)?;
    let value = property_value.parse_next(input)?;
    let _ = multispace0.parse_next(input)?;

    Ok((key.to_string(), value))
}

fn property_value(input: &mut &str) -> WResult<PropertyValue> {
    alt((
        quoted_string.map(PropertyValue::String),
        boolean.map(PropertyValue::Bool),
        integer.map(PropertyValue::Integer),
        bare_string.map(PropertyValue::String),
    ))
    .parse_next(input)
}

fn quoted_string(input: &mut &str) -> WResult<String> {
    alt((
        delimited('"', take_till(0.., '"'), '"'),
        delimited('\'', take_till(0.., '\''), '\''),
    ))
    .map(|s: &str| s.to_string())
    .parse_next(input)
}

fn boolean(input: &mut &str) -> WResult<bool> {
    let value = alt(("true".value(true), "false".value(false))).parse_next(input)?;
    // `trueish` is a bare string, not a boolean
    if input.starts_with(|c: char| !c.is_whitespace()) {
        return Err(ContextError::new());
    }
    Ok(value)
}

fn integer(input: &mut &str) -> WResult<i64> {
    let negative = opt('-').parse_next(input)?;
    let digits: &str = digit1.parse_next(input)?;
    if input.starts_with(|c: char| !c.is_whitespace()) {
        return Err(ContextError::new());
    }

    let value: i64 = digits.parse().map_err(|_| ContextError::new())?;
    Ok(if negative.is_some() { -value } else { value })
}

fn bare_string(input: &mut &str) -> WResult<String> {
    take_while(1.., |c: char| !c.is_whitespace() && c != '=')
        .map(|s: &str| s.to_string())
        .parse_next(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ColorspaceConfig::default();
        assert_eq!(config.engine_name, "codecServer");
        assert_eq!(config.num_output_bufs, 2);
        assert_eq!(config.pool_capacity(), 2);
    }

    #[test]
    fn test_zero_bufs_means_default() {
        let config = ColorspaceConfig::default().with_num_output_bufs(0);
        assert_eq!(config.pool_capacity(), DEFAULT_NUM_OUTPUT_BUFS);
        let config = config.with_num_output_bufs(5);
        assert_eq!(config.pool_capacity(), 5);
    }

    #[test]
    fn test_parse_element_properties() {
        let parsed =
            parse_element("dspcolorspace engineName=\"my engine\" numOutputBufs=3").unwrap();
        assert_eq!(parsed.name, "dspcolorspace");
        assert_eq!(
            parsed.properties,
            vec![
                (
                    "engineName".to_string(),
                    PropertyValue::String("my engine".to_string())
                ),
                ("numOutputBufs".to_string(), PropertyValue::Integer(3)),
            ]
        );
    }

    #[test]
    fn test_parse_bare_and_boolean_values() {
        let parsed = parse_element("x a=codecServer b=true c=trueish d=-4").unwrap();
        assert_eq!(parsed.properties[0].1, PropertyValue::String("codecServer".into()));
        assert_eq!(parsed.properties[1].1, PropertyValue::Bool(true));
        assert_eq!(parsed.properties[2].1, PropertyValue::String("trueish".into()));
        assert_eq!(parsed.properties[3].1, PropertyValue::Integer(-4));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_element("").is_err());
        assert!(parse_element("dspcolorspace numOutputBufs").is_err());
    }

    #[test]
    fn test_from_description() {
        let config =
            ColorspaceConfig::from_description("dspcolorspace engine-name=dsp1 num-output-bufs=4")
                .unwrap();
        assert_eq!(config.engine_name, "dsp1");
        assert_eq!(config.num_output_bufs, 4);

        let config = ColorspaceConfig::from_description("dspcolorspace").unwrap();
        assert_eq!(config, ColorspaceConfig::default());
    }

    #[test]
    fn test_from_description_errors() {
        assert!(matches!(
            ColorspaceConfig::from_description("videoconvert"),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            ColorspaceConfig::from_description("dspcolorspace bogus=1"),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            ColorspaceConfig::from_description("dspcolorspace numOutputBufs=-1"),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            ColorspaceConfig::from_description("dspcolorspace engineName=''"),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_set_property_from_string_number() {
        let mut config = ColorspaceConfig::default();
        config
            .set_property("numOutputBufs", &PropertyValue::from("6"))
            .unwrap();
        assert_eq!(config.num_output_bufs, 6);
    }
}
