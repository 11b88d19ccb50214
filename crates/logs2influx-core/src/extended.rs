//! Extended tag/field specs: `"PropertyName"` or `"PropertyName:outputName"`.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtendedSpecError {
    #[error("extended spec '{0}' does not name a property")]
    MissingProperty(String),
}

/// A property to copy from the event onto the point, with optional rename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtendedSpec {
    property: String,
    output: String,
}

impl ExtendedSpec {
    /// Parse a spec. The first `:` separates the property from its output
    /// name; an empty output name means "keep the property name".
    pub fn parse(spec: &str) -> Result<Self, ExtendedSpecError> {
        let (property, rename) = match spec.split_once(':') {
            Some((property, rename)) => (property.trim(), rename.trim()),
            None => (spec.trim(), ""),
        };

        if property.is_empty() {
            return Err(ExtendedSpecError::MissingProperty(spec.to_string()));
        }

        let output = if rename.is_empty() { property } else { rename };
        Ok(Self {
            property: property.to_string(),
            output: output.to_string(),
        })
    }

    /// Name of the event property to read.
    pub fn property(&self) -> &str {
        &self.property
    }

    /// Tag or field key written on the point.
    pub fn output(&self) -> &str {
        &self.output
    }

    pub fn is_renamed(&self) -> bool {
        self.property != self.output
    }
}

impl FromStr for ExtendedSpec {
    type Err = ExtendedSpecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for ExtendedSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_renamed() {
            write!(f, "{}:{}", self.property, self.output)
        } else {
            f.write_str(&self.property)
        }
    }
}
