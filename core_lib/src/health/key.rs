//! Composite key naming one measurable aspect of one component
//!
//! See: https://inadarei.github.io/rfc-healthcheck/#the-checks-object

use crate::error::{HealthError, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

const SEPARATOR: char = ':';

/// `component` or `component:measurement` on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Key {
    pub component_name: String,
    pub measurement_name: String,
}

impl Key {
    pub fn new(component_name: impl Into<String>, measurement_name: impl Into<String>) -> Self {
        Self {
            component_name: component_name.into(),
            measurement_name: measurement_name.into(),
        }
    }

    pub fn component(component_name: impl Into<String>) -> Self {
        Self::new(component_name, String::new())
    }

    /// Splits on the first separator only; the measurement name keeps any
    /// further colons verbatim.
    pub fn parse(text: &str) -> Result<Key> {
        if text.is_empty() {
            debug!("Missing componentName but it's mandatory");
            return Err(HealthError::MalformedKey("empty key".to_string()));
        }

        match text.split_once(SEPARATOR) {
            Some((component, measurement)) => Ok(Key::new(component, measurement)),
            None => {
                debug!("No separator found in {:?} so there is no measurementName", text);
                Ok(Key::component(text))
            }
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.measurement_name.is_empty() {
            f.write_str(&self.component_name)
        } else {
            write!(f, "{}{}{}", self.component_name, SEPARATOR, self.measurement_name)
        }
    }
}

impl FromStr for Key {
    type Err = HealthError;

    fn from_str(s: &str) -> Result<Self> {
        Key::parse(s)
    }
}

impl Serialize for Key {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Key {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Key::parse(&text).map_err(serde::de::Error::custom)
    }
}
