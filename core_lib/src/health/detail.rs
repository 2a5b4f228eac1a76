//! A single measurement reported under a checks key
//!
//! See: https://inadarei.github.io/rfc-healthcheck/#the-checks-object

use super::sparse::{empty_as_none, is_blank};
use super::{Key, Status};
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::time::Duration;
use tracing::debug;

/// Member names of the measurement object. Additional properties may not
/// shadow them once flattened.
const RESERVED_FIELDS: [&str; 9] = [
    "componentId",
    "componentType",
    "observedValue",
    "observedUnit",
    "status",
    "affectedEndpoints",
    "time",
    "output",
    "links",
];

#[derive(Debug, Clone, PartialEq)]
pub enum ObservedValue {
    Number(serde_json::Number),
    Text(String),
    Duration(Duration),
}

impl ObservedValue {
    /// `None` for NaN and infinities, which JSON cannot carry.
    pub fn from_f64(value: f64) -> Option<Self> {
        serde_json::Number::from_f64(value).map(ObservedValue::Number)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ObservedValue::Number(n) => n.as_f64(),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            ObservedValue::Number(n) => n.as_u64(),
            _ => None,
        }
    }
}

impl From<u16> for ObservedValue {
    fn from(value: u16) -> Self {
        ObservedValue::Number(value.into())
    }
}

impl From<u64> for ObservedValue {
    fn from(value: u64) -> Self {
        ObservedValue::Number(value.into())
    }
}

impl From<i64> for ObservedValue {
    fn from(value: i64) -> Self {
        ObservedValue::Number(value.into())
    }
}

impl From<&str> for ObservedValue {
    fn from(value: &str) -> Self {
        ObservedValue::Text(value.to_string())
    }
}

impl From<String> for ObservedValue {
    fn from(value: String) -> Self {
        ObservedValue::Text(value)
    }
}

impl From<Duration> for ObservedValue {
    fn from(value: Duration) -> Self {
        ObservedValue::Duration(value)
    }
}

impl Serialize for ObservedValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ObservedValue::Number(n) => n.serialize(serializer),
            ObservedValue::Text(text) => serializer.serialize_str(text),
            ObservedValue::Duration(d) => serializer.collect_str(&format_args!("{:?}", d)),
        }
    }
}

impl<'de> Deserialize<'de> for ObservedValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(serde_json::Number),
            Text(String),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Number(n) => ObservedValue::Number(n),
            Raw::Text(text) => match parse_duration(&text) {
                Some(d) => ObservedValue::Duration(d),
                None => ObservedValue::Text(text),
            },
        })
    }
}

/// Inverse of `Duration`'s `Debug` rendering (`"1.5s"`, `"250ms"`, `"12µs"`).
/// Decimal digits are scaled exactly, without passing through floating point.
fn parse_duration(text: &str) -> Option<Duration> {
    const UNITS: [(&str, u128); 5] = [
        ("ns", 1),
        ("µs", 1_000),
        ("us", 1_000),
        ("ms", 1_000_000),
        ("s", 1_000_000_000),
    ];

    let (number, unit_nanos) = UNITS
        .iter()
        .find_map(|(suffix, nanos)| text.strip_suffix(suffix).map(|n| (n, *nanos)))?;

    let (whole, fraction) = number.split_once('.').unwrap_or((number, ""));
    if whole.is_empty() || !whole.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if !fraction.bytes().all(|b| b.is_ascii_digit()) || fraction.len() > 9 {
        return None;
    }

    let mut nanos = whole.parse::<u128>().ok()?.checked_mul(unit_nanos)?;
    if !fraction.is_empty() {
        let scale = 10u128.pow(fraction.len() as u32);
        let fraction_nanos = fraction.parse::<u128>().ok()?.checked_mul(unit_nanos)? / scale;
        nanos = nanos.checked_add(fraction_nanos)?;
    }

    let secs = u64::try_from(nanos / 1_000_000_000).ok()?;
    Some(Duration::new(secs, (nanos % 1_000_000_000) as u32))
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentDetail {
    /// Carried by the enclosing checks map on the wire.
    #[serde(skip)]
    pub key: Key,
    #[serde(default, deserialize_with = "empty_as_none", skip_serializing_if = "is_blank")]
    pub component_id: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none", skip_serializing_if = "is_blank")]
    pub component_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed_value: Option<ObservedValue>,
    #[serde(default, deserialize_with = "empty_as_none", skip_serializing_if = "is_blank")]
    pub observed_unit: Option<String>,
    #[serde(default)]
    pub status: Status,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub affected_endpoints: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "empty_as_none", skip_serializing_if = "is_blank")]
    pub output: Option<String>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub links: IndexMap<String, String>,
    /// Filled by `with_property` and by unknown members on decode. Never
    /// holds a standard member name.
    #[serde(flatten)]
    additional_properties: IndexMap<String, serde_json::Value>,
}

impl ComponentDetail {
    pub fn new(key: Key, status: Status) -> Self {
        Self {
            key,
            status,
            ..Default::default()
        }
    }

    pub fn with_component_id(mut self, id: impl Into<String>) -> Self {
        self.component_id = Some(id.into());
        self
    }

    pub fn with_component_type(mut self, component_type: impl Into<String>) -> Self {
        self.component_type = Some(component_type.into());
        self
    }

    pub fn with_observed_value(mut self, value: impl Into<ObservedValue>) -> Self {
        self.observed_value = Some(value.into());
        self
    }

    pub fn with_observed_unit(mut self, unit: impl Into<String>) -> Self {
        self.observed_unit = Some(unit.into());
        self
    }

    pub fn with_affected_endpoints<I, S>(mut self, endpoints: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.affected_endpoints = endpoints.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_time(mut self, time: DateTime<Utc>) -> Self {
        self.time = Some(time);
        self
    }

    pub fn with_output(mut self, output: impl Into<String>) -> Self {
        self.output = Some(output.into());
        self
    }

    pub fn with_link(mut self, rel: impl Into<String>, href: impl Into<String>) -> Self {
        self.links.insert(rel.into(), href.into());
        self
    }

    /// Names that collide with a standard member are dropped.
    pub fn with_property(mut self, name: impl Into<String>, value: serde_json::Value) -> Self {
        let name = name.into();
        if RESERVED_FIELDS.contains(&name.as_str()) {
            debug!("Ignoring additional property {:?} that shadows a standard field", name);
            return self;
        }
        self.additional_properties.insert(name, value);
        self
    }

    pub fn additional_properties(&self) -> &IndexMap<String, serde_json::Value> {
        &self.additional_properties
    }

    pub fn property(&self, name: &str) -> Option<&serde_json::Value> {
        self.additional_properties.get(name)
    }
}
