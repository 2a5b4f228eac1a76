//! Multi-valued, mergeable collection of measurements keyed by [`Key`]
//!
//! See: https://inadarei.github.io/rfc-healthcheck/#the-checks-object

use super::{ComponentDetail, Key, Status};
use indexmap::IndexMap;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Keys keep insertion order and a key may carry several measurements, for
/// example one per cluster node. Nothing is ever deduplicated or overwritten.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Checks {
    entries: IndexMap<Key, Vec<ComponentDetail>>,
}

impl Checks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends to the sequence for `key`, creating it when absent.
    pub fn add<I>(&mut self, key: Key, details: I)
    where
        I: IntoIterator<Item = ComponentDetail>,
    {
        self.entries.entry(key).or_default().extend(details);
    }

    /// Files every measurement under its own key.
    pub fn add_details<I>(&mut self, details: I)
    where
        I: IntoIterator<Item = ComponentDetail>,
    {
        for detail in details {
            let key = detail.key.clone();
            self.add(key, [detail]);
        }
    }

    /// Folds each collection in, in the order given, with `add` semantics.
    pub fn merge<I>(&mut self, others: I)
    where
        I: IntoIterator<Item = Checks>,
    {
        for other in others {
            for (key, details) in other.entries {
                self.add(key, details);
            }
        }
    }

    pub fn get(&self, key: &Key) -> Option<&[ComponentDetail]> {
        self.entries.get(key).map(Vec::as_slice)
    }

    pub fn keys(&self) -> impl Iterator<Item = &Key> {
        self.entries.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Key, &[ComponentDetail])> {
        self.entries.iter().map(|(k, v)| (k, v.as_slice()))
    }

    pub fn details(&self) -> impl Iterator<Item = &ComponentDetail> {
        self.entries.values().flatten()
    }

    /// Worst status across every measurement, `Pass` when empty.
    pub fn worst_status(&self) -> Status {
        self.details()
            .fold(Status::Pass, |acc, detail| acc.max(detail.status))
    }

    /// Number of keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<ComponentDetail> for Checks {
    fn from_iter<T: IntoIterator<Item = ComponentDetail>>(iter: T) -> Self {
        let mut checks = Checks::new();
        checks.add_details(iter);
        checks
    }
}

impl Serialize for Checks {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, details) in &self.entries {
            map.serialize_entry(&key.to_string(), details)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Checks {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ChecksVisitor;

        impl<'de> Visitor<'de> for ChecksVisitor {
            type Value = Checks;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of composite keys to arrays of measurements")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Checks, A::Error> {
                let mut checks = Checks::new();
                while let Some((key, mut details)) =
                    access.next_entry::<Key, Vec<ComponentDetail>>()?
                {
                    for detail in &mut details {
                        detail.key = key.clone();
                    }
                    checks.add(key, details);
                }
                Ok(checks)
            }
        }

        deserializer.deserialize_map(ChecksVisitor)
    }
}
