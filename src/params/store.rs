use std::fmt;

use serde::{
    Deserialize, Deserializer, Serialize, Serializer,
    de::{MapAccess, Visitor},
    ser::SerializeMap,
};

use crate::{
    foundation::error::{ViewfxError, ViewfxResult},
    params::value::{EditDirection, ParamValue},
};

/// Keys written after all others when a store is serialized.
pub const RESERVED_TAIL: [&str; 2] = ["output_file", "enabled"];

/// Named step parameters in declaration order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParamStore {
    entries: Vec<(String, ParamValue)>,
}

impl ParamStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|(k, _)| k == name)
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.entries.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut ParamValue> {
        self.entries
            .iter_mut()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v)
    }

    /// Replace in place, or append a new key.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<ParamValue>) {
        let name = name.into();
        let value = value.into();
        match self.position(&name) {
            Some(i) => self.entries[i].1 = value,
            None => self.entries.push((name, value)),
        }
    }

    /// Append `value` only if `name` is absent.
    pub fn set_default(&mut self, name: &str, value: impl Into<ParamValue>) {
        if !self.contains(name) {
            self.entries.push((name.to_owned(), value.into()));
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<ParamValue> {
        let i = self.position(name)?;
        Some(self.entries.remove(i).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Entry at `index` in declaration order.
    pub fn entry_at(&self, index: usize) -> Option<(&str, &ParamValue)> {
        self.entries.get(index).map(|(k, v)| (k.as_str(), v))
    }

    pub fn edit(&mut self, name: &str, direction: EditDirection, multiplier: u32) -> ViewfxResult<()> {
        let Some(value) = self.get_mut(name) else {
            return Err(ViewfxError::validation(format!("unknown parameter '{name}'")));
        };
        value
            .edit(direction, multiplier)
            .map_err(|e| ViewfxError::validation(format!("parameter '{name}': {e}")))
    }

    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(ParamValue::as_bool)
    }

    pub fn get_i64(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(ParamValue::as_i64)
    }

    pub fn get_f64(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(ParamValue::as_f64)
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(ParamValue::as_str)
    }

    pub fn get_list(&self, name: &str) -> Option<&[f64]> {
        self.get(name).and_then(ParamValue::as_list)
    }

    /// Entries with [`RESERVED_TAIL`] keys moved to the end.
    pub fn ordered(&self) -> Vec<(&str, &ParamValue)> {
        let mut out: Vec<_> = self
            .iter()
            .filter(|(k, _)| !RESERVED_TAIL.contains(k))
            .collect();
        for key in RESERVED_TAIL {
            if let Some(v) = self.get(key) {
                out.push((key, v));
            }
        }
        out
    }
}

impl<K: Into<String>, V: Into<ParamValue>> FromIterator<(K, V)> for ParamStore {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut store = Self::new();
        for (k, v) in iter {
            store.set(k, v);
        }
        store
    }
}

impl Serialize for ParamStore {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let ordered = self.ordered();
        let mut map = serializer.serialize_map(Some(ordered.len()))?;
        for (k, v) in ordered {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

struct StoreVisitor;

impl<'de> Visitor<'de> for StoreVisitor {
    type Value = ParamStore;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map of parameter names to values")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut store = ParamStore::new();
        while let Some((k, v)) = access.next_entry::<String, ParamValue>()? {
            store.set(k, v);
        }
        Ok(store)
    }
}

impl<'de> Deserialize<'de> for ParamStore {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(StoreVisitor)
    }
}

impl fmt::Display for ParamStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (k, v)) in self.ordered().into_iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{k}={v}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/params/store.rs"]
mod tests;
