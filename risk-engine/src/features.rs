//! Anonymized behavioral features (V1..V28)

use serde::de::{Deserialize, Deserializer};
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::BTreeMap;

/// Number of behavioral feature slots
pub const FEATURE_COUNT: usize = 28;

/// Sparse set of behavioral features keyed `V1` through `V28`
///
/// Built from a name/value mapping: keys that are not exactly `V<n>` with
/// `n` in 1..=28 are dropped. A retained key whose value is not a number
/// is kept as `0.0`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BehavioralFeatures {
    slots: [Option<f64>; FEATURE_COUNT],
}

/// Parse a feature name into its 1-based index
pub fn feature_index(name: &str) -> Option<usize> {
    let digits = name.strip_prefix('V')?;
    if digits.is_empty() || digits.starts_with('0') || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let index: usize = digits.parse().ok()?;
    (1..=FEATURE_COUNT).contains(&index).then_some(index)
}

/// Feature name for a 1-based index
pub fn feature_name(index: usize) -> String {
    format!("V{}", index)
}

impl BehavioralFeatures {
    /// Create an empty feature set
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style setter; out-of-range indices are ignored
    pub fn with(mut self, index: usize, value: f64) -> Self {
        self.set(index, value);
        self
    }

    /// Set a feature by 1-based index. Returns false when out of range.
    pub fn set(&mut self, index: usize, value: f64) -> bool {
        match index.checked_sub(1).and_then(|i| self.slots.get_mut(i)) {
            Some(slot) => {
                *slot = Some(value);
                true
            }
            None => false,
        }
    }

    /// Set a feature by name. Returns false when the name is not `V1..V28`.
    pub fn insert(&mut self, name: &str, value: f64) -> bool {
        match feature_index(name) {
            Some(index) => self.set(index, value),
            None => false,
        }
    }

    /// Get a feature by 1-based index
    pub fn get(&self, index: usize) -> Option<f64> {
        index
            .checked_sub(1)
            .and_then(|i| self.slots.get(i))
            .copied()
            .flatten()
    }

    /// Number of present features
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    /// True when no `V1..V28` key is present
    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    /// Present features as (1-based index, value)
    pub fn iter(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.map(|v| (i + 1, v)))
    }

    /// Sum of absolute values of present features; NaN counts as zero
    pub fn absolute_sum(&self) -> f64 {
        self.iter()
            .map(|(_, v)| if v.is_nan() { 0.0 } else { v.abs() })
            .sum()
    }
}

impl<K: AsRef<str>> FromIterator<(K, f64)> for BehavioralFeatures {
    fn from_iter<I: IntoIterator<Item = (K, f64)>>(iter: I) -> Self {
        let mut features = Self::new();
        for (name, value) in iter {
            features.insert(name.as_ref(), value);
        }
        features
    }
}

impl Serialize for BehavioralFeatures {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (index, value) in self.iter() {
            map.serialize_entry(&feature_name(index), &value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for BehavioralFeatures {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = BTreeMap::<String, serde_json::Value>::deserialize(deserializer)?;
        let mut features = Self::new();
        for (name, value) in raw {
            features.insert(&name, value.as_f64().unwrap_or(0.0));
        }
        Ok(features)
    }
}
