// Copyright 2024 Shifa Team
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Patient record accumulated during an assessment

use super::{FieldPath, FieldValue};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Ordered mapping of field name to answer
///
/// Fields are absent until answered. Dotted names address nested groups, so
/// `set("vital_signs.heart_rate", 120)` creates the `vital_signs` object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PatientRecord {
    fields: IndexMap<String, FieldValue>,
}

impl PatientRecord {
    /// Create an empty record
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field, replacing any previous answer
    pub fn set(&mut self, field: &str, value: impl Into<FieldValue>) {
        self.set_path(&FieldPath::parse(field), value.into());
    }

    /// Builder-style [`set`](Self::set)
    pub fn with(mut self, field: &str, value: impl Into<FieldValue>) -> Self {
        self.set(field, value);
        self
    }

    /// Set a value at a path, creating intermediate objects
    ///
    /// A scalar sitting where an intermediate object is needed is replaced.
    pub fn set_path(&mut self, path: &FieldPath, value: FieldValue) {
        let Some((last, parents)) = path.segments().split_last() else {
            return;
        };

        let mut map = &mut self.fields;
        for segment in parents {
            let slot = map
                .entry(segment.clone())
                .and_modify(|existing| {
                    if !matches!(existing, FieldValue::Object(_)) {
                        *existing = FieldValue::Object(IndexMap::new());
                    }
                })
                .or_insert_with(|| FieldValue::Object(IndexMap::new()));
            map = match slot {
                FieldValue::Object(inner) => inner,
                _ => unreachable!("intermediate slot was just made an object"),
            };
        }
        map.insert(last.clone(), value);
    }

    /// Look up a field by dotted name
    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.get_path(&FieldPath::parse(field))
    }

    /// Look up a value by path
    pub fn get_path(&self, path: &FieldPath) -> Option<&FieldValue> {
        let (first, rest) = path.segments().split_first()?;
        let mut current = self.fields.get(first)?;
        for segment in rest {
            current = match current {
                FieldValue::Object(inner) => inner.get(segment)?,
                _ => return None,
            };
        }
        Some(current)
    }

    /// Whether a field has been answered
    pub fn is_set(&self, field: &str) -> bool {
        self.get(field).is_some()
    }

    /// Remove a field, returning its previous value
    pub fn remove(&mut self, field: &str) -> Option<FieldValue> {
        let path = FieldPath::parse(field);
        let (last, parents) = path.segments().split_last()?;

        let mut map = &mut self.fields;
        for segment in parents {
            map = match map.get_mut(segment)? {
                FieldValue::Object(inner) => inner,
                _ => return None,
            };
        }
        map.shift_remove(last)
    }

    /// Toggle membership of `item` in the list stored at `field`
    ///
    /// A missing or scalar field is treated as an empty selection.
    pub fn toggle_in_list(&mut self, field: &str, item: FieldValue) {
        let path = FieldPath::parse(field);
        let mut items = match self.get_path(&path) {
            Some(FieldValue::List(items)) => items.clone(),
            _ => Vec::new(),
        };
        match items.iter().position(|existing| existing.loose_eq(&item)) {
            Some(index) => {
                items.remove(index);
            }
            None => items.push(item),
        }
        self.set_path(&path, FieldValue::List(items));
    }

    /// Number of top-level fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// True when nothing has been answered
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterate over top-level fields in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Convert the record into a JSON object
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.fields
                .iter()
                .map(|(k, v)| (k.clone(), serde_json::Value::from(v)))
                .collect(),
        )
    }
}

impl<K: Into<String>> FromIterator<(K, FieldValue)> for PatientRecord {
    fn from_iter<T: IntoIterator<Item = (K, FieldValue)>>(iter: T) -> Self {
        let mut record = Self::new();
        for (key, value) in iter {
            let key: String = key.into();
            record.set(&key, value);
        }
        record
    }
}

impl TryFrom<serde_json::Value> for PatientRecord {
    type Error = serde_json::Error;

    fn try_from(value: serde_json::Value) -> Result<Self, Self::Error> {
        serde_json::from_value(value)
    }
}
