// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Metadata entries and the ordered metadata set.
//!
//! The metadata file maps opaque string keys to annotation samples. Keys are
//! not reliable frame numbers, so the set keeps them in document order and is
//! addressed positionally.

use super::annotation::Annotation;
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer};

/// One annotation sample.
///
/// Every field tolerates `null` and unexpected value types, so a single
/// malformed sample never fails the whole document.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct MetadataEntry {
    /// Capture timestamp of the sample.
    #[serde(default, deserialize_with = "string_or_number")]
    pub timestamp: Option<String>,
    /// Free-form sample label, used by files without timestamps.
    #[serde(default, deserialize_with = "string_or_number")]
    pub label: Option<String>,
    #[serde(default, deserialize_with = "lenient_annotations")]
    pub annotations: Vec<Annotation>,
}

impl MetadataEntry {
    /// Text identifying the sample: the timestamp, else the label.
    pub fn caption(&self) -> Option<&str> {
        self.timestamp.as_deref().or(self.label.as_deref())
    }
}

/// A metadata entry together with its original key.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyedEntry {
    pub key: String,
    pub entry: MetadataEntry,
}

/// The full annotation dataset, in canonical temporal order.
#[derive(Debug, Clone, Default)]
pub struct MetadataSet {
    entries: Vec<KeyedEntry>,
    /// Bumped by the store on every successful load; 0 means never loaded.
    version: u64,
}

impl MetadataSet {
    /// Build a set from a key-ordered map, dropping annotations whose bbox
    /// cannot be interpreted.
    pub fn from_ordered(map: IndexMap<String, MetadataEntry>, version: u64) -> Self {
        let entries = map
            .into_iter()
            .map(|(key, mut entry)| {
                let before = entry.annotations.len();
                entry.annotations.retain(|ann| ann.bounding_box().is_some());
                let dropped = before - entry.annotations.len();
                if dropped > 0 {
                    log::warn!("Skipped {} annotation(s) with invalid bbox in entry {}", dropped, key);
                }
                KeyedEntry { key, entry }
            })
            .collect();

        Self { entries, version }
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The `index`-th sample in document order.
    pub fn get(&self, index: usize) -> Option<&KeyedEntry> {
        self.entries.get(index)
    }

    #[cfg(test)]
    pub fn iter(&self) -> impl Iterator<Item = &KeyedEntry> {
        self.entries.iter()
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Total number of detections across all samples.
    pub fn annotation_count(&self) -> usize {
        self.entries.iter().map(|e| e.entry.annotations.len()).sum()
    }
}

/// Accept a JSON string or number; anything else reads as absent.
fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(s) => Some(s),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

/// Read the annotation list, treating `null` or a non-array as empty and
/// skipping items that are not annotation objects.
fn lenient_annotations<'de, D>(deserializer: D) -> Result<Vec<Annotation>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    let serde_json::Value::Array(items) = value else {
        return Ok(Vec::new());
    };

    Ok(items
        .into_iter()
        .filter_map(|item| match serde_json::from_value::<Annotation>(item) {
            Ok(annotation) => Some(annotation),
            Err(e) => {
                log::warn!("Skipped malformed annotation: {}", e);
                None
            }
        })
        .collect())
}
