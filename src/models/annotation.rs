// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Detection annotation data structures.
//!
//! This module defines a single object detection as it appears in the
//! metadata file, along with a typed view of its bounding box.

use serde::{Deserialize, Deserializer};

/// A single object detection inside a metadata entry.
///
/// Only the fields used for overlay rendering are modelled; any other keys
/// present in the source file (ids, scores, segmentation) are ignored.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Annotation {
    /// Detection class. Older metadata files omit it.
    #[serde(default, deserialize_with = "optional_name")]
    pub category_name: Option<String>,
    /// `[x, y]` or `[x, y, width, height]` in source-image pixels.
    /// Non-numeric values read as NaN, which invalidates the box.
    #[serde(default, deserialize_with = "lenient_bbox")]
    pub bbox: Vec<f64>,
}

/// Typed view of an annotation's `bbox` array.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    /// `(width, height)` when the schema carries a usable size.
    pub size: Option<(f64, f64)>,
}

impl Annotation {
    /// Create an annotation from a category and raw bbox values.
    #[cfg(test)]
    pub fn new(category_name: Option<String>, bbox: Vec<f64>) -> Self {
        Self {
            category_name,
            bbox,
        }
    }

    /// Interpret the raw bbox values.
    ///
    /// Returns `None` when the array has fewer than 2 or more than 4 values,
    /// or when any value is not finite. A three-value box carries a width
    /// without a height and is treated like a bare point, as is a box whose
    /// width or height is not strictly positive.
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        if !(2..=4).contains(&self.bbox.len()) || !self.bbox.iter().all(|v| v.is_finite()) {
            return None;
        }
        let (x, y) = (self.bbox[0], self.bbox[1]);

        let size = match self.bbox.as_slice() {
            [_, _, w, h] if *w > 0.0 && *h > 0.0 => Some((*w, *h)),
            _ => None,
        };

        Some(BoundingBox { x, y, size })
    }

    /// Display label for the overlay, if the detection has a category.
    pub fn label(&self) -> Option<&str> {
        self.category_name.as_deref().filter(|name| !name.is_empty())
    }
}

/// Accept a string category; anything else reads as absent.
fn optional_name<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(value.as_str().map(str::to_owned))
}

/// Read the bbox array, mapping non-numeric items to NaN and a non-array
/// to an empty box.
fn lenient_bbox<'de, D>(deserializer: D) -> Result<Vec<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Array(items) => items
            .iter()
            .map(|item| item.as_f64().unwrap_or(f64::NAN))
            .collect(),
        _ => Vec::new(),
    })
}
