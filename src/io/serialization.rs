// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Metadata and settings deserialization.
//!
//! This module handles reading the JSON detection metadata and the YAML
//! viewer settings from disk.

use crate::io::metadata::MetadataError;
use crate::models::metadata::MetadataEntry;
use crate::models::settings::Settings;
use anyhow::{Context, Result};
use indexmap::IndexMap;
use std::path::Path;

/// Parse a metadata document, keeping keys in document order.
pub fn parse_metadata_json(json: &str) -> Result<IndexMap<String, MetadataEntry>, MetadataError> {
    let map = serde_json::from_str(json)?;
    Ok(map)
}

/// Import a metadata document from a JSON file.
pub fn import_metadata_json(path: &Path) -> Result<IndexMap<String, MetadataEntry>, MetadataError> {
    let json = std::fs::read_to_string(path).map_err(|source| MetadataError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_metadata_json(&json)
}

/// Import viewer settings from YAML format.
pub fn import_settings_yaml(path: &Path) -> Result<Settings> {
    let yaml = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read settings file {}", path.display()))?;
    let settings: Settings = serde_yaml::from_str(&yaml)
        .with_context(|| format!("Failed to parse settings file {}", path.display()))?;
    Ok(settings.sanitized())
}

/// Render settings as YAML, in the same shape [`import_settings_yaml`] reads.
pub fn export_settings_yaml(settings: &Settings) -> Result<String> {
    serde_yaml::to_string(settings).context("Failed to serialize settings")
}
