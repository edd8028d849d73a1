// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Data models for detections, metadata, markers and settings.

pub mod annotation;
pub mod marker;
pub mod metadata;
pub mod settings;
