// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! I/O operations for media sources, metadata and settings.

pub mod media;
pub mod metadata;
pub mod serialization;
