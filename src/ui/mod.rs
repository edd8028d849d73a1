// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! UI components for the sphere viewer.

pub mod controls;
pub mod properties;
pub mod timeline;
pub mod viewport;
