// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Frame synchronization and projection engine.
//!
//! Playback time flows through the [`clock`] into a frame index, the
//! [`resolver`] picks the matching metadata entry, the [`projector`] turns
//! its detections into markers and the [`composer`] assembles the scene.

pub mod camera;
pub mod clock;
pub mod composer;
pub mod projector;
pub mod resolver;

use crate::models::marker::Marker;
use crate::models::metadata::MetadataSet;
use clock::FrameIndex;
use glam::Vec3;
use projector::Projector;
use std::num::NonZeroU32;

/// Markers for `frame`, derived from scratch.
///
/// Pure function of its inputs; callers re-run it every render instead of
/// keeping marker objects around.
pub fn derive_markers(
    set: &MetadataSet,
    frame: FrameIndex,
    samples_per_entry: NonZeroU32,
    projector: &Projector,
    camera: Vec3,
) -> Vec<Marker> {
    let annotations = resolver::resolve(set, frame, samples_per_entry);
    projector.project_all(annotations, camera)
}
