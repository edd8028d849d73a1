// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Session configuration.
//!
//! All tunables of the viewer live here. Values are read once at startup
//! from an optional YAML file and stay fixed for the session.

use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;

/// Metadata file loaded when the application starts.
pub const DEFAULT_METADATA_PATH: &str = "metadata/defects_coco_GS012237_1719791982345517.json";

/// Video frames covered by one metadata entry unless configured otherwise.
pub const DEFAULT_SAMPLES_PER_ENTRY: NonZeroU32 = match NonZeroU32::new(30) {
    Some(n) => n,
    None => unreachable!(),
};

/// Viewer configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Frame rate used to turn playback time into frame indices.
    pub fps: f64,
    /// Number of video frames covered by one metadata entry.
    pub samples_per_entry: NonZeroU32,
    /// Metadata file fetched on startup.
    pub metadata_path: String,
    /// Pixel size of the image the detections were computed on.
    pub image_plane: [f32; 2],
    pub sphere_radius: f32,
    pub sphere_width_segments: u32,
    pub sphere_height_segments: u32,
    /// Fraction of the sphere radius at which markers are placed.
    pub marker_inset: f32,
    /// World size of markers whose bbox has no width/height.
    pub default_marker_size: f32,
    pub camera_distance: f32,
    pub field_of_view_degrees: f32,
    /// Orbit speed; negative values invert drag direction.
    pub rotate_speed: f32,
    /// Clip length assigned to still equirectangular images.
    pub still_duration_secs: f64,
    pub loop_playback: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            fps: 30.0,
            samples_per_entry: DEFAULT_SAMPLES_PER_ENTRY,
            metadata_path: DEFAULT_METADATA_PATH.to_string(),
            image_plane: [1280.0, 720.0],
            sphere_radius: 25.0,
            sphere_width_segments: 60,
            sphere_height_segments: 40,
            marker_inset: 0.97,
            default_marker_size: 0.5,
            camera_distance: 10.0,
            field_of_view_degrees: 75.0,
            rotate_speed: -0.5,
            still_duration_secs: 60.0,
            loop_playback: true,
        }
    }
}

impl Settings {
    /// Replace out-of-range values with their defaults, logging each fix.
    pub fn sanitized(mut self) -> Self {
        let defaults = Settings::default();

        if !(self.fps.is_finite() && self.fps > 0.0) {
            log::warn!("Invalid fps {}, using {}", self.fps, defaults.fps);
            self.fps = defaults.fps;
        }
        if !self.image_plane.iter().all(|v| v.is_finite() && *v > 0.0) {
            log::warn!("Invalid image plane {:?}, using {:?}", self.image_plane, defaults.image_plane);
            self.image_plane = defaults.image_plane;
        }
        if !(self.sphere_radius > 0.0) {
            log::warn!("Invalid sphere radius {}, using {}", self.sphere_radius, defaults.sphere_radius);
            self.sphere_radius = defaults.sphere_radius;
        }
        if self.sphere_width_segments < 3 || self.sphere_height_segments < 2 {
            log::warn!("Sphere needs at least 3x2 segments, using defaults");
            self.sphere_width_segments = defaults.sphere_width_segments;
            self.sphere_height_segments = defaults.sphere_height_segments;
        }
        if !(self.marker_inset > 0.0 && self.marker_inset <= 1.0) {
            log::warn!("Invalid marker inset {}, using {}", self.marker_inset, defaults.marker_inset);
            self.marker_inset = defaults.marker_inset;
        }
        if !(self.default_marker_size > 0.0) {
            log::warn!(
                "Invalid default marker size {}, using {}",
                self.default_marker_size,
                defaults.default_marker_size
            );
            self.default_marker_size = defaults.default_marker_size;
        }
        if !(self.camera_distance >= 0.0 && self.camera_distance < self.sphere_radius) {
            log::warn!(
                "Camera distance {} puts the camera outside the sphere, using {}",
                self.camera_distance,
                defaults.camera_distance.min(self.sphere_radius * 0.5)
            );
            self.camera_distance = defaults.camera_distance.min(self.sphere_radius * 0.5);
        }
        if !(self.field_of_view_degrees > 1.0 && self.field_of_view_degrees < 179.0) {
            log::warn!("Invalid field of view {}, using {}", self.field_of_view_degrees, defaults.field_of_view_degrees);
            self.field_of_view_degrees = defaults.field_of_view_degrees;
        }
        if !(self.still_duration_secs.is_finite() && self.still_duration_secs > 0.0) {
            self.still_duration_secs = defaults.still_duration_secs;
        }

        self
    }
}
