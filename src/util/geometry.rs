// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Geometric utility functions.
//!
//! This module provides coordinate transformations between pixel
//! coordinates, normalized texture coordinates and points on the video sphere.

use glam::{Vec2, Vec3};
use std::f32::consts::{PI, TAU};

/// Convert pixel coordinates to normalized coordinates (0.0 to 1.0).
pub fn normalize_coordinates(pixel_x: f64, pixel_y: f64, width: f32, height: f32) -> Vec2 {
    Vec2::new(
        (pixel_x / width as f64) as f32,
        (pixel_y / height as f64) as f32,
    )
}

/// Unit direction of the sphere point at texture coordinate `uv`.
///
/// `u` runs around the equator, increasing to the right when seen from
/// inside, and `v` runs from the top pole (0) to the bottom pole (1).
/// The sphere mesh and the marker projection both go through this
/// function, so a marker always lands on the texel it annotates.
pub fn sphere_direction(uv: Vec2) -> Vec3 {
    let phi = uv.x * TAU;
    let theta = uv.y * PI;
    Vec3::new(
        phi.cos() * theta.sin(),
        theta.cos(),
        phi.sin() * theta.sin(),
    )
}

/// Point on a sphere of `radius` at texture coordinate `uv`.
pub fn sphere_point(uv: Vec2, radius: f32) -> Vec3 {
    sphere_direction(uv) * radius
}

/// Arc lengths covered by a normalized extent centered at `uv`.
///
/// Horizontal arcs shrink toward the poles with the circle of latitude.
pub fn sphere_arc_size(uv: Vec2, extent: Vec2, radius: f32) -> Vec2 {
    let latitude_scale = (uv.y * PI).sin().abs();
    Vec2::new(
        extent.x * TAU * radius * latitude_scale,
        extent.y * PI * radius,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_normalize_corners() {
        let tl = normalize_coordinates(0.0, 0.0, 1920.0, 1080.0);
        assert_eq!(tl, Vec2::ZERO);

        let br = normalize_coordinates(1920.0, 1080.0, 1920.0, 1080.0);
        assert_eq!(br, Vec2::ONE);
    }

    #[test]
    fn test_sphere_points_lie_on_radius() {
        for uv in [Vec2::new(0.1, 0.2), Vec2::new(0.5, 0.5), Vec2::new(0.9, 0.95)] {
            assert_relative_eq!(sphere_point(uv, 25.0).length(), 25.0, epsilon = 1e-4);
        }
    }

    #[test]
    fn test_poles_and_equator() {
        assert!(sphere_direction(Vec2::new(0.3, 0.0)).abs_diff_eq(Vec3::Y, 1e-6));
        assert!(sphere_direction(Vec2::new(0.3, 1.0)).abs_diff_eq(-Vec3::Y, 1e-6));
        assert!(sphere_direction(Vec2::new(0.0, 0.5)).abs_diff_eq(Vec3::X, 1e-6));
        assert!(sphere_direction(Vec2::new(0.25, 0.5)).abs_diff_eq(Vec3::Z, 1e-6));
    }

    #[test]
    fn test_arc_size_at_equator() {
        let size = sphere_arc_size(Vec2::new(0.5, 0.5), Vec2::new(0.25, 0.5), 10.0);
        assert_relative_eq!(size.x, 0.25 * TAU * 10.0, epsilon = 1e-4);
        assert_relative_eq!(size.y, 0.5 * PI * 10.0, epsilon = 1e-4);
    }
}
