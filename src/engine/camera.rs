// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Orbit camera.
//!
//! The viewer sits inside the video sphere and orbits its center. Dragging
//! rotates the camera; there is no pan or zoom.

use glam::{Mat4, Vec2, Vec3, Vec4};
use std::f32::consts::FRAC_PI_2;

/// Keeps the camera from flipping over the poles.
const MAX_PITCH: f32 = FRAC_PI_2 - 0.01;
const NEAR_PLANE: f32 = 0.1;
const FAR_PLANE: f32 = 1000.0;

/// A perspective camera orbiting the origin.
#[derive(Debug, Clone, PartialEq)]
pub struct OrbitCamera {
    pub distance: f32,
    pub yaw: f32,
    pub pitch: f32,
    pub fov_y_degrees: f32,
    /// Radians of rotation per point of drag, scaled by `rotate_speed`.
    pub rotate_speed: f32,
}

impl OrbitCamera {
    /// Camera at `(0, 0, distance)` looking at the origin.
    pub fn new(distance: f32, fov_y_degrees: f32, rotate_speed: f32) -> Self {
        Self {
            distance,
            yaw: 0.0,
            pitch: 0.0,
            fov_y_degrees,
            rotate_speed,
        }
    }

    /// Eye position in world space.
    pub fn position(&self) -> Vec3 {
        let (sin_yaw, cos_yaw) = self.yaw.sin_cos();
        let (sin_pitch, cos_pitch) = self.pitch.sin_cos();
        Vec3::new(
            self.distance * cos_pitch * sin_yaw,
            self.distance * sin_pitch,
            self.distance * cos_pitch * cos_yaw,
        )
    }

    /// Rotate by a pointer drag of `delta` points over a viewport of `viewport_height` points.
    pub fn orbit(&mut self, delta: Vec2, viewport_height: f32) {
        if viewport_height <= 0.0 {
            return;
        }
        let scale = std::f32::consts::TAU / viewport_height * self.rotate_speed;
        self.yaw -= delta.x * scale;
        self.pitch = (self.pitch + delta.y * scale).clamp(-MAX_PITCH, MAX_PITCH);
    }

    /// Combined projection and view matrix for a viewport of the given aspect ratio.
    pub fn view_projection(&self, aspect: f32) -> Mat4 {
        let eye = self.position();
        // At distance 0 the eye sits on the target; look down -Z rotated by yaw/pitch.
        let target = if self.distance > 0.0 {
            Vec3::ZERO
        } else {
            let (sin_yaw, cos_yaw) = self.yaw.sin_cos();
            let (sin_pitch, cos_pitch) = self.pitch.sin_cos();
            -Vec3::new(cos_pitch * sin_yaw, sin_pitch, cos_pitch * cos_yaw)
        };
        let view = Mat4::look_at_rh(eye, target, Vec3::Y);
        let projection = Mat4::perspective_rh(
            self.fov_y_degrees.to_radians(),
            aspect.max(f32::EPSILON),
            NEAR_PLANE,
            FAR_PLANE,
        );
        projection * view
    }
}

/// Projects world points to a 2D viewport.
#[derive(Debug, Clone, Copy)]
pub struct ViewportProjection {
    view_projection: Mat4,
    origin: Vec2,
    size: Vec2,
}

impl ViewportProjection {
    pub fn new(camera: &OrbitCamera, origin: Vec2, size: Vec2) -> Self {
        Self {
            view_projection: camera.view_projection(size.x / size.y.max(1.0)),
            origin,
            size,
        }
    }

    /// Screen position of `point`, or `None` when it is behind the near plane.
    pub fn to_screen(&self, point: Vec3) -> Option<Vec2> {
        let clip: Vec4 = self.view_projection * point.extend(1.0);
        if clip.w <= NEAR_PLANE {
            return None;
        }
        let ndc = clip.truncate() / clip.w;
        Some(Vec2::new(
            self.origin.x + (ndc.x + 1.0) * 0.5 * self.size.x,
            self.origin.y + (1.0 - ndc.y) * 0.5 * self.size.y,
        ))
    }
}
