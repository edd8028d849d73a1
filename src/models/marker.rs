// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Projected 3D detection markers.
//!
//! Markers are derived state: they are rebuilt from the resolved annotations
//! on every render and never stored.

use glam::{Mat3, Quat, Vec2, Vec3};

/// A detection box placed in the 3D scene.
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    /// Pixel position divided by the image plane size, `z` always 0.
    pub normalized: Vec3,
    /// Center of the marker in world space.
    pub position: Vec3,
    /// Width and height of the marker quad in world units.
    pub size: Vec2,
    pub label: Option<String>,
    /// Rotation taking the quad's local +Z (its visible face) toward the camera.
    pub rotation: Quat,
}

impl Marker {
    /// Re-orient the marker so its face points at `camera`.
    ///
    /// Must be called every render tick, since the camera moves
    /// independently of the annotation data.
    pub fn face_towards(&mut self, camera: Vec3) {
        self.rotation = billboard_rotation(self.position, camera);
    }

    /// Unit normal of the visible face.
    #[cfg(test)]
    pub fn facing(&self) -> Vec3 {
        self.rotation * Vec3::Z
    }

    /// World-space corners of the marker quad, counter-clockwise from the
    /// top-left as seen by the camera.
    pub fn corners(&self) -> [Vec3; 4] {
        let right = self.rotation * Vec3::X * (self.size.x * 0.5);
        let up = self.rotation * Vec3::Y * (self.size.y * 0.5);
        [
            self.position - right + up,
            self.position - right - up,
            self.position + right - up,
            self.position + right + up,
        ]
    }
}

/// Rotation for a quad at `position` whose +Z face looks at `camera`, keeping
/// world +Y as the up direction where possible.
pub fn billboard_rotation(position: Vec3, camera: Vec3) -> Quat {
    let forward = (camera - position).normalize_or_zero();
    if forward == Vec3::ZERO {
        return Quat::IDENTITY;
    }

    // Looking straight up or down: any horizontal right vector works.
    let reference_up = if forward.cross(Vec3::Y).length_squared() < 1e-6 {
        Vec3::Z
    } else {
        Vec3::Y
    };
    let right = reference_up.cross(forward).normalize();
    let up = forward.cross(right);

    Quat::from_mat3(&Mat3::from_cols(right, up, forward))
}
