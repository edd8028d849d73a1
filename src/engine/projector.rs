// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Projection of 2D detection boxes onto the video sphere.
//!
//! A box's pixel position is normalized by the image plane size and mapped
//! to the same equirectangular point the sphere mesh uses for that texel.
//! Markers sit slightly inside the sphere so they draw in front of the video.

use crate::models::annotation::Annotation;
use crate::models::marker::{billboard_rotation, Marker};
use crate::models::settings::Settings;
use crate::util::geometry::{normalize_coordinates, sphere_arc_size, sphere_point};
use glam::{Vec2, Vec3};

/// Pixel size of the image the detections were computed on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImagePlane {
    pub width: f32,
    pub height: f32,
}

/// Turns annotations into markers.
#[derive(Debug, Clone, PartialEq)]
pub struct Projector {
    image_plane: ImagePlane,
    /// Radius at which markers are placed.
    marker_radius: f32,
    default_size: f32,
}

impl Projector {
    pub fn new(image_plane: ImagePlane, sphere_radius: f32, inset: f32, default_size: f32) -> Self {
        Self {
            image_plane,
            marker_radius: sphere_radius * inset,
            default_size,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            ImagePlane {
                width: settings.image_plane[0],
                height: settings.image_plane[1],
            },
            settings.sphere_radius,
            settings.marker_inset,
            settings.default_marker_size,
        )
    }

    /// Project one detection, facing it toward `camera`.
    ///
    /// Returns `None` only for a bbox that cannot be interpreted.
    pub fn project(&self, annotation: &Annotation, camera: Vec3) -> Option<Marker> {
        let bbox = annotation.bounding_box()?;
        let anchor = normalize_coordinates(bbox.x, bbox.y, self.image_plane.width, self.image_plane.height);

        // Boxes are anchored at their top-left corner; center the marker on the box.
        let (center, size) = match bbox.size {
            Some((w, h)) => {
                let extent = normalize_coordinates(w, h, self.image_plane.width, self.image_plane.height);
                let center = anchor + extent * 0.5;
                let arc = sphere_arc_size(center, extent, self.marker_radius);
                (center, arc.max(Vec2::splat(f32::EPSILON)))
            }
            None => (anchor, Vec2::splat(self.default_size)),
        };

        let position = sphere_point(center, self.marker_radius);
        Some(Marker {
            normalized: anchor.extend(0.0),
            position,
            size,
            label: annotation.label().map(str::to_owned),
            rotation: billboard_rotation(position, camera),
        })
    }

    /// Project every annotation, skipping uninterpretable boxes.
    pub fn project_all(&self, annotations: &[Annotation], camera: Vec3) -> Vec<Marker> {
        annotations
            .iter()
            .filter_map(|annotation| self.project(annotation, camera))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn projector() -> Projector {
        Projector::new(
            ImagePlane {
                width: 1280.0,
                height: 720.0,
            },
            25.0,
            0.97,
            0.5,
        )
    }

    #[test]
    fn test_normalized_position() {
        let ann = Annotation::new(Some("crack".into()), vec![100.0, 50.0, 20.0, 20.0]);
        let marker = projector().project(&ann, Vec3::new(0.0, 0.0, 10.0)).unwrap();

        assert_relative_eq!(marker.normalized.x, 100.0 / 1280.0, epsilon = 1e-6);
        assert_relative_eq!(marker.normalized.y, 50.0 / 720.0, epsilon = 1e-6);
        assert_eq!(marker.normalized.z, 0.0);
        assert_eq!(marker.label.as_deref(), Some("crack"));
    }

    #[test]
    fn test_point_bbox_gets_default_size() {
        let ann = Annotation::new(None, vec![640.0, 360.0]);
        let marker = projector().project(&ann, Vec3::ZERO).unwrap();
        assert_eq!(marker.size, Vec2::splat(0.5));
        assert!(marker.size.x > 0.0 && marker.size.y > 0.0);
        assert_eq!(marker.label, None);
    }

    #[test]
    fn test_size_is_proportional_to_bbox() {
        let p = projector();
        let small = p.project(&Annotation::new(None, vec![600.0, 340.0, 20.0, 20.0]), Vec3::ZERO).unwrap();
        let large = p.project(&Annotation::new(None, vec![590.0, 330.0, 40.0, 40.0]), Vec3::ZERO).unwrap();
        assert_relative_eq!(large.size.x / small.size.x, 2.0, epsilon = 1e-3);
        assert_relative_eq!(large.size.y / small.size.y, 2.0, epsilon = 1e-3);
    }

    #[test]
    fn test_marker_sits_inside_sphere() {
        let ann = Annotation::new(None, vec![300.0, 200.0, 10.0, 10.0]);
        let marker = projector().project(&ann, Vec3::ZERO).unwrap();
        assert_relative_eq!(marker.position.length(), 25.0 * 0.97, epsilon = 1e-3);
    }

    #[test]
    fn test_marker_faces_camera() {
        let camera = Vec3::new(0.0, 0.0, 10.0);
        let ann = Annotation::new(None, vec![300.0, 200.0]);
        let marker = projector().project(&ann, camera).unwrap();
        let expected = (camera - marker.position).normalize();
        assert!(marker.facing().abs_diff_eq(expected, 1e-5));
    }

    #[test]
    fn test_invalid_bbox_is_skipped() {
        let anns = vec![
            Annotation::new(None, vec![1.0]),
            Annotation::new(None, vec![10.0, 10.0]),
        ];
        assert_eq!(projector().project_all(&anns, Vec3::ZERO).len(), 1);
    }

    #[test]
    fn test_projection_is_idempotent() {
        let anns = vec![
            Annotation::new(Some("a".into()), vec![10.0, 10.0, 5.0, 5.0]),
            Annotation::new(None, vec![500.0, 100.0]),
        ];
        let camera = Vec3::new(1.0, 2.0, 3.0);
        assert_eq!(projector().project_all(&anns, camera), projector().project_all(&anns, camera));
    }
}
