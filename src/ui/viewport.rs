// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! 3D viewport for the video sphere and detection overlays.
//!
//! This module paints a composed [`Scene`] with egui: the sphere as a
//! textured triangle mesh seen from inside, and each marker as a wireframe
//! billboard with its label. Dragging inside the viewport orbits the camera.

use crate::engine::camera::{OrbitCamera, ViewportProjection};
use crate::engine::clock::FrameIndex;
use crate::engine::composer::{FrameTexture, Scene, SessionState};
use crate::models::marker::Marker;
use crate::util::geometry::sphere_direction;
use glam::{Vec2, Vec3};
use image::RgbaImage;

const MARKER_COLOR: egui::Color32 = egui::Color32::RED;

/// Result of viewport interaction.
pub enum ViewportAction {
    None,
    /// Pointer drag in points, with the viewport height it happened over.
    Orbit(Vec2, f32),
}

/// Frame/entry readout for the status line.
pub struct ViewportStatus {
    pub frame: FrameIndex,
    /// Position of the resolved entry, `None` when outside the metadata.
    pub entry: Option<usize>,
    pub entry_count: usize,
    pub metadata_loading: bool,
    pub session_state: SessionState,
    /// File name of the assigned source.
    pub source_name: Option<String>,
}

/// Video texture backed by an egui texture handle.
pub struct EguiTexture {
    handle: Option<egui::TextureHandle>,
    id: egui::TextureId,
}

impl EguiTexture {
    /// Allocate a placeholder texture; frames are uploaded once the source is ready.
    pub fn new(ctx: &egui::Context, name: &str) -> Self {
        let handle = ctx.load_texture(
            name,
            egui::ColorImage::new([1, 1], egui::Color32::BLACK),
            egui::TextureOptions::LINEAR,
        );
        let id = handle.id();
        Self {
            handle: Some(handle),
            id,
        }
    }
}

impl FrameTexture for EguiTexture {
    type Id = egui::TextureId;

    fn id(&self) -> egui::TextureId {
        self.id
    }

    fn upload(&mut self, frame: &RgbaImage) {
        if let Some(handle) = self.handle.as_mut() {
            let size = [frame.width() as usize, frame.height() as usize];
            let image = egui::ColorImage::from_rgba_unmultiplied(size, frame.as_raw());
            handle.set(image, egui::TextureOptions::LINEAR);
        }
    }

    fn dispose(&mut self) {
        // egui frees the texture when the last handle is dropped.
        self.handle = None;
    }
}

/// Unit sphere geometry, built once per segment count.
pub struct SphereMesh {
    vertices: Vec<(Vec3, Vec2)>,
    triangles: Vec<[u32; 3]>,
}

impl SphereMesh {
    pub fn new(width_segments: u32, height_segments: u32) -> Self {
        let mut vertices = Vec::with_capacity(((width_segments + 1) * (height_segments + 1)) as usize);
        for iy in 0..=height_segments {
            let v = iy as f32 / height_segments as f32;
            for ix in 0..=width_segments {
                let u = ix as f32 / width_segments as f32;
                let uv = Vec2::new(u, v);
                vertices.push((sphere_direction(uv), uv));
            }
        }

        let row = width_segments + 1;
        let mut triangles = Vec::with_capacity((width_segments * height_segments * 2) as usize);
        for iy in 0..height_segments {
            for ix in 0..width_segments {
                let a = iy * row + ix;
                let b = a + row;
                let c = b + 1;
                let d = a + 1;
                // Pole rows collapse to a point; skip the degenerate half.
                if iy != 0 {
                    triangles.push([a, b, d]);
                }
                if iy != height_segments - 1 {
                    triangles.push([b, c, d]);
                }
            }
        }

        Self { vertices, triangles }
    }

    /// Build the egui mesh for a sphere of `radius` as seen through `projection`.
    fn to_egui(&self, radius: f32, texture: egui::TextureId, projection: &ViewportProjection) -> egui::Mesh {
        let mut mesh = egui::Mesh::with_texture(texture);
        let mut visible = Vec::with_capacity(self.vertices.len());

        for (direction, uv) in &self.vertices {
            let screen = projection.to_screen(*direction * radius);
            visible.push(screen.is_some());
            let pos = screen.unwrap_or(Vec2::ZERO);
            mesh.vertices.push(egui::epaint::Vertex {
                pos: egui::pos2(pos.x, pos.y),
                uv: egui::pos2(uv.x, uv.y),
                color: egui::Color32::WHITE,
            });
        }

        for [a, b, c] in &self.triangles {
            if visible[*a as usize] && visible[*b as usize] && visible[*c as usize] {
                mesh.add_triangle(*a, *b, *c);
            }
        }
        mesh
    }
}

/// Display the viewport and handle orbit dragging.
pub fn show(
    ui: &mut egui::Ui,
    scene: &Scene<egui::TextureId>,
    sphere_mesh: &SphereMesh,
    camera: &OrbitCamera,
    status: &ViewportStatus,
) -> ViewportAction {
    let mut action = ViewportAction::None;
    ui.style_mut().visuals.extreme_bg_color = egui::Color32::from_gray(20);

    let status_height = ui.spacing().interact_size.y + ui.spacing().item_spacing.y * 2.0;
    let available = ui.available_size() - egui::vec2(0.0, status_height);
    let (rect, response) = ui.allocate_exact_size(available.max(egui::vec2(1.0, 1.0)), egui::Sense::drag());
    let painter = ui.painter_at(rect);
    painter.rect_filled(rect, 0.0, egui::Color32::from_gray(20));

    if response.dragged() {
        let delta = response.drag_delta();
        action = ViewportAction::Orbit(Vec2::new(delta.x, delta.y), rect.height());
    }

    let projection = ViewportProjection::new(
        camera,
        Vec2::new(rect.min.x, rect.min.y),
        Vec2::new(rect.width(), rect.height()),
    );

    match &scene.sphere {
        Some(sphere) => {
            painter.add(egui::Shape::mesh(sphere_mesh.to_egui(sphere.radius, sphere.texture, &projection)));
            for marker in &scene.markers {
                draw_marker(&painter, marker, &projection);
            }
        }
        None => {
            let message = match status.session_state {
                SessionState::TextureCreated => "Loading video...",
                SessionState::NoSource | SessionState::Disposed | SessionState::Ready => {
                    "Open a 360° video or image to begin (File → Open Video...)"
                }
            };
            painter.text(
                rect.center(),
                egui::Align2::CENTER_CENTER,
                message,
                egui::FontId::proportional(16.0),
                egui::Color32::from_gray(180),
            );
        }
    }

    ui.separator();
    ui.horizontal(|ui| {
        if let Some(name) = &status.source_name {
            ui.label(name);
            ui.separator();
        }
        ui.label(format!("Frame: {}", status.frame));
        ui.separator();
        match status.entry {
            Some(index) => ui.label(format!("Entry: {} / {}", index + 1, status.entry_count)),
            None => ui.label(format!("Entry: - / {}", status.entry_count)),
        };
        ui.separator();
        ui.label(format!("Detections: {}", scene.markers.len()));
        if status.metadata_loading {
            ui.separator();
            ui.spinner();
            ui.label("Loading metadata...");
        }
    });

    action
}

/// Draw one marker as a wireframe quad, with its label above it.
fn draw_marker(painter: &egui::Painter, marker: &Marker, projection: &ViewportProjection) {
    let corners: Option<Vec<egui::Pos2>> = marker
        .corners()
        .iter()
        .map(|corner| projection.to_screen(*corner).map(|p| egui::pos2(p.x, p.y)))
        .collect();
    let Some(corners) = corners else {
        return;
    };

    let top = corners[0].y.min(corners[3].y);
    let label_anchor = egui::pos2((corners[0].x + corners[3].x) * 0.5, top - 2.0);

    painter.add(egui::Shape::closed_line(corners, egui::Stroke::new(2.0, MARKER_COLOR)));

    if let Some(label) = &marker.label {
        painter.text(
            label_anchor,
            egui::Align2::CENTER_BOTTOM,
            label,
            egui::FontId::proportional(12.0),
            MARKER_COLOR,
        );
    }
}
