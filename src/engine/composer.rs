// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Scene composition and video texture lifecycle.
//!
//! A [`VideoSession`] owns the texture for the current video source and
//! tracks whether it may be rendered. [`compose`] turns the session and the
//! current markers into a [`Scene`]; it yields an empty scene until the
//! session is ready, so an uninitialized texture is never drawn.

use crate::models::marker::Marker;
use glam::Vec3;
use image::RgbaImage;
use std::fmt::Debug;

/// A GPU texture that receives video frames.
pub trait FrameTexture {
    type Id: Copy + Eq + Debug;

    fn id(&self) -> Self::Id;

    /// Replace the texture contents with `frame`.
    fn upload(&mut self, frame: &RgbaImage);

    /// Release the underlying resource. Called exactly once per texture.
    fn dispose(&mut self);
}

/// Scoped owner of at most one texture.
///
/// The held texture is disposed when it is replaced, released, or when the
/// slot is dropped, whichever happens first.
pub struct TextureSlot<T: FrameTexture> {
    texture: Option<T>,
}

impl<T: FrameTexture> Default for TextureSlot<T> {
    fn default() -> Self {
        Self { texture: None }
    }
}

impl<T: FrameTexture> TextureSlot<T> {
    /// Store `texture`, disposing the previous one first.
    pub fn acquire(&mut self, texture: T) {
        self.release();
        self.texture = Some(texture);
    }

    /// Dispose the held texture, if any.
    pub fn release(&mut self) {
        if let Some(mut old) = self.texture.take() {
            log::debug!("Disposing video texture {:?}", old.id());
            old.dispose();
        }
    }

    pub fn get(&self) -> Option<&T> {
        self.texture.as_ref()
    }

    pub fn get_mut(&mut self) -> Option<&mut T> {
        self.texture.as_mut()
    }
}

impl<T: FrameTexture> Drop for TextureSlot<T> {
    fn drop(&mut self) {
        self.release();
    }
}

/// Lifecycle of one video session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    NoSource,
    TextureCreated,
    Ready,
    Disposed,
}

/// The video texture and its readiness.
pub struct VideoSession<T: FrameTexture> {
    state: SessionState,
    slot: TextureSlot<T>,
}

impl<T: FrameTexture> Default for VideoSession<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: FrameTexture> VideoSession<T> {
    pub fn new() -> Self {
        Self {
            state: SessionState::NoSource,
            slot: TextureSlot::default(),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// A new source was assigned; `texture` replaces any previous one.
    pub fn assign_source(&mut self, texture: T) {
        self.slot.acquire(texture);
        self.state = SessionState::TextureCreated;
    }

    /// The source signalled that it can play.
    pub fn mark_ready(&mut self) {
        if self.state == SessionState::TextureCreated {
            self.state = SessionState::Ready;
        }
    }

    /// Release the texture on source change or shutdown.
    pub fn dispose(&mut self) {
        self.slot.release();
        if self.state != SessionState::NoSource {
            self.state = SessionState::Disposed;
        }
    }

    /// Ready and holding a texture.
    pub fn is_renderable(&self) -> bool {
        self.state == SessionState::Ready && self.slot.get().is_some()
    }

    pub fn texture(&self) -> Option<&T> {
        self.slot.get()
    }

    /// Upload the current video frame. Does nothing unless renderable.
    pub fn refresh(&mut self, frame: &RgbaImage) {
        if self.state != SessionState::Ready {
            return;
        }
        if let Some(texture) = self.slot.get_mut() {
            texture.upload(frame);
        }
    }
}

/// The inverted video sphere, textured on its inside face.
#[derive(Debug, Clone, PartialEq)]
pub struct SphereNode<Id> {
    pub texture: Id,
    pub radius: f32,
}

/// Everything drawn for one render tick.
#[derive(Debug, Clone, PartialEq)]
pub struct Scene<Id> {
    pub sphere: Option<SphereNode<Id>>,
    pub markers: Vec<Marker>,
}

impl<Id> Scene<Id> {
    pub fn empty() -> Self {
        Self {
            sphere: None,
            markers: Vec::new(),
        }
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.sphere.is_none() && self.markers.is_empty()
    }
}

/// Assemble the scene for this render tick.
///
/// Every marker is re-faced toward `camera`, since the camera can move
/// without the annotation data changing.
pub fn compose<T: FrameTexture>(
    session: &VideoSession<T>,
    sphere_radius: f32,
    mut markers: Vec<Marker>,
    camera: Vec3,
) -> Scene<T::Id> {
    let texture = match session.texture() {
        Some(texture) if session.is_renderable() => texture,
        _ => return Scene::empty(),
    };

    for marker in &mut markers {
        marker.face_towards(camera);
    }

    Scene {
        sphere: Some(SphereNode {
            texture: texture.id(),
            radius: sphere_radius,
        }),
        markers,
    }
}

/// Recording texture for lifecycle tests.
#[cfg(test)]
pub(crate) mod mock {
    use super::FrameTexture;
    use image::RgbaImage;
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::rc::Rc;

    /// Per-texture dispose and upload counts.
    #[derive(Default)]
    pub struct Log {
        pub disposed: HashMap<u32, usize>,
        pub uploads: HashMap<u32, usize>,
    }

    pub struct MockTexture {
        id: u32,
        log: Rc<RefCell<Log>>,
    }

    impl FrameTexture for MockTexture {
        type Id = u32;

        fn id(&self) -> u32 {
            self.id
        }

        fn upload(&mut self, _frame: &RgbaImage) {
            *self.log.borrow_mut().uploads.entry(self.id).or_default() += 1;
        }

        fn dispose(&mut self) {
            *self.log.borrow_mut().disposed.entry(self.id).or_default() += 1;
        }
    }

    pub fn new_log() -> Rc<RefCell<Log>> {
        Rc::new(RefCell::new(Log::default()))
    }

    pub fn texture(id: u32, log: &Rc<RefCell<Log>>) -> MockTexture {
        MockTexture {
            id,
            log: Rc::clone(log),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mock::{new_log, texture};
    use super::*;
    use glam::{Quat, Vec2};

    const SPHERE: f32 = 25.0;

    fn marker() -> Marker {
        Marker {
            normalized: Vec3::ZERO,
            position: Vec3::new(0.0, 0.0, -24.0),
            size: Vec2::ONE,
            label: None,
            rotation: Quat::IDENTITY,
        }
    }

    #[test]
    fn test_state_machine() {
        let log = new_log();
        let mut session = VideoSession::new();
        assert_eq!(session.state(), SessionState::NoSource);

        session.mark_ready();
        assert_eq!(session.state(), SessionState::NoSource);

        session.assign_source(texture(1, &log));
        assert_eq!(session.state(), SessionState::TextureCreated);
        assert!(!session.is_renderable());

        session.mark_ready();
        assert_eq!(session.state(), SessionState::Ready);
        assert!(session.is_renderable());

        session.dispose();
        assert_eq!(session.state(), SessionState::Disposed);
        assert!(!session.is_renderable());
    }

    #[test]
    fn test_nothing_rendered_before_ready() {
        let log = new_log();
        let mut session = VideoSession::new();
        let camera = Vec3::new(0.0, 0.0, 10.0);

        assert!(compose(&session, SPHERE, vec![marker()], camera).is_empty());

        session.assign_source(texture(1, &log));
        assert!(compose(&session, SPHERE, vec![marker()], camera).is_empty());

        session.refresh(&RgbaImage::new(2, 2));
        assert!(log.borrow().uploads.is_empty());

        session.mark_ready();
        let scene = compose(&session, SPHERE, vec![marker()], camera);
        assert_eq!(scene.sphere.as_ref().map(|s| s.texture), Some(1));
        assert_eq!(scene.markers.len(), 1);
    }

    #[test]
    fn test_source_swap_disposes_old_texture_once() {
        let log = new_log();
        let mut session = VideoSession::new();
        session.assign_source(texture(1, &log));
        session.mark_ready();
        session.refresh(&RgbaImage::new(2, 2));

        session.assign_source(texture(2, &log));
        session.mark_ready();
        let scene = compose(&session, SPHERE, Vec::new(), Vec3::ZERO);

        let sphere = scene.sphere.unwrap();
        assert_eq!(sphere.texture, 2);
        assert_ne!(sphere.texture, 1);
        assert_eq!(log.borrow().disposed.get(&1), Some(&1));
        assert_eq!(log.borrow().disposed.get(&2), None);

        session.refresh(&RgbaImage::new(2, 2));
        assert_eq!(log.borrow().uploads.get(&1), Some(&1));
        assert_eq!(log.borrow().uploads.get(&2), Some(&1));
    }

    #[test]
    fn test_swap_before_ready_still_disposes() {
        let log = new_log();
        let mut session = VideoSession::new();
        session.assign_source(texture(1, &log));
        session.assign_source(texture(2, &log));
        assert_eq!(log.borrow().disposed.get(&1), Some(&1));
        assert_eq!(session.state(), SessionState::TextureCreated);
    }

    #[test]
    fn test_drop_releases_texture() {
        let log = new_log();
        {
            let mut session = VideoSession::new();
            session.assign_source(texture(7, &log));
        }
        assert_eq!(log.borrow().disposed.get(&7), Some(&1));
    }

    #[test]
    fn test_explicit_dispose_then_drop_disposes_once() {
        let log = new_log();
        {
            let mut session = VideoSession::new();
            session.assign_source(texture(3, &log));
            session.mark_ready();
            session.dispose();
            session.dispose();
        }
        assert_eq!(log.borrow().disposed.get(&3), Some(&1));
    }

    #[test]
    fn test_markers_are_refaced_every_compose() {
        let log = new_log();
        let mut session = VideoSession::new();
        session.assign_source(texture(1, &log));
        session.mark_ready();

        for camera in [Vec3::new(0.0, 0.0, 10.0), Vec3::new(8.0, 3.0, 0.0)] {
            let scene = compose(&session, SPHERE, vec![marker()], camera);
            let m = &scene.markers[0];
            let expected = (camera - m.position).normalize();
            assert!(m.facing().abs_diff_eq(expected, 1e-5));
        }
    }

    #[test]
    fn test_compose_does_not_accumulate_markers() {
        let log = new_log();
        let mut session = VideoSession::new();
        session.assign_source(texture(1, &log));
        session.mark_ready();

        let first = compose(&session, SPHERE, vec![marker(), marker()], Vec3::ZERO);
        let second = compose(&session, SPHERE, vec![marker(), marker()], Vec3::ZERO);
        assert_eq!(first, second);
        assert_eq!(second.markers.len(), 2);
    }
}
