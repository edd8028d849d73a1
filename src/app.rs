// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Main application state and egui App implementation.
//!
//! This module contains the application structure that implements the
//! egui::App trait. Each update is one render tick: it drains background
//! loaders, advances playback, uploads the current video frame, derives the
//! markers for the current frame and paints the composed scene.

use crate::engine::camera::OrbitCamera;
use crate::engine::clock::FrameClock;
use crate::engine::composer::{compose, FrameTexture, VideoSession};
use crate::engine::projector::Projector;
use crate::engine::{derive_markers, resolver};
use crate::io::media::{self, Playback, PlaybackEvent, VideoSource};
use crate::io::metadata::MetadataStore;
use crate::models::settings::Settings;
use crate::ui::viewport::{EguiTexture, SphereMesh, ViewportAction, ViewportStatus};
use crate::ui::{controls, properties, timeline, viewport};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver, Sender, TryRecvError};

/// Result of background source opening.
type SourceResult = Result<Box<dyn VideoSource>, String>;

/// Outcome of polling a background source open.
enum SourcePoll {
    /// No open in flight, or its result has not arrived yet.
    Pending,
    Opened(Playback),
    Failed,
}

/// Assign `texture` for a new source and return the sender its open result
/// must arrive on. Any earlier open's receiver is dropped, so a superseded
/// result can never be applied.
fn begin_source<T: FrameTexture>(
    session: &mut VideoSession<T>,
    loader: &mut Option<Receiver<SourceResult>>,
    texture: T,
) -> Sender<SourceResult> {
    session.assign_source(texture);
    let (sender, receiver) = channel();
    *loader = Some(receiver);
    sender
}

/// Apply a finished source open. A failed open disposes the session.
fn poll_source<T: FrameTexture>(
    loader: &mut Option<Receiver<SourceResult>>,
    session: &mut VideoSession<T>,
    looping: bool,
) -> SourcePoll {
    let Some(receiver) = loader.as_ref() else {
        return SourcePoll::Pending;
    };
    let result = match receiver.try_recv() {
        Ok(result) => result,
        Err(TryRecvError::Empty) => return SourcePoll::Pending,
        Err(TryRecvError::Disconnected) => Err("source loader exited without a result".to_string()),
    };
    *loader = None;

    match result {
        Ok(source) => {
            let (w, h) = source.frame_size();
            log::info!("Source ready: {}x{}, {:.1}s", w, h, source.duration());
            SourcePoll::Opened(Playback::new(source, looping))
        }
        Err(e) => {
            log::error!("Failed to open source: {}", e);
            session.dispose();
            SourcePoll::Failed
        }
    }
}

/// Advance playback by `dt`, feed its signals to the session and the frame
/// clock, then upload the current frame.
fn drive_playback<T: FrameTexture>(
    playback: &mut Playback,
    session: &mut VideoSession<T>,
    clock: &mut FrameClock,
    dt: f64,
) {
    for event in playback.tick(dt) {
        match event {
            PlaybackEvent::CanPlay => {
                log::info!("Video can play");
                session.mark_ready();
            }
            PlaybackEvent::TimeUpdate(time) => {
                if clock.on_time_update(time) {
                    log::trace!("Frame {} at {:.3}s", clock.current(), time);
                }
            }
        }
    }

    // Continuous upload: the texture always shows the current frame.
    if session.is_renderable() {
        match playback.current_frame() {
            Ok(frame) => session.refresh(frame),
            Err(e) => log::error!("Failed to read video frame: {:#}", e),
        }
    }
}

/// Main application state.
pub struct SphereApp {
    settings: Settings,

    /// Detection metadata for the session
    store: MetadataStore,

    /// Playback time to frame index
    clock: FrameClock,

    projector: Projector,
    camera: OrbitCamera,

    /// Video texture and its lifecycle state
    session: VideoSession<EguiTexture>,

    sphere_mesh: SphereMesh,

    /// Transport for the opened source
    playback: Option<Playback>,

    /// Path of the currently assigned source
    source_path: Option<PathBuf>,

    /// Receiver for background source opening
    source_loader: Option<Receiver<SourceResult>>,

    /// Counter for naming video textures
    texture_counter: u64,
}

impl SphereApp {
    /// Create the application and start the one-shot metadata load.
    pub fn new(ctx: &egui::Context, settings: Settings, initial_source: Option<PathBuf>) -> Self {
        let mut store = MetadataStore::new();
        store.load(Path::new(&settings.metadata_path));

        let mut app = Self {
            clock: FrameClock::new(settings.fps),
            projector: Projector::from_settings(&settings),
            camera: OrbitCamera::new(
                settings.camera_distance,
                settings.field_of_view_degrees,
                settings.rotate_speed,
            ),
            session: VideoSession::new(),
            sphere_mesh: SphereMesh::new(settings.sphere_width_segments, settings.sphere_height_segments),
            playback: None,
            source_path: None,
            source_loader: None,
            texture_counter: 0,
            store,
            settings,
        };

        if let Some(path) = initial_source {
            app.open_source(path, ctx);
        }
        app
    }

    /// Assign a new video source and open it in the background.
    pub fn open_source(&mut self, path: PathBuf, ctx: &egui::Context) {
        log::info!("Opening source: {}", path.display());

        // The new texture replaces the old one, which is disposed here,
        // before the next render pass can reference it.
        self.texture_counter += 1;
        let name = format!("video_texture_{}", self.texture_counter);
        let sender = begin_source(&mut self.session, &mut self.source_loader, EguiTexture::new(ctx, &name));
        self.playback = None;
        self.clock.reset();
        self.source_path = Some(path.clone());

        let still_duration = self.settings.still_duration_secs;

        std::thread::spawn(move || {
            let result = media::open_source(&path, still_duration).map_err(|e| format!("{:#}", e));
            let _ = sender.send(result);
        });
    }

    /// Load a metadata file chosen by the user, replacing the current set.
    fn load_metadata(&mut self, path: PathBuf) {
        self.store.load(&path);
    }

    /// Apply a finished source load.
    fn poll_source_loader(&mut self) {
        match poll_source(&mut self.source_loader, &mut self.session, self.settings.loop_playback) {
            SourcePoll::Pending => {}
            SourcePoll::Opened(playback) => self.playback = Some(playback),
            SourcePoll::Failed => self.source_path = None,
        }
    }

    /// Advance playback and feed its signals to the session and frame clock.
    fn advance_playback(&mut self, dt: f64) {
        if let Some(playback) = self.playback.as_mut() {
            drive_playback(playback, &mut self.session, &mut self.clock, dt);
        }
    }
}

impl eframe::App for SphereApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Drain background loaders
        if self.store.poll() {
            log::debug!("Metadata set version {} active", self.store.set().version());
        }
        self.poll_source_loader();

        let dt = ctx.input(|i| i.stable_dt) as f64;
        self.advance_playback(dt);

        // Keep rendering while there is anything to animate or wait for
        if self.session.is_renderable() || self.source_loader.is_some() || self.store.is_loading() {
            ctx.request_repaint();
        }

        // Top menu bar
        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                ui.menu_button("File", |ui| {
                    if ui.button("Open Video...").clicked() {
                        // Open native file picker
                        let mut extensions: Vec<&str> = media::IMAGE_EXTENSIONS.to_vec();
                        if cfg!(feature = "video-opencv") {
                            extensions.extend_from_slice(media::VIDEO_EXTENSIONS);
                        }
                        if let Some(path) = rfd::FileDialog::new()
                            .add_filter("360° media", extensions.as_slice())
                            .pick_file()
                        {
                            self.open_source(path, ctx);
                        }
                        ui.close_menu();
                    }
                    if ui.button("Load Metadata...").clicked() {
                        if let Some(path) = rfd::FileDialog::new()
                            .add_filter("Metadata", &["json"])
                            .pick_file()
                        {
                            self.load_metadata(path);
                        }
                        ui.close_menu();
                    }
                    ui.separator();
                    if ui.button("Quit").clicked() {
                        ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                    }
                });
            });
        });

        // Playback controls, only once a source is open
        if let Some(playback) = self.playback.as_mut() {
            let frame = self.clock.current();
            let (action, seek) = egui::TopBottomPanel::bottom("controls")
                .show(ctx, |ui| {
                    let seek = timeline::show(ui, playback.current_time(), playback.duration());
                    let action = controls::show(
                        ui,
                        playback.is_playing(),
                        playback.current_time(),
                        playback.duration(),
                        frame,
                    );
                    (action, seek)
                })
                .inner;

            match action {
                controls::ControlsAction::Stop => playback.stop(),
                controls::ControlsAction::TogglePlay => playback.toggle_play(),
                controls::ControlsAction::None => {}
            }
            if let Some(time) = seek {
                playback.seek(time);
            }
        }

        let set = self.store.set();
        let frame = self.clock.current();
        let samples = self.settings.samples_per_entry;
        let entry_position = usize::try_from(resolver::entry_index(frame, samples))
            .ok()
            .filter(|index| *index < set.len());

        // Detections panel (right side)
        egui::SidePanel::right("properties")
            .default_width(250.0)
            .show(ctx, |ui| properties::show(ui, set, entry_position));

        // Markers are derived from scratch every tick and faced toward the camera
        let camera_position = self.camera.position();
        let markers = derive_markers(set, frame, samples, &self.projector, camera_position);
        let scene = compose(&self.session, self.settings.sphere_radius, markers, camera_position);

        let status = ViewportStatus {
            frame,
            entry: entry_position,
            entry_count: set.len(),
            metadata_loading: self.store.is_loading(),
            session_state: self.session.state(),
            source_name: self
                .source_path
                .as_ref()
                .and_then(|p| p.file_name())
                .map(|name| name.to_string_lossy().into_owned()),
        };

        let viewport_action = egui::CentralPanel::default()
            .show(ctx, |ui| viewport::show(ui, &scene, &self.sphere_mesh, &self.camera, &status))
            .inner;

        if let ViewportAction::Orbit(delta, height) = viewport_action {
            self.camera.orbit(delta, height);
        }
    }
}

impl Drop for SphereApp {
    fn drop(&mut self) {
        // A late metadata result must not land after teardown.
        self.store.teardown();
        self.session.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::composer::mock::{new_log, texture};
    use crate::engine::composer::SessionState;
    use crate::io::media::StillImageSource;
    use image::RgbaImage;

    fn still() -> SourceResult {
        Ok(Box::new(StillImageSource::new(RgbaImage::new(4, 2), 10.0)))
    }

    #[test]
    fn test_failed_open_disposes_session() {
        let log = new_log();
        let mut session = VideoSession::new();
        let mut loader = None;

        let sender = begin_source(&mut session, &mut loader, texture(1, &log));
        assert!(matches!(poll_source(&mut loader, &mut session, true), SourcePoll::Pending));

        sender.send(Err("unsupported codec".to_string())).unwrap();
        assert!(matches!(poll_source(&mut loader, &mut session, true), SourcePoll::Failed));
        assert_eq!(session.state(), SessionState::Disposed);
        assert_eq!(log.borrow().disposed.get(&1), Some(&1));
        assert!(loader.is_none());
    }

    #[test]
    fn test_superseded_open_is_ignored() {
        let log = new_log();
        let mut session = VideoSession::new();
        let mut loader = None;

        let first = begin_source(&mut session, &mut loader, texture(1, &log));
        let second = begin_source(&mut session, &mut loader, texture(2, &log));

        // The first receiver is gone, so its late result cannot land.
        assert!(first.send(Err("stale".to_string())).is_err());
        assert!(matches!(poll_source(&mut loader, &mut session, true), SourcePoll::Pending));
        assert_eq!(session.state(), SessionState::TextureCreated);
        assert_eq!(session.texture().map(|t| t.id()), Some(2));

        second.send(still()).unwrap();
        assert!(matches!(poll_source(&mut loader, &mut session, true), SourcePoll::Opened(_)));
        assert_eq!(log.borrow().disposed.get(&1), Some(&1));
        assert_eq!(log.borrow().disposed.get(&2), None);
    }

    #[test]
    fn test_vanished_loader_counts_as_failure() {
        let log = new_log();
        let mut session = VideoSession::new();
        let mut loader = None;

        drop(begin_source(&mut session, &mut loader, texture(1, &log)));
        assert!(matches!(poll_source(&mut loader, &mut session, true), SourcePoll::Failed));
        assert_eq!(session.state(), SessionState::Disposed);
    }

    #[test]
    fn test_can_play_readies_session_before_first_upload() {
        let log = new_log();
        let mut session = VideoSession::new();
        let mut loader = None;
        let mut clock = FrameClock::new(30.0);

        begin_source(&mut session, &mut loader, texture(1, &log))
            .send(still())
            .unwrap();
        let SourcePoll::Opened(mut playback) = poll_source(&mut loader, &mut session, true) else {
            panic!("source should open");
        };
        assert_eq!(session.state(), SessionState::TextureCreated);

        drive_playback(&mut playback, &mut session, &mut clock, 0.016);
        assert_eq!(session.state(), SessionState::Ready);
        assert_eq!(log.borrow().uploads.get(&1), Some(&1));

        drive_playback(&mut playback, &mut session, &mut clock, 0.016);
        assert_eq!(log.borrow().uploads.get(&1), Some(&2));
    }

    #[test]
    fn test_playback_time_drives_clock() {
        let log = new_log();
        let mut session = VideoSession::new();
        let mut loader = None;
        let mut clock = FrameClock::new(30.0);

        begin_source(&mut session, &mut loader, texture(1, &log))
            .send(still())
            .unwrap();
        let SourcePoll::Opened(mut playback) = poll_source(&mut loader, &mut session, true) else {
            panic!("source should open");
        };

        drive_playback(&mut playback, &mut session, &mut clock, 0.0);
        playback.toggle_play();
        drive_playback(&mut playback, &mut session, &mut clock, 2.5);
        assert_eq!(clock.current(), 75);
    }
}
