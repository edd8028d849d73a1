// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Media sources and playback transport.
//!
//! This module handles opening equirectangular images and videos, and the
//! playback clock that drives them. It plays the role of the video element:
//! it owns play/pause/seek and reports "can play" and time-update signals.

use anyhow::{Context, Result};
use image::RgbaImage;
use std::path::Path;

/// File extensions opened as still equirectangular images.
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tif", "webp"];

/// File extensions opened as video when OpenCV support is compiled in.
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "mkv", "avi", "webm"];

/// A source of equirectangular frames addressed by playback time.
pub trait VideoSource: Send {
    /// Clip length in seconds.
    fn duration(&self) -> f64;

    /// Frame dimensions in pixels.
    fn frame_size(&self) -> (u32, u32);

    /// The frame to show at `time` seconds.
    fn frame_at(&mut self, time: f64) -> Result<&RgbaImage>;
}

/// A single equirectangular image played as a clip of fixed length.
pub struct StillImageSource {
    image: RgbaImage,
    duration: f64,
}

impl StillImageSource {
    pub fn new(image: RgbaImage, duration: f64) -> Self {
        Self { image, duration }
    }

    /// Load an image file.
    pub fn open(path: &Path, duration: f64) -> Result<Self> {
        let image = image::open(path)
            .with_context(|| format!("Failed to open image {}", path.display()))?
            .to_rgba8();
        Ok(Self::new(image, duration))
    }
}

impl VideoSource for StillImageSource {
    fn duration(&self) -> f64 {
        self.duration
    }

    fn frame_size(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    fn frame_at(&mut self, _time: f64) -> Result<&RgbaImage> {
        Ok(&self.image)
    }
}

/// How a decoder reaches a requested frame from the one it holds.
#[cfg_attr(not(feature = "video-opencv"), allow(dead_code))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DecodeStep {
    /// The held frame is already the target.
    Hold,
    /// Decode forward from the held frame.
    ReadAhead,
    /// Reposition the stream before decoding.
    Seek,
}

/// Clamp `target` to the known last frame and choose how to reach it from
/// `decoded`. Targets more than `max_ahead` frames ahead are sought.
#[cfg_attr(not(feature = "video-opencv"), allow(dead_code))]
fn plan_decode(target: i64, decoded: i64, last_frame: Option<i64>, max_ahead: i64) -> (i64, DecodeStep) {
    let target = last_frame.map_or(target, |last| target.min(last));
    let step = if target == decoded {
        DecodeStep::Hold
    } else if target < decoded || target > decoded + max_ahead {
        DecodeStep::Seek
    } else {
        DecodeStep::ReadAhead
    };
    (target, step)
}

#[cfg(feature = "video-opencv")]
pub use capture::CaptureSource;

#[cfg(feature = "video-opencv")]
mod capture {
    use super::{plan_decode, DecodeStep, VideoSource};
    use anyhow::{Context, Result};
    use image::RgbaImage;
    use opencv::{
        core::Mat,
        imgproc,
        prelude::*,
        videoio::{self, VideoCapture},
    };
    use std::path::Path;

    /// Frames further ahead than this are reached by seeking instead of decoding.
    const MAX_DECODE_AHEAD: i64 = 30;

    /// A video file decoded with OpenCV.
    pub struct CaptureSource {
        cap: VideoCapture,
        fps: f64,
        duration: f64,
        width: u32,
        height: u32,
        /// Index of the frame held in `frame`, -1 before the first read.
        decoded_index: i64,
        /// Last decodable frame, known once a read hits the end of the stream.
        /// The container's frame count can overestimate it.
        last_frame: Option<i64>,
        frame: RgbaImage,
    }

    impl CaptureSource {
        pub fn open(path: &Path) -> Result<Self> {
            let path_str = path.to_string_lossy();
            let cap = VideoCapture::from_file(&path_str, videoio::CAP_ANY)
                .with_context(|| format!("Failed to open video {}", path.display()))?;
            if !cap.is_opened()? {
                anyhow::bail!("Failed to open video file {}", path.display());
            }

            let fps = cap.get(videoio::CAP_PROP_FPS)?;
            let fps = if fps > 0.0 { fps } else { 30.0 };
            let frame_count = cap.get(videoio::CAP_PROP_FRAME_COUNT)?.max(1.0);
            let width = cap.get(videoio::CAP_PROP_FRAME_WIDTH)? as u32;
            let height = cap.get(videoio::CAP_PROP_FRAME_HEIGHT)? as u32;

            log::info!(
                "Opened video {} ({}x{}, {:.2} fps, {} frames)",
                path.display(),
                width,
                height,
                fps,
                frame_count
            );

            Ok(Self {
                cap,
                fps,
                duration: frame_count / fps,
                width,
                height,
                decoded_index: -1,
                last_frame: None,
                frame: RgbaImage::new(width.max(1), height.max(1)),
            })
        }

        fn read_next(&mut self) -> Result<bool> {
            let mut mat = Mat::default();
            if !self.cap.read(&mut mat)? || mat.empty() {
                return Ok(false);
            }
            let mut rgba = Mat::default();
            imgproc::cvt_color(&mat, &mut rgba, imgproc::COLOR_BGR2RGBA, 0)?;

            let (w, h) = (rgba.cols() as u32, rgba.rows() as u32);
            let data = rgba.data_bytes()?.to_vec();
            if let Some(image) = RgbaImage::from_raw(w, h, data) {
                self.frame = image;
            }
            self.decoded_index += 1;
            Ok(true)
        }
    }

    impl VideoSource for CaptureSource {
        fn duration(&self) -> f64 {
            self.duration
        }

        fn frame_size(&self) -> (u32, u32) {
            (self.width, self.height)
        }

        fn frame_at(&mut self, time: f64) -> Result<&RgbaImage> {
            let requested = (time.max(0.0) * self.fps).floor() as i64;
            let (target, step) = plan_decode(requested, self.decoded_index, self.last_frame, MAX_DECODE_AHEAD);
            if step == DecodeStep::Seek {
                self.cap.set(videoio::CAP_PROP_POS_FRAMES, target as f64)?;
                self.decoded_index = target - 1;
            }
            while self.decoded_index < target {
                if !self.read_next()? {
                    let last = self.decoded_index.max(0);
                    log::debug!("End of stream at frame {}", last);
                    self.last_frame = Some(last);
                    break;
                }
            }
            Ok(&self.frame)
        }
    }
}

/// Open a media file, choosing a decoder by extension.
pub fn open_source(path: &Path, still_duration: f64) -> Result<Box<dyn VideoSource>> {
    let extension = path
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_ascii_lowercase())
        .unwrap_or_default();

    if IMAGE_EXTENSIONS.contains(&extension.as_str()) {
        let source = StillImageSource::open(path, still_duration)?;
        let (w, h) = source.frame_size();
        log::info!("Loaded still image: {} ({}x{})", path.display(), w, h);
        return Ok(Box::new(source));
    }

    #[cfg(feature = "video-opencv")]
    {
        Ok(Box::new(CaptureSource::open(path)?))
    }

    #[cfg(not(feature = "video-opencv"))]
    {
        anyhow::bail!(
            "Cannot open {}: video decoding requires the `video-opencv` feature",
            path.display()
        )
    }
}

/// Signals raised by [`Playback::tick`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlaybackEvent {
    /// The source can be rendered. Raised once per source.
    CanPlay,
    /// Playback time changed, in seconds.
    TimeUpdate(f64),
}

/// Playback transport over a [`VideoSource`].
pub struct Playback {
    source: Box<dyn VideoSource>,
    current_time: f64,
    playing: bool,
    looping: bool,
    announced: bool,
    /// Set by seek/stop so the next tick reports the new time while paused.
    time_dirty: bool,
}

impl Playback {
    pub fn new(source: Box<dyn VideoSource>, looping: bool) -> Self {
        Self {
            source,
            current_time: 0.0,
            playing: false,
            looping,
            announced: false,
            time_dirty: false,
        }
    }

    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    pub fn duration(&self) -> f64 {
        self.source.duration()
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn toggle_play(&mut self) {
        self.playing = !self.playing;
    }

    /// Pause and rewind to the beginning.
    pub fn stop(&mut self) {
        self.playing = false;
        self.seek(0.0);
    }

    /// Jump to `time`, clamped to the clip.
    pub fn seek(&mut self, time: f64) {
        let time = if time.is_finite() { time } else { 0.0 };
        self.current_time = time.clamp(0.0, self.duration().max(0.0));
        self.time_dirty = true;
    }

    /// Advance the clock by `dt` seconds and collect the resulting signals.
    pub fn tick(&mut self, dt: f64) -> Vec<PlaybackEvent> {
        let mut events = Vec::new();
        if !self.announced {
            self.announced = true;
            events.push(PlaybackEvent::CanPlay);
        }

        if self.playing && dt > 0.0 {
            let duration = self.duration();
            let next = self.current_time + dt;
            self.current_time = if duration <= 0.0 {
                0.0
            } else if next < duration {
                next
            } else if self.looping {
                next.rem_euclid(duration)
            } else {
                self.playing = false;
                duration
            };
            self.time_dirty = true;
        }

        if self.time_dirty {
            self.time_dirty = false;
            events.push(PlaybackEvent::TimeUpdate(self.current_time));
        }
        events
    }

    /// Pixels of the frame at the current playback time.
    pub fn current_frame(&mut self) -> Result<&RgbaImage> {
        self.source.frame_at(self.current_time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn still(duration: f64) -> Box<dyn VideoSource> {
        Box::new(StillImageSource::new(RgbaImage::new(4, 2), duration))
    }

    #[test]
    fn test_can_play_is_raised_once() {
        let mut playback = Playback::new(still(10.0), true);
        assert_eq!(playback.tick(0.016), vec![PlaybackEvent::CanPlay]);
        assert!(playback.tick(0.016).is_empty());
    }

    #[test]
    fn test_time_updates_while_playing() {
        let mut playback = Playback::new(still(10.0), true);
        playback.tick(0.0);
        playback.toggle_play();
        assert_eq!(playback.tick(0.5), vec![PlaybackEvent::TimeUpdate(0.5)]);
        assert_eq!(playback.tick(0.25), vec![PlaybackEvent::TimeUpdate(0.75)]);
    }

    #[test]
    fn test_loop_wraps_to_start() {
        let mut playback = Playback::new(still(2.0), true);
        playback.tick(0.0);
        playback.toggle_play();
        playback.tick(1.5);
        playback.tick(1.0);
        assert!((playback.current_time() - 0.5).abs() < 1e-9);
        assert!(playback.is_playing());
    }

    #[test]
    fn test_no_loop_stops_at_end() {
        let mut playback = Playback::new(still(2.0), false);
        playback.tick(0.0);
        playback.toggle_play();
        playback.tick(3.0);
        assert_eq!(playback.current_time(), 2.0);
        assert!(!playback.is_playing());
    }

    #[test]
    fn test_stop_rewinds_and_reports() {
        let mut playback = Playback::new(still(10.0), true);
        playback.tick(0.0);
        playback.toggle_play();
        playback.tick(4.0);
        playback.stop();
        assert!(!playback.is_playing());
        assert_eq!(playback.tick(0.1), vec![PlaybackEvent::TimeUpdate(0.0)]);
    }

    #[test]
    fn test_seek_is_clamped() {
        let mut playback = Playback::new(still(10.0), true);
        playback.seek(-3.0);
        assert_eq!(playback.current_time(), 0.0);
        playback.seek(42.0);
        assert_eq!(playback.current_time(), 10.0);
        playback.seek(f64::NAN);
        assert_eq!(playback.current_time(), 0.0);
    }

    #[test]
    fn test_still_frame_size() {
        let mut playback = Playback::new(still(1.0), true);
        assert_eq!(playback.current_frame().unwrap().dimensions(), (4, 2));
    }

    #[test]
    fn test_plan_decode_steps() {
        assert_eq!(plan_decode(5, 5, None, 30), (5, DecodeStep::Hold));
        assert_eq!(plan_decode(10, 5, None, 30), (10, DecodeStep::ReadAhead));
        assert_eq!(plan_decode(100, 5, None, 30), (100, DecodeStep::Seek));
        assert_eq!(plan_decode(2, 5, None, 30), (2, DecodeStep::Seek));
    }

    #[test]
    fn test_plan_decode_holds_at_end_of_stream() {
        // Past the last decodable frame: no re-read and no re-seek.
        assert_eq!(plan_decode(500, 240, Some(240), 30), (240, DecodeStep::Hold));
        assert_eq!(plan_decode(241, 240, Some(240), 30), (240, DecodeStep::Hold));
        // A far target clamped near the held frame is read, not sought.
        assert_eq!(plan_decode(900, 230, Some(240), 30), (240, DecodeStep::ReadAhead));
        // Looping back still seeks.
        assert_eq!(plan_decode(0, 240, Some(240), 30), (0, DecodeStep::Seek));
    }

    #[cfg(not(feature = "video-opencv"))]
    #[test]
    fn test_video_requires_feature() {
        assert!(open_source(Path::new("clip.mp4"), 10.0).is_err());
    }
}
