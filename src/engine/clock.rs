// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Frame clock.
//!
//! Converts continuous playback time into a discrete frame counter.

/// Discrete frame counter derived from playback time.
pub type FrameIndex = u64;

/// Frame counter driven by playback time-update signals.
///
/// The index is always recomputed from time, so skipped updates, pauses,
/// seeks and loop wrap-around need no special handling.
#[derive(Debug, Clone)]
pub struct FrameClock {
    fps: f64,
    current: FrameIndex,
}

impl FrameClock {
    /// Create a clock for a fixed frame rate.
    pub fn new(fps: f64) -> Self {
        Self { fps, current: 0 }
    }

    /// `floor(time * fps)`. Negative or non-finite input maps to frame 0.
    pub fn frame_index(&self, time_secs: f64) -> FrameIndex {
        let frames = (time_secs * self.fps).floor();
        if frames.is_finite() && frames > 0.0 {
            frames as FrameIndex
        } else {
            0
        }
    }

    /// The index computed by the last [`FrameClock::on_time_update`].
    pub fn current(&self) -> FrameIndex {
        self.current
    }

    /// Handle a time-update signal. Returns `true` when the index changed.
    pub fn on_time_update(&mut self, time_secs: f64) -> bool {
        let next = self.frame_index(time_secs);
        let changed = next != self.current;
        self.current = next;
        changed
    }

    /// Return to frame 0, e.g. when the source changes.
    pub fn reset(&mut self) {
        self.current = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_floor_of_time_times_fps() {
        let clock = FrameClock::new(30.0);
        for (t, expected) in [(0.0, 0), (0.033, 0), (0.034, 1), (1.0, 30), (3.999, 119), (10.5, 315)] {
            assert_eq!(clock.frame_index(t), expected, "t = {}", t);
            assert_eq!(clock.frame_index(t), (t * 30.0_f64).floor() as u64);
        }
    }

    #[test]
    fn test_repeated_computation_is_stable() {
        let mut clock = FrameClock::new(60.0);
        let first = clock.frame_index(12.345);
        assert_eq!(clock.frame_index(12.345), first);

        assert!(clock.on_time_update(12.345));
        assert!(!clock.on_time_update(12.345));
        assert_eq!(clock.current(), first);
    }

    #[test]
    fn test_invalid_times_map_to_zero() {
        let clock = FrameClock::new(30.0);
        assert_eq!(clock.frame_index(-1.0), 0);
        assert_eq!(clock.frame_index(f64::NAN), 0);
        assert_eq!(clock.frame_index(f64::INFINITY), 0);
    }

    #[test]
    fn test_loop_wrap_goes_back() {
        let mut clock = FrameClock::new(30.0);
        clock.on_time_update(59.95);
        assert_eq!(clock.current(), 1798);
        assert!(clock.on_time_update(0.1));
        assert_eq!(clock.current(), 3);
    }

    #[test]
    fn test_skipped_updates_jump_ahead() {
        let mut clock = FrameClock::new(30.0);
        clock.on_time_update(1.0);
        clock.on_time_update(2.0);
        assert_eq!(clock.current(), 60);
    }
}
