// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Playback controls bar.
//!
//! This module provides the stop and play/pause buttons together with the
//! playback time and frame readout.

use crate::engine::clock::FrameIndex;

/// Result of controls interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlsAction {
    None,
    Stop,
    TogglePlay,
}

/// Display the controls bar.
pub fn show(
    ui: &mut egui::Ui,
    is_playing: bool,
    current_time: f64,
    duration: f64,
    frame: FrameIndex,
) -> ControlsAction {
    let mut action = ControlsAction::None;

    ui.horizontal(|ui| {
        ui.spacing_mut().item_spacing.x = 8.0;

        if ui.button("⏹ Stop").on_hover_text("Stop and rewind").clicked() {
            action = ControlsAction::Stop;
        }

        let play_label = if is_playing { "⏸ Pause" } else { "▶ Play" };
        if ui.button(play_label).clicked() {
            action = ControlsAction::TogglePlay;
        }

        ui.separator();

        ui.label(format!("{} / {}", format_time(current_time), format_time(duration)));
        ui.separator();
        ui.label(egui::RichText::new(format!("frame {}", frame)).weak());
    });

    action
}

/// Format seconds as `m:ss.s`.
fn format_time(seconds: f64) -> String {
    // Round once, so 59.96 s carries into the minute instead of showing 60.0.
    let tenths = (seconds.max(0.0) * 10.0).round() as u64;
    let minutes = tenths / 600;
    let rest = tenths % 600;
    format!("{}:{:02}.{}", minutes, rest / 10, rest % 10)
}
