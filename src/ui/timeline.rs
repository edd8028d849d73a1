// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Video timeline scrubber control.

/// Display the scrubber. Returns the seek target when the user moved it.
pub fn show(ui: &mut egui::Ui, current_time: f64, duration: f64) -> Option<f64> {
    if duration <= 0.0 {
        return None;
    }

    let mut time = current_time.clamp(0.0, duration);
    ui.spacing_mut().slider_width = ui.available_width();
    let response = ui.add(
        egui::Slider::new(&mut time, 0.0..=duration)
            .show_value(false)
            .trailing_fill(true),
    );

    response.changed().then_some(time)
}
