// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Detection properties panel.
//!
//! This module lists the metadata entry resolved for the current frame and
//! the detections it contains.

use crate::models::metadata::MetadataSet;

/// Display the panel for the entry at `entry_position`, if any.
pub fn show(ui: &mut egui::Ui, set: &MetadataSet, entry_position: Option<usize>) {
    ui.heading("Detections");
    ui.separator();

    let Some((index, keyed)) = entry_position.and_then(|i| set.get(i).map(|keyed| (i, keyed))) else {
        let message = if set.is_empty() {
            "No metadata loaded"
        } else {
            "No metadata for this frame"
        };
        ui.label(egui::RichText::new(message).weak());
        return;
    };

    ui.label(format!("Entry {} of {}", index + 1, set.len()));
    ui.label(egui::RichText::new(format!("Key: {}", keyed.key)).weak());
    if let Some(caption) = keyed.entry.caption() {
        ui.label(egui::RichText::new(format!("Sample: {}", caption)).weak());
    }
    ui.separator();

    if keyed.entry.annotations.is_empty() {
        ui.label(egui::RichText::new("No detections").weak());
        return;
    }

    egui::ScrollArea::vertical().show(ui, |ui| {
        for (i, annotation) in keyed.entry.annotations.iter().enumerate() {
            let name = annotation.label().unwrap_or("(unlabeled)");
            ui.label(egui::RichText::new(format!("{}. {}", i + 1, name)).strong());

            let bbox = annotation
                .bbox
                .iter()
                .map(|v| format!("{:.1}", v))
                .collect::<Vec<_>>()
                .join(", ");
            ui.label(egui::RichText::new(format!("bbox [{}]", bbox)).monospace().weak());
            ui.add_space(4.0);
        }
    });
}
