// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! sphere360 - 360° video viewer with detection overlays
//!
//! A cross-platform desktop application that plays an equirectangular video
//! on the inside of a sphere and overlays time-synchronized object detection
//! boxes read from a metadata file.

mod app;
mod engine;
mod io;
mod models;
mod ui;
mod util;

use anyhow::Result;
use app::SphereApp;
use models::settings::Settings;
use std::path::{Path, PathBuf};

/// Environment variable naming the settings file.
const CONFIG_ENV: &str = "SPHERE360_CONFIG";
const DEFAULT_CONFIG_FILE: &str = "sphere360.yaml";

/// Load settings from the configured YAML file, falling back to defaults.
fn load_settings() -> Settings {
    let explicit = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
    let path = match explicit {
        Some(path) => path,
        None if Path::new(DEFAULT_CONFIG_FILE).exists() => PathBuf::from(DEFAULT_CONFIG_FILE),
        None => {
            log::info!("No settings file, using defaults");
            return Settings::default();
        }
    };

    match io::serialization::import_settings_yaml(&path) {
        Ok(settings) => {
            log::info!("Loaded settings from {}", path.display());
            settings
        }
        Err(e) => {
            log::error!("{:#}; using default settings", e);
            Settings::default()
        }
    }
}

fn main() -> Result<()> {
    // Initialize logging
    env_logger::init();

    let settings = load_settings();
    match io::serialization::export_settings_yaml(&settings) {
        Ok(yaml) => log::debug!("Effective settings:\n{}", yaml),
        Err(e) => log::warn!("{:#}", e),
    }
    // Optional media file to open on startup
    let initial_source = std::env::args_os().nth(1).map(PathBuf::from);

    // Configure egui options
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1600.0, 900.0])
            .with_min_inner_size([800.0, 600.0])
            .with_title("sphere360"),
        ..Default::default()
    };

    // Run the application
    eframe::run_native(
        "sphere360",
        options,
        Box::new(move |cc| Ok(Box::new(SphereApp::new(&cc.egui_ctx, settings, initial_source)))),
    )
    .map_err(|e| anyhow::anyhow!("Application error: {}", e))?;

    Ok(())
}
