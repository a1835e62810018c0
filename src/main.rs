// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! ReelNotes - frame-accurate review notes for video.
//!
//! A cross-platform desktop application for capturing snapshots of video
//! frames, marking them up, and tagging them with department hour
//! estimates for review and staffing.

mod app;
mod config;
mod error;
mod io;
mod lifecycle;
mod models;
mod notify;
mod presenter;
mod render;
mod store;
mod surface;
mod ui;
mod util;

use anyhow::{Context, Result};
use app::ReelNotesApp;
use config::AppConfig;
use store::FileStore;

fn main() -> Result<()> {
    // Initialize logging
    env_logger::init();

    let config = AppConfig::load().unwrap_or_else(|e| {
        log::error!("{:#}; using default configuration", e);
        AppConfig::default()
    });
    let store_dir = config.store_dir();
    let store = FileStore::open(&store_dir)
        .with_context(|| format!("opening project store at {}", store_dir.display()))?;

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1440.0, 860.0])
            .with_min_inner_size([960.0, 600.0])
            .with_title("ReelNotes"),
        ..Default::default()
    };

    eframe::run_native(
        "ReelNotes",
        options,
        Box::new(move |_cc| Ok(Box::new(ReelNotesApp::new(config, Box::new(store))))),
    )
    .map_err(|e| anyhow::anyhow!("Application error: {}", e))?;

    Ok(())
}
