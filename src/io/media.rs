// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Media loading and playback.
//!
//! This module turns a project's media bytes into a `FrameSource`, and
//! wraps it in a `Player` that tracks playback position and the paused
//! state. Still images are always supported and play as a fixed-length
//! clip; real video decoding needs the `video-opencv` feature.

use crate::error::{ReelError, Result};
use image::RgbaImage;
use std::sync::mpsc::{channel, Receiver};

/// File extensions decoded as still images.
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tif", "webp"];

/// File extensions handed to the video decoder.
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "m4v", "mkv", "avi", "webm"];

/// What the lifecycle needs from the player.
pub trait MediaPlayer {
    fn has_media(&self) -> bool;
    fn is_paused(&self) -> bool;
    /// Playback position in seconds.
    fn current_time(&self) -> f64;
    fn duration(&self) -> f64;
    /// The frame at the current position. Rejected while playing.
    fn capture_frame(&self) -> Result<RgbaImage>;
}

/// Decodes frames at arbitrary times.
pub trait FrameSource: Send {
    fn duration(&self) -> f64;
    fn frame_at(&mut self, seconds: f64) -> anyhow::Result<RgbaImage>;
}

/// A still image presented as a clip of fixed length.
pub struct StillSource {
    image: RgbaImage,
    duration: f64,
}

impl StillSource {
    pub fn new(image: RgbaImage, duration: f64) -> Self {
        Self { image, duration }
    }
}

impl FrameSource for StillSource {
    fn duration(&self) -> f64 {
        self.duration
    }

    fn frame_at(&mut self, _seconds: f64) -> anyhow::Result<RgbaImage> {
        Ok(self.image.clone())
    }
}

#[cfg(feature = "video-opencv")]
mod opencv_source {
    use super::FrameSource;
    use anyhow::{anyhow, bail, Result};
    use image::RgbaImage;
    use opencv::{core::Mat, imgproc, prelude::*, videoio};
    use std::path::PathBuf;

    /// Video decoded through OpenCV from a temporary copy of the media.
    pub struct OpenCvSource {
        capture: videoio::VideoCapture,
        duration: f64,
        fps: f64,
        last_time: Option<f64>,
        temp_path: PathBuf,
    }

    impl OpenCvSource {
        pub fn open(file_name: &str, bytes: &[u8]) -> Result<Self> {
            let temp_path = std::env::temp_dir().join(format!(
                "reelnotes-{}-{}",
                std::process::id(),
                file_name
            ));
            std::fs::write(&temp_path, bytes)?;
            let path = temp_path
                .to_str()
                .ok_or_else(|| anyhow!("non-UTF-8 temp path"))?;
            let capture = videoio::VideoCapture::from_file(path, videoio::CAP_ANY)?;
            if !capture.is_opened()? {
                bail!("OpenCV could not open {}", file_name);
            }
            let fps = capture.get(videoio::CAP_PROP_FPS)?.max(1.0);
            let frames = capture.get(videoio::CAP_PROP_FRAME_COUNT)?;
            log::info!("Opened video {} ({} frames @ {:.2} fps)", file_name, frames, fps);
            Ok(Self {
                capture,
                duration: frames / fps,
                fps,
                last_time: None,
                temp_path,
            })
        }
    }

    impl FrameSource for OpenCvSource {
        fn duration(&self) -> f64 {
            self.duration
        }

        fn frame_at(&mut self, seconds: f64) -> Result<RgbaImage> {
            // Sequential playback reads the next frame instead of seeking.
            let sequential = self
                .last_time
                .map_or(false, |last| seconds > last && seconds - last <= 2.0 / self.fps);
            if !sequential {
                self.capture
                    .set(videoio::CAP_PROP_POS_MSEC, seconds * 1000.0)?;
            }
            let mut bgr = Mat::default();
            if !self.capture.read(&mut bgr)? {
                bail!("no frame at {:.3}s", seconds);
            }
            self.last_time = Some(seconds);

            let mut rgba = Mat::default();
            imgproc::cvt_color(&bgr, &mut rgba, imgproc::COLOR_BGR2RGBA, 0)?;
            let size = rgba.size()?;
            let data = rgba.data_bytes()?.to_vec();
            RgbaImage::from_raw(size.width as u32, size.height as u32, data)
                .ok_or_else(|| anyhow!("frame buffer size mismatch"))
        }
    }

    impl Drop for OpenCvSource {
        fn drop(&mut self) {
            let _ = std::fs::remove_file(&self.temp_path);
        }
    }
}

#[cfg(feature = "video-opencv")]
pub use opencv_source::OpenCvSource;

fn extension(file_name: &str) -> String {
    std::path::Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default()
}

/// Build a frame source for media bytes, choosing the decoder by extension.
pub fn open_source(
    file_name: &str,
    bytes: &[u8],
    still_duration: f64,
) -> anyhow::Result<Box<dyn FrameSource>> {
    let ext = extension(file_name);
    if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
        let image = image::load_from_memory(bytes)?.to_rgba8();
        log::info!(
            "Loaded still {} ({}x{})",
            file_name,
            image.width(),
            image.height()
        );
        return Ok(Box::new(StillSource::new(image, still_duration)));
    }
    if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
        #[cfg(feature = "video-opencv")]
        {
            return Ok(Box::new(OpenCvSource::open(file_name, bytes)?));
        }
        #[cfg(not(feature = "video-opencv"))]
        {
            anyhow::bail!("video support requires building with the video-opencv feature");
        }
    }
    anyhow::bail!("unsupported media type: {}", file_name)
}

/// Decode media on a background thread; the receiver yields one result.
pub fn spawn_open(
    file_name: String,
    bytes: Vec<u8>,
    still_duration: f64,
) -> Receiver<anyhow::Result<Box<dyn FrameSource>>> {
    let (sender, receiver) = channel();
    std::thread::spawn(move || {
        let result = open_source(&file_name, &bytes, still_duration);
        let _ = sender.send(result);
    });
    receiver
}

/// Playback state over a frame source.
#[derive(Default)]
pub struct Player {
    source: Option<Box<dyn FrameSource>>,
    position: f64,
    paused: bool,
    frame: Option<RgbaImage>,
    frame_time: Option<f64>,
    frame_revision: u64,
}

impl Player {
    pub fn new() -> Self {
        Self {
            paused: true,
            ..Default::default()
        }
    }

    /// Start presenting a new source, paused at the beginning.
    pub fn load(&mut self, source: Box<dyn FrameSource>) {
        self.source = Some(source);
        self.position = 0.0;
        self.paused = true;
        self.frame_time = None;
        self.decode_current();
    }

    pub fn play(&mut self) {
        if self.source.is_some() {
            if self.position >= self.duration() {
                self.position = 0.0;
            }
            self.paused = false;
        }
    }

    pub fn pause(&mut self) {
        self.paused = true;
        self.decode_current();
    }

    pub fn seek(&mut self, seconds: f64) {
        self.position = seconds.clamp(0.0, self.duration());
        self.decode_current();
    }

    /// Advance playback by `dt` seconds. Returns whether the position moved.
    pub fn advance(&mut self, dt: f64) -> bool {
        if self.paused || self.source.is_none() {
            return false;
        }
        let duration = self.duration();
        self.position = (self.position + dt).min(duration);
        if self.position >= duration {
            self.paused = true;
        }
        self.decode_current();
        true
    }

    /// The most recently decoded frame and a counter that changes with it.
    pub fn frame(&self) -> Option<(&RgbaImage, u64)> {
        self.frame.as_ref().map(|f| (f, self.frame_revision))
    }

    fn decode_current(&mut self) {
        if self.frame_time == Some(self.position) {
            return;
        }
        let Some(source) = self.source.as_mut() else {
            return;
        };
        match source.frame_at(self.position) {
            Ok(frame) => {
                self.frame = Some(frame);
                self.frame_time = Some(self.position);
                self.frame_revision += 1;
            }
            Err(e) => log::warn!("Failed to decode frame at {:.3}s: {}", self.position, e),
        }
    }
}

impl MediaPlayer for Player {
    fn has_media(&self) -> bool {
        self.source.is_some()
    }

    fn is_paused(&self) -> bool {
        self.paused
    }

    fn current_time(&self) -> f64 {
        self.position
    }

    fn duration(&self) -> f64 {
        self.source.as_ref().map_or(0.0, |s| s.duration())
    }

    fn capture_frame(&self) -> Result<RgbaImage> {
        if self.source.is_none() {
            return Err(ReelError::MediaNotReady("no media loaded".to_string()));
        }
        if !self.paused {
            return Err(ReelError::MediaNotReady(
                "pause playback before capturing".to_string(),
            ));
        }
        match (&self.frame, self.frame_time) {
            (Some(frame), Some(time)) if time == self.position => Ok(frame.clone()),
            _ => Err(ReelError::MediaNotReady(
                "current frame is not decoded yet".to_string(),
            )),
        }
    }
}
