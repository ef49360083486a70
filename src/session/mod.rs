//! Toolkit-independent state machines behind the annotator and viewer windows.
//!
//! The GUI translates its own mouse and keyboard events into [`InputEvent`]s,
//! feeds them to a session and redraws from the session's state whenever the
//! returned [`Outcome`] asks for it.

use std::io;
use std::path::{Path, PathBuf};

use image::RgbaImage;

use crate::labels::{LabelError, StoreError};
use crate::walk::image_stem;

pub mod annotator;
pub mod viewer;

pub use annotator::{AnnotatorSession, SavedGrasp};
pub use viewer::{LabelOverlay, ViewerSession};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollDirection {
    Up,
    Down,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Escape,
    ArrowLeft,
    ArrowRight,
}

/// One discrete input, in screen coordinates relative to the image view.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    Click { button: MouseButton, x: f32, y: f32 },
    Release { button: MouseButton },
    Drag { dx: f32, dy: f32 },
    Scroll { direction: ScrollDirection, x: f32, y: f32 },
    Key(Key),
    Resize { width: f32, height: f32 },
}

/// What an event did, so the host knows whether and what to redraw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Ignored,
    ViewChanged,
    PointAdded(usize),
    GraspSaved(usize),
    GraspRemoved(usize),
    Cancelled,
    ImageChanged,
    Complete,
    Quit,
}

impl Outcome {
    pub fn needs_redraw(self) -> bool {
        !matches!(self, Outcome::Ignored)
    }
}

/// Tunables shared by both sessions.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Scale factor applied per scroll step.
    pub zoom_step: f32,
    pub min_zoom_factor: f32,
    pub max_zoom_factor: f32,
    /// Grasps whose middle corner deviates more than this from 90 degrees are logged.
    pub skew_warn_deg: f64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            zoom_step: 1.2,
            min_zoom_factor: crate::viewport::Viewport::DEFAULT_MIN_ZOOM_FACTOR,
            max_zoom_factor: crate::viewport::Viewport::DEFAULT_MAX_ZOOM_FACTOR,
            skew_warn_deg: 10.0,
        }
    }
}

impl SessionConfig {
    fn scroll_factor(&self, direction: ScrollDirection) -> f32 {
        match direction {
            ScrollDirection::Up => self.zoom_step,
            ScrollDirection::Down => 1.0 / self.zoom_step,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("failed to list images in {}: {source}", .path.display())]
    Scan {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Labels(#[from] LabelError),
}

/// A decoded image ready for display.
#[derive(Debug, Clone)]
pub struct LoadedImage {
    pub path: PathBuf,
    pub stem: String,
    pub rgba: RgbaImage,
}

impl LoadedImage {
    pub fn open(path: &Path) -> Result<Self, image::ImageError> {
        let rgba = image::open(path)?.to_rgba8();
        Ok(Self {
            path: path.to_path_buf(),
            stem: image_stem(path),
            rgba,
        })
    }

    pub fn size(&self) -> (f32, f32) {
        let (w, h) = self.rgba.dimensions();
        (w as f32, h as f32)
    }
}
