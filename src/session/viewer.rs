use std::path::{Path, PathBuf};

use crate::labels::{self, CornellRect, JacquardRecord, LabelError, cornell, jacquard};
use crate::viewport::Viewport;
use crate::walk::ImageWalk;

use super::{InputEvent, Key, LoadedImage, MouseButton, Outcome, SessionConfig, SessionError};

pub const CONTROLS_HINT: &str = "left/right: page | scroll: zoom | right drag: pan | esc: quit";

/// Stored labels of one image.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LabelOverlay {
    pub rects: Vec<CornellRect>,
    pub markers: Vec<JacquardRecord>,
}

impl LabelOverlay {
    /// Loads Cornell rectangles and Jacquard markers saved for `stem`.
    ///
    /// Missing folders or files just leave the overlay empty.
    pub fn load(label_dir: &Path, stem: &str) -> Result<Self, LabelError> {
        Ok(Self {
            rects: cornell::load_dir(&labels::cornell_dir(label_dir, stem))?,
            markers: jacquard::read_records(&labels::jacquard_path(label_dir, stem))?,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.rects.is_empty() && self.markers.is_empty()
    }
}

struct ShownImage {
    image: LoadedImage,
    overlay: LabelOverlay,
}

/// Viewer state: bidirectional image walk, loaded overlays and view.
pub struct ViewerSession {
    config: SessionConfig,
    label_dir: PathBuf,
    walk: ImageWalk,
    viewport: Viewport,
    panning: bool,
    shown: Option<ShownImage>,
}

impl ViewerSession {
    pub fn start(img_dir: &Path, label_dir: &Path, config: SessionConfig) -> Result<Self, SessionError> {
        let walk = ImageWalk::scan(img_dir).map_err(|source| SessionError::Scan {
            path: img_dir.to_path_buf(),
            source,
        })?;
        tracing::info!(count = walk.len(), dir = %img_dir.display(), "found images");
        Self::new(walk, label_dir, config)
    }

    pub fn new(walk: ImageWalk, label_dir: &Path, config: SessionConfig) -> Result<Self, SessionError> {
        let viewport = Viewport::new(0.0, 0.0)
            .with_zoom_limits(config.min_zoom_factor, config.max_zoom_factor);
        let mut session = Self {
            config,
            label_dir: label_dir.to_path_buf(),
            walk,
            viewport,
            panning: false,
            shown: None,
        };
        session.show_current()?;
        Ok(session)
    }

    pub fn is_complete(&self) -> bool {
        self.shown.is_none()
    }

    pub fn image(&self) -> Option<&LoadedImage> {
        self.shown.as_ref().map(|s| &s.image)
    }

    pub fn overlay(&self) -> Option<&LabelOverlay> {
        self.shown.as_ref().map(|s| &s.overlay)
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn walk(&self) -> &ImageWalk {
        &self.walk
    }

    pub fn title(&self) -> String {
        if self.is_complete() {
            "All images viewed".to_string()
        } else {
            format!("{} | {CONTROLS_HINT}", self.walk.position_label())
        }
    }

    pub fn handle(&mut self, event: InputEvent) -> Result<Outcome, SessionError> {
        if self.is_complete() {
            return Ok(Outcome::Complete);
        }

        match event {
            InputEvent::Resize { width, height } => Ok(if self.viewport.resize(width, height) {
                Outcome::ViewChanged
            } else {
                Outcome::Ignored
            }),
            InputEvent::Key(Key::ArrowRight) => {
                if self.walk.clamp_advance() {
                    self.show_current()
                } else {
                    Ok(Outcome::Ignored)
                }
            }
            InputEvent::Key(Key::ArrowLeft) => {
                if self.walk.retreat() {
                    self.show_current()
                } else {
                    Ok(Outcome::Ignored)
                }
            }
            InputEvent::Key(Key::Escape) => Ok(Outcome::Quit),
            InputEvent::Scroll { direction, x, y } => {
                self.viewport
                    .zoom_at(self.config.scroll_factor(direction), (x, y));
                Ok(Outcome::ViewChanged)
            }
            InputEvent::Click {
                button: MouseButton::Right,
                ..
            } => {
                self.panning = true;
                Ok(Outcome::Ignored)
            }
            InputEvent::Release {
                button: MouseButton::Right,
            } => {
                self.panning = false;
                Ok(Outcome::Ignored)
            }
            InputEvent::Drag { dx, dy } if self.panning => {
                self.viewport.pan(dx, dy);
                Ok(Outcome::ViewChanged)
            }
            _ => Ok(Outcome::Ignored),
        }
    }

    /// Loads the image under the cursor with its labels. Unreadable images are
    /// skipped forward; running off the end completes the session.
    fn show_current(&mut self) -> Result<Outcome, SessionError> {
        self.panning = false;
        loop {
            let Some(path) = self.walk.current() else {
                self.shown = None;
                tracing::info!("all images viewed");
                return Ok(Outcome::Complete);
            };

            match LoadedImage::open(path) {
                Ok(image) => {
                    let overlay = LabelOverlay::load(&self.label_dir, &image.stem)?;
                    let (w, h) = image.size();
                    self.viewport.set_image(w, h);
                    tracing::info!(
                        rects = overlay.rects.len(),
                        markers = overlay.markers.len(),
                        "{}",
                        self.walk.position_label()
                    );
                    self.shown = Some(ShownImage { image, overlay });
                    return Ok(Outcome::ImageChanged);
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), "failed to read image: {e}");
                    self.walk.advance();
                }
            }
        }
    }
}
