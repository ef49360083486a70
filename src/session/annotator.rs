use std::path::{Path, PathBuf};

use crate::grasp::{GraspRect, Point2};
use crate::labels::ImageLabelStore;
use crate::viewport::Viewport;
use crate::walk::ImageWalk;

use super::{
    InputEvent, Key, LoadedImage, MouseButton, Outcome, SessionConfig, SessionError,
};

pub const CONTROLS_HINT: &str =
    "left click x3: grasp | right drag: pan | scroll: zoom | n: next | esc: cancel | d: undo";

/// A grasp written during the current image's session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SavedGrasp {
    pub index: usize,
    pub rect: GraspRect,
}

struct ActiveImage {
    image: LoadedImage,
    store: ImageLabelStore,
    clicks: Vec<Point2>,
    grasps: Vec<SavedGrasp>,
}

/// Annotator state: image walk, click buffer, saved grasps and view.
pub struct AnnotatorSession {
    config: SessionConfig,
    save_dir: PathBuf,
    walk: ImageWalk,
    viewport: Viewport,
    panning: bool,
    active: Option<ActiveImage>,
}

impl AnnotatorSession {
    /// Scans `img_dir` and enters its first readable image.
    pub fn start(img_dir: &Path, save_dir: &Path, config: SessionConfig) -> Result<Self, SessionError> {
        let walk = ImageWalk::scan(img_dir).map_err(|source| SessionError::Scan {
            path: img_dir.to_path_buf(),
            source,
        })?;
        tracing::info!(count = walk.len(), dir = %img_dir.display(), "found images");
        Self::new(walk, save_dir, config)
    }

    pub fn new(walk: ImageWalk, save_dir: &Path, config: SessionConfig) -> Result<Self, SessionError> {
        let viewport = Viewport::new(0.0, 0.0)
            .with_zoom_limits(config.min_zoom_factor, config.max_zoom_factor);
        let mut session = Self {
            config,
            save_dir: save_dir.to_path_buf(),
            walk,
            viewport,
            panning: false,
            active: None,
        };
        session.enter_current()?;
        Ok(session)
    }

    pub fn is_complete(&self) -> bool {
        self.active.is_none()
    }

    pub fn image(&self) -> Option<&LoadedImage> {
        self.active.as_ref().map(|a| &a.image)
    }

    /// Clicks of the grasp being entered, in image coordinates.
    pub fn clicks(&self) -> &[Point2] {
        self.active.as_ref().map(|a| a.clicks.as_slice()).unwrap_or_default()
    }

    pub fn grasps(&self) -> &[SavedGrasp] {
        self.active.as_ref().map(|a| a.grasps.as_slice()).unwrap_or_default()
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn walk(&self) -> &ImageWalk {
        &self.walk
    }

    pub fn title(&self) -> String {
        if self.is_complete() {
            "All images annotated".to_string()
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
            InputEvent::Click {
                button: MouseButton::Left,
                x,
                y,
            } => self.add_click((x, y)),
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
            InputEvent::Scroll { direction, x, y } => {
                self.viewport
                    .zoom_at(self.config.scroll_factor(direction), (x, y));
                Ok(Outcome::ViewChanged)
            }
            InputEvent::Key(Key::Char('n')) => self.next_image(),
            InputEvent::Key(Key::Escape) => Ok(self.cancel_clicks()),
            InputEvent::Key(Key::Char('d')) => self.undo(),
            _ => Ok(Outcome::Ignored),
        }
    }

    fn add_click(&mut self, screen: (f32, f32)) -> Result<Outcome, SessionError> {
        let point = self.viewport.to_image(screen);
        if !self.viewport.contains_image_point(point) {
            return Ok(Outcome::Ignored);
        }
        let Some(active) = self.active.as_mut() else {
            return Ok(Outcome::Ignored);
        };

        let point = (f64::from(point.0), f64::from(point.1));
        active.clicks.push(point);
        tracing::debug!(n = active.clicks.len(), x = point.0, y = point.1, "click");
        if active.clicks.len() < 3 {
            return Ok(Outcome::PointAdded(active.clicks.len()));
        }

        let rect = GraspRect::from_clicks(active.clicks[0], active.clicks[1], active.clicks[2]);
        active.clicks.clear();

        let skew = rect.corner_skew_deg();
        if skew > self.config.skew_warn_deg {
            tracing::warn!(
                skew_deg = format_args!("{skew:.1}"),
                "grasp corner is not square; the stored rectangle assumes a right angle"
            );
        }

        let index = active.store.append(&rect)?;
        active.grasps.push(SavedGrasp { index, rect });
        tracing::info!(
            stem = %active.image.stem,
            index,
            angle = format_args!("{:.1}", rect.jacquard_angle),
            "saved grasp"
        );
        Ok(Outcome::GraspSaved(index))
    }

    fn cancel_clicks(&mut self) -> Outcome {
        if let Some(active) = self.active.as_mut() {
            active.clicks.clear();
            tracing::info!("cancelled current grasp");
        }
        Outcome::Cancelled
    }

    fn undo(&mut self) -> Result<Outcome, SessionError> {
        let Some(active) = self.active.as_mut() else {
            return Ok(Outcome::Ignored);
        };
        match active.store.undo()? {
            Some(index) => {
                active.grasps.pop();
                tracing::info!(stem = %active.image.stem, index, "removed grasp");
                Ok(Outcome::GraspRemoved(index))
            }
            None => Ok(Outcome::Ignored),
        }
    }

    fn next_image(&mut self) -> Result<Outcome, SessionError> {
        if let Some(active) = self.active.take() {
            active.store.close()?;
        }
        self.walk.advance();
        Ok(if self.enter_current()? {
            Outcome::ImageChanged
        } else {
            Outcome::Complete
        })
    }

    /// Loads the image under the walk cursor, skipping unreadable files.
    /// Returns `false` once the walk is exhausted.
    fn enter_current(&mut self) -> Result<bool, SessionError> {
        self.panning = false;
        loop {
            let Some(path) = self.walk.current() else {
                self.active = None;
                tracing::info!("all images annotated");
                return Ok(false);
            };

            match LoadedImage::open(path) {
                Ok(image) => {
                    let store = ImageLabelStore::open(&self.save_dir, &image.stem)?;
                    let (w, h) = image.size();
                    self.viewport.set_image(w, h);
                    tracing::info!("{}", self.walk.position_label());
                    self.active = Some(ActiveImage {
                        image,
                        store,
                        clicks: Vec::new(),
                        grasps: Vec::new(),
                    });
                    return Ok(true);
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), "failed to read image: {e}");
                    self.walk.advance();
                }
            }
        }
    }
}
