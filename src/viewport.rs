//! Pan/zoom camera mapping image pixels onto a screen-space view.
//!
//! Screen coordinates are relative to the top-left corner of the view, image
//! coordinates are pixels of the source image. No GUI types are involved so the
//! sessions can drive it from plain input events.

/// A point or vector as `(x, y)`.
pub type Vec2 = (f32, f32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ZoomMode {
    Fit,
    Custom,
}

#[derive(Debug, Clone)]
pub struct Viewport {
    image_size: Vec2,
    bounds: Vec2,
    zoom_mode: ZoomMode,
    custom_scale: f32,
    offset: Vec2,
    min_zoom_factor: f32,
    max_zoom_factor: f32,
}

impl Viewport {
    pub const DEFAULT_MIN_ZOOM_FACTOR: f32 = 0.25;
    pub const DEFAULT_MAX_ZOOM_FACTOR: f32 = 16.0;

    /// A viewport whose bounds initially equal the image size (identity mapping).
    pub fn new(image_width: f32, image_height: f32) -> Self {
        Self {
            image_size: (image_width, image_height),
            bounds: (image_width, image_height),
            zoom_mode: ZoomMode::Fit,
            custom_scale: 1.0,
            offset: (0.0, 0.0),
            min_zoom_factor: Self::DEFAULT_MIN_ZOOM_FACTOR,
            max_zoom_factor: Self::DEFAULT_MAX_ZOOM_FACTOR,
        }
    }

    /// Limits zoom to `[fit * min, fit * max]`.
    pub fn with_zoom_limits(mut self, min: f32, max: f32) -> Self {
        self.min_zoom_factor = min.min(1.0);
        self.max_zoom_factor = max.max(1.0);
        self
    }

    pub fn image_size(&self) -> Vec2 {
        self.image_size
    }

    pub fn bounds(&self) -> Vec2 {
        self.bounds
    }

    pub fn is_fit(&self) -> bool {
        self.zoom_mode == ZoomMode::Fit
    }

    /// Swaps in a new image and resets to fit, keeping the current bounds.
    /// A viewport that was never sized adopts the image size as its bounds.
    pub fn set_image(&mut self, width: f32, height: f32) {
        self.image_size = (width, height);
        if self.bounds.0 <= 0.0 || self.bounds.1 <= 0.0 {
            self.bounds = (width, height);
        }
        self.reset();
    }

    /// Back to the whole image, centred.
    pub fn reset(&mut self) {
        self.zoom_mode = ZoomMode::Fit;
        self.custom_scale = 1.0;
        self.offset = self.center_offset(self.fit_scale());
    }

    /// Applies new view bounds. Returns whether they changed.
    pub fn resize(&mut self, width: f32, height: f32) -> bool {
        let changed = (self.bounds.0 - width).abs() > f32::EPSILON
            || (self.bounds.1 - height).abs() > f32::EPSILON;
        if !changed {
            return false;
        }

        self.bounds = (width, height);
        match self.zoom_mode {
            ZoomMode::Fit => self.offset = self.center_offset(self.fit_scale()),
            ZoomMode::Custom => self.offset = self.clamp_offset(self.offset, self.custom_scale),
        }
        true
    }

    pub fn fit_scale(&self) -> f32 {
        let (w, h) = self.image_size;
        if w <= 0.0 || h <= 0.0 || self.bounds.0 <= 0.0 || self.bounds.1 <= 0.0 {
            return 1.0;
        }
        (self.bounds.0 / w).min(self.bounds.1 / h).max(0.0001)
    }

    pub fn scale(&self) -> f32 {
        match self.zoom_mode {
            ZoomMode::Fit => self.fit_scale(),
            ZoomMode::Custom => self.custom_scale,
        }
    }

    /// Screen position of the image's top-left corner.
    pub fn offset(&self) -> Vec2 {
        match self.zoom_mode {
            ZoomMode::Fit => self.center_offset(self.fit_scale()),
            ZoomMode::Custom => self.offset,
        }
    }

    /// Multiplies the scale by `factor`, keeping the image point under `cursor` in place
    /// unless the result has to be clamped.
    pub fn zoom_at(&mut self, factor: f32, cursor: Vec2) {
        let current = self.scale();
        let fit = self.fit_scale();
        let target = (current * factor).clamp(fit * self.min_zoom_factor, fit * self.max_zoom_factor);

        if (target - fit).abs() < 0.001 * fit {
            self.reset();
            return;
        }

        let ratio = target / current;
        let offset = self.offset();
        let raw = (
            cursor.0 - (cursor.0 - offset.0) * ratio,
            cursor.1 - (cursor.1 - offset.1) * ratio,
        );
        self.zoom_mode = ZoomMode::Custom;
        self.custom_scale = target;
        self.offset = self.clamp_offset(raw, target);
    }

    /// Moves the image by a screen-space delta.
    pub fn pan(&mut self, dx: f32, dy: f32) {
        if self.zoom_mode == ZoomMode::Fit {
            // Fit keeps the image centred; panning starts a custom view at the same scale.
            self.custom_scale = self.fit_scale();
            self.offset = self.offset();
            self.zoom_mode = ZoomMode::Custom;
        }
        let moved = (self.offset.0 + dx, self.offset.1 + dy);
        self.offset = self.clamp_offset(moved, self.custom_scale);
    }

    pub fn to_image(&self, screen: Vec2) -> Vec2 {
        let scale = self.scale();
        let offset = self.offset();
        ((screen.0 - offset.0) / scale, (screen.1 - offset.1) / scale)
    }

    pub fn to_screen(&self, image: Vec2) -> Vec2 {
        let scale = self.scale();
        let offset = self.offset();
        (image.0 * scale + offset.0, image.1 * scale + offset.1)
    }

    pub fn contains_image_point(&self, p: Vec2) -> bool {
        p.0 >= 0.0 && p.1 >= 0.0 && p.0 <= self.image_size.0 && p.1 <= self.image_size.1
    }

    pub fn zoom_label(&self) -> String {
        let percent = self.scale() * 100.0;
        if self.is_fit() {
            format!("Zoom: {percent:.0}% (Fit)")
        } else {
            format!("Zoom: {percent:.0}%")
        }
    }

    fn center_offset(&self, scale: f32) -> Vec2 {
        (
            (self.bounds.0 - self.image_size.0 * scale) / 2.0,
            (self.bounds.1 - self.image_size.1 * scale) / 2.0,
        )
    }

    /// Keeps a zoomed-in image covering the view and a zoomed-out one centred.
    fn clamp_offset(&self, offset: Vec2, scale: f32) -> Vec2 {
        let axis = |offset: f32, image: f32, view: f32| {
            let scaled = image * scale;
            if scaled <= view {
                (view - scaled) / 2.0
            } else {
                offset.clamp(view - scaled, 0.0)
            }
        };
        (
            axis(offset.0, self.image_size.0, self.bounds.0),
            axis(offset.1, self.image_size.1, self.bounds.1),
        )
    }
}
