use std::path::Path;

use iced::widget::canvas::Frame;
use iced::{Color, Vector};

use crate::session::{InputEvent, LoadedImage, Outcome, SessionConfig, SessionError, ViewerSession};
use crate::viewport::Viewport;

use super::{GuiError, InteractiveSession, label, line, outline, run_session, screen_point};

const TAG_COLOR: Color = Color::from_rgb(0.1, 0.9, 0.2);
const MARKER_COLOR: Color = Color::from_rgb(0.1, 0.9, 0.2);
const ANGLE_COLOR: Color = Color::from_rgb(0.3, 0.5, 1.0);
const MARKER_HALF: f32 = 6.0;

pub fn run_viewer(img_dir: &Path, label_dir: &Path, config: SessionConfig) -> Result<(), GuiError> {
    let session = ViewerSession::start(img_dir, label_dir, config)?;
    if session.is_complete() {
        println!("{}", session.farewell());
        return Ok(());
    }
    run_session(session)
}

impl InteractiveSession for ViewerSession {
    fn handle(&mut self, event: InputEvent) -> Result<Outcome, SessionError> {
        ViewerSession::handle(self, event)
    }

    fn image(&self) -> Option<&LoadedImage> {
        ViewerSession::image(self)
    }

    fn viewport(&self) -> &Viewport {
        ViewerSession::viewport(self)
    }

    fn title(&self) -> String {
        ViewerSession::title(self)
    }

    fn status(&self) -> String {
        let (rects, markers) = self
            .overlay()
            .map(|o| (o.rects.len(), o.markers.len()))
            .unwrap_or_default();
        format!(
            "{} | rectangles: {rects} | markers: {markers}",
            self.viewport().zoom_label()
        )
    }

    fn draw_overlay(&self, frame: &mut Frame, viewport: &Viewport) {
        let Some(overlay) = self.overlay() else {
            return;
        };

        for (i, rect) in overlay.rects.iter().enumerate() {
            let points: Vec<_> = rect.corners.iter().map(|&c| screen_point(viewport, c)).collect();
            outline(frame, &points, 2.0);
            if let Some(first) = points.first() {
                label(frame, format!("G{i}"), *first + Vector::new(4.0, -18.0), TAG_COLOR);
            }
        }

        for marker in &overlay.markers {
            let c = screen_point(viewport, marker.center);
            line(
                frame,
                c + Vector::new(-MARKER_HALF, -MARKER_HALF),
                c + Vector::new(MARKER_HALF, MARKER_HALF),
                MARKER_COLOR,
                2.0,
            );
            line(
                frame,
                c + Vector::new(-MARKER_HALF, MARKER_HALF),
                c + Vector::new(MARKER_HALF, -MARKER_HALF),
                MARKER_COLOR,
                2.0,
            );
            label(
                frame,
                format!("{:.1}\u{b0}", marker.angle),
                c + Vector::new(MARKER_HALF + 2.0, 0.0),
                ANGLE_COLOR,
            );
        }
    }

    fn farewell(&self) -> &'static str {
        "All images viewed."
    }
}
