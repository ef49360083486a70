use std::path::Path;

use iced::widget::canvas::Frame;
use iced::{Color, Point};

use crate::session::{
    AnnotatorSession, InputEvent, LoadedImage, Outcome, SessionConfig, SessionError,
};
use crate::viewport::Viewport;

use super::{
    GuiError, InteractiveSession, dot, index_labels, label, line, outline, run_session, screen_point,
};

const CLICK_COLOR: Color = Color::from_rgb(0.1, 0.9, 0.2);
const CORNER_COLOR: Color = Color::from_rgb(1.0, 1.0, 0.2);
const LABEL_COLOR: Color = Color::WHITE;

/// Runs the annotator window over `img_dir`, saving labels under `save_dir`.
pub fn run_annotator(img_dir: &Path, save_dir: &Path, config: SessionConfig) -> Result<(), GuiError> {
    let session = AnnotatorSession::start(img_dir, save_dir, config)?;
    if session.is_complete() {
        println!("{}", session.farewell());
        return Ok(());
    }
    run_session(session)
}

impl InteractiveSession for AnnotatorSession {
    fn handle(&mut self, event: InputEvent) -> Result<Outcome, SessionError> {
        AnnotatorSession::handle(self, event)
    }

    fn image(&self) -> Option<&LoadedImage> {
        AnnotatorSession::image(self)
    }

    fn viewport(&self) -> &Viewport {
        AnnotatorSession::viewport(self)
    }

    fn title(&self) -> String {
        AnnotatorSession::title(self)
    }

    fn status(&self) -> String {
        format!(
            "{} | grasps: {} | clicks: {}/3",
            self.viewport().zoom_label(),
            self.grasps().len(),
            self.clicks().len()
        )
    }

    fn draw_overlay(&self, frame: &mut Frame, viewport: &Viewport) {
        for saved in self.grasps() {
            let corners = saved.rect.corners().map(|c| screen_point(viewport, c));
            outline(frame, &corners, 2.0);
            for corner in &corners {
                dot(frame, *corner, 3.0, CORNER_COLOR);
            }
            for (text, at) in index_labels(&corners) {
                label(frame, text, at, CORNER_COLOR);
            }
            let center = screen_point(viewport, saved.rect.center);
            label(
                frame,
                format!("G{}: {:.1}\u{b0}", saved.index, saved.rect.jacquard_angle),
                center,
                LABEL_COLOR,
            );
        }

        let clicks: Vec<Point> = self.clicks().iter().map(|&c| screen_point(viewport, c)).collect();
        for pair in clicks.windows(2) {
            line(frame, pair[0], pair[1], CLICK_COLOR, 1.0);
        }
        for p in &clicks {
            dot(frame, *p, 4.0, CLICK_COLOR);
        }
        for (text, at) in index_labels(&clicks) {
            label(frame, text, at, CLICK_COLOR);
        }
    }

    fn farewell(&self) -> &'static str {
        "All images annotated."
    }
}
