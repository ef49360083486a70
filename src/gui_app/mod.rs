//! iced windows hosting the annotator and viewer sessions.
//!
//! The canvas turns mouse events into [`InputEvent`]s, the window subscription
//! turns key presses into [`Key`]s, and every redraw reads straight from the
//! session state.

use std::sync::{Arc, Mutex};

use iced::mouse::Cursor;
use iced::widget::canvas::{self, Canvas, Frame, Geometry, Program, Stroke, event};
use iced::widget::{column, container, text};
use iced::{
    Color, Element, Length, Pixels, Point, Rectangle, Size, Subscription, Task, Theme, Vector, keyboard,
    mouse, window,
};

use crate::session::{
    InputEvent, Key, LoadedImage, MouseButton, Outcome, ScrollDirection, SessionError,
};
use crate::viewport::Viewport;

pub mod annotator;
pub mod viewer;

pub use annotator::run_annotator;
pub use viewer::run_viewer;

#[derive(Debug, thiserror::Error)]
pub enum GuiError {
    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Iced(#[from] iced::Error),
}

/// What the window needs from a session.
pub trait InteractiveSession: 'static {
    fn handle(&mut self, event: InputEvent) -> Result<Outcome, SessionError>;
    fn image(&self) -> Option<&LoadedImage>;
    fn viewport(&self) -> &Viewport;
    fn title(&self) -> String;
    /// One-line status under the canvas.
    fn status(&self) -> String;
    /// Labels drawn over the image, mapped to the screen through `viewport`.
    fn draw_overlay(&self, frame: &mut Frame, viewport: &Viewport);
    /// Printed once the session is done.
    fn farewell(&self) -> &'static str;
}

#[derive(Debug, Clone)]
enum Message {
    /// Canvas bounds at the time of the event; `event` is `None` when only the
    /// bounds need syncing.
    Canvas { bounds: Size, event: Option<InputEvent> },
    Key(Key),
}

struct SessionApp<S> {
    session: S,
    handle: Option<iced::widget::image::Handle>,
    image_cache: canvas::Cache,
    failure: Arc<Mutex<Option<SessionError>>>,
}

/// Opens a window over `session` and blocks until it closes.
///
/// A session error closes the window and is returned.
pub(crate) fn run_session<S: InteractiveSession>(session: S) -> Result<(), GuiError> {
    let failure = Arc::new(Mutex::new(None));
    let app = SessionApp {
        handle: session.image().map(image_handle),
        session,
        image_cache: canvas::Cache::default(),
        failure: Arc::clone(&failure),
    };

    iced::application(
        SessionApp::<S>::title,
        SessionApp::<S>::update,
        SessionApp::<S>::view,
    )
    .subscription(SessionApp::<S>::subscription)
    .theme(SessionApp::<S>::theme)
    .window(window::Settings {
        size: Size::new(1280.0, 860.0),
        ..Default::default()
    })
    .run_with(move || (app, Task::none()))?;

    let failure = failure.lock().map(|mut f| f.take()).unwrap_or_default();
    match failure {
        Some(e) => Err(e.into()),
        None => Ok(()),
    }
}

fn image_handle(image: &LoadedImage) -> iced::widget::image::Handle {
    let (w, h) = image.rgba.dimensions();
    iced::widget::image::Handle::from_rgba(w, h, image.rgba.as_raw().clone())
}

impl<S: InteractiveSession> SessionApp<S> {
    fn title(&self) -> String {
        self.session.title()
    }

    fn update(&mut self, message: Message) -> Task<Message> {
        let result = match message {
            Message::Canvas { bounds, event } => {
                let resized = self.session.handle(InputEvent::Resize {
                    width: bounds.width,
                    height: bounds.height,
                });
                match event {
                    Some(event) => resized.and_then(|_| self.session.handle(event)),
                    None => resized,
                }
            }
            Message::Key(key) => self.session.handle(InputEvent::Key(key)),
        };

        match result {
            Ok(Outcome::Complete | Outcome::Quit) => {
                println!("{}", self.session.farewell());
                iced::exit()
            }
            Ok(outcome) => {
                if outcome == Outcome::ImageChanged {
                    self.handle = self.session.image().map(image_handle);
                }
                if outcome.needs_redraw() {
                    self.image_cache.clear();
                }
                Task::none()
            }
            Err(e) => {
                tracing::error!("{e}");
                if let Ok(mut slot) = self.failure.lock() {
                    *slot = Some(e);
                }
                iced::exit()
            }
        }
    }

    fn view(&self) -> Element<'_, Message> {
        let canvas = Canvas::new(SessionCanvas { app: self })
            .width(Length::Fill)
            .height(Length::Fill);
        let status = container(text(self.session.status()).size(14))
            .padding(6)
            .width(Length::Fill);

        container(column![canvas, status])
            .width(Length::Fill)
            .height(Length::Fill)
            .style(|_| container::Style {
                background: Some(Color::from_rgb8(32, 32, 32).into()),
                ..Default::default()
            })
            .into()
    }

    fn subscription(&self) -> Subscription<Message> {
        keyboard::on_key_press(key_message)
    }

    fn theme(&self) -> Theme {
        Theme::Dark
    }
}

fn key_message(key: keyboard::Key, _modifiers: keyboard::Modifiers) -> Option<Message> {
    let key = match key {
        keyboard::Key::Named(keyboard::key::Named::Escape) => Key::Escape,
        keyboard::Key::Named(keyboard::key::Named::ArrowLeft) => Key::ArrowLeft,
        keyboard::Key::Named(keyboard::key::Named::ArrowRight) => Key::ArrowRight,
        keyboard::Key::Character(c) => Key::Char(c.chars().next()?.to_ascii_lowercase()),
        _ => return None,
    };
    Some(Message::Key(key))
}

#[derive(Default)]
struct DragState {
    panning: bool,
    last: Option<Point>,
}

struct SessionCanvas<'a, S> {
    app: &'a SessionApp<S>,
}

impl<S: InteractiveSession> Program<Message> for SessionCanvas<'_, S> {
    type State = DragState;

    fn update(
        &self,
        state: &mut Self::State,
        event: canvas::Event,
        bounds: Rectangle,
        cursor: Cursor,
    ) -> (event::Status, Option<Message>) {
        let size = bounds.size();
        let input = match event {
            canvas::Event::Mouse(mouse_event) => mouse_input(state, mouse_event, bounds, cursor),
            _ => None,
        };

        match input {
            Some(event) => (
                event::Status::Captured,
                Some(Message::Canvas {
                    bounds: size,
                    event: Some(event),
                }),
            ),
            // Keep the session's transform on the bounds being drawn, even between clicks.
            None if bounds_changed(self.app.session.viewport(), size) => (
                event::Status::Ignored,
                Some(Message::Canvas {
                    bounds: size,
                    event: None,
                }),
            ),
            None => (event::Status::Ignored, None),
        }
    }

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &iced::Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: Cursor,
    ) -> Vec<Geometry> {
        let app = self.app;
        let viewport = synced_viewport(app.session.viewport(), bounds.size());

        let image_layer = app.image_cache.draw(renderer, bounds.size(), |frame| {
            frame.fill_rectangle(Point::ORIGIN, bounds.size(), Color::from_rgb8(18, 18, 18));
            if let Some(handle) = &app.handle {
                let (ox, oy) = viewport.offset();
                let (w, h) = viewport.image_size();
                let scale = viewport.scale();
                frame.draw_image(
                    Rectangle::new(Point::new(ox, oy), Size::new(w * scale, h * scale)),
                    canvas::Image::new(handle.clone())
                        .filter_method(iced::widget::image::FilterMethod::Nearest),
                );
            }
        });

        let mut overlay = Frame::new(renderer, bounds.size());
        overlay.with_clip(Rectangle::new(Point::ORIGIN, bounds.size()), |frame| {
            app.session.draw_overlay(frame, &viewport);
        });
        overlay.stroke_rectangle(
            Point::ORIGIN,
            bounds.size(),
            Stroke::default()
                .with_width(1.0)
                .with_color(Color::from_rgb8(70, 70, 70)),
        );

        vec![image_layer, overlay.into_geometry()]
    }
}

/// Translates one canvas mouse event, tracking right-button drags in `state`.
fn mouse_input(
    state: &mut DragState,
    event: mouse::Event,
    bounds: Rectangle,
    cursor: Cursor,
) -> Option<InputEvent> {
    match event {
        mouse::Event::ButtonPressed(button @ (mouse::Button::Left | mouse::Button::Right)) => {
            let p = cursor.position_in(bounds)?;
            let button = if button == mouse::Button::Left {
                MouseButton::Left
            } else {
                state.panning = true;
                state.last = cursor.position();
                MouseButton::Right
            };
            Some(InputEvent::Click { button, x: p.x, y: p.y })
        }
        mouse::Event::ButtonReleased(mouse::Button::Right) if state.panning => {
            state.panning = false;
            state.last = None;
            Some(InputEvent::Release {
                button: MouseButton::Right,
            })
        }
        mouse::Event::CursorMoved { position } if state.panning => {
            let last = state.last.replace(position)?;
            Some(InputEvent::Drag {
                dx: position.x - last.x,
                dy: position.y - last.y,
            })
        }
        mouse::Event::WheelScrolled { delta } => {
            let steps = match delta {
                mouse::ScrollDelta::Lines { y, .. } => y,
                mouse::ScrollDelta::Pixels { y, .. } => y / 120.0,
            };
            let p = cursor.position_in(bounds)?;
            if steps.abs() <= f32::EPSILON {
                return None;
            }
            let direction = if steps > 0.0 {
                ScrollDirection::Up
            } else {
                ScrollDirection::Down
            };
            Some(InputEvent::Scroll {
                direction,
                x: p.x,
                y: p.y,
            })
        }
        _ => None,
    }
}

fn bounds_changed(viewport: &Viewport, size: Size) -> bool {
    let (w, h) = viewport.bounds();
    (w - size.width).abs() > f32::EPSILON || (h - size.height).abs() > f32::EPSILON
}

/// The session's viewport as it will be once `size` has been applied, so the
/// frame is drawn with the same transform the next click is mapped through.
fn synced_viewport(viewport: &Viewport, size: Size) -> Viewport {
    let mut viewport = viewport.clone();
    viewport.resize(size.width, size.height);
    viewport
}

/// Cornell edges alternate red and blue so the gripper sides can be told apart.
fn edge_color(edge: usize) -> Color {
    if edge % 2 == 0 {
        Color::from_rgb(1.0, 0.0, 0.0)
    } else {
        Color::from_rgb(0.0, 0.3, 1.0)
    }
}

/// Closed outline through `points` with alternating edge colours.
fn outline(frame: &mut Frame, points: &[Point], width: f32) {
    for (i, from) in points.iter().enumerate() {
        line(frame, *from, points[(i + 1) % points.len()], edge_color(i), width);
    }
}

/// Index labels for a run of points, placed just above and right of each.
fn index_labels(points: &[Point]) -> Vec<(String, Point)> {
    points
        .iter()
        .enumerate()
        .map(|(i, p)| (i.to_string(), *p + Vector::new(4.0, -16.0)))
        .collect()
}

/// Screen point of an image coordinate.
fn screen_point(viewport: &Viewport, (x, y): (f64, f64)) -> Point {
    let (sx, sy) = viewport.to_screen((x as f32, y as f32));
    Point::new(sx, sy)
}

fn label(frame: &mut Frame, content: String, position: Point, color: Color) {
    frame.fill_text(canvas::Text {
        content,
        position,
        color,
        size: Pixels(14.0),
        ..Default::default()
    });
}

fn line(frame: &mut Frame, from: Point, to: Point, color: Color, width: f32) {
    frame.stroke(
        &canvas::Path::line(from, to),
        Stroke::default().with_width(width).with_color(color),
    );
}

fn dot(frame: &mut Frame, at: Point, radius: f32, color: Color) {
    frame.fill(&canvas::Path::circle(at, radius), color);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{AnnotatorSession, SessionConfig};
    use approx::assert_abs_diff_eq;

    const WINDOW: Size = Size::new(1280.0, 830.0);

    fn annotator_app(name: &str) -> SessionApp<AnnotatorSession> {
        let root = std::env::temp_dir().join(format!("litchi_grasp_gui_{name}_{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&root);
        let img_dir = root.join("images");
        std::fs::create_dir_all(&img_dir).expect("img dir");
        image::RgbImage::from_pixel(400, 200, image::Rgb([90, 120, 30]))
            .save(img_dir.join("a.png"))
            .expect("write image");

        let session = AnnotatorSession::start(&img_dir, &root.join("labels"), SessionConfig::default())
            .expect("start");
        SessionApp {
            handle: session.image().map(image_handle),
            session,
            image_cache: canvas::Cache::default(),
            failure: Arc::new(Mutex::new(None)),
        }
    }

    fn mouse(event: mouse::Event) -> canvas::Event {
        canvas::Event::Mouse(event)
    }

    fn send(
        app: &SessionApp<AnnotatorSession>,
        state: &mut DragState,
        event: canvas::Event,
        cursor: Point,
    ) -> (event::Status, Option<Message>) {
        let bounds = Rectangle::new(Point::ORIGIN, WINDOW);
        SessionCanvas { app }.update(state, event, bounds, Cursor::Available(cursor))
    }

    #[test]
    fn first_click_lands_where_the_image_was_drawn() {
        let mut app = annotator_app("first_click");
        let mut state = DragState::default();

        // The frame is drawn before the session has seen the window size.
        let drawn = synced_viewport(app.session.viewport(), WINDOW);
        let (sx, sy) = drawn.to_screen((300.0, 150.0));
        assert_abs_diff_eq!(drawn.scale(), 3.2, epsilon = 1e-5);

        let press = mouse(mouse::Event::ButtonPressed(mouse::Button::Left));
        let (status, message) = send(&app, &mut state, press, Point::new(sx, sy));
        assert_eq!(status, event::Status::Captured);
        let _ = app.update(message.expect("click message"));

        let clicked = app.session.clicks()[0];
        assert_abs_diff_eq!(clicked.0, 300.0, epsilon = 1e-3);
        assert_abs_diff_eq!(clicked.1, 150.0, epsilon = 1e-3);
    }

    #[test]
    fn cursor_motion_syncs_bounds_once() {
        let mut app = annotator_app("motion_sync");
        let mut state = DragState::default();
        let moved = || mouse(mouse::Event::CursorMoved {
            position: Point::new(10.0, 10.0),
        });

        let (status, message) = send(&app, &mut state, moved(), Point::new(10.0, 10.0));
        assert_eq!(status, event::Status::Ignored);
        let message = message.expect("sync message");
        assert!(matches!(message, Message::Canvas { event: None, bounds } if bounds == WINDOW));
        let _ = app.update(message);
        assert_eq!(app.session.viewport().bounds(), (WINDOW.width, WINDOW.height));

        let (_, message) = send(&app, &mut state, moved(), Point::new(10.0, 10.0));
        assert!(message.is_none());
    }

    #[test]
    fn right_drag_becomes_pan_events() {
        let bounds = Rectangle::new(Point::ORIGIN, WINDOW);
        let at = |x, y| Cursor::Available(Point::new(x, y));
        let mut state = DragState::default();

        let moved = mouse::Event::CursorMoved {
            position: Point::new(60.0, 40.0),
        };
        assert_eq!(mouse_input(&mut state, moved, bounds, at(60.0, 40.0)), None);

        let press = mouse::Event::ButtonPressed(mouse::Button::Right);
        assert_eq!(
            mouse_input(&mut state, press, bounds, at(50.0, 50.0)),
            Some(InputEvent::Click {
                button: MouseButton::Right,
                x: 50.0,
                y: 50.0
            })
        );
        assert_eq!(
            mouse_input(&mut state, moved, bounds, at(60.0, 40.0)),
            Some(InputEvent::Drag { dx: 10.0, dy: -10.0 })
        );

        let release = mouse::Event::ButtonReleased(mouse::Button::Right);
        assert_eq!(
            mouse_input(&mut state, release, bounds, at(60.0, 40.0)),
            Some(InputEvent::Release {
                button: MouseButton::Right
            })
        );
        assert_eq!(mouse_input(&mut state, moved, bounds, at(60.0, 40.0)), None);
    }

    #[test]
    fn edges_alternate_red_and_blue() {
        let red = Color::from_rgb(1.0, 0.0, 0.0);
        let blue = Color::from_rgb(0.0, 0.3, 1.0);
        let colors: Vec<Color> = (0..4).map(edge_color).collect();
        assert_eq!(colors, [red, blue, red, blue]);
    }

    #[test]
    fn pending_clicks_are_numbered_from_zero() {
        let points = [Point::new(10.0, 10.0), Point::new(50.0, 10.0), Point::new(50.0, 30.0)];
        let labels = index_labels(&points);
        let texts: Vec<&str> = labels.iter().map(|(t, _)| t.as_str()).collect();
        assert_eq!(texts, ["0", "1", "2"]);
        assert_eq!(labels[1].1, Point::new(54.0, -6.0));
    }
}
