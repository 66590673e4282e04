//! # Plot Widget
//!
//! The scrolling pitch-trace canvas: reference grid rows with their styled
//! lines, note labels in two columns on each side, proximity links, and the
//! observation dots themselves. All geometry and styling decisions are made
//! in the core; this widget only paints the [`RenderFrame`] it is given.

use iced::widget::canvas::{self, Geometry, LineDash, Path, Stroke, Text};
use iced::widget::container;
use iced::{Color, Element, Pixels, Point, Rectangle, Renderer, Size, Theme, mouse};

use trace_core::RenderFrame;
use trace_core::engine::GridRow;
use trace_core::layout::ColumnSide;
use trace_core::theory::{LineStyle, Rgb};

/// Drawable plot area, not counting the label gutters.
pub const PLOT_WIDTH: f32 = 950.0;
pub const PLOT_HEIGHT: f32 = 500.0;

/// Width of the label area on each side; holds two 50 px label columns.
const GUTTER_WIDTH: f32 = 100.0;
const LABEL_WIDTH: f32 = 50.0;
const LABEL_HEIGHT: f32 = 20.0;

/// Height of the filled band drawn behind the fifth's row.
const BAND_HEIGHT: f32 = 26.0;

const POINT_RADIUS: f32 = 9.0;

fn color_of(rgb: Rgb) -> Color {
    Color::from_rgb8(rgb.r, rgb.g, rgb.b)
}

/// Canvas widget that paints one frame of the trace.
pub struct Plot {
    frame: RenderFrame,
}

impl Plot {
    pub fn new(frame: RenderFrame) -> Self {
        Self { frame }
    }

    pub fn view(self) -> Element<'static, super::super::Message> {
        container(
            canvas::Canvas::new(self)
                .width(iced::Length::Fixed(PLOT_WIDTH + 2.0 * GUTTER_WIDTH))
                .height(iced::Length::Fixed(PLOT_HEIGHT)),
        )
        .into()
    }

    fn draw_row(&self, frame: &mut canvas::Frame, row: &GridRow) {
        let left = GUTTER_WIDTH;
        let right = GUTTER_WIDTH + PLOT_WIDTH;

        match &row.style {
            LineStyle::None => {}
            LineStyle::Band => {
                let band = Path::rectangle(
                    Point::new(left, row.y - BAND_HEIGHT / 2.0),
                    Size::new(PLOT_WIDTH, BAND_HEIGHT),
                );
                frame.fill(&band, Color::from_rgba8(200, 200, 200, 0.5));
            }
            LineStyle::Line { color, width, dash } => {
                let path = Path::line(Point::new(left, row.y), Point::new(right, row.y));
                let stroke = Stroke::default()
                    .with_width(*width)
                    .with_color(color_of(*color));
                match dash.as_ref() {
                    Some(segments) => frame.stroke(
                        &path,
                        Stroke {
                            line_dash: LineDash {
                                segments: segments.as_slice(),
                                offset: 0,
                            },
                            ..stroke
                        },
                    ),
                    None => frame.stroke(&path, stroke),
                }
            }
        }

        if let Some(label) = row.label {
            // Inside column hugs the plot; the outside column sits beyond it.
            let inside_offset = match row.column {
                ColumnSide::Inside => LABEL_WIDTH,
                ColumnSide::Outside => 2.0 * LABEL_WIDTH,
            };
            for x in [left - inside_offset, right + inside_offset - LABEL_WIDTH] {
                if let Some(background) = row.background {
                    let rect = Path::rectangle(
                        Point::new(x, row.y - LABEL_HEIGHT / 2.0),
                        Size::new(LABEL_WIDTH, LABEL_HEIGHT),
                    );
                    frame.fill(&rect, color_of(background));
                }
                frame.fill_text(Text {
                    content: label.to_string(),
                    position: Point::new(x + LABEL_WIDTH / 2.0, row.y),
                    color: Color::BLACK,
                    size: Pixels(if row.diatonic { 18.0 } else { 14.0 }),
                    horizontal_alignment: iced::alignment::Horizontal::Center,
                    vertical_alignment: iced::alignment::Vertical::Center,
                    // Accidentals are outside the basic shaping fast path.
                    shaping: iced::widget::text::Shaping::Advanced,
                    ..Text::default()
                });
            }
        }
    }
}

impl<Message> canvas::Program<Message> for Plot {
    type State = ();

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: mouse::Cursor,
    ) -> Vec<Geometry> {
        let mut canvas_frame = canvas::Frame::new(renderer, bounds.size());

        let backdrop = Path::rectangle(
            Point::new(GUTTER_WIDTH, 0.0),
            Size::new(PLOT_WIDTH, PLOT_HEIGHT),
        );
        canvas_frame.fill(&backdrop, Color::WHITE);

        for row in &self.frame.rows {
            self.draw_row(&mut canvas_frame, row);
        }

        // Links go under the dots so dense traces read as a connected line.
        let link_stroke = Stroke::default()
            .with_width(2.0)
            .with_color(Color::from_rgba8(0, 0, 0, 0.6));
        for &(a, b) in &self.frame.links {
            let from = &self.frame.points[a];
            let to = &self.frame.points[b];
            let path = Path::line(
                Point::new(GUTTER_WIDTH + from.x, from.y),
                Point::new(GUTTER_WIDTH + to.x, to.y),
            );
            canvas_frame.stroke(&path, link_stroke);
        }

        for point in &self.frame.points {
            let dot = Path::circle(Point::new(GUTTER_WIDTH + point.x, point.y), POINT_RADIUS);
            canvas_frame.fill(
                &dot,
                Color::from_rgba8(point.color.r, point.color.g, point.color.b, point.opacity),
            );
        }

        vec![canvas_frame.into_geometry()]
    }
}
