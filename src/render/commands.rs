//! Line, rectangle and ellipse commands

use glam::{DVec2, dvec2};

use super::context::{DrawingContext, LayoutContext};
use super::{Command, RenderCommand};
use crate::point::ComponentPoint;
use crate::types::LayoutInformation;

/// Straight line between two points
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    pub start: ComponentPoint,
    pub end: ComponentPoint,
    pub thickness: f64,
}

impl Command for Line {
    fn draw(&self, layout: &LayoutInformation, context: &LayoutContext<'_>, sink: &mut dyn DrawingContext) {
        let start = context.place(layout, self.start.resolve(layout, &context.options));
        let end = context.place(layout, self.end.resolve(layout, &context.options));
        sink.draw_line(start, end, self.thickness);
    }

    fn flip(&self, horizontal: bool) -> RenderCommand {
        Line {
            start: self.start.flip(horizontal),
            end: self.end.flip(horizontal),
            thickness: self.thickness,
        }
        .into()
    }

    fn transpose(&self) -> RenderCommand {
        Line {
            start: self.start.transposed(),
            end: self.end.transposed(),
            thickness: self.thickness,
        }
        .into()
    }
}

/// Axis-aligned rectangle
///
/// Only the top-left corner is a component point; the extent is fixed. A
/// mirrored rectangle therefore keeps its extent and moves its corner by the
/// full width or height.
#[derive(Debug, Clone, PartialEq)]
pub struct Rectangle {
    pub location: ComponentPoint,
    pub width: f64,
    pub height: f64,
    pub thickness: f64,
    pub fill: bool,
}

impl Command for Rectangle {
    fn draw(&self, layout: &LayoutInformation, context: &LayoutContext<'_>, sink: &mut dyn DrawingContext) {
        let top_left = context.place(layout, self.location.resolve(layout, &context.options));
        sink.draw_rectangle(top_left, dvec2(self.width, self.height), self.thickness, self.fill);
    }

    fn flip(&self, horizontal: bool) -> RenderCommand {
        let mut location = self.location.flip(horizontal);
        if horizontal {
            location.offset.x -= self.width;
        } else {
            location.offset.y -= self.height;
        }
        Rectangle {
            location,
            ..self.clone()
        }
        .into()
    }

    fn transpose(&self) -> RenderCommand {
        Rectangle {
            location: self.location.transposed(),
            width: self.height,
            height: self.width,
            ..self.clone()
        }
        .into()
    }
}

/// Ellipse around a centre point
#[derive(Debug, Clone, PartialEq)]
pub struct Ellipse {
    pub centre: ComponentPoint,
    pub radius_x: f64,
    pub radius_y: f64,
    pub thickness: f64,
    pub fill: bool,
}

impl Command for Ellipse {
    fn draw(&self, layout: &LayoutInformation, context: &LayoutContext<'_>, sink: &mut dyn DrawingContext) {
        let centre = context.place(layout, self.centre.resolve(layout, &context.options));
        sink.draw_ellipse(centre, self.radius_x, self.radius_y, self.thickness, self.fill);
    }

    fn flip(&self, horizontal: bool) -> RenderCommand {
        Ellipse {
            centre: self.centre.flip(horizontal),
            ..self.clone()
        }
        .into()
    }

    fn transpose(&self) -> RenderCommand {
        Ellipse {
            centre: self.centre.transposed(),
            radius_x: self.radius_y,
            radius_y: self.radius_x,
            ..self.clone()
        }
        .into()
    }
}

impl Ellipse {
    pub fn radii(&self) -> DVec2 {
        dvec2(self.radius_x, self.radius_y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::context::{DrawOp, RawText, RecordingContext};
    use crate::types::{FlipState, LayoutOptions, Orientation};

    fn point(text: &str) -> ComponentPoint {
        ComponentPoint::parse(text).unwrap()
    }

    fn render(command: impl Into<RenderCommand>, layout: &LayoutInformation, options: LayoutOptions) -> Vec<DrawOp> {
        let mut sink = RecordingContext::new();
        let context = LayoutContext::new(options, &RawText);
        let command: RenderCommand = command.into();
        command.render(layout, &context, &mut sink);
        sink.into_ops()
    }

    #[test]
    fn line_absolute_and_relative() {
        let line = Line {
            start: point("Start,Middle+20"),
            end: point("End,Middle+20"),
            thickness: 2.0,
        };
        let layout = LayoutInformation::new(dvec2(100.0, 100.0), 40.0, Orientation::Horizontal);

        assert_eq!(
            render(line.clone(), &layout, LayoutOptions::absolute()),
            [DrawOp::Line {
                start: dvec2(100.0, 120.0),
                end: dvec2(140.0, 120.0),
                thickness: 2.0,
            }]
        );
        assert_eq!(
            render(line, &layout, LayoutOptions::default()),
            [DrawOp::Line {
                start: dvec2(0.0, 20.0),
                end: dvec2(40.0, 20.0),
                thickness: 2.0,
            }]
        );
    }

    #[test]
    fn flipped_rectangle_moves_by_its_width() {
        let rect = Rectangle {
            location: point("Start+10,Middle-4"),
            width: 20.0,
            height: 8.0,
            thickness: 2.0,
            fill: false,
        };
        let layout = LayoutInformation::new(DVec2::ZERO, 60.0, Orientation::Horizontal).with_flip(FlipState::PRIMARY);
        assert_eq!(
            render(rect.clone(), &layout, LayoutOptions::default()),
            [DrawOp::Rectangle {
                top_left: dvec2(30.0, -4.0),
                size: dvec2(20.0, 8.0),
                thickness: 2.0,
                fill: false,
            }]
        );

        let both = layout.with_flip(FlipState::BOTH);
        assert_eq!(
            render(rect, &both, LayoutOptions::default()),
            [DrawOp::Rectangle {
                top_left: dvec2(30.0, -4.0),
                size: dvec2(20.0, 8.0),
                thickness: 2.0,
                fill: false,
            }]
        );
    }

    #[test]
    fn vertical_flip_of_vertical_component() {
        let rect = Rectangle {
            location: point("Middle-4,Start+10"),
            width: 8.0,
            height: 20.0,
            thickness: 1.0,
            fill: true,
        };
        let layout = LayoutInformation::new(DVec2::ZERO, 60.0, Orientation::Vertical).with_flip(FlipState::PRIMARY);
        assert_eq!(
            render(rect, &layout, LayoutOptions::default()),
            [DrawOp::Rectangle {
                top_left: dvec2(-4.0, 30.0),
                size: dvec2(8.0, 20.0),
                thickness: 1.0,
                fill: true,
            }]
        );
    }

    #[test]
    fn ellipse_transpose_swaps_radii() {
        let ellipse = Ellipse {
            centre: point("Middle,Start+3"),
            radius_x: 6.0,
            radius_y: 2.0,
            thickness: 1.0,
            fill: false,
        };
        let RenderCommand::Ellipse(t) = ellipse.transpose() else {
            panic!("transpose changed the command kind");
        };
        assert_eq!(t.radii(), dvec2(2.0, 6.0));
        assert_eq!(t.centre, point("Start+3,Middle"));
    }
}
