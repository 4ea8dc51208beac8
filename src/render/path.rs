//! Path commands
//!
//! Path data uses the SVG command letters `M L H V C S Q T A Z`. Upper case
//! coordinates are relative to the path's start point, lower case ones to
//! the current point. Nothing here is resolved against a layout; the sink
//! receives the commands together with the resolved start point.

use std::fmt;

use glam::{DVec2, Vec2Swizzles, dvec2};
use pest::Parser;
use pest::iterators::Pair;

use super::Command;
use super::RenderCommand;
use super::context::{DrawingContext, LayoutContext};
use crate::errors::PathParseError;
use crate::point::ComponentPoint;
use crate::types::LayoutInformation;
use crate::{DescriptionParser, Rule};

/// Geometry of a single path command.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathSegment {
    MoveTo(DVec2),
    LineTo(DVec2),
    HorizontalTo(f64),
    VerticalTo(f64),
    CurveTo {
        control_start: DVec2,
        control_end: DVec2,
        end: DVec2,
    },
    SmoothCurveTo {
        control_end: DVec2,
        end: DVec2,
    },
    QuadraticTo {
        control: DVec2,
        end: DVec2,
    },
    SmoothQuadraticTo(DVec2),
    EllipticalArcTo {
        radii: DVec2,
        rotation: f64,
        large_arc: bool,
        sweep: bool,
        end: DVec2,
    },
    ClosePath,
}

/// A path command and whether its coordinates are relative to the current
/// point (lower case) or to the path start (upper case).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathCommand {
    pub segment: PathSegment,
    pub relative: bool,
}

impl PathCommand {
    pub fn new(segment: PathSegment, relative: bool) -> Self {
        Self { segment, relative }
    }

    pub fn letter(&self) -> char {
        let upper = match self.segment {
            PathSegment::MoveTo(_) => 'M',
            PathSegment::LineTo(_) => 'L',
            PathSegment::HorizontalTo(_) => 'H',
            PathSegment::VerticalTo(_) => 'V',
            PathSegment::CurveTo { .. } => 'C',
            PathSegment::SmoothCurveTo { .. } => 'S',
            PathSegment::QuadraticTo { .. } => 'Q',
            PathSegment::SmoothQuadraticTo(_) => 'T',
            PathSegment::EllipticalArcTo { .. } => 'A',
            PathSegment::ClosePath => 'Z',
        };
        if self.relative {
            upper.to_ascii_lowercase()
        } else {
            upper
        }
    }

    /// Mirror across the y axis (`horizontal`) or the x axis.
    pub fn flipped(&self, horizontal: bool) -> Self {
        let m = if horizontal { dvec2(-1.0, 1.0) } else { dvec2(1.0, -1.0) };
        let segment = match self.segment {
            PathSegment::MoveTo(p) => PathSegment::MoveTo(p * m),
            PathSegment::LineTo(p) => PathSegment::LineTo(p * m),
            PathSegment::HorizontalTo(x) => PathSegment::HorizontalTo(if horizontal { -x } else { x }),
            PathSegment::VerticalTo(y) => PathSegment::VerticalTo(if horizontal { y } else { -y }),
            PathSegment::CurveTo {
                control_start,
                control_end,
                end,
            } => PathSegment::CurveTo {
                control_start: control_start * m,
                control_end: control_end * m,
                end: end * m,
            },
            PathSegment::SmoothCurveTo { control_end, end } => PathSegment::SmoothCurveTo {
                control_end: control_end * m,
                end: end * m,
            },
            PathSegment::QuadraticTo { control, end } => PathSegment::QuadraticTo {
                control: control * m,
                end: end * m,
            },
            PathSegment::SmoothQuadraticTo(p) => PathSegment::SmoothQuadraticTo(p * m),
            PathSegment::EllipticalArcTo {
                radii,
                rotation,
                large_arc,
                sweep,
                end,
            } => PathSegment::EllipticalArcTo {
                radii,
                rotation: -rotation,
                large_arc,
                sweep: !sweep,
                end: end * m,
            },
            PathSegment::ClosePath => PathSegment::ClosePath,
        };
        Self::new(segment, self.relative)
    }

    /// Mirror across the line x = y.
    pub fn transposed(&self) -> Self {
        let segment = match self.segment {
            PathSegment::MoveTo(p) => PathSegment::MoveTo(p.yx()),
            PathSegment::LineTo(p) => PathSegment::LineTo(p.yx()),
            PathSegment::HorizontalTo(x) => PathSegment::VerticalTo(x),
            PathSegment::VerticalTo(y) => PathSegment::HorizontalTo(y),
            PathSegment::CurveTo {
                control_start,
                control_end,
                end,
            } => PathSegment::CurveTo {
                control_start: control_start.yx(),
                control_end: control_end.yx(),
                end: end.yx(),
            },
            PathSegment::SmoothCurveTo { control_end, end } => PathSegment::SmoothCurveTo {
                control_end: control_end.yx(),
                end: end.yx(),
            },
            PathSegment::QuadraticTo { control, end } => PathSegment::QuadraticTo {
                control: control.yx(),
                end: end.yx(),
            },
            PathSegment::SmoothQuadraticTo(p) => PathSegment::SmoothQuadraticTo(p.yx()),
            PathSegment::EllipticalArcTo {
                radii,
                rotation,
                large_arc,
                sweep,
                end,
            } => PathSegment::EllipticalArcTo {
                radii: radii.yx(),
                rotation: -rotation,
                large_arc,
                sweep: !sweep,
                end: end.yx(),
            },
            PathSegment::ClosePath => PathSegment::ClosePath,
        };
        Self::new(segment, self.relative)
    }
}

/// Write a number without a negative zero.
fn num(v: f64) -> f64 {
    v + 0.0
}

fn write_pair(f: &mut fmt::Formatter<'_>, p: DVec2) -> fmt::Result {
    write!(f, "{},{}", num(p.x), num(p.y))
}

impl fmt::Display for PathCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())?;
        match self.segment {
            PathSegment::MoveTo(p) | PathSegment::LineTo(p) | PathSegment::SmoothQuadraticTo(p) => write_pair(f, p),
            PathSegment::HorizontalTo(v) | PathSegment::VerticalTo(v) => write!(f, "{}", num(v)),
            PathSegment::CurveTo {
                control_start,
                control_end,
                end,
            } => {
                write_pair(f, control_start)?;
                f.write_str(" ")?;
                write_pair(f, control_end)?;
                f.write_str(" ")?;
                write_pair(f, end)
            }
            PathSegment::SmoothCurveTo { control_end: control, end } | PathSegment::QuadraticTo { control, end } => {
                write_pair(f, control)?;
                f.write_str(" ")?;
                write_pair(f, end)
            }
            PathSegment::EllipticalArcTo {
                radii,
                rotation,
                large_arc,
                sweep,
                end,
            } => {
                write_pair(f, radii)?;
                write!(f, " {} {} {} ", num(rotation), large_arc as u8, sweep as u8)?;
                write_pair(f, end)
            }
            PathSegment::ClosePath => Ok(()),
        }
    }
}

// ============================================================================
// Path data
// ============================================================================

/// A parsed `data` attribute.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PathData(pub Vec<PathCommand>);

impl PathData {
    pub fn parse(text: &str) -> Result<Self, PathParseError> {
        let pairs = DescriptionParser::parse(Rule::path_data, text)
            .map_err(|e| PathParseError::from_pest(e, text))?;

        let mut commands = Vec::new();
        for pair in pairs.flat_map(|p| p.into_inner()) {
            if pair.as_rule() == Rule::EOI {
                continue;
            }
            match parse_command(pair) {
                Some(command) => commands.push(command),
                None => {
                    return Err(PathParseError {
                        message: "malformed path command".to_string(),
                        src: text.to_string(),
                        span: (0, text.len()).into(),
                    });
                }
            }
        }
        Ok(PathData(commands))
    }

    pub fn commands(&self) -> &[PathCommand] {
        &self.0
    }

    pub fn flipped(&self, horizontal: bool) -> Self {
        PathData(self.0.iter().map(|c| c.flipped(horizontal)).collect())
    }

    pub fn transposed(&self) -> Self {
        PathData(self.0.iter().map(PathCommand::transposed).collect())
    }
}

impl fmt::Display for PathData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, command) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{}", command)?;
        }
        Ok(())
    }
}

fn parse_command(pair: Pair<Rule>) -> Option<PathCommand> {
    let rule = pair.as_rule();
    let relative = pair.as_str().chars().next()?.is_ascii_lowercase();

    let mut numbers = Vec::new();
    let mut flags = Vec::new();
    for inner in pair.into_inner().flatten() {
        match inner.as_rule() {
            Rule::number => numbers.push(inner.as_str().parse::<f64>().ok()?),
            Rule::flag => flags.push(inner.as_str() == "1"),
            _ => {}
        }
    }

    let p = |i: usize| -> Option<DVec2> { Some(dvec2(*numbers.get(i)?, *numbers.get(i + 1)?)) };
    let segment = match rule {
        Rule::move_to => PathSegment::MoveTo(p(0)?),
        Rule::line_to => PathSegment::LineTo(p(0)?),
        Rule::horizontal_to => PathSegment::HorizontalTo(*numbers.first()?),
        Rule::vertical_to => PathSegment::VerticalTo(*numbers.first()?),
        Rule::curve_to => PathSegment::CurveTo {
            control_start: p(0)?,
            control_end: p(2)?,
            end: p(4)?,
        },
        Rule::smooth_curve_to => PathSegment::SmoothCurveTo {
            control_end: p(0)?,
            end: p(2)?,
        },
        Rule::quadratic_to => PathSegment::QuadraticTo {
            control: p(0)?,
            end: p(2)?,
        },
        Rule::smooth_quad_to => PathSegment::SmoothQuadraticTo(p(0)?),
        Rule::arc_to => PathSegment::EllipticalArcTo {
            radii: p(0)?,
            rotation: *numbers.get(2)?,
            large_arc: *flags.first()?,
            sweep: *flags.get(1)?,
            end: p(3)?,
        },
        Rule::close_path => PathSegment::ClosePath,
        _ => return None,
    };
    Some(PathCommand::new(segment, relative))
}

// ============================================================================
// Path render command
// ============================================================================

/// An arbitrary path starting at a component point.
#[derive(Debug, Clone, PartialEq)]
pub struct Path {
    pub start: ComponentPoint,
    pub thickness: f64,
    pub fill: bool,
    pub data: PathData,
}

impl Command for Path {
    fn draw(&self, layout: &LayoutInformation, context: &LayoutContext<'_>, sink: &mut dyn DrawingContext) {
        let start = context.place(layout, self.start.resolve(layout, &context.options));
        sink.draw_path(start, self.data.commands(), self.thickness, self.fill);
    }

    fn flip(&self, horizontal: bool) -> RenderCommand {
        Path {
            start: self.start.flip(horizontal),
            data: self.data.flipped(horizontal),
            ..self.clone()
        }
        .into()
    }

    fn transpose(&self) -> RenderCommand {
        Path {
            start: self.start.transposed(),
            data: self.data.transposed(),
            ..self.clone()
        }
        .into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::context::{DrawOp, RecordingContext};
    use crate::types::{FlipState, LayoutOptions, Orientation};

    #[test]
    fn parses_every_command() {
        let data = PathData::parse("M0,0 l10 5 H20 v-5 C1,2 3,4 5,6 s1,1 2,2 Q0,5 5,5 t5,0 a5,5 0 0,1 10,0 Z").unwrap();
        let letters: String = data.commands().iter().map(PathCommand::letter).collect();
        assert_eq!(letters, "MlHvCsQtaZ");
        assert_eq!(
            data.commands()[8].segment,
            PathSegment::EllipticalArcTo {
                radii: dvec2(5.0, 5.0),
                rotation: 0.0,
                large_arc: false,
                sweep: true,
                end: dvec2(10.0, 0.0),
            }
        );
    }

    #[test]
    fn display_is_svg_like() {
        let data = PathData::parse("M 0 0 L 10,-5 h 2.5 A 5 5 30 1 0 10 10 z").unwrap();
        insta::assert_snapshot!(data.to_string(), @"M0,0 L10,-5 h2.5 A5,5 30 1 0 10,10 z");
    }

    #[test]
    fn rejects_unknown_commands() {
        let err = PathData::parse("M0,0 X5,5").unwrap_err();
        assert_eq!(err.span.offset(), 5);
        assert!(PathData::parse("L10").is_err());
    }

    #[test]
    fn flip_negates_one_axis() {
        let data = PathData::parse("M0,0 L10,-5 H4 V3 A5,5 30 0 1 10,10").unwrap();
        assert_eq!(data.flipped(true).to_string(), "M0,0 L-10,-5 H-4 V3 A5,5 -30 0 0 -10,10");
        assert_eq!(data.flipped(false).to_string(), "M0,0 L10,5 H4 V-3 A5,5 -30 0 0 10,-10");
        assert_eq!(data.flipped(true).flipped(true), data);
    }

    #[test]
    fn transpose_swaps_axes() {
        let data = PathData::parse("l10,-5 h4 A2,6 0 0 1 1,2").unwrap();
        assert_eq!(data.transposed().to_string(), "l-5,10 v4 A6,2 0 0 0 2,1");
    }

    #[test]
    fn renders_from_resolved_start() {
        let path = Path {
            start: ComponentPoint::parse("Start+5,Middle").unwrap(),
            thickness: 1.0,
            fill: false,
            data: PathData::parse("l10,0").unwrap(),
        };
        let layout = LayoutInformation::new(dvec2(100.0, 50.0), 40.0, Orientation::Horizontal)
            .with_flip(FlipState::PRIMARY);
        let mut sink = RecordingContext::new();
        RenderCommand::from(path).render(&layout, &LayoutContext::default(), &mut sink);
        assert_eq!(
            sink.ops,
            [DrawOp::Path {
                start: dvec2(35.0, 0.0),
                commands: PathData::parse("l-10,0").unwrap().0,
                thickness: 1.0,
                fill: false,
            }]
        );

        let mut sink = RecordingContext::new();
        let absolute = LayoutContext::new(LayoutOptions::absolute(), &crate::render::context::RawText);
        let plain = LayoutInformation::new(dvec2(100.0, 50.0), 40.0, Orientation::Horizontal);
        let path = Path {
            start: ComponentPoint::parse("Start+5,Middle").unwrap(),
            thickness: 1.0,
            fill: true,
            data: PathData::default(),
        };
        path.render(&plain, &absolute, &mut sink);
        assert!(matches!(sink.ops[0], DrawOp::Path { start, .. } if start == dvec2(105.0, 50.0)));
    }
}
