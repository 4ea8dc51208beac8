//! Component point algebra
//!
//! A [`ComponentPoint`] is declared relative to the start, middle or end of a
//! component on each axis, plus a fixed offset. It only becomes a coordinate
//! once resolved against a [`LayoutInformation`]: the main axis of the
//! component (x for horizontal components, y for vertical ones) stretches
//! with the component's size, the other axis does not.

use std::fmt;
use std::str::FromStr;

use glam::{DVec2, dvec2};
use pest::Parser;
use pest::iterators::Pair;

use crate::errors::PointParseError;
use crate::types::{LayoutInformation, LayoutOptions, Mirror, Orientation};
use crate::{DescriptionParser, Rule};

/// Correction applied to middle-relative coordinates that would otherwise
/// fall between grid lines when the component asks for middle alignment.
pub const MIDDLE_ALIGN_CORRECTION: f64 = 5.0;

/// Anchor of a point along one axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ComponentPosition {
    #[default]
    Start,
    Middle,
    End,
}

impl ComponentPosition {
    /// Start and End swap, Middle is its own mirror image.
    pub fn flipped(self) -> Self {
        match self {
            ComponentPosition::Start => ComponentPosition::End,
            ComponentPosition::Middle => ComponentPosition::Middle,
            ComponentPosition::End => ComponentPosition::Start,
        }
    }

    /// Distance of this anchor from the start of an axis of length `size`.
    fn along(self, size: f64) -> f64 {
        match self {
            ComponentPosition::Start => 0.0,
            ComponentPosition::Middle => size / 2.0,
            ComponentPosition::End => size,
        }
    }
}

impl fmt::Display for ComponentPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ComponentPosition::Start => "Start",
            ComponentPosition::Middle => "Middle",
            ComponentPosition::End => "End",
        };
        f.write_str(name)
    }
}

impl FromStr for ComponentPosition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "start" => Ok(ComponentPosition::Start),
            "middle" => Ok(ComponentPosition::Middle),
            "end" => Ok(ComponentPosition::End),
            other => Err(format!("unknown position `{}`", other)),
        }
    }
}

/// A point declared relative to a component's extent.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ComponentPoint {
    pub relative_to_x: ComponentPosition,
    pub relative_to_y: ComponentPosition,
    pub offset: DVec2,
}

impl ComponentPoint {
    pub fn new(relative_to_x: ComponentPosition, relative_to_y: ComponentPosition, offset: DVec2) -> Self {
        Self {
            relative_to_x,
            relative_to_y,
            offset,
        }
    }

    /// A point at a fixed offset from the component's start on both axes.
    pub fn from_offset(x: f64, y: f64) -> Self {
        Self::new(ComponentPosition::Start, ComponentPosition::Start, dvec2(x, y))
    }

    /// Parse `<Start|Middle|End><±offset>...,<Start|Middle|End><±offset>...`.
    ///
    /// Each axis may also be a bare signed number, meaning an offset from
    /// Start. Several offsets on one axis are summed (`Middle+10-2.5`).
    pub fn parse(text: &str) -> Result<Self, PointParseError> {
        let pairs = DescriptionParser::parse(Rule::point, text)
            .map_err(|e| PointParseError::from_pest(e, text))?;

        let mut axes = Vec::with_capacity(2);
        for pair in pairs.flat_map(|p| p.into_inner()) {
            if pair.as_rule() == Rule::axis {
                axes.push(parse_axis(pair));
            }
        }

        match axes.as_slice() {
            [(rx, dx), (ry, dy)] => Ok(Self::new(*rx, *ry, dvec2(*dx, *dy))),
            _ => Err(PointParseError {
                message: "expected exactly two axes".to_string(),
                src: text.to_string(),
                span: (0, text.len()).into(),
            }),
        }
    }

    /// Parse a single axis, as used by the explicit `x`/`y` attributes.
    pub fn parse_axis(text: &str) -> Result<(ComponentPosition, f64), PointParseError> {
        let pairs = DescriptionParser::parse(Rule::axis_only, text)
            .map_err(|e| PointParseError::from_pest(e, text))?;

        pairs
            .flat_map(|p| p.into_inner())
            .find(|p| p.as_rule() == Rule::axis)
            .map(parse_axis)
            .ok_or_else(|| PointParseError {
                message: "expected an axis".to_string(),
                src: text.to_string(),
                span: (0, text.len()).into(),
            })
    }

    /// Mirror along one axis: swap Start and End on that axis and negate its
    /// offset.
    pub fn flip(&self, horizontal: bool) -> Self {
        let mut flipped = *self;
        if horizontal {
            flipped.relative_to_x = self.relative_to_x.flipped();
            flipped.offset.x = -self.offset.x;
        } else {
            flipped.relative_to_y = self.relative_to_y.flipped();
            flipped.offset.y = -self.offset.y;
        }
        flipped
    }

    /// Apply a pair of mirror operations, horizontal first.
    pub fn mirrored(&self, mirror: Mirror) -> Self {
        let mut point = *self;
        if mirror.horizontal {
            point = point.flip(true);
        }
        if mirror.vertical {
            point = point.flip(false);
        }
        point
    }

    /// Exchange the x and y axes.
    pub fn transposed(&self) -> Self {
        Self::new(self.relative_to_y, self.relative_to_x, dvec2(self.offset.y, self.offset.x))
    }

    /// Resolve to coordinates relative to the component's location.
    ///
    /// The flip is always applied to the declared point, so resolving the
    /// same point twice against the same layout gives the same answer.
    /// Translation by the layout location is left to the caller, which
    /// knows whether it is drawing in absolute coordinates.
    pub fn resolve(&self, layout: &LayoutInformation, options: &LayoutOptions) -> DVec2 {
        let point = self.mirrored(layout.mirror());

        let mut resolved = point.offset;
        match layout.orientation {
            Orientation::Horizontal => {
                resolved.x += main_axis_delta(point.relative_to_x, layout.size, options);
            }
            Orientation::Vertical => {
                resolved.y += main_axis_delta(point.relative_to_y, layout.size, options);
            }
        }
        resolved
    }
}

fn main_axis_delta(position: ComponentPosition, size: f64, options: &LayoutOptions) -> f64 {
    let delta = position.along(size);
    if position == ComponentPosition::Middle
        && options.align_middle
        && !options.grid_size.is_aligned(delta)
    {
        delta - MIDDLE_ALIGN_CORRECTION
    } else {
        delta
    }
}

/// Walk an `axis` pair: either an anchor followed by offsets, or a bare
/// signed number.
fn parse_axis(pair: Pair<Rule>) -> (ComponentPosition, f64) {
    let mut position = ComponentPosition::Start;
    let mut offset = 0.0;
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::position => {
                position = inner.as_str().parse().unwrap_or_default();
            }
            Rule::offset => {
                offset += signed_magnitude(inner);
            }
            Rule::absolute => {
                offset += inner.as_str().parse::<f64>().unwrap_or(0.0);
            }
            _ => {}
        }
    }
    (position, offset)
}

fn signed_magnitude(pair: Pair<Rule>) -> f64 {
    let mut sign = 1.0;
    let mut magnitude = 0.0;
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::sign if inner.as_str() == "-" => sign = -1.0,
            Rule::magnitude => magnitude = inner.as_str().parse().unwrap_or(0.0),
            _ => {}
        }
    }
    sign * magnitude
}

impl fmt::Display for ComponentPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_axis(f, self.relative_to_x, self.offset.x)?;
        f.write_str(",")?;
        write_axis(f, self.relative_to_y, self.offset.y)
    }
}

fn write_axis(f: &mut fmt::Formatter<'_>, position: ComponentPosition, offset: f64) -> fmt::Result {
    if offset == 0.0 {
        write!(f, "{}", position)
    } else if offset > 0.0 {
        write!(f, "{}+{}", position, offset)
    } else {
        write!(f, "{}-{}", position, -offset)
    }
}

impl FromStr for ComponentPoint {
    type Err = PointParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ComponentPoint::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FlipState, GridSize};

    fn horizontal(size: f64) -> LayoutInformation {
        LayoutInformation::new(DVec2::ZERO, size, Orientation::Horizontal)
    }

    #[test]
    fn parse_anchors_and_offsets() {
        let p = ComponentPoint::parse("Start+10,Middle-5").unwrap();
        assert_eq!(p.relative_to_x, ComponentPosition::Start);
        assert_eq!(p.relative_to_y, ComponentPosition::Middle);
        assert_eq!(p.offset, dvec2(10.0, -5.0));
    }

    #[test]
    fn parse_is_case_insensitive_and_sums_offsets() {
        let p = ComponentPoint::parse("middle+10-2.5, END").unwrap();
        assert_eq!(p.relative_to_x, ComponentPosition::Middle);
        assert_eq!(p.relative_to_y, ComponentPosition::End);
        assert_eq!(p.offset, dvec2(7.5, 0.0));
    }

    #[test]
    fn parse_bare_numbers_are_start_relative() {
        let p = ComponentPoint::parse("10,-5").unwrap();
        assert_eq!(p, ComponentPoint::from_offset(10.0, -5.0));
    }

    #[test]
    fn parse_rejects_garbage() {
        let err = ComponentPoint::parse("Top+10,Middle").unwrap_err();
        assert_eq!(err.span.offset(), 0);
        assert!(ComponentPoint::parse("Start+10").is_err());
        assert!(ComponentPoint::parse("Start+,Middle").is_err());
    }

    #[test]
    fn parse_single_axis() {
        assert_eq!(
            ComponentPoint::parse_axis("End-4").unwrap(),
            (ComponentPosition::End, -4.0)
        );
        assert_eq!(
            ComponentPoint::parse_axis("12.5").unwrap(),
            (ComponentPosition::Start, 12.5)
        );
    }

    #[test]
    fn display_reparses() {
        let p = ComponentPoint::parse("Middle-2.5,End+3").unwrap();
        assert_eq!(p.to_string(), "Middle-2.5,End+3");
        assert_eq!(ComponentPoint::parse(&p.to_string()).unwrap(), p);
        assert_eq!(ComponentPoint::default().to_string(), "Start,Start");
    }

    #[test]
    fn resolve_main_axis_only() {
        let layout = horizontal(40.0);
        let opts = LayoutOptions::default();
        let p = ComponentPoint::parse("End-5,Middle+20").unwrap();
        assert_eq!(p.resolve(&layout, &opts), dvec2(35.0, 20.0));

        let vertical = LayoutInformation::new(DVec2::ZERO, 40.0, Orientation::Vertical);
        assert_eq!(p.resolve(&vertical, &opts), dvec2(-5.0, 40.0));
    }

    #[test]
    fn resolve_middle_alignment_correction() {
        let layout = horizontal(30.0);
        let p = ComponentPoint::parse("Middle,Start").unwrap();
        let plain = LayoutOptions::default();
        assert_eq!(p.resolve(&layout, &plain), dvec2(15.0, 0.0));

        let aligned = LayoutOptions::default().with_align_middle(true);
        assert_eq!(p.resolve(&layout, &aligned), dvec2(10.0, 0.0));
        assert_eq!(p.resolve(&horizontal(40.0), &aligned), dvec2(20.0, 0.0));

        let coarse = aligned.with_grid_size(GridSize::try_new(20.0).unwrap());
        assert_eq!(p.resolve(&horizontal(40.0), &coarse), dvec2(20.0, 0.0));
        assert_eq!(p.resolve(&horizontal(60.0), &coarse), dvec2(25.0, 0.0));
    }

    #[test]
    fn resolve_flipped() {
        let layout = horizontal(40.0).with_flip(FlipState::PRIMARY);
        let opts = LayoutOptions::default();
        let p = ComponentPoint::parse("Start+10,Middle-5").unwrap();
        assert_eq!(p.resolve(&layout, &opts), dvec2(30.0, -5.0));

        let both = horizontal(40.0).with_flip(FlipState::BOTH);
        assert_eq!(p.resolve(&both, &opts), dvec2(30.0, 5.0));
    }

    #[test]
    fn resolve_is_idempotent() {
        let layout = horizontal(60.0).with_flip(FlipState::PRIMARY);
        let opts = LayoutOptions::default();
        let p = ComponentPoint::parse("Start+10,Start").unwrap();
        assert_eq!(p.resolve(&layout, &opts), p.resolve(&layout, &opts));
    }

    #[test]
    fn double_flip_is_identity() {
        let layout = horizontal(50.0);
        let opts = LayoutOptions::default().with_align_middle(true);
        for text in ["Start+10,Middle-5", "Middle-3,End+7", "End,Start"] {
            let p = ComponentPoint::parse(text).unwrap();
            for h in [true, false] {
                let twice = p.flip(h).flip(h);
                assert_eq!(twice.resolve(&layout, &opts), p.resolve(&layout, &opts));
            }
        }
    }

    #[test]
    fn transpose_swaps_axes() {
        let p = ComponentPoint::parse("End-5,Middle+2").unwrap();
        let t = p.transposed();
        assert_eq!(t.relative_to_x, ComponentPosition::Middle);
        assert_eq!(t.relative_to_y, ComponentPosition::End);
        assert_eq!(t.offset, dvec2(2.0, -5.0));
        assert_eq!(t.transposed(), p);
    }
}
