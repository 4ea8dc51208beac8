//! Render commands and conditional render groups
//!
//! A description draws itself as a flat list of [`RenderDescription`]s, each
//! a condition plus the commands drawn while it holds. Commands resolve
//! their component points against the instance layout and emit primitives
//! to a [`DrawingContext`].

mod commands;
mod context;
mod group;
mod path;
mod text;

use enum_dispatch::enum_dispatch;

pub use commands::{Ellipse, Line, Rectangle};
pub use context::{DrawOp, DrawingContext, LayoutContext, RawText, RecordingContext, TextFormatter};
pub use group::{AutoRotate, RenderGroup, flatten_groups};
pub use path::{Path, PathCommand, PathData, PathSegment};
pub use text::{Text, TextAlignment, TextRun, TextRunFormatting, TextSize, TextStyle};

use crate::condition::{ConditionContext, ConditionTree};
use crate::types::{FlipState, LayoutInformation};

/// Behavior shared by every render command
#[enum_dispatch]
pub trait Command {
    /// Emit primitives, resolving points against a layout whose flip has
    /// already been applied to this command.
    fn draw(&self, layout: &LayoutInformation, context: &LayoutContext<'_>, sink: &mut dyn DrawingContext);

    /// Mirror the declared geometry across one axis.
    fn flip(&self, horizontal: bool) -> RenderCommand;

    /// Exchange the x and y axes of the declared geometry.
    fn transpose(&self) -> RenderCommand;

    /// Emit primitives for the given layout, flip included. Horizontal
    /// mirroring is applied before vertical mirroring.
    fn render(&self, layout: &LayoutInformation, context: &LayoutContext<'_>, sink: &mut dyn DrawingContext) {
        let mirror = layout.mirror();
        let mut mirrored: Option<RenderCommand> = None;
        if mirror.horizontal {
            mirrored = Some(self.flip(true));
        }
        if mirror.vertical {
            mirrored = Some(match &mirrored {
                Some(command) => command.flip(false),
                None => self.flip(false),
            });
        }
        match mirrored {
            Some(command) => command.draw(&layout.with_flip(FlipState::NONE), context, sink),
            None => self.draw(layout, context, sink),
        }
    }
}

/// A drawing command of a component description
#[enum_dispatch(Command)]
#[derive(Debug, Clone, PartialEq)]
pub enum RenderCommand {
    Line(Line),
    Rectangle(Rectangle),
    Ellipse(Ellipse),
    Path(Path),
    Text(Text),
}

impl RenderCommand {
    /// Element name used by declarative sources.
    pub fn type_name(&self) -> &'static str {
        match self {
            RenderCommand::Line(_) => "line",
            RenderCommand::Rectangle(_) => "rect",
            RenderCommand::Ellipse(_) => "ellipse",
            RenderCommand::Path(_) => "path",
            RenderCommand::Text(_) => "text",
        }
    }
}

/// Commands drawn while a condition holds
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RenderDescription {
    pub conditions: ConditionTree,
    pub commands: Vec<RenderCommand>,
}

impl RenderDescription {
    pub fn new(conditions: ConditionTree, commands: Vec<RenderCommand>) -> Self {
        Self { conditions, commands }
    }

    pub fn is_active(&self, state: &dyn ConditionContext) -> bool {
        self.conditions.is_met(state)
    }

    pub fn render(&self, layout: &LayoutInformation, context: &LayoutContext<'_>, sink: &mut dyn DrawingContext) {
        for command in &self.commands {
            command.render(layout, context, sink);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::point::ComponentPoint;
    use crate::types::Orientation;
    use glam::{DVec2, dvec2};

    #[test]
    fn flips_compose_horizontal_then_vertical() {
        let line: RenderCommand = Line {
            start: ComponentPoint::parse("Start+5,Start+2").unwrap(),
            end: ComponentPoint::parse("Middle,End-3").unwrap(),
            thickness: 1.0,
        }
        .into();
        let layout = LayoutInformation::new(DVec2::ZERO, 20.0, Orientation::Horizontal).with_flip(FlipState::BOTH);

        let mut flipped = RecordingContext::new();
        line.render(&layout, &LayoutContext::default(), &mut flipped);

        let mut manual = RecordingContext::new();
        line.flip(true)
            .flip(false)
            .draw(&layout.with_flip(FlipState::NONE), &LayoutContext::default(), &mut manual);

        assert_eq!(flipped, manual);
        assert_eq!(
            flipped.ops,
            [DrawOp::Line {
                start: dvec2(15.0, -2.0),
                end: dvec2(10.0, 3.0),
                thickness: 1.0,
            }]
        );
    }

    #[test]
    fn type_names() {
        let rect: RenderCommand = Rectangle {
            location: ComponentPoint::default(),
            width: 1.0,
            height: 1.0,
            thickness: 1.0,
            fill: false,
        }
        .into();
        assert_eq!(rect.type_name(), "rect");
    }
}
