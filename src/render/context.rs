//! Drawing sinks and the context a render pass runs in

use glam::DVec2;

use super::path::PathCommand;
use super::text::{TextAlignment, TextRun};
use crate::types::{LayoutInformation, LayoutOptions};

/// Receiver of resolved draw primitives.
///
/// Coordinates are relative to the component unless the pass was run with
/// [`LayoutOptions::absolute`], in which case they are document
/// coordinates.
pub trait DrawingContext {
    fn draw_line(&mut self, start: DVec2, end: DVec2, thickness: f64);

    fn draw_rectangle(&mut self, top_left: DVec2, size: DVec2, thickness: f64, fill: bool);

    fn draw_ellipse(&mut self, centre: DVec2, radius_x: f64, radius_y: f64, thickness: f64, fill: bool);

    /// Path commands are passed through as declared: upper case commands are
    /// relative to `start`, lower case ones to the current point.
    fn draw_path(&mut self, start: DVec2, commands: &[PathCommand], thickness: f64, fill: bool);

    /// Runs arrive with variables substituted and escapes resolved.
    fn draw_text(&mut self, anchor: DVec2, alignment: TextAlignment, runs: &[TextRun]);
}

/// A recorded draw primitive.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Line {
        start: DVec2,
        end: DVec2,
        thickness: f64,
    },
    Rectangle {
        top_left: DVec2,
        size: DVec2,
        thickness: f64,
        fill: bool,
    },
    Ellipse {
        centre: DVec2,
        radius_x: f64,
        radius_y: f64,
        thickness: f64,
        fill: bool,
    },
    Path {
        start: DVec2,
        commands: Vec<PathCommand>,
        thickness: f64,
        fill: bool,
    },
    Text {
        anchor: DVec2,
        alignment: TextAlignment,
        runs: Vec<TextRun>,
    },
}

/// Sink that keeps every primitive in order, for previews and tests.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordingContext {
    pub ops: Vec<DrawOp>,
}

impl RecordingContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_ops(self) -> Vec<DrawOp> {
        self.ops
    }
}

impl DrawingContext for RecordingContext {
    fn draw_line(&mut self, start: DVec2, end: DVec2, thickness: f64) {
        self.ops.push(DrawOp::Line { start, end, thickness });
    }

    fn draw_rectangle(&mut self, top_left: DVec2, size: DVec2, thickness: f64, fill: bool) {
        self.ops.push(DrawOp::Rectangle {
            top_left,
            size,
            thickness,
            fill,
        });
    }

    fn draw_ellipse(&mut self, centre: DVec2, radius_x: f64, radius_y: f64, thickness: f64, fill: bool) {
        self.ops.push(DrawOp::Ellipse {
            centre,
            radius_x,
            radius_y,
            thickness,
            fill,
        });
    }

    fn draw_path(&mut self, start: DVec2, commands: &[PathCommand], thickness: f64, fill: bool) {
        self.ops.push(DrawOp::Path {
            start,
            commands: commands.to_vec(),
            thickness,
            fill,
        });
    }

    fn draw_text(&mut self, anchor: DVec2, alignment: TextAlignment, runs: &[TextRun]) {
        self.ops.push(DrawOp::Text {
            anchor,
            alignment,
            runs: runs.to_vec(),
        });
    }
}

/// Resolves `$variable` text into display strings.
pub trait TextFormatter {
    /// `text` starts with `$`.
    fn format_text(&self, text: &str) -> String;
}

/// Formatter that leaves text untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawText;

impl TextFormatter for RawText {
    fn format_text(&self, text: &str) -> String {
        text.to_string()
    }
}

/// Options and collaborators of one render pass.
#[derive(Clone, Copy)]
pub struct LayoutContext<'a> {
    pub options: LayoutOptions,
    pub formatter: &'a dyn TextFormatter,
}

impl<'a> LayoutContext<'a> {
    pub fn new(options: LayoutOptions, formatter: &'a dyn TextFormatter) -> Self {
        Self { options, formatter }
    }

    /// Move a component-relative coordinate into the output space.
    pub fn place(&self, layout: &LayoutInformation, point: DVec2) -> DVec2 {
        if self.options.absolute {
            point + layout.location
        } else {
            point
        }
    }
}

impl Default for LayoutContext<'static> {
    fn default() -> Self {
        Self::new(LayoutOptions::default(), &RawText)
    }
}

impl std::fmt::Debug for LayoutContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LayoutContext")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}
