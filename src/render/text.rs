//! Text command, alignment and runs

use std::fmt;
use std::str::FromStr;

use super::context::{DrawingContext, LayoutContext};
use super::{Command, RenderCommand};
use crate::escape::resolve_unicode_escapes;
use crate::point::ComponentPoint;
use crate::types::LayoutInformation;

/// Which point of the text box sits on the anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TextAlignment {
    TopLeft,
    TopCentre,
    TopRight,
    CentreLeft,
    #[default]
    Centre,
    CentreRight,
    BottomLeft,
    BottomCentre,
    BottomRight,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Band {
    Low,
    Mid,
    High,
}

impl Band {
    fn flipped(self) -> Self {
        match self {
            Band::Low => Band::High,
            Band::Mid => Band::Mid,
            Band::High => Band::Low,
        }
    }
}

impl TextAlignment {
    /// (horizontal, vertical) bands: Left/Top are low, Right/Bottom high.
    fn bands(self) -> (Band, Band) {
        use TextAlignment::*;
        match self {
            TopLeft => (Band::Low, Band::Low),
            TopCentre => (Band::Mid, Band::Low),
            TopRight => (Band::High, Band::Low),
            CentreLeft => (Band::Low, Band::Mid),
            Centre => (Band::Mid, Band::Mid),
            CentreRight => (Band::High, Band::Mid),
            BottomLeft => (Band::Low, Band::High),
            BottomCentre => (Band::Mid, Band::High),
            BottomRight => (Band::High, Band::High),
        }
    }

    fn from_bands(horizontal: Band, vertical: Band) -> Self {
        use TextAlignment::*;
        match (horizontal, vertical) {
            (Band::Low, Band::Low) => TopLeft,
            (Band::Mid, Band::Low) => TopCentre,
            (Band::High, Band::Low) => TopRight,
            (Band::Low, Band::Mid) => CentreLeft,
            (Band::Mid, Band::Mid) => Centre,
            (Band::High, Band::Mid) => CentreRight,
            (Band::Low, Band::High) => BottomLeft,
            (Band::Mid, Band::High) => BottomCentre,
            (Band::High, Band::High) => BottomRight,
        }
    }

    /// Left and Right swap under a horizontal flip, Top and Bottom under a
    /// vertical one.
    pub fn flipped(self, horizontal: bool) -> Self {
        let (h, v) = self.bands();
        if horizontal {
            Self::from_bands(h.flipped(), v)
        } else {
            Self::from_bands(h, v.flipped())
        }
    }

    /// Exchange the horizontal and vertical placement.
    pub fn transposed(self) -> Self {
        let (h, v) = self.bands();
        Self::from_bands(v, h)
    }
}

impl fmt::Display for TextAlignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TextAlignment::TopLeft => "TopLeft",
            TextAlignment::TopCentre => "TopCentre",
            TextAlignment::TopRight => "TopRight",
            TextAlignment::CentreLeft => "CentreLeft",
            TextAlignment::Centre => "Centre",
            TextAlignment::CentreRight => "CentreRight",
            TextAlignment::BottomLeft => "BottomLeft",
            TextAlignment::BottomCentre => "BottomCentre",
            TextAlignment::BottomRight => "BottomRight",
        };
        f.write_str(name)
    }
}

impl FromStr for TextAlignment {
    type Err = String;

    /// Accepts both `Centre` and `Center` spellings, in any case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace("center", "centre");
        let alignment = match normalized.as_str() {
            "topleft" => TextAlignment::TopLeft,
            "topcentre" => TextAlignment::TopCentre,
            "topright" => TextAlignment::TopRight,
            "centreleft" => TextAlignment::CentreLeft,
            "centre" | "centrecentre" => TextAlignment::Centre,
            "centreright" => TextAlignment::CentreRight,
            "bottomleft" => TextAlignment::BottomLeft,
            "bottomcentre" => TextAlignment::BottomCentre,
            "bottomright" => TextAlignment::BottomRight,
            _ => return Err(format!("unknown text alignment `{}`", s.trim())),
        };
        Ok(alignment)
    }
}

/// Baseline placement of a text run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TextStyle {
    #[default]
    Normal,
    Subscript,
    Superscript,
}

/// Relative size of a text run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TextSize {
    Small,
    #[default]
    Medium,
    Large,
}

impl FromStr for TextSize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "small" => Ok(TextSize::Small),
            "medium" => Ok(TextSize::Medium),
            "large" => Ok(TextSize::Large),
            other => Err(format!("unknown text size `{}`", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TextRunFormatting {
    pub style: TextStyle,
    pub size: TextSize,
}

/// A piece of text with uniform formatting.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TextRun {
    pub text: String,
    pub formatting: TextRunFormatting,
}

impl TextRun {
    pub fn new(text: impl Into<String>, formatting: TextRunFormatting) -> Self {
        Self {
            text: text.into(),
            formatting,
        }
    }

    pub fn plain(text: impl Into<String>) -> Self {
        Self::new(text, TextRunFormatting::default())
    }
}

/// Text anchored at a component point.
#[derive(Debug, Clone, PartialEq)]
pub struct Text {
    pub location: ComponentPoint,
    pub alignment: TextAlignment,
    pub runs: Vec<TextRun>,
}

impl Text {
    /// The runs as displayed: `$variable` runs go through the formatter,
    /// then `\uXXXX` escapes are resolved.
    pub fn display_runs(&self, context: &LayoutContext<'_>) -> Vec<TextRun> {
        self.runs
            .iter()
            .map(|run| {
                let text = if run.text.starts_with('$') {
                    context.formatter.format_text(&run.text)
                } else {
                    run.text.clone()
                };
                TextRun::new(resolve_unicode_escapes(&text), run.formatting)
            })
            .collect()
    }
}

impl Command for Text {
    fn draw(&self, layout: &LayoutInformation, context: &LayoutContext<'_>, sink: &mut dyn DrawingContext) {
        let anchor = context.place(layout, self.location.resolve(layout, &context.options));
        sink.draw_text(anchor, self.alignment, &self.display_runs(context));
    }

    fn flip(&self, horizontal: bool) -> RenderCommand {
        Text {
            location: self.location.flip(horizontal),
            alignment: self.alignment.flipped(horizontal),
            runs: self.runs.clone(),
        }
        .into()
    }

    fn transpose(&self) -> RenderCommand {
        Text {
            location: self.location.transposed(),
            alignment: self.alignment.transposed(),
            runs: self.runs.clone(),
        }
        .into()
    }
}
