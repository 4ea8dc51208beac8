//! Component description engine for circuit schematic symbols.
//!
//! A [`ComponentDescription`] describes how a reusable schematic symbol is
//! drawn and where its terminals are, in terms of:
//!
//! - **conditions** ([`condition`]): boolean expressions over an instance's
//!   properties and orientation that gate render groups, connection groups,
//!   flags and property formats
//! - **points** ([`point`]): coordinates relative to the start, middle or end
//!   of a component, resolved against its current size, orientation and flip
//! - **render commands** ([`render`]): lines, rectangles, ellipses, paths
//!   and text emitted to a [`render::DrawingContext`]
//! - **connections** ([`connection`]): lines of grid-snapped terminals
//!
//! Descriptions are assembled by a loader through [`DescriptionBuilder`],
//! frozen, and then shared read-only between any number of
//! [`Component`] instances.

use pest_derive::Parser;

#[derive(Parser)]
#[grammar = "compdesc.pest"]
pub(crate) struct DescriptionParser;

pub mod builder;
pub mod condition;
pub mod connection;
pub mod description;
pub mod errors;
pub mod instance;
pub mod log;
pub mod point;
pub mod property;
pub mod registry;
pub mod render;
pub mod types;
pub mod value;

mod escape;

pub use builder::{DescriptionBuilder, LoadResult, load_descriptions};
pub use condition::{ConditionContext, ConditionTree};
pub use connection::{ConnectionDescription, ConnectionEdge, ConnectionFlags, ConnectionGroup};
pub use description::{ComponentConfiguration, ComponentDescription, ComponentMetadata};
pub use errors::{ConditionFormatError, Diagnostic, Diagnostics, LoadError, SourceLocation};
pub use instance::Component;
pub use point::{ComponentPoint, ComponentPosition};
pub use property::{ComponentProperty, ComponentPropertyFormat};
pub use registry::DescriptionRegistry;
pub use render::{RenderCommand, RenderDescription};
pub use types::{FlagOptions, FlipState, FormatVersion, GridSize, LayoutInformation, LayoutOptions, Orientation};
pub use value::{PropertyType, PropertyValue};
