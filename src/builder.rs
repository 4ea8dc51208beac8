//! Description builder and loader entry point
//!
//! Loaders parse their document format into [`Element`] trees and feed them
//! to a [`DescriptionBuilder`]. Problems are recorded as [`Diagnostic`]s
//! against the element's source location and the offending element is
//! skipped; everything else keeps loading.
//!
//! Element vocabulary (names and attribute keys are case-insensitive):
//!
//! ```text
//! metadata      <meta name value/>*  <configuration/>*
//! configuration name implements?  <setter name value/>*
//! property      name type default? serialize? display?
//!               <option>text</option>*  <format conditions? value/>*
//!               <condition type conditions/>*
//! flags         conditions?  <flag>name</flag>*
//! connections   <group conditions?>...</group>*  <connection/>*
//! connection    start end edge? name?
//! render        <group conditions? autorotate?>...</group>*  commands*
//! line          start end | x1 y1 x2 y2, thickness?
//! rect          location | x y, width height thickness? fill?
//! ellipse       centre | x y, rx ry thickness? fill?
//! path          start | x y, data thickness? fill?
//! text          location | x y, align? value? | <span|sub|sup size?>text</...>*
//! ```

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use glam::dvec2;
use uuid::Uuid;

use crate::condition::{ConditionLeaf, ConditionTree};
use crate::connection::{ConnectionDescription, ConnectionEdge, ConnectionGroup, DEFAULT_CONNECTION_NAME};
use crate::description::{ComponentConfiguration, ComponentDescription, ConditionalFlags};
use crate::errors::{Diagnostic, DiagnosticCode, Diagnostics, LoadError, SourceLocation};
use crate::log::{debug, warn};
use crate::point::ComponentPoint;
use crate::property::{ComponentProperty, ComponentPropertyFormat};
use crate::registry::DescriptionRegistry;
use crate::render::{
    AutoRotate, Ellipse, Line, Path, PathData, Rectangle, RenderCommand, RenderGroup, Text, TextAlignment, TextRun,
    TextRunFormatting, TextSize, TextStyle, flatten_groups,
};
use crate::types::{FlagOptions, FormatVersion};
use crate::value::{PropertyType, PropertyValue};

/// Stroke thickness of commands that declare none.
pub const DEFAULT_THICKNESS: f64 = 2.0;

// ============================================================================
// Elements
// ============================================================================

/// A declarative element as produced by a loader.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Element<'a> {
    pub name: &'a str,
    pub attributes: Vec<(&'a str, &'a str)>,
    /// Text content
    pub text: Option<&'a str>,
    pub children: Vec<Element<'a>>,
    pub location: Option<SourceLocation>,
}

impl<'a> Element<'a> {
    pub fn new(name: &'a str) -> Self {
        Self {
            name,
            ..Self::default()
        }
    }

    pub fn attr(mut self, key: &'a str, value: &'a str) -> Self {
        self.attributes.push((key, value));
        self
    }

    pub fn with_text(mut self, text: &'a str) -> Self {
        self.text = Some(text);
        self
    }

    pub fn child(mut self, child: Element<'a>) -> Self {
        self.children.push(child);
        self
    }

    pub fn at(mut self, line: u32, column: u32) -> Self {
        self.location = Some(SourceLocation::new(line, column));
        self
    }

    pub fn get(&self, key: &str) -> Option<&'a str> {
        self.attributes
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| *v)
    }

    fn is(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }

    /// Text content, falling back to the `value` attribute.
    fn content(&self) -> Option<&'a str> {
        self.text.or_else(|| self.get("value"))
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Assembles one [`ComponentDescription`] from declarative elements.
#[derive(Debug)]
pub struct DescriptionBuilder {
    description: ComponentDescription,
    render: RenderGroup,
    diagnostics: Diagnostics,
}

impl DescriptionBuilder {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            description: ComponentDescription::new(id, name),
            render: RenderGroup::default(),
            diagnostics: Diagnostics::new(),
        }
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    fn version(&self) -> FormatVersion {
        self.description.metadata.format_version
    }

    /// Select the condition dialect for everything added afterwards.
    pub fn set_format_version(&mut self, text: &str, location: Option<SourceLocation>) {
        match text.parse::<FormatVersion>() {
            Ok(version) => self.description.metadata.format_version = version,
            Err(message) => self.error(DiagnosticCode::InvalidAttribute, message, location),
        }
    }

    pub fn set_min_size(&mut self, size: f64) {
        self.description.min_size = size;
    }

    /// Add a top-level element of any known kind.
    pub fn element(&mut self, element: &Element<'_>) {
        match element.name.to_ascii_lowercase().as_str() {
            "metadata" => self.metadata(element),
            "meta" => self.meta(element),
            "configuration" => self.configuration(element),
            "configurations" => element.children.iter().for_each(|c| self.configuration(c)),
            "property" => self.property(element),
            "properties" => element.children.iter().for_each(|c| self.property(c)),
            "flags" => self.flags(element),
            "connections" => self.connections(element),
            "render" => self.render(element),
            _ => self.unknown(element),
        }
    }

    // ------------------------------------------------------------------------
    // Diagnostics
    // ------------------------------------------------------------------------

    fn error(&mut self, code: DiagnosticCode, message: impl Into<String>, location: Option<SourceLocation>) {
        self.diagnostics
            .push(Diagnostic::error(code, message).with_location(location));
    }

    fn warning(&mut self, code: DiagnosticCode, message: impl Into<String>, location: Option<SourceLocation>) {
        self.diagnostics
            .push(Diagnostic::warning(code, message).with_location(location));
    }

    fn unknown(&mut self, element: &Element<'_>) {
        warn!("unknown element `{}` skipped", element.name);
        self.warning(
            DiagnosticCode::UnknownElement,
            format!("unknown element `{}`", element.name),
            element.location,
        );
    }

    fn required<'a>(&mut self, element: &Element<'a>, key: &str) -> Option<&'a str> {
        let value = element.get(key);
        if value.is_none() {
            self.error(
                DiagnosticCode::MissingAttribute,
                format!("`{}` is missing attribute `{}`", element.name, key),
                element.location,
            );
        }
        value
    }

    // ------------------------------------------------------------------------
    // Attribute parsing
    // ------------------------------------------------------------------------

    fn conditions(&mut self, element: &Element<'_>) -> Option<ConditionTree> {
        let Some(text) = element.get("conditions") else {
            return Some(ConditionTree::Empty);
        };
        match ConditionTree::parse(text, self.version()) {
            Ok(tree) => Some(tree),
            Err(err) => {
                let help = format!("at `{}` (offset {})", err.excerpt(), err.position_start());
                self.diagnostics.push(
                    Diagnostic::error(DiagnosticCode::InvalidCondition, format!("{}: {}", err.message, text))
                        .with_location(element.location)
                        .with_help(help),
                );
                None
            }
        }
    }

    fn number(&mut self, element: &Element<'_>, key: &str, default: Option<f64>) -> Option<f64> {
        let Some(raw) = element.get(key) else {
            return match default {
                Some(value) => Some(value),
                None => self.required(element, key).and(None),
            };
        };
        match raw.trim().parse::<f64>() {
            Ok(value) if value.is_finite() => Some(value),
            _ => {
                self.error(
                    DiagnosticCode::InvalidAttribute,
                    format!("`{}` attribute `{}` is not a number: {:?}", element.name, key, raw),
                    element.location,
                );
                None
            }
        }
    }

    fn boolean(&mut self, element: &Element<'_>, key: &str) -> Option<bool> {
        match element.get(key).map(|raw| raw.trim().to_ascii_lowercase()) {
            None => Some(false),
            Some(raw) if raw == "true" => Some(true),
            Some(raw) if raw == "false" => Some(false),
            Some(raw) => {
                self.error(
                    DiagnosticCode::InvalidAttribute,
                    format!("`{}` attribute `{}` is not a boolean: {:?}", element.name, key, raw),
                    element.location,
                );
                None
            }
        }
    }

    fn point(&mut self, element: &Element<'_>, key: &str) -> Option<ComponentPoint> {
        let raw = self.required(element, key)?;
        match ComponentPoint::parse(raw) {
            Ok(point) => Some(point),
            Err(err) => {
                self.error(
                    DiagnosticCode::InvalidPoint,
                    format!("`{}` attribute `{}`: {}", element.name, key, err),
                    element.location,
                );
                None
            }
        }
    }

    /// A point given either whole (`key`) or as two axis attributes.
    fn point_or_axes(&mut self, element: &Element<'_>, key: &str, x: &str, y: &str) -> Option<ComponentPoint> {
        if element.get(key).is_some() {
            return self.point(element, key);
        }
        let (Some(raw_x), Some(raw_y)) = (element.get(x), element.get(y)) else {
            self.error(
                DiagnosticCode::MissingAttribute,
                format!("`{}` needs `{}` or both `{}` and `{}`", element.name, key, x, y),
                element.location,
            );
            return None;
        };
        match (ComponentPoint::parse_axis(raw_x), ComponentPoint::parse_axis(raw_y)) {
            (Ok((px, ox)), Ok((py, oy))) => Some(ComponentPoint::new(px, py, dvec2(ox, oy))),
            (Err(err), _) | (_, Err(err)) => {
                self.error(
                    DiagnosticCode::InvalidPoint,
                    format!("`{}` coordinate: {}", element.name, err),
                    element.location,
                );
                None
            }
        }
    }

    // ------------------------------------------------------------------------
    // Metadata and configurations
    // ------------------------------------------------------------------------

    fn metadata(&mut self, element: &Element<'_>) {
        for child in &element.children {
            if child.is("meta") {
                self.meta(child);
            } else if child.is("configuration") {
                self.configuration(child);
            } else {
                self.unknown(child);
            }
        }
    }

    fn meta(&mut self, element: &Element<'_>) {
        let Some(name) = self.required(element, "name") else { return };
        let Some(value) = element.content() else {
            self.required(element, "value");
            return;
        };
        match name.to_ascii_lowercase().as_str() {
            "author" => self.description.metadata.author = Some(value.to_string()),
            "version" => self.description.metadata.version = Some(value.to_string()),
            "implementset" => self.description.metadata.implement_set = Some(value.to_string()),
            "implementitem" => self.description.metadata.implement_item = Some(value.to_string()),
            "formatversion" => self.set_format_version(value, element.location),
            "guid" => match Uuid::parse_str(value.trim()) {
                Ok(guid) => self.description.metadata.guid = Some(guid),
                Err(err) => self.error(
                    DiagnosticCode::InvalidAttribute,
                    format!("invalid guid {:?}: {}", value, err),
                    element.location,
                ),
            },
            "minsize" | "size" => match value.trim().parse::<f64>() {
                Ok(size) if size.is_finite() && size > 0.0 => self.set_min_size(size),
                _ => self.error(
                    DiagnosticCode::InvalidAttribute,
                    format!("invalid minimum size {:?}", value),
                    element.location,
                ),
            },
            _ => {
                self.description
                    .metadata
                    .entries
                    .insert(name.to_string(), value.to_string());
            }
        }
    }

    fn configuration(&mut self, element: &Element<'_>) {
        if !element.is("configuration") {
            return self.unknown(element);
        }
        let Some(name) = self.required(element, "name") else { return };
        let mut configuration = ComponentConfiguration::new(name);
        configuration.implements = element.get("implements").map(str::to_string);
        for setter in &element.children {
            if !setter.is("setter") {
                self.unknown(setter);
                continue;
            }
            let (Some(key), Some(value)) = (self.required(setter, "name"), self.required(setter, "value")) else {
                continue;
            };
            configuration
                .setters
                .insert(key.to_string(), PropertyValue::Unknown(value.to_string()));
        }
        self.description.metadata.configurations.push(configuration);
    }

    // ------------------------------------------------------------------------
    // Properties
    // ------------------------------------------------------------------------

    pub fn property(&mut self, element: &Element<'_>) {
        if !element.is("property") {
            return self.unknown(element);
        }
        let (Some(name), Some(type_token)) = (self.required(element, "name"), self.required(element, "type")) else {
            return;
        };
        let Some(property_type) = PropertyType::from_token(type_token) else {
            return self.error(
                DiagnosticCode::InvalidAttribute,
                format!("property `{}` has unknown type `{}`", name, type_token),
                element.location,
            );
        };
        if PropertyType::is_deprecated_token(type_token) {
            self.diagnostics.push(
                Diagnostic::warning(
                    DiagnosticCode::DeprecatedSyntax,
                    format!("property `{}` uses deprecated type `{}`", name, type_token),
                )
                .with_location(element.location)
                .with_help("use `decimal`"),
            );
        }
        if self.description.property(name).is_some() {
            return self.error(
                DiagnosticCode::InvalidAttribute,
                format!("property `{}` is declared twice", name),
                element.location,
            );
        }

        let mut property = ComponentProperty::new(name, property_type, PropertyValue::Unset);
        if let Some(serialized) = element.get("serialize") {
            property.serialized_name = serialized.to_string();
        }
        if let Some(display) = element.get("display") {
            property.display_name = display.to_string();
        }

        for child in &element.children {
            match child.name.to_ascii_lowercase().as_str() {
                "option" => match child.content() {
                    Some(option) => property.enum_options.push(option.trim().to_string()),
                    None => {
                        self.required(child, "value");
                    }
                },
                "format" => {
                    let (Some(conditions), Some(template)) = (self.conditions(child), self.required(child, "value"))
                    else {
                        continue;
                    };
                    property
                        .formats
                        .push(ComponentPropertyFormat::new(conditions, template));
                }
                "condition" => {
                    let (Some(kind), Some(conditions)) = (self.required(child, "type"), self.conditions(child)) else {
                        continue;
                    };
                    property
                        .other_conditions
                        .insert(kind.to_ascii_lowercase(), conditions);
                }
                _ => self.unknown(child),
            }
        }

        if let Some(raw) = element.get("default") {
            match property.parse_value(raw) {
                Ok(value) => property.default = value,
                Err(err) => {
                    return self.error(
                        DiagnosticCode::InvalidValue,
                        format!("property `{}` default: {}", name, err),
                        element.location,
                    );
                }
            }
        }

        debug!("declared property `{}` ({})", property.name, property.property_type);
        self.description.properties.push(property);
    }

    // ------------------------------------------------------------------------
    // Flags
    // ------------------------------------------------------------------------

    pub fn flags(&mut self, element: &Element<'_>) {
        let Some(conditions) = self.conditions(element) else { return };
        let mut flags = FlagOptions::NONE;
        for child in &element.children {
            if !child.is("flag") {
                self.unknown(child);
                continue;
            }
            let Some(name) = child.content() else {
                self.required(child, "value");
                continue;
            };
            match FlagOptions::from_name(name) {
                Some(flag) => flags |= flag,
                None => self.warning(
                    DiagnosticCode::InvalidAttribute,
                    format!("unknown flag `{}`", name.trim()),
                    child.location,
                ),
            }
        }

        if conditions.is_empty() {
            self.description.set_default_flag(flags, true);
        } else {
            self.description
                .flags
                .push(ConditionalFlags::new(conditions, flags));
        }
    }

    // ------------------------------------------------------------------------
    // Connections
    // ------------------------------------------------------------------------

    pub fn connections(&mut self, element: &Element<'_>) {
        self.connection_group(element, &ConditionTree::Empty);
    }

    fn connection_group(&mut self, element: &Element<'_>, parent: &ConditionTree) {
        let Some(own) = self.conditions(element) else { return };
        let conditions = parent.clone().and(own);
        let mut connections = Vec::new();
        let mut nested = Vec::new();

        for child in &element.children {
            if child.is("group") {
                nested.push(child);
            } else if child.is("connection") {
                connections.extend(self.connection(child));
            } else {
                self.unknown(child);
            }
        }

        if !connections.is_empty() {
            self.description
                .connections
                .push(ConnectionGroup::new(conditions.clone(), connections));
        }
        for child in nested {
            self.connection_group(child, &conditions);
        }
    }

    fn connection(&mut self, element: &Element<'_>) -> Option<ConnectionDescription> {
        let start = self.point(element, "start");
        let end = self.point(element, "end");
        let edge = match element.get("edge") {
            None => ConnectionEdge::None,
            Some(token) => match ConnectionEdge::from_token(token) {
                Some(edge) => edge,
                None => {
                    self.error(
                        DiagnosticCode::InvalidAttribute,
                        format!("unknown connection edge `{}`", token),
                        element.location,
                    );
                    return None;
                }
            },
        };
        let name = element.get("name").unwrap_or(DEFAULT_CONNECTION_NAME);
        Some(ConnectionDescription::new(name, start?, end?, edge))
    }

    // ------------------------------------------------------------------------
    // Render groups and commands
    // ------------------------------------------------------------------------

    pub fn render(&mut self, element: &Element<'_>) {
        let mut root = std::mem::take(&mut self.render);
        if let Some(group) = self.render_group(element) {
            root.push_child(group);
        }
        self.render = root;
    }

    fn render_group(&mut self, element: &Element<'_>) -> Option<RenderGroup> {
        let mut group = RenderGroup::new(self.conditions(element)?);
        if let Some(token) = element.get("autorotate") {
            match AutoRotate::from_token(token) {
                Some(auto_rotate) => group = group.with_auto_rotate(auto_rotate),
                None => self.error(
                    DiagnosticCode::InvalidAttribute,
                    format!("unknown autorotate value `{}`", token),
                    element.location,
                ),
            }
        }

        for child in &element.children {
            if child.is("group") {
                if let Some(nested) = self.render_group(child) {
                    group.push_child(nested);
                }
            } else if let Some(command) = self.render_command(child) {
                group.push_command(command);
            }
        }
        Some(group)
    }

    fn render_command(&mut self, element: &Element<'_>) -> Option<RenderCommand> {
        let command: RenderCommand = match element.name.to_ascii_lowercase().as_str() {
            "line" => {
                let start = self.point_or_axes(element, "start", "x1", "y1");
                let end = self.point_or_axes(element, "end", "x2", "y2");
                let thickness = self.number(element, "thickness", Some(DEFAULT_THICKNESS));
                Line {
                    start: start?,
                    end: end?,
                    thickness: thickness?,
                }
                .into()
            }
            "rect" => {
                let location = self.point_or_axes(element, "location", "x", "y");
                let width = self.number(element, "width", None);
                let height = self.number(element, "height", None);
                let thickness = self.number(element, "thickness", Some(DEFAULT_THICKNESS));
                let fill = self.boolean(element, "fill");
                Rectangle {
                    location: location?,
                    width: width?,
                    height: height?,
                    thickness: thickness?,
                    fill: fill?,
                }
                .into()
            }
            "ellipse" => {
                let centre = self.point_or_axes(element, "centre", "x", "y");
                let radius_x = self.number(element, "rx", None);
                let radius_y = self.number(element, "ry", None);
                let thickness = self.number(element, "thickness", Some(DEFAULT_THICKNESS));
                let fill = self.boolean(element, "fill");
                Ellipse {
                    centre: centre?,
                    radius_x: radius_x?,
                    radius_y: radius_y?,
                    thickness: thickness?,
                    fill: fill?,
                }
                .into()
            }
            "path" => {
                let start = self.point_or_axes(element, "start", "x", "y");
                let data = self.path_data(element);
                let thickness = self.number(element, "thickness", Some(DEFAULT_THICKNESS));
                let fill = self.boolean(element, "fill");
                Path {
                    start: start?,
                    thickness: thickness?,
                    fill: fill?,
                    data: data?,
                }
                .into()
            }
            "text" => self.text(element)?.into(),
            _ => {
                self.unknown(element);
                return None;
            }
        };
        Some(command)
    }

    fn path_data(&mut self, element: &Element<'_>) -> Option<PathData> {
        let raw = self.required(element, "data")?;
        match PathData::parse(raw) {
            Ok(data) => Some(data),
            Err(err) => {
                self.error(DiagnosticCode::InvalidPath, err.to_string(), element.location);
                None
            }
        }
    }

    fn text(&mut self, element: &Element<'_>) -> Option<Text> {
        let location = self.point_or_axes(element, "location", "x", "y")?;
        let alignment = match element.get("align") {
            None => TextAlignment::default(),
            Some(token) => match token.parse() {
                Ok(alignment) => alignment,
                Err(message) => {
                    self.error(DiagnosticCode::InvalidAttribute, message, element.location);
                    return None;
                }
            },
        };

        let mut runs = Vec::new();
        if let Some(value) = element.get("value") {
            runs.push(TextRun::plain(value));
        }
        for child in &element.children {
            let style = match child.name.to_ascii_lowercase().as_str() {
                "span" => TextStyle::Normal,
                "sub" => TextStyle::Subscript,
                "sup" => TextStyle::Superscript,
                _ => {
                    self.unknown(child);
                    continue;
                }
            };
            let size = match child.get("size").map(str::parse::<TextSize>) {
                None => TextSize::default(),
                Some(Ok(size)) => size,
                Some(Err(message)) => {
                    self.warning(DiagnosticCode::InvalidAttribute, message, child.location);
                    TextSize::default()
                }
            };
            let text = child.content().unwrap_or_default();
            runs.push(TextRun::new(text, TextRunFormatting { style, size }));
        }
        if runs.is_empty() {
            self.required(element, "value");
            return None;
        }

        Some(Text {
            location,
            alignment,
            runs,
        })
    }

    // ------------------------------------------------------------------------
    // Freezing
    // ------------------------------------------------------------------------

    /// Finish the description. Comparison values in conditions are promoted
    /// to the types of the properties they compare against.
    pub fn build(mut self) -> (ComponentDescription, Diagnostics) {
        self.description.render = flatten_groups(&self.render);

        let types: HashMap<String, PropertyType> = self
            .description
            .properties
            .iter()
            .map(|p| (p.name.clone(), p.property_type))
            .collect();
        let lookup = |name: &str| types.get(name).copied();

        let description = &mut self.description;
        let mut trees: Vec<&mut ConditionTree> = Vec::new();
        trees.extend(description.flags.iter_mut().map(|f| &mut f.conditions));
        trees.extend(description.connections.iter_mut().map(|c| &mut c.conditions));
        trees.extend(description.render.iter_mut().map(|r| &mut r.conditions));
        for property in description.properties.iter_mut() {
            trees.extend(property.formats.iter_mut().map(|f| &mut f.conditions));
            trees.extend(property.other_conditions.values_mut());
        }

        let mut unknown = BTreeSet::new();
        let mut unconverted = BTreeSet::new();
        for tree in trees {
            for leaf in tree.leaves() {
                if let ConditionLeaf::Property { name, .. } = leaf
                    && !types.contains_key(name)
                {
                    unknown.insert(name.clone());
                }
            }
            unconverted.extend(tree.promote_values(&lookup));
        }

        for name in unknown {
            self.warning(
                DiagnosticCode::UnknownProperty,
                format!("condition refers to undeclared property `{}`", name),
                None,
            );
        }
        for name in unconverted {
            let ty = types.get(&name).map(|t| t.to_string()).unwrap_or_default();
            self.warning(
                DiagnosticCode::InvalidValue,
                format!("condition compares `{}` with a value that is not a valid {}", name, ty),
                None,
            );
        }

        (self.description, self.diagnostics)
    }
}

// ============================================================================
// Loading
// ============================================================================

/// Descriptions and diagnostics of one load.
#[derive(Debug, Default)]
pub struct LoadResult {
    pub descriptions: Vec<Arc<ComponentDescription>>,
    pub diagnostics: Diagnostics,
}

impl LoadResult {
    /// Freeze a builder into the result.
    pub fn add(&mut self, builder: DescriptionBuilder) -> Arc<ComponentDescription> {
        let (description, diagnostics) = builder.build();
        self.diagnostics.extend(diagnostics);
        let description = Arc::new(description);
        self.descriptions.push(Arc::clone(&description));
        description
    }

    pub fn into_registry(self) -> (DescriptionRegistry, Diagnostics) {
        (self.descriptions.into_iter().collect(), self.diagnostics)
    }
}

/// Run a loader. A fatal error discards everything loaded so far and is
/// reported as the single diagnostic of the result.
pub fn load_descriptions<F>(load: F) -> LoadResult
where
    F: FnOnce(&mut LoadResult) -> Result<(), LoadError>,
{
    let mut result = LoadResult::default();
    match load(&mut result) {
        Ok(()) => result,
        Err(err) => {
            warn!("description load aborted: {}", err);
            let mut diagnostics = Diagnostics::new();
            diagnostics.push(Diagnostic::error(DiagnosticCode::Fatal, err.to_string()));
            LoadResult {
                descriptions: Vec::new(),
                diagnostics,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::DiagnosticCode as Code;

    fn codes(diagnostics: &Diagnostics) -> Vec<Code> {
        diagnostics.iter().map(Diagnostic::code).collect()
    }

    #[test]
    fn property_declaration() {
        let mut builder = DescriptionBuilder::new("r", "Resistor");
        builder.property(
            &Element::new("property")
                .attr("name", "resistance")
                .attr("type", "double")
                .attr("default", "4700")
                .attr("serialize", "r")
                .child(Element::new("format").attr("conditions", "$resistance>=1000").attr("value", "$resistance div_1000 kΩ"))
                .at(4, 3),
        );
        let (description, diagnostics) = builder.build();

        assert_eq!(codes(&diagnostics), [Code::DeprecatedSyntax]);
        assert_eq!(diagnostics.iter().next().and_then(Diagnostic::location), Some(SourceLocation::new(4, 3)));
        let property = description.property("resistance").unwrap();
        assert_eq!(property.property_type, PropertyType::Decimal);
        assert_eq!(property.default, PropertyValue::Numeric(4700.0));
        assert_eq!(property.serialized_name, "r");

        let ConditionTree::Leaf(ConditionLeaf::Property { value, .. }) = &property.formats[0].conditions
        else {
            panic!("expected a leaf");
        };
        assert_eq!(value, &PropertyValue::Numeric(1000.0));
    }

    #[test]
    fn bad_elements_are_skipped() {
        let mut builder = DescriptionBuilder::new("x", "X");
        builder.property(&Element::new("property").attr("name", "a").attr("type", "int").attr("default", "1.5"));
        builder.property(&Element::new("property").attr("type", "int"));
        builder.render(
            &Element::new("render")
                .child(Element::new("arc").at(7, 1))
                .child(Element::new("line").attr("start", "Start,Start").attr("end", "Sideways"))
                .child(Element::new("group").attr("conditions", "($a"))
                .child(Element::new("line").attr("start", "Start,Start").attr("end", "End,Start")),
        );
        let (description, diagnostics) = builder.build();

        assert_eq!(
            codes(&diagnostics),
            [
                Code::InvalidValue,
                Code::MissingAttribute,
                Code::UnknownElement,
                Code::InvalidPoint,
                Code::InvalidCondition,
            ]
        );
        assert!(description.properties().is_empty());
        assert_eq!(description.render_descriptions().len(), 1);
        assert_eq!(description.render_descriptions()[0].commands.len(), 1);
    }

    #[test]
    fn flags_and_connections() {
        let mut builder = DescriptionBuilder::new("x", "X");
        builder.property(&Element::new("property").attr("name", "t").attr("type", "enum").attr("default", "a"));
        builder.flags(&Element::new("flags").child(Element::new("flag").with_text("NoResize")));
        builder.flags(
            &Element::new("flags")
                .attr("conditions", "$t==b")
                .child(Element::new("flag").with_text("FlipPrimary"))
                .child(Element::new("flag").with_text("Teleport")),
        );
        builder.connections(
            &Element::new("connections")
                .child(Element::new("connection").attr("start", "Start,Start").attr("end", "End,Start").attr("edge", "both"))
                .child(
                    Element::new("group").attr("conditions", "$t==b").child(
                        Element::new("connection")
                            .attr("name", "base")
                            .attr("start", "Middle,Start")
                            .attr("end", "Middle,Start+20"),
                    ),
                ),
        );
        let (description, diagnostics) = builder.build();

        assert_eq!(codes(&diagnostics), [Code::InvalidAttribute]);
        let flags: Vec<FlagOptions> = description.conditional_flags().iter().map(|f| f.flags).collect();
        assert_eq!(flags, [FlagOptions::NO_RESIZE, FlagOptions::FLIP_PRIMARY]);

        let groups = description.connections();
        assert_eq!(groups.len(), 2);
        assert!(groups[0].conditions.is_empty());
        assert_eq!(groups[0].connections[0].name, DEFAULT_CONNECTION_NAME);
        assert_eq!(groups[0].connections[0].edge, ConnectionEdge::Both);
        assert_eq!(groups[1].conditions.to_string(), "$t==b");
        assert_eq!(groups[1].connections[0].name, "base");
    }

    #[test]
    fn text_runs_and_axes() {
        let mut builder = DescriptionBuilder::new("x", "X");
        builder.render(
            &Element::new("render").child(
                Element::new("text")
                    .attr("x", "Middle")
                    .attr("y", "Start-12")
                    .attr("align", "BottomCenter")
                    .child(Element::new("span").with_text("h"))
                    .child(Element::new("sub").attr("size", "small").with_text("FE")),
            ),
        );
        let (description, diagnostics) = builder.build();
        assert!(diagnostics.is_empty());

        let RenderCommand::Text(text) = &description.render_descriptions()[0].commands[0] else {
            panic!("expected text");
        };
        assert_eq!(text.location, ComponentPoint::parse("Middle,Start-12").unwrap());
        assert_eq!(text.alignment, TextAlignment::BottomCentre);
        assert_eq!(text.runs[1].formatting.style, TextStyle::Subscript);
        assert_eq!(text.runs[1].formatting.size, TextSize::Small);
    }

    #[test]
    fn legacy_dialect_and_metadata() {
        let mut builder = DescriptionBuilder::new("x", "X");
        builder.element(
            &Element::new("metadata")
                .child(Element::new("meta").attr("name", "formatversion").attr("value", "1.1"))
                .child(Element::new("meta").attr("name", "guid").attr("value", "not-a-guid"))
                .child(Element::new("meta").attr("name", "author").with_text("Someone"))
                .child(Element::new("meta").attr("name", "minsize").attr("value", "80")),
        );
        builder.render(
            &Element::new("render")
                .child(Element::new("group").attr("conditions", "_horizontal"))
                .child(Element::new("group").attr("conditions", "!$a")),
        );
        let (description, diagnostics) = builder.build();

        assert_eq!(codes(&diagnostics), [Code::InvalidAttribute, Code::InvalidCondition]);
        assert_eq!(description.metadata().format_version, FormatVersion::V1_1);
        assert_eq!(description.metadata().author.as_deref(), Some("Someone"));
        assert!(description.metadata().guid.is_none());
        assert_eq!(description.min_size(), 80.0);
    }

    #[test]
    fn fatal_load_discards_everything() {
        let result = load_descriptions(|result| {
            result.add(DescriptionBuilder::new("a", "A"));
            Err(LoadError::aborted("unexpected end of file"))
        });
        assert!(result.descriptions.is_empty());
        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(
            result.diagnostics.iter().next().map(Diagnostic::message),
            Some("unexpected end of file")
        );

        let result = load_descriptions(|result| {
            result.add(DescriptionBuilder::new("a", "A"));
            Ok(())
        });
        let (registry, diagnostics) = result.into_registry();
        assert!(diagnostics.is_empty());
        assert!(registry.get("a").is_some());
    }
}
