//! Component instances
//!
//! A [`Component`] pairs a shared description with the mutable state of one
//! placed symbol: property overrides and layout. It is the condition context
//! for everything the description declares and the text formatter for its
//! render commands.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::condition::ConditionContext;
use crate::connection::{ConnectionPoint, ConnectionSet};
use crate::description::{ComponentConfiguration, ComponentDescription};
use crate::log::{debug, warn};
use crate::render::{DrawingContext, LayoutContext, TextFormatter};
use crate::types::{FlagOptions, LayoutInformation, LayoutOptions, Orientation};
use crate::value::PropertyValue;

/// A placed instance of a component description.
#[derive(Debug, Clone)]
pub struct Component {
    description: Arc<ComponentDescription>,
    properties: BTreeMap<String, PropertyValue>,
    pub layout: LayoutInformation,
}

impl Component {
    /// New instance at the origin, horizontal, at the description's minimum
    /// size.
    pub fn new(description: Arc<ComponentDescription>) -> Self {
        let layout = LayoutInformation::new(glam::DVec2::ZERO, description.min_size(), Orientation::Horizontal);
        Self {
            description,
            properties: BTreeMap::new(),
            layout,
        }
    }

    pub fn with_layout(mut self, layout: LayoutInformation) -> Self {
        self.layout = layout;
        self
    }

    pub fn description(&self) -> &ComponentDescription {
        &self.description
    }

    /// The instance override if set, otherwise the declared default.
    /// Undeclared names without an override are `Unset`.
    pub fn property(&self, name: &str) -> PropertyValue {
        match self.properties.get(name) {
            Some(value) if value.is_set() => value.clone(),
            _ => self
                .description
                .property(name)
                .map(|p| p.default.clone())
                .unwrap_or_default(),
        }
    }

    /// Override a property. Setting `Unset` restores the default.
    pub fn set_property(&mut self, name: impl Into<String>, value: PropertyValue) {
        let name = name.into();
        if self.description.property(&name).is_none() {
            debug!("setting undeclared property `{}` on `{}`", name, self.description.id());
        }
        if value.is_set() {
            self.properties.insert(name, value);
        } else {
            self.properties.remove(&name);
        }
    }

    /// Display text of a declared property.
    pub fn formatted_property(&self, name: &str) -> Option<String> {
        self.description.property(name).map(|p| p.format(self))
    }

    pub fn flags(&self) -> FlagOptions {
        self.description.determine_flags(self)
    }

    /// First configuration whose setters all match the current properties.
    pub fn matched_configuration(&self) -> Option<&ComponentConfiguration> {
        self.description
            .configurations()
            .iter()
            .find(|c| c.matches(&self.description, self))
    }

    /// Apply the named configuration's setters. Returns false when no such
    /// configuration exists.
    pub fn apply_configuration(&mut self, name: &str) -> bool {
        let description = Arc::clone(&self.description);
        let Some(configuration) = description.configurations().iter().find(|c| c.name == name) else {
            return false;
        };
        for (key, value) in &configuration.setters {
            match description.property_by_serialized_name(key) {
                Some(property) => {
                    let value = match value {
                        PropertyValue::Unknown(raw) => property.parse_value(raw).unwrap_or_else(|_| value.clone()),
                        _ => value.clone(),
                    };
                    self.properties.insert(property.name.clone(), value);
                }
                None => warn!(
                    "configuration `{}` sets undeclared property `{}`",
                    configuration.name, key
                ),
            }
        }
        true
    }

    /// Layout options with the description's alignment flag merged in.
    pub fn layout_options(&self, options: LayoutOptions) -> LayoutOptions {
        let align = options.align_middle || self.flags().contains(FlagOptions::MIDDLE_MUST_ALIGN);
        options.with_align_middle(align)
    }

    /// Draw every active render description, in declaration order.
    pub fn render(&self, options: LayoutOptions, sink: &mut dyn DrawingContext) {
        let context = LayoutContext::new(self.layout_options(options), self);
        for description in self.description.render_descriptions() {
            if description.is_active(self) {
                description.render(&self.layout, &context, sink);
            }
        }
    }

    /// Terminals of every active connection group in document coordinates.
    /// Where groups overlap the first derived terminal is kept.
    pub fn connections(&self, options: LayoutOptions) -> Vec<ConnectionPoint> {
        let options = LayoutOptions {
            absolute: true,
            ..self.layout_options(options)
        };
        let mut set = ConnectionSet::with_grid(options.grid_size);
        for group in self.description.connections() {
            if !group.is_active(self) {
                continue;
            }
            for connection in &group.connections {
                set.extend(connection.derive(&self.layout, &options));
            }
        }
        set.into_vec()
    }
}

impl ConditionContext for Component {
    fn property(&self, name: &str) -> PropertyValue {
        Component::property(self, name)
    }

    fn orientation(&self) -> Orientation {
        self.layout.orientation
    }
}

impl TextFormatter for Component {
    fn format_text(&self, text: &str) -> String {
        let name = text.trim_start_matches('$');
        match self.formatted_property(name) {
            Some(formatted) => formatted,
            None => {
                warn!("text refers to undeclared property `{}`", name);
                text.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::{ConnectionDescription, ConnectionEdge, ConnectionFlags, ConnectionGroup};
    use crate::description::ConditionalFlags;
    use crate::point::ComponentPoint;
    use crate::property::{ComponentProperty, ComponentPropertyFormat};
    use crate::render::{DrawOp, Line, RecordingContext, RenderDescription, Text, TextAlignment, TextRun};
    use crate::value::PropertyType;
    use glam::dvec2;

    fn point(text: &str) -> ComponentPoint {
        ComponentPoint::parse(text).unwrap()
    }

    fn resistor() -> Arc<ComponentDescription> {
        let mut d = ComponentDescription::new("resistor", "Resistor");
        let mut r = ComponentProperty::new("resistance", PropertyType::Decimal, 4700.0.into());
        r.serialized_name = "r".to_string();
        r.formats
            .push(ComponentPropertyFormat::new("$resistance>=1000".parse().unwrap(), "$resistance div_1000 kΩ"));
        d.properties.push(r);
        let mut style = ComponentProperty::new("style", PropertyType::Enum, "ANSI".into());
        style.enum_options = vec!["ANSI".into(), "IEC".into()];
        d.properties.push(style);

        d.flags.push(ConditionalFlags::new(
            "$style==IEC".parse().unwrap(),
            FlagOptions::MIDDLE_MUST_ALIGN,
        ));

        d.render.push(RenderDescription::new(
            Default::default(),
            vec![
                Line {
                    start: point("Start,Middle+20"),
                    end: point("End,Middle+20"),
                    thickness: 2.0,
                }
                .into(),
            ],
        ));
        d.render.push(RenderDescription::new(
            "$style==IEC".parse().unwrap(),
            vec![
                Text {
                    location: point("Middle,Start-10"),
                    alignment: TextAlignment::BottomCentre,
                    runs: vec![TextRun::plain("$resistance")],
                }
                .into(),
            ],
        ));

        d.connections.push(ConnectionGroup::new(
            Default::default(),
            vec![ConnectionDescription::new("#", point("Start,Start"), point("End,Start"), ConnectionEdge::Both)],
        ));
        d.connections.push(ConnectionGroup::new(
            "$style==IEC".parse().unwrap(),
            vec![ConnectionDescription::new("x", point("Start,Start"), point("Start+20,Start"), ConnectionEdge::None)],
        ));

        let mut iec = ComponentConfiguration::new("IEC");
        iec.setters.insert("style".into(), PropertyValue::Unknown("iec".into()));
        d.metadata.configurations.push(iec);
        Arc::new(d)
    }

    #[test]
    fn property_lookup_prefers_overrides() {
        let mut c = Component::new(resistor());
        assert_eq!(c.property("resistance"), PropertyValue::Numeric(4700.0));
        c.set_property("resistance", 100.0.into());
        assert_eq!(c.property("resistance"), PropertyValue::Numeric(100.0));
        c.set_property("resistance", PropertyValue::Unset);
        assert_eq!(c.property("resistance"), PropertyValue::Numeric(4700.0));
        assert_eq!(c.property("missing"), PropertyValue::Unset);
    }

    #[test]
    fn renders_line_in_document_space() {
        let c = Component::new(resistor())
            .with_layout(LayoutInformation::new(dvec2(100.0, 100.0), 40.0, Orientation::Horizontal));
        let mut sink = RecordingContext::new();
        c.render(LayoutOptions::absolute(), &mut sink);
        assert_eq!(
            sink.ops,
            [DrawOp::Line {
                start: dvec2(100.0, 120.0),
                end: dvec2(140.0, 120.0),
                thickness: 2.0,
            }]
        );
    }

    #[test]
    fn configuration_drives_flags_text_and_connections() {
        let mut c = Component::new(resistor())
            .with_layout(LayoutInformation::new(dvec2(0.0, 0.0), 40.0, Orientation::Horizontal));
        assert!(c.matched_configuration().is_none());
        assert!(!c.layout_options(LayoutOptions::default()).align_middle);

        assert!(c.apply_configuration("IEC"));
        assert!(!c.apply_configuration("missing"));
        assert_eq!(c.property("style"), PropertyValue::String("IEC".into()));
        assert_eq!(c.matched_configuration().map(|c| c.name.as_str()), Some("IEC"));
        assert!(c.flags().contains(FlagOptions::MIDDLE_MUST_ALIGN));
        assert!(c.layout_options(LayoutOptions::default()).align_middle);

        let mut sink = RecordingContext::new();
        c.render(LayoutOptions::default(), &mut sink);
        let texts: Vec<&DrawOp> = sink.ops.iter().filter(|op| matches!(op, DrawOp::Text { .. })).collect();
        assert_eq!(
            texts,
            [&DrawOp::Text {
                anchor: dvec2(20.0, -10.0),
                alignment: TextAlignment::BottomCentre,
                runs: vec![TextRun::plain("4.7 kΩ")],
            }]
        );

        let points = c.connections(LayoutOptions::default());
        let xs: Vec<f64> = points.iter().map(|p| p.location.x).collect();
        assert_eq!(xs, [0.0, 10.0, 20.0, 30.0, 40.0]);
        assert!(points.iter().all(|p| p.name == "#"));
        assert!(points[0].flags.is_edge());
        assert!(points[4].flags.is_edge());
        assert_eq!(points[1].flags, ConnectionFlags::HORIZONTAL);
    }
}
