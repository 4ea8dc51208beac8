//! Component descriptions, configurations and conditional flags
//!
//! A [`ComponentDescription`] is assembled once by
//! [`DescriptionBuilder`](crate::DescriptionBuilder) and never changes
//! afterwards; instances share it through an `Arc`.

use std::collections::BTreeMap;

use uuid::Uuid;

use crate::condition::{ConditionContext, ConditionTree};
use crate::connection::ConnectionGroup;
use crate::property::ComponentProperty;
use crate::render::RenderDescription;
use crate::types::{FlagOptions, FormatVersion};
use crate::value::PropertyValue;

/// Default size of components that declare no minimum.
pub const DEFAULT_MIN_SIZE: f64 = 60.0;

/// A named preset of property values.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ComponentConfiguration {
    pub name: String,
    /// Item of the implementation set this configuration provides
    pub implements: Option<String>,
    /// Serialized property name to value
    pub setters: BTreeMap<String, PropertyValue>,
}

impl ComponentConfiguration {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_setter(mut self, serialized_name: impl Into<String>, value: PropertyValue) -> Self {
        self.setters.insert(serialized_name.into(), value);
        self
    }

    /// True when every setter equals the current value of its property.
    /// Setters naming undeclared properties never match.
    pub fn matches(&self, description: &ComponentDescription, state: &dyn ConditionContext) -> bool {
        self.setters.iter().all(|(key, expected)| {
            description
                .property_by_serialized_name(key)
                .is_some_and(|p| state.property(&p.name).try_eq(expected).unwrap_or(false))
        })
    }
}

/// Descriptive information about a component type.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ComponentMetadata {
    pub author: Option<String>,
    pub version: Option<String>,
    pub guid: Option<Uuid>,
    pub implement_set: Option<String>,
    pub implement_item: Option<String>,
    pub format_version: FormatVersion,
    pub configurations: Vec<ComponentConfiguration>,
    /// Any further `name=value` metadata
    pub entries: BTreeMap<String, String>,
}

/// Flags applied while a condition holds.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConditionalFlags {
    pub conditions: ConditionTree,
    pub flags: FlagOptions,
}

impl ConditionalFlags {
    pub fn new(conditions: ConditionTree, flags: FlagOptions) -> Self {
        Self { conditions, flags }
    }
}

/// The immutable template of a component type.
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentDescription {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) min_size: f64,
    /// Entry 0 holds the unconditioned defaults
    pub(crate) flags: Vec<ConditionalFlags>,
    pub(crate) properties: Vec<ComponentProperty>,
    pub(crate) connections: Vec<ConnectionGroup>,
    pub(crate) render: Vec<RenderDescription>,
    pub(crate) metadata: ComponentMetadata,
}

impl ComponentDescription {
    pub(crate) fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            min_size: DEFAULT_MIN_SIZE,
            flags: vec![ConditionalFlags::default()],
            properties: Vec::new(),
            connections: Vec::new(),
            render: Vec::new(),
            metadata: ComponentMetadata::default(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn min_size(&self) -> f64 {
        self.min_size
    }

    pub fn metadata(&self) -> &ComponentMetadata {
        &self.metadata
    }

    pub fn properties(&self) -> &[ComponentProperty] {
        &self.properties
    }

    pub fn connections(&self) -> &[ConnectionGroup] {
        &self.connections
    }

    pub fn render_descriptions(&self) -> &[RenderDescription] {
        &self.render
    }

    pub fn conditional_flags(&self) -> &[ConditionalFlags] {
        &self.flags
    }

    pub fn configurations(&self) -> &[ComponentConfiguration] {
        &self.metadata.configurations
    }

    pub fn property(&self, name: &str) -> Option<&ComponentProperty> {
        self.properties.iter().find(|p| p.name == name)
    }

    pub fn property_by_serialized_name(&self, serialized_name: &str) -> Option<&ComponentProperty> {
        self.properties
            .iter()
            .find(|p| p.serialized_name == serialized_name)
    }

    /// Union of every flag set whose condition holds.
    pub fn determine_flags(&self, state: &dyn ConditionContext) -> FlagOptions {
        self.flags
            .iter()
            .filter(|f| f.conditions.is_met(state))
            .fold(FlagOptions::NONE, |acc, f| acc | f.flags)
    }

    /// Enable or disable a flag in the unconditioned defaults.
    pub(crate) fn set_default_flag(&mut self, flag: FlagOptions, enabled: bool) {
        if self.flags.first().is_none_or(|f| !f.conditions.is_empty()) {
            self.flags.insert(0, ConditionalFlags::default());
        }
        let defaults = &mut self.flags[0].flags;
        if enabled {
            defaults.insert(flag);
        } else {
            defaults.remove(flag);
        }
    }

    /// Configuration providing the given item of an implementation set.
    pub fn find_implementation(&self, implement_set: &str, item: &str) -> Option<&ComponentConfiguration> {
        if self.metadata.implement_set.as_deref() != Some(implement_set) {
            return None;
        }
        self.metadata
            .configurations
            .iter()
            .find(|c| c.implements.as_deref() == Some(item))
    }
}
