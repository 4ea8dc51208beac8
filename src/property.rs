//! Component properties and their display formats
//!
//! A format rule turns a property into display text with a template such as
//! `$resistance(div_1000)kΩ` or `$r div_1000 Ω`. Variables may carry numeric
//! modifiers, either as a bracketed chain directly after the name or as
//! whitespace-separated words:
//!
//! - `div_N` divides by N
//! - `mul_N` multiplies by N
//! - `round_N` rounds to N decimal places
//!
//! Modifiers are applied left to right and leave non-numeric values
//! untouched.

use std::collections::BTreeMap;

use crate::condition::{ConditionContext, ConditionTree};
use crate::escape::resolve_unicode_escapes;
use crate::value::{PropertyType, PropertyValue, ValueError};

/// Condition key controlling whether a property is written out.
pub const SERIALIZE_CONDITION: &str = "serialize";

// ============================================================================
// Modifiers
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
enum Modifier {
    Div(f64),
    Mul(f64),
    Round(i32),
}

impl Modifier {
    fn parse(word: &str) -> Option<Modifier> {
        let (task, arg) = word.split_once('_')?;
        match task.to_ascii_lowercase().as_str() {
            "div" => arg.parse().ok().filter(|d: &f64| *d != 0.0 && d.is_finite()).map(Modifier::Div),
            "mul" => arg.parse().ok().filter(|m: &f64| m.is_finite()).map(Modifier::Mul),
            "round" => arg.parse().ok().filter(|p: &i32| (0..=15).contains(p)).map(Modifier::Round),
            _ => None,
        }
    }

    fn apply(self, value: f64) -> f64 {
        match self {
            Modifier::Div(d) => value / d,
            Modifier::Mul(m) => value * m,
            Modifier::Round(places) => {
                let scale = 10f64.powi(places);
                (value * scale).round() / scale
            }
        }
    }
}

/// Significant digits kept when a modified value is displayed.
const DISPLAY_DIGITS: i32 = 15;

/// Round to `digits` significant digits, dropping binary noise such as
/// `3 * 0.1 == 0.30000000000000004`.
fn round_significant(value: f64, digits: i32) -> f64 {
    if value == 0.0 || !value.is_finite() {
        return value;
    }
    let exponent = digits - 1 - value.abs().log10().floor() as i32;
    if exponent > 300 {
        value
    } else if exponent >= 0 {
        let scale = 10f64.powi(exponent);
        (value * scale).round() / scale
    } else {
        let scale = 10f64.powi(-exponent);
        (value / scale).round() * scale
    }
}

fn apply_modifiers(value: PropertyValue, modifiers: &[Modifier]) -> String {
    if modifiers.is_empty() {
        return value.to_string();
    }
    match value.promoted().0 {
        PropertyValue::Numeric(v) => {
            let result = modifiers.iter().fold(v, |acc, m| m.apply(acc));
            PropertyValue::Numeric(round_significant(result, DISPLAY_DIGITS)).to_string()
        }
        other => other.to_string(),
    }
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Read modifiers following a variable. Returns the modifiers and the
/// number of bytes consumed.
fn read_modifiers(rest: &str) -> (Vec<Modifier>, usize) {
    let mut modifiers = Vec::new();
    let mut consumed = 0;

    // bracketed chain: (div_1000)(round_1)
    while let Some(inner) = rest[consumed..].strip_prefix('(') {
        let Some(close) = inner.find(')') else { break };
        let Some(modifier) = Modifier::parse(&inner[..close]) else { break };
        modifiers.push(modifier);
        consumed += close + 2;
    }
    if !modifiers.is_empty() {
        return (modifiers, consumed);
    }

    // word form: $r div_1000 round_2
    loop {
        let tail = &rest[consumed..];
        let word_start = tail.len() - tail.trim_start().len();
        if word_start == 0 {
            break;
        }
        let word = &tail[word_start..];
        let word_len = word.find(char::is_whitespace).unwrap_or(word.len());
        let Some(modifier) = Modifier::parse(&word[..word_len]) else { break };
        modifiers.push(modifier);
        consumed += word_start + word_len;
    }
    (modifiers, consumed)
}

/// Substitute every `$name` in `template` using `lookup`, then resolve
/// `\uXXXX` escapes.
pub fn format_template(template: &str, lookup: &dyn Fn(&str) -> PropertyValue) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(dollar) = rest.find('$') {
        out.push_str(&rest[..dollar]);
        let after = &rest[dollar + 1..];
        let name_len = after.find(|c: char| !is_name_char(c)).unwrap_or(after.len());
        if name_len == 0 {
            out.push('$');
            rest = after;
            continue;
        }
        let name = &after[..name_len];
        let (modifiers, consumed) = read_modifiers(&after[name_len..]);
        out.push_str(&apply_modifiers(lookup(name), &modifiers));
        rest = &after[name_len + consumed..];
    }
    out.push_str(rest);

    resolve_unicode_escapes(&out)
}

// ============================================================================
// Format rules and properties
// ============================================================================

/// A display template used while its condition holds.
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentPropertyFormat {
    pub conditions: ConditionTree,
    pub template: String,
}

impl ComponentPropertyFormat {
    pub fn new(conditions: ConditionTree, template: impl Into<String>) -> Self {
        Self {
            conditions,
            template: template.into(),
        }
    }

    /// Format without checking the condition.
    pub fn format(&self, state: &dyn ConditionContext) -> String {
        format_template(&self.template, &|name| state.property(name))
    }
}

/// A property declared by a component description.
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentProperty {
    pub name: String,
    /// Key used when the property is written to a document
    pub serialized_name: String,
    pub display_name: String,
    pub property_type: PropertyType,
    pub default: PropertyValue,
    /// Checked in order; the first rule whose condition holds is used
    pub formats: Vec<ComponentPropertyFormat>,
    pub enum_options: Vec<String>,
    pub other_conditions: BTreeMap<String, ConditionTree>,
}

impl ComponentProperty {
    pub fn new(name: impl Into<String>, property_type: PropertyType, default: PropertyValue) -> Self {
        let name = name.into();
        Self {
            serialized_name: name.clone(),
            display_name: name.clone(),
            name,
            property_type,
            default,
            formats: Vec::new(),
            enum_options: Vec::new(),
            other_conditions: BTreeMap::new(),
        }
    }

    /// Parse text as a value of this property's type. Enum values must be
    /// one of the declared options, compared case-insensitively.
    pub fn parse_value(&self, raw: &str) -> Result<PropertyValue, ValueError> {
        if self.property_type == PropertyType::Enum && !self.enum_options.is_empty() {
            let option = self
                .enum_options
                .iter()
                .find(|o| o.eq_ignore_ascii_case(raw.trim()))
                .ok_or_else(|| ValueError::NotAnOption {
                    raw: raw.to_string(),
                    options: self.enum_options.join(", "),
                })?;
            return Ok(PropertyValue::String(option.clone()));
        }
        PropertyValue::parse(self.property_type, raw)
    }

    /// Display text for the property's current value.
    pub fn format(&self, state: &dyn ConditionContext) -> String {
        match self.formats.iter().find(|f| f.conditions.is_met(state)) {
            Some(rule) => rule.format(state),
            None => state.property(&self.name).to_string(),
        }
    }

    /// Whether the property is written out. Without a `serialize` condition
    /// it always is.
    pub fn should_serialize(&self, state: &dyn ConditionContext) -> bool {
        self.other_conditions
            .get(SERIALIZE_CONDITION)
            .is_none_or(|c| c.is_met(state))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Orientation;

    struct State(Vec<(&'static str, PropertyValue)>);

    impl ConditionContext for State {
        fn property(&self, name: &str) -> PropertyValue {
            self.0
                .iter()
                .find(|(n, _)| *n == name)
                .map(|(_, v)| v.clone())
                .unwrap_or_default()
        }

        fn orientation(&self) -> Orientation {
            Orientation::Horizontal
        }
    }

    fn format(template: &str, state: &State) -> String {
        format_template(template, &|name| state.property(name))
    }

    #[test]
    fn word_modifiers() {
        let state = State(vec![("r", 4700.0.into())]);
        assert_eq!(format("$r div_1000 Ω", &state), "4.7 Ω");
        assert_eq!(format("$r div_1000 round_0 k", &state), "5 k");
        assert_eq!(format("$r", &state), "4700");
    }

    #[test]
    fn bracketed_modifiers() {
        let state = State(vec![("c", PropertyValue::Unknown("47".into()))]);
        assert_eq!(format("$c(div_10)\\u00B5F", &state), "4.7µF");
        assert_eq!(format("$c(div_3)(round_2) mF", &state), "15.67 mF");
    }

    #[test]
    fn modified_values_drop_float_noise() {
        let state = State(vec![("c", 3.0.into()), ("l", 0.7.into())]);
        assert_eq!(format("$c mul_0.1 F", &state), "0.3 F");
        assert_eq!(format("$l(mul_0.1)H", &state), "0.07H");
        assert_eq!(format("$c mul_1e20", &state), "300000000000000000000");
        assert_eq!(round_significant(0.1 + 0.2, DISPLAY_DIGITS), 0.3);
    }

    #[test]
    fn modifiers_skip_non_numeric_values() {
        let state = State(vec![("t", "NPN".into())]);
        assert_eq!(format("$t div_2", &state), "NPN");
        assert_eq!(format("$t(mul_3)!", &state), "NPN!");
    }

    #[test]
    fn unknown_words_are_kept() {
        let state = State(vec![("v", 5.0.into())]);
        assert_eq!(format("$v volts", &state), "5 volts");
        assert_eq!(format("$v(volts)", &state), "5(volts)");
        assert_eq!(format("cost: $ $v", &state), "cost: $ 5");
    }

    #[test]
    fn first_matching_rule_wins() {
        let mut prop = ComponentProperty::new("r", PropertyType::Decimal, 0.0.into());
        prop.formats = vec![
            ComponentPropertyFormat::new("$r>=1000".parse().unwrap(), "$r div_1000 kΩ"),
            ComponentPropertyFormat::new("$r>=1".parse().unwrap(), "$r Ω"),
            ComponentPropertyFormat::new("$r>=0".parse().unwrap(), "never"),
        ];
        assert_eq!(prop.format(&State(vec![("r", 4700.0.into())])), "4.7 kΩ");
        assert_eq!(prop.format(&State(vec![("r", 47.0.into())])), "47 Ω");
        assert_eq!(prop.format(&State(vec![("r", (-1.0).into())])), "-1");
    }

    #[test]
    fn enum_values_must_be_options() {
        let mut prop = ComponentProperty::new("type", PropertyType::Enum, "NPN".into());
        prop.enum_options = vec!["NPN".into(), "PNP".into()];
        assert_eq!(prop.parse_value("pnp"), Ok(PropertyValue::String("PNP".into())));
        assert!(matches!(prop.parse_value("FET"), Err(ValueError::NotAnOption { .. })));
    }

    #[test]
    fn serialize_condition() {
        let mut prop = ComponentProperty::new("label", PropertyType::String, "".into());
        assert!(prop.should_serialize(&State(vec![])));
        prop.other_conditions
            .insert(SERIALIZE_CONDITION.to_string(), "$label".parse().unwrap());
        assert!(!prop.should_serialize(&State(vec![])));
        assert!(prop.should_serialize(&State(vec![("label", "R1".into())])));
    }
}
