//! Typed property values.
//!
//! Values read from a declarative source start life as [`PropertyValue::Unknown`]
//! when their type is not yet known (condition operands, configuration
//! setters). An `Unknown` value is promoted to the tag of whatever it is
//! compared against; [`PropertyValue::is_numeric`] promotes it in place.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use miette::Diagnostic;
use thiserror::Error;

/// Discriminant of a [`PropertyValue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    String,
    Numeric,
    Boolean,
    Unknown,
    Unset,
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueType::String => "string",
            ValueType::Numeric => "numeric",
            ValueType::Boolean => "boolean",
            ValueType::Unknown => "unknown",
            ValueType::Unset => "unset",
        };
        f.write_str(name)
    }
}

/// Errors raised when converting or comparing property values
#[derive(Error, Diagnostic, Debug, Clone, PartialEq)]
pub enum ValueError {
    #[error("cannot compare {left} value with {right} value")]
    #[diagnostic(code(compdesc::value::incomparable))]
    Incomparable { left: ValueType, right: ValueType },

    #[error("invalid number: {raw:?}")]
    #[diagnostic(code(compdesc::value::invalid_number))]
    InvalidNumber { raw: String },

    #[error("invalid integer: {raw:?}")]
    #[diagnostic(code(compdesc::value::invalid_integer))]
    InvalidInteger { raw: String },

    #[error("invalid boolean: {raw:?}")]
    #[diagnostic(
        code(compdesc::value::invalid_boolean),
        help("use `true` or `false`")
    )]
    InvalidBoolean { raw: String },

    #[error("{raw:?} is not one of the declared options")]
    #[diagnostic(code(compdesc::value::not_an_option), help("expected one of: {options}"))]
    NotAnOption { raw: String, options: String },
}

/// Declared type of a component property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyType {
    Decimal,
    Integer,
    Boolean,
    Enum,
    String,
}

impl PropertyType {
    /// Parse a type token. `double` is accepted as a deprecated alias for
    /// `decimal`.
    pub fn from_token(token: &str) -> Option<PropertyType> {
        match token.trim().to_ascii_lowercase().as_str() {
            "double" | "decimal" => Some(PropertyType::Decimal),
            "int" => Some(PropertyType::Integer),
            "bool" => Some(PropertyType::Boolean),
            "enum" => Some(PropertyType::Enum),
            "string" => Some(PropertyType::String),
            _ => None,
        }
    }

    /// Whether `token` is a deprecated spelling.
    pub fn is_deprecated_token(token: &str) -> bool {
        token.trim().eq_ignore_ascii_case("double")
    }

    /// The value tag values of this type carry.
    pub fn value_type(self) -> ValueType {
        match self {
            PropertyType::Decimal | PropertyType::Integer => ValueType::Numeric,
            PropertyType::Boolean => ValueType::Boolean,
            PropertyType::Enum | PropertyType::String => ValueType::String,
        }
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PropertyType::Decimal => "decimal",
            PropertyType::Integer => "int",
            PropertyType::Boolean => "bool",
            PropertyType::Enum => "enum",
            PropertyType::String => "string",
        };
        f.write_str(name)
    }
}

/// A property value
#[derive(Debug, Clone, PartialEq, Default)]
pub enum PropertyValue {
    String(String),
    Numeric(f64),
    Boolean(bool),
    /// Raw text whose type is decided by what it is compared against
    Unknown(String),
    #[default]
    Unset,
}

impl PropertyValue {
    pub fn value_type(&self) -> ValueType {
        match self {
            PropertyValue::String(_) => ValueType::String,
            PropertyValue::Numeric(_) => ValueType::Numeric,
            PropertyValue::Boolean(_) => ValueType::Boolean,
            PropertyValue::Unknown(_) => ValueType::Unknown,
            PropertyValue::Unset => ValueType::Unset,
        }
    }

    /// Parse declarative text as a value of the given property type.
    pub fn parse(ty: PropertyType, raw: &str) -> Result<PropertyValue, ValueError> {
        match ty {
            PropertyType::Decimal => parse_number(raw).map(PropertyValue::Numeric),
            PropertyType::Integer => raw
                .trim()
                .parse::<i64>()
                .map(|v| PropertyValue::Numeric(v as f64))
                .map_err(|_| ValueError::InvalidInteger {
                    raw: raw.to_string(),
                }),
            PropertyType::Boolean => parse_bool(raw).map(PropertyValue::Boolean),
            PropertyType::Enum | PropertyType::String => Ok(PropertyValue::String(raw.to_string())),
        }
    }

    pub fn is_set(&self) -> bool {
        !matches!(self, PropertyValue::Unset)
    }

    /// Numeric check with promote-on-demand: an `Unknown` value that parses
    /// as a number is permanently rewritten to `Numeric`.
    pub fn is_numeric(&mut self) -> bool {
        match self {
            PropertyValue::Numeric(_) => true,
            PropertyValue::Unknown(raw) => match parse_number(raw) {
                Ok(v) => {
                    *self = PropertyValue::Numeric(v);
                    true
                }
                Err(_) => false,
            },
            _ => false,
        }
    }

    /// Non-mutating form of [`is_numeric`](Self::is_numeric): returns the
    /// promoted value and whether a promotion happened.
    pub fn promoted(&self) -> (PropertyValue, bool) {
        let mut value = self.clone();
        let was_unknown = matches!(value, PropertyValue::Unknown(_));
        let promoted = value.is_numeric() && was_unknown;
        (value, promoted)
    }

    /// The numeric payload, reading through `Unknown` without promoting.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            PropertyValue::Numeric(v) => Some(*v),
            PropertyValue::Unknown(raw) => parse_number(raw).ok(),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PropertyValue::Boolean(b) => Some(*b),
            PropertyValue::Unknown(raw) => parse_bool(raw).ok(),
            _ => None,
        }
    }

    /// Convert to the given tag. Only `Unknown` values convert; any other
    /// value must already carry the requested tag.
    pub fn coerce_to(&self, ty: ValueType) -> Result<PropertyValue, ValueError> {
        if self.value_type() == ty {
            return Ok(self.clone());
        }
        let PropertyValue::Unknown(raw) = self else {
            return Err(ValueError::Incomparable {
                left: self.value_type(),
                right: ty,
            });
        };
        match ty {
            ValueType::String => Ok(PropertyValue::String(raw.clone())),
            ValueType::Numeric => parse_number(raw).map(PropertyValue::Numeric),
            ValueType::Boolean => parse_bool(raw).map(PropertyValue::Boolean),
            ValueType::Unset if raw.is_empty() => Ok(PropertyValue::Unset),
            ValueType::Unset | ValueType::Unknown => Err(ValueError::Incomparable {
                left: ValueType::Unknown,
                right: ty,
            }),
        }
    }

    /// Bring two values to a common tag.
    fn unify(&self, other: &PropertyValue) -> Result<(PropertyValue, PropertyValue), ValueError> {
        use PropertyValue::Unknown;
        match (self, other) {
            (Unknown(a), Unknown(b)) => match (parse_number(a), parse_number(b)) {
                (Ok(a), Ok(b)) => Ok((PropertyValue::Numeric(a), PropertyValue::Numeric(b))),
                _ => Ok((PropertyValue::String(a.clone()), PropertyValue::String(b.clone()))),
            },
            (Unknown(_), _) => Ok((self.coerce_to(other.value_type())?, other.clone())),
            (_, Unknown(_)) => Ok((self.clone(), other.coerce_to(self.value_type())?)),
            _ if self.value_type() == other.value_type() => Ok((self.clone(), other.clone())),
            _ => Err(ValueError::Incomparable {
                left: self.value_type(),
                right: other.value_type(),
            }),
        }
    }

    /// Equality with cross-tag coercion. Strings compare case-insensitively.
    pub fn try_eq(&self, other: &PropertyValue) -> Result<bool, ValueError> {
        let (a, b) = self.unify(other)?;
        Ok(match (&a, &b) {
            (PropertyValue::String(a), PropertyValue::String(b)) => {
                a.to_lowercase() == b.to_lowercase()
            }
            (PropertyValue::Numeric(a), PropertyValue::Numeric(b)) => a == b,
            (PropertyValue::Boolean(a), PropertyValue::Boolean(b)) => a == b,
            (PropertyValue::Unset, PropertyValue::Unset) => true,
            _ => false,
        })
    }

    /// Ordering with cross-tag coercion. Only numeric values are ordered;
    /// anything else yields `Ok(None)`.
    pub fn try_cmp(&self, other: &PropertyValue) -> Result<Option<Ordering>, ValueError> {
        let (a, b) = self.unify(other)?;
        Ok(match (a, b) {
            (PropertyValue::Numeric(a), PropertyValue::Numeric(b)) => a.partial_cmp(&b),
            _ => None,
        })
    }

    /// Emptiness of the string form.
    pub fn is_empty(&self) -> bool {
        match self {
            PropertyValue::String(s) | PropertyValue::Unknown(s) => s.is_empty(),
            PropertyValue::Unset => true,
            PropertyValue::Numeric(_) | PropertyValue::Boolean(_) => false,
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::String(s) | PropertyValue::Unknown(s) => f.write_str(s),
            PropertyValue::Numeric(v) => write!(f, "{}", v),
            PropertyValue::Boolean(b) => write!(f, "{}", b),
            PropertyValue::Unset => Ok(()),
        }
    }
}

impl From<f64> for PropertyValue {
    fn from(v: f64) -> Self {
        PropertyValue::Numeric(v)
    }
}

impl From<bool> for PropertyValue {
    fn from(b: bool) -> Self {
        PropertyValue::Boolean(b)
    }
}

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self {
        PropertyValue::String(s.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(s: String) -> Self {
        PropertyValue::String(s)
    }
}

impl FromStr for PropertyValue {
    type Err = std::convert::Infallible;

    /// Untyped text always parses to `Unknown`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(PropertyValue::Unknown(s.to_string()))
    }
}

fn parse_number(raw: &str) -> Result<f64, ValueError> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| ValueError::InvalidNumber {
            raw: raw.to_string(),
        })
}

fn parse_bool(raw: &str) -> Result<bool, ValueError> {
    let trimmed = raw.trim();
    if trimmed.eq_ignore_ascii_case("true") {
        Ok(true)
    } else if trimmed.eq_ignore_ascii_case("false") {
        Ok(false)
    } else {
        Err(ValueError::InvalidBoolean {
            raw: raw.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_typed_values() {
        assert_eq!(
            PropertyValue::parse(PropertyType::Decimal, "4.7").unwrap(),
            PropertyValue::Numeric(4.7)
        );
        assert_eq!(
            PropertyValue::parse(PropertyType::Integer, " 12 ").unwrap(),
            PropertyValue::Numeric(12.0)
        );
        assert_eq!(
            PropertyValue::parse(PropertyType::Boolean, "True").unwrap(),
            PropertyValue::Boolean(true)
        );
        assert!(matches!(
            PropertyValue::parse(PropertyType::Integer, "1.5"),
            Err(ValueError::InvalidInteger { .. })
        ));
        assert!(matches!(
            PropertyValue::parse(PropertyType::Boolean, "yes"),
            Err(ValueError::InvalidBoolean { .. })
        ));
    }

    #[test]
    fn type_tokens() {
        assert_eq!(PropertyType::from_token("double"), Some(PropertyType::Decimal));
        assert!(PropertyType::is_deprecated_token("double"));
        assert!(!PropertyType::is_deprecated_token("decimal"));
        assert_eq!(PropertyType::from_token("Enum"), Some(PropertyType::Enum));
        assert_eq!(PropertyType::from_token("float"), None);
    }

    #[test]
    fn is_numeric_promotes_permanently() {
        let mut value = PropertyValue::Unknown("4700".into());
        assert!(value.is_numeric());
        assert_eq!(value, PropertyValue::Numeric(4700.0));
        assert_eq!(value.value_type(), ValueType::Numeric);

        let mut text = PropertyValue::Unknown("abc".into());
        assert!(!text.is_numeric());
        assert_eq!(text.value_type(), ValueType::Unknown);
    }

    #[test]
    fn promoted_reports_promotion() {
        let (value, promoted) = PropertyValue::Unknown("3".into()).promoted();
        assert_eq!(value, PropertyValue::Numeric(3.0));
        assert!(promoted);

        let (_, promoted) = PropertyValue::Numeric(3.0).promoted();
        assert!(!promoted);
    }

    #[test]
    fn equality_same_tag_is_symmetric() {
        let pairs = [
            (PropertyValue::from("abc"), PropertyValue::from("ABC"), true),
            (PropertyValue::from("abc"), PropertyValue::from("abd"), false),
            (PropertyValue::from(1.0), PropertyValue::from(1.0), true),
            (PropertyValue::from(1.0), PropertyValue::from(2.0), false),
            (PropertyValue::from(true), PropertyValue::from(false), false),
            (PropertyValue::Unset, PropertyValue::Unset, true),
        ];
        for (a, b, expected) in pairs {
            assert_eq!(a.try_eq(&b).unwrap(), expected, "{a:?} vs {b:?}");
            assert_eq!(b.try_eq(&a).unwrap(), expected, "{b:?} vs {a:?}");
        }
    }

    #[test]
    fn unknown_coerces_to_other_side() {
        let unknown = PropertyValue::Unknown("4700".into());
        assert!(unknown.try_eq(&PropertyValue::Numeric(4700.0)).unwrap());
        assert!(PropertyValue::Numeric(4700.0).try_eq(&unknown).unwrap());

        let once = unknown.coerce_to(ValueType::Numeric).unwrap();
        let twice = once.coerce_to(ValueType::Numeric).unwrap();
        assert_eq!(once.value_type(), twice.value_type());
        assert_eq!(once, twice);

        let flag = PropertyValue::Unknown("TRUE".into());
        assert!(flag.try_eq(&PropertyValue::Boolean(true)).unwrap());
    }

    #[test]
    fn different_concrete_tags_are_incomparable() {
        let err = PropertyValue::Numeric(1.0)
            .try_eq(&PropertyValue::Boolean(true))
            .unwrap_err();
        assert_eq!(
            err,
            ValueError::Incomparable {
                left: ValueType::Numeric,
                right: ValueType::Boolean
            }
        );
        assert!(PropertyValue::Unknown("x".into())
            .try_eq(&PropertyValue::Numeric(1.0))
            .is_err());
    }

    #[test]
    fn ordering_only_for_numbers() {
        let a = PropertyValue::Numeric(1.0);
        let b = PropertyValue::Unknown("2".into());
        assert_eq!(a.try_cmp(&b).unwrap(), Some(Ordering::Less));
        assert_eq!(
            PropertyValue::from("a").try_cmp(&"b".into()).unwrap(),
            None
        );
    }

    #[test]
    fn display_and_emptiness() {
        assert_eq!(PropertyValue::Numeric(4700.0).to_string(), "4700");
        assert_eq!(PropertyValue::Numeric(4.7).to_string(), "4.7");
        assert_eq!(PropertyValue::Boolean(true).to_string(), "true");
        assert_eq!(PropertyValue::Unset.to_string(), "");
        assert!(PropertyValue::Unset.is_empty());
        assert!(PropertyValue::from("").is_empty());
        assert!(!PropertyValue::Numeric(0.0).is_empty());
    }
}
