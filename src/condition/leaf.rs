//! Condition leaves and the two leaf dialects
//!
//! Both dialects share `$name` (not empty) and `$name OP value`. Format
//! versions before 1.2 write orientation checks as `_horizontal` and have no
//! negation of properties; from 1.2 on, `!$name` means empty and
//! `!$name==value` negates a comparison, and `_state` is gone. `$horizontal`
//! names the orientation in every version.

use std::fmt;

use crate::condition::ConditionContext;
use crate::errors::ConditionFormatError;
use crate::log::warn;
use crate::types::{FormatVersion, Orientation};
use crate::value::PropertyValue;

/// How a property is compared against a condition's value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConditionComparison {
    Equal,
    NotEqual,
    Less,
    LessOrEqual,
    Greater,
    GreaterOrEqual,
    Empty,
    NotEmpty,
}

impl ConditionComparison {
    /// The comparison that holds whenever this one does not, for numeric
    /// operands.
    pub fn negated(self) -> Self {
        use ConditionComparison::*;
        match self {
            Equal => NotEqual,
            NotEqual => Equal,
            Less => GreaterOrEqual,
            GreaterOrEqual => Less,
            LessOrEqual => Greater,
            Greater => LessOrEqual,
            Empty => NotEmpty,
            NotEmpty => Empty,
        }
    }

    fn operator(self) -> &'static str {
        use ConditionComparison::*;
        match self {
            Equal => "==",
            NotEqual => "!=",
            Less => "<",
            LessOrEqual => "<=",
            Greater => ">",
            GreaterOrEqual => ">=",
            Empty | NotEmpty => "",
        }
    }
}

/// Component states a condition can test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConditionState {
    Horizontal,
}

impl ConditionState {
    fn from_name(name: &str) -> Option<Self> {
        name.eq_ignore_ascii_case("horizontal")
            .then_some(ConditionState::Horizontal)
    }
}

/// A leaf of a condition tree.
#[derive(Debug, Clone, PartialEq)]
pub enum ConditionLeaf {
    /// The component is (or is not) in the given state
    State { state: ConditionState, expected: bool },
    /// A property compared against a value
    Property {
        name: String,
        comparison: ConditionComparison,
        value: PropertyValue,
    },
}

impl ConditionLeaf {
    pub fn is_met(&self, context: &dyn ConditionContext) -> bool {
        match self {
            ConditionLeaf::State {
                state: ConditionState::Horizontal,
                expected,
            } => (context.orientation() == Orientation::Horizontal) == *expected,
            ConditionLeaf::Property {
                name,
                comparison,
                value,
            } => property_is_met(&context.property(name), *comparison, value, name),
        }
    }
}

fn property_is_met(
    actual: &PropertyValue,
    comparison: ConditionComparison,
    expected: &PropertyValue,
    name: &str,
) -> bool {
    use ConditionComparison::*;
    match comparison {
        Empty => actual.is_empty(),
        NotEmpty => !actual.is_empty(),
        Equal | NotEqual => match actual.try_eq(expected) {
            Ok(equal) => equal == (comparison == Equal),
            Err(err) => {
                warn!("condition on `{}` treated as unmet: {}", name, err);
                false
            }
        },
        Less | LessOrEqual | Greater | GreaterOrEqual => match actual.try_cmp(expected) {
            Ok(Some(ordering)) => match comparison {
                Less => ordering.is_lt(),
                LessOrEqual => ordering.is_le(),
                Greater => ordering.is_gt(),
                _ => ordering.is_ge(),
            },
            Ok(None) => false,
            Err(err) => {
                warn!("condition on `{}` treated as unmet: {}", name, err);
                false
            }
        },
    }
}

impl fmt::Display for ConditionLeaf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConditionLeaf::State {
                state: ConditionState::Horizontal,
                expected,
            } => write!(f, "$horizontal=={}", expected),
            ConditionLeaf::Property {
                name,
                comparison: ConditionComparison::NotEmpty,
                ..
            } => write!(f, "${}", name),
            ConditionLeaf::Property {
                name,
                comparison: ConditionComparison::Empty,
                ..
            } => write!(f, "!${}", name),
            ConditionLeaf::Property {
                name,
                comparison,
                value,
            } => {
                let text = value.to_string();
                if needs_quotes(&text) {
                    write!(f, "${}{}\"{}\"", name, comparison.operator(), text)
                } else {
                    write!(f, "${}{}{}", name, comparison.operator(), text)
                }
            }
        }
    }
}

fn needs_quotes(text: &str) -> bool {
    text.is_empty()
        || text
            .chars()
            .any(|c| c.is_whitespace() || "()&|\"!=<>".contains(c))
}

// ============================================================================
// Leaf parsing
// ============================================================================

/// Parse one symbol token. `start` is the symbol's offset in `src`, used for
/// error spans.
pub(crate) fn parse_leaf(
    symbol: &str,
    start: usize,
    src: &str,
    version: FormatVersion,
) -> Result<ConditionLeaf, ConditionFormatError> {
    let end = start + symbol.len();
    let error = |message: &str, from: usize| ConditionFormatError::new(message, src, start + from, end);

    let (negated, body, body_at) = match symbol.strip_prefix('!') {
        Some(rest) => {
            let trimmed = rest.trim_start();
            (true, trimmed, symbol.len() - trimmed.len())
        }
        None => (false, symbol, 0),
    };

    if let Some(state) = body.strip_prefix('_') {
        if !version.uses_state_underscores() {
            return Err(error(
                "state conditions are written `$horizontal` from format 1.2",
                0,
            ));
        }
        let state = ConditionState::from_name(state.trim())
            .ok_or_else(|| error("unknown state", body_at))?;
        return Ok(ConditionLeaf::State {
            state,
            expected: !negated,
        });
    }

    let Some(rest) = body.strip_prefix('$') else {
        let expected = if version.uses_state_underscores() {
            "expected `$property` or `_state`"
        } else {
            "expected `$property`"
        };
        return Err(error(expected, body_at));
    };

    if negated && version.uses_state_underscores() {
        return Err(error("negated property conditions need format 1.2", 0));
    }

    let name_len = rest
        .find(|c: char| !(c.is_alphanumeric() || c == '_'))
        .unwrap_or(rest.len());
    if name_len == 0 {
        return Err(error("missing property name", body_at));
    }
    let name = &rest[..name_len];
    let after_name = &rest[name_len..];
    let op_at = body_at + 1 + name_len + (after_name.len() - after_name.trim_start().len());
    let after_name = after_name.trim_start();

    let state = ConditionState::from_name(name);

    if after_name.is_empty() {
        return Ok(match state {
            Some(state) => ConditionLeaf::State {
                state,
                expected: !negated,
            },
            None => ConditionLeaf::Property {
                name: name.to_string(),
                comparison: if negated {
                    ConditionComparison::Empty
                } else {
                    ConditionComparison::NotEmpty
                },
                value: PropertyValue::Unset,
            },
        });
    }

    let (comparison, op_len) = parse_operator(after_name).ok_or_else(|| error("unknown operator", op_at))?;
    let raw_value = after_name[op_len..].trim();
    let value = parse_value(raw_value).ok_or_else(|| error("missing value", op_at))?;

    if let Some(state) = state {
        let compared = match (comparison, value.as_bool()) {
            (ConditionComparison::Equal, Some(b)) => b,
            (ConditionComparison::NotEqual, Some(b)) => !b,
            (ConditionComparison::Equal | ConditionComparison::NotEqual, None) => {
                return Err(error("state conditions compare with `true` or `false`", op_at));
            }
            _ => return Err(error("state conditions only support `==` and `!=`", op_at)),
        };
        return Ok(ConditionLeaf::State {
            state,
            expected: compared != negated,
        });
    }

    Ok(ConditionLeaf::Property {
        name: name.to_string(),
        comparison: if negated { comparison.negated() } else { comparison },
        value,
    })
}

fn parse_operator(text: &str) -> Option<(ConditionComparison, usize)> {
    use ConditionComparison::*;
    const OPERATORS: &[(&str, ConditionComparison)] = &[
        ("==", Equal),
        ("!=", NotEqual),
        ("<=", LessOrEqual),
        (">=", GreaterOrEqual),
        ("<", Less),
        (">", Greater),
    ];
    OPERATORS
        .iter()
        .find(|(op, _)| text.starts_with(op))
        .map(|(op, comparison)| (*comparison, op.len()))
}

/// Comparison operands stay untyped until promoted against a property.
fn parse_value(raw: &str) -> Option<PropertyValue> {
    if raw.len() >= 2 && raw.starts_with('"') && raw.ends_with('"') {
        return Some(PropertyValue::Unknown(raw[1..raw.len() - 1].to_string()));
    }
    if raw.is_empty() || raw.starts_with('"') || raw.ends_with('"') {
        return None;
    }
    Some(PropertyValue::Unknown(raw.to_string()))
}
