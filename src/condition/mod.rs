//! Condition expression language
//!
//! Conditions gate render groups, connection groups, flags and property
//! formats. They are written as attribute text, for example
//! `$type==npn && !$label`, and parsed into a [`ConditionTree`] which is then
//! evaluated against a [`ConditionContext`] (usually a component instance).

mod leaf;
mod parser;
mod tokenizer;
mod tree;

use std::str::FromStr;

pub use leaf::{ConditionComparison, ConditionLeaf, ConditionState};
pub use tokenizer::{Token, TokenKind, tokenize};
pub use tree::ConditionTree;

use crate::errors::ConditionFormatError;
use crate::types::{FormatVersion, Orientation};
use crate::value::PropertyValue;

/// The live state a condition is evaluated against.
pub trait ConditionContext {
    /// Current value of the named property, [`PropertyValue::Unset`] if the
    /// component has no such property.
    fn property(&self, name: &str) -> PropertyValue;

    fn orientation(&self) -> Orientation;
}

impl ConditionTree {
    /// Parse condition text in the dialect of the given format version.
    /// Empty text is the always-true condition.
    pub fn parse(text: &str, version: FormatVersion) -> Result<ConditionTree, ConditionFormatError> {
        parser::parse_condition(text, version)
    }
}

impl FromStr for ConditionTree {
    type Err = ConditionFormatError;

    /// Parses in the current dialect.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ConditionTree::parse(s, FormatVersion::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Oriented(Orientation);

    impl ConditionContext for Oriented {
        fn property(&self, _name: &str) -> PropertyValue {
            PropertyValue::Unset
        }

        fn orientation(&self) -> Orientation {
            self.0
        }
    }

    #[test]
    fn horizontal_check_in_every_dialect() {
        for version in [FormatVersion::V1_0, FormatVersion::V1_1, FormatVersion::V1_2] {
            let tree = ConditionTree::parse("$horizontal==true", version).unwrap();
            assert!(tree.is_met(&Oriented(Orientation::Horizontal)));
            assert!(!tree.is_met(&Oriented(Orientation::Vertical)));
        }

        let legacy = ConditionTree::parse("!_horizontal", FormatVersion::V1_1).unwrap();
        assert!(legacy.is_met(&Oriented(Orientation::Vertical)));
    }

    #[test]
    fn from_str_uses_modern_dialect() {
        assert!("!$label".parse::<ConditionTree>().is_ok());
        assert!("_horizontal".parse::<ConditionTree>().is_err());
    }

    #[test]
    fn missing_property_is_empty() {
        let tree: ConditionTree = "!$anything".parse().unwrap();
        assert!(tree.is_met(&Oriented(Orientation::Horizontal)));
    }
}
