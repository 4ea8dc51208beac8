//! Condition trees

use std::fmt;

use crate::condition::ConditionContext;
use crate::condition::leaf::ConditionLeaf;
use crate::value::{PropertyType, PropertyValue};

/// A boolean expression over a component's properties and orientation.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ConditionTree {
    /// Always true
    #[default]
    Empty,
    Leaf(ConditionLeaf),
    And(Box<ConditionTree>, Box<ConditionTree>),
    Or(Box<ConditionTree>, Box<ConditionTree>),
}

impl ConditionTree {
    /// Conjunction, folding away always-true operands.
    pub fn and(self, other: ConditionTree) -> ConditionTree {
        match (self, other) {
            (ConditionTree::Empty, other) => other,
            (this, ConditionTree::Empty) => this,
            (this, other) => ConditionTree::And(Box::new(this), Box::new(other)),
        }
    }

    /// Disjunction, collapsing to always-true when either side is.
    pub fn or(self, other: ConditionTree) -> ConditionTree {
        match (self, other) {
            (ConditionTree::Empty, _) | (_, ConditionTree::Empty) => ConditionTree::Empty,
            (this, other) => ConditionTree::Or(Box::new(this), Box::new(other)),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, ConditionTree::Empty)
    }

    pub fn is_met(&self, context: &dyn ConditionContext) -> bool {
        match self {
            ConditionTree::Empty => true,
            ConditionTree::Leaf(leaf) => leaf.is_met(context),
            ConditionTree::And(left, right) => left.is_met(context) && right.is_met(context),
            ConditionTree::Or(left, right) => left.is_met(context) || right.is_met(context),
        }
    }

    /// Leaves in left-to-right order.
    pub fn leaves(&self) -> Vec<&ConditionLeaf> {
        let mut out = Vec::new();
        self.collect_leaves(&mut out);
        out
    }

    fn collect_leaves<'a>(&'a self, out: &mut Vec<&'a ConditionLeaf>) {
        match self {
            ConditionTree::Empty => {}
            ConditionTree::Leaf(leaf) => out.push(leaf),
            ConditionTree::And(left, right) | ConditionTree::Or(left, right) => {
                left.collect_leaves(out);
                right.collect_leaves(out);
            }
        }
    }

    /// Canonical form used to decide whether two conditions are the same.
    ///
    /// AND and OR chains are flattened, always-true operands are dropped
    /// from AND chains, an OR chain with an always-true operand becomes
    /// always-true, duplicates are removed and operands are ordered by their
    /// text. The result is rebuilt left-deep.
    pub fn simplify(&self) -> ConditionTree {
        match self {
            ConditionTree::Empty | ConditionTree::Leaf(_) => self.clone(),
            ConditionTree::And(..) => {
                let mut operands = Vec::new();
                self.flatten(Chain::And, &mut operands);
                operands.retain(|o| !o.is_empty());
                rebuild(operands, ConditionTree::and)
            }
            ConditionTree::Or(..) => {
                let mut operands = Vec::new();
                self.flatten(Chain::Or, &mut operands);
                if operands.iter().any(ConditionTree::is_empty) {
                    return ConditionTree::Empty;
                }
                rebuild(operands, ConditionTree::or)
            }
        }
    }

    fn flatten(&self, chain: Chain, out: &mut Vec<ConditionTree>) {
        match (chain, self) {
            (Chain::And, ConditionTree::And(left, right)) | (Chain::Or, ConditionTree::Or(left, right)) => {
                left.flatten(chain, out);
                right.flatten(chain, out);
            }
            _ => {
                let simplified = self.simplify();
                match (chain, &simplified) {
                    (Chain::And, ConditionTree::And(..)) | (Chain::Or, ConditionTree::Or(..)) => {
                        simplified.flatten(chain, out)
                    }
                    _ => out.push(simplified),
                }
            }
        }
    }

    /// Whether two conditions have the same canonical form.
    pub fn is_equivalent(&self, other: &ConditionTree) -> bool {
        self.simplify().to_string() == other.simplify().to_string()
    }

    /// Promote untyped comparison values to the type of the property they
    /// are compared with. Returns the names of properties whose values did
    /// not convert; those values stay untyped.
    pub fn promote_values(&mut self, property_type: &dyn Fn(&str) -> Option<PropertyType>) -> Vec<String> {
        let mut failed = Vec::new();
        self.promote_into(property_type, &mut failed);
        failed
    }

    fn promote_into(&mut self, property_type: &dyn Fn(&str) -> Option<PropertyType>, failed: &mut Vec<String>) {
        match self {
            ConditionTree::Empty => {}
            ConditionTree::Leaf(ConditionLeaf::Property { name, value, .. }) => {
                if !matches!(value, PropertyValue::Unknown(_)) {
                    return;
                }
                let Some(ty) = property_type(name) else {
                    return;
                };
                match value.coerce_to(ty.value_type()) {
                    Ok(promoted) => *value = promoted,
                    Err(_) => failed.push(name.clone()),
                }
            }
            ConditionTree::Leaf(ConditionLeaf::State { .. }) => {}
            ConditionTree::And(left, right) | ConditionTree::Or(left, right) => {
                left.promote_into(property_type, failed);
                right.promote_into(property_type, failed);
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Chain {
    And,
    Or,
}

fn rebuild(mut operands: Vec<ConditionTree>, join: fn(ConditionTree, ConditionTree) -> ConditionTree) -> ConditionTree {
    let mut keyed: Vec<(String, ConditionTree)> = operands.drain(..).map(|o| (o.to_string(), o)).collect();
    keyed.sort_by(|a, b| a.0.cmp(&b.0));
    keyed.dedup_by(|a, b| a.0 == b.0);
    keyed
        .into_iter()
        .map(|(_, tree)| tree)
        .reduce(join)
        .unwrap_or_default()
}

impl From<ConditionLeaf> for ConditionTree {
    fn from(leaf: ConditionLeaf) -> Self {
        ConditionTree::Leaf(leaf)
    }
}

impl fmt::Display for ConditionTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConditionTree::Empty => Ok(()),
            ConditionTree::Leaf(leaf) => write!(f, "{}", leaf),
            ConditionTree::And(left, right) => write!(f, "({} && {})", left, right),
            ConditionTree::Or(left, right) => write!(f, "({} || {})", left, right),
        }
    }
}
