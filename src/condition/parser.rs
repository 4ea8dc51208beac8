//! Shunting-yard condition parser
//!
//! Tokens are converted to reverse Polish notation and the RPN is folded
//! into a binary tree. `&&` and `||` share one precedence level and are left
//! associative, with one exception: closing a bracket also pops an `&&`
//! waiting directly beneath it. Existing descriptions depend on that, so
//! `$a && ($b) || $c` parses as `($a && $b) || $c`, while `$a && $b || $c`
//! parses as `$a && ($b || $c)`.

use crate::condition::leaf::{ConditionLeaf, parse_leaf};
use crate::condition::tokenizer::{Token, TokenKind, tokenize};
use crate::condition::tree::ConditionTree;
use crate::errors::ConditionFormatError;
use crate::types::FormatVersion;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operator {
    And,
    Or,
}

#[derive(Debug)]
enum Rpn {
    Leaf(ConditionLeaf),
    Op(Operator, usize, usize),
}

#[derive(Debug, Clone, Copy)]
enum Pending {
    Open(usize),
    Op(Operator, usize, usize),
}

/// Parse condition text written in the dialect of `version`.
pub fn parse_condition(src: &str, version: FormatVersion) -> Result<ConditionTree, ConditionFormatError> {
    let tokens = tokenize(src);
    let rpn = to_rpn(src, &tokens, version)?;
    to_tree(src, rpn)
}

fn to_rpn(src: &str, tokens: &[Token<'_>], version: FormatVersion) -> Result<Vec<(Rpn, usize)>, ConditionFormatError> {
    let mut output: Vec<(Rpn, usize)> = Vec::new();
    let mut stack: Vec<Pending> = Vec::new();

    for token in tokens {
        match token.kind {
            TokenKind::Symbol => {
                let leaf = parse_leaf(token.text, token.start, src, version)?;
                output.push((Rpn::Leaf(leaf), token.start));
            }
            TokenKind::Open => stack.push(Pending::Open(token.start)),
            TokenKind::Close => {
                loop {
                    match stack.pop() {
                        Some(Pending::Open(_)) => break,
                        Some(Pending::Op(op, start, end)) => output.push((Rpn::Op(op, start, end), start)),
                        None => {
                            return Err(ConditionFormatError::new(
                                "unmatched `)`",
                                src,
                                token.start,
                                token.end,
                            ));
                        }
                    }
                }
                if let Some(Pending::Op(Operator::And, start, end)) = stack.last().copied() {
                    stack.pop();
                    output.push((Rpn::Op(Operator::And, start, end), start));
                }
            }
            TokenKind::And => {
                while let Some(Pending::Op(op, start, end)) = stack.last().copied() {
                    stack.pop();
                    output.push((Rpn::Op(op, start, end), start));
                }
                stack.push(Pending::Op(Operator::And, token.start, token.end));
            }
            TokenKind::Or => {
                while let Some(Pending::Op(Operator::Or, start, end)) = stack.last().copied() {
                    stack.pop();
                    output.push((Rpn::Op(Operator::Or, start, end), start));
                }
                stack.push(Pending::Op(Operator::Or, token.start, token.end));
            }
        }
    }

    while let Some(pending) = stack.pop() {
        match pending {
            Pending::Open(start) => {
                return Err(ConditionFormatError::new("unmatched `(`", src, start, start + 1));
            }
            Pending::Op(op, start, end) => output.push((Rpn::Op(op, start, end), start)),
        }
    }

    Ok(output)
}

fn to_tree(src: &str, rpn: Vec<(Rpn, usize)>) -> Result<ConditionTree, ConditionFormatError> {
    let mut operands: Vec<(ConditionTree, usize)> = Vec::new();

    for (item, at) in rpn {
        match item {
            Rpn::Leaf(leaf) => operands.push((ConditionTree::Leaf(leaf), at)),
            Rpn::Op(op, start, end) => {
                let (Some((right, _)), Some((left, left_at))) = (operands.pop(), operands.pop()) else {
                    return Err(ConditionFormatError::new("missing operand", src, start, end));
                };
                let node = match op {
                    Operator::And => ConditionTree::And(Box::new(left), Box::new(right)),
                    Operator::Or => ConditionTree::Or(Box::new(left), Box::new(right)),
                };
                operands.push((node, left_at));
            }
        }
    }

    match operands.len() {
        0 => Ok(ConditionTree::Empty),
        1 => Ok(operands.pop().map(|(tree, _)| tree).unwrap_or_default()),
        _ => {
            let at = operands[1].1;
            Err(ConditionFormatError::new("missing operator", src, at, src.len()))
        }
    }
}
