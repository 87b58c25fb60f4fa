//! Parse-tree reduction (spec §4.6), grounded on the teacher's
//! `ASTNode`/`TreeItem` printing idiom (`src/ast_node.rs`).
//!
//! Spec §4.6 describes two separate rewrite passes over the tree
//! (propagate-empty, then keep-interpretation-only) before the bottom-up
//! `interpret` reduction. This module fuses all three into one recursive
//! walk, the same fusion decision [`crate::rule::normalize`] makes for the
//! BNF normalisation passes: a node with no interpretator simply forwards
//! its children's reductions to its parent rather than wrapping them,
//! which is the propagate-empty and keep-interpretation-only passes'
//! combined net effect without needing an intermediate tree
//! representation to rewrite in place.

use std::borrow::Cow;

use crate::bnf::Bnf;
use crate::chart::ChartNode;
use crate::error::InterpretationError;
use crate::interpretation::{interpret, Reduction};

/// Reduce every child of `node` and, if `node`'s rule carries an
/// interpretator, fold them through it; otherwise forward them unchanged
/// (the hoist described in spec §4.6's "keep-interpretation-only" pass).
fn reduce(node: &ChartNode, bnf: &Bnf) -> Result<Vec<Reduction>, InterpretationError> {
    match node {
        ChartNode::Leaf { token, .. } => Ok(vec![Reduction::Tokens(vec![token.clone()])]),
        ChartNode::PipelineMatch { tokens } => Ok(vec![Reduction::Tokens(tokens.clone())]),
        ChartNode::Node { rule, children, .. } => {
            let mut reduced = Vec::new();
            for child in children {
                reduced.extend(reduce(child, bnf)?);
            }
            match &bnf.get(*rule).interpretator {
                Some(interpretator) => Ok(vec![interpret(interpretator, node.span(), reduced)?]),
                None => Ok(reduced),
            }
        }
    }
}

/// Reduce a completed start-rule tree to its single top-level result (spec
/// §4.6: "the root must bear an interpretator"). A tree whose root yields
/// zero or more than one surviving reduction after hoisting violates that
/// invariant and fails this one match, per spec §4.4-§4.6's per-match
/// failure semantics.
pub fn reduce_match(node: &ChartNode, bnf: &Bnf) -> Result<Reduction, InterpretationError> {
    let mut reductions = reduce(node, bnf)?;
    if reductions.len() != 1 {
        return Err(InterpretationError::RootNotInterpreted);
    }
    Ok(reductions.remove(0))
}

impl ptree::TreeItem for ChartNode {
    type Child = Self;

    fn write_self<W: std::io::Write>(&self, f: &mut W, style: &ptree::Style) -> std::io::Result<()> {
        let label = match self {
            ChartNode::Leaf { predicate, token } => format!("{} #{:?}", predicate.label(), token.value),
            ChartNode::PipelineMatch { tokens } => {
                format!("pipeline[{}]", tokens.iter().map(|t| t.value.as_str()).collect::<Vec<_>>().join(" "))
            }
            ChartNode::Node { rule, production, rank, .. } => format!("R{}#{} (rank {})", rule.0, production, rank),
        };
        write!(f, "{}", style.paint(label))
    }

    fn children(&self) -> Cow<[Self::Child]> {
        match self {
            ChartNode::Node { children, .. } => Cow::from(children),
            _ => Cow::Owned(Vec::new()),
        }
    }
}

/// Print a match's raw chart tree to stdout (debugging aid, grounded on the
/// teacher's `ASTNode::print`).
pub fn print_tree(node: &ChartNode) -> std::io::Result<()> {
    ptree::print_tree(node)
}
