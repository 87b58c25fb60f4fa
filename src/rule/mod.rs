//! The grammar construction algebra (spec §3, §4.1): a tagged sum type
//! living in an arena, replacing the teacher's `Rc<dyn IProduction>` object
//! graph per the redesign note in spec §9 — wrapper variants hold a
//! [`RuleId`] rather than a pointer, so a `Forward` cycle is plain data.

mod builder;
mod normalize;

pub use builder::{define, empty, forward, or_rule, pipeline_rule, rule, rule_with_main, t, Grammar, IntoTerm, RuleExt};
pub use normalize::{normalize, normalize_with_log};

use std::rc::Rc;

use crate::interpretation::Interpretator;
use crate::pipeline::Pipeline;
use crate::predicate::Predicate;
use crate::relation::Relation;

/// Index into a [`Grammar`]'s rule arena. Cheap, `Copy`, and what every
/// wrapper variant points at instead of an `Rc`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RuleId(pub(crate) u32);

/// One element of a production: either a terminal test or a reference to
/// another rule in the arena.
#[derive(Debug, Clone)]
pub enum Term {
    Predicate(Rc<dyn Predicate>),
    Rule(RuleId),
}

/// An ordered list of terms, with an optional designated *main* term (the
/// semantic head consulted when a relation needs a representative side).
#[derive(Debug, Clone, Default)]
pub struct Production {
    pub terms: Vec<Term>,
    pub main: Option<usize>,
}

impl Production {
    pub fn new(terms: Vec<Term>) -> Self {
        Self { terms, main: None }
    }

    pub fn with_main(mut self, index: usize) -> Self {
        self.main = Some(index);
        self
    }
}

/// One node of the pre-normalised rule graph (spec §3's `Rule` sum type).
#[derive(Debug, Clone)]
pub enum Rule {
    /// An ordered list of terms (`rule(a, b, c)`).
    Production(Production),
    /// `or_(r1, r2, ...)`.
    Or(Vec<RuleId>),
    /// `.optional()`.
    Optional(RuleId),
    /// `.repeatable(min, max, reverse)`; `max = None` means unbounded.
    Repeatable { inner: RuleId, min: usize, max: Option<usize>, reverse: bool },
    /// `.named(name)`.
    Named(RuleId, String),
    /// `.interpretation(target)`.
    Interpretation(RuleId, Interpretator),
    /// `.match(relation)`.
    RelationBound(RuleId, Rc<dyn Relation>),
    /// `forward()` / `.define(rule)`.
    Forward(Option<RuleId>),
    /// The empty production (matches without consuming any token).
    Empty,
    /// A dictionary/phrase-joiner pipeline rule.
    Pipeline(Rc<dyn Pipeline>),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predicate::eq;

    #[test]
    fn grammar_stores_rules_by_id() {
        let mut g = Grammar::new();
        let a = g.push(Rule::Production(Production::new(vec![Term::Predicate(eq("a"))])));
        assert!(matches!(g.get(a), Rule::Production(_)));
    }
}
