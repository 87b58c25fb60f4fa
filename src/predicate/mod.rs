//! Token predicates: the terminals of the grammar (spec §3, §4.1).

mod bank;
mod relation_predicate;

pub use bank::*;
pub use relation_predicate::{match_relation, RelationPredicate};

use std::fmt::Debug;
use std::rc::Rc;

use crate::activation::ActivationContext;
use crate::error::GrammarError;
use crate::token::Token;

/// A decidable boolean test on a single token.
///
/// `constrain` narrows a morph token's form list in place (e.g. [`Gram`]
/// reduces the form set to the forms carrying the requested grammeme); the
/// default never widens it, satisfying the crate-wide narrowing invariant.
pub trait Predicate: Debug {
    fn test(&self, token: &Token) -> bool;

    fn constrain(&self, token: Token) -> Token {
        token
    }

    /// Validate this predicate against the tokeniser/morphology context
    /// (unknown grammemes, unknown token types). Runs once, during grammar
    /// activation, before any parsing.
    fn activate(&self, _ctx: &ActivationContext) -> Result<(), GrammarError> {
        Ok(())
    }

    fn label(&self) -> String;

    /// Downcast to [`RelationPredicate`] without `Any`: a leaf can be
    /// wrapped in several of these (`p.match(r1).match(r2)`), so the chart
    /// parser walks `as_relation()` → `base()` to collect every relation
    /// layer before falling through to the innermost plain predicate.
    fn as_relation(&self) -> Option<&RelationPredicate> {
        None
    }
}

/// A predicate built by `and`-ing together a set of sub-predicates.
///
/// Narrowing composes: each sub-predicate's `constrain` runs in sequence,
/// so an `and_(gram('NOUN'), not_(gram('femn')))` progressively narrows the
/// surviving form list rather than only the first predicate's constraint.
#[derive(Debug)]
pub struct AndPredicate(Vec<Rc<dyn Predicate>>);

#[derive(Debug)]
pub struct OrPredicate(Vec<Rc<dyn Predicate>>);

#[derive(Debug)]
pub struct NotPredicate(Rc<dyn Predicate>);

impl Predicate for AndPredicate {
    fn test(&self, token: &Token) -> bool {
        self.0.iter().all(|p| p.test(token))
    }

    fn constrain(&self, token: Token) -> Token {
        self.0.iter().fold(token, |t, p| p.constrain(t))
    }

    fn activate(&self, ctx: &ActivationContext) -> Result<(), GrammarError> {
        self.0.iter().try_for_each(|p| p.activate(ctx))
    }

    fn label(&self) -> String {
        format!("and_({})", self.0.iter().map(|p| p.label()).collect::<Vec<_>>().join(", "))
    }
}

impl Predicate for OrPredicate {
    fn test(&self, token: &Token) -> bool {
        self.0.iter().any(|p| p.test(token))
    }

    fn activate(&self, ctx: &ActivationContext) -> Result<(), GrammarError> {
        self.0.iter().try_for_each(|p| p.activate(ctx))
    }

    fn label(&self) -> String {
        format!("or_({})", self.0.iter().map(|p| p.label()).collect::<Vec<_>>().join(", "))
    }
}

impl Predicate for NotPredicate {
    fn test(&self, token: &Token) -> bool {
        !self.0.test(token)
    }

    fn activate(&self, ctx: &ActivationContext) -> Result<(), GrammarError> {
        self.0.activate(ctx)
    }

    fn label(&self) -> String {
        format!("not_({})", self.0.label())
    }
}

/// `and_(p1, p2, ...)`: every sub-predicate must match.
pub fn and_(predicates: impl IntoIterator<Item = Rc<dyn Predicate>>) -> Rc<dyn Predicate> {
    Rc::new(AndPredicate(predicates.into_iter().collect()))
}

/// `or_(p1, p2, ...)`: at least one sub-predicate must match.
pub fn or_(predicates: impl IntoIterator<Item = Rc<dyn Predicate>>) -> Rc<dyn Predicate> {
    Rc::new(OrPredicate(predicates.into_iter().collect()))
}

/// `not_(p)`: negate a predicate.
pub fn not_(predicate: Rc<dyn Predicate>) -> Rc<dyn Predicate> {
    Rc::new(NotPredicate(predicate))
}
