//! Flat BNF grammar (spec §4.3): the output of [`crate::rule::normalize`],
//! consumed only by the chart parser. No `Or`/`Optional`/`Repeatable`/
//! `Forward` survive here — every rule is a plain list of productions.

use std::rc::Rc;

use crate::interpretation::Interpretator;
use crate::pipeline::Pipeline;
use crate::predicate::Predicate;
use crate::relation::Relation;

/// Index into a [`Bnf`]'s rule list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BnfRuleId(pub(crate) u32);

/// One element of a flat production: a leaf predicate or a reference to
/// another BNF non-terminal.
#[derive(Debug, Clone)]
pub enum BnfTerm {
    Predicate(Rc<dyn Predicate>),
    NonTerminal(BnfRuleId),
}

/// One alternative of a [`BnfRule`]. `rank` is this production's declared
/// order within its rule — the resolver's deterministic tie-break (spec
/// §4.4, §4.7).
#[derive(Debug, Clone)]
pub struct BnfProduction {
    pub terms: Vec<BnfTerm>,
    pub main: Option<usize>,
    pub rank: usize,
}

/// One non-terminal of the normalised grammar.
#[derive(Debug)]
pub struct BnfRule {
    pub name: String,
    pub productions: Vec<BnfProduction>,
    pub interpretator: Option<Interpretator>,
    /// Set when this non-terminal's match must register against `relation`
    /// using its main term as the representative side (spec §4.5); only
    /// populated when the normaliser couldn't push the relation all the way
    /// down onto a single leaf predicate (see `rule::normalize`'s
    /// `RelationBound` handling).
    pub relation: Option<Rc<dyn Relation>>,
    /// Set for a dictionary/phrase-joiner rule; such a rule has no ordinary
    /// productions; the chart parser consults the pipeline directly instead
    /// of predicting over `productions` (spec §4.3's predictive index for
    /// pipeline rules). Each [`Pipeline`] implementation keeps its own
    /// first-token index (by exact value, case-folded value, or lemma set)
    /// built once at construction, since the tokeniser's value isn't known
    /// until parse time — the index can't live in `Bnf` itself the way a
    /// static lexeme-level dispatch table would.
    pub pipeline: Option<Rc<dyn Pipeline>>,
}

impl BnfRule {
    pub fn is_pipeline(&self) -> bool {
        self.pipeline.is_some()
    }
}

/// A complete flat grammar plus its start non-terminal.
#[derive(Debug)]
pub struct Bnf {
    pub rules: Vec<BnfRule>,
    pub start: BnfRuleId,
}

impl Bnf {
    pub fn get(&self, id: BnfRuleId) -> &BnfRule {
        &self.rules[id.0 as usize]
    }
}
