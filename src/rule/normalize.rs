//! The normalisation pipeline (spec §4.2): rewrites a user-built [`Rule`]
//! graph into a flat [`Bnf`]. The eight documented passes (Activate, Squash
//! extended, Replace extended, Replace or, Replace empty, Flatten, BNF
//! build, Remove forward) are fused into one memoised recursive lowering —
//! `lower_body` performs activation, desugaring and BNF-build in a single
//! walk keyed by a `RuleId -> BnfRuleId` memo table (which also resolves
//! `Forward` cycles), and a separate [`flatten_pass`] afterwards folds away
//! the purely cosmetic single-production/single-term indirections pass 6
//! describes. Net effect matches the documented pass order; see DESIGN.md.

use std::collections::HashMap;
use std::rc::Rc;

use crate::activation::ActivationContext;
use crate::bnf::{Bnf, BnfProduction, BnfRule, BnfRuleId, BnfTerm};
use crate::error::GrammarError;
use crate::predicate::{match_relation, Predicate};
use crate::relation::Relation;
use crate::util::Log;

use super::{Grammar, Rule, RuleId, Term};

struct Lowerer<'g> {
    grammar: &'g Grammar,
    ctx: &'g ActivationContext,
    bnf_rules: Vec<BnfRule>,
    memo: HashMap<RuleId, BnfRuleId>,
    log: &'g Log<String>,
}

impl<'g> Lowerer<'g> {
    fn new(grammar: &'g Grammar, ctx: &'g ActivationContext, log: &'g Log<String>) -> Self {
        Self { grammar, ctx, bnf_rules: Vec::new(), memo: HashMap::new(), log }
    }

    fn push_new_rule_auto(&mut self, productions: Vec<BnfProduction>) -> BnfRuleId {
        let bid = BnfRuleId(self.bnf_rules.len() as u32);
        self.bnf_rules.push(BnfRule { name: format!("R{}", bid.0), productions, interpretator: None, relation: None, pipeline: None });
        bid
    }

    fn push_placeholder(&mut self) -> BnfRuleId {
        self.push_new_rule_auto(Vec::new())
    }

    fn fill(&mut self, id: BnfRuleId, productions: Vec<BnfProduction>) {
        self.bnf_rules[id.0 as usize].productions = productions;
    }

    /// Lower `id`, memoising so a `Forward` cycle or a rule referenced from
    /// several places resolves to the same non-terminal instead of
    /// recursing forever or duplicating work.
    fn lower_ref(&mut self, id: RuleId) -> Result<BnfRuleId, GrammarError> {
        if let Some(&bid) = self.memo.get(&id) {
            return Ok(bid);
        }
        let bid = self.push_placeholder();
        self.memo.insert(id, bid);
        self.lower_body(id, bid)?;
        Ok(bid)
    }

    fn lower_body(&mut self, id: RuleId, bid: BnfRuleId) -> Result<(), GrammarError> {
        match self.grammar.get(id).clone() {
            Rule::Production(prod) => {
                let mut terms = Vec::with_capacity(prod.terms.len());
                for term in &prod.terms {
                    terms.push(self.lower_term(term)?);
                }
                self.fill(bid, vec![BnfProduction { terms, main: prod.main, rank: 0 }]);
            }
            Rule::Or(alts) => {
                let mut productions = Vec::with_capacity(alts.len());
                for (i, alt_id) in alts.iter().enumerate() {
                    let alt_bid = self.lower_ref(*alt_id)?;
                    productions.push(BnfProduction { terms: vec![BnfTerm::NonTerminal(alt_bid)], main: None, rank: i });
                }
                self.fill(bid, productions);
            }
            Rule::Optional(inner) => {
                // Replace extended (spec §4.2 step 3): Optional(x) => or(x, empty).
                let inner_bid = self.lower_ref(inner)?;
                self.log.log_rewrite("replace-extended", &format!("Optional(R{})", inner_bid.0), &format!("or(R{}, empty)", inner_bid.0));
                self.fill(
                    bid,
                    vec![
                        BnfProduction { terms: vec![BnfTerm::NonTerminal(inner_bid)], main: None, rank: 0 },
                        BnfProduction { terms: vec![], main: None, rank: 1 },
                    ],
                );
            }
            Rule::Repeatable { inner, min, max, reverse } => {
                let inner_bid = self.lower_ref(inner)?;
                self.log.log_rewrite(
                    "replace-extended",
                    &format!("Repeatable(R{}, {}..{:?})", inner_bid.0, min, max),
                    &format!("R{} := or(R{}, seq(R{}, R{}))", bid.0, inner_bid.0, inner_bid.0, bid.0),
                );
                let x_term = BnfTerm::NonTerminal(inner_bid);
                let productions = self.build_repeatable(x_term, min, max, reverse);
                self.fill(bid, productions);
            }
            Rule::Named(inner, name) => {
                let inner_bid = self.lower_ref(inner)?;
                self.fill(bid, vec![BnfProduction { terms: vec![BnfTerm::NonTerminal(inner_bid)], main: None, rank: 0 }]);
                self.bnf_rules[bid.0 as usize].name = name;
            }
            Rule::Interpretation(inner, interp) => {
                let inner_bid = self.lower_ref(inner)?;
                self.fill(bid, vec![BnfProduction { terms: vec![BnfTerm::NonTerminal(inner_bid)], main: None, rank: 0 }]);
                self.bnf_rules[bid.0 as usize].interpretator = Some(interp);
            }
            Rule::RelationBound(inner, relation) => self.lower_relation_bound(inner, relation, bid)?,
            Rule::Forward(target) => {
                let target = target.ok_or(GrammarError::UndefinedForward)?;
                let target_bid = self.lower_ref(target)?;
                self.fill(bid, vec![BnfProduction { terms: vec![BnfTerm::NonTerminal(target_bid)], main: None, rank: 0 }]);
            }
            Rule::Empty => {
                self.fill(bid, vec![BnfProduction { terms: vec![], main: None, rank: 0 }]);
            }
            Rule::Pipeline(p) => {
                self.bnf_rules[bid.0 as usize].pipeline = Some(p);
            }
        }
        Ok(())
    }

    /// `.match(relation)`: if the inner rule reduces to nothing more than a
    /// single leaf predicate, push the relation all the way down onto that
    /// predicate (via [`match_relation`]) so the chart parser discovers it
    /// the same way it discovers a predicate-level `.match` composed
    /// directly. Otherwise the relation has to describe a whole subtree
    /// (e.g. `rule(a, b).match(r)`), so it's recorded on this non-terminal
    /// instead; the chart parser registers the production's *main* term
    /// with the relation graph when this rule completes.
    fn lower_relation_bound(&mut self, inner: RuleId, relation: Rc<dyn Relation>, bid: BnfRuleId) -> Result<(), GrammarError> {
        let inner_bid = self.lower_ref(inner)?;
        let collapsible = {
            let r = &self.bnf_rules[inner_bid.0 as usize];
            r.interpretator.is_none()
                && r.relation.is_none()
                && r.pipeline.is_none()
                && r.name == format!("R{}", inner_bid.0)
                && r.productions.len() == 1
                && r.productions[0].terms.len() == 1
                && matches!(r.productions[0].terms[0], BnfTerm::Predicate(_))
        };
        if collapsible {
            if let BnfTerm::Predicate(p) = self.bnf_rules[inner_bid.0 as usize].productions[0].terms[0].clone() {
                let wrapped = match_relation(p, relation);
                self.bnf_rules[inner_bid.0 as usize].productions[0].terms[0] = BnfTerm::Predicate(wrapped);
            }
            self.fill(bid, vec![BnfProduction { terms: vec![BnfTerm::NonTerminal(inner_bid)], main: None, rank: 0 }]);
        } else {
            self.fill(bid, vec![BnfProduction { terms: vec![BnfTerm::NonTerminal(inner_bid)], main: None, rank: 0 }]);
            self.bnf_rules[bid.0 as usize].relation = Some(relation);
        }
        Ok(())
    }

    fn lower_term(&mut self, term: &Term) -> Result<BnfTerm, GrammarError> {
        match term {
            Term::Predicate(p) => {
                p.activate(self.ctx)?;
                Ok(BnfTerm::Predicate(p.clone()))
            }
            Term::Rule(id) => {
                let bid = self.lower_ref(*id)?;
                Ok(BnfTerm::NonTerminal(bid))
            }
        }
    }

    fn build_repeatable(&mut self, x_term: BnfTerm, min: usize, max: Option<usize>, reverse: bool) -> Vec<BnfProduction> {
        match max {
            None => {
                let base_bid = self.build_repeat_unbounded_min1(x_term.clone(), reverse);
                let mut terms = Vec::new();
                for _ in 0..min.saturating_sub(1) {
                    terms.push(x_term.clone());
                }
                terms.push(BnfTerm::NonTerminal(base_bid));
                vec![BnfProduction { terms, main: None, rank: 0 }]
            }
            Some(max) => {
                let extra = max.saturating_sub(min);
                let tail = self.build_tail_optional(x_term.clone(), extra);
                let mut terms = Vec::new();
                for _ in 0..min {
                    terms.push(x_term.clone());
                }
                terms.push(tail);
                vec![BnfProduction { terms, main: None, rank: 0 }]
            }
        }
    }

    /// `temp := or(x, seq(x, temp))` (spec §4.2 step 3). `reverse=true`
    /// puts the single-match alternative first (preferred), `reverse=false`
    /// (greedy) puts the continuing alternative first.
    fn build_repeat_unbounded_min1(&mut self, x_term: BnfTerm, reverse: bool) -> BnfRuleId {
        let bid = self.push_placeholder();
        let self_ref = BnfTerm::NonTerminal(bid);
        let seq_bid = self.push_new_rule_auto(vec![BnfProduction { terms: vec![x_term.clone(), self_ref], main: None, rank: 0 }]);
        let alone_terms = vec![x_term];
        let cont_terms = vec![BnfTerm::NonTerminal(seq_bid)];
        let productions = if reverse {
            vec![
                BnfProduction { terms: alone_terms, main: None, rank: 0 },
                BnfProduction { terms: cont_terms, main: None, rank: 1 },
            ]
        } else {
            vec![
                BnfProduction { terms: cont_terms, main: None, rank: 0 },
                BnfProduction { terms: alone_terms, main: None, rank: 1 },
            ]
        };
        self.fill(bid, productions);
        bid
    }

    /// A fresh non-terminal matching `0..=count` occurrences of `x_term`
    /// (the tail of a bounded repeat, spec §4.2 step 3's "bounded forms
    /// expand to repeated concatenation plus a tail repeatable").
    fn build_tail_optional(&mut self, x_term: BnfTerm, count: usize) -> BnfTerm {
        if count == 0 {
            let bid = self.push_new_rule_auto(vec![BnfProduction { terms: vec![], main: None, rank: 0 }]);
            return BnfTerm::NonTerminal(bid);
        }
        let tail = self.build_tail_optional(x_term.clone(), count - 1);
        let seq_bid = self.push_new_rule_auto(vec![BnfProduction { terms: vec![x_term, tail], main: None, rank: 0 }]);
        let bid = self.push_new_rule_auto(vec![
            BnfProduction { terms: vec![BnfTerm::NonTerminal(seq_bid)], main: None, rank: 0 },
            BnfProduction { terms: vec![], main: None, rank: 1 },
        ]);
        BnfTerm::NonTerminal(bid)
    }
}

/// Fold away purely cosmetic indirection: a non-terminal with exactly one
/// production of exactly one term, carrying no name/interpretator/relation/
/// pipeline of its own, is replaced at every use site by that single term
/// (spec §4.2 step 6). Runs to a fixpoint since each round strictly shortens
/// some reference chain.
fn flatten_pass(bnf: &mut Bnf, log: &Log<String>) {
    loop {
        let flattenable: HashMap<BnfRuleId, BnfTerm> = bnf
            .rules
            .iter()
            .enumerate()
            .filter_map(|(i, r)| {
                let id = BnfRuleId(i as u32);
                if id == bnf.start {
                    return None;
                }
                if r.interpretator.is_some() || r.relation.is_some() || r.pipeline.is_some() {
                    return None;
                }
                if r.name != format!("R{}", i) {
                    return None;
                }
                if r.productions.len() == 1 && r.productions[0].terms.len() == 1 {
                    Some((id, r.productions[0].terms[0].clone()))
                } else {
                    None
                }
            })
            .collect();
        if flattenable.is_empty() {
            break;
        }
        let mut changed = false;
        for rule in bnf.rules.iter_mut() {
            for prod in rule.productions.iter_mut() {
                for term in prod.terms.iter_mut() {
                    if let BnfTerm::NonTerminal(id) = term {
                        if let Some(replacement) = flattenable.get(id) {
                            log.log_rewrite("flatten", &format!("R{}", id.0), &format!("{:?}", replacement));
                            *term = replacement.clone();
                            changed = true;
                        }
                    }
                }
            }
        }
        if !changed {
            break;
        }
    }
}

fn relation_key(relation: &Rc<dyn Relation>) -> usize {
    Rc::as_ptr(relation) as *const () as usize
}

/// Every relation must be bound to exactly two predicates across the
/// normalised grammar (spec §3, §7's "relation used more or fewer than two
/// times" error).
fn check_relation_arity(bnf: &Bnf) -> Result<(), GrammarError> {
    let mut counts: HashMap<usize, (usize, String)> = HashMap::new();
    for rule in &bnf.rules {
        if let Some(relation) = &rule.relation {
            let entry = counts.entry(relation_key(relation)).or_insert((0, relation.label()));
            entry.0 += 1;
        }
        for prod in &rule.productions {
            for term in &prod.terms {
                if let BnfTerm::Predicate(p) = term {
                    collect_relation_predicate_counts(p, &mut counts);
                }
            }
        }
    }
    for (count, label) in counts.into_values() {
        if count != 2 {
            return Err(GrammarError::RelationArity { label, seen: count });
        }
    }
    Ok(())
}

fn collect_relation_predicate_counts(p: &Rc<dyn Predicate>, counts: &mut HashMap<usize, (usize, String)>) {
    let mut current = p.as_relation();
    while let Some(rp) = current {
        let entry = counts.entry(rp.relation_id()).or_insert((0, rp.relation().label()));
        entry.0 += 1;
        current = rp.base().as_relation();
    }
}

/// Normalise the rule graph rooted at `root` into a flat [`Bnf`] (spec §4.2).
pub fn normalize(grammar: &Grammar, root: RuleId, ctx: &ActivationContext) -> Result<Bnf, GrammarError> {
    normalize_with_log(grammar, root, ctx, &Log::None)
}

/// Same as [`normalize`], tracing each "Replace extended"/"Flatten" rewrite
/// through `log` (spec §4.2 steps 3 and 6) when its level permits.
pub fn normalize_with_log(grammar: &Grammar, root: RuleId, ctx: &ActivationContext, log: &Log<String>) -> Result<Bnf, GrammarError> {
    let mut lowerer = Lowerer::new(grammar, ctx, log);
    let start = lowerer.lower_ref(root)?;
    let mut bnf = Bnf { rules: lowerer.bnf_rules, start };
    flatten_pass(&mut bnf, log);
    check_relation_arity(&bnf)?;
    Ok(bnf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::morph::MockMorph;
    use crate::predicate::eq;
    use crate::relation::gnc_relation;
    use crate::rule::builder::{define, empty, forward, or_rule, rule, t, RuleExt};
    use std::rc::Rc;

    fn ctx() -> ActivationContext {
        ActivationContext::new(Rc::new(MockMorph::new()))
    }

    #[test]
    fn plain_production_normalises_to_one_production() {
        let mut g = Grammar::new();
        let r = rule(&mut g, vec![t("a"), t("b")]);
        let bnf = normalize(&g, r, &ctx()).unwrap();
        let root = bnf.get(bnf.start);
        assert_eq!(root.productions.len(), 1);
        assert_eq!(root.productions[0].terms.len(), 2);
    }

    #[test]
    fn optional_desugars_to_two_productions() {
        let mut g = Grammar::new();
        let a = rule(&mut g, vec![t("a")]);
        let opt = a.optional(&mut g);
        let bnf = normalize(&g, opt, &ctx()).unwrap();
        let root = bnf.get(bnf.start);
        assert_eq!(root.productions.len(), 2);
        assert!(root.productions.iter().any(|p| p.terms.is_empty()));
    }

    #[test]
    fn unbounded_repeatable_generates_self_referential_rule() {
        let mut g = Grammar::new();
        let a = rule(&mut g, vec![t("a")]);
        let rep = a.repeatable(&mut g, 1, None, false).unwrap();
        let bnf = normalize(&g, rep, &ctx()).unwrap();
        assert!(bnf.rules.len() >= 2);
    }

    #[test]
    fn forward_cycle_resolves_without_infinite_recursion() {
        let mut g = Grammar::new();
        let fwd = forward(&mut g);
        let a = rule(&mut g, vec![t("a")]);
        let seq = rule(&mut g, vec![t("a"), t(fwd)]);
        let body = or_rule(&mut g, vec![a, seq]);
        define(&mut g, fwd, body);
        let bnf = normalize(&g, fwd, &ctx()).unwrap();
        assert!(!bnf.rules.is_empty());
    }

    #[test]
    fn undefined_forward_is_a_grammar_error() {
        let mut g = Grammar::new();
        let fwd = forward(&mut g);
        let err = normalize(&g, fwd, &ctx()).unwrap_err();
        assert_eq!(err, GrammarError::UndefinedForward);
    }

    #[test]
    fn relation_used_once_is_an_arity_error() {
        let mut g = Grammar::new();
        let a = rule(&mut g, vec![t(eq("саша"))]).match_relation(&mut g, gnc_relation());
        let err = normalize(&g, a, &ctx()).unwrap_err();
        assert!(matches!(err, GrammarError::RelationArity { seen: 1, .. }));
    }

    #[test]
    fn relation_used_twice_normalises_cleanly() {
        let mut g = Grammar::new();
        let rel = gnc_relation();
        let a = rule(&mut g, vec![t(eq("саша"))]).match_relation(&mut g, rel.clone());
        let b = rule(&mut g, vec![t(eq("иванов"))]).match_relation(&mut g, rel);
        let both = rule(&mut g, vec![t(a), t(b)]);
        assert!(normalize(&g, both, &ctx()).is_ok());
    }

    #[test]
    fn empty_rule_normalises_to_zero_term_production() {
        let mut g = Grammar::new();
        let e = empty(&mut g);
        let bnf = normalize(&g, e, &ctx()).unwrap();
        assert!(bnf.get(bnf.start).productions[0].terms.is_empty());
    }
}
