//! The predict/scan/complete engine (spec §4.4), operating over the flat
//! [`crate::bnf::Bnf`] produced by [`crate::rule::normalize`].

use std::collections::BTreeSet;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use crate::bnf::{Bnf, BnfRuleId, BnfTerm};
use crate::pipeline::Pipeline;
use crate::predicate::Predicate;
use crate::relation::RelationGraph;
use crate::token::Token;
use crate::util::Log;

use super::{Chart, ChartNode, State};

/// Run the chart parser over `tokens` against `bnf`, predicting the start
/// rule at every position so matches can begin anywhere in the input (spec
/// §4.4's `all=true` predict variant — this engine always wants it, since
/// both `.match()` and `.findall()` scan for matches at arbitrary offsets).
pub fn parse(bnf: &Bnf, tokens: &[Token], log: &Log<String>) -> Chart {
    let n = tokens.len();
    let mut chart = Chart::new(n);

    for c in 0..=n {
        predict(bnf, tokens, &mut chart, c, bnf.start, log);

        let mut i = 0;
        while i < chart.columns[c].states.len() {
            let state = chart.columns[c].states[i].clone();
            let bnf_rule = bnf.get(state.rule);
            let term_count = bnf_rule.productions[state.production].terms.len();

            if state.dot >= term_count {
                let rank = bnf_rule.productions[state.production].rank;
                let node = ChartNode::Node { rule: state.rule, production: state.production, rank, children: state.children.clone() };
                if let Some(relations) = apply_rule_relation(bnf, state.rule, &node, state.relations.clone()) {
                    if state.rule == bnf.start && relations.satisfiable() {
                        chart.matches.push(node.clone());
                    }
                    if state.start == c {
                        chart.columns[c].record_empty_completion(state.rule, node.clone(), relations.clone());
                    }
                    complete_rule(bnf, &mut chart, state.rule, state.start, c, node, relations, log);
                }
            } else {
                match &bnf_rule.productions[state.production].terms[state.dot] {
                    BnfTerm::NonTerminal(r) => {
                        predict(bnf, tokens, &mut chart, c, *r, log);
                        chart.columns[c].register_wait(*r, i);
                        for (node, relations) in chart.columns[c].empty_completions_for(*r) {
                            complete_waiter(bnf, &mut chart, &state, node, relations, c, log);
                        }
                    }
                    BnfTerm::Predicate(p) => {
                        if c < n {
                            scan(bnf, tokens, &mut chart, c, i, p.clone(), log);
                        }
                    }
                }
            }
            i += 1;
        }
    }

    chart
}

fn predict(bnf: &Bnf, tokens: &[Token], chart: &mut Chart, c: usize, rule: BnfRuleId, log: &Log<String>) {
    if !chart.columns[c].mark_predicted(rule) {
        return;
    }
    let bnf_rule = bnf.get(rule);

    if bnf_rule.is_pipeline() {
        let pipeline = bnf_rule.pipeline.as_ref().expect("pipeline rule carries a pipeline");
        for (stop, matched) in run_pipeline(pipeline.as_ref(), tokens, c) {
            let node = ChartNode::PipelineMatch { tokens: matched };
            if let Some(relations) = apply_rule_relation(bnf, rule, &node, RelationGraph::new()) {
                log.log_transition("pipeline", c, &format!("{} [{}, {})", bnf_rule.name, c, stop));
                if rule == bnf.start && relations.satisfiable() {
                    chart.matches.push(node.clone());
                }
                complete_rule(bnf, chart, rule, c, stop, node, relations, log);
            }
        }
        return;
    }

    for (p_idx, _prod) in bnf_rule.productions.iter().enumerate() {
        let state = State { rule, production: p_idx, dot: 0, start: c, stop: c, children: Vec::new(), relations: RelationGraph::new() };
        let hash = structural_hash(&state.children);
        if chart.columns[c].insert(state, hash).is_some() {
            log.log_transition("predict", c, &format!("{}#{}", bnf_rule.name, p_idx));
        }
    }
}

fn scan(bnf: &Bnf, tokens: &[Token], chart: &mut Chart, c: usize, state_index: usize, predicate: Rc<dyn Predicate>, log: &Log<String>) {
    let _ = bnf;
    let state = chart.columns[c].states[state_index].clone();
    let token = &tokens[c];
    if !predicate.test(token) {
        return;
    }
    let constrained = predicate.constrain(token.clone());
    let relations = match apply_relation_layers(&predicate, token, &constrained, state.relations.clone()) {
        Some(r) => r,
        None => return,
    };

    let mut children = state.children.clone();
    children.push(ChartNode::Leaf { predicate: predicate.clone(), token: constrained });
    let new_state = State { rule: state.rule, production: state.production, dot: state.dot + 1, start: state.start, stop: c + 1, children, relations };
    let hash = structural_hash(&new_state.children);
    if chart.columns[c + 1].insert(new_state, hash).is_some() {
        log.log_transition("scan", c + 1, &predicate.label());
    }
}

fn complete_rule(bnf: &Bnf, chart: &mut Chart, rule: BnfRuleId, start: usize, stop: usize, node: ChartNode, relations: RelationGraph, log: &Log<String>) {
    let waiting = chart.columns[start].waiting_on(rule);
    for w_idx in waiting {
        let parent = chart.columns[start].states[w_idx].clone();
        complete_waiter(bnf, chart, &parent, node.clone(), relations.clone(), stop, log);
    }
}

/// Advance a single waiting parent state past the just-completed `node`.
/// Factored out of [`complete_rule`] so a late-registering waiter on a
/// rule that already completed earlier in this same column (two
/// occurrences of the same nullable rule in one production) can be
/// advanced the same way as an on-time waiter.
fn complete_waiter(bnf: &Bnf, chart: &mut Chart, parent: &State, node: ChartNode, relations: RelationGraph, stop: usize, log: &Log<String>) {
    let merged = match parent.relations.merge(&relations) {
        Some(m) => m,
        None => return,
    };
    let mut children = parent.children.clone();
    children.push(node);
    let new_state = State { rule: parent.rule, production: parent.production, dot: parent.dot + 1, start: parent.start, stop, children, relations: merged };
    let hash = structural_hash(&new_state.children);
    if chart.columns[stop].insert(new_state, hash).is_some() {
        log.log_transition("complete", stop, &format!("{} (advance)", bnf.get(parent.rule).name));
    }
}

/// Walk a leaf predicate's `as_relation()` → `base()` chain, binding every
/// relation layer it carries against `token`'s span and `constrained`'s
/// surviving forms, narrowing `relations` at each step.
fn apply_relation_layers(predicate: &Rc<dyn Predicate>, token: &Token, constrained: &Token, relations: RelationGraph) -> Option<RelationGraph> {
    match predicate.as_relation() {
        Some(rp) => {
            let forms: Vec<BTreeSet<String>> = constrained.forms.iter().map(|f| f.grams.clone()).collect();
            let next = relations.add(rp.relation_id(), rp.relation(), token.span, &forms)?;
            apply_relation_layers(rp.base(), token, constrained, next)
        }
        None => Some(relations),
    }
}

/// Bind a rule-level relation (spec §4.5's fallback for a `RelationBound`
/// rule the normaliser couldn't collapse onto a single leaf) using the
/// completed production's main term as the representative side.
fn apply_rule_relation(bnf: &Bnf, rule: BnfRuleId, node: &ChartNode, relations: RelationGraph) -> Option<RelationGraph> {
    let bnf_rule = bnf.get(rule);
    let relation = match &bnf_rule.relation {
        Some(r) => r,
        None => return Some(relations),
    };
    let (production, children) = match node {
        ChartNode::Node { production, children, .. } => (*production, children),
        _ => return Some(relations),
    };
    let main_idx = bnf_rule.productions[production].main?;
    let main_node = children.get(main_idx)?;
    let forms = collect_forms(main_node);
    if forms.is_empty() {
        return Some(relations);
    }
    let relation_id = Rc::as_ptr(relation) as *const () as usize;
    relations.add(relation_id, relation, main_node.span(), &forms)
}

fn collect_forms(node: &ChartNode) -> Vec<BTreeSet<String>> {
    match node {
        ChartNode::Leaf { token, .. } => token.forms.iter().map(|f| f.grams.clone()).collect(),
        ChartNode::PipelineMatch { .. } => Vec::new(),
        ChartNode::Node { children, .. } => children.iter().flat_map(collect_forms).collect(),
    }
}

/// Walk every accepted prefix of a dictionary pipeline starting at `start`,
/// returning `(stop, matched_tokens)` for each one (spec §4.3's pipeline
/// rules can accept a short entry and keep extending towards a longer one).
fn run_pipeline(pipeline: &dyn Pipeline, tokens: &[Token], start: usize) -> Vec<(usize, Vec<Token>)> {
    let mut accum: Vec<Token> = Vec::new();
    let mut results = Vec::new();
    let mut pos = start;

    while pos < tokens.len() {
        let token = &tokens[pos];
        match pipeline.step(&accum, token) {
            Some(step) => {
                accum.push(token.clone());
                pos += 1;
                if step.accepted {
                    results.push((pos, accum.clone()));
                }
                if !step.continues {
                    break;
                }
            }
            None => break,
        }
    }
    results
}

fn hash_node(node: &ChartNode, hasher: &mut impl Hasher) {
    match node {
        ChartNode::Leaf { predicate, token } => {
            0u8.hash(hasher);
            predicate.label().hash(hasher);
            token.span.start.hash(hasher);
            token.span.stop.hash(hasher);
        }
        ChartNode::PipelineMatch { tokens } => {
            1u8.hash(hasher);
            for t in tokens {
                t.span.start.hash(hasher);
                t.span.stop.hash(hasher);
            }
        }
        ChartNode::Node { rule, production, rank, children } => {
            2u8.hash(hasher);
            rule.0.hash(hasher);
            production.hash(hasher);
            rank.hash(hasher);
            for c in children {
                hash_node(c, hasher);
            }
        }
    }
}

fn structural_hash(children: &[ChartNode]) -> u64 {
    let mut hasher = DefaultHasher::new();
    for child in children {
        hash_node(child, &mut hasher);
    }
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activation::ActivationContext;
    use crate::morph::MockMorph;
    use crate::predicate::eq;
    use crate::rule::{normalize, rule, t, Grammar};
    use crate::span::Span;
    use crate::token::TokenType;

    fn tok(value: &str, start: usize) -> Token {
        Token::new(value, Span::new(start, start + value.chars().count()), TokenType::RussianWord)
    }

    fn ctx() -> ActivationContext {
        ActivationContext::new(Rc::new(MockMorph::default()))
    }

    #[test]
    fn matches_a_two_token_literal_rule() {
        let mut g = Grammar::new();
        let root = rule(&mut g, vec![t(eq("саша")), t(eq("иди"))]);
        g.set_start(root);
        let ctx = ctx();
        let bnf = normalize(&g, root, &ctx).unwrap();

        let tokens = vec![tok("саша", 0), tok("иди", 5)];
        let chart = parse(&bnf, &tokens, &Log::None);
        assert_eq!(chart.matches.len(), 1);
        assert_eq!(chart.matches[0].span(), Span::new(0, 8));
    }

    #[test]
    fn same_nullable_rule_referenced_twice_in_one_production_still_completes() {
        use crate::rule::RuleExt;

        let mut g = Grammar::new();
        let opt = rule(&mut g, vec![t(eq("саша"))]).optional(&mut g);
        let root = rule(&mut g, vec![t(opt), t(opt), t(eq("иди"))]);
        g.set_start(root);
        let ctx = ctx();
        let bnf = normalize(&g, root, &ctx).unwrap();

        // Both optional occurrences go unmatched; only the trailing
        // literal is present. The second occurrence's wait on the shared
        // nullable non-terminal registers after the first occurrence's
        // empty completion already fired in this column.
        let tokens = vec![tok("иди", 0)];
        let chart = parse(&bnf, &tokens, &Log::None);
        assert_eq!(chart.matches.len(), 1);
        assert_eq!(chart.matches[0].span(), Span::new(0, 3));
    }

    #[test]
    fn no_match_when_tokens_dont_fit_any_production() {
        let mut g = Grammar::new();
        let root = rule(&mut g, vec![t(eq("саша"))]);
        g.set_start(root);
        let ctx = ctx();
        let bnf = normalize(&g, root, &ctx).unwrap();

        let tokens = vec![tok("дима", 0)];
        let chart = parse(&bnf, &tokens, &Log::None);
        assert!(chart.matches.is_empty());
    }
}
