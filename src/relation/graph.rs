//! Persistent snapshots of relation bindings accumulated during a parse,
//! grounded on `yargy/relations/graph.py`'s `RelationsGraph`.
//!
//! A chart state carries one [`RelationGraph`] snapshot. Every operation
//! returns a new snapshot (or `None`/a poisoned one) rather than mutating
//! `self`, so sibling chart branches that forked from a common ancestor
//! never observe each other's bindings.

use std::collections::{BTreeSet, HashMap};
use std::rc::Rc;

use crate::relation::Relation;
use crate::span::Span;

/// One token's surviving morphological analyses, keyed by its span. Forms
/// only ever shrink: narrowing never re-admits a form it already dropped.
#[derive(Debug, Clone)]
struct Node {
    forms: Vec<BTreeGrams>,
}

type BTreeGrams = BTreeSet<String>;

/// One relation occurrence: up to two distinct bound spans. Which span was
/// seen first doesn't matter for a symmetric agreement test, so this tracks
/// an unordered set rather than numbered sides.
#[derive(Debug, Clone, Default)]
struct Edge {
    relation: Option<Rc<dyn Relation>>,
    spans: BTreeSet<Span>,
    /// Number of direct [`RelationGraph::add`] calls against this edge
    /// within one derivation branch (not summed across `merge`, since a
    /// merge's two inputs may share add-call history from a common
    /// ancestor). Reaching two calls that named the *same* span is the
    /// "same token on both sides" ill-formed configuration (spec's Open
    /// Questions); reaching it via two *different* spans is the normal,
    /// well-formed completion of a two-occurrence relation.
    add_calls: u8,
}

#[derive(Debug, Clone, Default)]
pub struct RelationGraph {
    nodes: HashMap<Span, Node>,
    edges: HashMap<usize, Edge>,
    /// Set once the same span has been bound twice within one derivation
    /// branch for one relation occurrence — ill-formed per the redesign
    /// note, the whole snapshot is then permanently unsatisfiable rather
    /// than silently dropping a side.
    poisoned: bool,
}

impl RelationGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cheap functional copy (spec §4.5): callers branch the returned value
    /// freely without affecting `self`.
    pub fn copy(&self) -> Self {
        self.clone()
    }

    /// Bind `forms` (the token's current surviving analyses, as grammeme
    /// sets) to `relation_id` at `span`. Runs `eval` once both sides of the
    /// relation occurrence are populated, narrowing both nodes' form lists.
    /// Returns `None` if narrowing empties a node (unsatisfiable).
    pub fn add(&self, relation_id: usize, relation: &Rc<dyn Relation>, span: Span, forms: &[BTreeGrams]) -> Option<RelationGraph> {
        if self.poisoned {
            return None;
        }
        let mut next = self.clone();
        next.nodes.entry(span).or_insert_with(|| Node { forms: forms.to_vec() });

        let edge = next.edges.entry(relation_id).or_default();
        edge.relation.get_or_insert_with(|| relation.clone());
        let is_new_span = edge.spans.insert(span);
        edge.add_calls += 1;
        if is_new_span && edge.spans.len() > 2 {
            return None;
        }

        if edge.add_calls >= 2 && edge.spans.len() == 1 {
            next.poisoned = true;
            return Some(next);
        }
        if edge.spans.len() == 2 {
            if !next.eval(relation_id) {
                return None;
            }
        }
        Some(next)
    }

    /// Re-run the relation's agreement test for both endpoints of `relation_id`,
    /// narrowing each side's form list to forms that agree with *some* form on
    /// the other side. Returns `false` if either side becomes empty.
    fn eval(&mut self, relation_id: usize) -> bool {
        let edge = self.edges.get(&relation_id).expect("eval called on a populated edge").clone();
        if edge.spans.len() < 2 {
            return true;
        }
        let mut it = edge.spans.iter().copied();
        let span_a = it.next().unwrap();
        let span_b = it.next().unwrap();
        let relation = edge.relation.expect("populated edge carries a relation");

        let forms_a = self.nodes.get(&span_a).expect("node for bound span").forms.clone();
        let forms_b = self.nodes.get(&span_b).expect("node for bound span").forms.clone();

        let narrowed_a: Vec<_> = forms_a.iter().filter(|fa| forms_b.iter().any(|fb| relation.agrees(fa, fb))).cloned().collect();
        let narrowed_b: Vec<_> = forms_b.iter().filter(|fb| forms_a.iter().any(|fa| relation.agrees(fa, fb))).cloned().collect();

        if narrowed_a.is_empty() || narrowed_b.is_empty() {
            return false;
        }

        self.nodes.get_mut(&span_a).unwrap().forms = narrowed_a;
        self.nodes.get_mut(&span_b).unwrap().forms = narrowed_b;
        true
    }

    /// Union nodes and edges from `other` into a new graph, re-running
    /// `eval` on every edge both snapshots know about so narrowing from one
    /// branch propagates to the other. `None` if the union is unsatisfiable.
    pub fn merge(&self, other: &RelationGraph) -> Option<RelationGraph> {
        if self.poisoned || other.poisoned {
            return None;
        }
        let mut merged = self.clone();
        for (span, node) in &other.nodes {
            merged.nodes.entry(*span).or_insert_with(|| node.clone());
        }
        let mut touched = Vec::new();
        for (id, edge) in &other.edges {
            let entry = merged.edges.entry(*id).or_default();
            entry.relation.get_or_insert_with(|| edge.relation.clone().expect("populated edge carries a relation"));
            for span in &edge.spans {
                entry.spans.insert(*span);
            }
            if entry.spans.len() > 2 {
                return None;
            }
            touched.push(*id);
        }
        for id in touched {
            if !merged.eval(id) {
                return None;
            }
        }
        Some(merged)
    }

    /// Whether this snapshot is internally consistent. `add`/`merge` already
    /// reject contradictions eagerly except for the same-token-twice case,
    /// which this surfaces via the poison flag.
    pub fn satisfiable(&self) -> bool {
        !self.poisoned
    }

    #[cfg(test)]
    fn forms_of(&self, span: Span) -> Option<&[BTreeGrams]> {
        self.nodes.get(&span).map(|n| n.forms.as_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relation::gnc_relation;

    fn grams(tags: &[&str]) -> BTreeGrams {
        tags.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn add_rejects_conflicting_binding() {
        let rel = gnc_relation();
        let graph = RelationGraph::new();
        let graph = graph.add(0, &rel, Span::new(0, 1), &[grams(&["ADJF", "masc", "nomn", "sing"])]).unwrap();
        let conflict = graph.add(0, &rel, Span::new(2, 3), &[grams(&["NOUN", "masc", "accs", "sing"])]);
        assert!(conflict.is_none());
    }

    #[test]
    fn add_accepts_and_narrows_agreeing_binding() {
        let rel = gnc_relation();
        let graph = RelationGraph::new();
        let graph = graph
            .add(0, &rel, Span::new(0, 1), &[grams(&["ADJF", "masc", "nomn", "sing"]), grams(&["ADJF", "neut", "ablt", "sing"])])
            .unwrap();
        let graph = graph.add(0, &rel, Span::new(2, 3), &[grams(&["NOUN", "masc", "nomn", "sing"])]).unwrap();
        assert_eq!(graph.forms_of(Span::new(0, 1)).unwrap().len(), 1);
        assert!(graph.satisfiable());
    }

    #[test]
    fn same_token_on_both_sides_is_poisoned() {
        let rel = gnc_relation();
        let graph = RelationGraph::new();
        let graph = graph.add(0, &rel, Span::new(0, 1), &[grams(&["ADJF", "masc", "nomn", "sing"])]).unwrap();
        let graph = graph.add(0, &rel, Span::new(0, 1), &[grams(&["ADJF", "masc", "nomn", "sing"])]).unwrap();
        assert!(!graph.satisfiable());
    }

    #[test]
    fn unrelated_slots_do_not_interfere() {
        let rel = gnc_relation();
        let graph = RelationGraph::new();
        let graph = graph.add(0, &rel, Span::new(0, 1), &[grams(&["ADJF", "masc", "nomn", "sing"])]).unwrap();
        let graph = graph.add(1, &rel, Span::new(4, 5), &[grams(&["NOUN", "femn", "gent", "sing"])]).unwrap();
        assert!(graph.satisfiable());
    }

    #[test]
    fn copy_does_not_alias_mutations() {
        let rel = gnc_relation();
        let graph = RelationGraph::new();
        let snapshot = graph.copy();
        let _ = graph.add(0, &rel, Span::new(0, 1), &[grams(&["ADJF", "masc", "nomn", "sing"])]).unwrap();
        assert!(snapshot.nodes.is_empty());
    }

    #[test]
    fn merge_propagates_narrowing_across_branches() {
        let rel = gnc_relation();
        let left = RelationGraph::new()
            .add(0, &rel, Span::new(0, 1), &[grams(&["ADJF", "masc", "nomn", "sing"]), grams(&["ADJF", "femn", "nomn", "sing"])])
            .unwrap();
        let right = RelationGraph::new().add(0, &rel, Span::new(2, 3), &[grams(&["NOUN", "femn", "nomn", "sing"])]).unwrap();
        let merged = left.merge(&right).unwrap();
        assert_eq!(merged.forms_of(Span::new(0, 1)).unwrap().len(), 1);
    }
}
