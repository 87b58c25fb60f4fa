//! Cross-token morphological agreement relations (spec §3, §4.6), grounded
//! on `yargy/relations/bank.py` and `yargy/relations/constructors.py`.

pub mod graph;

use std::collections::BTreeSet;
use std::fmt::Debug;
use std::rc::Rc;

use crate::morph::{case_agrees, gender_agrees, gnc_agrees, number_agrees};

pub use graph::RelationGraph;

/// A decidable agreement test between the grammeme sets of two tokens bound
/// to the same relation occurrence.
pub trait Relation: Debug {
    fn agrees(&self, a: &BTreeSet<String>, b: &BTreeSet<String>) -> bool;
    fn label(&self) -> String;
}

macro_rules! grams_relation {
    ($name:ident, $ctor:ident, $f:path, $label:literal) => {
        #[derive(Debug)]
        pub struct $name;

        impl Relation for $name {
            fn agrees(&self, a: &BTreeSet<String>, b: &BTreeSet<String>) -> bool {
                $f(a, b)
            }

            fn label(&self) -> String {
                $label.to_string()
            }
        }

        /// Construct a fresh relation instance. Every call yields a distinct
        /// occurrence group: binding it to multiple predicates in a rule (via
        /// [`crate::predicate::RelationPredicate`]) is what links them.
        pub fn $ctor() -> Rc<dyn Relation> {
            Rc::new($name)
        }
    };
}

grams_relation!(GenderRelation, gender_relation, gender_agrees, "gender_relation");
grams_relation!(NumberRelation, number_relation, number_agrees, "number_relation");
grams_relation!(CaseRelation, case_relation, case_agrees, "case_relation");
grams_relation!(GncRelation, gnc_relation, gnc_agrees, "gnc_relation");

#[derive(Debug)]
pub struct AndRelation(Vec<Rc<dyn Relation>>);

#[derive(Debug)]
pub struct OrRelation(Vec<Rc<dyn Relation>>);

#[derive(Debug)]
pub struct NotRelation(Rc<dyn Relation>);

impl Relation for AndRelation {
    fn agrees(&self, a: &BTreeSet<String>, b: &BTreeSet<String>) -> bool {
        self.0.iter().all(|r| r.agrees(a, b))
    }

    fn label(&self) -> String {
        format!("and_rel({})", self.0.iter().map(|r| r.label()).collect::<Vec<_>>().join(", "))
    }
}

impl Relation for OrRelation {
    fn agrees(&self, a: &BTreeSet<String>, b: &BTreeSet<String>) -> bool {
        self.0.iter().any(|r| r.agrees(a, b))
    }

    fn label(&self) -> String {
        format!("or_rel({})", self.0.iter().map(|r| r.label()).collect::<Vec<_>>().join(", "))
    }
}

impl Relation for NotRelation {
    fn agrees(&self, a: &BTreeSet<String>, b: &BTreeSet<String>) -> bool {
        !self.0.agrees(a, b)
    }

    fn label(&self) -> String {
        format!("not_rel({})", self.0.label())
    }
}

pub fn and_rel(relations: impl IntoIterator<Item = Rc<dyn Relation>>) -> Rc<dyn Relation> {
    Rc::new(AndRelation(relations.into_iter().collect()))
}

pub fn or_rel(relations: impl IntoIterator<Item = Rc<dyn Relation>>) -> Rc<dyn Relation> {
    Rc::new(OrRelation(relations.into_iter().collect()))
}

pub fn not_rel(relation: Rc<dyn Relation>) -> Rc<dyn Relation> {
    Rc::new(NotRelation(relation))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grams(tags: &[&str]) -> BTreeSet<String> {
        tags.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn gnc_relation_rejects_case_mismatch() {
        let rel = gnc_relation();
        let adj = grams(&["ADJF", "masc", "nomn", "sing"]);
        let noun = grams(&["NOUN", "masc", "accs", "sing"]);
        assert!(!rel.agrees(&adj, &noun));
    }

    #[test]
    fn not_rel_inverts() {
        let rel = not_rel(case_relation());
        let nomn = grams(&["NOUN", "masc", "nomn", "sing"]);
        let accs = grams(&["NOUN", "masc", "accs", "sing"]);
        assert!(rel.agrees(&nomn, &accs));
    }
}
