//! yarus is a rule-based information extraction engine for Russian text.
//!
//! # Overview
//! A user declares a context-free grammar whose terminals are token
//! predicates (lexical, morphological, or dictionary tests) and whose
//! non-terminals may carry interpretation annotations (how a matched span
//! maps into a structured fact) and agreement relations (cross-token
//! morphological constraints such as gender/number/case concord). The
//! engine tokenises and morphologically analyses raw text, runs a chart
//! parser over the grammar, enforces agreement relations on candidate
//! parses, resolves overlapping matches by coverage, and reduces each
//! surviving parse tree to a user-defined fact with normalised field
//! values.
//!
//! # Design
//! Grammar construction ([`rule`]) builds a small arena of tagged rule
//! variants (concatenation, alternation, optional, repeat, forward
//! reference, relation binding, interpretation, pipeline). Normalisation
//! ([`rule::normalize`]) lowers that arena into a flat [`bnf`] grammar with
//! no wrapper variants left, over which [`chart`] runs a predict/scan/
//! complete Earley parser. Agreement is tracked per candidate parse in a
//! [`relation::RelationGraph`] that narrows at every bound token and is
//! merged on every completion; a parse whose graph becomes unsatisfiable
//! is discarded. [`tree`] reduces a completed parse down to a
//! [`interpretation::Fact`], and [`resolver`] picks the maximal
//! non-overlapping subset of candidate matches a caller asked for.
//! [`parser::Parser`] wires all of this into the public `match`/`findall`/
//! `extract` surface.
//!
//! # Example
//! ```
//! use std::rc::Rc;
//! use yarus::interpretation::{attribute, FactSchema, Interpretator};
//! use yarus::morph::MockMorph;
//! use yarus::parser::Parser;
//! use yarus::predicate::eq;
//! use yarus::rule::{rule, t, Grammar, RuleExt};
//!
//! let mut g = Grammar::new();
//! let name = rule(&mut g, vec![t(eq("саша"))]).interpretation(&mut g, Interpretator::Attribute("name".into()));
//! let root = rule(&mut g, vec![t(name)]);
//! let schema = FactSchema::new("Person", vec![attribute("name")]);
//! let root = root.interpretation(&mut g, Interpretator::Fact(schema));
//!
//! let morph = Rc::new(MockMorph::default());
//! let parser = Parser::new(&g, root, morph).unwrap();
//! let matched = parser.r#match("саша").unwrap().unwrap();
//! assert_eq!(matched.fact().unwrap().as_fact().unwrap().text("name"), Some("саша"));
//! ```
//!
//! # License
//! yarus is provided under the MIT license.

pub mod activation;
pub mod bnf;
pub mod chart;
pub mod error;
mod fact_macro;
pub mod interpretation;
pub mod morph;
pub mod parser;
pub mod pipeline;
pub mod predicate;
pub mod relation;
pub mod resolver;
pub mod rule;
pub mod span;
pub mod token;
pub mod tokenizer;
pub mod tree;
pub mod util;

pub use parser::{Match, Parser};
