//! The morphology contract (spec §6) and its default adapters.
//!
//! [`Morph`] is deliberately small: `parse`/`normalized`/`check_gram` plus
//! the raw primitive backing [`crate::token::Form::inflect`]. The core
//! engine only ever depends on this trait, never on a concrete analyser,
//! which is how spec §9's "global morphology singleton" redesign flag is
//! honoured — a [`std::rc::Rc<dyn Morph>`] handle is threaded explicitly
//! through [`crate::parser::Parser::new`] instead.

mod cache;
mod grams;
mod mock;

pub use cache::CachedMorph;
pub use grams::{case_agrees, gender_agrees, gnc_agrees, number_agrees};
pub use mock::MockMorph;

use std::collections::BTreeSet;
use std::fmt::Debug;
use std::rc::Rc;

use crate::error::GrammarError;
use crate::token::Form;

/// A morphological analyser: lemmatiser, grammeme tagger and inflector.
pub trait Morph: Debug {
    /// Every morphological analysis of `word`, most likely interpretation
    /// first, as `(lemma, grammemes)` pairs.
    fn raw_parse(&self, word: &str) -> Vec<(String, BTreeSet<String>)>;

    /// The set of distinct lemmas `word` could normalise to.
    fn normalized(&self, word: &str) -> BTreeSet<String>;

    /// Validate that `gram` is a grammeme this analyser knows about.
    fn check_gram(&self, gram: &str) -> Result<(), GrammarError>;

    /// Inflect the form identified by `(lemma, source_grams)` (as analysed
    /// from `word`) to the `target` grammeme set, if possible.
    fn raw_inflect(
        &self,
        lemma: &str,
        source_grams: &BTreeSet<String>,
        word: &str,
        target: &BTreeSet<String>,
    ) -> Option<String>;
}

/// Parse `word` against `morph`, wrapping each raw analysis into a [`Form`]
/// bound back to the analyser handle that produced it.
pub fn parse(morph: &Rc<dyn Morph>, word: &str) -> Vec<Form> {
    morph
        .raw_parse(word)
        .into_iter()
        .map(|(lemma, grams)| Form::new(lemma, grams, word, morph.clone()))
        .collect()
}
