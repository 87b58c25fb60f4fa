use std::collections::BTreeSet;
use std::fmt::{Debug, Formatter};
use std::rc::Rc;

use crate::morph::Morph;
use crate::span::Span;

/// The closed, extensible set of token categories the tokeniser emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TokenType {
    RussianWord,
    LatinWord,
    Integer,
    Punctuation,
    LineBreak,
    Other,
}

impl TokenType {
    pub fn name(&self) -> &'static str {
        match self {
            TokenType::RussianWord => "RU",
            TokenType::LatinWord => "LATIN",
            TokenType::Integer => "INT",
            TokenType::Punctuation => "PUNCT",
            TokenType::LineBreak => "EOL",
            TokenType::Other => "OTHER",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "RU" => Some(TokenType::RussianWord),
            "LATIN" => Some(TokenType::LatinWord),
            "INT" => Some(TokenType::Integer),
            "PUNCT" => Some(TokenType::Punctuation),
            "EOL" => Some(TokenType::LineBreak),
            "OTHER" => Some(TokenType::Other),
            _ => None,
        }
    }
}

/// One morphological analysis of a token: a lemma plus a set of grammemes.
///
/// `inflect` is bound to the [`Morph`] handle that produced the form, the
/// Rust rendition of the source's `Form.inflect(grams)` method (spec §6)
/// without resorting to a process-wide singleton (spec §9's "global
/// morphology singleton" redesign flag).
#[derive(Clone)]
pub struct Form {
    pub lemma: String,
    pub grams: BTreeSet<String>,
    word: String,
    morph: Rc<dyn Morph>,
}

impl Form {
    pub fn new(lemma: impl Into<String>, grams: BTreeSet<String>, word: impl Into<String>, morph: Rc<dyn Morph>) -> Self {
        Self { lemma: lemma.into(), grams, word: word.into(), morph }
    }

    pub fn has_gram(&self, gram: &str) -> bool {
        self.grams.contains(gram)
    }

    /// Inflect this form's lemma to the target grammeme set.
    pub fn inflect(&self, target: &BTreeSet<String>) -> Option<String> {
        self.morph.raw_inflect(&self.lemma, &self.grams, &self.word, target)
    }
}

impl Debug for Form {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Form").field("lemma", &self.lemma).field("grams", &self.grams).finish()
    }
}

impl PartialEq for Form {
    fn eq(&self, other: &Self) -> bool {
        self.lemma == other.lemma && self.grams == other.grams
    }
}

/// An immutable token produced by the tokeniser.
///
/// `forms` is empty for a plain (non-morphological) token; a *morph token*
/// per spec §3 is simply a [`Token`] whose `forms` is non-empty. `tag` is
/// the optional single tag symbol of a *tagged token*.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub value: String,
    pub span: Span,
    pub token_type: TokenType,
    pub forms: Vec<Form>,
    pub tag: Option<Rc<str>>,
}

impl Token {
    pub fn new(value: impl Into<String>, span: Span, token_type: TokenType) -> Self {
        Self { value: value.into(), span, token_type, forms: Vec::new(), tag: None }
    }

    pub fn with_forms(mut self, forms: Vec<Form>) -> Self {
        self.forms = forms;
        self
    }

    pub fn with_tag(mut self, tag: impl Into<Rc<str>>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn is_morph(&self) -> bool {
        !self.forms.is_empty()
    }

    /// Replace `forms` with a narrowed copy. Per spec's narrowing invariant,
    /// callers must only ever pass a subset of the current forms.
    pub fn constrained(&self, forms: Vec<Form>) -> Token {
        debug_assert!(forms.len() <= self.forms.len());
        let mut token = self.clone();
        token.forms = forms;
        token
    }
}
