//! Value normalisers (spec §4.6): `normalized()`, `inflected(grams)`,
//! `const_()`, `custom()`, grounded on `yargy/interpretation/normalizer.py`.

use std::collections::BTreeSet;
use std::fmt::{Debug, Formatter};
use std::rc::Rc;

use crate::error::InterpretationError;
use crate::token::Token;

use super::Value;

/// A scalar-producing transform applied during tree reduction. Consumes
/// either a chain of leaf tokens (the common case — a matched word span) or
/// an already-reduced [`Value`] handed up from a nested interpretator.
#[derive(Clone)]
pub enum Normalizer {
    /// Join each token's lemma (its first form's lemma, or its raw value for
    /// a non-morph token), inserting a space wherever two tokens' spans
    /// aren't adjacent in the source.
    Normalized,
    /// Inflect each morph token's first form to `grams`, falling back to the
    /// token's raw value when it carries no forms or can't be inflected.
    Inflected(BTreeSet<String>),
    /// Ignore the input entirely, always emit `value`.
    Const(String),
    /// Apply `f` to the joined raw token text, or to an upstream `Value`.
    Custom(Rc<dyn Fn(&str) -> String>),
}

impl Debug for Normalizer {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Normalizer::Normalized => write!(f, "normalized()"),
            Normalizer::Inflected(grams) => write!(f, "inflected({:?})", grams),
            Normalizer::Const(v) => write!(f, "const_({:?})", v),
            Normalizer::Custom(_) => write!(f, "custom(<fn>)"),
        }
    }
}

pub fn normalized() -> Normalizer {
    Normalizer::Normalized
}

pub fn inflected(grams: impl IntoIterator<Item = impl Into<String>>) -> Normalizer {
    Normalizer::Inflected(grams.into_iter().map(Into::into).collect())
}

pub fn const_(value: impl Into<String>) -> Normalizer {
    Normalizer::Const(value.into())
}

pub fn custom(f: impl Fn(&str) -> String + 'static) -> Normalizer {
    Normalizer::Custom(Rc::new(f))
}

/// Join `tokens`' raw surface values, inserting a single space wherever two
/// consecutive spans aren't adjacent (spec §4.6's join semantics).
pub fn join_raw(tokens: &[Token]) -> String {
    join_with(tokens, |t| t.value.clone())
}

fn join_with(tokens: &[Token], project: impl Fn(&Token) -> String) -> String {
    let mut out = String::new();
    for (i, token) in tokens.iter().enumerate() {
        if i > 0 {
            let prev = &tokens[i - 1];
            if prev.span.stop != token.span.start {
                out.push(' ');
            }
        }
        out.push_str(&project(token));
    }
    out
}

impl Normalizer {
    /// Reduce a chain of leaf tokens to a scalar [`Value`].
    pub fn apply_to_chain(&self, tokens: &[Token]) -> Result<Value, InterpretationError> {
        match self {
            Normalizer::Normalized => Ok(Value::Text(join_with(tokens, |t| {
                t.forms.first().map(|form| form.lemma.clone()).unwrap_or_else(|| t.value.clone())
            }))),
            Normalizer::Inflected(grams) => Ok(Value::Text(join_with(tokens, |t| {
                t.forms.first().and_then(|form| form.inflect(grams)).unwrap_or_else(|| t.value.clone())
            }))),
            Normalizer::Const(v) => Ok(Value::Text(v.clone())),
            Normalizer::Custom(f) => Ok(Value::Text(f(&join_raw(tokens)))),
        }
    }

    /// Reduce an already-produced scalar [`Value`] (a nested normaliser's
    /// output feeding into an outer `const_`/`custom`).
    pub fn apply_to_value(&self, value: &Value) -> Result<Value, InterpretationError> {
        match self {
            Normalizer::Const(v) => Ok(Value::Text(v.clone())),
            Normalizer::Custom(f) => match value {
                Value::Text(text) => Ok(Value::Text(f(text))),
            },
            Normalizer::Normalized | Normalizer::Inflected(_) => Err(InterpretationError::ChainExpectedSingleValue),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::span::Span;
    use crate::token::TokenType;

    fn tok(value: &str, start: usize) -> Token {
        Token::new(value, Span::new(start, start + value.chars().count()), TokenType::RussianWord)
    }

    #[test]
    fn join_inserts_space_only_across_non_adjacent_spans() {
        let a = tok("путин", 0);
        let mut b = tok("приехал", 6);
        b.span = Span::new(6, 13);
        assert_eq!(join_raw(&[a, b]), "путин приехал");
    }

    #[test]
    fn custom_applies_to_joined_text() {
        let norm = custom(|s| s.to_uppercase());
        let value = norm.apply_to_chain(&[tok("саша", 0)]).unwrap();
        assert_eq!(value, Value::Text("САША".to_string()));
    }
}
