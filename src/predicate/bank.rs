//! Concrete token predicates, grounded on `yargy/predicates/bank.py`.

use std::collections::BTreeSet;
use std::rc::Rc;

use crate::activation::ActivationContext;
use crate::error::GrammarError;
use crate::token::{Token, TokenType};

use super::Predicate;

#[derive(Debug)]
pub struct True;

impl Predicate for True {
    fn test(&self, _token: &Token) -> bool {
        true
    }

    fn label(&self) -> String {
        "true".to_string()
    }
}

/// Always matches. `or_(eq("a"), true())` etc.
pub fn true_() -> Rc<dyn Predicate> {
    Rc::new(True)
}

#[derive(Debug)]
pub struct Eq(String);

impl Predicate for Eq {
    fn test(&self, token: &Token) -> bool {
        token.value == self.0
    }

    fn label(&self) -> String {
        format!("eq({:?})", self.0)
    }
}

/// Matches a token whose raw value equals `value` exactly.
pub fn eq(value: impl Into<String>) -> Rc<dyn Predicate> {
    Rc::new(Eq(value.into()))
}

#[derive(Debug)]
pub struct Caseless(String);

impl Predicate for Caseless {
    fn test(&self, token: &Token) -> bool {
        token.value.to_lowercase() == self.0
    }

    fn label(&self) -> String {
        format!("caseless({:?})", self.0)
    }
}

/// Matches a token whose value case-insensitively equals `value`.
pub fn caseless(value: impl Into<String>) -> Rc<dyn Predicate> {
    Rc::new(Caseless(value.into().to_lowercase()))
}

#[derive(Debug)]
pub struct In(BTreeSet<String>);

impl Predicate for In {
    fn test(&self, token: &Token) -> bool {
        self.0.contains(&token.value)
    }

    fn label(&self) -> String {
        format!("in_({:?})", self.0)
    }
}

/// Matches a token whose raw value is a member of `values`.
pub fn in_(values: impl IntoIterator<Item = impl Into<String>>) -> Rc<dyn Predicate> {
    Rc::new(In(values.into_iter().map(Into::into).collect()))
}

#[derive(Debug)]
pub struct InCaseless(BTreeSet<String>);

impl Predicate for InCaseless {
    fn test(&self, token: &Token) -> bool {
        self.0.contains(&token.value.to_lowercase())
    }

    fn label(&self) -> String {
        format!("in_caseless({:?})", self.0)
    }
}

/// Matches a token whose case-folded value is a member of `values`.
pub fn in_caseless(values: impl IntoIterator<Item = impl Into<String>>) -> Rc<dyn Predicate> {
    Rc::new(InCaseless(values.into_iter().map(|v| v.into().to_lowercase()).collect()))
}

fn as_int(token: &Token) -> Option<i64> {
    if token.token_type == TokenType::Integer {
        token.value.parse().ok()
    } else {
        None
    }
}

#[derive(Debug)]
pub struct Gte(i64);

impl Predicate for Gte {
    fn test(&self, token: &Token) -> bool {
        as_int(token).map_or(false, |v| v >= self.0)
    }

    fn label(&self) -> String {
        format!("gte({})", self.0)
    }
}

/// Matches an integer token whose value is `>= bound`.
pub fn gte(bound: i64) -> Rc<dyn Predicate> {
    Rc::new(Gte(bound))
}

#[derive(Debug)]
pub struct Lte(i64);

impl Predicate for Lte {
    fn test(&self, token: &Token) -> bool {
        as_int(token).map_or(false, |v| v <= self.0)
    }

    fn label(&self) -> String {
        format!("lte({})", self.0)
    }
}

/// Matches an integer token whose value is `<= bound`.
pub fn lte(bound: i64) -> Rc<dyn Predicate> {
    Rc::new(Lte(bound))
}

#[derive(Debug)]
pub struct LengthEq(usize);

impl Predicate for LengthEq {
    fn test(&self, token: &Token) -> bool {
        token.value.chars().count() == self.0
    }

    fn label(&self) -> String {
        format!("length_eq({})", self.0)
    }
}

/// Matches a token whose value has exactly `n` characters.
pub fn length_eq(n: usize) -> Rc<dyn Predicate> {
    Rc::new(LengthEq(n))
}

#[derive(Debug)]
pub struct Normalized(String);

impl Predicate for Normalized {
    fn test(&self, token: &Token) -> bool {
        token.forms.iter().any(|f| f.lemma == self.0)
    }

    fn label(&self) -> String {
        format!("normalized({:?})", self.0)
    }
}

/// Matches a morph token that has `lemma` among its forms' normal forms.
pub fn normalized(lemma: impl Into<String>) -> Rc<dyn Predicate> {
    Rc::new(Normalized(lemma.into()))
}

#[derive(Debug)]
pub struct Dictionary(BTreeSet<String>);

impl Predicate for Dictionary {
    fn test(&self, token: &Token) -> bool {
        token.forms.iter().any(|f| self.0.contains(&f.lemma))
    }

    fn label(&self) -> String {
        format!("dictionary({} entries)", self.0.len())
    }
}

/// Matches a morph token whose normal form is a member of `lemmas`, the
/// set-membership counterpart of [`normalized`] for large vocabularies.
pub fn dictionary(lemmas: impl IntoIterator<Item = impl Into<String>>) -> Rc<dyn Predicate> {
    Rc::new(Dictionary(lemmas.into_iter().map(Into::into).collect()))
}

#[derive(Debug)]
pub struct Gram(String);

impl Predicate for Gram {
    fn test(&self, token: &Token) -> bool {
        token.forms.iter().any(|f| f.has_gram(&self.0))
    }

    fn constrain(&self, token: Token) -> Token {
        if token.forms.is_empty() {
            return token;
        }
        let narrowed: Vec<_> = token.forms.iter().filter(|f| f.has_gram(&self.0)).cloned().collect();
        token.constrained(narrowed)
    }

    fn activate(&self, ctx: &ActivationContext) -> Result<(), GrammarError> {
        ctx.check_gram(&self.0)
    }

    fn label(&self) -> String {
        format!("gram({:?})", self.0)
    }
}

/// Matches a morph token with at least one form carrying `grammeme`, and
/// narrows the token's form list down to the matching forms.
pub fn gram(grammeme: impl Into<String>) -> Rc<dyn Predicate> {
    Rc::new(Gram(grammeme.into()))
}

#[derive(Debug)]
pub struct TypeOf(String);

impl Predicate for TypeOf {
    fn test(&self, token: &Token) -> bool {
        token.token_type.name() == self.0
    }

    fn activate(&self, ctx: &ActivationContext) -> Result<(), GrammarError> {
        ctx.check_token_type(&self.0)
    }

    fn label(&self) -> String {
        format!("type({:?})", self.0)
    }
}

/// Matches a token of the named type (`"RU"`, `"INT"`, `"PUNCT"`, ...).
pub fn type_(name: impl Into<String>) -> Rc<dyn Predicate> {
    Rc::new(TypeOf(name.into()))
}

#[derive(Debug)]
pub struct Tag(Rc<str>);

impl Predicate for Tag {
    fn test(&self, token: &Token) -> bool {
        token.tag.as_deref() == Some(self.0.as_ref())
    }

    fn label(&self) -> String {
        format!("tag({:?})", self.0)
    }
}

/// Matches a tagged token carrying the given tag symbol.
pub fn tag(name: impl Into<Rc<str>>) -> Rc<dyn Predicate> {
    Rc::new(Tag(name.into()))
}

pub struct Custom {
    f: Rc<dyn Fn(&Token) -> bool>,
    label: String,
}

impl std::fmt::Debug for Custom {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Custom({})", self.label)
    }
}

impl Predicate for Custom {
    fn test(&self, token: &Token) -> bool {
        (self.f)(token)
    }

    fn label(&self) -> String {
        format!("custom({})", self.label)
    }
}

/// Wrap an arbitrary user function as a predicate.
pub fn custom(f: impl Fn(&Token) -> bool + 'static) -> Rc<dyn Predicate> {
    Rc::new(Custom { f: Rc::new(f), label: "fn".to_string() })
}

/// Same as [`custom`] but with a caller-supplied label for grammar dumps.
pub fn custom_labeled(label: impl Into<String>, f: impl Fn(&Token) -> bool + 'static) -> Rc<dyn Predicate> {
    Rc::new(Custom { f: Rc::new(f), label: label.into() })
}

macro_rules! shape_predicate {
    ($name:ident, $ctor:ident, $test:expr) => {
        #[derive(Debug)]
        pub struct $name;

        impl Predicate for $name {
            fn test(&self, token: &Token) -> bool {
                let value: &str = &token.value;
                ($test)(value)
            }

            fn label(&self) -> String {
                stringify!($ctor).to_string()
            }
        }

        pub fn $ctor() -> Rc<dyn Predicate> {
            Rc::new($name)
        }
    };
}

shape_predicate!(IsLower, is_lower, |v: &str| v.chars().all(|c| !c.is_alphabetic() || c.is_lowercase()) && v.chars().any(|c| c.is_alphabetic()));
shape_predicate!(IsUpper, is_upper, |v: &str| v.chars().all(|c| !c.is_alphabetic() || c.is_uppercase()) && v.chars().any(|c| c.is_alphabetic()));
shape_predicate!(IsTitle, is_title, |v: &str| {
    let mut chars = v.chars();
    match chars.next() {
        Some(first) if first.is_uppercase() => chars.all(|c| !c.is_alphabetic() || c.is_lowercase()),
        _ => false,
    }
});
shape_predicate!(IsCapitalized, is_capitalized, |v: &str| v.chars().next().map_or(false, |c| c.is_uppercase()));
shape_predicate!(IsSingle, is_single, |v: &str| v.chars().count() == 1);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::span::Span;

    fn tok(value: &str) -> Token {
        Token::new(value, Span::new(0, value.chars().count()), TokenType::RussianWord)
    }

    #[test]
    fn eq_matches_exact_value() {
        assert!(eq("привет").test(&tok("привет")));
        assert!(!eq("привет").test(&tok("Привет")));
    }

    #[test]
    fn caseless_ignores_case() {
        assert!(caseless("Привет").test(&tok("привет")));
    }

    #[test]
    fn is_title_requires_leading_capital_only() {
        assert!(is_title().test(&tok("Москва")));
        assert!(!is_title().test(&tok("МОСКВА")));
        assert!(!is_title().test(&tok("москва")));
    }

    #[test]
    fn gram_narrows_forms_and_never_widens() {
        use crate::morph::{parse, MockMorph};
        use std::rc::Rc;
        let morph: Rc<dyn crate::morph::Morph> = Rc::new(MockMorph::new());
        let forms = parse(&morph, "владимир");
        let before = forms.len();
        let token = Token::new("владимир", Span::new(0, 8), TokenType::RussianWord).with_forms(forms);
        let constrained = gram("Name").constrain(token.clone());
        assert!(constrained.forms.len() <= before);
        assert!(constrained.forms.iter().all(|f| f.has_gram("Name")));
    }
}
