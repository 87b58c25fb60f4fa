//! The interpretation engine (spec §4.6): reduces a parse tree into a typed
//! [`Fact`], grounded on `yargy/interpretation/{interpretator,fact,attribute}.py`.

mod normalizer;

pub use normalizer::{const_, custom, inflected, normalized, Normalizer};

use std::collections::BTreeMap;

use crate::error::InterpretationError;
use crate::span::Span;
use crate::token::Token;

/// A reduced scalar value. Kept to a single text variant: every normaliser
/// in this crate (lemma join, inflection, `const_`, `custom`) ultimately
/// produces text, matching the source's string-centric fact values.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Text(String),
}

/// One attribute of a [`FactSchema`]: scalar (last write wins, with a
/// default) or repeatable (values accumulate into a list).
#[derive(Debug, Clone)]
pub struct AttributeSchema {
    pub name: String,
    pub repeatable: bool,
}

/// A fact type descriptor (`fact('Name', ['a', attribute('b').repeatable()])`).
#[derive(Debug, Clone)]
pub struct FactSchema {
    pub name: &'static str,
    pub attributes: Vec<AttributeSchema>,
}

impl FactSchema {
    pub fn new(name: &'static str, attributes: Vec<AttributeSchema>) -> Self {
        Self { name, attributes }
    }

    pub fn is_repeatable(&self, attr: &str) -> bool {
        self.attributes.iter().any(|a| a.name == attr && a.repeatable)
    }
}

/// A single fact attribute descriptor; `.repeatable()` marks it as a list.
pub fn attribute(name: impl Into<String>) -> AttributeSchema {
    AttributeSchema { name: name.into(), repeatable: false }
}

impl AttributeSchema {
    pub fn repeatable(mut self) -> Self {
        self.repeatable = true;
        self
    }
}

/// One attribute's accumulated value(s): scalar facts keep the last write,
/// repeatable facts accumulate in encounter order.
#[derive(Debug, Clone, PartialEq)]
enum AttributeValue {
    Scalar(Option<FactField>),
    Repeated(Vec<FactField>),
}

/// What a fact attribute (or a sub-fact slot) may hold.
#[derive(Debug, Clone, PartialEq)]
pub enum FactField {
    Value(Value),
    Fact(Fact),
}

/// An assembled fact instance (spec §3's "fact instance").
#[derive(Debug, Clone, PartialEq)]
pub struct Fact {
    schema_name: &'static str,
    values: BTreeMap<String, AttributeValue>,
    spans: Vec<Span>,
}

impl Fact {
    fn empty(schema: &FactSchema) -> Self {
        let values = schema
            .attributes
            .iter()
            .map(|a| {
                let v = if a.repeatable { AttributeValue::Repeated(Vec::new()) } else { AttributeValue::Scalar(None) };
                (a.name.clone(), v)
            })
            .collect();
        Self { schema_name: schema.name, values, spans: Vec::new() }
    }

    pub fn schema_name(&self) -> &'static str {
        self.schema_name
    }

    /// A scalar attribute's text value, if set and if it's a plain `Value`.
    pub fn text(&self, attr: &str) -> Option<&str> {
        match self.values.get(attr)? {
            AttributeValue::Scalar(Some(FactField::Value(Value::Text(s)))) => Some(s),
            _ => None,
        }
    }

    /// A repeatable attribute's text values, in encounter order.
    pub fn texts(&self, attr: &str) -> Vec<&str> {
        match self.values.get(attr) {
            Some(AttributeValue::Repeated(items)) => items
                .iter()
                .filter_map(|f| match f {
                    FactField::Value(Value::Text(s)) => Some(s.as_str()),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        }
    }

    pub fn sub_fact(&self, attr: &str) -> Option<&Fact> {
        match self.values.get(attr)? {
            AttributeValue::Scalar(Some(FactField::Fact(f))) => Some(f),
            _ => None,
        }
    }

    /// Source spans this fact was built from, sorted by start (spec §4.9).
    pub fn spans(&self) -> Vec<Span> {
        let mut spans = self.spans.clone();
        spans.sort_by_key(|s| s.start);
        spans
    }

    fn with_span(mut self, span: Span) -> Self {
        self.spans.push(span);
        self
    }

    fn set(&mut self, attr: &str, field: FactField) -> Result<(), InterpretationError> {
        match self.values.entry(attr.to_string()).or_insert(AttributeValue::Scalar(None)) {
            AttributeValue::Scalar(slot) => *slot = Some(field),
            AttributeValue::Repeated(items) => items.push(field),
        }
        Ok(())
    }

    /// Merge `other` (a sub-fact of the *same* schema, produced by a second
    /// production alternative reducing into this attribute slot) into self.
    fn merge(&mut self, other: Fact) -> Result<(), InterpretationError> {
        if self.schema_name != other.schema_name {
            return Err(InterpretationError::IncompatibleFactMerge { schema: self.schema_name, other: other.schema_name });
        }
        for (attr, value) in other.values {
            match (self.values.get_mut(&attr), value) {
                (Some(AttributeValue::Scalar(slot)), AttributeValue::Scalar(Some(field))) => *slot = Some(field),
                (Some(AttributeValue::Repeated(items)), AttributeValue::Repeated(mut more)) => items.append(&mut more),
                _ => {}
            }
        }
        self.spans.extend(other.spans);
        Ok(())
    }

    /// Project this fact to JSON (spec §4.9's `Fact.as_json`).
    pub fn as_json(&self) -> serde_json::Value {
        let mut map = serde_json::Map::new();
        for (attr, value) in &self.values {
            let json = match value {
                AttributeValue::Scalar(None) => serde_json::Value::Null,
                AttributeValue::Scalar(Some(field)) => field_to_json(field),
                AttributeValue::Repeated(items) => serde_json::Value::Array(items.iter().map(field_to_json).collect()),
            };
            map.insert(attr.clone(), json);
        }
        serde_json::Value::Object(map)
    }
}

fn field_to_json(field: &FactField) -> serde_json::Value {
    match field {
        FactField::Value(Value::Text(s)) => serde_json::Value::String(s.clone()),
        FactField::Fact(f) => f.as_json(),
    }
}

/// What one child of an interpretator-bearing node reduces to before being
/// consumed by its parent (spec §4.6's three reduction shapes).
#[derive(Debug, Clone, PartialEq)]
pub enum Reduction {
    /// An unreduced chain of leaf tokens (no interpretator seen yet).
    Tokens(Vec<Token>),
    /// A normaliser's scalar output.
    Value(Value),
    /// An `AttributeInterpretator`'s output: a value tagged for one fact field.
    Attribute(String, FactField),
    /// A `FactInterpretator`'s output.
    Fact(Fact),
}

impl Reduction {
    /// The assembled fact, if this reduction is one (the shape every
    /// top-level `match.fact()` result should have, per spec §4.6's
    /// root-must-bear-an-interpretator invariant).
    pub fn as_fact(&self) -> Option<&Fact> {
        match self {
            Reduction::Fact(f) => Some(f),
            _ => None,
        }
    }

    /// The scalar text, if this reduction is a bare normaliser output
    /// (a root rule interpreted with `Interpretator::Normalizer` rather
    /// than wrapped in a fact).
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Reduction::Value(Value::Text(s)) => Some(s),
            _ => None,
        }
    }
}

/// Sum type consumed during tree reduction (spec §3, §9: replaces the
/// source's `AttributeInterpretator`/`NormalizerInterpretator`/
/// `FactInterpretator` class hierarchy with one flat enum).
#[derive(Debug, Clone)]
pub enum Interpretator {
    /// Label this node's reduction as belonging to fact attribute `attr`.
    Attribute(String),
    /// Reduce this node's token chain (or upstream value) via `Normalizer`.
    Normalizer(Normalizer),
    /// `attr.normalized()`-style composition: normalise, then tag.
    AttributeNormalizer(String, Normalizer),
    /// Assemble a fact of `schema` from this node's children's reductions.
    Fact(FactSchema),
}

/// Flatten every [`Reduction::Tokens`] among `children` into one chain,
/// preserving order; used by normaliser-bearing interpretators.
fn collect_tokens(children: &[Reduction]) -> Vec<Token> {
    children
        .iter()
        .filter_map(|c| match c {
            Reduction::Tokens(tokens) => Some(tokens.clone()),
            _ => None,
        })
        .flatten()
        .collect()
}

fn single_upstream_value(children: &[Reduction]) -> Option<&Value> {
    children.iter().find_map(|c| match c {
        Reduction::Value(v) => Some(v),
        _ => None,
    })
}

/// Reduce one interpretator-bearing tree node given its already-reduced
/// children (spec §4.6's bottom-up `interpret`).
pub fn interpret(interpretator: &Interpretator, span: Span, children: Vec<Reduction>) -> Result<Reduction, InterpretationError> {
    match interpretator {
        Interpretator::Normalizer(norm) => {
            let tokens = collect_tokens(&children);
            let value = if !tokens.is_empty() {
                norm.apply_to_chain(&tokens)?
            } else if let Some(v) = single_upstream_value(&children) {
                norm.apply_to_value(v)?
            } else {
                norm.apply_to_chain(&[])?
            };
            Ok(Reduction::Value(value))
        }
        Interpretator::Attribute(attr) => {
            let field = reduce_to_field(&children)?;
            Ok(Reduction::Attribute(attr.clone(), field))
        }
        Interpretator::AttributeNormalizer(attr, norm) => {
            let tokens = collect_tokens(&children);
            let value = if !tokens.is_empty() {
                norm.apply_to_chain(&tokens)?
            } else if let Some(v) = single_upstream_value(&children) {
                norm.apply_to_value(v)?
            } else {
                norm.apply_to_chain(&[])?
            };
            Ok(Reduction::Attribute(attr.clone(), FactField::Value(value)))
        }
        Interpretator::Fact(schema) => {
            let mut fact = Fact::empty(schema).with_span(span);
            for child in children {
                match child {
                    Reduction::Attribute(attr, field) => fact.set(&attr, field)?,
                    Reduction::Fact(sub) => {
                        if sub.schema_name == schema.name {
                            fact.merge(sub)?;
                        } else {
                            return Err(InterpretationError::IncompatibleFactMerge { schema: schema.name, other: sub.schema_name });
                        }
                    }
                    Reduction::Tokens(_) | Reduction::Value(_) => {}
                }
            }
            Ok(Reduction::Fact(fact))
        }
    }
}

fn reduce_to_field(children: &[Reduction]) -> Result<FactField, InterpretationError> {
    if let Some(sub) = children.iter().find_map(|c| match c {
        Reduction::Fact(f) => Some(f.clone()),
        _ => None,
    }) {
        return Ok(FactField::Fact(sub));
    }
    if let Some(v) = single_upstream_value(children) {
        return Ok(FactField::Value(v.clone()));
    }
    let tokens = collect_tokens(children);
    if tokens.is_empty() {
        return Err(InterpretationError::ChainExpectedSingleValue);
    }
    Ok(FactField::Value(Value::Text(normalizer::join_raw(&tokens))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::morph::{parse, MockMorph, Morph};
    use crate::span::Span;
    use crate::token::TokenType;
    use std::rc::Rc;

    fn tok(value: &str, start: usize) -> Token {
        Token::new(value, Span::new(start, start + value.chars().count()), TokenType::RussianWord)
    }

    /// A morph token carrying the real form list [`MockMorph`] would attach,
    /// so a normaliser reduction can actually exercise lemma lookup rather
    /// than degenerate to the surface value through an empty form list.
    fn morph_tok(value: &str, start: usize) -> Token {
        let morph: Rc<dyn Morph> = Rc::new(MockMorph::new());
        tok(value, start).with_forms(parse(&morph, value))
    }

    #[test]
    fn attribute_then_fact_assembles_scalar() {
        let schema = FactSchema::new("F", vec![attribute("a")]);
        let a = interpret(&Interpretator::Attribute("a".into()), Span::new(0, 1), vec![Reduction::Tokens(vec![tok("a", 0)])]).unwrap();
        let fact = interpret(&Interpretator::Fact(schema), Span::new(0, 1), vec![a]).unwrap();
        match fact {
            Reduction::Fact(f) => assert_eq!(f.text("a"), Some("a")),
            _ => panic!("expected a fact"),
        }
    }

    #[test]
    fn repeatable_attribute_accumulates_across_merges() {
        let schema = FactSchema::new("F", vec![attribute("a").repeatable()]);
        let a1 = interpret(&Interpretator::Attribute("a".into()), Span::new(0, 1), vec![Reduction::Tokens(vec![tok("a", 0)])]).unwrap();
        let a2 = interpret(&Interpretator::Attribute("a".into()), Span::new(2, 3), vec![Reduction::Tokens(vec![tok("b", 2)])]).unwrap();
        let fact = interpret(&Interpretator::Fact(schema), Span::new(0, 3), vec![a1, a2]).unwrap();
        match fact {
            Reduction::Fact(f) => assert_eq!(f.texts("a"), vec!["a", "b"]),
            _ => panic!("expected a fact"),
        }
    }

    #[test]
    fn normalizer_reduces_token_chain_to_lemma() {
        let reduction = interpret(
            &Interpretator::Normalizer(normalized()),
            Span::new(0, 10),
            vec![Reduction::Tokens(vec![morph_tok("московским", 0)])],
        )
        .unwrap();
        assert_eq!(reduction, Reduction::Value(Value::Text("московский".to_string())));
    }

    #[test]
    fn normalizer_falls_back_to_surface_value_without_forms() {
        let reduction =
            interpret(&Interpretator::Normalizer(normalized()), Span::new(0, 10), vec![Reduction::Tokens(vec![tok("московским", 0)])]).unwrap();
        assert_eq!(reduction, Reduction::Value(Value::Text("московским".to_string())));
    }
}
