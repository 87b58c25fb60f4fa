//! The public façade (spec §6's "Public parser API"), grounded on the
//! teacher's `DefaultParser`/`LexerlessParser` (`src/parsing.rs`): validate
//! (here, normalise) once at construction, then offer cheap repeated calls
//! over arbitrary input text.

use std::rc::Rc;

use crate::bnf::Bnf;
use crate::chart::{self, ChartNode};
use crate::error::{GrammarError, InterpretationError, TokenizeError};
use crate::interpretation::Reduction;
use crate::morph::Morph;
use crate::resolver;
use crate::rule::{normalize_with_log, Grammar, RuleId};
use crate::span::Span;
use crate::token::Token;
use crate::tokenizer::{RegexTokenizer, Tokenizer};
use crate::tree::reduce_match;
use crate::util::Log;

/// One candidate result: a raw chart tree plus the BNF it was parsed
/// against, so its fact can be reduced lazily on first access (spec §7:
/// "a single malformed match does not poison the stream").
pub struct Match {
    node: ChartNode,
    bnf: Rc<Bnf>,
}

impl Match {
    pub fn span(&self) -> Span {
        self.node.span()
    }

    pub fn tokens(&self) -> Vec<Token> {
        self.node.tokens()
    }

    /// Reduce this match's tree to its fact, per spec §4.6. Lazy: a broken
    /// match only fails here, not when the chart was built.
    pub fn fact(&self) -> Result<Reduction, InterpretationError> {
        reduce_match(&self.node, &self.bnf)
    }

    pub fn tree(&self) -> &ChartNode {
        &self.node
    }
}

/// An activated grammar bound to a tokenizer, ready to parse text (spec
/// §6's `Parser(rule, tokenizer?, tagger?)`).
pub struct Parser {
    bnf: Rc<Bnf>,
    tokenizer: Box<dyn Tokenizer>,
    log: Log<String>,
}

impl Parser {
    /// Activate `root` against `grammar`, using the default regex tokenizer
    /// with `morph` attached for word-form lookup.
    pub fn new(grammar: &Grammar, root: RuleId, morph: Rc<dyn Morph>) -> Result<Self, GrammarError> {
        Self::with_tokenizer(grammar, root, morph.clone(), Box::new(RegexTokenizer::with_morph(morph)))
    }

    /// Activate `root`, supplying a custom tokenizer (spec §6's `tokenizer?`
    /// argument — e.g. one with extra `add_rules`/`remove_types` calls
    /// applied before construction).
    pub fn with_tokenizer(grammar: &Grammar, root: RuleId, morph: Rc<dyn Morph>, tokenizer: Box<dyn Tokenizer>) -> Result<Self, GrammarError> {
        Self::with_tokenizer_and_log(grammar, root, morph, tokenizer, Log::None)
    }

    /// Same as [`Parser::with_tokenizer`], additionally tracing normalisation
    /// rewrites and chart predict/scan/complete transitions through `log`
    /// (only printed under `#[cfg(debug_assertions)]`, see [`Log`]).
    pub fn with_tokenizer_and_log(
        grammar: &Grammar,
        root: RuleId,
        morph: Rc<dyn Morph>,
        tokenizer: Box<dyn Tokenizer>,
        log: Log<String>,
    ) -> Result<Self, GrammarError> {
        let ctx = crate::activation::ActivationContext::new(morph);
        let bnf = normalize_with_log(grammar, root, &ctx, &log)?;
        Ok(Self { bnf: Rc::new(bnf), tokenizer, log })
    }

    fn parse_chart(&self, text: &str) -> Result<(chart::Chart, Vec<Token>), TokenizeError> {
        let tokens = self.tokenizer.tokenize(text)?;
        let chart = chart::parse(&self.bnf, &tokens, &self.log);
        Ok((chart, tokens))
    }

    fn to_match(&self, node: ChartNode) -> Match {
        Match { node, bnf: self.bnf.clone() }
    }

    /// Every completed match, unresolved (spec §6's `parser.extract`).
    pub fn extract(&self, text: &str) -> Result<Vec<Match>, TokenizeError> {
        let (chart, _) = self.parse_chart(text)?;
        let mut matches: Vec<Match> = chart.matches.into_iter().map(|n| self.to_match(n)).collect();
        matches.sort_by(|a, b| a.span().start.cmp(&b.span().start));
        Ok(matches)
    }

    /// A maximum-coverage, non-overlapping subset of matches (spec §6's
    /// `parser.findall`, spec §4.7's resolver).
    pub fn findall(&self, text: &str) -> Result<Vec<Match>, TokenizeError> {
        let (chart, _) = self.parse_chart(text)?;
        let resolved = resolver::resolve_findall(chart.matches);
        let mut matches: Vec<Match> = resolved.into_iter().map(|n| self.to_match(n)).collect();
        matches.sort_by(|a, b| a.span().start.cmp(&b.span().start));
        Ok(matches)
    }

    /// The (resolved) match whose span exactly covers the whole input, if
    /// any (spec §6's `parser.match`).
    pub fn r#match(&self, text: &str) -> Result<Option<Match>, TokenizeError> {
        let (chart, tokens) = self.parse_chart(text)?;
        let whole = match full_span(&tokens) {
            Some(span) => span,
            None => return Ok(None),
        };
        let resolved = resolver::resolve_extract(chart.matches);
        let chosen = resolved.into_iter().find(|n| n.span() == whole);
        Ok(chosen.map(|n| self.to_match(n)))
    }
}

fn full_span(tokens: &[Token]) -> Option<Span> {
    let first = tokens.first()?;
    let last = tokens.last()?;
    Some(Span::new(first.span.start, last.span.stop))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpretation::{attribute, inflected, normalized, FactSchema, Interpretator};
    use crate::morph::MockMorph;
    use crate::predicate::{eq, gram, match_relation};
    use crate::relation::gnc_relation;
    use crate::rule::{or_rule, rule, t, RuleExt};

    fn morph() -> Rc<dyn Morph> {
        Rc::new(MockMorph::default())
    }

    fn person_grammar() -> (Grammar, RuleId) {
        let mut g = Grammar::new();
        let first = rule(&mut g, vec![t(eq("саша"))]).interpretation(&mut g, Interpretator::Attribute("first".into()));
        let root = rule(&mut g, vec![t(first)]);
        let schema = FactSchema::new("Person", vec![attribute("first")]);
        let root = root.interpretation(&mut g, Interpretator::Fact(schema));
        (g, root)
    }

    #[test]
    fn match_requires_full_coverage() {
        let (g, root) = person_grammar();
        let parser = Parser::new(&g, root, morph()).unwrap();
        assert!(parser.r#match("саша").unwrap().is_some());
        assert!(parser.r#match("ну саша").unwrap().is_none());
    }

    #[test]
    fn extract_finds_matches_anywhere_in_the_text() {
        let (g, root) = person_grammar();
        let parser = Parser::new(&g, root, morph()).unwrap();
        let matches = parser.extract("ну саша привет").unwrap();
        assert_eq!(matches.len(), 1);
        let fact = matches[0].fact().unwrap();
        match fact {
            Reduction::Fact(f) => assert_eq!(f.text("first"), Some("саша")),
            other => panic!("expected a fact, got {:?}", other),
        }
    }

    #[test]
    fn findall_returns_disjoint_matches_left_to_right() {
        let (g, root) = person_grammar();
        let parser = Parser::new(&g, root, morph()).unwrap();
        let matches = parser.findall("саша и саша").unwrap();
        assert_eq!(matches.len(), 2);
        assert!(matches[0].span().start < matches[1].span().start);
    }

    // End-to-end scenarios driving the full façade from source text to fact,
    // mirroring `yargy`'s own `tests/test_interpretation.py`/
    // `tests/test_relation.py` style of building a small grammar and
    // asserting on the resulting fact (spec §8).

    #[test]
    fn simple_predicate_plus_attribute() {
        let mut g = Grammar::new();
        let a = rule(&mut g, vec![t(eq("a"))]).interpretation(&mut g, Interpretator::Attribute("a".into()));
        let root = rule(&mut g, vec![t(a)]);
        let schema = FactSchema::new("F", vec![attribute("a")]);
        let root = root.interpretation(&mut g, Interpretator::Fact(schema));

        let parser = Parser::new(&g, root, morph()).unwrap();
        let matched = parser.r#match("a").unwrap().expect("should match");
        assert_eq!(matched.span(), Span::new(0, 1));

        let fact = matched.fact().unwrap();
        let fact = fact.as_fact().unwrap();
        assert_eq!(fact.text("a"), Some("a"));
    }

    #[test]
    fn repeat_with_merge_into_a_repeatable_attribute() {
        let mut g = Grammar::new();
        let a = rule(&mut g, vec![t(eq("a"))]).interpretation(&mut g, Interpretator::Attribute("a".into()));
        let b = rule(&mut g, vec![t(eq("b"))]).interpretation(&mut g, Interpretator::Attribute("a".into()));
        let root = rule(&mut g, vec![t(a), t(b)]);
        let schema = FactSchema::new("F", vec![attribute("a").repeatable()]);
        let root = root.interpretation(&mut g, Interpretator::Fact(schema));

        let parser = Parser::new(&g, root, morph()).unwrap();
        let matched = parser.r#match("a b").unwrap().expect("should match");
        let fact = matched.fact().unwrap();
        let fact = fact.as_fact().unwrap();
        assert_eq!(fact.texts("a"), vec!["a", "b"]);
    }

    #[test]
    fn morphological_normalisation_reduces_to_the_lemma() {
        let mut g = Grammar::new();
        let root = rule(&mut g, vec![t(eq("московским"))]).interpretation(&mut g, Interpretator::Normalizer(normalized()));

        let parser = Parser::new(&g, root, morph()).unwrap();
        let matched = parser.r#match("московским").unwrap().expect("should match");
        let reduction = matched.fact().unwrap();
        assert_eq!(reduction.as_text(), Some("московский"));
    }

    #[test]
    fn inflection_targets_a_different_gram_set() {
        let mut g = Grammar::new();
        let root = rule(&mut g, vec![t(eq("московским"))])
            .interpretation(&mut g, Interpretator::Normalizer(inflected(["nomn", "femn"])));

        let parser = Parser::new(&g, root, morph()).unwrap();
        let matched = parser.r#match("московским").unwrap().expect("should match");
        let reduction = matched.fact().unwrap();
        assert_eq!(reduction.as_text(), Some("московская"));
    }

    #[test]
    fn agreement_relation_requires_matching_gender_number_case() {
        let mut g = Grammar::new();
        let relation = gnc_relation();
        let first = rule(&mut g, vec![t(match_relation(gram("Name"), relation.clone()))])
            .interpretation(&mut g, Interpretator::AttributeNormalizer("first".into(), normalized()));
        let last = rule(&mut g, vec![t(match_relation(gram("Surn"), relation))])
            .interpretation(&mut g, Interpretator::AttributeNormalizer("last".into(), normalized()));
        let root = rule(&mut g, vec![t(first), t(last)]);
        let schema = FactSchema::new("Name", vec![attribute("first"), attribute("last")]);
        let root = root.interpretation(&mut g, Interpretator::Fact(schema));

        let parser = Parser::new(&g, root, morph()).unwrap();

        let agreeing = parser.r#match("саше иванову").unwrap().expect("agreeing forms should match");
        let fact = agreeing.fact().unwrap();
        let fact = fact.as_fact().unwrap();
        assert_eq!(fact.text("first"), Some("саша"));
        assert_eq!(fact.text("last"), Some("иванов"));

        assert!(parser.r#match("сашу ивановой").unwrap().is_none(), "case/gender mismatch must not match");
    }

    #[test]
    fn resolver_prefers_the_wider_person_match_over_a_contained_city_match() {
        let mut g = Grammar::new();

        let first = rule(&mut g, vec![t(gram("Name"))]).interpretation(&mut g, Interpretator::AttributeNormalizer("first".into(), normalized()));
        let last = rule(&mut g, vec![t(gram("Surn"))]).interpretation(&mut g, Interpretator::AttributeNormalizer("last".into(), normalized()));
        let person = rule(&mut g, vec![t(first), t(last)]);
        let person_schema = FactSchema::new("Person", vec![attribute("first"), attribute("last")]);
        let person = person.interpretation(&mut g, Interpretator::Fact(person_schema));

        let city_name = rule(&mut g, vec![t(gram("Geox"))]).interpretation(&mut g, Interpretator::AttributeNormalizer("name".into(), normalized()));
        let city = rule(&mut g, vec![t(city_name)]);
        let city_schema = FactSchema::new("City", vec![attribute("name")]);
        let city = city.interpretation(&mut g, Interpretator::Fact(city_schema));

        let root = or_rule(&mut g, vec![person, city]);

        let parser = Parser::new(&g, root, morph()).unwrap();
        let matches = parser.findall("владимир путин приехал в владимир").unwrap();

        assert_eq!(matches.len(), 2, "expected one Person and one City match, got {}", matches.len());

        let facts: Vec<_> = matches.iter().map(|m| m.fact().unwrap()).collect();
        let person_fact = facts.iter().find_map(|r| r.as_fact().filter(|f| f.schema_name() == "Person")).expect("a Person fact");
        assert_eq!(person_fact.text("first"), Some("владимир"));
        assert_eq!(person_fact.text("last"), Some("путин"));

        let city_fact = facts.iter().find_map(|r| r.as_fact().filter(|f| f.schema_name() == "City")).expect("a City fact");
        assert_eq!(city_fact.text("name"), Some("владимир"));

        assert!(matches[0].span().start < matches[1].span().start);
    }

    // Determinism property: repeated `findall` runs over the same grammar
    // and text yield byte-identical output (spec §8).

    #[test]
    fn findall_output_is_stable_across_repeated_runs() {
        let mut g = Grammar::new();
        let first = rule(&mut g, vec![t(gram("Name"))]).interpretation(&mut g, Interpretator::AttributeNormalizer("first".into(), normalized()));
        let last = rule(&mut g, vec![t(gram("Surn"))]).interpretation(&mut g, Interpretator::AttributeNormalizer("last".into(), normalized()));
        let root = rule(&mut g, vec![t(first), t(last)]);
        let schema = FactSchema::new("Person", vec![attribute("first"), attribute("last")]);
        let root = root.interpretation(&mut g, Interpretator::Fact(schema));
        let parser = Parser::new(&g, root, morph()).unwrap();

        let text = "саше иванову идёт домой, саша иванов смотрит";
        let first_run: Vec<_> = parser.findall(text).unwrap().iter().map(|m| m.span()).collect();
        let second_run: Vec<_> = parser.findall(text).unwrap().iter().map(|m| m.span()).collect();

        assert_eq!(first_run, second_run);
        assert!(!first_run.is_empty());
    }
}
