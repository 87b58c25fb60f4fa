//! The tokeniser contract (spec §6) and its default regex-driven adapter,
//! grounded on the teacher's `Tokenizer`/`ILexeme` composition
//! (`src/tokenization.rs`, `src/lexeme/pattern.rs`).

mod rules;

pub use rules::{default_rules, TokenRule};

use std::rc::Rc;

use crate::error::TokenizeError;
use crate::morph::{parse, Morph};
use crate::span::Span;
use crate::token::{Token, TokenType};
use crate::util::SourceText;

/// External collaborator: categorises raw text into an ordered token
/// stream. The core engine depends only on this trait (spec §6).
pub trait Tokenizer {
    fn tokenize(&self, text: &str) -> Result<Vec<Token>, TokenizeError>;

    /// Whether `tag` names a token type this tokenizer knows about.
    fn check_type(&self, tag: &str) -> Result<(), TokenizeError> {
        TokenType::from_name(tag).map(|_| ()).ok_or_else(|| TokenizeError::new(0, format!("unknown token type '{}'", tag)))
    }
}

/// Regex-driven tokenizer: scans left to right, skipping whitespace,
/// trying each [`TokenRule`] in order and taking the first match. Optional
/// morphology attaches a form list to every [`TokenType::RussianWord`].
pub struct RegexTokenizer {
    rules: Vec<TokenRule>,
    morph: Option<Rc<dyn Morph>>,
}

impl RegexTokenizer {
    pub fn new() -> Self {
        Self { rules: default_rules(), morph: None }
    }

    pub fn with_morph(morph: Rc<dyn Morph>) -> Self {
        Self { rules: default_rules(), morph: Some(morph) }
    }

    /// Append additional rules, tried after the built-in ones (spec §6's
    /// `add_rules`).
    pub fn add_rules(&mut self, rules: impl IntoIterator<Item = TokenRule>) {
        self.rules.extend(rules);
    }

    /// Drop every rule for the given token types (spec §6's `remove_types`).
    pub fn remove_types(&mut self, types: &[TokenType]) {
        self.rules.retain(|r| !types.contains(&r.token_type));
    }
}

impl Default for RegexTokenizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Tokenizer for RegexTokenizer {
    fn tokenize(&self, text: &str) -> Result<Vec<Token>, TokenizeError> {
        let source = SourceText::new(text);
        let mut tokens = Vec::new();
        let mut pointer = 0usize;

        while pointer < source.len() {
            if let Some(c) = source.char_at(pointer) {
                if c.is_whitespace() && c != '\n' && c != '\r' {
                    pointer += 1;
                    continue;
                }
            }

            let remainder = source.slice(pointer, source.len());
            let hit = self.rules.iter().find_map(|rule| rule.pattern.find(&remainder).map(|m| (rule.token_type, m.as_str().chars().count())));

            match hit {
                Some((token_type, char_len)) => {
                    let value = source.slice(pointer, pointer + char_len);
                    let span = Span::new(pointer, pointer + char_len);
                    let token = self.build_token(value, span, token_type);
                    tokens.push(token);
                    pointer += char_len;
                }
                None => {
                    return Err(TokenizeError::new(pointer, format!("at {}", source.position_of(pointer))));
                }
            }
        }
        Ok(tokens)
    }
}

impl RegexTokenizer {
    fn build_token(&self, value: String, span: Span, token_type: TokenType) -> Token {
        let token = Token::new(value.clone(), span, token_type);
        match (&self.morph, token_type) {
            (Some(morph), TokenType::RussianWord) => token.with_forms(parse(morph, &value)),
            _ => token,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_words_and_punctuation() {
        let tokenizer = RegexTokenizer::new();
        let tokens = tokenizer.tokenize("саша, иди домой!").unwrap();
        let values: Vec<&str> = tokens.iter().map(|t| t.value.as_str()).collect();
        assert_eq!(values, vec!["саша", ",", "иди", "домой", "!"]);
    }

    #[test]
    fn spans_are_non_overlapping_and_monotonic() {
        let tokenizer = RegexTokenizer::new();
        let tokens = tokenizer.tokenize("a b c").unwrap();
        for pair in tokens.windows(2) {
            assert!(pair[0].span.stop <= pair[1].span.start);
        }
    }

    #[test]
    fn unrecognised_character_is_a_tokenize_error() {
        let tokenizer = RegexTokenizer::new();
        assert!(tokenizer.tokenize("саша \u{1F600}").is_err());
    }

    // Span-coverage property: concatenating token spans, re-inserting the
    // whitespace that separated them in the source, reconstructs the
    // original text exactly (spec §8's tokeniser span-coverage property).

    fn reconstruct(text: &str, tokens: &[Token]) -> String {
        let chars: Vec<char> = text.chars().collect();
        let mut out = String::new();
        let mut cursor = 0usize;
        for token in tokens {
            out.push_str(&chars[cursor..token.span.start].iter().collect::<String>());
            out.push_str(&chars[token.span.start..token.span.stop].iter().collect::<String>());
            cursor = token.span.stop;
        }
        out.push_str(&chars[cursor..].iter().collect::<String>());
        out
    }

    #[test]
    fn token_spans_with_inter_span_whitespace_reconstruct_the_source() {
        let tokenizer = RegexTokenizer::new();
        for text in ["саша идёт домой", "владимир путин, приехал в москву!", "a1 b2  c3", "одна\nдвух строка"] {
            let tokens = tokenizer.tokenize(text).unwrap();
            assert_eq!(reconstruct(text, &tokens), text, "failed to reconstruct {:?}", text);
        }
    }

    #[test]
    fn spans_never_overlap_and_start_is_monotonic() {
        let tokenizer = RegexTokenizer::new();
        let tokens = tokenizer.tokenize("саша, путин и владимир").unwrap();
        for pair in tokens.windows(2) {
            assert!(pair[0].span.stop <= pair[1].span.start);
            assert!(pair[0].span.start < pair[1].span.start);
        }
    }
}
