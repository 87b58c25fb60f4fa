//! Default token-type rules for Russian text, grounded on the teacher's
//! `lexeme::Pattern` regex-driven terminals (`src/lexeme/pattern.rs`).

use once_cell::sync::Lazy;
use regex::Regex;

use crate::token::TokenType;

/// One regex-backed token rule: `pattern` must match starting at the
/// current position; the first rule (in declaration order) that matches
/// wins, mirroring the teacher's ordered `Vec<Rc<dyn ILexeme>>` scan.
pub struct TokenRule {
    pub token_type: TokenType,
    pub pattern: &'static Regex,
}

static RUSSIAN_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[А-Яа-яЁё]+(-[А-Яа-яЁё]+)*").unwrap());
static LATIN_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z]+(-[A-Za-z]+)*").unwrap());
static INTEGER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]+").unwrap());
static LINE_BREAK: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\r\n|^\n").unwrap());
static PUNCTUATION: Lazy<Regex> = Lazy::new(|| Regex::new(r#"^[.,!?;:()\[\]{}"'«»\-—–]"#).unwrap());

/// The default rule set: Russian words, Latin words, integers, line
/// breaks, then punctuation. Whitespace between matches is skipped by the
/// tokenizer itself, not by a rule (spec §6's tokeniser contract only
/// speaks of non-overlapping token spans, not of a whitespace token).
pub fn default_rules() -> Vec<TokenRule> {
    vec![
        TokenRule { token_type: TokenType::RussianWord, pattern: &RUSSIAN_WORD },
        TokenRule { token_type: TokenType::LatinWord, pattern: &LATIN_WORD },
        TokenRule { token_type: TokenType::Integer, pattern: &INTEGER },
        TokenRule { token_type: TokenType::LineBreak, pattern: &LINE_BREAK },
        TokenRule { token_type: TokenType::Punctuation, pattern: &PUNCTUATION },
    ]
}
