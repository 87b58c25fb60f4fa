use std::fmt::{Display, Formatter};

/// An error raised while constructing or normalising a grammar.
///
/// Grammar errors surface eagerly, at grammar activation time, not while
/// parsing text: unknown grammemes, unclosed forward references and
/// malformed relation usage are all detectable from the grammar alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GrammarError {
    UnknownGrammeme(String),
    UnknownTokenType(String),
    UndefinedForward,
    MixedKindComposition(&'static str),
    RelationArity { label: String, seen: usize },
    InvalidRepeatBounds { min: usize, max: Option<usize> },
}

impl Display for GrammarError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            GrammarError::UnknownGrammeme(g) => write!(f, "unknown grammeme '{}'", g),
            GrammarError::UnknownTokenType(t) => write!(f, "unknown token type '{}'", t),
            GrammarError::UndefinedForward => write!(f, "grammar not closed: forward() rule without a define()"),
            GrammarError::MixedKindComposition(what) => {
                write!(f, "{} mixes predicates and relations in the same composition", what)
            }
            GrammarError::RelationArity { label, seen } => write!(
                f,
                "relation '{}' must be used exactly twice in the grammar, found {} use(s)",
                label, seen
            ),
            GrammarError::InvalidRepeatBounds { min, max } => match max {
                Some(max) => write!(f, "invalid repeat bounds: min={} max={}", min, max),
                None => write!(f, "invalid repeat bounds: min={} (must be >= 1)", min),
            },
        }
    }
}

impl std::error::Error for GrammarError {}

/// An error raised lazily, the first time a match's `.fact()` is reduced.
///
/// Per-match: a single malformed match never aborts the surrounding match
/// stream, it only poisons that one match's fact access.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InterpretationError {
    ChainExpectedSingleValue,
    IncompatibleFactMerge { schema: &'static str, other: &'static str },
    MissingMainTerm,
    /// The start rule's tree, after hoisting through every uninterpreted
    /// wrapper, did not reduce to exactly one top-level result (spec
    /// §4.6: "the root must bear an interpretator").
    RootNotInterpreted,
}

impl Display for InterpretationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            InterpretationError::ChainExpectedSingleValue => {
                write!(f, "a chain of tokens reached an interpretator expecting a single value")
            }
            InterpretationError::IncompatibleFactMerge { schema, other } => {
                write!(f, "cannot merge fact of schema '{}' into '{}'", other, schema)
            }
            InterpretationError::MissingMainTerm => {
                write!(f, "relation-bound production has no designated main term")
            }
            InterpretationError::RootNotInterpreted => {
                write!(f, "match's start rule did not reduce to a single interpreted result")
            }
        }
    }
}

impl std::error::Error for InterpretationError {}

/// Input-side error: the tokeniser encountered a slice of text it could not
/// categorise into any of the closed, extensible token types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenizeError {
    pub pointer: usize,
    pub message: String,
}

impl TokenizeError {
    pub fn new(pointer: usize, message: impl Into<String>) -> Self {
        Self { pointer, message: message.into() }
    }
}

impl Display for TokenizeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "token type not recognised at byte {}: {}", self.pointer, self.message)
    }
}

impl std::error::Error for TokenizeError {}
