//! Phrase-joining pipelines (spec §4.3, §6): dictionary lookups that
//! collapse a run of tokens into one match without a hand-written grammar
//! rule per entry, grounded on `yargy/pipelines.py`'s three morph pipelines.

use std::collections::HashMap;
use std::fmt::Debug;

use crate::morph::Morph;
use crate::token::Token;

/// Build a first-word -> phrase-index index so `step()` only ever scans the
/// handful of entries that could possibly continue, instead of every
/// dictionary entry (spec §4.3: "mandatory for dictionary pipelines where
/// the alternative count may be in the thousands").
fn index_by_first_word(phrases: &[Vec<String>]) -> HashMap<String, Vec<usize>> {
    let mut index: HashMap<String, Vec<usize>> = HashMap::new();
    for (i, phrase) in phrases.iter().enumerate() {
        if let Some(first) = phrase.first() {
            index.entry(first.clone()).or_default().push(i);
        }
    }
    index
}

/// A phrase-joining strategy consulted by the chart parser whenever it
/// reaches a [`crate::rule::Rule::Pipeline`] state: given the next token and
/// however much of a candidate phrase has matched so far, decide whether to
/// keep extending, accept, or fail.
pub trait Pipeline: Debug {
    /// Try to extend `matched_so_far` (already-accepted tokens of this
    /// phrase) with `token`. `None` if `token` cannot continue any entry
    /// sharing `matched_so_far`'s prefix.
    fn step(&self, matched_so_far: &[Token], token: &Token) -> Option<PipelineStep>;

    fn label(&self) -> String;
}

/// Outcome of extending a candidate phrase by one token. Both flags may be
/// set: a shorter entry can be a strict prefix of a longer one (e.g. "санкт
/// петербург" and "санкт петербург сити"), so accepting here doesn't rule
/// out continuing to a longer match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineStep {
    /// The prefix matched so far is itself a complete dictionary entry.
    pub accepted: bool,
    /// Extending the prefix by one more token might still match an entry.
    pub continues: bool,
}

/// Exact case-sensitive token-value phrase dictionary
/// (`yargy.pipelines.morph_pipeline`'s literal-value matching mode).
#[derive(Debug)]
pub struct ExactPhrasePipeline {
    phrases: Vec<Vec<String>>,
    index: HashMap<String, Vec<usize>>,
}

impl ExactPhrasePipeline {
    pub fn new(phrases: impl IntoIterator<Item = Vec<String>>) -> Self {
        let phrases: Vec<Vec<String>> = phrases.into_iter().collect();
        let index = index_by_first_word(&phrases);
        Self { phrases, index }
    }

    fn matches_prefix(&self, words: &[&str]) -> (bool, bool) {
        let mut is_entry = false;
        let mut can_continue = false;
        let candidates = self.index.get(words[0]).map(|v| v.as_slice()).unwrap_or(&[]);
        for &i in candidates {
            let phrase = &self.phrases[i];
            if phrase.len() < words.len() {
                continue;
            }
            if phrase.iter().take(words.len()).map(|s| s.as_str()).eq(words.iter().copied()) {
                can_continue = true;
                if phrase.len() == words.len() {
                    is_entry = true;
                }
            }
        }
        (is_entry, can_continue)
    }
}

impl Pipeline for ExactPhrasePipeline {
    fn step(&self, matched_so_far: &[Token], token: &Token) -> Option<PipelineStep> {
        let mut words: Vec<&str> = matched_so_far.iter().map(|t| t.value.as_str()).collect();
        words.push(token.value.as_str());
        let (is_entry, can_continue) = self.matches_prefix(&words);
        if is_entry || can_continue {
            Some(PipelineStep { accepted: is_entry, continues: can_continue })
        } else {
            None
        }
    }

    fn label(&self) -> String {
        "morph_pipeline(exact)".to_string()
    }
}

/// Case-folded token-value phrase dictionary
/// (`yargy.pipelines.caseless_pipeline`).
#[derive(Debug)]
pub struct CaselessPhrasePipeline {
    phrases: Vec<Vec<String>>,
    index: HashMap<String, Vec<usize>>,
}

impl CaselessPhrasePipeline {
    pub fn new(phrases: impl IntoIterator<Item = Vec<String>>) -> Self {
        let phrases: Vec<Vec<String>> = phrases.into_iter().map(|p| p.into_iter().map(|w| w.to_lowercase()).collect()).collect();
        let index = index_by_first_word(&phrases);
        Self { phrases, index }
    }
}

impl Pipeline for CaselessPhrasePipeline {
    fn step(&self, matched_so_far: &[Token], token: &Token) -> Option<PipelineStep> {
        let mut words: Vec<String> = matched_so_far.iter().map(|t| t.value.to_lowercase()).collect();
        words.push(token.value.to_lowercase());

        let mut is_entry = false;
        let mut can_continue = false;
        let candidates = self.index.get(&words[0]).map(|v| v.as_slice()).unwrap_or(&[]);
        for &i in candidates {
            let phrase = &self.phrases[i];
            if phrase.len() < words.len() {
                continue;
            }
            if phrase.iter().take(words.len()).eq(words.iter()) {
                can_continue = true;
                if phrase.len() == words.len() {
                    is_entry = true;
                }
            }
        }
        if is_entry || can_continue {
            Some(PipelineStep { accepted: is_entry, continues: can_continue })
        } else {
            None
        }
    }

    fn label(&self) -> String {
        "caseless_pipeline".to_string()
    }
}

/// Lemma-set phrase dictionary (`yargy.pipelines.morph_pipeline`'s
/// normalized-form matching mode): each entry word is compared against the
/// token's normal forms rather than its surface value.
pub struct NormalizedPhrasePipeline {
    phrases: Vec<Vec<String>>,
    morph: std::rc::Rc<dyn Morph>,
    index: HashMap<String, Vec<usize>>,
}

impl std::fmt::Debug for NormalizedPhrasePipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NormalizedPhrasePipeline").field("phrases", &self.phrases).finish()
    }
}

impl NormalizedPhrasePipeline {
    pub fn new(phrases: impl IntoIterator<Item = Vec<String>>, morph: std::rc::Rc<dyn Morph>) -> Self {
        let phrases: Vec<Vec<String>> = phrases.into_iter().collect();
        let index = index_by_first_word(&phrases);
        Self { phrases, morph, index }
    }

    fn normal_forms(&self, token: &Token) -> Vec<String> {
        self.morph.normalized(&token.value).into_iter().collect()
    }

    /// Every phrase whose first lemma is one of `first_forms`, deduplicated
    /// and in ascending index order so iteration order (and hence
    /// `accepted`/`continues` ties) stays deterministic.
    fn candidates_for(&self, first_forms: &[String]) -> Vec<usize> {
        let mut indices: Vec<usize> = first_forms.iter().filter_map(|f| self.index.get(f)).flatten().copied().collect();
        indices.sort_unstable();
        indices.dedup();
        indices
    }
}

impl Pipeline for NormalizedPhrasePipeline {
    fn step(&self, matched_so_far: &[Token], token: &Token) -> Option<PipelineStep> {
        let mut candidates: Vec<Vec<String>> = matched_so_far.iter().map(|t| self.normal_forms(t)).collect();
        candidates.push(self.normal_forms(token));

        let mut is_entry = false;
        let mut can_continue = false;
        'phrase: for i in self.candidates_for(&candidates[0]) {
            let phrase = &self.phrases[i];
            if phrase.len() < candidates.len() {
                continue;
            }
            for (word, forms) in phrase.iter().zip(candidates.iter()) {
                if !forms.iter().any(|f| f == word) {
                    continue 'phrase;
                }
            }
            can_continue = true;
            if phrase.len() == candidates.len() {
                is_entry = true;
            }
        }
        if is_entry || can_continue {
            Some(PipelineStep { accepted: is_entry, continues: can_continue })
        } else {
            None
        }
    }

    fn label(&self) -> String {
        "morph_pipeline(normalized)".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::span::Span;
    use crate::token::TokenType;

    fn tok(value: &str) -> Token {
        Token::new(value, Span::new(0, value.chars().count()), TokenType::RussianWord)
    }

    #[test]
    fn exact_pipeline_accepts_full_phrase_only() {
        let p = ExactPhrasePipeline::new(vec![vec!["санкт".to_string(), "петербург".to_string()]]);
        assert_eq!(p.step(&[], &tok("санкт")), Some(PipelineStep { accepted: false, continues: true }));
        assert_eq!(p.step(&[tok("санкт")], &tok("петербург")), Some(PipelineStep { accepted: true, continues: false }));
        assert_eq!(p.step(&[], &tok("москва")), None);
    }

    #[test]
    fn caseless_pipeline_ignores_case() {
        let p = CaselessPhrasePipeline::new(vec![vec!["ООО".to_string()]]);
        assert_eq!(p.step(&[], &tok("ооо")), Some(PipelineStep { accepted: true, continues: false }));
    }

    #[test]
    fn exact_pipeline_index_does_not_cross_talk_between_first_words() {
        let p = ExactPhrasePipeline::new(vec![
            vec!["санкт".to_string(), "петербург".to_string()],
            vec!["нижний".to_string(), "новгород".to_string()],
        ]);
        // A first token matching one entry's first word must not surface the
        // other entry's continuation, even though both share a dictionary.
        assert_eq!(p.step(&[], &tok("нижний")), Some(PipelineStep { accepted: false, continues: true }));
        assert_eq!(p.step(&[tok("нижний")], &tok("петербург")), None);
        assert_eq!(p.step(&[tok("нижний")], &tok("новгород")), Some(PipelineStep { accepted: true, continues: false }));
    }
}
