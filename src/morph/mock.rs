use std::collections::{BTreeSet, HashMap};

use crate::error::GrammarError;

use super::Morph;

type RawForm = (&'static str, &'static [&'static str]);

/// A small, deterministic, in-memory morphological analyser.
///
/// `yargy`'s own adapter wraps `pymorphy2`; this crate specifies only the
/// [`Morph`] contract (spec §6) and ships [`MockMorph`] as the default,
/// test-oriented implementation — a hand-built lexicon covering exactly the
/// literal scenarios in spec §8, plus a guesser for out-of-vocabulary
/// Russian words so arbitrary text never fails to parse.
#[derive(Debug, Default)]
pub struct MockMorph {
    /// surface word (lowercase) -> analyses
    analyses: HashMap<&'static str, Vec<RawForm>>,
    /// (lemma, sorted target grammeme key) -> inflected surface
    inflections: HashMap<(&'static str, &'static str), &'static str>,
    known_grammemes: BTreeSet<&'static str>,
}

const KNOWN_GRAMMEMES: &[&str] = &[
    "NOUN", "ADJF", "VERB", "Name", "Surn", "Patr", "Geox",
    "masc", "femn", "neut", "ms-f", "GNdr",
    "sing", "plur", "Sgtm", "Pltm",
    "nomn", "gent", "datv", "accs", "ablt", "loct", "gen2", "acc2", "loc2", "voct",
    "anim", "inan", "Fixd",
];

fn lexicon() -> Vec<(&'static str, Vec<RawForm>)> {
    vec![
        ("московским", vec![
            ("московский", &["ADJF", "masc", "datv", "sing"]),
            ("московский", &["ADJF", "neut", "ablt", "sing"]),
        ]),
        ("московский", vec![("московский", &["ADJF", "masc", "nomn", "sing"])]),
        ("московская", vec![("московский", &["ADJF", "femn", "nomn", "sing"])]),
        ("саше", vec![("саша", &["Name", "anim", "masc", "datv", "sing"])]),
        ("саша", vec![("саша", &["Name", "anim", "masc", "nomn", "sing"])]),
        ("сашу", vec![("саша", &["Name", "anim", "masc", "accs", "sing"])]),
        ("иванову", vec![("иванов", &["Surn", "anim", "masc", "datv", "sing"])]),
        ("иванов", vec![("иванов", &["Surn", "anim", "masc", "nomn", "sing"])]),
        ("ивановой", vec![("иванов", &["Surn", "anim", "femn", "gent", "sing"])]),
        ("владимир", vec![
            ("владимир", &["Name", "anim", "masc", "nomn", "sing"]),
            ("владимир", &["Geox", "inan", "masc", "nomn", "sing", "Fixd"]),
        ]),
        ("путин", vec![("путин", &["Surn", "anim", "masc", "nomn", "sing"])]),
        ("приехал", vec![("приехать", &["VERB", "masc", "sing"])]),
        ("в", vec![("в", &["PREP", "Fixd"])]),
        ("сирота", vec![("сирота", &["NOUN", "ms-f", "anim", "nomn", "sing"])]),
        ("стали", vec![
            ("сталь", &["NOUN", "femn", "inan", "gent", "sing"]),
            ("стать", &["VERB", "plur"]),
        ]),
        ("александру", vec![("александр", &["Name", "anim", "masc", "datv", "sing"])]),
    ]
}

fn inflection_table() -> Vec<((&'static str, &'static str), &'static str)> {
    vec![
        (("московский", "femn,nomn,sing"), "московская"),
        (("московский", "masc,nomn,sing"), "московский"),
        (("александр", "masc,nomn,sing"), "александр"),
        (("александр", "nomn,plur"), "александры"),
    ]
}

fn gram_key(grams: &BTreeSet<String>) -> String {
    let mut items: Vec<&str> = grams.iter().map(|s| s.as_str()).collect();
    items.sort_unstable();
    items.join(",")
}

impl MockMorph {
    pub fn new() -> Self {
        let mut analyses = HashMap::new();
        for (word, forms) in lexicon() {
            analyses.insert(word, forms);
        }
        let mut inflections = HashMap::new();
        for (key, value) in inflection_table() {
            inflections.insert(key, value);
        }
        Self { analyses, inflections, known_grammemes: KNOWN_GRAMMEMES.iter().copied().collect() }
    }

    fn guess(word: &str) -> Vec<(String, BTreeSet<String>)> {
        let lower = word.to_lowercase();
        let grams: BTreeSet<String> = ["NOUN", "inan", "nomn", "sing"].iter().map(|s| s.to_string()).collect();
        vec![(lower, grams)]
    }
}

impl Morph for MockMorph {
    fn raw_parse(&self, word: &str) -> Vec<(String, BTreeSet<String>)> {
        let lower = word.to_lowercase();
        match self.analyses.get(lower.as_str()) {
            Some(forms) => forms
                .iter()
                .map(|(lemma, grams)| ((*lemma).to_string(), grams.iter().map(|s| s.to_string()).collect()))
                .collect(),
            None => Self::guess(word),
        }
    }

    fn normalized(&self, word: &str) -> BTreeSet<String> {
        self.raw_parse(word).into_iter().map(|(lemma, _)| lemma).collect()
    }

    fn check_gram(&self, gram: &str) -> Result<(), GrammarError> {
        if self.known_grammemes.contains(gram) {
            Ok(())
        } else {
            Err(GrammarError::UnknownGrammeme(gram.to_string()))
        }
    }

    fn raw_inflect(
        &self,
        lemma: &str,
        source_grams: &BTreeSet<String>,
        _word: &str,
        target: &BTreeSet<String>,
    ) -> Option<String> {
        // `target` names only the grammeme categories the caller cares about
        // (e.g. gender); number carries over from the source form unless the
        // caller overrides it too.
        let mut wanted = target.clone();
        if !wanted.contains("sing") && !wanted.contains("plur") {
            if let Some(number) = source_grams.iter().find(|g| g.as_str() == "sing" || g.as_str() == "plur") {
                wanted.insert(number.clone());
            }
        }
        let key = gram_key(&wanted);
        self.inflections.get(&(lemma, key.as_str())).map(|s| s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_bigender_noun() {
        let morph = MockMorph::new();
        let forms = morph.raw_parse("сирота");
        assert_eq!(forms.len(), 1);
        assert_eq!(forms[0].0, "сирота");
        assert!(forms[0].1.contains("ms-f"));
    }

    #[test]
    fn normalized_returns_all_lemmas() {
        let morph = MockMorph::new();
        let lemmas = morph.normalized("стали");
        assert_eq!(lemmas, BTreeSet::from(["сталь".to_string(), "стать".to_string()]));
    }

    #[test]
    fn unknown_gram_is_rejected() {
        let morph = MockMorph::new();
        assert!(morph.check_gram("verb").is_err());
        assert!(morph.check_gram("VERB").is_ok());
    }

    #[test]
    fn out_of_vocabulary_word_still_gets_a_guess() {
        let morph = MockMorph::new();
        let forms = morph.raw_parse("неизвестное");
        assert_eq!(forms.len(), 1);
    }
}
