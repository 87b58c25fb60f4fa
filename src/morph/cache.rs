use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap, VecDeque};
use std::rc::Rc;

use crate::error::GrammarError;

use super::Morph;

const DEFAULT_CAPACITY: usize = 100_000;

/// An LRU cache of lemmatisation results in front of any [`Morph`].
///
/// Per spec §5, the morphology adapter's cache is the only mutable
/// process-wide state in the system; `yargy`'s `CachedMorphAnalyzer`
/// (`yargy/morph.py`) wraps `pymorphy2` with an unbounded `functools.lru_cache`.
/// Here the bound is explicit (default 100,000 entries) and eviction is a
/// plain insertion-order queue, matching the teacher's own `Cache<TP,
/// TToken>` (`src/cache.rs`) in spirit: interior mutability behind a shared
/// handle rather than threaded `&mut` state, because the morphology handle
/// is shared by `Rc` across the whole grammar rather than passed by value
/// through every call as the teacher's chart cache is.
#[derive(Debug)]
pub struct CachedMorph<M: Morph> {
    inner: M,
    capacity: usize,
    parse_cache: RefCell<HashMap<String, Rc<Vec<(String, BTreeSet<String>)>>>>,
    order: RefCell<VecDeque<String>>,
}

impl<M: Morph> CachedMorph<M> {
    pub fn new(inner: M) -> Self {
        Self::with_capacity(inner, DEFAULT_CAPACITY)
    }

    pub fn with_capacity(inner: M, capacity: usize) -> Self {
        Self {
            inner,
            capacity,
            parse_cache: RefCell::new(HashMap::new()),
            order: RefCell::new(VecDeque::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.parse_cache.borrow().len()
    }

    fn evict_if_needed(&self) {
        let mut cache = self.parse_cache.borrow_mut();
        let mut order = self.order.borrow_mut();
        while cache.len() > self.capacity {
            if let Some(oldest) = order.pop_front() {
                cache.remove(&oldest);
            } else {
                break;
            }
        }
    }
}

impl<M: Morph> Morph for CachedMorph<M> {
    fn raw_parse(&self, word: &str) -> Vec<(String, BTreeSet<String>)> {
        if let Some(hit) = self.parse_cache.borrow().get(word) {
            return hit.as_ref().clone();
        }
        let result = Rc::new(self.inner.raw_parse(word));
        self.parse_cache.borrow_mut().insert(word.to_string(), result.clone());
        self.order.borrow_mut().push_back(word.to_string());
        self.evict_if_needed();
        result.as_ref().clone()
    }

    fn normalized(&self, word: &str) -> BTreeSet<String> {
        self.raw_parse(word).into_iter().map(|(lemma, _)| lemma).collect()
    }

    fn check_gram(&self, gram: &str) -> Result<(), GrammarError> {
        self.inner.check_gram(gram)
    }

    fn raw_inflect(
        &self,
        lemma: &str,
        source_grams: &BTreeSet<String>,
        word: &str,
        target: &BTreeSet<String>,
    ) -> Option<String> {
        self.inner.raw_inflect(lemma, source_grams, word, target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::morph::MockMorph;

    #[test]
    fn repeated_lookups_are_served_from_cache() {
        let cached = CachedMorph::new(MockMorph::new());
        cached.raw_parse("сирота");
        cached.raw_parse("сирота");
        assert_eq!(cached.len(), 1);
    }

    #[test]
    fn cache_evicts_down_to_capacity() {
        let cached = CachedMorph::with_capacity(MockMorph::new(), 2);
        cached.raw_parse("саша");
        cached.raw_parse("иванов");
        cached.raw_parse("путин");
        assert!(cached.len() <= 2);
    }
}
