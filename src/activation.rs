use std::rc::Rc;

use crate::error::GrammarError;
use crate::morph::Morph;
use crate::token::TokenType;

/// Context supplied to every predicate/pipeline during the normalisation
/// pipeline's "Activate" pass (spec §4.2 step 1): a handle to the
/// morphology adapter, used to validate grammemes and token types the
/// grammar author named before any text is parsed.
pub struct ActivationContext {
    pub morph: Rc<dyn Morph>,
}

impl ActivationContext {
    pub fn new(morph: Rc<dyn Morph>) -> Self {
        Self { morph }
    }

    pub fn check_gram(&self, gram: &str) -> Result<(), GrammarError> {
        self.morph.check_gram(gram)
    }

    pub fn check_token_type(&self, name: &str) -> Result<(), GrammarError> {
        TokenType::from_name(name)
            .map(|_| ())
            .ok_or_else(|| GrammarError::UnknownTokenType(name.to_string()))
    }
}
