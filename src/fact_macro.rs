//! `fact!` construction sugar (spec §3, §4.9's `fact(name, attrs)`),
//! grounded on the same mechanical boilerplate-reduction idiom as
//! [`crate::relation`]'s `grams_relation!` macro, applied here to
//! [`crate::interpretation::FactSchema`] instead of relation types.

/// Build a [`crate::interpretation::FactSchema`] from a name and a list of
/// attribute schemas, e.g. `fact!("Person", attribute("first"),
/// attribute("last").repeatable())`.
#[macro_export]
macro_rules! fact {
    ($name:expr $(, $attr:expr)* $(,)?) => {
        $crate::interpretation::FactSchema::new($name, vec![$($attr),*])
    };
}

#[cfg(test)]
mod tests {
    use crate::interpretation::attribute;

    #[test]
    fn builds_a_schema_with_mixed_attributes() {
        let schema = fact!("Person", attribute("first"), attribute("last").repeatable());
        assert_eq!(schema.name, "Person");
        assert_eq!(schema.attributes.len(), 2);
        assert!(schema.is_repeatable("last"));
        assert!(!schema.is_repeatable("first"));
    }

    #[test]
    fn supports_a_single_attribute_with_no_trailing_comma() {
        let schema = fact!("City", attribute("name"));
        assert_eq!(schema.attributes.len(), 1);
    }
}
