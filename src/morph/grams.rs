//! Gender/number/case agreement, grounded on `yargy/relations/bank.py`'s
//! `gender_relation`/`number_relation`/`case_relation`/`gnc_relation`.
//!
//! Grammeme spellings follow the pymorphy2 convention the source analyser
//! wraps: `masc`/`femn`/`neut`/`ms-f` (bigender, e.g. "сирота") for gender,
//! `sing`/`plur`/`Sgtm`/`Pltm` for number, the eleven Russian case tags for
//! case, and `Fixd` for indeclinable words.

use std::collections::BTreeSet;

struct GenderFlags {
    male: bool,
    female: bool,
    neutral: bool,
    bi: bool,
    general: bool,
}

fn gender_flags(grams: &BTreeSet<String>) -> GenderFlags {
    GenderFlags {
        male: grams.contains("masc"),
        female: grams.contains("femn"),
        neutral: grams.contains("neut"),
        bi: grams.contains("ms-f"),
        general: grams.contains("GNdr"),
    }
}

struct NumberFlags {
    single: bool,
    plural: bool,
    only_single: bool,
    only_plural: bool,
}

fn number_flags(grams: &BTreeSet<String>) -> NumberFlags {
    NumberFlags {
        single: grams.contains("sing"),
        plural: grams.contains("plur"),
        only_single: grams.contains("Sgtm"),
        only_plural: grams.contains("Pltm"),
    }
}

const CASES: [&str; 10] = [
    "nomn", "gent", "datv", "accs", "ablt", "loct", "gen2", "acc2", "loc2", "voct",
];

fn case_of(grams: &BTreeSet<String>) -> Option<&'static str> {
    CASES.iter().find(|c| grams.contains(**c)).copied()
}

fn is_fixed(grams: &BTreeSet<String>) -> bool {
    grams.contains("Fixd")
}

/// Do two forms agree in gender, treating any plural pair as agreeing
/// (gender is neutralised in the plural in Russian).
pub fn gender_agrees(a: &BTreeSet<String>, b: &BTreeSet<String>) -> bool {
    let an = number_flags(a);
    let bn = number_flags(b);
    if an.plural && bn.plural {
        return true;
    }
    let ag = gender_flags(a);
    let bg = gender_flags(b);
    (ag.male && bg.male)
        || (ag.female && bg.female)
        || (ag.neutral && bg.neutral)
        || (ag.bi && (bg.male || bg.female))
        || (bg.bi && (ag.male || ag.female))
        || ag.general
        || bg.general
}

/// Do two forms agree in number.
pub fn number_agrees(a: &BTreeSet<String>, b: &BTreeSet<String>) -> bool {
    let an = number_flags(a);
    let bn = number_flags(b);
    (an.single && bn.single)
        || (an.plural && bn.plural)
        || (an.only_single && bn.single)
        || (an.only_plural && bn.plural)
        || (bn.only_single && an.single)
        || (bn.only_plural && an.plural)
}

/// Do two forms agree in case, an indeclinable form agreeing with anything.
pub fn case_agrees(a: &BTreeSet<String>, b: &BTreeSet<String>) -> bool {
    let a_case = case_of(a);
    let b_case = case_of(b);
    a_case == b_case || is_fixed(a) || is_fixed(b)
}

/// Gender + number + case agreement combined.
pub fn gnc_agrees(a: &BTreeSet<String>, b: &BTreeSet<String>) -> bool {
    gender_agrees(a, b) && number_agrees(a, b) && case_agrees(a, b)
}
