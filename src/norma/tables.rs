//! Static registry data: radix forms, suffix vocabulary, and per-target
//! translations. Plain constants loaded once (spec.md §9 "Registry as pure
//! data"), mirroring the `lexicon` module's table style.

use super::{FormKind, Translation};
use once_cell::sync::Lazy;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Target {
    TypeScript,
    Python,
    Cpp,
}

/// Known morphological suffixes, independent of any one stem. A stem only
/// accepts a suffix if the suffix's form name also appears in that stem's
/// declared `radix` set.
const SUFFIX_TABLE: &[(&str, FormKind)] = &[
    ("e", FormKind::Imperativus),
    ("ita", FormKind::Perfectum),
    ("itura", FormKind::FuturumActivum),
];

pub fn suffix_to_form(suffix: &str) -> Option<FormKind> {
    SUFFIX_TABLE.iter().find(|(s, _)| *s == suffix).map(|(_, f)| f.clone())
}

/// `collection -> stem -> declared form names`. Equivalent to what an
/// in-language `@ radix stem, form, …` annotation declares for a stdlib
/// collection's own methods.
pub static RADIX: Lazy<HashMap<&'static str, HashMap<&'static str, Vec<&'static str>>>> = Lazy::new(|| {
    let mut m = HashMap::new();
    m.insert("lista", HashMap::from([("add", vec!["imperativus", "perfectum"])]));
    m.insert(
        "tabula",
        HashMap::from([
            ("pon", vec!["imperativus"]),
            ("tolle", vec!["imperativus", "perfectum"]),
        ]),
    );
    m.insert("copia", HashMap::from([("adde", vec!["imperativus"])]));
    m
});

macro_rules! translation_map {
    ($($target:expr => $t:expr),+ $(,)?) => {{
        let mut m = HashMap::new();
        $(m.insert($target, $t);)+
        m
    }};
}

/// `collection -> method -> target -> translation`.
pub static TRANSLATIONS: Lazy<HashMap<&'static str, HashMap<&'static str, HashMap<Target, Translation>>>> = Lazy::new(|| {
    let mut m: HashMap<&'static str, HashMap<&'static str, HashMap<Target, Translation>>> = HashMap::new();

    m.insert(
        "lista",
        HashMap::from([
            (
                "adde",
                translation_map! {
                    Target::TypeScript => Translation::Rename("push".into()),
                    Target::Python => Translation::Rename("append".into()),
                    Target::Cpp => Translation::Rename("push_back".into()),
                },
            ),
            (
                "addita",
                translation_map! {
                    Target::TypeScript => Translation::Template {
                        template: "[...\u{00A7}, \u{00A7}1]".into(),
                        param_names: vec!["valor".into()],
                    },
                    Target::Python => Translation::Template {
                        template: "[*\u{00A7}, \u{00A7}1]".into(),
                        param_names: vec!["valor".into()],
                    },
                },
            ),
            (
                "numerus",
                translation_map! {
                    Target::TypeScript => Translation::Rename("length".into()),
                    Target::Python => Translation::Template { template: "len(\u{00A7})".into(), param_names: vec![] },
                    Target::Cpp => Translation::Rename("size".into()),
                },
            ),
        ]),
    );

    m.insert(
        "tabula",
        HashMap::from([
            (
                "pon",
                translation_map! {
                    Target::TypeScript => Translation::Template {
                        template: "\u{00A7}.set(\u{00A7}1, \u{00A7}2)".into(),
                        param_names: vec!["clavis".into(), "valor".into()],
                    },
                    Target::Python => Translation::Template {
                        template: "\u{00A7}[\u{00A7}1] = \u{00A7}2".into(),
                        param_names: vec!["clavis".into(), "valor".into()],
                    },
                },
            ),
            (
                "tolle",
                translation_map! {
                    Target::TypeScript => Translation::Template {
                        template: "\u{00A7}.delete(\u{00A7}1)".into(),
                        param_names: vec!["clavis".into()],
                    },
                    Target::Python => Translation::Template {
                        template: "del \u{00A7}[\u{00A7}1]".into(),
                        param_names: vec!["clavis".into()],
                    },
                },
            ),
        ]),
    );

    m.insert(
        "copia",
        HashMap::from([(
            "adde",
            translation_map! {
                Target::TypeScript => Translation::Rename("add".into()),
                Target::Python => Translation::Rename("add".into()),
                Target::Cpp => Translation::Rename("insert".into()),
            },
        )]),
    );

    m.insert(
        "textus",
        HashMap::from([
            (
                "longitudo",
                translation_map! {
                    Target::TypeScript => Translation::Rename("length".into()),
                    Target::Python => Translation::Template { template: "len(\u{00A7})".into(), param_names: vec![] },
                },
            ),
            (
                "maiuscula",
                translation_map! {
                    Target::TypeScript => Translation::Rename("toUpperCase".into()),
                    Target::Python => Translation::Rename("upper".into()),
                },
            ),
        ]),
    );

    m
});

/// Free-function module lookup table for `mathematica`/`tempus`/`fortuna`.
pub static MODULE_TRANSLATIONS: Lazy<HashMap<&'static str, HashMap<&'static str, HashMap<Target, Translation>>>> = Lazy::new(|| {
    let mut m: HashMap<&'static str, HashMap<&'static str, HashMap<Target, Translation>>> = HashMap::new();

    m.insert(
        "mathematica",
        HashMap::from([
            (
                "radix",
                translation_map! {
                    Target::TypeScript => Translation::Template { template: "Math.sqrt(\u{00A7})".into(), param_names: vec![] },
                    Target::Python => Translation::Template { template: "math.sqrt(\u{00A7})".into(), param_names: vec![] },
                    Target::Cpp => Translation::Template { template: "std::sqrt(\u{00A7})".into(), param_names: vec![] },
                },
            ),
            (
                "maximum",
                translation_map! {
                    Target::TypeScript => Translation::Template { template: "Math.max(\u{00A7}1, \u{00A7}2)".into(), param_names: vec!["a".into(), "b".into()] },
                    Target::Python => Translation::Template { template: "max(\u{00A7}1, \u{00A7}2)".into(), param_names: vec!["a".into(), "b".into()] },
                },
            ),
        ]),
    );

    m.insert(
        "tempus",
        HashMap::from([(
            "nunc",
            translation_map! {
                Target::TypeScript => Translation::Template { template: "Date.now()".into(), param_names: vec![] },
                Target::Python => Translation::Template { template: "time.time()".into(), param_names: vec![] },
            },
        )]),
    );

    m.insert(
        "fortuna",
        HashMap::from([(
            "iace",
            translation_map! {
                Target::TypeScript => Translation::Template { template: "Math.random()".into(), param_names: vec![] },
                Target::Python => Translation::Template { template: "random.random()".into(), param_names: vec![] },
            },
        )]),
    );

    m
});
