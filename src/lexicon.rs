//! Static vocabulary tables: the reserved-word set and its contextual roles.
//!
//! This is leaf data — no other module in the crate depends on anything but
//! these tables and `std`. Kept as plain constants/statics rather than behind a
//! singleton, per the registry-as-pure-data design principle this crate follows
//! throughout (see `norma::tables`).

use once_cell::sync::Lazy;
use std::collections::HashMap;

/// A reserved Latin word. The tokenizer only ever checks membership in this set
/// to decide `TokenKind::Keyword` vs `TokenKind::Identifier`; it never decides
/// *how* a keyword is used at a given position — that's the parser's job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Keyword {
    // declarations
    Fixum,    // let (immutable)
    Variabile, // let mut
    Functio,  // fn
    Genus,    // struct
    Pactum,   // interface
    Ordo,     // enum
    Discretio, // tagged union
    Typus,    // type alias
    Importa,  // import
    Subsidia, // HAL re-export keyword (also an annotation name)

    // control flow
    Si,       // if
    Aliter,   // else
    Dum,      // while
    Fac,      // do (do-while)
    Ex,       // for-of (`ex collection ...`)
    De,       // for-in (`de object ...`)
    Per,      // step (`per N`)
    Cum,      // switch (value)
    Discerne, // match (variant)
    Casu,     // match-case label
    Ut,       // whole-value bind in a case
    Pro,      // positional-field bind in a case
    Tutare,   // guard
    Cura,     // resource-scope
    Dispatch, // dispatch statement

    // error handling
    Tenta,    // try
    Cape,     // catch
    Denique,  // finally
    Iacit,    // throw (single-statement form)
    Moritor,  // panic (single-statement form)

    // body forms
    Ergo,     // single-statement block
    Reddit,   // single-return block

    // output / IO
    Scribe,   // print
    Vide,     // debug
    Mone,     // warn
    Lege,     // read stdin

    // entry points / tests
    Incipit,  // sync entry
    Incipiet, // async entry
    Probatio, // test suite
    Casus,    // test case
    Praepara, // setup
    Purga,    // teardown

    // iteration binding mutability / async markers
    Figendum,   // async for-of binding
    Variandum,  // async for-in binding

    // operators expressed as words
    Non,      // logical not
    Vacuum,   // empty-check
    Certus,   // non-null/strict check
    Novum,    // `new`
    Expecta,  // await
  Converte, // cast (`as`-equivalent)
    Tempta,   // fallible conversion with fallback
    Vel,      // nullish-coalescing
    Aut,      // logical or (word form)
    Et,       // logical and (word form)
    Intra,    // type-check (`is`-equivalent)

    // stream protocol (parsed, evaluation dormant — see spec.md open question a)
    Fit,
    Fiet,
    Fiunt,
    Fient,

    // self
    Ego,

    // literals introduced by a keyword rather than a symbol
    Regula, // regex literal sigil (`regula/pattern/flags`)
    Mox,    // compile-time block (`mox { ... }`)

    // visibility / modifiers (also annotation names)
    Publicum,
    Privatum,
    Protectum,
    Abstracta,
    Statica,
}

pub const ALL_KEYWORDS: &[(&str, Keyword)] = &[
    ("fixum", Keyword::Fixum),
    ("variabile", Keyword::Variabile),
    ("functio", Keyword::Functio),
    ("genus", Keyword::Genus),
    ("pactum", Keyword::Pactum),
    ("ordo", Keyword::Ordo),
    ("discretio", Keyword::Discretio),
    ("typus", Keyword::Typus),
    ("importa", Keyword::Importa),
    ("subsidia", Keyword::Subsidia),
    ("si", Keyword::Si),
    ("aliter", Keyword::Aliter),
    ("dum", Keyword::Dum),
    ("fac", Keyword::Fac),
    ("ex", Keyword::Ex),
    ("de", Keyword::De),
    ("per", Keyword::Per),
    ("cum", Keyword::Cum),
    ("discerne", Keyword::Discerne),
    ("casu", Keyword::Casu),
    ("ut", Keyword::Ut),
    ("pro", Keyword::Pro),
    ("tutare", Keyword::Tutare),
    ("cura", Keyword::Cura),
    ("dispatch", Keyword::Dispatch),
    ("tenta", Keyword::Tenta),
    ("cape", Keyword::Cape),
    ("denique", Keyword::Denique),
    ("iacit", Keyword::Iacit),
    ("moritor", Keyword::Moritor),
    ("ergo", Keyword::Ergo),
    ("reddit", Keyword::Reddit),
    ("scribe", Keyword::Scribe),
    ("vide", Keyword::Vide),
    ("mone", Keyword::Mone),
    ("lege", Keyword::Lege),
    ("incipit", Keyword::Incipit),
    ("incipiet", Keyword::Incipiet),
    ("probatio", Keyword::Probatio),
    ("casus", Keyword::Casus),
    ("praepara", Keyword::Praepara),
    ("purga", Keyword::Purga),
    ("figendum", Keyword::Figendum),
    ("variandum", Keyword::Variandum),
    ("non", Keyword::Non),
    ("vacuum", Keyword::Vacuum),
    ("certus", Keyword::Certus),
    ("novum", Keyword::Novum),
    ("expecta", Keyword::Expecta),
    ("converte", Keyword::Converte),
    ("tempta", Keyword::Tempta),
    ("vel", Keyword::Vel),
    ("aut", Keyword::Aut),
    ("et", Keyword::Et),
    ("intra", Keyword::Intra),
    ("fit", Keyword::Fit),
    ("fiet", Keyword::Fiet),
    ("fiunt", Keyword::Fiunt),
    ("fient", Keyword::Fient),
    ("ego", Keyword::Ego),
    ("regula", Keyword::Regula),
    ("mox", Keyword::Mox),
    ("publicum", Keyword::Publicum),
    ("privatum", Keyword::Privatum),
    ("protectum", Keyword::Protectum),
    ("abstracta", Keyword::Abstracta),
    ("statica", Keyword::Statica),
];

pub static KEYWORD_MAP: Lazy<HashMap<&'static str, Keyword>> =
    Lazy::new(|| ALL_KEYWORDS.iter().copied().collect());

/// Words that, when followed on the same line by an operand-starting token, act
/// as unary operators rather than literals/identifiers. The parser — not the
/// tokenizer — consults this set; see spec.md §4.3 "Contextual keyword
/// disambiguation".
pub static CONTEXTUAL_UNARY_WORDS: Lazy<Vec<Keyword>> = Lazy::new(|| {
    vec![
        Keyword::Non,
        Keyword::Vacuum,
        Keyword::Certus,
        Keyword::Novum,
        Keyword::Expecta,
    ]
});

pub fn lookup_keyword(word: &str) -> Option<Keyword> {
    KEYWORD_MAP.get(word).copied()
}

/// Built-in type names the generator maps per target; see spec.md §4.6 "Name
/// mapping".
pub const BUILTIN_TYPE_NAMES: &[&str] =
    &["textus", "numerus", "logicus", "lista", "tabula", "copia", "nihil"];
