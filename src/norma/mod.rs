//! The standard-library translation registry. See spec.md §4.4.
//!
//! Kept as static, read-only configuration consulted by the semantic pass and
//! every target generator alike — no per-call state, matching the
//! registry-as-pure-data principle this crate follows throughout (see
//! `lexicon`).

mod tables;

pub use tables::Target;

/// What a stdlib method call compiles down to for one target.
#[derive(Debug, Clone, PartialEq)]
pub enum Translation {
    Rename(String),
    Template { template: String, param_names: Vec<String> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormKind {
    /// Imperative — mutates the receiver (`adde`).
    Imperativus,
    /// Perfect participle — returns a new value (`addita`).
    Perfectum,
    /// Future active participle — declared but not yet backed by a target (`additura`).
    FuturumActivum,
}

impl FormKind {
    pub fn name(&self) -> &'static str {
        match self {
            FormKind::Imperativus => "imperativus",
            FormKind::Perfectum => "perfectum",
            FormKind::FuturumActivum => "futurum_activum",
        }
    }

    pub fn mutates_receiver(&self) -> bool {
        matches!(self, FormKind::Imperativus)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MorphologyMatch {
    pub stem: String,
    pub form: FormKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MorphologyOutcome {
    /// Not a recognized morphological stem on this collection — a user
    /// extension method; pass through untouched.
    NotMorphological,
    Valid(MorphologyMatch),
    /// Stem matched but the suffix is not a form declared for it.
    InvalidForm { stem: String, found_suffix: String, valid_forms: Vec<&'static str> },
}

/// Validates `method` against the declared radix forms for `collection`
/// (spec.md §4.4 "Morphology", steps 1-4).
pub fn validate_morphology(collection: &str, method: &str) -> MorphologyOutcome {
    let Some(stems) = tables::RADIX.get(collection) else {
        return MorphologyOutcome::NotMorphological;
    };

    let mut candidates: Vec<&&str> = stems.keys().collect();
    candidates.sort_by_key(|s| std::cmp::Reverse(s.len()));

    for stem in candidates {
        let Some(suffix) = method.strip_prefix(*stem) else { continue };
        if suffix.is_empty() {
            continue;
        }
        let Some(form) = tables::suffix_to_form(suffix) else { continue };
        let declared = &stems[stem];
        if declared.contains(&form.name()) {
            return MorphologyOutcome::Valid(MorphologyMatch { stem: stem.to_string(), form });
        }
        return MorphologyOutcome::InvalidForm {
            stem: stem.to_string(),
            found_suffix: suffix.to_string(),
            valid_forms: declared.clone(),
        };
    }
    MorphologyOutcome::NotMorphological
}

/// Names the form a raw suffix belongs to, independent of any one stem.
/// Used by diagnostic rendering to name the form found in an `InvalidForm`
/// outcome without re-deriving the suffix table outside this module.
pub fn form_name_for_suffix(suffix: &str) -> Option<&'static str> {
    tables::suffix_to_form(suffix).map(|f| f.name())
}

/// Looks up how `collection.method` translates for `target`.
pub fn lookup(collection: &str, method: &str, target: Target) -> Option<&'static Translation> {
    tables::TRANSLATIONS.get(collection)?.get(method)?.get(&target)
}

pub fn lookup_module_function(module: &str, function: &str, target: Target) -> Option<&'static Translation> {
    tables::MODULE_TRANSLATIONS.get(module)?.get(function)?.get(&target)
}

/// `applyTemplate(template, param-names, receiver, args)` — a pure function
/// over a `§`/`§N`/`§name` placeholder template (spec.md §4.4 "Templates").
///
/// Values are addressed as `[receiver, ...args]`. `§N` indexes that list
/// (1-based). `§name` looks `name` up in `param_names` (the registry's
/// documented argument names, e.g. `clavis`/`valor`) and resolves to the
/// same-position argument. Bare `§` consumes the next not-yet-consumed value
/// in order.
pub fn apply_template(template: &str, param_names: &[String], receiver: &str, args: &[String]) -> String {
    let mut values = Vec::with_capacity(1 + args.len());
    values.push(receiver.to_string());
    values.extend(args.iter().cloned());

    let mut out = String::new();
    let mut chars = template.chars().peekable();
    let mut cursor = 0usize;
    while let Some(c) = chars.next() {
        if c != '\u{00A7}' {
            out.push(c);
            continue;
        }
        let mut digits = String::new();
        while let Some(d) = chars.peek() {
            if d.is_ascii_digit() {
                digits.push(*d);
                chars.next();
            } else {
                break;
            }
        }
        if !digits.is_empty() {
            let index = digits.parse::<usize>().unwrap_or(1) - 1;
            if let Some(v) = values.get(index) {
                out.push_str(v);
            }
            continue;
        }
        let mut name = String::new();
        while let Some(c2) = chars.peek() {
            if c2.is_ascii_alphanumeric() || *c2 == '_' {
                name.push(*c2);
                chars.next();
            } else {
                break;
            }
        }
        if !name.is_empty() {
            if let Some(pos) = param_names.iter().position(|n| n == &name) {
                if let Some(v) = values.get(pos + 1) {
                    out.push_str(v);
                }
            }
            continue;
        }
        let index = cursor;
        cursor += 1;
        if let Some(v) = values.get(index) {
            out.push_str(v);
        }
    }
    out
}

/// A human-readable listing of every registered collection/method pair, for
/// the `faberc --describe-norma` introspection flag.
pub fn describe() -> Vec<String> {
    let mut lines = vec![];
    let mut collections: Vec<_> = tables::TRANSLATIONS.keys().collect();
    collections.sort();
    for collection in collections {
        let methods = &tables::TRANSLATIONS[collection];
        let mut names: Vec<_> = methods.keys().collect();
        names.sort();
        for method in names {
            let targets = &methods[method];
            let mut target_names: Vec<_> = targets.keys().map(|t| format!("{t:?}")).collect();
            target_names.sort();
            let params = targets
                .values()
                .find_map(|t| match t {
                    Translation::Template { param_names, .. } if !param_names.is_empty() => Some(param_names.join(", ")),
                    _ => None,
                })
                .unwrap_or_default();
            lines.push(format!("{collection}.{method}({params}) -> {}", target_names.join(", ")));
        }
    }
    lines
}

pub fn collection_is_known(collection: &str) -> bool {
    tables::TRANSLATIONS.contains_key(collection) || tables::RADIX.contains_key(collection)
}

/// True if `method` is declared on at least one known collection — used by
/// the generator to decide whether an unresolved receiver's method call is
/// worth a diagnostic comment rather than a silent pass-through (spec.md §7
/// "Propagation").
pub fn method_exists_on_some_collection(method: &str) -> bool {
    tables::TRANSLATIONS.values().any(|methods| methods.contains_key(method))
}

/// Compile-time-only stdlib namespaces: importing one of these produces no
/// module-resolution work and no emitted import (spec.md §4.5).
pub const STDLIB_NAMESPACES: &[&str] = &["norma", "mathematica", "tempus", "fortuna", "json"];

pub fn is_stdlib_namespace(source: &str) -> bool {
    STDLIB_NAMESPACES.iter().any(|ns| source == *ns || source.starts_with(&format!("{ns}/")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn morphology_accepts_declared_forms() {
        assert!(matches!(validate_morphology("lista", "adde"), MorphologyOutcome::Valid(_)));
        assert!(matches!(validate_morphology("lista", "addita"), MorphologyOutcome::Valid(_)));
    }

    #[test]
    fn morphology_rejects_undeclared_form() {
        match validate_morphology("lista", "additura") {
            MorphologyOutcome::InvalidForm { stem, valid_forms, .. } => {
                assert_eq!(stem, "add");
                assert!(valid_forms.contains(&"imperativus"));
                assert!(!valid_forms.contains(&"futurum_activum"));
            }
            other => panic!("expected InvalidForm, got {other:?}"),
        }
    }

    #[test]
    fn unknown_name_passes_through() {
        assert_eq!(validate_morphology("lista", "customHelper"), MorphologyOutcome::NotMorphological);
    }

    #[test]
    fn unknown_collection_skips_validation() {
        assert_eq!(validate_morphology("nebula", "adde"), MorphologyOutcome::NotMorphological);
    }

    #[test]
    fn template_substitution_is_pure() {
        let t = "\u{00A7}.push(\u{00A7}1)";
        let out1 = apply_template(t, &[], "xs", &["4".to_string()]);
        let out2 = apply_template(t, &[], "xs", &["4".to_string()]);
        assert_eq!(out1, out2);
        assert_eq!(out1, "xs.push(xs)");
    }

    #[test]
    fn template_positional_and_indexed_placeholders() {
        let t = "\u{00A7}2(\u{00A7}1)";
        let out = apply_template(t, &[], "recv", &["a".to_string(), "b".to_string()]);
        assert_eq!(out, "a(recv)");
    }

    #[test]
    fn template_named_placeholder_resolves_by_param_name() {
        let t = "\u{00A7}.set(\u{00A7}clavis, \u{00A7}valor)";
        let param_names = vec!["clavis".to_string(), "valor".to_string()];
        let out = apply_template(t, &param_names, "m", &["k".to_string(), "v".to_string()]);
        assert_eq!(out, "m.set(k, v)");
    }

    #[test]
    fn lookup_finds_declared_target_translation() {
        let found = lookup("lista", "adde", Target::TypeScript);
        assert!(matches!(found, Some(Translation::Rename(name)) if name == "push"));
    }
}
