//! Precedence resolution at one level.
//!
//! Every effective value of a level is chosen by the same fixed order:
//! Stub, then Source, then Native. The first producer that supplies a value
//! wins. A stub overlay therefore overrides both user source and the host
//! runtime, and user source overrides the runtime.
//!
//! Resolution here is a pure function of one [`LevelFacts`]; it never looks
//! at other levels. Climbing the hierarchy is the inheritance walker's job.

use crate::facts::{DeclarationFact, Producer, Signature, Visibility};
use crate::registry::LevelFacts;

/// Producers in the order they are consulted.
pub const PRECEDENCE: [Producer; 3] = [Producer::Stub, Producer::Source, Producer::Native];

/// An effective doc comment and the producer that supplied it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedDoc<'a> {
    pub text: &'a str,
    pub producer: Producer,
}

fn first_present<'a, T: ?Sized>(
    level: &'a LevelFacts,
    pick: impl Fn(&'a DeclarationFact) -> Option<&'a T>,
) -> Option<(&'a T, Producer)> {
    PRECEDENCE
        .iter()
        .filter_map(|&p| level.get(p))
        .find_map(|fact| pick(fact).map(|value| (value, fact.producer)))
}

/// The effective doc comment of a level.
///
/// Returns `None` when no producer contributed one. A present empty comment
/// is returned as-is and stops the search.
pub fn resolve(level: &LevelFacts) -> Option<ResolvedDoc<'_>> {
    first_present(level, |f| f.doc_comment.as_deref())
        .map(|(text, producer)| ResolvedDoc { text, producer })
}

/// The effective signature of a level.
pub fn resolve_signature(level: &LevelFacts) -> Option<&Signature> {
    first_present(level, |f| f.signature.as_ref()).map(|(sig, _)| sig)
}

/// The visibility declared at a method level, if any producer gave one.
///
/// A level that declares none takes its visibility from the hierarchy
/// (`DeclarationRegistry::method_visibility`).
pub fn declared_visibility(level: &LevelFacts) -> Option<Visibility> {
    first_present(level, |f| f.visibility.as_ref()).map(|(v, _)| *v)
}

/// The effective static flag of a method level; `false` when unspecified.
pub fn resolve_static(level: &LevelFacts) -> bool {
    first_present(level, |f| f.is_static.as_ref())
        .map(|(s, _)| *s)
        .unwrap_or(false)
}

/// The effective parent edge of a class level.
pub fn resolve_parent(level: &LevelFacts) -> Option<&str> {
    first_present(level, |f| f.parent_class.as_deref()).map(|(p, _)| p)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facts::Parameter;
    use crate::registry::DeclarationRegistry;

    fn level_of(facts: Vec<DeclarationFact>) -> LevelFacts {
        let registry = DeclarationRegistry::from_facts(facts).unwrap();
        registry.facts_for("f", None).clone()
    }

    fn func(producer: Producer) -> DeclarationFact {
        DeclarationFact::function(producer, "f")
    }

    mod doc_tests {
        use super::*;

        #[test]
        fn stub_beats_source_and_native() {
            let level = level_of(vec![
                func(Producer::Source).with_doc_comment("/** source */"),
                func(Producer::Native).with_doc_comment("/** native */"),
                func(Producer::Stub).with_doc_comment("/** stub */"),
            ]);
            assert_eq!(
                resolve(&level),
                Some(ResolvedDoc {
                    text: "/** stub */",
                    producer: Producer::Stub
                })
            );
        }

        #[test]
        fn source_beats_native() {
            let level = level_of(vec![
                func(Producer::Native).with_doc_comment("/** native */"),
                func(Producer::Source).with_doc_comment("/** source */"),
            ]);
            assert_eq!(resolve(&level).map(|d| d.text), Some("/** source */"));
        }

        #[test]
        fn undocumented_stub_falls_through() {
            let level = level_of(vec![
                func(Producer::Stub),
                func(Producer::Native).with_doc_comment("/** native */"),
            ]);
            assert_eq!(resolve(&level).map(|d| d.producer), Some(Producer::Native));
        }

        #[test]
        fn no_docs_is_absent() {
            let level = level_of(vec![func(Producer::Source), func(Producer::Native)]);
            assert_eq!(resolve(&level), None);
            assert_eq!(resolve(&LevelFacts::EMPTY), None);
        }

        #[test]
        fn empty_comment_is_present() {
            let level = level_of(vec![
                func(Producer::Source).with_doc_comment(""),
                func(Producer::Native).with_doc_comment("/** native */"),
            ]);
            assert_eq!(resolve(&level).map(|d| d.text), Some(""));
        }
    }

    mod shape_tests {
        use super::*;

        #[test]
        fn signature_follows_precedence() {
            let stub_sig = Signature::new()
                .with_parameters(vec![Parameter::new("$separator").with_type("string")])
                .with_return_type("string");
            let level = level_of(vec![
                func(Producer::Native).with_signature(Signature::new()),
                func(Producer::Stub)
                    .with_doc_comment("/** s */")
                    .with_signature(stub_sig.clone()),
            ]);
            assert_eq!(resolve_signature(&level), Some(&stub_sig));
        }

        #[test]
        fn undeclared_visibility_and_static() {
            let level = level_of(vec![func(Producer::Source)]);
            assert_eq!(declared_visibility(&level), None);
            assert!(!resolve_static(&level));
        }

        #[test]
        fn source_visibility_applies_when_stub_is_silent() {
            let level = level_of(vec![
                func(Producer::Source)
                    .with_visibility(Visibility::Private)
                    .with_static(true),
                func(Producer::Stub).with_doc_comment("/** s */"),
            ]);
            assert_eq!(declared_visibility(&level), Some(Visibility::Private));
            assert!(resolve_static(&level));
        }
    }
}
