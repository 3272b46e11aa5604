use std::sync::Arc;

use test_case::test_case;

use crate::{BinaryRegistry, Error, TypeKey};

use super::super::helpers::{Tagged, two_branches};

type Registry = BinaryRegistry<Tagged, Tagged, (), &'static str>;

fn registry_with(entries: &[(&str, &str, &'static str)]) -> Registry {
    let registry = Registry::new(two_branches());
    for &(left, right, name) in entries {
        registry.register("combine", left, right, move |_, _, _| name);
    }
    registry
}

fn combine(registry: &Registry, left: &str, right: &str) -> crate::Result<&'static str> {
    registry.dispatch("combine", &Tagged::new(left), &Tagged::new(right), &())
}

fn pair(left: &str, right: &str) -> (TypeKey, TypeKey) {
    (TypeKey::new(left), TypeKey::new(right))
}

#[test_case(&[("A", "B", "ab")], "A", "B", "ab"; "exact_pair")]
#[test_case(&[("A", "B", "ab")], "A1", "B1", "ab"; "inherited_on_both_sides")]
#[test_case(&[("Root", "Root", "any"), ("A", "B", "ab")], "A1", "B1", "ab"; "more_specific_on_both_sides")]
#[test_case(&[("A", "Root", "a_any"), ("A", "B", "ab")], "A1", "B1", "ab"; "tie_on_left_broken_by_right")]
#[test_case(&[("Root", "B", "any_b"), ("A1", "B", "a1b")], "A1", "B1", "a1b"; "tie_on_right_broken_by_left")]
#[test_case(&[("A", "B", "ab"), ("B", "A", "ba")], "A", "B", "ab"; "mirrored_pair_only_matches_one_way")]
fn test_resolves(entries: &[(&str, &str, &'static str)], left: &str, right: &str, expected: &str) {
    let registry = registry_with(entries);
    assert_eq!(combine(&registry, left, right).unwrap(), expected);
}

#[test]
fn test_incomparable_candidates_are_ambiguous() {
    let registry = registry_with(&[("A", "Root", "a_any"), ("Root", "B", "any_b")]);
    let err = combine(&registry, "A1", "B1").unwrap_err();
    match err {
        Error::AmbiguousDispatch { key, left_first, right_first, suggested } => {
            assert_eq!(key.as_str(), "combine");
            assert_eq!(left_first, pair("A", "Root"));
            assert_eq!(right_first, pair("Root", "B"));
            assert_eq!(suggested, pair("A", "B"));
        }
        other => panic!("expected ambiguity, got {other}"),
    }
}

#[test]
fn test_ambiguity_message_names_fix() {
    let registry = registry_with(&[("A", "Root", "a_any"), ("Root", "B", "any_b")]);
    let message = combine(&registry, "A", "B").unwrap_err().to_string();
    assert!(message.contains("register a handler for (A, B)"), "{message}");
}

#[test]
fn test_deeper_left_against_deeper_right_is_ambiguous() {
    // (A1, Root) ranks (0, 2); (A, B) ranks (1, 1).
    let registry = registry_with(&[("A1", "Root", "a1_any"), ("A", "B", "ab")]);
    assert!(matches!(combine(&registry, "A1", "B1"), Err(Error::AmbiguousDispatch { .. })));
}

#[test]
fn test_disambiguating_registration_resolves() {
    let registry = registry_with(&[("A", "Root", "a_any"), ("Root", "B", "any_b")]);
    assert!(combine(&registry, "A1", "B1").is_err());

    registry.register("combine", "A", "B", |_, _, _| "ab");
    assert_eq!(combine(&registry, "A1", "B1").unwrap(), "ab");
}

#[test]
fn test_later_registration_can_introduce_ambiguity() {
    let registry = registry_with(&[("A", "Root", "a_any")]);
    assert_eq!(combine(&registry, "A1", "B1").unwrap(), "a_any");

    registry.register("combine", "Root", "B", |_, _, _| "any_b");
    assert!(matches!(combine(&registry, "A1", "B1"), Err(Error::AmbiguousDispatch { .. })));
}

#[test]
fn test_ambiguity_is_not_cached() {
    let registry = registry_with(&[("A", "Root", "a_any"), ("Root", "B", "any_b")]);
    let _ = combine(&registry, "A1", "B1");
    let _ = combine(&registry, "A1", "B1");
    assert_eq!(registry.cached_len(), 0);
}

#[test]
fn test_not_found_reports_both_types() {
    let registry = registry_with(&[("A", "A", "aa")]);
    let err = combine(&registry, "B", "A").unwrap_err();
    assert!(err.is_not_found());
    assert!(matches!(err, Error::DispatchNotFound { ref types, .. } if types == &[TypeKey::new("B"), TypeKey::new("A")]));
}

#[test]
fn test_repeated_resolution_returns_same_handler() {
    let registry = registry_with(&[("A", "B", "ab"), ("Root", "Root", "any")]);
    let first = registry.resolve("combine", "A1", "B1").unwrap();
    let second = registry.resolve("combine", "A1", "B1").unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(registry.cached_len(), 1);

    registry.register("combine", "A1", "B1", |_, _, _| "a1b1");
    assert_eq!(registry.cached_len(), 0);
    assert_eq!(combine(&registry, "A1", "B1").unwrap(), "a1b1");
}

#[test]
fn test_handler_sees_both_operands() {
    let registry: BinaryRegistry<Tagged, Tagged, str, String> = BinaryRegistry::new(two_branches());
    registry.register("join", "Root", "Root", |l: &Tagged, r: &Tagged, sep: &str| format!("{}{sep}{}", l.0, r.0));
    assert_eq!(registry.dispatch("join", &Tagged::new("A1"), &Tagged::new("B"), "+").unwrap(), "A1+B");
}
