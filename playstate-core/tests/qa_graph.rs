//! QA tests for the applied-with graph.
//!
//! These tests drive a registry through longer apply/remove sequences and
//! check the graph invariants after every step.
//! Run with: `cargo test -p playstate-core --test qa_graph`

use playstate_core::testing::check_invariants;
use playstate_core::{name, Category, Limit, QualifiedName, RegistryError, TestHarness, TimeUnit};

fn assert_invariants(h: &TestHarness, step: &str) {
    let violations = check_invariants(&h.registry);
    assert!(
        violations.is_empty(),
        "after {step}: {}",
        violations.join("; ")
    );
}

// =============================================================================
// TEST 1: Symmetry across a mixed sequence
// =============================================================================

#[test]
fn test_symmetry_over_sequence() {
    let mut h = TestHarness::new();
    let collar = name!("Toys.Collar");
    let leash = name!("Toys.Leash");
    let neck = name!("Body.AroundNeck");
    let wrists = name!("Body.Wrists");
    let kneeling = name!("Posture.Kneeling");

    h.registry.apply(&collar, &[neck.clone()]).unwrap();
    assert_invariants(&h, "collar on neck");

    h.registry.apply(&leash, &[collar.clone(), wrists.clone()]).unwrap();
    assert_invariants(&h, "leash on collar and wrists");

    h.registry.apply(&kneeling, &[]).unwrap();
    assert_invariants(&h, "self-applied posture");

    h.registry.remove_from(&leash, &[wrists.clone()]).unwrap();
    assert_invariants(&h, "leash off wrists");
    assert!(!h.registry.is_applied(&wrists).unwrap());
    assert!(h.registry.is_applied(&leash).unwrap());

    h.registry.remove(&collar).unwrap();
    assert_invariants(&h, "collar removed");
    assert!(!h.registry.is_applied(&collar).unwrap());
    // The leash only hung on the collar, so it went with it.
    assert!(!h.registry.is_applied(&leash).unwrap());
    assert!(!h.registry.is_applied(&neck).unwrap());
    assert!(h.registry.is_applied(&kneeling).unwrap());
}

// =============================================================================
// TEST 2: Applied iff peers are non-empty
// =============================================================================

#[test]
fn test_applied_tracks_peers() {
    let mut h = TestHarness::new();
    let gag = name!("Toys.Gag");
    let mouth = name!("Body.InMouth");

    for state in h.registry.states() {
        assert!(!state.applied());
    }

    h.registry.apply(&gag, &[mouth.clone()]).unwrap();
    h.registry.apply(&gag, &[mouth.clone()]).unwrap();
    assert_eq!(h.registry.get(&gag).unwrap().peers().len(), 1);

    h.registry.remove_from(&mouth, &[gag.clone()]).unwrap();
    for state in h.registry.states() {
        assert_eq!(state.applied(), !state.peers().is_empty());
    }
    assert!(!h.registry.is_applied(&gag).unwrap());
}

#[test]
fn test_remove_unapplied_fails() {
    let mut h = TestHarness::new();
    let gag = name!("Toys.Gag");
    let result = h.registry.remove(&gag);
    assert!(matches!(result, Err(RegistryError::NotApplied(_))));
    assert!(!h.registry.is_applied(&gag).unwrap());
    assert_eq!(h.registry.removed_since(&gag).unwrap(), None);
}

// =============================================================================
// TEST 3: Duration composition
// =============================================================================

#[test]
fn test_duration_composition() {
    let mut h = TestHarness::new();
    let p1 = name!("Toys.Collar");
    let p2 = name!("Toys.Leash");
    let node = name!("Body.AroundNeck");

    h.registry.apply(&node, &[p1.clone(), p2.clone()]).unwrap();
    h.registry.state(&p1).unwrap().over(100, TimeUnit::Seconds).unwrap();

    let effective = h.registry.duration(&node).unwrap();
    assert_eq!(effective.limit, Limit::Seconds(100));
    assert_eq!(effective.remaining(h.registry.now()), Some(100));
    assert!(!h.registry.expired(&node).unwrap());

    h.clock.advance(99);
    assert!(!h.registry.expired(&node).unwrap());
    h.clock.advance(1);
    assert!(h.registry.expired(&node).unwrap());
    assert!(h.registry.expired(&p2).unwrap());
}

#[test]
fn test_explicit_window_units() {
    let mut h = TestHarness::new();
    let node = name!("Features.Blindfolded");
    h.registry.apply(&node, &[]).unwrap();
    h.registry.state(&node).unwrap().over(2, TimeUnit::Minutes).unwrap();

    assert_eq!(h.registry.duration(&node).unwrap().limit, Limit::Seconds(120));
    h.clock.advance(119);
    assert!(!h.registry.expired(&node).unwrap());
    h.clock.advance(1);
    assert!(h.registry.expired(&node).unwrap());
}

#[test]
fn test_forever_outlasts_everything() {
    let mut h = TestHarness::new();
    let node = name!("Body.Wrists");
    let cuffs = name!("Toys.Cuffs");
    let rope = name!("Toys.Rope");

    h.registry.apply(&node, &[cuffs.clone(), rope.clone()]).unwrap();
    h.registry.over(&cuffs, Limit::Seconds(3_600)).unwrap();
    h.registry.over(&rope, Limit::Forever).unwrap();

    assert_eq!(h.registry.duration(&node).unwrap().limit, Limit::Forever);
    h.clock.advance(10_000);
    assert!(!h.registry.expired(&node).unwrap());
}

// =============================================================================
// TEST 4: Attribute queries
// =============================================================================

#[test]
fn test_queries_across_the_graph() {
    let mut h = TestHarness::new();
    let mouth = name!("Body.InMouth");
    let gag = name!("Toys.Gag");
    h.registry.apply(&gag, &[mouth.clone()]).unwrap();
    h.registry
        .apply_attributes(&gag, [name!("Materials.Rubber")])
        .unwrap();

    assert!(h.registry.is(&gag, &[Category::Materials.into()]).unwrap());
    assert!(h.registry.is(&gag, &[name!("Materials.Rubber").into()]).unwrap());
    assert!(h.registry.is(&gag, &[mouth.clone().into()]).unwrap());
    assert!(h.registry.is(&mouth, &[name!("Toys.*").into()]).unwrap());
    assert!(!h.registry.is(&mouth, &[name!("Materials.Rubber").into()]).unwrap());

    let unrelated: QualifiedName = "Household.Chair".parse().unwrap();
    assert!(!h.registry.is(&unrelated, &[Category::Toys.into()]).unwrap());
}
