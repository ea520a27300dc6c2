//! QA tests for save/load and persistence functionality.
//!
//! These tests verify that remembered states survive a cache flush, a
//! registry restart and a round trip through the JSON snapshot file.
//! Run with: `cargo test -p playstate-core --test qa_persistence`

use playstate_core::{
    name, Domain, Item, JsonFileStore, Limit, ManualClock, PersistentStore, RegistryConfig,
    RegistryError, Session, SessionConfig, StateRegistry, StoreKey, TestHarness,
};
use std::sync::Arc;
use tempfile::TempDir;

// =============================================================================
// TEST 1: Remember and reload
// =============================================================================

#[test]
fn test_remembered_state_reloads_equal() {
    let mut h = TestHarness::new();
    let collar = name!("Toys.Collar");
    let neck = name!("Body.AroundNeck");

    h.registry.apply(&collar, &[neck.clone()]).unwrap();
    h.registry.over(&collar, Limit::Seconds(600)).unwrap();
    h.registry
        .apply_attributes(&collar, [name!("Materials.Leather")])
        .unwrap();
    h.registry.remember(&collar).unwrap();

    let before_collar = h.registry.get(&collar).unwrap().clone();
    let before_neck = h.registry.get(&neck).unwrap().clone();
    assert!(before_neck.is_persistent());

    h.registry.clear_cache();
    let after_collar = h.registry.get(&collar).unwrap().clone();
    assert_eq!(after_collar, before_collar);
    // Linked peers are restored together with the state.
    assert!(h.registry.is_cached(&neck));
    assert_eq!(h.registry.get(&neck).unwrap(), &before_neck);
    h.assert_consistent();
}

#[test]
fn test_unremembered_state_is_not_stored() {
    let mut h = TestHarness::new();
    h.registry
        .apply(&name!("Toys.Gag"), &[name!("Body.InMouth")])
        .unwrap();
    assert!(h.store.is_empty());

    h.restart();
    assert!(!h.registry.is_applied(&name!("Toys.Gag")).unwrap());
}

#[test]
fn test_persistence_spreads_to_new_peers() {
    let mut h = TestHarness::new();
    let collar = name!("Toys.Collar");
    let leash = name!("Toys.Leash");
    h.registry.apply(&collar, &[name!("Body.AroundNeck")]).unwrap();
    h.registry.remember(&collar).unwrap();

    h.registry.apply(&leash, &[collar.clone()]).unwrap();
    assert!(h.registry.get(&leash).unwrap().is_persistent());

    h.restart();
    assert!(h.registry.is_applied(&leash).unwrap());
    assert!(h.registry.get(&collar).unwrap().peers().contains(&leash));
}

// =============================================================================
// TEST 2: Restore edge cases
// =============================================================================

#[test]
fn test_vanished_peer_is_dropped() {
    let mut h = TestHarness::new();
    let gag = name!("Toys.Gag");
    let mouth = name!("Body.InMouth");
    let ghost = name!("Toys.Ghost");

    h.registry.apply(&gag, &[mouth.clone(), ghost.clone()]).unwrap();
    h.registry.remember(&gag).unwrap();

    // The ghost is no longer part of the configuration.
    let ghost_duration = StoreKey::new("", "toys", "ghost.state.duration");
    assert!(h.store.has(&ghost_duration).unwrap());
    h.store.clear(&ghost_duration).unwrap();

    h.restart();
    let restored = h.registry.get(&gag).unwrap();
    assert!(restored.peers().contains(&mouth));
    assert!(!restored.peers().contains(&ghost));
    assert!(!h.registry.is_cached(&ghost));
    h.assert_consistent();
}

#[test]
fn test_instance_markers_survive_restart() {
    let mut h = TestHarness::new();
    let pink = Item::new(name!("Toys.Buttplug:pink")).with_default_peers([name!("Body.InButt")]);
    pink.apply(&mut h.registry).unwrap();
    h.registry.remember(&name!("Toys.Buttplug")).unwrap();

    h.restart();
    assert!(pink.is_applied(&mut h.registry).unwrap());
    assert!(h
        .registry
        .is(&name!("Body.InButt"), &[name!("Toys.Buttplug:pink").into()])
        .unwrap());

    pink.remove(&mut h.registry).unwrap();
    h.restart();
    assert!(!pink.is_applied(&mut h.registry).unwrap());
    assert!(!h.registry.is_applied(&name!("Body.InButt")).unwrap());
}

#[test]
fn test_unreadable_token_is_skipped() {
    let mut h = TestHarness::new();
    let gag = name!("Toys.Gag");
    let mouth = name!("Body.InMouth");
    h.registry.apply(&gag, &[mouth.clone()]).unwrap();
    h.registry
        .apply_attributes(&gag, [name!("Materials.Rubber")])
        .unwrap();
    h.registry.remember(&gag).unwrap();

    // Entries written by an older build that no longer parse as identifiers.
    h.store
        .set(
            &StoreKey::new("", "toys", "gag.state.peers"),
            r#"["state/body.inmouth","legacytoken"]"#,
        )
        .unwrap();
    h.store
        .set(
            &StoreKey::new("", "toys", "gag.state.attributes"),
            r#"["materials.rubber","???"]"#,
        )
        .unwrap();

    h.restart();
    let restored = h.registry.get(&gag).unwrap().clone();
    assert!(restored.applied());
    assert_eq!(restored.peers().len(), 1);
    assert!(restored.peers().contains(&mouth));
    assert!(h
        .registry
        .is(&gag, &[name!("Materials.Rubber").into()])
        .unwrap());
    h.assert_consistent();
}

#[test]
fn test_malformed_duration_is_an_error() {
    let mut h = TestHarness::new();
    h.store
        .set(&StoreKey::new("", "toys", "gag.state.applied"), "true")
        .unwrap();
    h.store
        .set(&StoreKey::new("", "toys", "gag.state.duration"), "soon")
        .unwrap();

    let result = h.registry.get(&name!("Toys.Gag"));
    assert!(matches!(
        result,
        Err(RegistryError::MalformedDuration { .. })
    ));
}

#[test]
fn test_legacy_and_nested_tokens() {
    let mut h = TestHarness::new();
    h.store
        .set(&StoreKey::new("", "toys", "gag.state.applied"), "true")
        .unwrap();
    h.store
        .set(&StoreKey::new("", "toys", "gag.state.duration"), "900")
        .unwrap();
    h.store
        .set(
            &StoreKey::new("", "toys", "gag.state.peers"),
            r#"["state/state/body.inmouth"]"#,
        )
        .unwrap();
    h.store
        .set(&StoreKey::new("", "body", "inmouth.state.applied"), "true")
        .unwrap();
    h.store
        .set(&StoreKey::new("", "body", "inmouth.state.duration"), "900 0")
        .unwrap();
    h.store
        .set(
            &StoreKey::new("", "body", "inmouth.state.peers"),
            r#"["state/toys.gag"]"#,
        )
        .unwrap();

    let gag = h.registry.get(&name!("Toys.Gag")).unwrap();
    assert!(gag.peers().contains(&name!("Body.InMouth")));
    assert_eq!(gag.own_duration().start, 900);
    assert_eq!(gag.own_duration().limit, Limit::Temporary);
    h.assert_consistent();
}

// =============================================================================
// TEST 3: Removal and last use
// =============================================================================

#[test]
fn test_remove_clears_storage_and_keeps_shadow() {
    let mut h = TestHarness::new();
    let collar = name!("Toys.Collar");
    h.registry.apply(&collar, &[name!("Body.AroundNeck")]).unwrap();
    h.registry.remember(&collar).unwrap();

    h.clock.advance(200);
    h.registry.remove(&collar).unwrap();
    assert!(!h
        .store
        .has(&StoreKey::new("", "toys", "collar.state.applied"))
        .unwrap());
    assert!(h
        .store
        .has(&StoreKey::for_name(&Domain::last_used(), &collar, "state.duration"))
        .unwrap());

    h.clock.advance(50);
    h.restart();
    assert!(!h.registry.is_applied(&collar).unwrap());
    assert_eq!(h.registry.removed_since(&collar).unwrap(), Some(50));
    assert_eq!(h.registry.last_used(&collar).unwrap().unwrap().elapsed, Some(200));
}

// =============================================================================
// TEST 4: Snapshot files
// =============================================================================

#[tokio::test]
async fn test_snapshot_file_round_trip() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let path = temp_dir.path().join("state.json");
    let clock = ManualClock::new(5_000);
    let collar = name!("Toys.Collar");
    let scene = Domain::new("scene");

    {
        let file = Arc::new(JsonFileStore::open(&path).await.unwrap());
        let mut main = StateRegistry::new(
            RegistryConfig::default(),
            file.clone(),
            Arc::new(clock.clone()),
        );
        main.apply(&collar, &[name!("Body.AroundNeck")]).unwrap();
        main.over(&collar, Limit::Forever).unwrap();
        main.remember(&collar).unwrap();

        let mut other = StateRegistry::new(
            RegistryConfig::for_domain(scene.clone()),
            file.clone(),
            Arc::new(clock.clone()),
        );
        other.apply(&name!("Posture.Kneeling"), &[]).unwrap();
        other.remember(&name!("Posture.Kneeling")).unwrap();

        file.save().await.unwrap();
    }
    assert!(path.exists(), "snapshot file should exist after saving");

    let file = Arc::new(JsonFileStore::open(&path).await.unwrap());
    let mut main = StateRegistry::new(
        RegistryConfig::default(),
        file.clone(),
        Arc::new(clock.clone()),
    );
    assert!(main.is_applied(&collar).unwrap());
    assert_eq!(main.duration(&collar).unwrap().limit, Limit::Forever);
    assert!(!main.is_applied(&name!("Posture.Kneeling")).unwrap());

    let mut other = StateRegistry::new(
        RegistryConfig::for_domain(scene),
        file.clone(),
        Arc::new(clock.clone()),
    );
    assert!(other.is_applied(&name!("Posture.Kneeling")).unwrap());
}

#[tokio::test]
async fn test_session_save_and_open() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config = SessionConfig::new().with_store_path(temp_dir.path().join("session.json"));
    let gag = Item::new(name!("Toys.Gag:red")).with_default_peers([name!("Body.InMouth")]);

    let mut session = Session::open(config.clone()).await.unwrap();
    session.add_item(gag.clone());
    gag.set_available(session.registry(), true).unwrap();
    session.apply_item(&name!("Toys.Gag:red")).unwrap();
    session.registry().remember(&name!("Toys.Gag")).unwrap();
    session.save().await.unwrap();

    let mut reopened = Session::open(config).await.unwrap();
    reopened.add_item(gag.clone());
    assert!(gag.is_available(reopened.registry()).unwrap());
    assert!(gag.is_applied(reopened.registry()).unwrap());
    assert!(!reopened.can_apply(&name!("Toys.Gag:red")).unwrap());
}
