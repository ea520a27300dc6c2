//! QA tests for items, instances and apply rules.
//!
//! Run with: `cargo test -p playstate-core --test qa_items`

use playstate_core::{
    name, ApplyRules, Category, Item, ItemError, Limit, Rule, TestHarness, TimeUnit,
};

fn plug(guid: &str) -> Item {
    Item::new(name!("Toys.Buttplug"))
        .with_guid(guid)
        .with_default_peers([name!("Body.InButt")])
}

// =============================================================================
// TEST 1: Instance versus kind matching
// =============================================================================

#[test]
fn test_instance_and_kind_queries() {
    let mut h = TestHarness::new();
    let butt = name!("Body.InButt");
    plug("pink").apply(&mut h.registry).unwrap();

    assert!(h.registry.is(&butt, &[name!("Toys.Buttplug:pink").into()]).unwrap());
    assert!(h.registry.is(&butt, &[name!("Toys.Buttplug").into()]).unwrap());
    assert!(!h.registry.is(&butt, &[name!("Toys.Buttplug:blue").into()]).unwrap());
    assert!(h.registry.is(&butt, &[Category::Toys.into()]).unwrap());
    h.assert_consistent();
}

// =============================================================================
// TEST 2: Instances on different peers
// =============================================================================

#[test]
fn test_second_instance_keeps_kind_applied() {
    let mut h = TestHarness::new();
    let butt = name!("Body.InButt");
    let mouth = name!("Body.InMouth");
    let pink = plug("pink");
    let blue = plug("blue");

    pink.apply(&mut h.registry).unwrap();
    blue.apply_to(&mut h.registry, &[mouth.clone()]).unwrap();
    assert_eq!(blue.applied_to(&mut h.registry).unwrap(), vec![mouth.clone()]);

    pink.remove(&mut h.registry).unwrap();
    h.assert_consistent();

    assert!(!h.registry.is_applied(&butt).unwrap());
    assert!(h.registry.is_applied(&name!("Toys.Buttplug")).unwrap());
    assert!(!pink.is_applied(&mut h.registry).unwrap());
    assert!(blue.is_applied(&mut h.registry).unwrap());
    assert!(h.registry.is(&mouth, &[name!("Toys.Buttplug:blue").into()]).unwrap());
}

#[test]
fn test_removing_carrier_releases_its_instance() {
    let mut h = TestHarness::new();
    let butt = name!("Body.InButt");
    let mouth = name!("Body.InMouth");
    let kind = name!("Toys.Buttplug");
    let pink = plug("pink");
    let blue = plug("blue");

    pink.apply(&mut h.registry).unwrap();
    blue.apply_to(&mut h.registry, &[mouth.clone()]).unwrap();

    h.registry.remove(&butt).unwrap();
    h.assert_consistent();
    assert!(!pink.is_applied(&mut h.registry).unwrap());
    assert!(blue.is_applied(&mut h.registry).unwrap());
    assert!(h.registry.is_applied(&kind).unwrap());
    assert!(!h.registry.get(&kind).unwrap().peers().contains(&name!("Toys.Buttplug:pink")));

    h.registry.remove(&mouth).unwrap();
    h.assert_consistent();
    assert!(!blue.is_applied(&mut h.registry).unwrap());
    assert!(!h.registry.is_applied(&kind).unwrap());
}

// =============================================================================
// TEST 3: Reference counting of instances on one peer
// =============================================================================

#[test]
fn test_two_instances_on_same_peer() {
    let mut h = TestHarness::new();
    let butt = name!("Body.InButt");
    let kind = name!("Toys.Buttplug");
    let pink = plug("pink");
    let blue = plug("blue");

    pink.apply(&mut h.registry).unwrap();
    blue.apply(&mut h.registry).unwrap();

    pink.remove(&mut h.registry).unwrap();
    h.assert_consistent();
    assert!(h.registry.get(&butt).unwrap().peers().contains(&kind));
    assert!(h.registry.is(&butt, &[name!("Toys.Buttplug:blue").into()]).unwrap());
    assert!(!h.registry.is(&butt, &[name!("Toys.Buttplug:pink").into()]).unwrap());

    blue.remove(&mut h.registry).unwrap();
    h.assert_consistent();
    assert!(!h.registry.is_applied(&butt).unwrap());
    assert!(!h.registry.is_applied(&kind).unwrap());
}

#[test]
fn test_removing_twice_fails() {
    let mut h = TestHarness::new();
    let pink = plug("pink");
    pink.apply(&mut h.registry).unwrap();
    pink.remove(&mut h.registry).unwrap();

    let result = pink.remove(&mut h.registry);
    assert!(matches!(result, Err(ItemError::NotApplied(_))));
}

// =============================================================================
// TEST 4: Blockers
// =============================================================================

#[test]
fn test_blocker_enforcement() {
    let mut h = TestHarness::new();
    let neck = name!("Body.AroundNeck");
    let collar = Item::new(name!("Toys.Collar:leather"))
        .with_default_peers([neck.clone()])
        .with_blockers([name!("Clothes.Scarf")]);
    let scarf = Item::new(name!("Clothes.Scarf:wool")).with_default_peers([neck.clone()]);
    collar.set_available(&h.registry, true).unwrap();

    assert!(collar.can_apply(&mut h.registry).unwrap());

    scarf.apply(&mut h.registry).unwrap();
    assert!(!collar.can_apply(&mut h.registry).unwrap());
    let failing = ApplyRules::default()
        .explain(&collar, &mut h.registry)
        .unwrap();
    assert!(failing.contains(&Rule::NotBlocked));

    scarf.remove(&mut h.registry).unwrap();
    assert!(collar.can_apply(&mut h.registry).unwrap());
}

#[test]
fn test_instance_blocker_only_blocks_that_instance() {
    let mut h = TestHarness::new();
    let gag = Item::new(name!("Toys.Gag:red"))
        .with_default_peers([name!("Body.InMouth")])
        .with_blockers([name!("Toys.Muzzle:steel")]);
    gag.set_available(&h.registry, true).unwrap();

    Item::new(name!("Toys.Muzzle:leather"))
        .apply_to(&mut h.registry, &[name!("Body.Face")])
        .unwrap();
    assert!(Rule::NotBlocked.holds(&gag, &mut h.registry).unwrap());

    Item::new(name!("Toys.Muzzle:steel"))
        .apply_to(&mut h.registry, &[name!("Body.Face")])
        .unwrap();
    assert!(!Rule::NotBlocked.holds(&gag, &mut h.registry).unwrap());
}

// =============================================================================
// TEST 5: Item durations
// =============================================================================

#[test]
fn test_item_duration_is_kind_duration() {
    let mut h = TestHarness::new();
    let pink = plug("pink");
    pink.apply(&mut h.registry)
        .unwrap()
        .over(30, TimeUnit::Minutes)
        .unwrap();

    assert_eq!(
        pink.duration(&mut h.registry).unwrap().limit,
        Limit::Seconds(1_800)
    );
    h.clock.advance(1_800);
    assert!(pink.expired(&mut h.registry).unwrap());
}
