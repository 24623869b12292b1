mod common;

use oathcore::{base::config::OathConfig, prelude::*};

use common::{arena, observed_arena};

#[test]
fn make_owned_holds_the_given_value() {
    for v in [0i64, 1, -7, i64::MAX] {
        let owned = arena(OathConfig::default()).make_owned(v);
        assert_eq!(*owned.get(), v);
    }
}

#[test]
fn nested_borrow_scenario() {
    let (arena, observed) = observed_arena(OathConfig::default());

    let owned = arena.make_owned(42);
    let key = owned.key().unwrap();

    let b1 = owned.borrow();
    assert_eq!(owned.depth(), 1);

    let b2 = b1.borrow();
    assert_eq!(owned.depth(), 2);
    assert_eq!(
        b2.provenance().unwrap(),
        vec![owned.origin(), b1.origin(), b2.origin()]
    );

    drop(b2);
    assert_eq!(owned.depth(), 1);
    drop(b1);
    assert_eq!(owned.depth(), 0);
    assert_eq!(*owned.get(), 42);

    drop(owned);
    assert!(!arena.contains(key));
    assert!(arena.is_empty());
    assert!(observed.violations().is_empty());
}

#[test]
fn reverse_order_release_returns_to_depth_zero() {
    let (arena, observed) = observed_arena(OathConfig::default());
    let owned = arena.make_owned(String::from("chain"));

    let mut chain: Vec<Borrowed<String>> = vec![owned.borrow()];
    for _ in 1..16 {
        let next = chain.last().unwrap().borrow();
        chain.push(next);
    }
    assert_eq!(owned.depth(), 16);

    while let Some(b) = chain.pop() {
        let before = owned.depth();
        drop(b);
        assert_eq!(owned.depth(), before - 1);
    }
    assert_eq!(owned.depth(), 0);
    assert!(observed.violations().is_empty());
}

#[test]
fn sibling_borrows_from_owner_release_in_reverse() {
    let owned = arena(OathConfig::default()).make_owned(1u8);
    let a = owned.borrow();
    let b = owned.borrow();
    let frames = owned.arena().frames(owned.key().unwrap()).unwrap();
    assert!(frames.iter().all(|f| f.origin == owned.origin()));

    drop(b);
    drop(a);
    assert_eq!(owned.depth(), 0);
}

#[test]
fn moved_from_owner_and_borrow_are_null() {
    let mut owned = arena(OathConfig::default()).make_owned(3u32);
    let mut b = owned.borrow();

    let moved_b = b.transfer();
    assert_eq!(
        b.try_get().unwrap_err().violation_kind(),
        Some(ViolationKind::NullAccess)
    );
    assert_eq!(*moved_b.get(), 3);
    drop(moved_b);

    let moved = owned.transfer();
    assert_eq!(
        owned.try_depth().unwrap_err().violation_kind(),
        Some(ViolationKind::NullAccess)
    );
    assert_eq!(*moved.get(), 3);
}

#[test]
#[should_panic(expected = "OATH runtime check failed (NullAccess)")]
fn deref_of_moved_from_borrow_panics() {
    let owned = arena(OathConfig::default()).make_owned(3u32);
    let mut b = owned.borrow();
    let _moved = b.transfer();
    let _ = b.get();
}

#[test]
fn return_handle_at_depth_zero_is_imbalanced() {
    let owned = arena(OathConfig::default()).make_owned(0u8);
    let key = owned.key().unwrap();

    let b = owned.borrow();
    std::mem::forget(b);
    owned.arena().return_handle(key).unwrap();

    let err = owned.arena().return_handle(key).unwrap_err();
    assert_eq!(err.violation_kind(), Some(ViolationKind::ImbalancedPop));
}

#[test]
fn value_wrapper_maps_through_a_borrow() {
    let owned = arena(OathConfig::default()).make_owned(Value::new(vec![1, 2, 3]));
    let b = owned.borrow();
    assert_eq!(b.get().map(|v| v.len()), Value::new(3));
}
