use std::sync::Arc;

use oathcore::{
    base::{
        OathContext,
        config::{OathConfig, ReleaseOrder},
        global,
    },
    prelude::*,
};

// Single test: the installed context is process-wide state.
#[test]
fn install_and_teardown_process_context() {
    assert!(!global::is_installed());
    let default = global::current();
    assert_eq!(default.config(), &OathConfig::default());

    let installed = OathContext::from_config(OathConfig {
        release_order: ReleaseOrder::Unchecked,
        ..Default::default()
    });
    assert!(global::install(installed.clone()).is_none());
    assert!(global::is_installed());

    let owned = Owned::make_owned(1u32);
    assert!(Arc::ptr_eq(owned.arena().context(), &installed));

    let previous = global::teardown().unwrap();
    assert!(Arc::ptr_eq(&previous, &installed));
    assert!(!global::is_installed());

    // Arenas keep the context they were created with.
    assert_eq!(
        owned.arena().context().config().release_order,
        ReleaseOrder::Unchecked
    );
    let fresh = Owned::make_owned(2u32);
    assert!(Arc::ptr_eq(fresh.arena().context(), &global::current()));
    assert_eq!(
        fresh.arena().context().config().release_order,
        ReleaseOrder::Strict
    );
}
