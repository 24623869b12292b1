mod common;

use oathcore::{base::config::OathConfig, ext::trace::TraceEventKind};

use common::{observed_arena, observed_context};

#[test]
fn release_messages_name_the_frame_origin() {
    let (arena, observed) = observed_arena(OathConfig::default());
    let owned = arena.make_owned(42);
    let b1 = owned.borrow();
    let b2 = b1.borrow();
    let b1_id = b1.origin().id;

    drop(b2);
    drop(b1);

    assert_eq!(
        observed.messages_of(TraceEventKind::BorrowReleased),
        vec![
            format!("Releasing borrow from Borrowed@{}", b1_id),
            format!("Releasing borrow from Owned@{}", owned.origin().id),
        ]
    );
}

#[test]
fn events_carry_depth_after_the_change() {
    let (arena, observed) = observed_arena(OathConfig::default());
    let owned = arena.make_owned(0u8);
    let b1 = owned.borrow();
    let b2 = b1.borrow();
    drop(b2);
    drop(b1);
    drop(owned);

    let depths: Vec<(TraceEventKind, usize)> = observed
        .events
        .lock()
        .iter()
        .map(|e| (e.kind, e.depth))
        .collect();
    assert_eq!(
        depths,
        vec![
            (TraceEventKind::OwnerCreated, 0),
            (TraceEventKind::BorrowCreated, 1),
            (TraceEventKind::BorrowCreated, 2),
            (TraceEventKind::BorrowReleased, 1),
            (TraceEventKind::BorrowReleased, 0),
            (TraceEventKind::OwnerDestroyed, 0),
        ]
    );
}

#[test]
fn removing_the_sink_silences_tracing() {
    let (context, observed) = observed_context(OathConfig::default());
    let arena = oathcore::ownership::arena::Arena::with_context(context.clone());
    let owned = arena.make_owned(1u8);
    assert_eq!(observed.messages().len(), 1);

    context.set_trace_sink(None);
    let b = owned.borrow();
    drop(b);
    assert_eq!(observed.messages().len(), 1);
}
