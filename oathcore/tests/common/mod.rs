#![allow(dead_code)]

use std::{rc::Rc, sync::Arc};

use oathcore::{
    base::{OathContext, ViolationHook, api::ContextCreateInfo, config::OathConfig},
    ext::trace::{CallbackSink, TraceEvent, TraceEventKind, TraceSink},
    ownership::arena::Arena,
    utils::check::{Violation, ViolationKind},
};
use parking_lot::Mutex;

/// Events and violations observed by a test context.
#[derive(Clone, Default)]
pub struct Observed {
    pub events: Arc<Mutex<Vec<TraceEvent>>>,
    pub violations: Arc<Mutex<Vec<ViolationKind>>>,
}

impl Observed {
    pub fn messages(&self) -> Vec<String> {
        self.events.lock().iter().map(|e| e.message.clone()).collect()
    }

    pub fn messages_of(&self, kind: TraceEventKind) -> Vec<String> {
        self.events
            .lock()
            .iter()
            .filter(|e| e.kind == kind)
            .map(|e| e.message.clone())
            .collect()
    }

    pub fn violations(&self) -> Vec<ViolationKind> {
        self.violations.lock().clone()
    }
}

/// Context with `config` whose trace events and violations are recorded.
pub fn observed_context(config: OathConfig) -> (Arc<OathContext>, Observed) {
    let observed = Observed::default();

    let events = observed.events.clone();
    let sink = CallbackSink(Box::new(move |event: &TraceEvent| {
        events.lock().push(event.clone());
    }));

    let violations = observed.violations.clone();
    let hook: ViolationHook = Box::new(move |violation: &Violation| {
        violations.lock().push(violation.kind);
    });

    let context = OathContext::create(ContextCreateInfo {
        config,
        violation_hook: Some(hook),
        trace_sink: Some(Arc::new(sink) as Arc<dyn TraceSink>),
    });
    (context, observed)
}

pub fn observed_arena<T>(config: OathConfig) -> (Rc<Arena<T>>, Observed) {
    let (context, observed) = observed_context(config);
    (Arena::with_context(context), observed)
}

pub fn arena<T>(config: OathConfig) -> Rc<Arena<T>> {
    Arena::with_context(OathContext::from_config(config))
}
