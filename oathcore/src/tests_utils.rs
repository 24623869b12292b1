use std::{
    panic::{AssertUnwindSafe, catch_unwind},
    sync::Arc,
    time::{Duration, Instant},
};

use parking_lot::Mutex;

use crate::{
    base::{OathContext, api::ContextCreateInfo, config::OathConfig},
    ext::trace::{TraceEvent, TraceEventKind, TraceSink},
};

/// Run `func`, printing its start and its duration on stdout.
///
/// A panic inside `func` is caught and returned as its message.
pub fn function_time_counter<F: FnOnce()>(func_name: &str, func: F) -> Result<Duration, String> {
    println!("{}", started_message(func_name));

    let start_time = Instant::now();
    let outcome = catch_unwind(AssertUnwindSafe(func));
    let duration = start_time.elapsed();

    match outcome {
        Ok(()) => {
            println!("{}", passed_message(func_name, duration));
            Ok(duration)
        }
        Err(payload) => {
            let msg = if let Some(s) = payload.downcast_ref::<&str>() {
                s.to_string()
            } else if let Some(s) = payload.downcast_ref::<String>() {
                s.clone()
            } else {
                "unknown panic payload".to_string()
            };
            Err(msg)
        }
    }
}

pub fn started_message(func_name: &str) -> String {
    format!("{} started.", func_name)
}

pub fn passed_message(func_name: &str, duration: Duration) -> String {
    format!(
        "{} passed! Spend {} ms.",
        func_name,
        duration.as_secs_f64() * 1000.0
    )
}

/// Format a failure caught by [`function_time_counter`].
pub fn runtime_exception(msg: &str, file: &str, func: &str) -> String {
    format!("OATH runtime exception: {} at {}:{}", msg, file, func)
}

/// Time a named function, reporting failures with the calling file and the function name.
#[macro_export]
macro_rules! func_time_counter {
    ($func:path) => {
        $crate::tests_utils::function_time_counter(stringify!($func), $func).map_err(|msg| {
            $crate::tests_utils::runtime_exception(&msg, file!(), stringify!($func))
        })
    };
}

/// Trace sink keeping every event in memory.
#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<TraceEvent>>,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<TraceEvent> {
        self.events.lock().clone()
    }

    pub fn kinds(&self) -> Vec<TraceEventKind> {
        self.events.lock().iter().map(|e| e.kind).collect()
    }

    pub fn messages(&self) -> Vec<String> {
        self.events.lock().iter().map(|e| e.message.clone()).collect()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl TraceSink for RecordingSink {
    fn emit(&self, event: &TraceEvent) {
        self.events.lock().push(event.clone());
    }
}

/// Context with `config` whose trace output is recorded.
pub fn recording_context(config: OathConfig) -> (Arc<OathContext>, Arc<RecordingSink>) {
    let sink = RecordingSink::new();
    let context = OathContext::create(ContextCreateInfo {
        config,
        violation_hook: None,
        trace_sink: Some(sink.clone() as Arc<dyn TraceSink>),
    });
    (context, sink)
}
