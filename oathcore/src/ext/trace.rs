use serde::{Deserialize, Serialize};
use strum::{Display, EnumIs, FromRepr};

use crate::{
    magic::TRACE_LOG_TARGET,
    ownership::{arena::ResourceKey, stack::Origin},
};

/// Trace levels supported by the borrow tracer.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    FromRepr,
    Display,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[repr(u32)]
pub enum TraceLevel {
    Trace = 0,
    Debug = 1,
    Info = 2,
    Warn = 3,
    Error = 4,
}

impl From<TraceLevel> for log::Level {
    fn from(value: TraceLevel) -> Self {
        match value {
            TraceLevel::Trace => log::Level::Trace,
            TraceLevel::Debug => log::Level::Debug,
            TraceLevel::Info => log::Level::Info,
            TraceLevel::Warn => log::Level::Warn,
            TraceLevel::Error => log::Level::Error,
        }
    }
}

/// What happened to a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIs, Display)]
pub enum TraceEventKind {
    OwnerCreated,
    BorrowCreated,
    BorrowReleased,
    /// A `Borrowed` was dropped after its owner; there was no frame left to release.
    StaleRelease,
    OwnerDestroyed,
}

/// One trace record.
#[derive(Debug, Clone)]
pub struct TraceEvent {
    pub kind: TraceEventKind,
    pub level: TraceLevel,
    pub resource: ResourceKey,
    pub origin: Origin,
    /// Borrow depth after the event.
    pub depth: usize,
    pub timepoint: chrono::NaiveDateTime,
    pub message: String,
    pub module: String,
    pub file: Option<String>,
    pub line: Option<u32>,
    pub thread_name: Option<String>,
}

/// Receiver of trace events.
pub trait TraceSink: Send + Sync {
    fn emit(&self, event: &TraceEvent);
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {
    fn emit(&self, _event: &TraceEvent) {}
}

/// Forwards events to the `log` facade under the [`TRACE_LOG_TARGET`] target.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl TraceSink for LogSink {
    fn emit(&self, event: &TraceEvent) {
        log::log!(
            target: TRACE_LOG_TARGET,
            log::Level::from(event.level),
            "[{:?}] {} (depth {})",
            event.resource,
            event.message,
            event.depth
        );
    }
}

/// Prints one line per event on stdout, e.g. `[Debug] Releasing borrow from Owned@0x1`.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdoutSink;

impl TraceSink for StdoutSink {
    fn emit(&self, event: &TraceEvent) {
        println!("[{}] {}", event.level, event.message);
    }
}

/// Calls a user supplied closure for every event.
pub struct CallbackSink(pub Box<dyn Fn(&TraceEvent) + Send + Sync>);

impl TraceSink for CallbackSink {
    fn emit(&self, event: &TraceEvent) {
        (self.0)(event)
    }
}

/// Emit a trace event through a context, building it only when the context accepts the level.
#[macro_export]
macro_rules! oath_trace {
    (
        $context:expr,
        $level:expr,
        $kind:expr,
        $resource:expr,
        $origin:expr,
        $depth:expr,
        $( $arg:tt )*
    ) => {
        {
            let context: &$crate::base::OathContext = &*$context;
            let level: $crate::ext::trace::TraceLevel = $level;
            if context.trace_enabled(level) {
                let event = $crate::ext::trace::TraceEvent {
                    kind: $kind,
                    level,
                    resource: $resource,
                    origin: $origin,
                    depth: $depth,
                    timepoint: $crate::chrono::Local::now().naive_local(),
                    message: format!($($arg)*),
                    module: module_path!().to_string(),
                    file: Some(file!().to_string()),
                    line: Some(line!()),
                    thread_name: std::thread::current().name().map(|s| s.to_string()),
                };
                context.emit(&event);
            }
        }
    };
}
