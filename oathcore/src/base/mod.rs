use std::sync::Arc;

use parking_lot::RwLock;

use crate::{
    base::{
        api::ContextCreateInfo,
        config::{OathConfig, TraceSinkKind},
    },
    ext::trace::{LogSink, StdoutSink, TraceEvent, TraceLevel, TraceSink},
    magic::LOG_TARGET,
    utils::{check::Violation, error::OathError},
};

pub mod api;
pub mod config;
pub mod global;

/// Callback invoked for every detected violation, before the funnel unwinds.
pub type ViolationHook = Box<dyn Fn(&Violation) + Send + Sync>;

/// Default hook: log the violation.
pub fn default_violation_hook(violation: &Violation) {
    log::error!(target: LOG_TARGET, "{}", violation);
}

/// Shared state of the ownership checks: configuration, violation hook and trace sink.
///
/// Every arena captures one context when it is created.
pub struct OathContext {
    config: OathConfig,
    violation_hook: RwLock<ViolationHook>,
    /// `None` when tracing is disabled.
    trace_sink: RwLock<Option<Arc<dyn TraceSink>>>,
}

impl OathContext {
    pub fn create(create_info: ContextCreateInfo) -> Arc<Self> {
        let ContextCreateInfo {
            config,
            violation_hook,
            trace_sink,
        } = create_info;

        let trace_sink = trace_sink.or_else(|| {
            config.trace.enabled.then(|| match config.trace.sink {
                TraceSinkKind::Log => Arc::new(LogSink) as Arc<dyn TraceSink>,
                TraceSinkKind::Stdout => Arc::new(StdoutSink) as Arc<dyn TraceSink>,
            })
        });

        let violation_hook: ViolationHook = match violation_hook {
            Some(hook) => hook,
            None => Box::new(default_violation_hook),
        };

        log::debug!(
            target: LOG_TARGET,
            "Creating oath context (release order {:?}, outstanding borrows {:?}, tracing {})",
            config.release_order,
            config.outstanding_borrows,
            if trace_sink.is_some() { "on" } else { "off" }
        );

        Arc::new(OathContext {
            config,
            violation_hook: RwLock::new(violation_hook),
            trace_sink: RwLock::new(trace_sink),
        })
    }

    /// Context with the given configuration and the default hook.
    pub fn from_config(config: OathConfig) -> Arc<Self> {
        Self::create(ContextCreateInfo::with_config(config))
    }

    /// Context configured from [`OathConfig::load_or_default`].
    pub fn from_env() -> Result<Arc<Self>, OathError> {
        Ok(Self::from_config(OathConfig::load_or_default()?))
    }

    pub fn config(&self) -> &OathConfig {
        &self.config
    }

    pub fn set_violation_hook(&self, hook: ViolationHook) {
        *self.violation_hook.write() = hook;
    }

    pub fn set_trace_sink(&self, sink: Option<Arc<dyn TraceSink>>) {
        *self.trace_sink.write() = sink;
    }

    /// Whether an event at `level` would reach a sink.
    pub fn trace_enabled(&self, level: TraceLevel) -> bool {
        level >= self.config.trace.level && self.trace_sink.read().is_some()
    }

    pub fn emit(&self, event: &TraceEvent) {
        let sink = self.trace_sink.read().clone();
        if let Some(sink) = sink {
            sink.emit(event);
        }
    }

    /// Single funnel for detected violations: run the hook, then unwind.
    ///
    /// The panic payload is the formatted violation, so callers that need to recover can use
    /// `std::panic::catch_unwind`.
    pub fn report_violation(&self, violation: Violation) -> ! {
        (*self.violation_hook.read())(&violation);
        panic!("{}", violation)
    }

    /// Funnel any error; non-violation errors unwind with their message.
    pub fn raise(&self, error: OathError) -> ! {
        match error {
            OathError::Violation(violation) => self.report_violation(violation),
            other => panic!("{}", other),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::{ext::trace::NoopSink, utils::check::ViolationKind};

    #[test]
    fn tracing_disabled_by_default() {
        let ctx = OathContext::from_config(OathConfig::default());
        assert!(!ctx.trace_enabled(TraceLevel::Error));
    }

    #[test]
    fn explicit_sink_enables_tracing_above_level() {
        let ctx = OathContext::create(ContextCreateInfo {
            trace_sink: Some(Arc::new(NoopSink) as Arc<dyn TraceSink>),
            ..Default::default()
        });
        assert!(ctx.trace_enabled(TraceLevel::Debug));
        assert!(!ctx.trace_enabled(TraceLevel::Trace));

        ctx.set_trace_sink(None);
        assert!(!ctx.trace_enabled(TraceLevel::Error));
    }

    #[test]
    fn report_violation_runs_hook_then_unwinds() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = calls.clone();
        let ctx = OathContext::create(ContextCreateInfo {
            violation_hook: Some(Box::new(move |v: &Violation| {
                assert_eq!(v.kind, ViolationKind::NullAccess);
                seen.fetch_add(1, Ordering::SeqCst);
            })),
            ..Default::default()
        });

        let res = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            ctx.report_violation(Violation::new(ViolationKind::NullAccess, "handle.is_some()"))
        }));
        assert!(res.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    #[should_panic(expected = "OATH runtime check failed (ImbalancedPop)")]
    fn raise_funnels_violation_errors() {
        let ctx = OathContext::from_config(OathConfig::default());
        ctx.raise(OathError::from(Violation::new(
            ViolationKind::ImbalancedPop,
            "borrow_stack.top().is_some()",
        )))
    }
}
