use std::sync::Arc;

use crate::{
    base::{OathContext, ViolationHook, config::OathConfig},
    ext::trace::TraceSink,
};

/// Container used to request the creation of an [`OathContext`].
#[derive(Default)]
pub struct ContextCreateInfo {
    pub config: OathConfig,
    /// Replaces the default hook, which logs the violation before the funnel unwinds.
    pub violation_hook: Option<ViolationHook>,
    /// Explicit sink. When set, tracing is enabled whatever `config.trace.enabled` says.
    pub trace_sink: Option<Arc<dyn TraceSink>>,
}

impl ContextCreateInfo {
    pub fn with_config(config: OathConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }
}

/// Creates and initializes a new [`OathContext`] from the provided description.
pub fn create_context(create_info: ContextCreateInfo) -> Arc<OathContext> {
    OathContext::create(create_info)
}
