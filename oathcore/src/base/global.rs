//! Process-wide context with explicit install and teardown.
//!
//! Arenas created without an explicit context pick up [`current`] at construction time; an
//! arena keeps that context even if another one is installed later.

use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::RwLock;

use crate::{
    base::{OathContext, api::ContextCreateInfo},
    magic::LOG_TARGET,
};

static INSTALLED: Lazy<RwLock<Option<Arc<OathContext>>>> = Lazy::new(|| RwLock::new(None));

static DEFAULT: Lazy<Arc<OathContext>> =
    Lazy::new(|| OathContext::create(ContextCreateInfo::default()));

/// Install `context` as the process-wide context, returning the previously installed one.
pub fn install(context: Arc<OathContext>) -> Option<Arc<OathContext>> {
    log::debug!(target: LOG_TARGET, "Installing process-wide oath context");
    INSTALLED.write().replace(context)
}

/// Remove the installed context. Later arenas fall back to the default context.
pub fn teardown() -> Option<Arc<OathContext>> {
    log::debug!(target: LOG_TARGET, "Tearing down process-wide oath context");
    INSTALLED.write().take()
}

/// The installed context, or the default one (default configuration, tracing off).
pub fn current() -> Arc<OathContext> {
    INSTALLED
        .read()
        .clone()
        .unwrap_or_else(|| DEFAULT.clone())
}

pub fn is_installed() -> bool {
    INSTALLED.read().is_some()
}
