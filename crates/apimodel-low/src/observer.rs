/*
 * observer.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Best-effort diagnostic sink for builds.
 */

//! Observer abstraction for build diagnostics.
//!
//! A [`BuildObserver`] is the optional sink a reference index exposes to
//! builders. Builders report entries they had to drop and other noteworthy
//! events through it. Observers are best-effort: whether one is installed
//! never changes what a build produces.

use crate::error::BuildError;

/// Event severity level for build events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventLevel {
    Trace,
    Debug,
    Info,
    Warn,
}

impl EventLevel {
    /// Convert to a string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventLevel::Trace => "trace",
            EventLevel::Debug => "debug",
            EventLevel::Info => "info",
            EventLevel::Warn => "warn",
        }
    }
}

/// Observer for build events.
///
/// All methods have empty default implementations, allowing observers
/// to implement only the events they care about.
///
/// Implementations must be `Send + Sync`: builders call them from
/// translation worker threads.
pub trait BuildObserver: Send + Sync {
    /// Called when an entry is dropped under the collect-and-continue
    /// policy.
    ///
    /// # Arguments
    ///
    /// * `object` - Name of the builder that dropped the entry
    /// * `error` - Why the entry could not be built
    fn on_entry_dropped(&self, _object: &str, _error: &BuildError) {}

    /// Called for arbitrary events during a build.
    fn on_event(&self, _message: &str, _level: EventLevel) {}
}

/// No-op observer implementation.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl BuildObserver for NoopObserver {}

/// Observer that emits `tracing` events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl BuildObserver for TracingObserver {
    fn on_entry_dropped(&self, object: &str, error: &BuildError) {
        tracing::warn!(object, error = %error, "dropped entry");
    }

    fn on_event(&self, message: &str, level: EventLevel) {
        match level {
            EventLevel::Trace => tracing::trace!("{}", message),
            EventLevel::Debug => tracing::debug!("{}", message),
            EventLevel::Info => tracing::info!("{}", message),
            EventLevel::Warn => tracing::warn!("{}", message),
        }
    }
}
