/*
 * context.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Build configuration and the ambient build context.
 */

//! Build context.
//!
//! The [`BuildContext`] is passed to every `build` call. It carries:
//!
//! - the [`BuildConfig`] (worker count, channel bound, ordering and failure
//!   policy),
//! - a [`Cancellation`] token observed at every suspension point,
//! - the log of entries dropped under [`FailurePolicy::CollectAndContinue`].
//!
//! Contexts are cheap to clone and safe to share between translation
//! workers.

use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use crate::cancellation::Cancellation;
use crate::error::{BuildError, Result};

/// What a builder does when one of its children fails to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailurePolicy {
    /// Fail the enclosing build with the first child error.
    #[default]
    Propagate,

    /// Report the child to the observer, record it on the context, skip
    /// it, and keep building the remaining entries.
    CollectAndContinue,
}

/// Tunables for a build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct BuildConfig {
    /// Number of translation workers per pipeline.
    pub workers: usize,

    /// Bound on every pipeline channel.
    pub channel_capacity: usize,

    /// Insert pipeline results in document order instead of completion
    /// order.
    pub preserve_order: bool,

    pub failure_policy: FailurePolicy,
}

impl Default for BuildConfig {
    fn default() -> Self {
        let workers = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        Self {
            workers,
            channel_capacity: workers,
            preserve_order: false,
            failure_policy: FailurePolicy::Propagate,
        }
    }
}

impl BuildConfig {
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity;
        self
    }

    pub fn with_preserve_order(mut self, preserve: bool) -> Self {
        self.preserve_order = preserve;
        self
    }

    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    /// Worker count, never zero.
    pub fn effective_workers(&self) -> usize {
        self.workers.max(1)
    }

    /// Channel bound, never zero.
    pub fn effective_capacity(&self) -> usize {
        self.channel_capacity.max(1)
    }
}

/// A dropped entry, as recorded on the context.
#[derive(Debug, Clone, PartialEq)]
pub struct DroppedEntry {
    /// Builder that dropped the entry.
    pub object: &'static str,
    pub error: BuildError,
}

/// Ambient context for a build.
#[derive(Clone, Debug, Default)]
pub struct BuildContext {
    config: Arc<BuildConfig>,
    cancellation: Cancellation,
    dropped: Arc<Mutex<Vec<DroppedEntry>>>,
}

impl BuildContext {
    /// Create a context with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a context with a custom configuration.
    pub fn with_config(config: BuildConfig) -> Self {
        Self {
            config: Arc::new(config),
            ..Self::default()
        }
    }

    /// Set a custom cancellation token (for caller-driven deadlines).
    pub fn with_cancellation(mut self, token: Cancellation) -> Self {
        self.cancellation = token;
        self
    }

    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    pub fn cancellation(&self) -> &Cancellation {
        &self.cancellation
    }

    /// Derive a context whose token is a child of this one.
    ///
    /// Config and the dropped-entry log are shared with `self`.
    pub fn child(&self) -> Self {
        Self {
            config: Arc::clone(&self.config),
            cancellation: self.cancellation.child(),
            dropped: Arc::clone(&self.dropped),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    /// Return `Err(BuildError::Cancelled)` if cancellation was requested.
    pub fn check_cancelled(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(BuildError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Record an entry dropped by `object`.
    pub fn record_dropped(&self, object: &'static str, error: BuildError) {
        self.dropped
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(DroppedEntry { object, error });
    }

    /// Snapshot of every entry dropped so far.
    pub fn dropped(&self) -> Vec<DroppedEntry> {
        self.dropped
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}
