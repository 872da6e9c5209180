/*
 * cancellation.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Cancellation tokens threaded through every build.
 */

//! Hierarchical cancellation for builds.
//!
//! [`Cancellation`] wraps `tokio_util::sync::CancellationToken`. Each
//! translation pipeline runs under a child token so that a failing entry
//! can stop its siblings without cancelling the caller's build.

use tokio_util::sync::CancellationToken;

/// A cloneable cancellation token.
///
/// Clones share state: cancelling one cancels all of them, and every token
/// derived with [`Cancellation::child`].
#[derive(Clone, Debug, Default)]
pub struct Cancellation {
    inner: CancellationToken,
}

impl Cancellation {
    /// Create a new cancellation token.
    pub fn new() -> Self {
        Self {
            inner: CancellationToken::new(),
        }
    }

    /// Derive a token that is cancelled with `self` but can be cancelled
    /// on its own without affecting `self`.
    pub fn child(&self) -> Self {
        Self {
            inner: self.inner.child_token(),
        }
    }

    /// Check if cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.inner.is_cancelled()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.inner.cancel()
    }
}

impl From<CancellationToken> for Cancellation {
    fn from(token: CancellationToken) -> Self {
        Self { inner: token }
    }
}
