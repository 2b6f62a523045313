// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Completion monitor.
//!
//! A one-way "done" flag behind a mutex plus a condition variable. Tasks,
//! signals and timers all embed one, and `select` waits on it through the
//! [`Waitable`] trait.

use std::fmt;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

/// One-shot completion flag. Once set it never clears.
pub struct Completion {
    done: Mutex<bool>,
    cond: Condvar,
}

impl Completion {
    pub fn new() -> Self {
        Self {
            done: Mutex::new(false),
            cond: Condvar::new(),
        }
    }

    /// Set the flag and wake every waiter. Repeated calls are no-ops.
    pub fn complete(&self) {
        let mut guard = self.lock();
        *guard.done = true;
        guard.completion.cond.notify_all();
    }

    pub fn is_done(&self) -> bool {
        self.lock().is_done()
    }

    /// Block until the flag is set.
    pub fn wait(&self) {
        let mut guard = self.lock();
        while !guard.is_done() {
            guard = guard.wait();
        }
    }

    pub fn lock(&self) -> CompletionGuard<'_> {
        CompletionGuard {
            completion: self,
            done: self.done.lock().unwrap_or_else(PoisonError::into_inner),
        }
    }

    /// Wake every waiter without setting the flag.
    pub fn wake_all(&self) {
        let _guard = self.lock();
        self.cond.notify_all();
    }
}

impl Default for Completion {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Completion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Completion")
            .field("done", &self.is_done())
            .finish()
    }
}

/// Held lock on a [`Completion`].
pub struct CompletionGuard<'a> {
    completion: &'a Completion,
    done: MutexGuard<'a, bool>,
}

impl<'a> CompletionGuard<'a> {
    pub fn is_done(&self) -> bool {
        *self.done
    }

    /// Release the lock, block until notified, reacquire.
    pub fn wait(self) -> Self {
        let CompletionGuard { completion, done } = self;
        let done = completion
            .cond
            .wait(done)
            .unwrap_or_else(PoisonError::into_inner);
        CompletionGuard { completion, done }
    }
}

/// Anything that finishes once and can be waited on.
pub trait Waitable: Sync {
    fn completion(&self) -> &Completion;

    fn is_done(&self) -> bool {
        self.completion().is_done()
    }
}

impl Waitable for Completion {
    fn completion(&self) -> &Completion {
        self
    }
}
