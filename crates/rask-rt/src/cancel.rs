// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Cooperative cancellation.
//!
//! AtomicBool flag. The holder checks `is_cancelled()` at every wake-up;
//! the canceller is responsible for waking it if it is parked.

use std::sync::atomic::{AtomicBool, Ordering};

/// Cancellation flag shared between a canceller and one worker.
#[derive(Debug)]
pub struct CancelToken {
    flag: AtomicBool,
}

impl CancelToken {
    pub fn new() -> Self {
        Self {
            flag: AtomicBool::new(false),
        }
    }

    /// Set the cancellation flag. Returns `true` if this call set it,
    /// `false` if it was already set.
    pub fn cancel(&self) -> bool {
        !self.flag.swap(true, Ordering::AcqRel)
    }

    /// Check if cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancel_is_idempotent() {
        let t = CancelToken::new();
        assert!(!t.is_cancelled());
        assert!(t.cancel());
        assert!(!t.cancel());
        assert!(t.is_cancelled());
    }
}
