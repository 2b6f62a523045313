// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Sleep and timers.
//!
//! Phase A: `std::thread::sleep`. A timer is a completion raised by a
//! sleeper thread, so it can sit in a `select` next to channel clauses.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::completion::{Completion, Waitable};

/// Sleep the current thread for the given duration.
pub fn sleep(duration: Duration) {
    std::thread::sleep(duration);
}

/// One-shot timer that expires after a fixed delay.
///
/// Dropping the timer does not stop the sleeper thread; it finishes and
/// completes a flag nobody is watching.
#[derive(Debug)]
pub struct Timer {
    completion: Arc<Completion>,
    deadline: Instant,
}

impl Timer {
    pub fn expired(&self) -> bool {
        self.completion.is_done()
    }

    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    /// Block until the timer expires.
    pub fn wait(&self) {
        self.completion.wait();
    }
}

impl Waitable for Timer {
    fn completion(&self) -> &Completion {
        &self.completion
    }
}

/// Create a one-shot timer that fires after `duration`.
pub fn timer_after(duration: Duration) -> Timer {
    let completion = Arc::new(Completion::new());
    let fire = completion.clone();
    std::thread::spawn(move || {
        std::thread::sleep(duration);
        fire.complete();
    });
    Timer {
        completion,
        deadline: Instant::now() + duration,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sleep_short() {
        let start = Instant::now();
        sleep(Duration::from_millis(10));
        assert!(start.elapsed() >= Duration::from_millis(9));
    }

    #[test]
    fn timer_after_fires() {
        let timer = timer_after(Duration::from_millis(10));
        assert!(!timer.expired());
        timer.wait();
        assert!(timer.expired());
        assert!(Instant::now() >= timer.deadline());
    }

    #[test]
    fn zero_timer_expires() {
        let timer = timer_after(Duration::ZERO);
        timer.wait();
        assert!(timer.is_done());
    }
}
