// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Race state and the cancellation protocol.
//!
//! Each rival owns a `CancelToken`. The first party to `claim` the race
//! flips every other token, and later wakes every other rival's monitor.
//! Waking takes the monitor's lock before notifying, and rivals only check
//! their token while holding that lock, so a rival either sees the flag
//! before parking or is already parked when the broadcast arrives.
//!
//! Nobody holds one monitor while taking another: the winner releases its
//! own lock before waking the rest.

use std::sync::atomic::{AtomicUsize, Ordering};

use log::trace;
use rask_rt::cancel::CancelToken;
use rask_rt::channel::Channel;
use rask_rt::completion::Completion;

/// Something a parked rival can be woken from.
pub(crate) trait Wake: Sync {
    /// Lock, broadcast, unlock. Must not change any readiness state.
    fn wake(&self);
}

impl<T: Send> Wake for Channel<T> {
    fn wake(&self) {
        self.wake_all();
    }
}

impl Wake for Completion {
    fn wake(&self) {
        self.wake_all();
    }
}

const UNCLAIMED: usize = usize::MAX;

/// Shared state of one blocking select call, handed to every rival.
pub(crate) struct Race<'a> {
    winner: AtomicUsize,
    tokens: Vec<CancelToken>,
    monitors: Vec<&'a dyn Wake>,
}

impl<'a> Race<'a> {
    pub fn new(monitors: Vec<&'a dyn Wake>) -> Self {
        let tokens = monitors.iter().map(|_| CancelToken::new()).collect();
        Self {
            winner: AtomicUsize::new(UNCLAIMED),
            tokens,
            monitors,
        }
    }

    pub fn rivals(&self) -> usize {
        self.tokens.len()
    }

    /// Identity the caller uses to claim the race for itself, e.g. when a
    /// rival thread cannot be spawned.
    pub fn caller(&self) -> usize {
        self.rivals()
    }

    pub fn is_cancelled(&self, rival: usize) -> bool {
        self.tokens[rival].is_cancelled()
    }

    pub fn is_winner(&self, who: usize) -> bool {
        self.winner.load(Ordering::Acquire) == who
    }

    /// Try to become the unique resolver of this race. On success every
    /// other rival's token is set; nobody is woken yet.
    pub fn claim(&self, who: usize) -> bool {
        if self
            .winner
            .compare_exchange(UNCLAIMED, who, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return false;
        }
        for (rival, token) in self.tokens.iter().enumerate() {
            if rival != who {
                token.cancel();
            }
        }
        true
    }

    /// Wake every rival except `who`. Waking a rival that already exited
    /// is harmless. Callers must not hold any monitor lock.
    pub fn wake_losers(&self, who: usize) {
        for (rival, monitor) in self.monitors.iter().enumerate() {
            if rival != who {
                trace!("select: waking rival {} to cancel it", rival + 1);
                monitor.wake();
            }
        }
    }

    /// Claim and wake in one step, for callers that hold no lock.
    pub fn cancel_rivals(&self, who: usize) -> bool {
        if !self.claim(who) {
            return false;
        }
        self.wake_losers(who);
        true
    }
}
