// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Readiness predicates, evaluated under the clause's monitor lock.

use rask_rt::channel::ChannelGuard;
use rask_rt::completion::CompletionGuard;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Readiness {
    /// The operation can run now without blocking.
    Ready,
    /// Not yet; a state change on the monitor may make it ready.
    Pending,
    /// The source is closed and this clause can never complete.
    Closed,
}

/// Buffer has room, or on a rendezvous channel a taker is parked.
pub(crate) fn put<T>(guard: &ChannelGuard<'_, T>) -> Readiness {
    if guard.is_closed() {
        Readiness::Closed
    } else if guard.can_put() {
        Readiness::Ready
    } else {
        Readiness::Pending
    }
}

/// Buffer non-empty, a parked sender is offering, or the channel is
/// closed (a closed drained channel yields end-of-stream).
pub(crate) fn take<T>(guard: &ChannelGuard<'_, T>) -> Readiness {
    if guard.can_take() {
        Readiness::Ready
    } else {
        Readiness::Pending
    }
}

pub(crate) fn wait(guard: &CompletionGuard<'_>) -> Readiness {
    if guard.is_done() {
        Readiness::Ready
    } else {
        Readiness::Pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rask_rt::channel;
    use rask_rt::completion::Completion;

    #[test]
    fn put_readiness() {
        let ch = channel::buffered(1);
        assert_eq!(put(&ch.lock()), Readiness::Ready);
        ch.send(1).unwrap();
        assert_eq!(put(&ch.lock()), Readiness::Pending);
        ch.close();
        assert_eq!(put(&ch.lock()), Readiness::Closed);
    }

    #[test]
    fn rendezvous_put_needs_parked_taker() {
        let ch = channel::unbuffered::<i32>();
        assert_eq!(put(&ch.lock()), Readiness::Pending);
    }

    #[test]
    fn take_readiness() {
        let ch = channel::buffered(1);
        assert_eq!(take(&ch.lock()), Readiness::Pending);
        ch.send(1).unwrap();
        assert_eq!(take(&ch.lock()), Readiness::Ready);
        ch.recv().unwrap();
        ch.close();
        assert_eq!(take(&ch.lock()), Readiness::Ready);
    }

    #[test]
    fn wait_readiness() {
        let c = Completion::new();
        assert_eq!(wait(&c.lock()), Readiness::Pending);
        c.complete();
        assert_eq!(wait(&c.lock()), Readiness::Ready);
    }
}
