// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Channels.
//!
//! Monitor-style channel: one mutex guards the buffer, two condition
//! variables signal "put became possible" and "take became possible".
//! Blocking `send`/`recv` are built on the same monitor that `select`
//! borrows through [`Channel::lock`].
//!
//! Unbuffered (rendezvous) channels hand a value over only when a receiver
//! is parked in `recv`. Such a receiver is committed: once woken it takes
//! whatever was handed to it. Monitor users parked through
//! [`ChannelGuard::wait_take_ready`] may still walk away, so they never make
//! the channel put-ready. A sender that arrives first parks with an offer
//! that a later taker picks up directly.

use std::collections::VecDeque;
use std::fmt;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use thiserror::Error;

/// Errors from channel operations.
#[derive(Debug, PartialEq, Eq)]
pub enum SendError<T> {
    /// Channel was closed before the value could be delivered.
    Closed(T),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RecvError {
    /// Channel closed and buffer empty.
    #[error("receive on a closed, empty channel")]
    Closed,
}

#[derive(Debug, PartialEq, Eq)]
pub enum TrySendError<T> {
    /// Buffer is full (or no taker is parked on a rendezvous channel).
    Full(T),
    /// Channel is closed.
    Closed(T),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TryRecvError {
    /// No message available right now.
    #[error("channel is empty")]
    Empty,
    /// Channel closed and buffer empty.
    #[error("receive on a closed, empty channel")]
    Closed,
}

impl<T> fmt::Display for SendError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "send on a closed channel")
    }
}

impl<T: fmt::Debug> std::error::Error for SendError<T> {}

impl<T> fmt::Display for TrySendError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrySendError::Full(_) => write!(f, "channel is full"),
            TrySendError::Closed(_) => write!(f, "send on a closed channel"),
        }
    }
}

impl<T: fmt::Debug> std::error::Error for TrySendError<T> {}

/// Create a buffered channel with capacity `n`.
///
/// `buffered(0)` is the same as [`unbuffered`].
pub fn buffered<T>(n: usize) -> Channel<T> {
    Channel::with_capacity(n)
}

/// Create an unbuffered (rendezvous) channel.
pub fn unbuffered<T>() -> Channel<T> {
    Channel::with_capacity(0)
}

struct State<T> {
    buf: VecDeque<T>,
    /// Values from senders parked on a rendezvous channel, tagged by ticket.
    offers: VecDeque<(u64, T)>,
    next_ticket: u64,
    /// Receivers blocked in `recv`/`recv_timeout`, each committed to
    /// taking the next value handed to it.
    parked_takers: usize,
    capacity: usize,
    closed: bool,
}

impl<T> State<T> {
    fn can_put(&self) -> bool {
        if self.closed {
            return false;
        }
        if self.capacity == 0 {
            // Each parked receiver absorbs exactly one handed-off value.
            self.buf.len() < self.parked_takers
        } else {
            self.buf.len() < self.capacity
        }
    }

    fn can_take(&self) -> bool {
        !self.buf.is_empty() || !self.offers.is_empty() || self.closed
    }

    fn has_offer(&self, ticket: u64) -> bool {
        self.offers.iter().any(|(t, _)| *t == ticket)
    }
}

/// A multi-producer, multi-consumer channel shared by reference.
///
/// Wrap in `Arc` to hand it to other threads.
pub struct Channel<T> {
    state: Mutex<State<T>>,
    /// Signalled when a put may have become possible.
    put_ready: Condvar,
    /// Signalled when a take may have become possible.
    take_ready: Condvar,
}

impl<T> Channel<T> {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            state: Mutex::new(State {
                buf: VecDeque::with_capacity(capacity),
                offers: VecDeque::new(),
                next_ticket: 0,
                parked_takers: 0,
                capacity,
                closed: false,
            }),
            put_ready: Condvar::new(),
            take_ready: Condvar::new(),
        }
    }

    /// Acquire the channel's monitor.
    ///
    /// Poisoning is ignored: every mutation leaves the state consistent
    /// before it can panic.
    pub fn lock(&self) -> ChannelGuard<'_, T> {
        ChannelGuard {
            chan: self,
            state: self.state.lock().unwrap_or_else(PoisonError::into_inner),
        }
    }

    /// Blocking send. Blocks while the buffer is full; on a rendezvous
    /// channel, blocks until a taker accepts the value.
    pub fn send(&self, mut val: T) -> Result<(), SendError<T>> {
        let mut guard = self.lock();
        loop {
            val = match guard.put(val) {
                Ok(()) => return Ok(()),
                Err(TrySendError::Closed(v)) => return Err(SendError::Closed(v)),
                Err(TrySendError::Full(v)) => v,
            };
            if guard.capacity() == 0 {
                return guard.offer(val);
            }
            guard = guard.wait_put_ready();
        }
    }

    /// Non-blocking send attempt.
    pub fn try_send(&self, val: T) -> Result<(), TrySendError<T>> {
        self.lock().put(val)
    }

    /// Blocking receive. Blocks while nothing is available.
    pub fn recv(&self) -> Result<T, RecvError> {
        let mut guard = self.lock();
        loop {
            match guard.take() {
                Ok(val) => return Ok(val),
                Err(TryRecvError::Closed) => return Err(RecvError::Closed),
                Err(TryRecvError::Empty) => guard = guard.park_receiver(),
            }
        }
    }

    /// Non-blocking receive attempt.
    pub fn try_recv(&self) -> Result<T, TryRecvError> {
        self.lock().take()
    }

    /// Receive with timeout.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<T, TryRecvError> {
        let deadline = Instant::now() + timeout;
        let mut guard = self.lock();
        loop {
            match guard.take() {
                Err(TryRecvError::Empty) => {}
                other => return other,
            }
            let now = Instant::now();
            if now >= deadline {
                return Err(TryRecvError::Empty);
            }
            guard = guard.park_receiver_timeout(deadline - now);
        }
    }

    /// Close the channel. Buffered values stay receivable; every
    /// parked sender and receiver is woken.
    pub fn close(&self) {
        let mut guard = self.lock();
        guard.state.closed = true;
        guard.notify_all();
    }

    pub fn is_closed(&self) -> bool {
        self.lock().is_closed()
    }

    /// Readiness hint: would a send succeed right now?
    pub fn can_put(&self) -> bool {
        self.lock().can_put()
    }

    /// Readiness hint: would a receive return without blocking right now?
    pub fn can_take(&self) -> bool {
        self.lock().can_take()
    }

    /// Number of buffered values (offers from parked senders excluded).
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.lock().capacity()
    }

    /// Number of receivers currently blocked in `recv` or `recv_timeout`.
    pub fn parked_takers(&self) -> usize {
        self.lock().state.parked_takers
    }

    /// Wake every thread parked on this channel without changing its state.
    ///
    /// Takes the lock first, so a thread that checked its own wake-up
    /// condition under the lock is guaranteed to be parked by the time the
    /// notification is sent.
    pub fn wake_all(&self) {
        self.lock().notify_all();
    }
}

impl<T> fmt::Debug for Channel<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let guard = self.lock();
        f.debug_struct("Channel")
            .field("len", &guard.state.buf.len())
            .field("offers", &guard.state.offers.len())
            .field("capacity", &guard.state.capacity)
            .field("closed", &guard.state.closed)
            .finish()
    }
}

/// Held lock on a channel's monitor.
///
/// All readiness checks and mutations made through one guard are atomic
/// with respect to every other user of the channel.
pub struct ChannelGuard<'a, T> {
    chan: &'a Channel<T>,
    state: MutexGuard<'a, State<T>>,
}

impl<'a, T> ChannelGuard<'a, T> {
    pub fn can_put(&self) -> bool {
        self.state.can_put()
    }

    pub fn can_take(&self) -> bool {
        self.state.can_take()
    }

    pub fn is_closed(&self) -> bool {
        self.state.closed
    }

    pub fn len(&self) -> usize {
        self.state.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.buf.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.state.capacity
    }

    /// Insert `val` if the channel is put-ready.
    pub fn put(&mut self, val: T) -> Result<(), TrySendError<T>> {
        if self.state.closed {
            return Err(TrySendError::Closed(val));
        }
        if !self.state.can_put() {
            return Err(TrySendError::Full(val));
        }
        self.state.buf.push_back(val);
        self.chan.take_ready.notify_all();
        Ok(())
    }

    /// Remove the next value. Buffered values come before rendezvous
    /// offers; a closed, drained channel reports `Closed`.
    pub fn take(&mut self) -> Result<T, TryRecvError> {
        if let Some(val) = self.state.buf.pop_front() {
            self.chan.put_ready.notify_all();
            return Ok(val);
        }
        if let Some((_, val)) = self.state.offers.pop_front() {
            // The offering sender waits on put_ready for its ticket to go.
            self.chan.put_ready.notify_all();
            return Ok(val);
        }
        if self.state.closed {
            Err(TryRecvError::Closed)
        } else {
            Err(TryRecvError::Empty)
        }
    }

    /// Release the lock, block until a put may be possible, reacquire.
    pub fn wait_put_ready(self) -> Self {
        let ChannelGuard { chan, state } = self;
        let state = chan
            .put_ready
            .wait(state)
            .unwrap_or_else(PoisonError::into_inner);
        ChannelGuard { chan, state }
    }

    /// Release the lock, block until a take may be possible, reacquire.
    ///
    /// The caller is not counted as a parked receiver: a rendezvous sender
    /// will not hand a value to a waiter that might give up.
    pub fn wait_take_ready(self) -> Self {
        let ChannelGuard { chan, state } = self;
        let state = chan
            .take_ready
            .wait(state)
            .unwrap_or_else(PoisonError::into_inner);
        ChannelGuard { chan, state }
    }

    /// Park as a committed receiver. The caller must retry `take` after
    /// every wake-up until it gets a value or the channel closes.
    fn park_receiver(self) -> Self {
        let ChannelGuard { chan, mut state } = self;
        state.parked_takers += 1;
        chan.put_ready.notify_all();
        let mut state = chan
            .take_ready
            .wait(state)
            .unwrap_or_else(PoisonError::into_inner);
        state.parked_takers -= 1;
        ChannelGuard { chan, state }
    }

    /// `park_receiver` with a timeout. The caller still retries `take` once
    /// after the timeout so a value handed over meanwhile is not stranded.
    fn park_receiver_timeout(self, timeout: Duration) -> Self {
        let ChannelGuard { chan, mut state } = self;
        state.parked_takers += 1;
        chan.put_ready.notify_all();
        let (mut state, _) = chan
            .take_ready
            .wait_timeout(state, timeout)
            .unwrap_or_else(PoisonError::into_inner);
        state.parked_takers -= 1;
        ChannelGuard { chan, state }
    }

    /// Broadcast on both conditions while holding the lock.
    pub fn notify_all(&self) {
        self.chan.put_ready.notify_all();
        self.chan.take_ready.notify_all();
    }

    /// Park as a rendezvous sender until a taker accepts `val` or the
    /// channel closes.
    fn offer(mut self, val: T) -> Result<(), SendError<T>> {
        let ticket = self.state.next_ticket;
        self.state.next_ticket += 1;
        self.state.offers.push_back((ticket, val));
        self.chan.take_ready.notify_all();

        loop {
            if !self.state.has_offer(ticket) {
                return Ok(());
            }
            if self.state.closed {
                let pos = self
                    .state
                    .offers
                    .iter()
                    .position(|(t, _)| *t == ticket);
                if let Some((_, val)) = pos.and_then(|p| self.state.offers.remove(p)) {
                    return Err(SendError::Closed(val));
                }
                return Ok(());
            }
            self = self.wait_put_ready();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn buffered_send_recv() {
        let ch = buffered(10);
        ch.send(42).unwrap();
        assert_eq!(ch.recv().unwrap(), 42);
    }

    #[test]
    fn unbuffered_rendezvous() {
        let ch = Arc::new(unbuffered());
        let tx = ch.clone();
        let h = std::thread::spawn(move || tx.send(99).unwrap());
        assert_eq!(ch.recv().unwrap(), 99);
        h.join().unwrap();
    }

    #[test]
    fn unbuffered_taker_first() {
        let ch = Arc::new(unbuffered());
        let rx = ch.clone();
        let h = std::thread::spawn(move || rx.recv().unwrap());
        while ch.parked_takers() == 0 {
            std::thread::sleep(Duration::from_millis(1));
        }
        assert!(ch.can_put());
        ch.try_send(7).unwrap();
        assert_eq!(h.join().unwrap(), 7);
    }

    #[test]
    fn unbuffered_not_put_ready_without_taker() {
        let ch = unbuffered::<i32>();
        assert!(!ch.can_put());
        assert!(matches!(ch.try_send(1), Err(TrySendError::Full(1))));
    }

    #[test]
    fn monitor_waiter_does_not_accept_rendezvous_values() {
        let ch = Arc::new(unbuffered::<i32>());
        let waiter = ch.clone();
        let h = std::thread::spawn(move || {
            let mut guard = waiter.lock();
            while !guard.can_take() {
                guard = guard.wait_take_ready();
            }
            guard.is_closed()
        });
        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(ch.parked_takers(), 0);
        assert!(matches!(ch.try_send(1), Err(TrySendError::Full(1))));
        ch.close();
        assert!(h.join().unwrap());
        assert!(ch.is_empty());
    }

    #[test]
    fn closed_channel() {
        let ch = buffered::<i32>(10);
        ch.close();
        assert!(matches!(ch.recv(), Err(RecvError::Closed)));
        assert!(ch.can_take());
        assert!(!ch.can_put());
    }

    #[test]
    fn close_keeps_buffered_values() {
        let ch = buffered(4);
        ch.send(1).unwrap();
        ch.send(2).unwrap();
        ch.close();
        assert_eq!(ch.recv(), Ok(1));
        assert_eq!(ch.recv(), Ok(2));
        assert_eq!(ch.recv(), Err(RecvError::Closed));
        assert!(matches!(ch.try_send(3), Err(TrySendError::Closed(3))));
    }

    #[test]
    fn close_returns_pending_offer() {
        let ch = Arc::new(unbuffered());
        let tx = ch.clone();
        let h = std::thread::spawn(move || tx.send(5));
        while !ch.can_take() {
            std::thread::sleep(Duration::from_millis(1));
        }
        ch.close();
        // Nobody took the offer, so the sender gets its value back.
        match h.join().unwrap() {
            Err(SendError::Closed(v)) => assert_eq!(v, 5),
            Ok(()) => panic!("offer accepted with no taker"),
        }
    }

    #[test]
    fn try_recv_empty() {
        let ch = buffered::<i32>(10);
        assert!(matches!(ch.try_recv(), Err(TryRecvError::Empty)));
    }

    #[test]
    fn full_buffer_blocks_sender() {
        let ch = Arc::new(buffered(1));
        ch.send(1).unwrap();
        assert!(!ch.can_put());
        let tx = ch.clone();
        let h = std::thread::spawn(move || tx.send(2).unwrap());
        std::thread::sleep(Duration::from_millis(10));
        assert_eq!(ch.recv().unwrap(), 1);
        h.join().unwrap();
        assert_eq!(ch.recv().unwrap(), 2);
    }

    #[test]
    fn recv_timeout_expires() {
        let ch = buffered::<i32>(1);
        let start = std::time::Instant::now();
        assert_eq!(
            ch.recv_timeout(Duration::from_millis(10)),
            Err(TryRecvError::Empty)
        );
        assert!(start.elapsed() >= Duration::from_millis(9));
        assert_eq!(ch.parked_takers(), 0);
    }

    #[test]
    fn multiple_producers() {
        let ch = Arc::new(buffered(10));
        let tx1 = ch.clone();
        let tx2 = ch.clone();
        let h1 = std::thread::spawn(move || tx1.send(1).unwrap());
        let h2 = std::thread::spawn(move || tx2.send(2).unwrap());
        let mut vals = vec![ch.recv().unwrap(), ch.recv().unwrap()];
        vals.sort();
        assert_eq!(vals, vec![1, 2]);
        h1.join().unwrap();
        h2.join().unwrap();
    }
}
