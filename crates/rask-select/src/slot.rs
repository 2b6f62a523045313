// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Single-write result handoff between the winning rival and the caller.

use std::sync::{Mutex, PoisonError};

/// Capacity-one slot. Exactly one `put` can succeed over its lifetime.
///
/// The caller reads it with `into_inner` once every rival has been joined,
/// so reading never races a write and can happen only once.
pub(crate) struct ResultSlot<T> {
    value: Mutex<Option<T>>,
}

impl<T> ResultSlot<T> {
    pub fn new() -> Self {
        Self {
            value: Mutex::new(None),
        }
    }

    /// Store `value` unless a value was already written. Returns whether
    /// this call wrote it.
    pub fn put(&self, value: T) -> bool {
        let mut slot = self.value.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.is_some() {
            return false;
        }
        *slot = Some(value);
        true
    }

    /// The written value, or `None` if nobody resolved the race.
    pub fn into_inner(self) -> Option<T> {
        self.value
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_write_refused() {
        let slot = ResultSlot::new();
        assert!(slot.put(1));
        assert!(!slot.put(2));
        assert_eq!(slot.into_inner(), Some(1));
    }

    #[test]
    fn one_writer_among_threads_wins() {
        let slot = ResultSlot::new();
        let wins = std::thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|i| {
                    let slot = &slot;
                    s.spawn(move || slot.put(i))
                })
                .collect();
            handles
                .into_iter()
                .filter_map(|h| h.join().ok())
                .filter(|&won| won)
                .count()
        });
        assert_eq!(wins, 1);
    }

    #[test]
    fn unwritten_slot_is_empty() {
        let slot = ResultSlot::<u8>::new();
        assert_eq!(slot.into_inner(), None);
    }
}
