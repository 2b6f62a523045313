// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Select outcomes.

/// What the fired clause produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Received<T> {
    /// A taken value, or the value carried by a default clause.
    Value(T),
    /// Put, wait, and drained takes produce nothing.
    Nil,
    /// Take on a closed, drained channel.
    EndOfStream,
}

impl<T> Received<T> {
    pub fn into_value(self) -> Option<T> {
        match self {
            Received::Value(v) => Some(v),
            Received::Nil | Received::EndOfStream => None,
        }
    }

    pub fn is_end_of_stream(&self) -> bool {
        matches!(self, Received::EndOfStream)
    }
}

/// Result of a select call: which clause fired and what it produced.
///
/// `index` is 1-based. `0` means either the default clause fired (value
/// is the default's) or nothing was ready (value is `Nil`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome<T> {
    pub index: usize,
    pub value: Received<T>,
}

impl<T> Outcome<T> {
    pub fn new(index: usize, value: Received<T>) -> Self {
        Self { index, value }
    }

    /// Nothing was ready and there was no default.
    pub fn none() -> Self {
        Self::new(0, Received::Nil)
    }

    /// True when no numbered clause fired.
    pub fn is_fallback(&self) -> bool {
        self.index == 0
    }
}
