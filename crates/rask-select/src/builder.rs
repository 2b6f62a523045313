// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Ordered clause builder.

use rask_rt::channel::Channel;
use rask_rt::completion::Waitable;

use crate::clause::Clause;
use crate::config::SelectConfig;
use crate::error::SelectError;
use crate::outcome::Outcome;

/// Builds a clause list in order, then runs it.
///
/// ```
/// use rask_rt::channel;
/// use rask_select::{Received, Select};
///
/// let a = channel::buffered::<i32>(1);
/// let b = channel::buffered(1);
/// b.send(5).unwrap();
///
/// let out = Select::new().take(&a).take(&b).run().unwrap();
/// assert_eq!(out.index, 2);
/// assert_eq!(out.value, Received::Value(5));
/// ```
#[derive(Debug)]
pub struct Select<'a, T> {
    clauses: Vec<Clause<'a, T>>,
    config: SelectConfig,
}

impl<'a, T> Select<'a, T> {
    pub fn new() -> Self {
        Self::with_config(SelectConfig::default())
    }

    pub fn with_config(config: SelectConfig) -> Self {
        Self {
            clauses: Vec::new(),
            config,
        }
    }

    pub fn take(self, source: &'a Channel<T>) -> Self {
        self.clause(Clause::take(source))
    }

    pub fn drain(self, source: &'a Channel<T>) -> Self {
        self.clause(Clause::drain(source))
    }

    pub fn put(self, sink: &'a Channel<T>, value: T) -> Self {
        self.clause(Clause::put(sink, value))
    }

    pub fn wait(self, waitable: &'a dyn Waitable) -> Self {
        self.clause(Clause::wait(waitable))
    }

    /// Add the default clause, fired by `try_run` when nothing is ready.
    pub fn fallback(self, value: T) -> Self {
        self.clause(Clause::default(value))
    }

    pub fn clause(mut self, clause: Clause<'a, T>) -> Self {
        self.clauses.push(clause);
        self
    }

    pub fn len(&self) -> usize {
        self.clauses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }
}

impl<'a, T: Send> Select<'a, T> {
    /// Block until exactly one clause fires.
    pub fn run(self) -> Result<Outcome<T>, SelectError> {
        crate::select_with_config(self.clauses, true, &self.config)
    }

    /// Single non-blocking pass; falls back to the default clause.
    pub fn try_run(self) -> Result<Outcome<T>, SelectError> {
        crate::select_with_config(self.clauses, false, &self.config)
    }
}

impl<T> Default for Select<'_, T> {
    fn default() -> Self {
        Self::new()
    }
}
