// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Select clauses.
//!
//! A clause borrows its channel or waitable; select never owns a source.

use std::fmt;

use rask_rt::channel::Channel;
use rask_rt::completion::Waitable;

use crate::error::ConfigError;
use crate::race::Wake;

/// One candidate operation in a select call.
pub enum Clause<'a, T> {
    /// Remove a value. With `discard` set the value is dropped and the
    /// outcome carries `Nil`.
    Take { source: &'a Channel<T>, discard: bool },
    /// Insert `value`.
    Put { sink: &'a Channel<T>, value: T },
    /// Wait for a task, signal, or timer to complete.
    Wait { waitable: &'a dyn Waitable },
    /// Fires in non-blocking mode when nothing else is ready.
    Default { value: T },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClauseKind {
    Take,
    Put,
    Wait,
    Default,
}

impl fmt::Display for ClauseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ClauseKind::Take => "take",
            ClauseKind::Put => "put",
            ClauseKind::Wait => "wait",
            ClauseKind::Default => "default",
        };
        f.write_str(name)
    }
}

impl<'a, T> Clause<'a, T> {
    pub fn take(source: &'a Channel<T>) -> Self {
        Clause::Take {
            source,
            discard: false,
        }
    }

    /// Fire-and-forget take: the value is removed and dropped.
    pub fn drain(source: &'a Channel<T>) -> Self {
        Clause::Take {
            source,
            discard: true,
        }
    }

    pub fn put(sink: &'a Channel<T>, value: T) -> Self {
        Clause::Put { sink, value }
    }

    pub fn wait(waitable: &'a dyn Waitable) -> Self {
        Clause::Wait { waitable }
    }

    pub fn default(value: T) -> Self {
        Clause::Default { value }
    }

    pub fn kind(&self) -> ClauseKind {
        match self {
            Clause::Take { .. } => ClauseKind::Take,
            Clause::Put { .. } => ClauseKind::Put,
            Clause::Wait { .. } => ClauseKind::Wait,
            Clause::Default { .. } => ClauseKind::Default,
        }
    }

    /// Cheap readiness hint taken outside any held lock. May be stale by
    /// the time it is returned.
    pub fn is_ready_hint(&self) -> bool {
        match self {
            Clause::Take { source, .. } => source.can_take(),
            Clause::Put { sink, .. } => sink.can_put(),
            Clause::Wait { waitable } => waitable.is_done(),
            Clause::Default { .. } => false,
        }
    }
}

impl<'a, T: Send> Clause<'a, T> {
    /// The monitor a canceller must wake to reach a rival parked on this
    /// clause. `None` for the default clause, which never parks.
    pub(crate) fn monitor(&self) -> Option<&'a dyn Wake> {
        match *self {
            Clause::Take { source, .. } => Some(source as &dyn Wake),
            Clause::Put { sink, .. } => Some(sink as &dyn Wake),
            Clause::Wait { waitable } => Some(waitable.completion() as &dyn Wake),
            Clause::Default { .. } => None,
        }
    }
}

impl<T> fmt::Debug for Clause<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Clause").field("kind", &self.kind()).finish()
    }
}

/// Check the clause list against the requested mode.
pub(crate) fn validate<T>(clauses: &[Clause<'_, T>], blocking: bool) -> Result<(), ConfigError> {
    let defaults = clauses
        .iter()
        .filter(|c| c.kind() == ClauseKind::Default)
        .count();
    if defaults > 1 {
        return Err(ConfigError::MultipleDefaults { count: defaults });
    }
    if blocking {
        if defaults > 0 {
            return Err(ConfigError::DefaultInBlocking);
        }
        if clauses.is_empty() {
            return Err(ConfigError::NoClauses);
        }
    }
    Ok(())
}
