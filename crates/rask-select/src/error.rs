// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Select error types.

use thiserror::Error;

/// A select call that could not produce an outcome.
#[derive(Debug, Error)]
pub enum SelectError {
    #[error("invalid select: {0}")]
    Config(#[from] ConfigError),

    /// A put clause targets a closed channel and can never complete.
    #[error("clause {index}: channel is closed")]
    ClosedSource { index: usize },

    /// A rival failed for a reason other than a closed source.
    #[error("clause {index}: {message}")]
    Fault { index: usize, message: String },

    /// Every rival exited without resolving the race.
    #[error("select ended without an outcome")]
    Unresolved,

    #[error("clause {index}: failed to spawn rival thread: {source}")]
    Spawn {
        index: usize,
        #[source]
        source: std::io::Error,
    },
}

impl SelectError {
    pub(crate) fn fault(index: usize, message: impl Into<String>) -> Self {
        Self::Fault {
            index,
            message: message.into(),
        }
    }

    /// 1-based index of the clause that caused the failure, if any.
    pub fn clause_index(&self) -> Option<usize> {
        match self {
            SelectError::Config(_) | SelectError::Unresolved => None,
            SelectError::ClosedSource { index }
            | SelectError::Fault { index, .. }
            | SelectError::Spawn { index, .. } => Some(*index),
        }
    }
}

/// A clause list that is malformed for the requested mode.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{count} default clauses given; at most one is allowed")]
    MultipleDefaults { count: usize },

    #[error("a default clause cannot be used in a blocking select")]
    DefaultInBlocking,

    #[error("a blocking select needs at least one clause")]
    NoClauses,
}
