// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Multiway select.
//!
//! Wait on an ordered list of clauses (take from a channel, put into a
//! channel, wait for a task/signal/timer) and run exactly one of them.
//!
//! - Blocking mode races one rival thread per clause. The first rival to
//!   see its clause ready under the clause's own monitor lock claims the
//!   race, performs the operation under that lock, and cancels the rest.
//! - Non-blocking mode makes one pass in clause order and falls back to the
//!   default clause, or to `(0, Nil)` without one.
//!
//! There is no built-in timeout; add a `rask_rt::timer_after` wait clause.
//!
//! Components:
//! - `clause`     : clause kinds, constructors, validation
//! - `ready`      : readiness predicates under the monitor lock
//! - `nonblocking`: single-pass resolver
//! - `race`       : winner claim + cancellation protocol
//! - `blocking`   : rival threads and the monitor wait loop
//! - `slot`       : single-write result handoff

mod blocking;
mod builder;
pub mod clause;
pub mod config;
pub mod error;
mod nonblocking;
pub mod outcome;
mod race;
mod ready;
mod slot;

use log::debug;

pub use builder::Select;
pub use clause::{Clause, ClauseKind};
pub use config::SelectConfig;
pub use error::{ConfigError, SelectError};
pub use outcome::{Outcome, Received};

/// Run one select over `clauses`.
///
/// `blocking = true` waits until exactly one clause fires and rejects a
/// default clause. `blocking = false` never waits.
pub fn select<T: Send>(clauses: Vec<Clause<'_, T>>, blocking: bool) -> Result<Outcome<T>, SelectError> {
    select_with_config(clauses, blocking, &SelectConfig::default())
}

/// [`select`] with explicit rival thread settings.
pub fn select_with_config<T: Send>(
    clauses: Vec<Clause<'_, T>>,
    blocking: bool,
    config: &SelectConfig,
) -> Result<Outcome<T>, SelectError> {
    clause::validate(&clauses, blocking)?;
    let outcome = if blocking {
        blocking::resolve(clauses, config)
    } else {
        nonblocking::evaluate(clauses)
    }?;
    debug!(
        "select: resolved to clause {} ({})",
        outcome.index,
        if blocking { "blocking" } else { "non-blocking" }
    );
    Ok(outcome)
}

/// Non-blocking shorthand for `select(clauses, false)`.
pub fn try_select<T: Send>(clauses: Vec<Clause<'_, T>>) -> Result<Outcome<T>, SelectError> {
    select(clauses, false)
}
