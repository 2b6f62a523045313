// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Blocking select: one rival thread per clause, first ready rival wins.
//!
//! Every rival locks its own clause's monitor and parks on that monitor's
//! condition until its predicate holds or it is cancelled. A rival whose
//! predicate holds claims the race (which cancels everyone else), performs
//! its operation under the same lock, releases it, wakes the losers and
//! writes the outcome. Losers never touch their source after the claim.
//!
//! Rivals run as scoped threads borrowing the clause sources, so the call
//! returns only after every loser has unwound. The outcome is read after
//! the scope closes.

use std::panic::{self, AssertUnwindSafe};
use std::thread;

use log::{debug, trace};
use rask_rt::channel::{ChannelGuard, TryRecvError};
use rask_rt::completion::CompletionGuard;
use rask_rt::spawn::panic_message;

use crate::clause::Clause;
use crate::config::SelectConfig;
use crate::error::{ConfigError, SelectError};
use crate::outcome::{Outcome, Received};
use crate::race::Race;
use crate::ready::{self, Readiness};
use crate::slot::ResultSlot;

type Slot<T> = ResultSlot<Result<Outcome<T>, SelectError>>;

pub(crate) fn resolve<T: Send>(
    clauses: Vec<Clause<'_, T>>,
    config: &SelectConfig,
) -> Result<Outcome<T>, SelectError> {
    let monitors = clauses
        .iter()
        .map(Clause::monitor)
        .collect::<Option<Vec<_>>>()
        .ok_or(ConfigError::DefaultInBlocking)?;
    let race = Race::new(monitors);
    let slot: Slot<T> = ResultSlot::new();

    debug!("select: racing {} rivals", race.rivals());

    thread::scope(|scope| {
        for (i, clause) in clauses.into_iter().enumerate() {
            let (race, slot) = (&race, &slot);
            let spawned = config
                .rival_builder(i + 1)
                .spawn_scoped(scope, move || rival(i, clause, race, slot));
            if let Err(source) = spawned {
                // Stop whatever already started; an earlier winner keeps
                // its outcome.
                if race.cancel_rivals(race.caller()) {
                    slot.put(Err(SelectError::Spawn {
                        index: i + 1,
                        source,
                    }));
                }
                break;
            }
        }
    });

    // Every rival has been joined. One of them, or the caller above, wrote
    // the slot before anyone could exit.
    slot.into_inner().unwrap_or(Err(SelectError::Unresolved))
}

/// Body of one rival thread.
fn rival<T>(rival: usize, clause: Clause<'_, T>, race: &Race<'_>, slot: &Slot<T>) {
    let index = rival + 1;
    let kind = clause.kind();

    let resolution = match panic::catch_unwind(AssertUnwindSafe(|| contend(rival, clause, race))) {
        Ok(Ok(None)) => {
            trace!("select: rival {} ({}) cancelled", index, kind);
            return;
        }
        Ok(Ok(Some(outcome))) => Ok(outcome),
        Ok(Err(err)) => Err(err),
        Err(payload) => Err(SelectError::fault(
            index,
            format!("rival panicked: {}", panic_message(payload.as_ref())),
        )),
    };

    if let Err(err) = &resolution {
        // A fault only counts if it is the first resolution of the race.
        if !race.is_winner(rival) && !race.claim(rival) {
            trace!("select: rival {} lost before failing: {}", index, err);
            return;
        }
        debug!("select: clause {} ({}) failed: {}", index, kind, err);
    } else {
        debug!("select: clause {} ({}) won", index, kind);
    }

    race.wake_losers(rival);
    slot.put(resolution);
}

/// Park on the clause until it is ready, then claim and fire it.
///
/// `Ok(None)` means this rival lost. `Ok(Some(_))` is only returned by the
/// race's winner.
fn contend<T>(
    rival: usize,
    clause: Clause<'_, T>,
    race: &Race<'_>,
) -> Result<Option<Outcome<T>>, SelectError> {
    let index = rival + 1;
    match clause {
        Clause::Take { source, discard } => {
            let Some(mut guard) = park_until_ready(
                race,
                rival,
                source.lock(),
                ready::take,
                ChannelGuard::wait_take_ready,
            )?
            else {
                return Ok(None);
            };
            let value = match guard.take() {
                Ok(_) if discard => Received::Nil,
                Ok(v) => Received::Value(v),
                Err(TryRecvError::Closed) => Received::EndOfStream,
                Err(TryRecvError::Empty) => {
                    return Err(SelectError::fault(index, "take failed after readiness check"))
                }
            };
            Ok(Some(Outcome::new(index, value)))
        }
        Clause::Put { sink, value } => {
            let Some(mut guard) = park_until_ready(
                race,
                rival,
                sink.lock(),
                ready::put,
                ChannelGuard::wait_put_ready,
            )?
            else {
                return Ok(None);
            };
            guard
                .put(value)
                .map_err(|e| SelectError::fault(index, format!("put failed after readiness check: {}", e)))?;
            Ok(Some(Outcome::new(index, Received::Nil)))
        }
        Clause::Wait { waitable } => {
            let claimed = park_until_ready(
                race,
                rival,
                waitable.completion().lock(),
                ready::wait,
                CompletionGuard::wait,
            )?;
            Ok(claimed.map(|_guard| Outcome::new(index, Received::Nil)))
        }
        Clause::Default { .. } => Err(ConfigError::DefaultInBlocking.into()),
    }
}

/// The monitor wait loop shared by every clause kind.
///
/// Holds `guard` throughout except while parked. Cancellation is checked
/// under the lock on every wake, before the predicate. Returns the still
/// held guard once this rival has claimed the race.
fn park_until_ready<G>(
    race: &Race<'_>,
    rival: usize,
    mut guard: G,
    readiness: impl Fn(&G) -> Readiness,
    park: impl Fn(G) -> G,
) -> Result<Option<G>, SelectError> {
    loop {
        if race.is_cancelled(rival) {
            return Ok(None);
        }
        match readiness(&guard) {
            Readiness::Ready => break,
            Readiness::Closed => return Err(SelectError::ClosedSource { index: rival + 1 }),
            Readiness::Pending => {
                trace!("select: rival {} parked", rival + 1);
                guard = park(guard);
            }
        }
    }
    if race.claim(rival) {
        Ok(Some(guard))
    } else {
        Ok(None)
    }
}
