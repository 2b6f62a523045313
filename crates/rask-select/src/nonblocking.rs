// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Non-blocking select: one pass in clause order, never parks.
//!
//! Each clause is checked and, if ready, executed under its own monitor
//! lock, one clause at a time. Nothing holds across clauses, so a clause
//! seen as not-ready may become ready a moment later; that is the accepted
//! race of this mode. An operation that can no longer complete is treated
//! as not ready.
//!
//! A put into a closed channel is not ready either, so the scan goes on. It
//! only becomes the call's error when nothing later fires and there is no
//! default clause to fall back to.

use log::trace;
use rask_rt::channel::TryRecvError;

use crate::clause::Clause;
use crate::error::SelectError;
use crate::outcome::{Outcome, Received};
use crate::ready::{self, Readiness};

pub(crate) fn evaluate<T>(clauses: Vec<Clause<'_, T>>) -> Result<Outcome<T>, SelectError> {
    let mut fallback = None;
    let mut closed_sink = None;

    for (i, clause) in clauses.into_iter().enumerate() {
        let index = i + 1;
        match clause {
            Clause::Take { source, discard } => {
                let mut guard = source.lock();
                if ready::take(&guard) != Readiness::Ready {
                    continue;
                }
                let value = match guard.take() {
                    Ok(_) if discard => Received::Nil,
                    Ok(v) => Received::Value(v),
                    Err(TryRecvError::Closed) => Received::EndOfStream,
                    Err(TryRecvError::Empty) => continue,
                };
                trace!("select: clause {} (take) fired without blocking", index);
                return Ok(Outcome::new(index, value));
            }
            Clause::Put { sink, value } => {
                let mut guard = sink.lock();
                match ready::put(&guard) {
                    Readiness::Closed => {
                        closed_sink.get_or_insert(index);
                        continue;
                    }
                    Readiness::Pending => continue,
                    Readiness::Ready => {}
                }
                if guard.put(value).is_ok() {
                    trace!("select: clause {} (put) fired without blocking", index);
                    return Ok(Outcome::new(index, Received::Nil));
                }
            }
            Clause::Wait { waitable } => {
                let guard = waitable.completion().lock();
                if ready::wait(&guard) == Readiness::Ready {
                    trace!("select: clause {} (wait) fired without blocking", index);
                    return Ok(Outcome::new(index, Received::Nil));
                }
            }
            Clause::Default { value } => fallback = Some(value),
        }
    }

    match (fallback, closed_sink) {
        (Some(value), _) => Ok(Outcome::new(0, Received::Value(value))),
        (None, Some(index)) => Err(SelectError::ClosedSource { index }),
        (None, None) => Ok(Outcome::none()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rask_rt::channel;
    use rask_rt::signal::Signal;

    #[test]
    fn first_ready_in_order() {
        let a = channel::buffered(1);
        let b = channel::buffered(1);
        a.send(1).unwrap();
        b.send(2).unwrap();
        let out = evaluate(vec![Clause::take(&b), Clause::take(&a)]).unwrap();
        assert_eq!(out, Outcome::new(1, Received::Value(2)));
        assert_eq!(a.len(), 1);
        assert!(b.is_empty());
    }

    #[test]
    fn default_when_nothing_ready() {
        let a = channel::buffered::<i32>(1);
        let out = evaluate(vec![Clause::default(-1), Clause::take(&a)]).unwrap();
        assert_eq!(out, Outcome::new(0, Received::Value(-1)));
    }

    #[test]
    fn none_without_default() {
        let a = channel::buffered::<i32>(1);
        let sig = Signal::new();
        let out = evaluate(vec![Clause::take(&a), Clause::wait(&sig)]).unwrap();
        assert_eq!(out, Outcome::none());
    }

    #[test]
    fn drain_discards_value() {
        let a = channel::buffered(1);
        a.send(9).unwrap();
        let out = evaluate(vec![Clause::drain(&a)]).unwrap();
        assert_eq!(out, Outcome::new(1, Received::Nil));
        assert!(a.is_empty());
    }

    #[test]
    fn put_on_closed_channel_fails_when_nothing_else_fires() {
        let full = channel::buffered(1);
        full.send(0).unwrap();
        let a = channel::buffered(1);
        let b = channel::buffered(1);
        a.close();
        b.close();
        let err = evaluate(vec![Clause::put(&full, 9), Clause::put(&a, 1), Clause::put(&b, 2)])
            .unwrap_err();
        assert!(matches!(err, SelectError::ClosedSource { index: 2 }));
        assert_eq!(full.try_recv(), Ok(0));
    }

    #[test]
    fn closed_put_falls_back_to_default() {
        let a = channel::buffered(1);
        a.close();
        let out = evaluate(vec![Clause::put(&a, 1), Clause::default(0)]).unwrap();
        assert_eq!(out, Outcome::new(0, Received::Value(0)));
    }

    #[test]
    fn closed_put_does_not_hide_later_ready_clause() {
        let a = channel::buffered(1);
        let r = channel::buffered(1);
        a.close();
        r.send(5).unwrap();
        let out = evaluate(vec![Clause::put(&a, 1), Clause::take(&r)]).unwrap();
        assert_eq!(out, Outcome::new(2, Received::Value(5)));
    }

    #[test]
    fn wait_on_set_signal() {
        let a = channel::buffered::<i32>(1);
        let sig = Signal::new();
        sig.set();
        let out = evaluate(vec![Clause::take(&a), Clause::wait(&sig)]).unwrap();
        assert_eq!(out, Outcome::new(2, Received::Nil));
    }
}
