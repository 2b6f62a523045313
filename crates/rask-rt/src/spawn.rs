// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Spawn/join.
//!
//! `spawn` runs a closure on an OS thread and returns a [`Task`]. The task
//! carries a [`Completion`] so it can be joined, polled, or used as a wait
//! clause in `select`.

use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};

use log::trace;
use thiserror::Error;

use crate::cancel::CancelToken;
use crate::completion::{Completion, Waitable};

/// Error returned by `join()` when the task failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JoinError {
    #[error("task panicked: {0}")]
    Panicked(String),
    #[error("task result was already taken")]
    Consumed,
}

struct Shared<T> {
    completion: Completion,
    result: Mutex<Option<Result<T, String>>>,
    cancel_token: CancelToken,
}

/// Handle to a task running on its own OS thread.
///
/// Dropping the handle detaches the thread.
pub struct Task<T> {
    shared: Arc<Shared<T>>,
    handle: Option<JoinHandle<()>>,
}

impl<T> Task<T> {
    /// Whether the task has finished (successfully or by panicking).
    pub fn is_done(&self) -> bool {
        self.shared.completion.is_done()
    }

    /// Wait for the task to complete, returning its result.
    pub fn join(mut self) -> Result<T, JoinError> {
        self.shared.completion.wait();
        if let Some(handle) = self.handle.take() {
            // The closure's panic was already caught inside the thread.
            let _ = handle.join();
        }
        self.result().unwrap_or(Err(JoinError::Consumed))
    }

    /// Take the result if the task has finished. `None` while running.
    pub fn result(&self) -> Option<Result<T, JoinError>> {
        if !self.is_done() {
            return None;
        }
        let slot = self
            .shared
            .result
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        Some(match slot {
            Some(Ok(val)) => Ok(val),
            Some(Err(msg)) => Err(JoinError::Panicked(msg)),
            None => Err(JoinError::Consumed),
        })
    }

    /// Request cooperative cancellation. Only tasks started with
    /// [`spawn_cancellable`] can observe it.
    pub fn cancel(&self) {
        self.shared.cancel_token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.shared.cancel_token.is_cancelled()
    }
}

impl<T: Send> Waitable for Task<T> {
    fn completion(&self) -> &Completion {
        &self.shared.completion
    }
}

/// Spawn a new task on an OS thread.
pub fn spawn<T, F>(f: F) -> Task<T>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    spawn_cancellable(move |_| f())
}

/// Spawn a task whose closure receives its own cancellation token.
pub fn spawn_cancellable<T, F>(f: F) -> Task<T>
where
    T: Send + 'static,
    F: FnOnce(&CancelToken) -> T + Send + 'static,
{
    let shared = Arc::new(Shared {
        completion: Completion::new(),
        result: Mutex::new(None),
        cancel_token: CancelToken::new(),
    });
    let inner = shared.clone();

    let handle = thread::spawn(move || {
        // Catch panics and convert to Result
        let result = match std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            f(&inner.cancel_token)
        })) {
            Ok(val) => Ok(val),
            Err(e) => Err(panic_message(e.as_ref())),
        };
        if let Err(msg) = &result {
            trace!("task panicked: {}", msg);
        }
        *inner.result.lock().unwrap_or_else(PoisonError::into_inner) = Some(result);
        inner.completion.complete();
    });

    Task {
        shared,
        handle: Some(handle),
    }
}

/// Best-effort text of a panic payload.
pub fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn spawn_and_join() {
        let t = spawn(|| 42);
        assert_eq!(t.join().unwrap(), 42);
    }

    #[test]
    fn spawn_and_detach() {
        let t = spawn(|| {
            std::thread::sleep(Duration::from_millis(10));
        });
        drop(t);
    }

    #[test]
    fn spawn_panic_returns_join_error() {
        let t = spawn(|| -> i32 { panic!("boom") });
        match t.join() {
            Err(JoinError::Panicked(msg)) => assert!(msg.contains("boom")),
            other => panic!("expected Panicked, got {:?}", other),
        }
    }

    #[test]
    fn result_before_and_after() {
        let t = spawn(|| {
            std::thread::sleep(Duration::from_millis(20));
            7
        });
        assert!(t.result().is_none());
        t.completion().wait();
        assert_eq!(t.result(), Some(Ok(7)));
        assert_eq!(t.result(), Some(Err(JoinError::Consumed)));
    }

    #[test]
    fn cancel_sets_flag() {
        let t = spawn_cancellable(|token| {
            while !token.is_cancelled() {
                std::thread::sleep(Duration::from_millis(5));
            }
            "done"
        });
        std::thread::sleep(Duration::from_millis(20));
        t.cancel();
        assert!(t.is_cancelled());
        assert_eq!(t.join().unwrap(), "done");
    }
}
