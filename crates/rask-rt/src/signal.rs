// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Manually raised one-shot signal.

use crate::completion::{Completion, Waitable};

/// A condition that some thread raises once and others wait on.
#[derive(Debug, Default)]
pub struct Signal {
    completion: Completion,
}

impl Signal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self) {
        self.completion.complete();
    }

    pub fn is_set(&self) -> bool {
        self.completion.is_done()
    }

    /// Block until the signal is raised.
    pub fn wait(&self) {
        self.completion.wait();
    }
}

impl Waitable for Signal {
    fn completion(&self) -> &Completion {
        &self.completion
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn set_from_other_thread() {
        let s = Arc::new(Signal::new());
        let s2 = s.clone();
        let h = std::thread::spawn(move || s2.set());
        s.wait();
        assert!(s.is_set());
        assert!(s.is_done());
        h.join().unwrap();
    }
}
