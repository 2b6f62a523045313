// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Rask runtime library.
//!
//! Phase A: OS threads and monitor-style primitives. These are the
//! collaborators `rask-select` waits on.
//!
//! Components:
//! - channels: bounded/rendezvous message passing with an exposed monitor
//! - completion: one-shot done flag and the `Waitable` trait
//! - spawn: thread-backed tasks that complete a `Completion`
//! - signal/timeout: manually raised and timer-backed waitables
//! - cancel: cooperative cancellation flag

pub mod cancel;
pub mod channel;
pub mod completion;
pub mod signal;
pub mod spawn;
pub mod timeout;

pub use channel::{buffered, unbuffered, Channel, ChannelGuard};
pub use completion::{Completion, Waitable};
pub use signal::Signal;
pub use spawn::{spawn, Task};
pub use timeout::{timer_after, Timer};
