//! Match clocks for Finger Fight.
//!
//! Three pollable timers, all built on `tokio::time::sleep_until`:
//!
//! - [`RoundTimer`]: ticks at a fixed cadence, then completes exactly once.
//! - [`Countdown`]: `Count(n)` … `Count(1)` on second boundaries, then
//!   completes.
//! - [`Scheduler`]: a cancellable queue of arbitrary deadline events.
//!
//! Each one pends forever while idle or cancelled, so they sit inside a
//! room actor's `tokio::select!` loop next to its command channel:
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         Some(cmd) = cmd_rx.recv() => { /* handle commands */ }
//!         event = timer.wait() => { /* broadcast tick or end the round */ }
//!     }
//! }
//! ```
//!
//! Every `wait`/`next` is cancel-safe: state only changes after the sleep
//! resolves, so a losing `select!` branch leaves the timer untouched.
//!
//! For callers without a loop of their own, [`spawn_round_timer`] and
//! [`spawn_countdown`] drive the same timers on a task and invoke
//! callbacks, returning a [`TimerHandle`] for cancellation.

mod countdown;
mod round_timer;
mod scheduler;
mod spawn;

pub use countdown::{Countdown, CountdownEvent};
pub use round_timer::{DEFAULT_TICK_CADENCE, RoundTimer, RoundTimerEvent};
pub use scheduler::{Scheduler, TimerId};
pub use spawn::{TimerHandle, spawn_countdown, spawn_round_timer};
