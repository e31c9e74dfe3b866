//! Callback-driven timers running on their own task.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::{Countdown, CountdownEvent, RoundTimer, RoundTimerEvent};

/// Cancels a spawned timer.
///
/// Callbacks run under a gate that [`cancel`](Self::cancel) also takes, so
/// once `cancel` returns no callback is running and none will start. A
/// callback must not cancel its own handle.
#[derive(Debug)]
pub struct TimerHandle {
    gate: Arc<Mutex<bool>>,
    task: JoinHandle<()>,
}

impl TimerHandle {
    pub fn cancel(&self) {
        match self.gate.lock() {
            Ok(mut cancelled) => *cancelled = true,
            Err(poisoned) => *poisoned.into_inner() = true,
        }
        self.task.abort();
    }

    /// True once the timer finished or was cancelled.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

/// Runs `f` unless the gate is closed. Returns false when cancelled.
fn gated(gate: &Mutex<bool>, f: impl FnOnce()) -> bool {
    let Ok(cancelled) = gate.lock() else {
        return false;
    };
    if *cancelled {
        return false;
    }
    f();
    true
}

/// Spawns a [`RoundTimer`] that calls `on_tick` with the remaining seconds
/// every `cadence`, then `on_complete` once.
pub fn spawn_round_timer<T, C>(
    duration: Duration,
    cadence: Duration,
    mut on_tick: T,
    on_complete: C,
) -> TimerHandle
where
    T: FnMut(f64) + Send + 'static,
    C: FnOnce() + Send + 'static,
{
    let gate = Arc::new(Mutex::new(false));
    let task_gate = Arc::clone(&gate);
    let mut timer = RoundTimer::new(cadence);
    timer.start(duration);

    let task = tokio::spawn(async move {
        loop {
            match timer.wait().await {
                RoundTimerEvent::Tick { remaining_secs } => {
                    if !gated(&task_gate, || on_tick(remaining_secs)) {
                        return;
                    }
                }
                RoundTimerEvent::Complete => {
                    gated(&task_gate, on_complete);
                    return;
                }
            }
        }
    });

    TimerHandle { gate, task }
}

/// Spawns a [`Countdown`] from `seconds`, calling `on_count` for each
/// number and `on_complete` at zero.
pub fn spawn_countdown<N, C>(seconds: u32, mut on_count: N, on_complete: C) -> TimerHandle
where
    N: FnMut(u32) + Send + 'static,
    C: FnOnce() + Send + 'static,
{
    let gate = Arc::new(Mutex::new(false));
    let task_gate = Arc::clone(&gate);
    let mut countdown = Countdown::new();
    countdown.start(seconds);

    let task = tokio::spawn(async move {
        loop {
            match countdown.wait().await {
                CountdownEvent::Count(n) => {
                    if !gated(&task_gate, || on_count(n)) {
                        return;
                    }
                }
                CountdownEvent::Complete => {
                    gated(&task_gate, on_complete);
                    return;
                }
            }
        }
    });

    TimerHandle { gate, task }
}
