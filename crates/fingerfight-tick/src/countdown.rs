//! Whole-second countdown (3, 2, 1, go).

use std::time::Duration;

use tokio::time::{self, Instant};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownEvent {
    /// Seconds left, from `n` down to 1.
    Count(u32),
    Complete,
}

#[derive(Debug, Clone, Copy)]
struct Running {
    started: Instant,
    total: u32,
    step: u32,
}

/// Emits `Count(n)` at 0 s, `Count(n-1)` at 1 s, …, `Count(1)` at
/// `n-1` s, then `Complete` at `n` s.
#[derive(Debug, Default)]
pub struct Countdown {
    running: Option<Running>,
}

impl Countdown {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts counting down from `seconds`. With zero, the next `wait`
    /// completes immediately.
    pub fn start(&mut self, seconds: u32) {
        self.running = Some(Running {
            started: Instant::now(),
            total: seconds,
            step: 0,
        });
        debug!(seconds, "countdown started");
    }

    pub fn cancel(&mut self) {
        self.running = None;
    }

    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    /// Waits for the next count. Pends forever while idle.
    pub async fn wait(&mut self) -> CountdownEvent {
        let Some(run) = self.running else {
            std::future::pending::<()>().await;
            unreachable!()
        };

        let due = run.started + Duration::from_secs(u64::from(run.step));
        time::sleep_until(due).await;

        if run.step >= run.total {
            self.running = None;
            return CountdownEvent::Complete;
        }
        self.running = Some(Running {
            step: run.step + 1,
            ..run
        });
        CountdownEvent::Count(run.total - run.step)
    }
}
