//! Fixed-cadence round clock.

use std::time::Duration;

use tokio::time::{self, Instant};
use tracing::{debug, trace, warn};

/// Cadence of `round-tick` broadcasts.
pub const DEFAULT_TICK_CADENCE: Duration = Duration::from_millis(100);

/// What a [`RoundTimer`] produced.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RoundTimerEvent {
    /// Time left in the round, in seconds rounded to one decimal.
    Tick { remaining_secs: f64 },
    /// The round's duration elapsed. Emitted once per [`RoundTimer::start`].
    Complete,
}

#[derive(Debug, Clone, Copy)]
struct Running {
    ends_at: Instant,
    next_tick: Instant,
    ticks: u64,
}

/// Round clock: `Tick` every cadence, `Complete` when the duration is up.
///
/// Overruns are handled by skipping: if the owner was too busy to poll for
/// a while, the next tick is rescheduled from *now* instead of firing a
/// burst of stale ticks.
#[derive(Debug)]
pub struct RoundTimer {
    cadence: Duration,
    running: Option<Running>,
}

impl Default for RoundTimer {
    fn default() -> Self {
        Self::new(DEFAULT_TICK_CADENCE)
    }
}

impl RoundTimer {
    /// Creates an idle timer. A zero cadence is bumped to 1 ms.
    pub fn new(cadence: Duration) -> Self {
        Self {
            cadence: cadence.max(Duration::from_millis(1)),
            running: None,
        }
    }

    /// Starts (or restarts) the clock. Any in-flight round is discarded
    /// without emitting its `Complete`.
    pub fn start(&mut self, duration: Duration) {
        let now = Instant::now();
        self.running = Some(Running {
            ends_at: now + duration,
            next_tick: now + self.cadence,
            ticks: 0,
        });
        debug!(duration_ms = duration.as_millis() as u64, "round timer started");
    }

    /// Stops the clock. No further events until the next `start`.
    pub fn cancel(&mut self) {
        if self.running.take().is_some() {
            debug!("round timer cancelled");
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    /// Deadline of the current round, if one is running.
    pub fn ends_at(&self) -> Option<Instant> {
        self.running.map(|r| r.ends_at)
    }

    /// Remaining time, or `None` when idle.
    pub fn remaining(&self) -> Option<Duration> {
        self.running
            .map(|r| r.ends_at.saturating_duration_since(Instant::now()))
    }

    pub fn cadence(&self) -> Duration {
        self.cadence
    }

    /// Waits for the next event. Pends forever while idle.
    pub async fn wait(&mut self) -> RoundTimerEvent {
        let Some(run) = self.running else {
            std::future::pending::<()>().await;
            unreachable!()
        };

        if run.next_tick >= run.ends_at {
            time::sleep_until(run.ends_at).await;
            self.running = None;
            debug!(ticks = run.ticks, "round timer complete");
            return RoundTimerEvent::Complete;
        }

        time::sleep_until(run.next_tick).await;
        let now = Instant::now();
        let late_by = now.saturating_duration_since(run.next_tick);

        let next_tick = if late_by > self.cadence / 10 {
            let skipped = late_by.as_nanos() / self.cadence.as_nanos();
            if skipped > 0 {
                warn!(
                    tick = run.ticks + 1,
                    skipped = skipped as u64,
                    late_ms = late_by.as_secs_f64() * 1000.0,
                    "round tick overrun, skipping ahead"
                );
            }
            now + self.cadence
        } else {
            run.next_tick + self.cadence
        };

        let remaining = run.ends_at.saturating_duration_since(now);
        let remaining_secs = (remaining.as_secs_f64() * 10.0).round() / 10.0;

        self.running = Some(Running {
            next_tick,
            ticks: run.ticks + 1,
            ..run
        });
        trace!(remaining_secs, "round tick");
        RoundTimerEvent::Tick { remaining_secs }
    }
}
