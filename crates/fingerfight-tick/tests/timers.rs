//! Integration tests for the round timer, countdown and scheduler.
//!
//! Every async test runs with a paused clock, so `sleep_until` resolves as
//! soon as the runtime is idle and timings are exact.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use fingerfight_tick::{
    Countdown, CountdownEvent, DEFAULT_TICK_CADENCE, RoundTimer, RoundTimerEvent, Scheduler,
    spawn_countdown, spawn_round_timer,
};
use tokio::time::Instant;

// =========================================================================
// Helpers
// =========================================================================

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

async fn drain_round(timer: &mut RoundTimer) -> (Vec<f64>, Duration) {
    let start = Instant::now();
    let mut ticks = Vec::new();
    loop {
        match timer.wait().await {
            RoundTimerEvent::Tick { remaining_secs } => ticks.push(remaining_secs),
            RoundTimerEvent::Complete => return (ticks, start.elapsed()),
        }
    }
}

// =========================================================================
// RoundTimer
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_round_timer_ticks_then_completes_once() {
    let mut timer = RoundTimer::new(DEFAULT_TICK_CADENCE);
    timer.start(Duration::from_secs(1));

    let (ticks, elapsed) = drain_round(&mut timer).await;

    assert_eq!(ticks.len(), 9);
    assert!(approx(ticks[0], 0.9));
    assert!(approx(ticks[8], 0.1));
    assert_eq!(elapsed, Duration::from_secs(1));
    assert!(!timer.is_running());

    // Completed timers go idle instead of completing again.
    let again = tokio::time::timeout(Duration::from_secs(5), timer.wait()).await;
    assert!(again.is_err(), "completed timer should pend");
}

#[tokio::test(start_paused = true)]
async fn test_round_timer_remaining_is_rounded_to_tenths() {
    let mut timer = RoundTimer::new(Duration::from_millis(250));
    timer.start(Duration::from_millis(1_000));

    let (ticks, _) = drain_round(&mut timer).await;

    // 750 ms -> 0.8, 500 ms -> 0.5, 250 ms -> 0.3 (half away from zero).
    assert_eq!(ticks.len(), 3);
    assert!(approx(ticks[0], 0.8));
    assert!(approx(ticks[1], 0.5));
    assert!(approx(ticks[2], 0.3));
}

#[tokio::test(start_paused = true)]
async fn test_round_timer_idle_never_fires() {
    let mut timer = RoundTimer::default();
    let result = tokio::time::timeout(Duration::from_secs(5), timer.wait()).await;
    assert!(result.is_err(), "idle timer should pend forever");
}

#[tokio::test(start_paused = true)]
async fn test_round_timer_cancel_suppresses_complete() {
    let mut timer = RoundTimer::default();
    timer.start(Duration::from_millis(300));
    assert!(matches!(timer.wait().await, RoundTimerEvent::Tick { .. }));

    timer.cancel();

    let result = tokio::time::timeout(Duration::from_secs(2), timer.wait()).await;
    assert!(result.is_err(), "cancelled timer must not complete");
}

#[tokio::test(start_paused = true)]
async fn test_round_timer_restart_discards_previous_round() {
    let mut timer = RoundTimer::default();
    timer.start(Duration::from_secs(10));
    timer.wait().await;

    timer.start(Duration::from_millis(200));
    let (ticks, elapsed) = drain_round(&mut timer).await;
    assert_eq!(ticks.len(), 1);
    assert_eq!(elapsed, Duration::from_millis(200));
}

#[tokio::test(start_paused = true)]
async fn test_round_timer_skips_ahead_after_overrun() {
    let mut timer = RoundTimer::default();
    timer.start(Duration::from_secs(2));

    // Simulate a busy owner: nobody polls for 560 ms.
    tokio::time::advance(Duration::from_millis(560)).await;

    let first = timer.wait().await;
    let RoundTimerEvent::Tick { remaining_secs } = first else {
        panic!("expected tick, got {first:?}");
    };
    assert!(approx(remaining_secs, 1.4));

    // Next tick is one cadence after the late wake-up, not a stale burst.
    let before = Instant::now();
    timer.wait().await;
    assert_eq!(before.elapsed(), DEFAULT_TICK_CADENCE);
}

#[tokio::test(start_paused = true)]
async fn test_round_timer_in_select_loop() {
    let mut timer = RoundTimer::default();
    timer.start(Duration::from_millis(500));

    let (tx, mut rx) = tokio::sync::mpsc::channel::<&str>(4);
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(250)).await;
        tx.send("hello").await.ok();
    });

    let mut ticks = 0;
    let mut commands = 0;
    loop {
        tokio::select! {
            Some(_) = rx.recv() => commands += 1,
            event = timer.wait() => match event {
                RoundTimerEvent::Tick { .. } => ticks += 1,
                RoundTimerEvent::Complete => break,
            },
        }
    }

    assert_eq!(commands, 1);
    assert_eq!(ticks, 4);
}

// =========================================================================
// Countdown
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_countdown_counts_on_second_boundaries() {
    let start = Instant::now();
    let mut countdown = Countdown::new();
    countdown.start(3);

    let mut seen = Vec::new();
    loop {
        let event = countdown.wait().await;
        seen.push((event, start.elapsed().as_secs()));
        if event == CountdownEvent::Complete {
            break;
        }
    }

    assert_eq!(
        seen,
        vec![
            (CountdownEvent::Count(3), 0),
            (CountdownEvent::Count(2), 1),
            (CountdownEvent::Count(1), 2),
            (CountdownEvent::Complete, 3),
        ]
    );
    assert!(!countdown.is_running());
}

#[tokio::test(start_paused = true)]
async fn test_countdown_zero_completes_immediately() {
    let mut countdown = Countdown::new();
    countdown.start(0);
    assert_eq!(countdown.wait().await, CountdownEvent::Complete);
}

#[tokio::test(start_paused = true)]
async fn test_countdown_cancel_pends() {
    let mut countdown = Countdown::new();
    countdown.start(2);
    assert_eq!(countdown.wait().await, CountdownEvent::Count(2));
    countdown.cancel();
    let result = tokio::time::timeout(Duration::from_secs(5), countdown.wait()).await;
    assert!(result.is_err());
}

// =========================================================================
// Scheduler
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_scheduler_fires_in_deadline_order() {
    let mut s = Scheduler::new();
    s.schedule_in(Duration::from_millis(300), "late");
    s.schedule_in(Duration::from_millis(100), "early");
    s.schedule_in(Duration::from_millis(200), "middle");

    let start = Instant::now();
    assert_eq!(s.next().await.1, "early");
    assert_eq!(start.elapsed(), Duration::from_millis(100));
    assert_eq!(s.next().await.1, "middle");
    assert_eq!(s.next().await.1, "late");
}

#[tokio::test(start_paused = true)]
async fn test_scheduler_cancel_all_pends() {
    let mut s = Scheduler::new();
    s.schedule_in(Duration::from_millis(10), 1u8);
    s.schedule_in(Duration::from_millis(20), 2u8);
    s.cancel_all();
    assert!(s.is_empty());
    let result = tokio::time::timeout(Duration::from_secs(1), s.next()).await;
    assert!(result.is_err());
}

// =========================================================================
// Callback timers
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_spawn_round_timer_invokes_callbacks() {
    let ticks = Arc::new(Mutex::new(Vec::new()));
    let done = Arc::new(Mutex::new(0));

    let t = Arc::clone(&ticks);
    let d = Arc::clone(&done);
    let handle = spawn_round_timer(
        Duration::from_millis(500),
        DEFAULT_TICK_CADENCE,
        move |remaining| t.lock().unwrap().push(remaining),
        move || *d.lock().unwrap() += 1,
    );

    tokio::time::sleep(Duration::from_secs(1)).await;

    assert_eq!(ticks.lock().unwrap().len(), 4);
    assert_eq!(*done.lock().unwrap(), 1);
    assert!(handle.is_finished());
}

#[tokio::test(start_paused = true)]
async fn test_spawn_round_timer_cancel_stops_callbacks() {
    let ticks = Arc::new(Mutex::new(0));
    let done = Arc::new(Mutex::new(false));

    let t = Arc::clone(&ticks);
    let d = Arc::clone(&done);
    let handle = spawn_round_timer(
        Duration::from_secs(1),
        DEFAULT_TICK_CADENCE,
        move |_| *t.lock().unwrap() += 1,
        move || *d.lock().unwrap() = true,
    );

    tokio::time::sleep(Duration::from_millis(350)).await;
    handle.cancel();
    let seen = *ticks.lock().unwrap();

    tokio::time::sleep(Duration::from_secs(2)).await;

    assert_eq!(*ticks.lock().unwrap(), seen);
    assert!(!*done.lock().unwrap());
}

#[tokio::test(start_paused = true)]
async fn test_spawn_countdown_counts_down() {
    let counts = Arc::new(Mutex::new(Vec::new()));
    let done = Arc::new(Mutex::new(false));

    let c = Arc::clone(&counts);
    let d = Arc::clone(&done);
    let _handle = spawn_countdown(
        3,
        move |n| c.lock().unwrap().push(n),
        move || *d.lock().unwrap() = true,
    );

    tokio::time::sleep(Duration::from_millis(3_500)).await;

    assert_eq!(*counts.lock().unwrap(), vec![3, 2, 1]);
    assert!(*done.lock().unwrap());
}
