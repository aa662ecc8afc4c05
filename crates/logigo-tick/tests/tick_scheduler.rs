//! Integration tests for the fixed-period tick scheduler.
//!
//! Uses `tokio::time::pause()` (via `start_paused = true`) to control time
//! deterministically: `sleep_until` resolves as soon as the runtime has
//! nothing else to do, and `advance` simulates a late wake-up.

use std::time::Duration;

use logigo_tick::{TickConfig, TickPolicy, TickScheduler};
use tokio::time::Instant;

// =========================================================================
// Helpers
// =========================================================================

fn one_second() -> TickConfig {
    TickConfig::with_interval(Duration::from_secs(1))
}

// =========================================================================
// TickConfig
// =========================================================================

#[test]
fn test_default_config_ticks_every_second_with_skip() {
    let cfg = TickConfig::default();
    assert_eq!(cfg.interval, Duration::from_secs(1));
    assert_eq!(cfg.policy, TickPolicy::Skip);
}

#[test]
fn test_validated_replaces_zero_interval() {
    let cfg = TickConfig::with_interval(Duration::ZERO).validated();
    assert_eq!(cfg.interval, TickConfig::DEFAULT_INTERVAL);
}

#[test]
fn test_validated_keeps_valid_interval() {
    let cfg = TickConfig::with_interval(Duration::from_millis(250)).validated();
    assert_eq!(cfg.interval, Duration::from_millis(250));
}

// =========================================================================
// Scheduler creation and accessors
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_scheduler_initial_state() {
    let s = TickScheduler::new(one_second());
    assert_eq!(s.tick_count(), 0);
    assert_eq!(s.interval(), Duration::from_secs(1));
    assert_eq!(s.policy(), TickPolicy::Skip);
    assert!(!s.is_paused());
}

// =========================================================================
// Tick firing
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_wait_for_tick_fires_after_one_interval() {
    let start = Instant::now();
    let mut s = TickScheduler::new(one_second());

    let info = s.wait_for_tick().await;

    assert_eq!(info.tick, 1);
    assert!(!info.overrun);
    assert_eq!(info.ticks_skipped, 0);
    assert_eq!(start.elapsed(), Duration::from_secs(1));
}

#[tokio::test(start_paused = true)]
async fn test_multiple_ticks_increment_monotonically() {
    let mut s = TickScheduler::with_interval(Duration::from_millis(100));

    for expected in 1..=5 {
        let info = s.wait_for_tick().await;
        assert_eq!(info.tick, expected);
    }
    assert_eq!(s.tick_count(), 5);
}

// =========================================================================
// Overrun policies
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_skip_policy_reschedules_from_now() {
    let mut s = TickScheduler::new(one_second());

    // Simulate the process being frozen for 3.5 s.
    tokio::time::advance(Duration::from_millis(3_500)).await;
    let late = s.wait_for_tick().await;
    assert!(late.overrun);
    assert_eq!(late.ticks_skipped, 2);

    // The next tick is a full interval after the late one.
    let before = Instant::now();
    let next = s.wait_for_tick().await;
    assert!(!next.overrun);
    assert_eq!(before.elapsed(), Duration::from_secs(1));
}

#[tokio::test(start_paused = true)]
async fn test_drop_policy_keeps_original_cadence() {
    let mut s = TickScheduler::new(TickConfig {
        policy: TickPolicy::Drop,
        ..one_second()
    });

    tokio::time::advance(Duration::from_millis(3_500)).await;
    let late = s.wait_for_tick().await;
    assert!(late.overrun);

    // Next deadline (t=2s) is already in the past, so it fires at once.
    let before = Instant::now();
    let next = s.wait_for_tick().await;
    assert_eq!(before.elapsed(), Duration::ZERO);
    assert!(next.overrun);
}

// =========================================================================
// Pause / Resume
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_pause_prevents_ticks() {
    let mut s = TickScheduler::new(one_second());
    s.wait_for_tick().await;

    s.pause();
    assert!(s.is_paused());

    let result =
        tokio::time::timeout(Duration::from_secs(10), s.wait_for_tick()).await;
    assert!(result.is_err(), "paused scheduler should pend");
}

#[tokio::test(start_paused = true)]
async fn test_resume_reanchors_next_tick() {
    let mut s = TickScheduler::new(one_second());
    s.wait_for_tick().await;
    s.pause();
    tokio::time::advance(Duration::from_secs(30)).await;
    s.resume();
    assert!(!s.is_paused());

    let before = Instant::now();
    let info = s.wait_for_tick().await;
    assert_eq!(info.tick, 2);
    assert!(!info.overrun, "time spent paused is not an overrun");
    assert_eq!(before.elapsed(), Duration::from_secs(1));
}

#[tokio::test(start_paused = true)]
async fn test_pause_resume_idempotent() {
    let mut s = TickScheduler::new(one_second());

    s.pause();
    s.pause();
    assert!(s.is_paused());

    s.resume();
    s.resume();
    assert!(!s.is_paused());
}

// =========================================================================
// Integration: select! loop pattern (mirrors the session timer)
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_select_loop_pattern() {
    let mut s = TickScheduler::new(one_second());
    let (tx, mut rx) = tokio::sync::oneshot::channel::<()>();

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(3_500)).await;
        tx.send(()).ok();
    });

    let mut ticks_fired = 0u64;
    loop {
        tokio::select! {
            _ = &mut rx => break,
            info = s.wait_for_tick() => {
                ticks_fired += 1;
                assert_eq!(info.tick, ticks_fired);
            }
        }
    }

    assert_eq!(ticks_fired, 3);
}
