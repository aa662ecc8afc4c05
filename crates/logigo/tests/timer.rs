//! Integration tests for the session timer task.
//!
//! Tokio time is paused, so ticks fire as soon as every task is idle; the
//! session's wall clock is a `ManualClock` moved by hand between ticks.

use std::time::Duration;

use logigo::prelude::*;
use logigo::session::ManualClock;
use logigo::session::testing::{RecordingNotifier, ScriptedGateway};

const NOW: i64 = 1_700_000_000_000;
const MINUTE: i64 = 60 * 1000;

struct Harness {
    gateway: ScriptedGateway,
    store: MemoryStore,
    clock: ManualClock,
    notifier: RecordingNotifier,
}

impl Harness {
    fn with_remaining(remaining_ms: i64) -> Self {
        let store = MemoryStore::new();
        store.write_session("tok-1", NOW + remaining_ms);
        Self {
            gateway: ScriptedGateway::new(),
            store,
            clock: ManualClock::new(NOW),
            notifier: RecordingNotifier::new(),
        }
    }

    fn spawn(&self) -> SessionTimerHandle {
        let manager = SessionLifecycleManager::new(
            self.gateway.clone(),
            self.store.clone(),
            self.clock.clone(),
            self.notifier.clone(),
            SessionTimerConfig::default(),
        );
        SessionTimer::new(manager).spawn()
    }
}

#[tokio::test(start_paused = true)]
async fn test_timer_expired_session_stops_and_clears_store() {
    let h = Harness::with_remaining(-1);

    let handle = h.spawn();
    let phase = handle.join().await.expect("timer task should not fail");

    assert_eq!(phase, SessionPhase::Expired);
    assert!(h.store.is_empty());
    assert_eq!(h.notifier.redirects(), vec!["/"]);
    assert_eq!(h.notifier.confirm_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_timer_first_check_happens_after_one_interval() {
    let h = Harness::with_remaining(-1);

    let _handle = h.spawn();
    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(h.store.access_token().as_deref(), Some("tok-1"));

    tokio::time::sleep(Duration::from_millis(600)).await;
    assert!(h.store.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_timer_publishes_countdown_each_tick() {
    let h = Harness::with_remaining(30 * MINUTE);
    let handle = h.spawn();
    let mut status = handle.subscribe();

    status.changed().await.expect("timer alive");
    assert_eq!(status.borrow().phase, SessionPhase::Active);
    assert_eq!(status.borrow().countdown, "00:30:00");

    h.clock.advance(Duration::from_secs(1));
    status.changed().await.expect("timer alive");
    assert_eq!(handle.status().countdown, "00:29:59");
    assert_eq!(handle.status().remaining_ms, 30 * MINUTE - 1000);
}

#[tokio::test(start_paused = true)]
async fn test_timer_accepted_prompt_renews_session() {
    let h = Harness::with_remaining(9 * MINUTE);
    h.notifier.answer_next(true);
    h.gateway.grant("tok-2", 60 * MINUTE as u64);

    let handle = h.spawn();
    tokio::time::sleep(Duration::from_millis(1500)).await;

    assert_eq!(h.store.access_token().as_deref(), Some("tok-2"));
    assert_eq!(h.store.expires_at(), Some(NOW + 60 * MINUTE));
    assert_eq!(handle.status().phase, SessionPhase::Active);
    assert!(!handle.is_finished());
}

#[tokio::test(start_paused = true)]
async fn test_timer_stop_then_join_returns_last_phase() {
    let h = Harness::with_remaining(30 * MINUTE);
    let mut handle = h.spawn();
    tokio::time::sleep(Duration::from_millis(2500)).await;

    handle.stop();
    handle.stop();
    let phase = handle.join().await.expect("timer task should not fail");

    assert_eq!(phase, SessionPhase::Active);
}

#[tokio::test(start_paused = true)]
async fn test_timer_dropped_handle_emits_nothing_more() {
    let h = Harness::with_remaining(30 * MINUTE);
    let handle = h.spawn();
    tokio::time::sleep(Duration::from_millis(2500)).await;

    drop(handle);
    h.clock.advance(Duration::from_secs(31 * 60));
    tokio::time::sleep(Duration::from_secs(5)).await;

    assert!(h.notifier.notices().is_empty());
    assert_eq!(h.store.access_token().as_deref(), Some("tok-1"));
}

#[tokio::test(start_paused = true)]
async fn test_timer_stop_during_prompt_cancels_it() {
    let h = Harness::with_remaining(9 * MINUTE);
    h.notifier.hang_confirms(true);
    let mut handle = h.spawn();
    tokio::time::sleep(Duration::from_millis(1500)).await;
    assert_eq!(h.notifier.confirm_count(), 1);

    handle.stop();
    let phase = handle.join().await.expect("timer task should not fail");

    // The prompt never resolved, so nothing past it ran.
    assert_eq!(phase, SessionPhase::WarningIssued);
    assert!(h.notifier.toasts(Level::Warning).is_empty());
    assert_eq!(h.store.access_token().as_deref(), Some("tok-1"));
}

#[tokio::test(start_paused = true)]
async fn test_timer_keeps_ticking_while_prompt_is_unanswered() {
    let h = Harness::with_remaining(9 * MINUTE);
    h.notifier.hang_confirms(true);
    let handle = h.spawn();
    tokio::time::sleep(Duration::from_millis(1500)).await;
    assert_eq!(h.notifier.confirm_count(), 1);

    // Three minutes left, still no answer.
    h.clock.advance(Duration::from_secs(6 * 60));
    tokio::time::sleep(Duration::from_secs(10)).await;

    assert_eq!(h.notifier.toasts(Level::Info).len(), 10);
    assert_eq!(h.notifier.confirm_count(), 1);
    let status = handle.status();
    assert_eq!(status.phase, SessionPhase::CriticalWarning);
    assert_eq!(status.remaining_ms, 3 * MINUTE);
    assert_eq!(status.countdown, "00:03:00");
    assert!(!handle.is_finished());
}

#[tokio::test(start_paused = true)]
async fn test_timer_expires_while_prompt_is_unanswered() {
    let h = Harness::with_remaining(9 * MINUTE);
    h.notifier.hang_confirms(true);
    let handle = h.spawn();
    tokio::time::sleep(Duration::from_millis(1500)).await;

    h.clock.advance(Duration::from_secs(9 * 60));
    let phase = handle.join().await.expect("timer task should not fail");

    assert_eq!(phase, SessionPhase::Expired);
    assert!(h.store.is_empty());
    assert_eq!(h.notifier.redirects(), vec!["/"]);
}

#[tokio::test(start_paused = true)]
async fn test_timer_pause_suspends_checks_until_resume() {
    let h = Harness::with_remaining(30 * MINUTE);
    let handle = h.spawn();
    handle.pause();
    handle.pause();
    assert!(handle.is_paused());

    h.clock.advance(Duration::from_secs(31 * 60));
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(h.store.access_token().as_deref(), Some("tok-1"));

    handle.resume();
    assert!(!handle.is_paused());
    let phase = handle.join().await.expect("timer task should not fail");

    assert_eq!(phase, SessionPhase::Expired);
    assert!(h.store.is_empty());
}
