//! Fixed-period tick scheduler for the LogiGo session checker.
//!
//! The session lifecycle is polled: every tick, the checker compares the
//! stored expiry with the wall clock. This crate provides the clock that
//! says *when* to look, with pause/resume and a policy for late wake-ups.
//!
//! # Integration
//!
//! The scheduler is designed to sit inside a `tokio::select!` loop next to
//! a shutdown signal:
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         _ = &mut shutdown => break,
//!         _ = scheduler.wait_for_tick() => {
//!             if manager.check().is_terminal() {
//!                 break;
//!             }
//!         }
//!     }
//! }
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::{self, Instant};
use tracing::{debug, trace, warn};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// What to do when the scheduler wakes up later than planned
/// (e.g. the process was suspended, or the previous tick ran long).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TickPolicy {
    /// Forget the missed ticks and schedule the next one from now.
    #[default]
    Skip,
    /// Keep the original cadence: the next tick is due one interval after
    /// the missed deadline, which may be immediately.
    Drop,
}

/// Configuration for the tick scheduler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickConfig {
    /// Time between two ticks.
    pub interval: Duration,
    /// Late wake-up handling.
    pub policy: TickPolicy,
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            interval: Self::DEFAULT_INTERVAL,
            policy: TickPolicy::default(),
        }
    }
}

impl TickConfig {
    /// Default period: one second.
    pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(1);

    /// Create a config for a specific interval with the default policy.
    pub fn with_interval(interval: Duration) -> Self {
        Self {
            interval,
            ..Default::default()
        }
    }

    /// Replace out-of-range values so the config is safe to use.
    ///
    /// Called automatically by [`TickScheduler::new`]. A zero interval
    /// would spin, so it falls back to [`Self::DEFAULT_INTERVAL`].
    pub fn validated(mut self) -> Self {
        if self.interval.is_zero() {
            warn!("tick interval is zero, using the default");
            self.interval = Self::DEFAULT_INTERVAL;
        }
        self
    }
}

// ---------------------------------------------------------------------------
// Tick info (returned to caller each tick)
// ---------------------------------------------------------------------------

/// Information about a fired tick, returned by [`TickScheduler::wait_for_tick`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickInfo {
    /// Monotonically increasing tick number (starts at 1).
    pub tick: u64,
    /// `true` if this tick fired late (more than 10% of the interval).
    pub overrun: bool,
    /// Whole intervals that elapsed without a tick (0 in normal operation).
    pub ticks_skipped: u64,
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

/// Fixed-period tick scheduler. One per session checker.
pub struct TickScheduler {
    config: TickConfig,
    tick_count: u64,
    /// When the next tick should fire (Tokio instant for `sleep_until`).
    next_tick: Instant,
    paused: bool,
}

impl TickScheduler {
    /// Create a new scheduler. The first tick fires one interval from now.
    pub fn new(config: TickConfig) -> Self {
        let config = config.validated();
        debug!(
            interval_ms = config.interval.as_millis() as u64,
            policy = ?config.policy,
            "tick scheduler created"
        );
        Self {
            next_tick: Instant::now() + config.interval,
            config,
            tick_count: 0,
            paused: false,
        }
    }

    /// Create a scheduler for a specific interval with default settings.
    pub fn with_interval(interval: Duration) -> Self {
        Self::new(TickConfig::with_interval(interval))
    }

    /// Wait until the next tick is due.
    ///
    /// While paused this future pends forever; `tokio::select!` will still
    /// process its other branches. Cancel-safe: dropping the future before
    /// it resolves leaves the schedule untouched.
    pub async fn wait_for_tick(&mut self) -> TickInfo {
        if self.paused {
            std::future::pending::<()>().await;
        }

        let deadline = self.next_tick;
        let interval = self.config.interval;
        time::sleep_until(deadline).await;

        let now = Instant::now();
        self.tick_count += 1;

        let late_by = now.saturating_duration_since(deadline);
        let overrun = late_by > interval / 10;
        let ticks_skipped = if overrun {
            (late_by.as_nanos() / interval.as_nanos()) as u64
        } else {
            0
        };

        self.next_tick = match self.config.policy {
            TickPolicy::Skip => {
                if ticks_skipped > 0 {
                    warn!(
                        tick = self.tick_count,
                        skipped = ticks_skipped,
                        late_ms = late_by.as_millis() as u64,
                        "tick overrun, skipping ahead"
                    );
                }
                now + interval
            }
            TickPolicy::Drop => {
                if overrun {
                    warn!(
                        tick = self.tick_count,
                        late_ms = late_by.as_millis() as u64,
                        "tick overrun, keeping original cadence"
                    );
                }
                deadline + interval
            }
        };

        trace!(tick = self.tick_count, overrun, "tick fired");

        TickInfo {
            tick: self.tick_count,
            overrun,
            ticks_skipped,
        }
    }

    /// Pause ticking. `wait_for_tick` pends until [`resume`](Self::resume).
    ///
    /// Safe to call multiple times (idempotent).
    pub fn pause(&mut self) {
        if !self.paused {
            self.paused = true;
            debug!(tick = self.tick_count, "tick scheduler paused");
        }
    }

    /// Resume ticking. The next tick is due one interval from now, so time
    /// spent paused never produces a burst.
    pub fn resume(&mut self) {
        if self.paused {
            self.paused = false;
            self.next_tick = Instant::now() + self.config.interval;
            debug!(tick = self.tick_count, "tick scheduler resumed");
        }
    }

    /// Whether the scheduler is currently paused.
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Current tick count.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// The configured interval.
    pub fn interval(&self) -> Duration {
        self.config.interval
    }

    /// The configured late wake-up policy.
    pub fn policy(&self) -> TickPolicy {
        self.config.policy
    }
}
