//! Session types: configuration, phases, and the session snapshot.
//!
//! A "session" is the client's record of an authenticated user. It tracks:
//! - WHO may call the backend (the bearer `access_token`)
//! - UNTIL WHEN (`expires_at_epoch_ms`, absolute wall-clock milliseconds)
//! - WHETHER the user was already asked to renew in this low-time window

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

// ---------------------------------------------------------------------------
// SessionTimerConfig
// ---------------------------------------------------------------------------

/// Thresholds and timings of the session lifecycle.
///
/// The defaults reproduce the LogiGo web client: a renewal prompt at
/// 10 minutes, a repeating reminder between 4 and 1 minutes, a check
/// every second.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionTimerConfig {
    /// Time between two evaluations.
    pub tick_interval: Duration,

    /// Remaining time at or below which the renewal prompt is shown.
    pub warning_threshold: Duration,

    /// Upper bound of the critical window (inclusive).
    pub critical_threshold: Duration,

    /// Lower bound of the critical window (exclusive). Below it the
    /// reminder stops; expiry is imminent.
    pub critical_floor: Duration,

    /// Upper bound on a renewal round trip. The effective budget is also
    /// capped by the time the session has left.
    pub renew_timeout: Duration,

    /// TTL applied when a login response carries a token but no
    /// `expires_in`.
    pub default_ttl: Duration,

    /// Where the user is sent once the session has expired.
    pub landing_route: String,
}

impl Default for SessionTimerConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(1),
            warning_threshold: Duration::from_secs(10 * 60),
            critical_threshold: Duration::from_secs(4 * 60),
            critical_floor: Duration::from_secs(60),
            renew_timeout: Duration::from_secs(30),
            default_ttl: Duration::from_secs(60 * 60),
            landing_route: "/".to_string(),
        }
    }
}

impl SessionTimerConfig {
    /// Shortest tick interval accepted.
    pub const MIN_TICK_INTERVAL: Duration = Duration::from_millis(10);

    /// Longest tick interval accepted. Anything slower could step over the
    /// critical window without ever landing in it.
    pub const MAX_TICK_INTERVAL: Duration = Duration::from_secs(60);

    /// Clamp and fix out-of-range values so the config is safe to use.
    ///
    /// Called automatically by
    /// [`SessionLifecycleManager::new`](crate::SessionLifecycleManager::new).
    /// Rules:
    /// - `tick_interval` clamped to `MIN_TICK_INTERVAL..=MAX_TICK_INTERVAL`.
    /// - `critical_floor <= critical_threshold <= warning_threshold`.
    /// - zero `renew_timeout` / `default_ttl` fall back to the defaults.
    pub fn validated(mut self) -> Self {
        let defaults = Self::default();

        if self.tick_interval < Self::MIN_TICK_INTERVAL
            || self.tick_interval > Self::MAX_TICK_INTERVAL
        {
            let clamped = self
                .tick_interval
                .clamp(Self::MIN_TICK_INTERVAL, Self::MAX_TICK_INTERVAL);
            warn!(
                requested_ms = self.tick_interval.as_millis() as u64,
                clamped_ms = clamped.as_millis() as u64,
                "tick interval out of range, clamping"
            );
            self.tick_interval = clamped;
        }

        if self.critical_threshold > self.warning_threshold {
            warn!("critical threshold above warning threshold, lowering it");
            self.critical_threshold = self.warning_threshold;
        }
        if self.critical_floor > self.critical_threshold {
            warn!("critical floor above critical threshold, lowering it");
            self.critical_floor = self.critical_threshold;
        }

        if self.renew_timeout.is_zero() {
            self.renew_timeout = defaults.renew_timeout;
        }
        if self.default_ttl.is_zero() {
            self.default_ttl = defaults.default_ttl;
        }
        if self.landing_route.trim().is_empty() {
            self.landing_route = defaults.landing_route;
        }
        self
    }
}

// ---------------------------------------------------------------------------
// SessionPhase
// ---------------------------------------------------------------------------

/// Where a session stands relative to its expiry.
///
/// ```text
///   Active ──(≤ warning)──→ WarningIssued ──(≤ critical)──→ CriticalWarning
///     ↑                          │                               │
///     └──────(renewal ok)────────┴───────────────────────────────┘
///
///   any ──(remaining ≤ 0)──→ Expired   (terminal)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionPhase {
    /// More than the warning threshold left.
    Active,
    /// Inside the warning window; the user has been asked once.
    WarningIssued,
    /// Inside the critical window; reminded on every tick.
    CriticalWarning,
    /// Torn down. A new login is needed to get a new session.
    Expired,
}

impl SessionPhase {
    /// Returns `true` once the session is gone for good.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Expired)
    }
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Active => write!(f, "Active"),
            Self::WarningIssued => write!(f, "WarningIssued"),
            Self::CriticalWarning => write!(f, "CriticalWarning"),
            Self::Expired => write!(f, "Expired"),
        }
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// A point-in-time view of the current session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub access_token: String,
    pub expires_at_epoch_ms: i64,
    pub has_prompted_renewal: bool,
}

/// The outcome of a successful renewal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Renewal {
    pub access_token: String,
    pub expires_at_epoch_ms: i64,
}

// ---------------------------------------------------------------------------
// Countdown formatting
// ---------------------------------------------------------------------------

/// Formats a remaining time as `HH:MM:SS`.
///
/// Hours are not wrapped at 24 and grow past two digits when needed.
/// Negative values render as `00:00:00`. Display only: no decision in the
/// lifecycle is made from this string.
///
/// ```rust
/// use logigo_session::format_remaining;
///
/// assert_eq!(format_remaining(0), "00:00:00");
/// assert_eq!(format_remaining(3_661_000), "01:01:01");
/// ```
pub fn format_remaining(ms: i64) -> String {
    let total_seconds = ms.max(0) / 1000;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}

/// Converts a duration to whole milliseconds, saturating at `i64::MAX`.
pub(crate) fn duration_ms(d: Duration) -> i64 {
    i64::try_from(d.as_millis()).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_remaining_zero() {
        assert_eq!(format_remaining(0), "00:00:00");
    }

    #[test]
    fn test_format_remaining_hour_minute_second() {
        assert_eq!(format_remaining(3_661_000), "01:01:01");
    }

    #[test]
    fn test_format_remaining_floors_partial_seconds() {
        assert_eq!(format_remaining(59_999), "00:00:59");
    }

    #[test]
    fn test_format_remaining_hours_are_unbounded() {
        assert_eq!(format_remaining(100 * 3600 * 1000), "100:00:00");
    }

    #[test]
    fn test_format_remaining_negative_is_zero() {
        assert_eq!(format_remaining(-5_000), "00:00:00");
    }

    #[test]
    fn test_config_default_matches_web_client() {
        let config = SessionTimerConfig::default();
        assert_eq!(config.tick_interval, Duration::from_secs(1));
        assert_eq!(config.warning_threshold, Duration::from_secs(600));
        assert_eq!(config.critical_threshold, Duration::from_secs(240));
        assert_eq!(config.critical_floor, Duration::from_secs(60));
        assert_eq!(config.landing_route, "/");
    }

    #[test]
    fn test_validated_clamps_tick_interval() {
        let slow = SessionTimerConfig {
            tick_interval: Duration::from_secs(300),
            ..SessionTimerConfig::default()
        }
        .validated();
        assert_eq!(slow.tick_interval, SessionTimerConfig::MAX_TICK_INTERVAL);

        let zero = SessionTimerConfig {
            tick_interval: Duration::ZERO,
            ..SessionTimerConfig::default()
        }
        .validated();
        assert_eq!(zero.tick_interval, SessionTimerConfig::MIN_TICK_INTERVAL);
    }

    #[test]
    fn test_validated_orders_thresholds() {
        let config = SessionTimerConfig {
            warning_threshold: Duration::from_secs(120),
            critical_threshold: Duration::from_secs(300),
            critical_floor: Duration::from_secs(600),
            ..SessionTimerConfig::default()
        }
        .validated();
        assert_eq!(config.critical_threshold, Duration::from_secs(120));
        assert_eq!(config.critical_floor, Duration::from_secs(120));
    }

    #[test]
    fn test_validated_restores_zero_durations_and_blank_route() {
        let config = SessionTimerConfig {
            renew_timeout: Duration::ZERO,
            default_ttl: Duration::ZERO,
            landing_route: "  ".into(),
            ..SessionTimerConfig::default()
        }
        .validated();
        let defaults = SessionTimerConfig::default();
        assert_eq!(config.renew_timeout, defaults.renew_timeout);
        assert_eq!(config.default_ttl, defaults.default_ttl);
        assert_eq!(config.landing_route, "/");
    }

    #[test]
    fn test_phase_is_terminal_only_when_expired() {
        assert!(!SessionPhase::Active.is_terminal());
        assert!(!SessionPhase::WarningIssued.is_terminal());
        assert!(!SessionPhase::CriticalWarning.is_terminal());
        assert!(SessionPhase::Expired.is_terminal());
    }

    #[test]
    fn test_phase_display() {
        assert_eq!(SessionPhase::CriticalWarning.to_string(), "CriticalWarning");
    }
}
