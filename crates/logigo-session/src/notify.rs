//! The user-facing side of the session lifecycle.
//!
//! The lifecycle manager never draws anything itself. It talks to a
//! [`NotificationSink`], which the embedding UI implements: toasts for
//! passive messages, an awaited yes/no prompt for the renewal question,
//! and a redirect for the forced logout.

use std::fmt;
use std::future::Future;

/// Severity of a toast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Level {
    Success,
    Info,
    Warning,
    Error,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::Info => write!(f, "info"),
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Where session notifications go.
///
/// # Trait bounds
///
/// - `Send + Sync + 'static` → the sink lives inside the session timer's
///   spawned task for the whole life of the session.
pub trait NotificationSink: Send + Sync + 'static {
    /// Shows a transient, non-blocking message.
    fn notify(&self, level: Level, message: &str);

    /// Asks the user a yes/no question and resolves with the answer.
    ///
    /// The caller bounds the wait, so an implementation may pend for as
    /// long as the user takes.
    fn confirm(&self, message: &str) -> impl Future<Output = bool> + Send;

    /// Sends the user to `route` (the unauthenticated landing page).
    fn redirect(&self, route: &str);
}

/// A sink with no human attached: everything goes to `tracing`, and
/// prompts are answered with a fixed reply.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier {
    accept_renewals: bool,
}

impl LogNotifier {
    /// Answers every prompt with "yes", i.e. always renews.
    pub fn accepting() -> Self {
        Self {
            accept_renewals: true,
        }
    }

    /// Answers every prompt with "no".
    pub fn declining() -> Self {
        Self {
            accept_renewals: false,
        }
    }
}

impl NotificationSink for LogNotifier {
    fn notify(&self, level: Level, message: &str) {
        match level {
            Level::Success | Level::Info => tracing::info!(%level, "{message}"),
            Level::Warning => tracing::warn!(%level, "{message}"),
            Level::Error => tracing::error!(%level, "{message}"),
        }
    }

    async fn confirm(&self, message: &str) -> bool {
        tracing::info!(answer = self.accept_renewals, "{message}");
        self.accept_renewals
    }

    fn redirect(&self, route: &str) {
        tracing::info!(route, "redirecting to landing route");
    }
}
